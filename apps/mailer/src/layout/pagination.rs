//! Prescription pagination: fits table rows onto fixed-size printable pages.
//!
//! A page has a fixed physical height. Everything that is not the item table
//! (header, details, prescriber block, QR/signature block, footer, buffer) has a
//! fixed pixel height; whatever remains, minus the table header row, is divided
//! into whole rows.
//!
//! # Row capacity
//! - `page_px = container_height_cm × 37.8` (96 DPI)
//! - `body_px = page_px − Σ fixed blocks − header_row_height`
//! - `max_rows = floor(body_px / row_height)`
//!
//! Splitting and rendering refuse to run when `max_rows ≤ 0`
//! (`LayoutError::NoRowsFit`). `optimal_rows_per_page` clamps to 1 instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Constants
// ────────────────────────────────────────────────────────────────────────────

/// Pixels per centimetre at 96 DPI.
pub const CM_TO_PX: f64 = 37.8;

/// Inserted between consecutive rendered pages.
pub const PAGE_BREAK_MARKER: &str = r#"<div class="page-break"></div>"#;

/// Default print styling for `PAGE_BREAK_MARKER` and page containers.
pub const PAGE_BREAK_CSS: &str = r#"
    .page-break {
        page-break-before: always;
    }

    .pdf-container {
        page-break-after: always;
    }

    .pdf-container:last-child {
        page-break-after: avoid;
    }

    @media print {
        .page-break {
            page-break-before: always;
        }
    }
"#;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error(
        "page too small: {available_body_height:.2}px of table body cannot hold a {row_height}px row"
    )]
    NoRowsFit {
        available_body_height: f64,
        row_height: f64,
    },
}

/// Fixed page geometry. Heights are pixels except the container dimensions,
/// which are centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub container_height: f64,
    pub container_width: f64,
    pub header_height: f64,
    pub details_height: f64,
    pub prescribed_by_height: f64,
    pub qr_signature_height: f64,
    pub footer_height: f64,
    pub buffer_height: f64,
    pub row_height: f64,
    pub header_row_height: f64,
}

impl Default for PageMetrics {
    /// A4 portrait with the standard prescription blocks.
    fn default() -> Self {
        Self {
            container_height: 29.7,
            container_width: 21.0,
            header_height: 120.0,
            details_height: 150.0,
            prescribed_by_height: 100.0,
            qr_signature_height: 120.0,
            footer_height: 100.0,
            buffer_height: 50.0,
            row_height: 40.0,
            header_row_height: 40.0,
        }
    }
}

/// Caller-supplied partial metrics. Missing fields fall back to
/// `PageMetrics::default()` when resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetricsOverrides {
    #[serde(default, alias = "container_height")]
    pub container_height: Option<f64>,
    #[serde(default, alias = "container_width")]
    pub container_width: Option<f64>,
    #[serde(default, alias = "header_height")]
    pub header_height: Option<f64>,
    #[serde(default, alias = "details_height")]
    pub details_height: Option<f64>,
    #[serde(default, alias = "prescribed_by_height")]
    pub prescribed_by_height: Option<f64>,
    #[serde(default, alias = "qr_signature_height")]
    pub qr_signature_height: Option<f64>,
    #[serde(default, alias = "footer_height")]
    pub footer_height: Option<f64>,
    #[serde(default, alias = "buffer_height")]
    pub buffer_height: Option<f64>,
    #[serde(default, alias = "row_height")]
    pub row_height: Option<f64>,
    #[serde(default, alias = "header_row_height")]
    pub header_row_height: Option<f64>,
}

impl PageMetricsOverrides {
    pub fn resolve(&self) -> PageMetrics {
        let base = PageMetrics::default();
        PageMetrics {
            container_height: self.container_height.unwrap_or(base.container_height),
            container_width: self.container_width.unwrap_or(base.container_width),
            header_height: self.header_height.unwrap_or(base.header_height),
            details_height: self.details_height.unwrap_or(base.details_height),
            prescribed_by_height: self
                .prescribed_by_height
                .unwrap_or(base.prescribed_by_height),
            qr_signature_height: self.qr_signature_height.unwrap_or(base.qr_signature_height),
            footer_height: self.footer_height.unwrap_or(base.footer_height),
            buffer_height: self.buffer_height.unwrap_or(base.buffer_height),
            row_height: self.row_height.unwrap_or(base.row_height),
            header_row_height: self.header_row_height.unwrap_or(base.header_row_height),
        }
    }
}

/// One item placed on a page, with its running number across the whole document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageItem<T> {
    pub sl_no: usize,
    #[serde(flatten)]
    pub item: T,
}

/// A single printable page of table rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub page_number: usize,
    pub total_pages: usize,
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub items: Vec<PageItem<T>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Capacity
// ────────────────────────────────────────────────────────────────────────────

impl PageMetrics {
    pub fn container_height_px(&self) -> f64 {
        self.container_height * CM_TO_PX
    }

    /// Sum of every fixed block outside the item table.
    pub fn used_height(&self) -> f64 {
        self.header_height
            + self.details_height
            + self.prescribed_by_height
            + self.qr_signature_height
            + self.footer_height
            + self.buffer_height
    }

    /// Height left for table data rows once the table header row is placed.
    pub fn available_body_height(&self) -> f64 {
        self.container_height_px() - self.used_height() - self.header_row_height
    }
}

/// Raw row capacity. Zero or negative means no row fits.
pub fn compute_max_rows_per_page(metrics: &PageMetrics) -> i64 {
    (metrics.available_body_height() / metrics.row_height).floor() as i64
}

/// Row capacity for callers that must always show at least one row.
pub fn compute_optimal_rows_per_page(metrics: &PageMetrics) -> usize {
    compute_max_rows_per_page(metrics).max(1) as usize
}

/// Splits `items` into consecutive chunks of `per_page`; the last chunk may be shorter.
///
/// `per_page` must be non-zero.
pub fn chunk_items<T: Clone>(items: &[T], per_page: usize) -> Vec<Vec<T>> {
    items.chunks(per_page).map(|chunk| chunk.to_vec()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Planner
// ────────────────────────────────────────────────────────────────────────────

/// Paginates table rows for one fixed page geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageLayoutPlanner {
    metrics: PageMetrics,
}

impl PageLayoutPlanner {
    pub fn new(metrics: PageMetrics) -> Self {
        Self { metrics }
    }

    pub fn max_rows_per_page(&self) -> i64 {
        compute_max_rows_per_page(&self.metrics)
    }

    pub fn optimal_rows_per_page(&self) -> usize {
        compute_optimal_rows_per_page(&self.metrics)
    }

    /// Partitions `items` into pages of `max_rows_per_page` rows.
    ///
    /// An empty input yields no pages regardless of geometry.
    pub fn split_into_pages<T: Clone>(&self, items: &[T]) -> Result<Vec<Page<T>>, LayoutError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let per_page = self.checked_rows_per_page()?;
        let chunks = chunk_items(items, per_page);
        let total_pages = chunks.len();
        // Running numbers use the first page's length as the stride for every page.
        let stride = chunks.first().map_or(0, Vec::len);

        let pages = chunks
            .into_iter()
            .enumerate()
            .map(|(page_index, chunk)| Page {
                page_number: page_index + 1,
                total_pages,
                is_first_page: page_index == 0,
                is_last_page: page_index + 1 == total_pages,
                items: chunk
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| PageItem {
                        sl_no: page_index * stride + index + 1,
                        item,
                    })
                    .collect(),
            })
            .collect();

        Ok(pages)
    }

    /// Renders every page in order and joins them with `PAGE_BREAK_MARKER`.
    ///
    /// `render_one_page` is called exactly once per page, strictly in page order.
    pub fn render_paginated<T, F, E>(&self, items: &[T], mut render_one_page: F) -> Result<String, E>
    where
        T: Clone,
        F: FnMut(&Page<T>) -> Result<String, E>,
        E: From<LayoutError>,
    {
        let pages = self.split_into_pages(items)?;

        let mut html = String::new();
        for (index, page) in pages.iter().enumerate() {
            let page_html = render_one_page(page)?;
            if index > 0 {
                html.push_str(PAGE_BREAK_MARKER);
            }
            html.push_str(&page_html);
        }

        Ok(html)
    }

    fn checked_rows_per_page(&self) -> Result<usize, LayoutError> {
        let rows = self.max_rows_per_page();
        if rows <= 0 {
            return Err(LayoutError::NoRowsFit {
                available_body_height: self.metrics.available_body_height(),
                row_height: self.metrics.row_height,
            });
        }
        Ok(rows as usize)
    }
}

/// Canonical CSS for the page-break marker.
pub fn page_break_css() -> &'static str {
    PAGE_BREAK_CSS
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn planner_with_rows(rows: usize) -> PageLayoutPlanner {
        // 1px rows; the table header row eats everything but `rows + 0.5` px.
        let metrics = PageMetrics {
            container_height: 10.0,
            header_height: 0.0,
            details_height: 0.0,
            prescribed_by_height: 0.0,
            qr_signature_height: 0.0,
            footer_height: 0.0,
            buffer_height: 0.0,
            header_row_height: 378.0 - rows as f64 - 0.5,
            row_height: 1.0,
            ..PageMetrics::default()
        };
        let planner = PageLayoutPlanner::new(metrics);
        assert_eq!(planner.max_rows_per_page(), rows as i64);
        planner
    }

    fn tiny_page() -> PageMetrics {
        PageMetrics {
            container_height: 5.0,
            ..PageMetrics::default()
        }
    }

    // ── capacity ─────────────────────────────────────────────────────────────

    #[test]
    fn test_default_a4_capacity() {
        let metrics = PageMetrics::default();
        assert!((metrics.container_height_px() - 1122.66).abs() < 1e-6);
        assert_eq!(metrics.used_height(), 640.0);
        assert_eq!(compute_max_rows_per_page(&metrics), 11);
    }

    #[test]
    fn test_worked_example_capacity() {
        // 1122.66 − 540 − 40 = 542.66 → 13 rows of 40px.
        let metrics = PageMetrics {
            footer_height: 0.0,
            ..PageMetrics::default()
        };
        assert_eq!(metrics.used_height(), 540.0);
        assert!((metrics.available_body_height() - 542.66).abs() < 1e-6);
        assert_eq!(compute_max_rows_per_page(&metrics), 13);

        let items: Vec<u32> = (0..29).collect();
        let pages = PageLayoutPlanner::new(metrics).split_into_pages(&items).unwrap();
        let sizes: Vec<usize> = pages.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![13, 13, 3]);
    }

    #[test]
    fn test_max_rows_not_clamped() {
        assert!(compute_max_rows_per_page(&tiny_page()) < 0);
    }

    #[test]
    fn test_optimal_rows_clamps_to_one() {
        assert_eq!(compute_optimal_rows_per_page(&tiny_page()), 1);

        let zero_capacity = PageMetrics {
            row_height: 10_000.0,
            ..PageMetrics::default()
        };
        assert_eq!(compute_max_rows_per_page(&zero_capacity), 0);
        assert_eq!(compute_optimal_rows_per_page(&zero_capacity), 1);
        assert_eq!(
            compute_optimal_rows_per_page(&PageMetrics::default()),
            compute_max_rows_per_page(&PageMetrics::default()) as usize
        );
    }

    #[test]
    fn test_overrides_resolve_missing_fields_to_defaults() {
        let overrides = PageMetricsOverrides {
            row_height: Some(20.0),
            ..PageMetricsOverrides::default()
        };
        let metrics = overrides.resolve();
        assert_eq!(metrics.row_height, 20.0);
        assert_eq!(metrics.header_height, 120.0);
        assert_eq!(metrics.container_height, 29.7);
    }

    #[test]
    fn test_overrides_accept_camel_and_snake_case() {
        let camel: PageMetricsOverrides =
            serde_json::from_str(r#"{"rowHeight": 30, "headerRowHeight": 20}"#).unwrap();
        let snake: PageMetricsOverrides =
            serde_json::from_str(r#"{"row_height": 30, "header_row_height": 20}"#).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.resolve().row_height, 30.0);
    }

    // ── splitting ────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_input_yields_no_pages() {
        let pages = planner_with_rows(3).split_into_pages::<u32>(&[]).unwrap();
        assert!(pages.is_empty());

        // Even a page too small for one row has nothing to split.
        let tiny = PageLayoutPlanner::new(tiny_page());
        assert!(tiny.split_into_pages::<u32>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_split_page_count_and_sizes() {
        for n in 1..=7usize {
            let planner = planner_with_rows(n);
            for k in 0..=40usize {
                let items: Vec<usize> = (0..k).collect();
                let pages = planner.split_into_pages(&items).unwrap();
                assert_eq!(pages.len(), k.div_ceil(n), "n={n} k={k}");

                if let Some((last, rest)) = pages.split_last() {
                    assert!(rest.iter().all(|p| p.items.len() == n));
                    assert!((1..=n).contains(&last.items.len()));
                }
            }
        }
    }

    #[test]
    fn test_split_preserves_order_exactly() {
        let planner = planner_with_rows(7);
        let items: Vec<String> = (0..1000).map(|i| format!("item-{i}")).collect();
        let pages = planner.split_into_pages(&items).unwrap();
        let rejoined: Vec<String> = pages
            .into_iter()
            .flat_map(|p| p.items.into_iter().map(|i| i.item))
            .collect();
        assert_eq!(rejoined, items);
    }

    #[test]
    fn test_first_and_last_flags() {
        let planner = planner_with_rows(4);
        let items: Vec<u32> = (0..10).collect();
        let pages = planner.split_into_pages(&items).unwrap();

        assert_eq!(pages.iter().filter(|p| p.is_first_page).count(), 1);
        assert_eq!(pages.iter().filter(|p| p.is_last_page).count(), 1);
        assert!(pages[0].is_first_page);
        assert!(pages[2].is_last_page);
        assert!(pages.iter().all(|p| p.total_pages == 3));
        assert_eq!(
            pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_single_page_is_first_and_last() {
        let pages = planner_with_rows(5).split_into_pages(&[1, 2]).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_first_page && pages[0].is_last_page);
    }

    #[test]
    fn test_sequential_numbering_across_pages() {
        let planner = planner_with_rows(3);
        let items: Vec<char> = "abcdefg".chars().collect();
        let pages = planner.split_into_pages(&items).unwrap();

        let numbers: Vec<Vec<usize>> = pages
            .iter()
            .map(|p| p.items.iter().map(|i| i.sl_no).collect())
            .collect();
        assert_eq!(numbers, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    }

    #[test]
    fn test_split_rejects_page_with_no_room() {
        let planner = PageLayoutPlanner::new(tiny_page());
        let err = planner.split_into_pages(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, LayoutError::NoRowsFit { row_height, .. } if row_height == 40.0));
    }

    #[test]
    fn test_chunk_items_last_chunk_shorter() {
        let chunks = chunk_items(&[1, 2, 3, 4, 5], 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_page_item_serializes_flat() {
        let item = PageItem {
            sl_no: 4,
            item: serde_json::json!({ "name": "Paracetamol" }),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["sl_no"], 4);
        assert_eq!(value["name"], "Paracetamol");
    }

    // ── rendering ────────────────────────────────────────────────────────────

    fn count_markers(html: &str) -> usize {
        html.matches(PAGE_BREAK_MARKER).count()
    }

    #[test]
    fn test_render_inserts_markers_between_pages_only() {
        let planner = planner_with_rows(3);
        let items: Vec<u32> = (0..7).collect();
        let html = planner
            .render_paginated(&items, |page| {
                Ok::<_, LayoutError>(format!("[page {}]", page.page_number))
            })
            .unwrap();

        assert_eq!(count_markers(&html), 2);
        assert!(html.starts_with("[page 1]"));
        assert!(html.ends_with("[page 3]"));
        let expected = format!("[page 1]{PAGE_BREAK_MARKER}[page 2]{PAGE_BREAK_MARKER}[page 3]");
        assert_eq!(html, expected);
    }

    #[test]
    fn test_render_single_and_empty() {
        let planner = planner_with_rows(10);
        let render = |page: &Page<u32>| Ok::<_, LayoutError>(format!("{}", page.items.len()));

        let single = planner.render_paginated(&[1, 2, 3], render).unwrap();
        assert_eq!(single, "3");
        assert_eq!(count_markers(&single), 0);

        let empty = planner.render_paginated(&[], render).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_render_calls_once_per_page_in_order() {
        let planner = planner_with_rows(2);
        let items: Vec<u32> = (0..9).collect();
        let mut seen = Vec::new();
        planner
            .render_paginated(&items, |page| {
                seen.push(page.page_number);
                Ok::<_, LayoutError>(String::new())
            })
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_render_propagates_layout_error() {
        let planner = PageLayoutPlanner::new(tiny_page());
        let result =
            planner.render_paginated(&[1], |_| Ok::<_, LayoutError>("never".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_page_break_css_targets_marker_class() {
        let css = page_break_css();
        assert!(css.contains(".page-break"));
        assert!(css.contains("page-break-before: always"));
        assert!(css.contains("@media print"));
    }
}
