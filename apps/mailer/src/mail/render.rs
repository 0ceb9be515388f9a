//! HTML rendering through tera. Templates are loaded once from a directory.

use std::path::Path;

use serde_json::{Map, Value};
use tera::{Context, Tera};
use tracing::{debug, info};

use crate::layout::{page_break_css, PageLayoutPlanner, PageMetrics};
use crate::mail::DispatchError;

/// Wraps the concatenated pages of a paginated document.
pub const PAGED_DOCUMENT: &str = "paged-document.html";

pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Loads every `*.html` file under `dir`, including subdirectories.
    pub fn from_dir(dir: &Path) -> Result<Self, DispatchError> {
        let glob = format!("{}/**/*.html", dir.display());
        let tera = Tera::new(&glob)?;
        info!(
            "Loaded {} email templates from {}",
            tera.get_template_names().count(),
            dir.display()
        );
        Ok(Self { tera })
    }

    pub fn has_template(&self, file: &str) -> bool {
        self.tera.get_template_names().any(|name| name == file)
    }

    pub fn render(&self, file: &str, data: &Value) -> Result<String, DispatchError> {
        if !self.has_template(file) {
            return Err(DispatchError::TemplateNotFound(file.to_string()));
        }
        let context = Context::from_serialize(data)?;
        Ok(self.tera.render(file, &context)?)
    }

    /// Renders `file` once per printable page of `data[items_key]` and wraps the result
    /// in `PAGED_DOCUMENT`.
    ///
    /// Each page sees the shared fields plus `page_number`, `total_pages`,
    /// `is_first_page`, `is_last_page` and its own numbered slice of items (`sl_no`).
    /// A document without items still renders as a single empty page.
    pub fn render_paginated_document(
        &self,
        file: &str,
        items_key: &str,
        data: &Value,
        metrics: &PageMetrics,
    ) -> Result<String, DispatchError> {
        let mut shared = data.as_object().cloned().ok_or_else(|| {
            DispatchError::InvalidPayload(format!("{file} expects a JSON object"))
        })?;
        let items = match shared.remove(items_key) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(DispatchError::InvalidPayload(format!(
                    "{items_key} must be an array"
                )))
            }
        };

        let body = if items.is_empty() {
            let context = page_context(&shared, items_key, 1, 1, Value::Array(Vec::new()));
            self.render(file, &context)?
        } else {
            let planner = PageLayoutPlanner::new(*metrics);
            debug!(
                "Paginating {} items at {} rows per page",
                items.len(),
                planner.max_rows_per_page()
            );
            planner.render_paginated(&items, |page| {
                let page_items = serde_json::to_value(&page.items)
                    .map_err(|e| DispatchError::InvalidPayload(e.to_string()))?;
                let context = page_context(
                    &shared,
                    items_key,
                    page.page_number,
                    page.total_pages,
                    page_items,
                );
                self.render(file, &context)
            })?
        };

        let mut document = shared;
        document.insert("pages_html".to_string(), Value::String(body));
        document.insert(
            "page_break_css".to_string(),
            Value::String(page_break_css().to_string()),
        );
        self.render(PAGED_DOCUMENT, &Value::Object(document))
    }
}

fn page_context(
    shared: &Map<String, Value>,
    items_key: &str,
    page_number: usize,
    total_pages: usize,
    items: Value,
) -> Value {
    let mut context = shared.clone();
    context.insert(items_key.to_string(), items);
    context.insert("page_number".to_string(), Value::from(page_number));
    context.insert("total_pages".to_string(), Value::from(total_pages));
    context.insert("is_first_page".to_string(), Value::Bool(page_number == 1));
    context.insert(
        "is_last_page".to_string(),
        Value::Bool(page_number == total_pages),
    );
    Value::Object(context)
}
