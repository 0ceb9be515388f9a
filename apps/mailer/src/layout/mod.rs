// Print layout for paginated documents.
// Row capacity is derived from page geometry; rendering is left to the caller.

pub mod pagination;

// Re-export the public API consumed by other modules (mail, routes).
pub use pagination::{
    page_break_css, LayoutError, PageLayoutPlanner, PageMetrics, PageMetricsOverrides,
};
