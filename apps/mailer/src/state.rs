use std::path::PathBuf;
use std::sync::Arc;

use crate::mail::EmailService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub mailer: Arc<EmailService>,
    /// Static files served for every path no route claims.
    pub public_dir: PathBuf,
}
