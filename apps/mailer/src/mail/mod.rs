// Email dispatch: template lookup → data shaping → render → SMTP send.
// Rendering is delegated to tera, delivery to lettre.

pub mod render;
pub mod service;
pub mod templates;
pub mod transport;

#[cfg(test)]
pub mod testing;

use thiserror::Error;

use crate::layout::LayoutError;

pub use render::TemplateRenderer;
pub use service::EmailService;
pub use transport::{SendReceipt, SmtpTransport};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Template {0} not found")]
    UnknownTemplate(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Template file {0} not found")]
    TemplateNotFound(String),

    #[error("Render error: {0}")]
    Render(#[from] tera::Error),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Message build error: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}
