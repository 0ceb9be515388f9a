//! Test doubles shared by the mail, routes and cli test modules.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::layout::PageMetrics;
use crate::mail::render::TemplateRenderer;
use crate::mail::service::{EmailService, DEFAULT_SENDER};
use crate::mail::transport::{MailTransport, OutgoingEmail, SendReceipt};
use crate::mail::DispatchError;

/// Records every email instead of delivering it.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Rejects every send and reports the server as unreachable.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        })
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<SendReceipt, DispatchError> {
        if self.failing {
            return Err(DispatchError::Delivery("connection refused".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        let receipt = SendReceipt {
            message_id: format!("<test-{}@sendscript.com>", sent.len() + 1),
            to: email.to.clone(),
            subject: email.subject.clone(),
        };
        sent.push(email);
        Ok(receipt)
    }

    async fn verify(&self) -> Result<bool, DispatchError> {
        Ok(!self.failing)
    }
}

/// The bundled template directory.
pub fn template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// A renderer over a throwaway directory holding `files`.
/// Keep the `TempDir` alive for as long as the renderer is used.
pub fn renderer_with(files: &[(&str, &str)]) -> (TempDir, TemplateRenderer) {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    let renderer = TemplateRenderer::from_dir(dir.path()).unwrap();
    (dir, renderer)
}

/// An `EmailService` over the bundled templates and default A4 metrics.
pub fn service_with(transport: Arc<RecordingTransport>) -> EmailService {
    let renderer = TemplateRenderer::from_dir(&template_dir()).unwrap();
    EmailService::new(
        renderer,
        transport,
        DEFAULT_SENDER.to_string(),
        PageMetrics::default(),
    )
}
