//! EmailService is the single entry point for sending templated email.
//!
//! Flow for every send: dispatch-table lookup → data shaping → tera render
//! (paginated for prescription documents) → transport.

use std::sync::Arc;

use lettre::message::Mailbox;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::layout::PageMetrics;
use crate::mail::render::TemplateRenderer;
use crate::mail::templates::{self, DataShape, TemplateSpec};
use crate::mail::transport::{MailTransport, OutgoingEmail, SendReceipt};
use crate::mail::DispatchError;

pub const DEFAULT_SENDER: &str = "SendScript <noreply@sendscript.com>";

pub struct EmailService {
    renderer: TemplateRenderer,
    transport: Arc<dyn MailTransport>,
    sender: String,
    page_metrics: PageMetrics,
}

/// Clinic contact block used by the prescription token email.
#[derive(Debug, Clone, Default)]
pub struct ClinicContact {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
}

impl EmailService {
    pub fn new(
        renderer: TemplateRenderer,
        transport: Arc<dyn MailTransport>,
        sender: String,
        page_metrics: PageMetrics,
    ) -> Self {
        Self {
            renderer,
            transport,
            sender,
            page_metrics,
        }
    }

    /// Renders and sends `template_name` to `recipient`.
    ///
    /// `custom_subject` replaces the dispatch-table subject when given.
    pub async fn send_template_email(
        &self,
        template_name: &str,
        recipient: &str,
        input: &Value,
        custom_subject: Option<&str>,
    ) -> Result<SendReceipt, DispatchError> {
        self.send_with_metrics(template_name, recipient, input, custom_subject, None)
            .await
    }

    /// Like `send_template_email`, with page geometry for paginated documents.
    /// `None` uses the service's configured metrics.
    pub async fn send_with_metrics(
        &self,
        template_name: &str,
        recipient: &str,
        input: &Value,
        custom_subject: Option<&str>,
        metrics: Option<PageMetrics>,
    ) -> Result<SendReceipt, DispatchError> {
        let result = self
            .dispatch(template_name, recipient, input, custom_subject, metrics)
            .await;

        match &result {
            Ok(receipt) => info!(
                template = template_name,
                to = recipient,
                message_id = %receipt.message_id,
                "Email sent"
            ),
            Err(e) => error!(
                template = template_name,
                to = recipient,
                "Failed to send email: {e}"
            ),
        }

        result
    }

    async fn dispatch(
        &self,
        template_name: &str,
        recipient: &str,
        input: &Value,
        custom_subject: Option<&str>,
        metrics: Option<PageMetrics>,
    ) -> Result<SendReceipt, DispatchError> {
        let spec = templates::lookup(template_name)?;
        recipient.parse::<Mailbox>()?;

        let html = self.render_spec(spec, input, metrics.as_ref())?;

        let email = OutgoingEmail {
            from: self.sender.clone(),
            to: recipient.to_string(),
            subject: custom_subject.unwrap_or(spec.subject).to_string(),
            html,
        };

        self.transport.send(email).await
    }

    /// Renders a template exactly as it would be sent, without sending it.
    pub fn render_preview(&self, template_name: &str, input: &Value) -> Result<String, DispatchError> {
        let spec = templates::lookup(template_name)?;
        self.render_spec(spec, input, None)
    }

    fn render_spec(
        &self,
        spec: &TemplateSpec,
        input: &Value,
        metrics: Option<&PageMetrics>,
    ) -> Result<String, DispatchError> {
        let data = templates::shape_data(spec, input)?;
        match spec.shape {
            DataShape::Paginated { items_key } => self.renderer.render_paginated_document(
                spec.file,
                items_key,
                &data,
                metrics.unwrap_or(&self.page_metrics),
            ),
            DataShape::Fields(_) | DataShape::Passthrough => self.renderer.render(spec.file, &data),
        }
    }

    /// Returns false (and logs why) when the SMTP server is unreachable or rejects the login.
    pub async fn test_connection(&self) -> bool {
        match self.transport.verify().await {
            Ok(true) => {
                info!("SMTP connection successful");
                true
            }
            Ok(false) => {
                error!("SMTP connection failed: server did not accept the connection");
                false
            }
            Err(e) => {
                error!("SMTP connection failed: {e}");
                false
            }
        }
    }

    // ── typed helpers ────────────────────────────────────────────────────────

    pub async fn send_doctor_account_created(
        &self,
        email: &str,
        doctor_name: &str,
        login_url: &str,
    ) -> Result<SendReceipt, DispatchError> {
        let data = json!({ "doctor_name": doctor_name, "login_url": login_url });
        self.send_template_email("doctorAccountCreated", email, &data, None)
            .await
    }

    pub async fn send_pharmacy_verification(
        &self,
        email: &str,
        otp: &str,
        purpose: Option<&str>,
        validity: Option<u32>,
    ) -> Result<SendReceipt, DispatchError> {
        let data = json!({ "otp": otp, "purpose": purpose, "validity": validity });
        self.send_template_email("pharmacyVerification", email, &data, None)
            .await
    }

    pub async fn send_forgot_password(
        &self,
        email: &str,
        doctor_name: &str,
        otp: &str,
    ) -> Result<SendReceipt, DispatchError> {
        let data = json!({ "doctor_name": doctor_name, "otp": otp });
        self.send_template_email("forgotPassword", email, &data, None)
            .await
    }

    pub async fn send_prescription(
        &self,
        email: &str,
        prescription: &Value,
        with_sign: bool,
        metrics: Option<PageMetrics>,
    ) -> Result<SendReceipt, DispatchError> {
        let template = if with_sign {
            "prescriptionWithSign"
        } else {
            "prescriptionWithoutSign"
        };
        self.send_with_metrics(template, email, prescription, None, metrics)
            .await
    }

    pub async fn send_invoice(&self, email: &str, invoice: &Value) -> Result<SendReceipt, DispatchError> {
        self.send_template_email("invoiceGenerate", email, invoice, None)
            .await
    }

    pub async fn send_token(
        &self,
        email: &str,
        patient_name: &str,
        doctor_name: Option<&str>,
        clinic_name: Option<&str>,
        prescription_id: &str,
        clinic: &ClinicContact,
    ) -> Result<SendReceipt, DispatchError> {
        let data = json!({
            "patient_name": patient_name,
            "doctor_name": doctor_name,
            "clinic_name": clinic_name,
            "prescription_id": prescription_id,
            "clinic_address": clinic.address,
            "clinic_city": clinic.city,
            "clinic_postal_code": clinic.postal_code,
            "clinic_country": clinic.country,
            "clinic_mobile": clinic.mobile,
            "clinic_email": clinic.email,
        });
        self.send_template_email("sendToken", email, &data, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::pagination::PAGE_BREAK_MARKER;
    use crate::mail::testing::{service_with, RecordingTransport};
    use crate::samples;

    #[tokio::test]
    async fn test_send_template_email_renders_and_sends() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        let receipt = service
            .send_doctor_account_created("doctor@example.com", "Dr. Jane Smith", "https://app/login")
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "doctor@example.com");
        assert_eq!(sent[0].from, DEFAULT_SENDER);
        assert_eq!(
            sent[0].subject,
            "Welcome to SendScript - Account Created Successfully!"
        );
        assert!(sent[0].html.contains("Dr. Jane Smith"));
        // Autoescape encodes `/` inside the link.
        assert!(sent[0].html.contains("https:&#x2F;&#x2F;app&#x2F;login"));
        assert_eq!(receipt.to, "doctor@example.com");
        assert!(!receipt.message_id.is_empty());
    }

    #[tokio::test]
    async fn test_custom_subject_overrides_table() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        service
            .send_template_email(
                "paymentLink",
                "patient@example.com",
                &json!({ "link": "https://pay/1" }),
                Some("Pay now"),
            )
            .await
            .unwrap();
        assert_eq!(transport.sent()[0].subject, "Pay now");
    }

    #[tokio::test]
    async fn test_unknown_template_is_not_sent() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        let err = service
            .send_template_email("nope", "a@example.com", &json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTemplate(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_recipient_rejected_before_render() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        let err = service
            .send_forgot_password("not-an-address", "Dr. A", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Address(_)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_propagate() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        let err = service
            .send_template_email("forgotPassword", "a@example.com", &json!({ "otp": "1" }), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: doctorName");
    }

    #[tokio::test]
    async fn test_pharmacy_verification_defaults() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        service
            .send_pharmacy_verification("pharmacy@example.com", "123456", None, None)
            .await
            .unwrap();
        let html = &transport.sent()[0].html;
        assert!(html.contains("123456"));
        assert!(html.contains("verification"));
        assert!(html.contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_prescription_is_paginated() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        // Default A4 metrics fit 11 rows: 25 items → 3 pages.
        let prescription = samples::prescription(25);
        service
            .send_prescription("patient@example.com", &prescription, true, None)
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].subject, "Private Prescription with Electronic Signature");
        assert_eq!(sent[0].html.matches(PAGE_BREAK_MARKER).count(), 2);
        assert!(sent[0].html.contains("Page 3 of 3"));
    }

    #[tokio::test]
    async fn test_prescription_metrics_override() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        let metrics = PageMetrics {
            row_height: 20.0,
            ..PageMetrics::default()
        };
        service
            .send_prescription("patient@example.com", &samples::prescription(25), false, Some(metrics))
            .await
            .unwrap();
        // 442.66 / 20 → 22 rows per page → 2 pages.
        assert_eq!(transport.sent()[0].html.matches(PAGE_BREAK_MARKER).count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = RecordingTransport::failing();
        let service = service_with(transport.clone());

        let result = service
            .send_template_email("paymentLink", "a@example.com", &json!({ "link": "x" }), None)
            .await;
        assert!(matches!(result, Err(DispatchError::Delivery(_))));
    }

    #[tokio::test]
    async fn test_test_connection_reports_transport_state() {
        let ok = service_with(RecordingTransport::new());
        assert!(ok.test_connection().await);

        let down = service_with(RecordingTransport::failing());
        assert!(!down.test_connection().await);
    }

    #[tokio::test]
    async fn test_send_token_fills_clinic_block() {
        let transport = RecordingTransport::new();
        let service = service_with(transport.clone());

        let clinic = ClinicContact {
            city: Some("London".to_string()),
            ..ClinicContact::default()
        };
        service
            .send_token("p@example.com", "John Doe", None, Some("SendScript Clinic"), "RX42", &clinic)
            .await
            .unwrap();
        let html = &transport.sent()[0].html;
        assert!(html.contains("RX42"));
        assert!(html.contains("London"));
    }

    #[test]
    fn test_render_preview_for_every_template() {
        let service = service_with(RecordingTransport::new());
        for spec in templates::TEMPLATES {
            let html = service
                .render_preview(spec.name, &samples::sample_input(spec))
                .unwrap_or_else(|e| panic!("{} failed to render: {e}", spec.name));
            assert!(!html.trim().is_empty(), "{} rendered empty", spec.name);
        }
    }
}
