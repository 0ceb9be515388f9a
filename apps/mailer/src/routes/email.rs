use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{AppError, AppJson};
use crate::layout::PageMetricsOverrides;
use crate::mail::service::ClinicContact;
use crate::mail::templates::{self, FieldDefault};
use crate::mail::SendReceipt;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
}

impl SendResponse {
    fn sent(message: &str, receipt: SendReceipt) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
            message_id: receipt.message_id,
        })
    }
}

// ─── Typed endpoints ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorEmailRequest {
    pub email: Option<String>,
    pub doctor_name: Option<String>,
    pub login_url: Option<String>,
}

/// POST /api/send-doctor-email
pub async fn handle_send_doctor_email(
    State(state): State<AppState>,
    AppJson(req): AppJson<DoctorEmailRequest>,
) -> Result<Json<SendResponse>, AppError> {
    AppError::require(&[
        ("email", req.email.as_deref()),
        ("doctorName", req.doctor_name.as_deref()),
        ("loginUrl", req.login_url.as_deref()),
    ])?;
    let receipt = state
        .mailer
        .send_doctor_account_created(
            req.email.as_deref().unwrap_or_default(),
            req.doctor_name.as_deref().unwrap_or_default(),
            req.login_url.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(SendResponse::sent("Doctor account email sent successfully", receipt))
}

#[derive(Deserialize)]
pub struct PharmacyVerificationRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub purpose: Option<String>,
    pub validity: Option<u32>,
}

/// POST /api/send-pharmacy-verification
pub async fn handle_send_pharmacy_verification(
    State(state): State<AppState>,
    AppJson(req): AppJson<PharmacyVerificationRequest>,
) -> Result<Json<SendResponse>, AppError> {
    AppError::require(&[("email", req.email.as_deref()), ("otp", req.otp.as_deref())])?;
    let receipt = state
        .mailer
        .send_pharmacy_verification(
            req.email.as_deref().unwrap_or_default(),
            req.otp.as_deref().unwrap_or_default(),
            req.purpose.as_deref(),
            req.validity,
        )
        .await?;
    Ok(SendResponse::sent("Pharmacy verification email sent successfully", receipt))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
    pub doctor_name: Option<String>,
    pub otp: Option<String>,
}

/// POST /api/send-forgot-password
pub async fn handle_send_forgot_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ForgotPasswordRequest>,
) -> Result<Json<SendResponse>, AppError> {
    AppError::require(&[
        ("email", req.email.as_deref()),
        ("doctorName", req.doctor_name.as_deref()),
        ("otp", req.otp.as_deref()),
    ])?;
    let receipt = state
        .mailer
        .send_forgot_password(
            req.email.as_deref().unwrap_or_default(),
            req.doctor_name.as_deref().unwrap_or_default(),
            req.otp.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(SendResponse::sent("Forgot password email sent successfully", receipt))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRequest {
    pub email: Option<String>,
    pub prescription_data: Option<Value>,
    #[serde(default)]
    pub with_sign: bool,
    /// Partial page geometry; missing fields use the A4 defaults.
    pub page_metrics: Option<PageMetricsOverrides>,
}

/// POST /api/send-prescription
pub async fn handle_send_prescription(
    State(state): State<AppState>,
    AppJson(req): AppJson<PrescriptionRequest>,
) -> Result<Json<SendResponse>, AppError> {
    let data = non_null(req.prescription_data);
    AppError::require(&[
        ("email", req.email.as_deref()),
        ("prescriptionData", data.as_ref().map(|_| "present")),
    ])?;
    let metrics = req.page_metrics.map(|overrides| overrides.resolve());
    let receipt = state
        .mailer
        .send_prescription(
            req.email.as_deref().unwrap_or_default(),
            data.as_ref().unwrap_or(&Value::Null),
            req.with_sign,
            metrics,
        )
        .await?;
    Ok(SendResponse::sent("Prescription email sent successfully", receipt))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub email: Option<String>,
    pub invoice_data: Option<Value>,
}

/// POST /api/send-invoice
pub async fn handle_send_invoice(
    State(state): State<AppState>,
    AppJson(req): AppJson<InvoiceRequest>,
) -> Result<Json<SendResponse>, AppError> {
    let data = non_null(req.invoice_data);
    AppError::require(&[
        ("email", req.email.as_deref()),
        ("invoiceData", data.as_ref().map(|_| "present")),
    ])?;
    let receipt = state
        .mailer
        .send_invoice(
            req.email.as_deref().unwrap_or_default(),
            data.as_ref().unwrap_or(&Value::Null),
        )
        .await?;
    Ok(SendResponse::sent("Invoice email sent successfully", receipt))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicData {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
}

impl From<ClinicData> for ClinicContact {
    fn from(c: ClinicData) -> Self {
        ClinicContact {
            address: c.address,
            city: c.city,
            postal_code: c.postal_code,
            country: c.country,
            mobile: c.mobile,
            email: c.email,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTokenRequest {
    pub email: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub clinic_name: Option<String>,
    pub prescription_id: Option<String>,
    pub clinic_data: Option<ClinicData>,
}

/// POST /api/send-token
pub async fn handle_send_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<SendTokenRequest>,
) -> Result<Json<SendResponse>, AppError> {
    AppError::require(&[
        ("email", req.email.as_deref()),
        ("patientName", req.patient_name.as_deref()),
        ("prescriptionId", req.prescription_id.as_deref()),
    ])?;
    let clinic = ClinicContact::from(req.clinic_data.unwrap_or_default());
    let receipt = state
        .mailer
        .send_token(
            req.email.as_deref().unwrap_or_default(),
            req.patient_name.as_deref().unwrap_or_default(),
            req.doctor_name.as_deref(),
            req.clinic_name.as_deref(),
            req.prescription_id.as_deref().unwrap_or_default(),
            &clinic,
        )
        .await?;
    Ok(SendResponse::sent("Prescription token email sent successfully", receipt))
}

// ─── Generic dispatch ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GenericSendRequest {
    pub email: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// POST /api/send/:template
pub async fn handle_send_template(
    State(state): State<AppState>,
    Path(template): Path<String>,
    AppJson(req): AppJson<GenericSendRequest>,
) -> Result<Json<SendResponse>, AppError> {
    AppError::require(&[("email", req.email.as_deref())])?;
    let data = non_null(req.data).unwrap_or_else(|| Value::Object(Map::new()));
    let subject = req.subject.as_deref().filter(|s| !s.trim().is_empty());
    let receipt = state
        .mailer
        .send_template_email(
            &template,
            req.email.as_deref().unwrap_or_default(),
            &data,
            subject,
        )
        .await?;
    Ok(SendResponse::sent(
        &format!("{template} email sent successfully"),
        receipt,
    ))
}

// ─── Introspection ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FieldSummary {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub default: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct TemplateSummary {
    pub name: &'static str,
    pub label: &'static str,
    pub file: &'static str,
    pub subject: &'static str,
    pub category: &'static str,
    pub paginated: bool,
    pub fields: Vec<FieldSummary>,
}

/// GET /api/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateSummary>> {
    let summaries = templates::TEMPLATES
        .iter()
        .map(|spec| TemplateSummary {
            name: spec.name,
            label: spec.label,
            file: spec.file,
            subject: spec.subject,
            category: spec.category.as_str(),
            paginated: spec.is_paginated(),
            fields: spec
                .fields()
                .iter()
                .map(|f| FieldSummary {
                    key: f.key,
                    label: f.label,
                    required: f.required,
                    default: f.default.map(FieldDefault::to_value),
                })
                .collect(),
        })
        .collect();
    Json(summaries)
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub success: bool,
    pub message: &'static str,
}

/// GET /api/test-connection
pub async fn handle_test_connection(State(state): State<AppState>) -> Json<ConnectionResponse> {
    let success = state.mailer.test_connection().await;
    Json(ConnectionResponse {
        success,
        message: if success {
            "SMTP connection successful"
        } else {
            "SMTP connection failed"
        },
    })
}

fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}
