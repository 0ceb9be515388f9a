//! Template dispatch table: maps a template name to its file, subject and data contract.
//!
//! Every outgoing email is described by one `TemplateSpec`. The `DataShape` decides how
//! caller input becomes the template's render context:
//! - `Fields`: a fixed contract. Input keys are the camelCase names callers send
//!   (`doctorName`); the snake_case template variable (`doctor_name`) is accepted too.
//!   Dotted variables (`clinic.city`) build nested objects.
//! - `Passthrough`: the input object is the context.
//! - `Paginated`: passthrough, with the item list split into printable pages at render time.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::mail::DispatchError;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Account,
    Clinic,
    Email,
    Pharmacy,
    Prescription,
    Payment,
    Invoice,
    Patient,
    Special,
    Booking,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Account,
        Category::Clinic,
        Category::Email,
        Category::Pharmacy,
        Category::Prescription,
        Category::Payment,
        Category::Invoice,
        Category::Patient,
        Category::Special,
        Category::Booking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Account => "account",
            Category::Clinic => "clinic",
            Category::Email => "email",
            Category::Pharmacy => "pharmacy",
            Category::Prescription => "prescription",
            Category::Payment => "payment",
            Category::Invoice => "invoice",
            Category::Patient => "patient",
            Category::Special => "special",
            Category::Booking => "booking",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Account => "Account Management",
            Category::Clinic => "Clinic Management",
            Category::Email => "Email Verification",
            Category::Pharmacy => "Pharmacy",
            Category::Prescription => "Prescription",
            Category::Payment => "Payment",
            Category::Invoice => "Invoice",
            Category::Patient => "Patient Data",
            Category::Special => "Special",
            Category::Booking => "Booking & Scan",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                format!(
                    "Unknown category '{s}'. Available categories: {}",
                    names.join(", ")
                )
            })
    }
}

/// Value substituted when an optional field is not supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Text(&'static str),
    Int(i64),
    EmptyList,
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Text(s) => Value::String(s.to_string()),
            FieldDefault::Int(n) => Value::from(n),
            FieldDefault::EmptyList => Value::Array(Vec::new()),
        }
    }

    /// Text shown in interactive prompts.
    pub fn display(self) -> String {
        match self {
            FieldDefault::Text(s) => s.to_string(),
            FieldDefault::Int(n) => n.to_string(),
            FieldDefault::EmptyList => "none".to_string(),
        }
    }
}

/// One input field of a template's data contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub var: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub default: Option<FieldDefault>,
}

const fn req(key: &'static str, var: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        var,
        label,
        required: true,
        default: None,
    }
}

const fn opt(key: &'static str, var: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        var,
        label,
        required: false,
        default: None,
    }
}

const fn dflt(
    key: &'static str,
    var: &'static str,
    label: &'static str,
    default: FieldDefault,
) -> FieldSpec {
    FieldSpec {
        key,
        var,
        label,
        required: false,
        default: Some(default),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataShape {
    Fields(&'static [FieldSpec]),
    Passthrough,
    Paginated { items_key: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub file: &'static str,
    pub subject: &'static str,
    pub category: Category,
    pub shape: DataShape,
}

impl TemplateSpec {
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self.shape {
            DataShape::Fields(fields) => fields,
            DataShape::Passthrough | DataShape::Paginated { .. } => &[],
        }
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self.shape, DataShape::Paginated { .. })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch table
// ────────────────────────────────────────────────────────────────────────────

const PRESCRIPTION_ITEMS: DataShape = DataShape::Paginated {
    items_key: "prescription_items",
};

pub static TEMPLATES: &[TemplateSpec] = &[
    // Account management
    TemplateSpec {
        name: "accountBlockedBySuperAdmin",
        label: "Account Blocked by Super Admin",
        file: "account-blocked-by-super-admin.html",
        subject: "Your SendScript Account Has Been Blocked",
        category: Category::Account,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            dflt(
                "reason",
                "reason",
                "reason for blocking",
                FieldDefault::Text("Policy violations"),
            ),
        ]),
    },
    TemplateSpec {
        name: "accountRejectedBySuperAdmin",
        label: "Account Rejected by Super Admin",
        file: "account-rejected-by-super-admin.html",
        subject: "Update on Your SendScript Account Application",
        category: Category::Account,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("reason", "reason", "rejection reason"),
        ]),
    },
    TemplateSpec {
        name: "doctorAccountCreated",
        label: "Doctor Account Created",
        file: "doctor-account-created.html",
        subject: "Welcome to SendScript - Account Created Successfully!",
        category: Category::Account,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("loginUrl", "login_url", "login URL"),
        ]),
    },
    TemplateSpec {
        name: "doctorAccountCreation",
        label: "Doctor Account Creation",
        file: "doctor-account-creation.html",
        subject: "Verify Your SendScript Account",
        category: Category::Account,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("verificationCode", "otp", "verification code"),
        ]),
    },
    TemplateSpec {
        name: "doctorSuperAdminApproval",
        label: "Doctor Super Admin Approval",
        file: "doctor-super-admin-approval.html",
        subject: "Your SendScript Account Has Been Approved",
        category: Category::Account,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("loginUrl", "login_url", "login URL"),
        ]),
    },
    TemplateSpec {
        name: "signup",
        label: "Signup",
        file: "signup.html",
        subject: "Complete Your SendScript Sign Up",
        category: Category::Account,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("otp", "otp", "OTP"),
        ]),
    },
    // Clinic management
    TemplateSpec {
        name: "clinicJoinRequest",
        label: "Clinic Join Request",
        file: "clinic-join-request.html",
        subject: "New Clinic Join Request",
        category: Category::Clinic,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("clinicName", "clinic_name", "clinic name"),
        ]),
    },
    TemplateSpec {
        name: "clinicRegistration",
        label: "Clinic Registration",
        file: "clinic-registration.html",
        subject: "Clinic Registration Received",
        category: Category::Clinic,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("clinicName", "clinic_name", "clinic name"),
        ]),
    },
    TemplateSpec {
        name: "clinicRegistrationApproved",
        label: "Clinic Registration Approved",
        file: "clinic-registration-approved.html",
        subject: "Your Clinic Registration Has Been Approved",
        category: Category::Clinic,
        shape: DataShape::Fields(&[req("doctorName", "doctor_name", "doctor name")]),
    },
    TemplateSpec {
        name: "clinicRegistrationUnsuccessful",
        label: "Clinic Registration Unsuccessful",
        file: "clinic-registration-unsuccessful.html",
        subject: "Clinic Registration Update",
        category: Category::Clinic,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("reason", "remarks", "reason"),
        ]),
    },
    TemplateSpec {
        name: "inviteDoctor",
        label: "Invite Doctor",
        file: "invite-doctor.html",
        subject: "You've Been Invited to Join SendScript",
        category: Category::Clinic,
        shape: DataShape::Fields(&[
            req("inviteeName", "invitee_name", "invitee name"),
            req(
                "invitingDoctorName",
                "inviting_doctor_name",
                "inviting doctor name",
            ),
            req(
                "acceptInvitationLink",
                "accept_invitation_link",
                "accept invitation link",
            ),
            dflt(
                "buttonText",
                "button_text",
                "button text",
                FieldDefault::Text("Accept Invitation"),
            ),
        ]),
    },
    TemplateSpec {
        name: "paInvites",
        label: "PA Invites",
        file: "pa-invites.html",
        subject: "You've Been Invited as a Personal Assistant on SendScript",
        category: Category::Clinic,
        shape: DataShape::Passthrough,
    },
    // Email verification
    TemplateSpec {
        name: "emailVerificationAccountCreation",
        label: "Email Verification Account Creation",
        file: "email-verification-account-creation.html",
        subject: "Verify Your Email Address",
        category: Category::Email,
        shape: DataShape::Fields(&[
            req("userName", "user_name", "user name"),
            req("verificationCode", "verification_code", "verification code"),
        ]),
    },
    TemplateSpec {
        name: "emailVerificationOnboarding",
        label: "Email Verification Onboarding",
        file: "email-verification-onboarding.html",
        subject: "Your SendScript Verification Code",
        category: Category::Email,
        shape: DataShape::Fields(&[req("otp", "otp", "OTP")]),
    },
    TemplateSpec {
        name: "updateEmailAddress",
        label: "Update Email Address",
        file: "update-email-address.html",
        subject: "Confirm Your New Email Address",
        category: Category::Email,
        shape: DataShape::Fields(&[
            req("userName", "user_name", "user name"),
            req("verificationCode", "verification_code", "verification code"),
        ]),
    },
    TemplateSpec {
        name: "forgotPassword",
        label: "Forgot Password",
        file: "forgot-password.html",
        subject: "Reset Your SendScript Password - Verification Code Inside",
        category: Category::Email,
        shape: DataShape::Fields(&[
            req("doctorName", "doctor_name", "doctor name"),
            req("otp", "otp", "reset OTP"),
        ]),
    },
    TemplateSpec {
        name: "reinitiateOnfidoVerification",
        label: "Reinitiate Onfido Verification",
        file: "reinitiate-onfido-verification.html",
        subject: "Action Required: Complete Your Identity Verification",
        category: Category::Email,
        shape: DataShape::Fields(&[req("doctorName", "doctor_name", "doctor name")]),
    },
    // Pharmacy
    TemplateSpec {
        name: "pharmacyVerification",
        label: "Pharmacy Verification",
        file: "pharmacy-verification.html",
        subject: "Your One-Time Password (OTP) - SendScript",
        category: Category::Pharmacy,
        shape: DataShape::Fields(&[
            req("otp", "otp", "OTP (6 digits)"),
            dflt(
                "purpose",
                "purpose",
                "purpose",
                FieldDefault::Text("verification"),
            ),
            dflt(
                "validity",
                "validity",
                "validity in minutes",
                FieldDefault::Int(10),
            ),
        ]),
    },
    TemplateSpec {
        name: "pharmacyOwnerBlocked",
        label: "Pharmacy Owner Blocked",
        file: "pharmacy-owner-blocked.html",
        subject: "Your Pharmacy Account Has Been Blocked",
        category: Category::Pharmacy,
        shape: DataShape::Fields(&[
            req(
                "pharmacyOwnerName",
                "pharmacy_owner_name",
                "pharmacy owner name",
            ),
            req("reason", "reason", "blocking reason"),
        ]),
    },
    TemplateSpec {
        name: "pharmacyOwnerRegistrationApproved",
        label: "Pharmacy Owner Registration Approved",
        file: "pharmacy-owner-registration-approved.html",
        subject: "Your Pharmacy Registration Has Been Approved",
        category: Category::Pharmacy,
        shape: DataShape::Fields(&[req(
            "pharmacyOwnerName",
            "pharmacy_owner_name",
            "pharmacy owner name",
        )]),
    },
    TemplateSpec {
        name: "pharmacyOwnerRegistrationUnsuccessful",
        label: "Pharmacy Owner Registration Unsuccessful",
        file: "pharmacy-owner-registration-unsuccessful.html",
        subject: "Pharmacy Registration Update",
        category: Category::Pharmacy,
        shape: DataShape::Fields(&[
            req(
                "pharmacyOwnerName",
                "pharmacy_owner_name",
                "pharmacy owner name",
            ),
            req("reason", "reason", "reason"),
        ]),
    },
    TemplateSpec {
        name: "pharmacyOwnerInvitesPharmacist",
        label: "Pharmacy Owner Invites Pharmacist",
        file: "pharmacy-owner-invites-pharmacist.html",
        subject: "You've Been Invited to Join a Pharmacy on SendScript",
        category: Category::Pharmacy,
        shape: DataShape::Passthrough,
    },
    TemplateSpec {
        name: "pharmacyViaPrescription",
        label: "Pharmacy Via Prescription",
        file: "pharmacy-via-prescription.html",
        subject: "New Electronic Private Prescription",
        category: Category::Pharmacy,
        shape: PRESCRIPTION_ITEMS,
    },
    TemplateSpec {
        name: "pharmacyEmail",
        label: "Pharmacy Email",
        file: "pharmacy-email.html",
        subject: "A Message from Your Pharmacy",
        category: Category::Pharmacy,
        shape: DataShape::Passthrough,
    },
    // Prescription
    TemplateSpec {
        name: "prescriptionWithSign",
        label: "Prescription With Sign",
        file: "prescription-with-sign.html",
        subject: "Private Prescription with Electronic Signature",
        category: Category::Prescription,
        shape: PRESCRIPTION_ITEMS,
    },
    TemplateSpec {
        name: "prescriptionWithoutSign",
        label: "Prescription Without Sign",
        file: "prescription-without-sign.html",
        subject: "Private Prescription for Manual Signature",
        category: Category::Prescription,
        shape: PRESCRIPTION_ITEMS,
    },
    TemplateSpec {
        name: "pharmacistWithSign",
        label: "Pharmacist With Sign",
        file: "pharmacist-with-sign.html",
        subject: "Private Prescription - Pharmacist Copy",
        category: Category::Prescription,
        shape: PRESCRIPTION_ITEMS,
    },
    TemplateSpec {
        name: "prescriptionFromPharmacy",
        label: "Prescription From Pharmacy",
        file: "prescription-from-pharmacy.html",
        subject: "Your Prescription Is Ready",
        category: Category::Prescription,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("pharmacyName", "pharmacy_name", "pharmacy name"),
            req("pharmacyEmail", "pharmacy_email", "pharmacy email"),
            req(
                "pharmacyAddress1",
                "pharmacy_address_1",
                "pharmacy address line 1",
            ),
            opt(
                "pharmacyAddress2",
                "pharmacy_address_2",
                "pharmacy address line 2",
            ),
            req("city", "city", "city"),
            req("postalCode", "postal_code", "postal code"),
            req("country", "country", "country"),
            req(
                "pharmacyContactNumber",
                "pharmacy_contact_number",
                "pharmacy contact number",
            ),
            req("prescriptionUrl", "prescription_url", "prescription URL"),
        ]),
    },
    TemplateSpec {
        name: "sendToken",
        label: "Send Token",
        file: "send-token.html",
        subject: "Electronic Private Prescription - Prescription ID",
        category: Category::Prescription,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            opt("doctorName", "doctor_name", "doctor name"),
            opt("clinicName", "clinic_name", "clinic name"),
            req("prescriptionId", "prescription_id", "prescription ID"),
            opt("clinicAddress", "clinic_address", "clinic address"),
            opt("clinicCity", "clinic_city", "clinic city"),
            opt("clinicPostalCode", "clinic_postal_code", "clinic postal code"),
            opt("clinicCountry", "clinic_country", "clinic country"),
            opt("clinicMobile", "clinic_mobile", "clinic mobile"),
            opt("clinicEmail", "clinic_email", "clinic email"),
        ]),
    },
    TemplateSpec {
        name: "sendToUnregisterPharmacy",
        label: "Send to Unregister Pharmacy",
        file: "sendto-unregister-pharmacy.html",
        subject: "Electronic Private Prescription from SendScript",
        category: Category::Prescription,
        shape: DataShape::Fields(&[
            req("pharmacyName", "pharmacyName", "pharmacy name"),
            req("prescriptionCode", "prescriptionCode", "prescription code"),
            req("patientName", "patientName", "patient name"),
            req("patientDob", "patientDob", "patient DOB (YYYY-MM-DD)"),
            req("patientMobile", "patientMobileNumber", "patient mobile"),
            req("clinicName", "clinic.name", "clinic name"),
            req("clinicAddress1", "clinic.address_line_1", "clinic address line 1"),
            opt("clinicAddress2", "clinic.address_line_2", "clinic address line 2"),
            req("clinicCity", "clinic.city", "clinic city"),
            req("clinicPostalCode", "clinic.postal_code", "clinic postal code"),
            dflt(
                "clinicCountry",
                "clinic.country",
                "clinic country",
                FieldDefault::Text("United Kingdom"),
            ),
            req(
                "clinicContactNumber",
                "clinic.contact_number",
                "clinic contact number",
            ),
            req("clinicEmail", "clinic.email", "clinic email"),
        ]),
    },
    // Payment
    TemplateSpec {
        name: "paymentConfirmed",
        label: "Payment Confirmed",
        file: "payment-confirmed.html",
        subject: "Payment Confirmed - SendScript",
        category: Category::Payment,
        shape: DataShape::Passthrough,
    },
    TemplateSpec {
        name: "paymentForPrescription",
        label: "Payment For Prescription",
        file: "payment-for-prescription.html",
        subject: "Payment Request for Your Prescription",
        category: Category::Payment,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("pharmacyName", "pharmacy_name", "pharmacy name"),
            req("prescriptionId", "prescription_id", "prescription ID"),
            req("amount", "amount", "amount"),
            req(
                "securePaymentLink",
                "secure_payment_link",
                "secure payment link",
            ),
        ]),
    },
    TemplateSpec {
        name: "paymentLink",
        label: "Payment Link",
        file: "payment-link.html",
        subject: "Your SendScript Payment Link",
        category: Category::Payment,
        shape: DataShape::Fields(&[req("link", "link", "payment link")]),
    },
    TemplateSpec {
        name: "paymentLink2",
        label: "Payment Link 2",
        file: "payment-link-2.html",
        subject: "Complete Your Payment",
        category: Category::Payment,
        shape: DataShape::Passthrough,
    },
    TemplateSpec {
        name: "paymentRequestFromPharmacy",
        label: "Payment Request From Pharmacy",
        file: "payment-request-from-pharmacy.html",
        subject: "Payment Request from Your Pharmacy",
        category: Category::Payment,
        shape: DataShape::Fields(&[
            req("prescriptionUrl", "prescription_url", "prescription URL"),
            req("pharmacyName", "pharmacy_name", "pharmacy name"),
            req("patientName", "patient_name", "patient name"),
            req(
                "pharmacyContactNumber",
                "pharmacy_contact_number",
                "pharmacy contact number",
            ),
            req(
                "pharmacyAddress1",
                "pharmacy_address_1",
                "pharmacy address line 1",
            ),
            opt(
                "pharmacyAddress2",
                "pharmacy_address_2",
                "pharmacy address line 2",
            ),
            req("city", "city", "city"),
            req("postalCode", "postal_code", "postal code"),
            req("country", "country", "country"),
            req("pharmacyEmail", "pharmacy_email", "pharmacy email"),
        ]),
    },
    // Invoice
    TemplateSpec {
        name: "invoiceGenerate",
        label: "Invoice Generate",
        file: "invoice-generate.html",
        subject: "Invoice from SendScript Pharmacy",
        category: Category::Invoice,
        shape: DataShape::Passthrough,
    },
    TemplateSpec {
        name: "invoiceFromPharmacy",
        label: "Invoice From Pharmacy",
        file: "invoice-from-pharmacy.html",
        subject: "Your Invoice from SendScript Pharmacy",
        category: Category::Invoice,
        shape: DataShape::Fields(&[
            req("pharmacyName", "pharmacy_name", "pharmacy name"),
            req("patientName", "patient_name", "patient name"),
            req("invoiceUrl", "invoice_url", "invoice URL"),
            req(
                "pharmacyPhoneNumber",
                "pharmacy_phone_number",
                "pharmacy phone number",
            ),
        ]),
    },
    // Patient data
    TemplateSpec {
        name: "patientDataAccess",
        label: "Patient Data Access",
        file: "patient-data-access.html",
        subject: "Your Medical Records Were Accessed",
        category: Category::Patient,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("doctorName", "doctor_name", "doctor name"),
            req("clinicName", "clinic_name", "clinic name"),
        ]),
    },
    // Special
    TemplateSpec {
        name: "lehEmailTemplate",
        label: "LEH Email Template",
        file: "leh-email-template.html",
        subject: "London Elite Health - Patient Registration",
        category: Category::Special,
        shape: DataShape::Passthrough,
    },
    // Booking & scan
    TemplateSpec {
        name: "bookingConfirmationWithInvoice",
        label: "Booking Confirmation With Invoice",
        file: "booking-confirmation-with-invoice.html",
        subject: "Booking Confirmed - Your Scan Appointment",
        category: Category::Booking,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("scanName", "scan_name", "scan name"),
            req("bookingDate", "booking_date", "booking date"),
            req("bookingTime", "booking_time", "booking time"),
            req("centerName", "center_name", "center name"),
            req("centerAddress", "center_address", "center address"),
            dflt(
                "paymentStatus",
                "payment_status",
                "payment status",
                FieldDefault::Text("Confirmed"),
            ),
            req("bookingId", "booking_id", "booking ID"),
            req("invoiceNumber", "invoice_number", "invoice number"),
        ]),
    },
    TemplateSpec {
        name: "bookingInvoiceResend",
        label: "Booking Invoice Resend",
        file: "booking-invoice-resend.html",
        subject: "Your Booking Invoice",
        category: Category::Booking,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("scanName", "scan_name", "scan name"),
            req("invoiceNumber", "invoice_number", "invoice number"),
            req("bookingDate", "booking_date", "booking date"),
            req("bookingTime", "booking_time", "booking time"),
            req("amountPaid", "amount_paid", "amount paid"),
            req("bookingId", "booking_id", "booking ID"),
        ]),
    },
    TemplateSpec {
        name: "bookingRescheduled",
        label: "Booking Rescheduled",
        file: "booking-rescheduled.html",
        subject: "Your Scan Appointment Has Been Rescheduled",
        category: Category::Booking,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("scanName", "scan_name", "scan name"),
            req("newDate", "new_date", "new date"),
            req("newTime", "new_time", "new time"),
            req("centerName", "center_name", "center name"),
            req("centerAddress", "center_address", "center address"),
            req("bookingId", "booking_id", "booking ID"),
            req("oldDate", "old_date", "old date"),
            req("oldTime", "old_time", "old time"),
        ]),
    },
    TemplateSpec {
        name: "paymentLinkResend",
        label: "Payment Link Resend",
        file: "payment-link-resend.html",
        subject: "Reminder: Complete Payment for Your Scan",
        category: Category::Booking,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("scanName", "scan_name", "scan name"),
            req("bookingDate", "booking_date", "booking date"),
            req("bookingTime", "booking_time", "booking time"),
            req("paymentLink", "payment_link", "payment link"),
            req("bookingAmount", "booking_amount", "booking amount"),
            req("bookingId", "booking_id", "booking ID"),
            req("centerName", "center_name", "center name"),
            req("centerAddress", "center_address", "center address"),
        ]),
    },
    TemplateSpec {
        name: "scanSlotReserved",
        label: "Scan Slot Reserved",
        file: "scan-slot-reserved.html",
        subject: "Your Scan Slot Is Reserved - Complete Payment",
        category: Category::Booking,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("scanName", "scan_name", "scan name"),
            req("bookingDate", "booking_date", "booking date"),
            req("bookingTime", "booking_time", "booking time"),
            req("centerName", "center_name", "center name"),
            req("centerAddress", "center_address", "center address"),
            req(
                "completePaymentUrl",
                "complete_payment_url",
                "complete payment URL",
            ),
            req("bookingAmount", "booking_amount", "booking amount"),
            req("bookingId", "booking_id", "booking ID"),
            req(
                "reservationExpires",
                "reservation_expires",
                "reservation expiry",
            ),
        ]),
    },
    TemplateSpec {
        name: "sendScanReportDoctor",
        label: "Send Scan Report to Doctor",
        file: "send-scan-report-doctor.html",
        subject: "Scan Report Available for Your Patient",
        category: Category::Booking,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("scanName", "scan_name", "scan name"),
            req("patientAge", "patient_age", "patient age"),
            req("patientSex", "patient_sex", "patient sex"),
            req("scanDate", "scan_date", "scan date"),
            dflt(
                "contactNumber",
                "contact_number",
                "contact number",
                FieldDefault::Text("support@sendscript.com"),
            ),
        ]),
    },
    TemplateSpec {
        name: "paymentLinkScan",
        label: "Payment Link Scan",
        file: "payment-link-scan.html",
        subject: "Payment Link for Your Scan",
        category: Category::Booking,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("link", "link", "payment link"),
            req("totalPrice", "total_price", "total price"),
            req("grossAmount", "gross_amount", "gross amount"),
            dflt(
                "prescriptionItems",
                "prescriptionItems",
                "scan items",
                FieldDefault::EmptyList,
            ),
        ]),
    },
    TemplateSpec {
        name: "videoConsultation",
        label: "Video Consultation",
        file: "video-consultation.html",
        subject: "Your Video Consultation Details",
        category: Category::Booking,
        shape: DataShape::Fields(&[
            req("patientName", "patient_name", "patient name"),
            req("link", "link", "consultation link"),
            dflt(
                "dateTime",
                "date_time",
                "date & time",
                FieldDefault::Text("[Date & Time]"),
            ),
            dflt(
                "consultantName",
                "consultant_name",
                "consultant name",
                FieldDefault::Text("[Consultant Name]"),
            ),
            dflt(
                "consultantGmc",
                "consultant_gmc",
                "consultant GMC number",
                FieldDefault::Text("9293839"),
            ),
            opt("clinicName", "clinic_name", "clinic name"),
            opt("clinicAddress", "clinic_address", "clinic address"),
            opt("clinicCity", "clinic_city", "clinic city"),
            opt("clinicPostalCode", "clinic_postal_code", "clinic postal code"),
            opt("clinicCountry", "clinic_country", "clinic country"),
            opt("clinicMobile", "clinic_mobile", "clinic mobile"),
            opt("clinicEmail", "clinic_email", "clinic email"),
        ]),
    },
];

// ────────────────────────────────────────────────────────────────────────────
// Lookup
// ────────────────────────────────────────────────────────────────────────────

pub fn find(name: &str) -> Option<&'static TemplateSpec> {
    TEMPLATES.iter().find(|t| t.name == name)
}

pub fn lookup(name: &str) -> Result<&'static TemplateSpec, DispatchError> {
    find(name).ok_or_else(|| DispatchError::UnknownTemplate(name.to_string()))
}

pub fn by_category(category: Category) -> impl Iterator<Item = &'static TemplateSpec> {
    TEMPLATES.iter().filter(move |t| t.category == category)
}

// ────────────────────────────────────────────────────────────────────────────
// Data shaping
// ────────────────────────────────────────────────────────────────────────────

/// Turns caller input into the render context for `spec`.
///
/// Missing optional fields become their default, or an empty string so templates
/// never see an undefined variable. All missing required fields are reported at once.
pub fn shape_data(spec: &TemplateSpec, input: &Value) -> Result<Value, DispatchError> {
    let object = input.as_object().ok_or_else(|| {
        DispatchError::InvalidPayload(format!("{} expects a JSON object", spec.name))
    })?;

    let fields = match spec.shape {
        DataShape::Fields(fields) => fields,
        DataShape::Passthrough | DataShape::Paginated { .. } => return Ok(input.clone()),
    };

    let mut shaped = Map::new();
    let mut missing = Vec::new();

    for field in fields {
        let value = match lookup_field(object, field) {
            Some(value) => value.clone(),
            None => match field.default {
                Some(default) => default.to_value(),
                None if field.required => {
                    missing.push(field.key.to_string());
                    continue;
                }
                None => Value::String(String::new()),
            },
        };
        insert_path(&mut shaped, field.var, value);
    }

    if !missing.is_empty() {
        return Err(DispatchError::MissingFields(missing));
    }

    Ok(Value::Object(shaped))
}

fn lookup_field<'a>(object: &'a Map<String, Value>, field: &FieldSpec) -> Option<&'a Value> {
    [field.key, field.var]
        .into_iter()
        .filter_map(|k| object.get(k))
        .find(|v| is_present(v))
}

/// Null and blank strings count as not supplied.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
        None => {
            target.insert(path.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_template_names_and_files_unique() {
        let names: HashSet<_> = TEMPLATES.iter().map(|t| t.name).collect();
        let files: HashSet<_> = TEMPLATES.iter().map(|t| t.file).collect();
        assert_eq!(names.len(), TEMPLATES.len());
        assert_eq!(files.len(), TEMPLATES.len());
        assert_eq!(TEMPLATES.len(), 47);
    }

    #[test]
    fn test_every_category_has_templates() {
        for category in Category::ALL {
            assert!(by_category(category).count() > 0, "{category} is empty");
        }
        assert_eq!(by_category(Category::Account).count(), 6);
        assert_eq!(by_category(Category::Booking).count(), 8);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Pharmacy".parse::<Category>(), Ok(Category::Pharmacy));
        assert_eq!(" booking ".parse::<Category>(), Ok(Category::Booking));
        let err = "nope".parse::<Category>().unwrap_err();
        assert!(err.contains("account, clinic"));
    }

    #[test]
    fn test_lookup_unknown_template() {
        assert!(matches!(
            lookup("doesNotExist"),
            Err(DispatchError::UnknownTemplate(name)) if name == "doesNotExist"
        ));
        assert_eq!(lookup("forgotPassword").unwrap().file, "forgot-password.html");
    }

    #[test]
    fn test_shape_maps_camel_case_keys() {
        let spec = find("doctorAccountCreated").unwrap();
        let shaped = shape_data(
            spec,
            &json!({ "doctorName": "Dr. Jane Smith", "loginUrl": "https://app/login", "extra": 1 }),
        )
        .unwrap();
        assert_eq!(
            shaped,
            json!({ "doctor_name": "Dr. Jane Smith", "login_url": "https://app/login" })
        );
    }

    #[test]
    fn test_shape_accepts_template_variable_names() {
        let spec = find("forgotPassword").unwrap();
        let shaped = shape_data(spec, &json!({ "doctor_name": "Dr. A", "otp": "789012" })).unwrap();
        assert_eq!(shaped["doctor_name"], "Dr. A");
    }

    #[test]
    fn test_shape_reports_all_missing_required_fields() {
        let spec = find("bookingRescheduled").unwrap();
        let err = shape_data(spec, &json!({ "patientName": "John", "scanName": "" })).unwrap_err();
        match err {
            DispatchError::MissingFields(fields) => {
                assert!(fields.contains(&"scanName".to_string()));
                assert!(fields.contains(&"oldTime".to_string()));
                assert!(!fields.contains(&"patientName".to_string()));
                assert_eq!(fields.len(), 8);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_applies_defaults() {
        let spec = find("pharmacyVerification").unwrap();
        let shaped = shape_data(spec, &json!({ "otp": "123456" })).unwrap();
        assert_eq!(shaped["purpose"], "verification");
        assert_eq!(shaped["validity"], 10);

        let blocked = find("accountBlockedBySuperAdmin").unwrap();
        let shaped = shape_data(blocked, &json!({ "doctorName": "Dr. B", "reason": "" })).unwrap();
        assert_eq!(shaped["reason"], "Policy violations");

        let scan = find("paymentLinkScan").unwrap();
        let shaped = shape_data(
            scan,
            &json!({ "patientName": "J", "link": "l", "totalPrice": 1, "grossAmount": 2 }),
        )
        .unwrap();
        assert_eq!(shaped["prescriptionItems"], json!([]));
    }

    #[test]
    fn test_shape_optional_fields_become_empty_strings() {
        let spec = find("sendToken").unwrap();
        let shaped =
            shape_data(spec, &json!({ "patientName": "John", "prescriptionId": "RX1" })).unwrap();
        assert_eq!(shaped["clinic_email"], "");
        assert_eq!(shaped["prescription_id"], "RX1");
    }

    #[test]
    fn test_shape_builds_nested_objects() {
        let spec = find("sendToUnregisterPharmacy").unwrap();
        let input = json!({
            "pharmacyName": "Local Pharmacy",
            "prescriptionCode": "ABC123",
            "patientName": "John Doe",
            "patientDob": "1990-01-15",
            "patientMobile": "+44 7123 456789",
            "clinicName": "SendScript Clinic",
            "clinicAddress1": "1 High St",
            "clinicCity": "London",
            "clinicPostalCode": "SW1A 1AA",
            "clinicContactNumber": "+44 20 1234 5678",
            "clinicEmail": "clinic@sendscript.com"
        });
        let shaped = shape_data(spec, &input).unwrap();
        assert_eq!(shaped["patientMobileNumber"], "+44 7123 456789");
        assert_eq!(shaped["clinic"]["name"], "SendScript Clinic");
        assert_eq!(shaped["clinic"]["country"], "United Kingdom");
        assert_eq!(shaped["clinic"]["address_line_2"], "");
    }

    #[test]
    fn test_passthrough_keeps_payload() {
        let spec = find("paymentConfirmed").unwrap();
        let input = json!({ "patient_name": "John", "amount": "25.50" });
        assert_eq!(shape_data(spec, &input).unwrap(), input);
    }

    #[test]
    fn test_shape_rejects_non_object() {
        let spec = find("paymentConfirmed").unwrap();
        assert!(matches!(
            shape_data(spec, &json!(["not", "an", "object"])),
            Err(DispatchError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_prescription_templates_are_paginated() {
        for name in [
            "prescriptionWithSign",
            "prescriptionWithoutSign",
            "pharmacistWithSign",
            "pharmacyViaPrescription",
        ] {
            assert!(find(name).unwrap().is_paginated(), "{name}");
        }
        assert!(!find("invoiceGenerate").unwrap().is_paginated());
    }
}
