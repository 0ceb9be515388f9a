//! Sample payloads for previews, bulk test sends and tests.
//!
//! Shapes are fixed; dates and reference numbers are stamped from the current time.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use crate::mail::templates::{DataShape, FieldSpec, TemplateSpec};

const DRUGS: &[(&str, &str, &str, &str)] = &[
    ("Amoxicillin 500mg capsules", "500mg", "21 capsules", "Take one capsule three times a day"),
    ("Ibuprofen 400mg tablets", "400mg", "24 tablets", "Take one tablet every 8 hours with food"),
    ("Omeprazole 20mg capsules", "20mg", "28 capsules", "Take one capsule each morning"),
    ("Salbutamol 100mcg inhaler", "100mcg", "1 inhaler", "Two puffs when required"),
    ("Sertraline 50mg tablets", "50mg", "28 tablets", "Take one tablet daily"),
    ("Cetirizine 10mg tablets", "10mg", "30 tablets", "Take one tablet at night"),
    ("Metformin 500mg tablets", "500mg", "56 tablets", "Take one tablet twice a day with meals"),
];

fn reference(prefix: &str) -> String {
    format!("{prefix}{}", Utc::now().format("%Y%m%d%H%M%S"))
}

fn today() -> String {
    Utc::now().format("%d/%m/%Y").to_string()
}

fn in_days(days: i64) -> String {
    (Utc::now() + Duration::days(days))
        .format("%d/%m/%Y")
        .to_string()
}

/// Prescription items, cycling through a fixed formulary.
pub fn prescription_items(count: usize) -> Vec<Value> {
    DRUGS
        .iter()
        .cycle()
        .take(count)
        .map(|(name, dosage, quantity, directions)| {
            json!({
                "name": name,
                "dosage": dosage,
                "quantity": quantity,
                "directions": directions,
            })
        })
        .collect()
}

/// A prescription document with `item_count` items.
pub fn prescription(item_count: usize) -> Value {
    json!({
        "prescription_id": reference("RX"),
        "prescription_date": today(),
        "patient_name": "John Doe",
        "patient_dob": "15/01/1990",
        "patient_address": "12 Baker Street, London, NW1 6XE",
        "patient_mobile": "+44 7123 456789",
        "doctor_name": "Dr. Jane Smith",
        "doctor_gmc": "7012345",
        "clinic_name": "SendScript Clinic",
        "clinic_address": "1 Harley Street, London, W1G 9QD",
        "clinic_phone": "+44 20 7946 0000",
        "clinic_email": "clinic@sendscript.com",
        "pharmacy_name": "City Pharmacy",
        "signature_url": "https://sendscript.com/static/signature-sample.png",
        "qr_code_url": "https://sendscript.com/static/qr-sample.png",
        "prescription_items": prescription_items(item_count),
    })
}

pub fn invoice() -> Value {
    let items = [
        ("Amoxicillin 500mg capsules", 1, 8.50),
        ("Ibuprofen 400mg tablets", 2, 3.25),
        ("Prescription handling fee", 1, 2.00),
    ];
    let subtotal: f64 = items.iter().map(|(_, qty, price)| f64::from(*qty) * price).sum();
    let vat = subtotal * 0.2;
    json!({
        "invoice_number": reference("INV"),
        "invoice_date": today(),
        "due_date": in_days(14),
        "patient_name": "John Doe",
        "patient_email": "john.doe@example.com",
        "pharmacy_name": "City Pharmacy",
        "pharmacy_address": "45 Market Street, Manchester, M1 1PW",
        "items": items
            .iter()
            .map(|(description, qty, price)| json!({
                "description": description,
                "quantity": qty,
                "unit_price": format!("{price:.2}"),
                "total": format!("{:.2}", f64::from(*qty) * price),
            }))
            .collect::<Vec<_>>(),
        "subtotal": format!("{subtotal:.2}"),
        "vat": format!("{vat:.2}"),
        "total": format!("{:.2}", subtotal + vat),
    })
}

pub fn payment_confirmed() -> Value {
    json!({
        "patient_name": "John Doe",
        "amount": "25.50",
        "payment_date": today(),
        "transaction_id": reference("TXN"),
        "prescription_id": reference("RX"),
        "pharmacy_name": "City Pharmacy",
    })
}

pub fn payment_link_2() -> Value {
    json!({
        "patient_name": "John Doe",
        "amount": "45.00",
        "payment_link": "https://sendscript.com/pay/sample",
        "expiry_date": in_days(3),
        "reference": reference("PAY"),
    })
}

pub fn pa_invite() -> Value {
    json!({
        "invitee_name": "Sarah Johnson",
        "inviting_doctor_name": "Dr. Jane Smith",
        "clinic_name": "SendScript Clinic",
        "accept_invitation_link": "https://sendscript.com/invite/accept/sample",
    })
}

pub fn pharmacist_invite() -> Value {
    json!({
        "pharmacist_name": "Michael Brown",
        "pharmacy_name": "City Pharmacy",
        "owner_name": "Priya Patel",
        "invitation_link": "https://sendscript.com/pharmacy/invite/sample",
    })
}

pub fn pharmacy_email() -> Value {
    json!({
        "pharmacy_name": "City Pharmacy",
        "patient_name": "John Doe",
        "message": "Your medication is ready for collection. Please bring photo ID.",
        "pharmacy_phone": "+44 161 496 0000",
        "pharmacy_email": "pharmacy@example.com",
    })
}

pub fn leh_notice() -> Value {
    json!({
        "patient_name": "John Doe",
        "registration_link": "https://londonelitehealth.com/register/sample",
        "clinic_name": "London Elite Health",
        "clinic_phone": "+44 20 7946 0123",
        "appointment_date": in_days(7),
    })
}

fn scan_items() -> Value {
    json!([
        { "name": "MRI Brain Scan", "price": "350.00" },
        { "name": "Radiologist Report", "price": "75.00" },
    ])
}

/// A plausible value for one field of a fixed data contract.
fn field_value(field: &FieldSpec) -> Value {
    let key = field.key;
    let text = match key {
        "doctorName" | "invitingDoctorName" => "Dr. Jane Smith".to_string(),
        "patientName" | "userName" => "John Doe".to_string(),
        "inviteeName" => "Dr. Sarah Johnson".to_string(),
        "pharmacyOwnerName" => "Priya Patel".to_string(),
        "clinicName" => "SendScript Clinic".to_string(),
        "pharmacyName" => "City Pharmacy".to_string(),
        "scanName" => "MRI Brain Scan".to_string(),
        "centerName" => "SendScript Imaging Centre".to_string(),
        "centerAddress" | "clinicAddress" | "clinicAddress1" | "pharmacyAddress1" => {
            "1 Harley Street".to_string()
        }
        "pharmacyAddress2" | "clinicAddress2" => "Marylebone".to_string(),
        "city" | "clinicCity" => "London".to_string(),
        "postalCode" | "clinicPostalCode" => "W1G 9QD".to_string(),
        "country" | "clinicCountry" => "United Kingdom".to_string(),
        "patientDob" => "1990-01-15".to_string(),
        "patientAge" => "34".to_string(),
        "patientSex" => "Male".to_string(),
        "reason" => "Incomplete registration documents".to_string(),
        "prescriptionItems" => return scan_items(),
        "bookingTime" | "newTime" => "10:30 AM".to_string(),
        "oldTime" => "2:00 PM".to_string(),
        "oldDate" => today(),
        "reservationExpires" => (Utc::now() + Duration::minutes(30))
            .format("%d/%m/%Y %H:%M")
            .to_string(),
        "dateTime" => (Utc::now() + Duration::days(2))
            .format("%d/%m/%Y %H:%M")
            .to_string(),
        "consultantName" => "Dr. Alan Grant".to_string(),
        "validity" => return json!(10),
        "purpose" => "verification".to_string(),
        "contactNumber" => "+44 20 7946 0000".to_string(),
        _ if key.ends_with("Id") || key == "invoiceNumber" => reference(&key[..2].to_uppercase()),
        _ if key.contains("Code") || key == "otp" => "123456".to_string(),
        _ if key.contains("Email") => "contact@sendscript.com".to_string(),
        _ if key.contains("Url") || key.contains("Link") || key == "link" => {
            format!("https://sendscript.com/{}", key.to_lowercase())
        }
        _ if key.contains("Date") => in_days(3),
        _ if key.to_lowercase().contains("amount") || key.contains("Price") => "425.00".to_string(),
        _ if key.contains("Mobile") || key.contains("Phone") || key.contains("Contact") => {
            "+44 20 7946 0000".to_string()
        }
        "buttonText" => "Accept Invitation".to_string(),
        _ => format!("Sample {}", field.label),
    };
    Value::String(text)
}

/// Complete sample input for any template.
pub fn sample_input(spec: &TemplateSpec) -> Value {
    match spec.shape {
        DataShape::Paginated { .. } => prescription(15),
        DataShape::Passthrough => match spec.name {
            "invoiceGenerate" => invoice(),
            "paymentConfirmed" => payment_confirmed(),
            "paymentLink2" => payment_link_2(),
            "paInvites" => pa_invite(),
            "pharmacyOwnerInvitesPharmacist" => pharmacist_invite(),
            "pharmacyEmail" => pharmacy_email(),
            "lehEmailTemplate" => leh_notice(),
            _ => Value::Object(Map::new()),
        },
        DataShape::Fields(fields) => Value::Object(
            fields
                .iter()
                .map(|f| (f.key.to_string(), field_value(f)))
                .collect(),
        ),
    }
}
