// libs/booking-cell/src/models.rs
use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use payment_cell::{PaymentRecord, PaymentStatus};

/// Per-file attachment ceiling enforced before any network call.
pub const MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

// ==============================================================================
// DRAFT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: String,
    pub display_name: String,
    pub specialization: String,
    pub consultation_fee: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    #[default]
    GeneralPractitioner,
    Specialist,
    FollowUp,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::GeneralPractitioner => write!(f, "general-practitioner"),
            AppointmentType::Specialist => write!(f, "specialist"),
            AppointmentType::FollowUp => write!(f, "follow-up"),
        }
    }
}

/// Catalog symptom: `key` is the canonical identifier, `label` what the
/// patient saw. Order in the draft is insertion order, deduplicated by key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symptom {
    pub key: String,
    pub label: String,
}

/// Attachment already converted to its transmittable encoding; no file
/// handles survive past the upload step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentAttachment {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub content_base64: String,
}

impl DocumentAttachment {
    pub fn from_bytes(name: &str, mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.to_string(),
            content_base64: general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// The in-progress booking. Created when a patient picks a doctor, cleared on
/// successful submission or explicit abandonment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingDraft {
    pub doctor: Option<DoctorProfile>,
    pub appointment_type: AppointmentType,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<NaiveTime>,
    pub symptoms: Vec<Symptom>,
    pub documents: Vec<DocumentAttachment>,
    pub medicine_allergies: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub follow_up: bool,
    pub notes: Option<String>,
    pub payment: Option<PaymentRecord>,
}

impl BookingDraft {
    pub fn is_paid(&self) -> bool {
        self.payment
            .as_ref()
            .map(|p| p.status == PaymentStatus::Paid)
            .unwrap_or(false)
    }
}

// ==============================================================================
// WIZARD STAGES
// ==============================================================================

/// Ordered stages of the booking wizard. Exactly one stage is live at a time;
/// transitions are strictly sequential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SelectDoctor,
    SelectDateTime,
    SelectSymptoms,
    UploadDocuments,
    Pay,
    Confirm,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::SelectDoctor => Some(Stage::SelectDateTime),
            Stage::SelectDateTime => Some(Stage::SelectSymptoms),
            Stage::SelectSymptoms => Some(Stage::UploadDocuments),
            Stage::UploadDocuments => Some(Stage::Pay),
            Stage::Pay => Some(Stage::Confirm),
            Stage::Confirm => None,
        }
    }

    pub fn prev(self) -> Option<Stage> {
        match self {
            Stage::SelectDoctor => None,
            Stage::SelectDateTime => Some(Stage::SelectDoctor),
            Stage::SelectSymptoms => Some(Stage::SelectDateTime),
            Stage::UploadDocuments => Some(Stage::SelectSymptoms),
            Stage::Pay => Some(Stage::UploadDocuments),
            Stage::Confirm => Some(Stage::Pay),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SelectDoctor => "select_doctor",
            Stage::SelectDateTime => "select_date_time",
            Stage::SelectSymptoms => "select_symptoms",
            Stage::UploadDocuments => "upload_documents",
            Stage::Pay => "pay",
            Stage::Confirm => "confirm",
        };
        write!(f, "{}", name)
    }
}

/// Input the live stage consumes when the patient moves forward.
#[derive(Debug, Clone)]
pub enum StageInput {
    Doctor(DoctorProfile),
    Schedule {
        date: NaiveDate,
        time: NaiveTime,
    },
    Symptoms(Vec<Symptom>),
    Documents {
        documents: Vec<DocumentAttachment>,
        medicine_allergies: Option<String>,
    },
    Payment(PaymentRecord),
}

// ==============================================================================
// SUBMISSION PAYLOAD
// ==============================================================================

/// Wire form of a completed draft, as POSTed to the appointment endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentPayload {
    pub doctor_id: String,
    pub appointment_type: AppointmentType,
    pub appointment_date: String,
    pub appointment_time: String,
    pub symptoms: Vec<Symptom>,
    pub documents: Vec<DocumentAttachment>,
    pub medicine_allergies: Option<String>,
    pub date_of_birth: String,
    pub follow_up: bool,
    pub notes: Option<String>,
    pub payment: PaymentRecord,
}

impl AppointmentPayload {
    /// Build the wire payload, or report every missing field at once. Payment
    /// completeness is the caller's guard; this only checks presence.
    pub fn from_draft(draft: &BookingDraft) -> Result<Self, Vec<String>> {
        let mut missing = Vec::new();

        if draft.doctor.is_none() {
            missing.push("doctor".to_string());
        }
        if draft.selected_date.is_none() {
            missing.push("selectedDate".to_string());
        }
        if draft.selected_time.is_none() {
            missing.push("selectedTime".to_string());
        }
        if draft.date_of_birth.is_none() {
            missing.push("dateOfBirth".to_string());
        }
        if draft.payment.is_none() {
            missing.push("payment".to_string());
        }
        match (
            &draft.doctor,
            draft.selected_date,
            draft.selected_time,
            draft.date_of_birth,
            &draft.payment,
        ) {
            (Some(doctor), Some(date), Some(time), Some(dob), Some(payment)) => Ok(Self {
                doctor_id: doctor.id.clone(),
                appointment_type: draft.appointment_type,
                appointment_date: date.format("%Y-%m-%d").to_string(),
                appointment_time: time.format("%H:%M").to_string(),
                symptoms: draft.symptoms.clone(),
                documents: draft.documents.clone(),
                medicine_allergies: draft.medicine_allergies.clone(),
                date_of_birth: dob.format("%Y-%m-%d").to_string(),
                follow_up: draft.follow_up,
                notes: draft.notes.clone(),
                payment: payment.clone(),
            }),
            _ => Err(missing),
        }
    }
}

/// Broadcast to out-of-scope listeners (badge counters, activity feeds) after
/// a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedEvent {
    pub appointment_id: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Missing or invalid fields: {}", fields.join(", "))]
    ValidationError { fields: Vec<String> },

    #[error("Selected slot is not in the doctor's availability")]
    SlotNotAvailable,

    #[error("Input does not belong to stage {0}")]
    StageMismatch(Stage),

    #[error("Payment has not completed")]
    IncompletePayment,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmitError {
    #[error("Draft incomplete, missing: {}", missing.join(", "))]
    IncompleteDraft { missing: Vec<String> },

    #[error("Payment has not completed")]
    IncompletePayment,

    #[error("{name} is too large: {size_bytes} bytes")]
    FileTooLarge { name: String, size_bytes: u64 },

    #[error("Selected slot is no longer available")]
    SlotTaken,

    #[error("Session expired, sign in again")]
    AuthExpired,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Booking was rejected: {0}")]
    SubmissionFailed(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SymptomCatalogError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Symptom catalog unavailable: {0}")]
    Unavailable(String),
}
