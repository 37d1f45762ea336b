// libs/payment-cell/src/models.rs
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_config::{
    AppConfig, DEFAULT_PAYMENT_POLL_INTERVAL_MS, DEFAULT_PAYMENT_POLL_MAX_ATTEMPTS,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Gcash,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Gcash => write!(f, "gcash"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// Confirmed (or attempted) payment attached to a booking draft. The draft
/// only carries a record with `Paid` status after one of the gateway rails
/// observed an explicit confirmation; failures never leave a paid record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

/// Card input as typed by the payer. Validated entirely client-side before
/// any charge call is made.
#[derive(Debug, Clone)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
}

/// Backend-minted session for the reference-number rail. Discarded on
/// navigation away or once paid; a retry after failure mints a fresh session
/// rather than reusing the reference number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub reference_number: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    pub status: PaymentStatus,
}

/// What the payer scans: the static merchant QR image plus the session
/// reference they key into their payment app.
#[derive(Debug, Clone)]
pub struct ScannableCode {
    pub image_url: String,
    pub reference_number: String,
}

impl ScannableCode {
    pub fn payload(&self) -> String {
        format!("{}?ref={}", self.image_url, self.reference_number)
    }
}

/// How a verification task ended. `TimedOut` is not a verdict on the payment
/// itself, only on automatic detection; the payer may well have paid and the
/// right remediation is contacting support, not retrying the charge.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    Paid(PaymentRecord),
    TimedOut,
    Cancelled,
}

/// Poll pacing for the reference-number rail. The defaults (3s spacing, 100
/// attempts, 5 minutes total) match how quickly payment apps confirm; no
/// backoff because backend detection is near-real-time.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_PAYMENT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_PAYMENT_POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.payment_poll_interval_ms),
            max_attempts: config.payment_poll_max_attempts,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Card declined: {0}")]
    CardDeclined(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Payment session could not be created: {0}")]
    SessionCreationFailed(String),

    #[error("Reference number was not accepted: {0}")]
    VerificationRejected(String),
}

impl PaymentError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}
