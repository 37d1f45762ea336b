// libs/payment-cell/src/services/gcash.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_http::{ApiClient, ApiError};

use crate::models::{
    PaymentError, PaymentMethod, PaymentRecord, PaymentSession, PaymentStatus, PollPolicy,
    ScannableCode, VerificationOutcome,
};
use crate::services::outcome::OutcomeCell;

/// Reference-number rail. The payer scans the merchant QR, pays in their own
/// app, and the booking flow confirms the payment either by polling the
/// verification endpoint or by the payer typing the reference back in. Both
/// confirmation paths race on one [`VerificationTask`]; whichever finishes
/// first decides the outcome and stops the other.
pub struct GcashPaymentService {
    client: Arc<ApiClient>,
    merchant_qr_url: String,
    policy: PollPolicy,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    transaction_id: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct VerifyStatusResponse {
    status: String,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ManualVerifyResponse {
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl GcashPaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Arc::new(ApiClient::new(config)),
            merchant_qr_url: config.merchant_qr_url.clone(),
            policy: PollPolicy::from_config(config),
        }
    }

    pub fn with_client(client: Arc<ApiClient>, merchant_qr_url: &str, policy: PollPolicy) -> Self {
        Self {
            client,
            merchant_qr_url: merchant_qr_url.to_string(),
            policy,
        }
    }

    /// Mint a payment session and return it with the code the payer scans.
    pub async fn request_reference(
        &self,
        amount: f64,
        auth_token: &str,
    ) -> Result<(PaymentSession, ScannableCode), PaymentError> {
        debug!("Requesting payment reference for amount {:.2}", amount);

        let body = json!({
            "amount": amount,
            "payment_method": PaymentMethod::Gcash.to_string(),
        });

        let response: CreateSessionResponse = self
            .client
            .request(Method::POST, "/appointments/payment", Some(auth_token), Some(body))
            .await
            .map_err(|e| match e {
                ApiError::AuthRequired => PaymentError::AuthRequired,
                ApiError::Backend { message, .. } => PaymentError::SessionCreationFailed(message),
                other => PaymentError::NetworkError(other.to_string()),
            })?;

        info!("Payment session created: {}", response.transaction_id);

        let session = PaymentSession {
            reference_number: response.transaction_id.clone(),
            amount: response.amount,
            created_at: Utc::now(),
            status: PaymentStatus::Pending,
        };
        let code = ScannableCode {
            image_url: self.merchant_qr_url.clone(),
            reference_number: response.transaction_id,
        };

        Ok((session, code))
    }

    /// Build the verification task for a freshly minted session. One task per
    /// session; a session that failed or was cancelled is discarded and a new
    /// one minted instead.
    pub fn begin_verification(&self, session: &PaymentSession) -> VerificationTask {
        VerificationTask {
            inner: Arc::new(TaskInner {
                client: Arc::clone(&self.client),
                reference_number: session.reference_number.clone(),
                amount: session.amount,
                policy: self.policy,
                outcome: OutcomeCell::new(),
            }),
        }
    }
}

struct TaskInner {
    client: Arc<ApiClient>,
    reference_number: String,
    amount: f64,
    policy: PollPolicy,
    outcome: OutcomeCell<VerificationOutcome>,
}

/// Handle shared by the poll loop, the manual-entry path, and whoever owns
/// cancellation (rail switch, leaving the payment step). Cheap to clone.
#[derive(Clone)]
pub struct VerificationTask {
    inner: Arc<TaskInner>,
}

impl VerificationTask {
    pub fn reference_number(&self) -> &str {
        &self.inner.reference_number
    }

    pub fn outcome(&self) -> Option<VerificationOutcome> {
        self.inner.outcome.get()
    }

    /// Wait until either path settles the session.
    pub async fn wait(&self) -> VerificationOutcome {
        self.inner.outcome.wait().await
    }

    /// Bounded poll against the verification endpoint: one query per
    /// interval, at most `max_attempts` queries, then `TimedOut`. Returns the
    /// session outcome, which may have been settled by the manual path or by
    /// cancellation while we slept; after the cell settles, no further
    /// backend call is made.
    pub async fn poll_until_paid(&self, auth_token: &str) -> VerificationOutcome {
        let inner = &self.inner;
        debug!(
            "Polling payment verification for {} (every {:?}, {} attempts max)",
            inner.reference_number, inner.policy.interval, inner.policy.max_attempts
        );

        for attempt in 1..=inner.policy.max_attempts {
            if let Some(outcome) = inner.outcome.get() {
                return outcome;
            }

            match self.check_status(auth_token).await {
                Ok(Some(record)) => {
                    info!(
                        "Payment {} confirmed by polling on attempt {}",
                        inner.reference_number, attempt
                    );
                    return inner.outcome.settle(VerificationOutcome::Paid(record)).0;
                }
                Ok(None) => {}
                // A flaky poll burns the attempt but not the whole budget.
                Err(e) => warn!("Verification poll attempt {} failed: {}", attempt, e),
            }

            if attempt == inner.policy.max_attempts {
                break;
            }

            tokio::select! {
                _ = inner.outcome.settled() => {
                    if let Some(outcome) = inner.outcome.get() {
                        debug!("Polling for {} stopped early: {:?}", inner.reference_number, outcome);
                        return outcome;
                    }
                }
                _ = sleep(inner.policy.interval) => {}
            }
        }

        warn!(
            "Payment verification for {} timed out after {} attempts",
            inner.reference_number, inner.policy.max_attempts
        );
        inner.outcome.settle(VerificationOutcome::TimedOut).0
    }

    /// One-shot confirmation with a reference number the payer typed in. An
    /// accepted reference settles the session exactly like a polling hit and
    /// stops the poll loop; a rejected one leaves the session live so the
    /// payer can fix a typo while polling continues.
    pub async fn verify_manual(
        &self,
        typed_reference: &str,
        auth_token: &str,
    ) -> Result<VerificationOutcome, PaymentError> {
        let inner = &self.inner;

        if let Some(outcome) = inner.outcome.get() {
            return Ok(outcome);
        }

        let body = json!({
            "gcash_reference_number": typed_reference,
            "transaction_id": inner.reference_number,
        });

        let response: ManualVerifyResponse = self
            .client_request(Method::POST, "/appointments/payment/verify-reference", auth_token, Some(body))
            .await?;

        let accepted = response.verified || response.status.as_deref() == Some("paid");
        if !accepted {
            return Err(PaymentError::VerificationRejected(
                response
                    .message
                    .unwrap_or_else(|| "Reference number did not match this payment".to_string()),
            ));
        }

        info!(
            "Payment {} confirmed by manual reference entry",
            inner.reference_number
        );
        let record = PaymentRecord {
            transaction_id: inner.reference_number.clone(),
            amount: inner.amount,
            method: PaymentMethod::Gcash,
            status: PaymentStatus::Paid,
        };
        Ok(inner.outcome.settle(VerificationOutcome::Paid(record)).0)
    }

    /// Stop verification (payment step unmounted or rail switched). The poll
    /// loop observes the settle and exits without another backend call.
    pub fn cancel(&self) {
        let (outcome, won) = self.inner.outcome.settle(VerificationOutcome::Cancelled);
        if won {
            info!(
                "Payment verification for {} cancelled",
                self.inner.reference_number
            );
        } else {
            debug!(
                "Cancel after settlement ignored for {}: {:?}",
                self.inner.reference_number, outcome
            );
        }
    }

    async fn check_status(&self, auth_token: &str) -> Result<Option<PaymentRecord>, PaymentError> {
        let inner = &self.inner;
        let path = format!(
            "/appointments/payment/verify/{}",
            inner.reference_number
        );

        let response: VerifyStatusResponse = self
            .client_request(Method::GET, &path, auth_token, None)
            .await?;

        if response.status != "paid" {
            return Ok(None);
        }

        Ok(Some(PaymentRecord {
            transaction_id: response
                .transaction_id
                .unwrap_or_else(|| inner.reference_number.clone()),
            amount: response.amount.unwrap_or(inner.amount),
            method: PaymentMethod::Gcash,
            status: PaymentStatus::Paid,
        }))
    }

    async fn client_request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        auth_token: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, PaymentError> {
        self.inner
            .client
            .request(method, path, Some(auth_token), body)
            .await
            .map_err(|e| match e {
                ApiError::AuthRequired => PaymentError::AuthRequired,
                // A 5xx is a transient backend condition, retryable; only an
                // explicit 4xx verdict counts as a rejected reference.
                ApiError::Backend { status, message } if status >= 500 => {
                    PaymentError::NetworkError(message)
                }
                ApiError::Backend { message, .. } => PaymentError::VerificationRejected(message),
                other => PaymentError::NetworkError(other.to_string()),
            })
    }
}
