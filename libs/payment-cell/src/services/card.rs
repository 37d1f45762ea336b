// libs/payment-cell/src/services/card.rs
use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_http::{ApiClient, ApiError};

use crate::models::{CardDetails, PaymentError, PaymentMethod, PaymentRecord, PaymentStatus};

/// Synchronous request/response rail. All card fields are validated locally
/// before the charge endpoint is called; nothing is retried automatically.
pub struct CardPaymentService {
    client: Arc<ApiClient>,
}

#[derive(Debug, Deserialize)]
struct ChargeResponse {
    transaction_id: String,
    status: String,
    #[serde(default)]
    message: Option<String>,
}

impl CardPaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Arc::new(ApiClient::new(config)),
        }
    }

    pub fn with_client(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn charge(
        &self,
        amount: f64,
        card: &CardDetails,
        auth_token: &str,
    ) -> Result<PaymentRecord, PaymentError> {
        validate_card(card)?;

        let card_number = strip_separators(&card.number);
        debug!("Submitting card charge for amount {:.2}", amount);

        let body = json!({
            "amount": amount,
            "payment_method": PaymentMethod::Card.to_string(),
            "card_number": card_number,
            "cardholder_name": card.holder_name.trim(),
            "expiry": card.expiry,
            "cvv": card.cvv,
        });

        let response: ChargeResponse = self
            .client
            .request(Method::POST, "/appointments/payment", Some(auth_token), Some(body))
            .await
            .map_err(|e| match e {
                ApiError::AuthRequired => PaymentError::AuthRequired,
                ApiError::Backend { message, .. } => PaymentError::CardDeclined(message),
                other => PaymentError::NetworkError(other.to_string()),
            })?;

        if response.status != "paid" {
            warn!("Card charge not confirmed: status {}", response.status);
            return Err(PaymentError::CardDeclined(
                response
                    .message
                    .unwrap_or_else(|| "Card payment was not accepted".to_string()),
            ));
        }

        info!("Card charge confirmed: {}", response.transaction_id);
        Ok(PaymentRecord {
            transaction_id: response.transaction_id,
            amount,
            method: PaymentMethod::Card,
            status: PaymentStatus::Paid,
        })
    }
}

fn strip_separators(number: &str) -> String {
    number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Client-side card checks; none of these ever reach the backend.
pub fn validate_card(card: &CardDetails) -> Result<(), PaymentError> {
    let number = strip_separators(&card.number);
    if number.len() != 16 || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::validation(
            "card_number",
            "card number must be exactly 16 digits",
        ));
    }

    if card.holder_name.trim().is_empty() {
        return Err(PaymentError::validation(
            "cardholder_name",
            "cardholder name is required",
        ));
    }

    validate_expiry(&card.expiry)?;

    if card.cvv.len() != 3 || !card.cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::validation("cvv", "CVV must be exactly 3 digits"));
    }

    Ok(())
}

fn validate_expiry(expiry: &str) -> Result<(), PaymentError> {
    let invalid = || PaymentError::validation("expiry", "expiry must be MM/YY");

    let (month, year) = expiry.split_once('/').ok_or_else(invalid)?;
    if month.len() != 2 || year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    match month.parse::<u8>() {
        Ok(m) if (1..=12).contains(&m) => Ok(()),
        _ => Err(invalid()),
    }
}
