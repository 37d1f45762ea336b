use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use payment_cell::{CardDetails, CardPaymentService, PaymentError, PaymentStatus};
use shared_config::AppConfig;
use shared_http::ApiClient;

fn service_for(server: &MockServer) -> CardPaymentService {
    let config = AppConfig {
        api_base_url: server.uri(),
        merchant_qr_url: String::new(),
        payment_poll_interval_ms: 3000,
        payment_poll_max_attempts: 100,
    };
    CardPaymentService::with_client(Arc::new(ApiClient::new(&config)))
}

fn valid_card() -> CardDetails {
    CardDetails {
        number: "4111 1111 1111 1111".to_string(),
        holder_name: "Maria Santos".to_string(),
        expiry: "12/29".to_string(),
        cvv: "123".to_string(),
    }
}

#[tokio::test]
async fn valid_card_makes_exactly_one_charge_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/appointments/payment"))
        .and(body_partial_json(json!({
            "payment_method": "card",
            "card_number": "4111111111111111",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction_id": "TXN-1",
            "status": "paid",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let record = service
        .charge(750.0, &valid_card(), "token-1")
        .await
        .unwrap();

    assert_eq!(record.transaction_id, "TXN-1");
    assert_eq!(record.status, PaymentStatus::Paid);
}

#[tokio::test]
async fn invalid_card_never_reaches_the_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/appointments/payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction_id": "TXN-X",
            "status": "paid",
        })))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let mut card = valid_card();
    card.cvv = "12".to_string();

    let result = service.charge(750.0, &card, "token-1").await;

    assert_matches!(result, Err(PaymentError::Validation { .. }));
}

#[tokio::test]
async fn declined_charge_passes_the_backend_message_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/appointments/payment"))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(json!({"message": "insufficient funds"})),
        )
        .mount(&server)
        .await;

    let service = service_for(&server);
    let result = service.charge(750.0, &valid_card(), "token-1").await;

    assert_matches!(result, Err(PaymentError::CardDeclined(msg)) if msg == "insufficient funds");
}
