use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use payment_cell::{
    GcashPaymentService, PaymentError, PaymentMethod, PaymentStatus, PollPolicy,
    VerificationOutcome,
};
use shared_config::AppConfig;
use shared_http::ApiClient;

fn service_for(server: &MockServer, policy: PollPolicy) -> GcashPaymentService {
    let config = AppConfig {
        api_base_url: server.uri(),
        merchant_qr_url: "https://cdn.example.com/merchant-qr.png".to_string(),
        payment_poll_interval_ms: policy.interval.as_millis() as u64,
        payment_poll_max_attempts: policy.max_attempts,
    };
    GcashPaymentService::with_client(
        Arc::new(ApiClient::new(&config)),
        &config.merchant_qr_url,
        policy,
    )
}

fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts,
    }
}

async fn mount_session_creation(server: &MockServer, reference: &str, amount: f64) {
    Mock::given(method("POST"))
        .and(path("/appointments/payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction_id": reference,
            "amount": amount,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn request_reference_mints_session_and_scannable_code() {
    let server = MockServer::start().await;
    mount_session_creation(&server, "GC-12345", 500.0).await;

    let service = service_for(&server, PollPolicy::default());
    let (session, code) = service.request_reference(500.0, "token-1").await.unwrap();

    assert_eq!(session.reference_number, "GC-12345");
    assert_eq!(session.amount, 500.0);
    assert_eq!(session.status, PaymentStatus::Pending);
    assert_eq!(
        code.payload(),
        "https://cdn.example.com/merchant-qr.png?ref=GC-12345"
    );
}

#[tokio::test]
async fn polling_confirms_payment_once_backend_reports_paid() {
    let server = MockServer::start().await;
    mount_session_creation(&server, "GC-PAID", 500.0).await;

    Mock::given(method("GET"))
        .and(path("/appointments/payment/verify/GC-PAID"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "paid",
            "transaction_id": "GC-PAID",
            "amount": 500.0,
        })))
        .mount(&server)
        .await;

    let service = service_for(&server, fast_policy(10));
    let (session, _) = service.request_reference(500.0, "token-1").await.unwrap();
    let task = service.begin_verification(&session);

    let outcome = task.poll_until_paid("token-1").await;

    match outcome {
        VerificationOutcome::Paid(record) => {
            assert_eq!(record.transaction_id, "GC-PAID");
            assert_eq!(record.method, PaymentMethod::Gcash);
            assert_eq!(record.status, PaymentStatus::Paid);
        }
        other => panic!("expected paid outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn exhausted_budget_times_out_with_no_extra_call() {
    let server = MockServer::start().await;
    mount_session_creation(&server, "GC-NEVER", 500.0).await;

    // Exactly max_attempts verification calls, never one more.
    Mock::given(method("GET"))
        .and(path("/appointments/payment/verify/GC-NEVER"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .expect(100)
        .mount(&server)
        .await;

    let service = service_for(&server, fast_policy(100));
    let (session, _) = service.request_reference(500.0, "token-1").await.unwrap();
    let task = service.begin_verification(&session);

    let outcome = task.poll_until_paid("token-1").await;

    assert_eq!(outcome, VerificationOutcome::TimedOut);
    // Mock expectation (exactly 100 calls) is verified on drop.
}

#[tokio::test]
async fn manual_verification_settles_and_stops_the_poll_loop() {
    let server = MockServer::start().await;
    mount_session_creation(&server, "GC-RACE", 500.0).await;

    // Polling alone would never confirm this session.
    Mock::given(method("GET"))
        .and(path("/appointments/payment/verify/GC-RACE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/appointments/payment/verify-reference"))
        .and(body_json(json!({
            "gcash_reference_number": "GC-RACE",
            "transaction_id": "GC-RACE",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verified": true})))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(
        &server,
        PollPolicy {
            interval: Duration::from_millis(20),
            max_attempts: 1000,
        },
    );
    let (session, _) = service.request_reference(500.0, "token-1").await.unwrap();
    let task = service.begin_verification(&session);

    let poller = {
        let task = task.clone();
        tokio::spawn(async move { task.poll_until_paid("token-1").await })
    };

    let manual = task.verify_manual("GC-RACE", "token-1").await.unwrap();
    assert_matches!(manual, VerificationOutcome::Paid(_));

    // The poll loop observes the settled cell and exits with the same single
    // outcome; it would otherwise run for another ~20 seconds.
    let polled = tokio::time::timeout(Duration::from_secs(2), poller)
        .await
        .expect("poll loop should stop promptly after manual confirmation")
        .unwrap();
    assert_eq!(polled, manual);
}

#[tokio::test]
async fn polling_win_makes_later_manual_entry_a_no_op() {
    let server = MockServer::start().await;
    mount_session_creation(&server, "GC-FIRST", 500.0).await;

    Mock::given(method("GET"))
        .and(path("/appointments/payment/verify/GC-FIRST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "paid"})))
        .mount(&server)
        .await;

    // The manual endpoint must not be called once the session is settled.
    Mock::given(method("POST"))
        .and(path("/appointments/payment/verify-reference"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verified": true})))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server, fast_policy(10));
    let (session, _) = service.request_reference(500.0, "token-1").await.unwrap();
    let task = service.begin_verification(&session);

    let polled = task.poll_until_paid("token-1").await;
    let manual = task.verify_manual("GC-FIRST", "token-1").await.unwrap();

    assert_matches!(polled, VerificationOutcome::Paid(_));
    assert_eq!(manual, polled);
}

#[tokio::test]
async fn rejected_reference_leaves_the_session_live() {
    let server = MockServer::start().await;
    mount_session_creation(&server, "GC-TYPO", 500.0).await;

    Mock::given(method("POST"))
        .and(path("/appointments/payment/verify-reference"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"verified": false, "message": "reference not found"})),
        )
        .mount(&server)
        .await;

    let service = service_for(&server, fast_policy(10));
    let (session, _) = service.request_reference(500.0, "token-1").await.unwrap();
    let task = service.begin_verification(&session);

    let result = task.verify_manual("WRONG-REF", "token-1").await;

    assert_matches!(result, Err(PaymentError::VerificationRejected(_)));
    assert_eq!(task.outcome(), None);
}

#[tokio::test]
async fn server_failure_during_manual_verify_is_retryable_not_a_verdict() {
    let server = MockServer::start().await;
    mount_session_creation(&server, "GC-FLAKY", 500.0).await;

    Mock::given(method("POST"))
        .and(path("/appointments/payment/verify-reference"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "upstream unavailable"})),
        )
        .mount(&server)
        .await;

    let service = service_for(&server, fast_policy(10));
    let (session, _) = service.request_reference(500.0, "token-1").await.unwrap();
    let task = service.begin_verification(&session);

    let result = task.verify_manual("GC-FLAKY", "token-1").await;

    // Transient backend trouble is not "reference not accepted"; the payer
    // may simply retry, and the session stays live.
    assert_matches!(result, Err(PaymentError::NetworkError(_)));
    assert_eq!(task.outcome(), None);
}

#[tokio::test]
async fn cancellation_stops_polling_deterministically() {
    let server = MockServer::start().await;
    mount_session_creation(&server, "GC-GONE", 500.0).await;

    Mock::given(method("GET"))
        .and(path("/appointments/payment/verify/GC-GONE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .mount(&server)
        .await;

    let service = service_for(
        &server,
        PollPolicy {
            interval: Duration::from_secs(30),
            max_attempts: 100,
        },
    );
    let (session, _) = service.request_reference(500.0, "token-1").await.unwrap();
    let task = service.begin_verification(&session);

    let poller = {
        let task = task.clone();
        tokio::spawn(async move { task.poll_until_paid("token-1").await })
    };

    // Give the loop a moment to issue its first query and park in the sleep,
    // then cancel as a rail switch / unmount would.
    tokio::time::sleep(Duration::from_millis(100)).await;
    task.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(2), poller)
        .await
        .expect("cancelled poll loop must not wait out its 30s interval")
        .unwrap();
    assert_eq!(outcome, VerificationOutcome::Cancelled);

    // Only the pre-cancellation query reached the backend.
    let verify_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/appointments/payment/verify/"))
        .count();
    assert_eq!(verify_calls, 1);
}
