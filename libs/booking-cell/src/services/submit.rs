// libs/booking-cell/src/services/submit.rs
use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use availability_cell::{AvailabilityError, AvailabilityResolver};
use session_cell::{clear_draft, SessionStore};
use shared_config::AppConfig;
use shared_http::{ApiClient, ApiError};

use crate::models::{
    AppointmentPayload, BookedEvent, BookingDraft, SubmitError, MAX_DOCUMENT_BYTES,
};

const BOOKED_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct CreateAppointmentResponse {
    #[serde(alias = "appointment_id")]
    id: String,
}

/// Serializes a completed draft and posts it to the appointment endpoint.
/// Every guard runs before any network call; the chosen slot is re-checked
/// against fresh availability because another booking can take it between
/// selection and submission.
pub struct AppointmentSubmitter {
    client: Arc<ApiClient>,
    resolver: AvailabilityResolver,
    store: Arc<dyn SessionStore>,
    booked_tx: broadcast::Sender<BookedEvent>,
}

impl AppointmentSubmitter {
    pub fn new(config: &AppConfig, store: Arc<dyn SessionStore>) -> Self {
        let client = Arc::new(ApiClient::new(config));
        Self {
            resolver: AvailabilityResolver::with_client_and_clock(
                Arc::clone(&client),
                Arc::new(availability_cell::SystemClock),
            ),
            client,
            store,
            booked_tx: broadcast::channel(BOOKED_CHANNEL_CAPACITY).0,
        }
    }

    pub fn with_parts(
        client: Arc<ApiClient>,
        resolver: AvailabilityResolver,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            client,
            resolver,
            store,
            booked_tx: broadcast::channel(BOOKED_CHANNEL_CAPACITY).0,
        }
    }

    /// Out-of-scope UI (badge counter, activity feed) listens here for the
    /// "appointment booked" signal.
    pub fn subscribe_booked(&self) -> broadcast::Receiver<BookedEvent> {
        self.booked_tx.subscribe()
    }

    pub async fn submit(
        &self,
        draft: &BookingDraft,
        auth_token: &str,
    ) -> Result<String, SubmitError> {
        // Guards first; no network traffic for an unfinished draft.
        if !draft.is_paid() {
            return Err(SubmitError::IncompletePayment);
        }

        let payload = AppointmentPayload::from_draft(draft)
            .map_err(|missing| SubmitError::IncompleteDraft { missing })?;

        for document in &draft.documents {
            if document.size_bytes > MAX_DOCUMENT_BYTES {
                warn!(
                    "Rejecting oversized attachment {} ({} bytes)",
                    document.name, document.size_bytes
                );
                return Err(SubmitError::FileTooLarge {
                    name: document.name.clone(),
                    size_bytes: document.size_bytes,
                });
            }
        }

        self.recheck_slot(draft, auth_token).await?;

        let body = serde_json::to_value(&payload)
            .map_err(|e| SubmitError::SubmissionFailed(e.to_string()))?;

        let response: CreateAppointmentResponse = self
            .client
            .request(Method::POST, "/appointments", Some(auth_token), Some(body))
            .await
            .map_err(|e| match e {
                ApiError::AuthRequired => SubmitError::AuthExpired,
                ApiError::Backend { message, .. } => SubmitError::SubmissionFailed(
                    if message.trim().is_empty() {
                        "Appointment could not be booked, try again".to_string()
                    } else {
                        message
                    },
                ),
                other => SubmitError::Network(other.to_string()),
            })?;

        info!("Appointment {} booked, clearing draft", response.id);
        clear_draft(self.store.as_ref());

        // No listeners is fine; the signal is best-effort.
        let _ = self.booked_tx.send(BookedEvent {
            appointment_id: response.id.clone(),
        });

        Ok(response.id)
    }

    async fn recheck_slot(
        &self,
        draft: &BookingDraft,
        auth_token: &str,
    ) -> Result<(), SubmitError> {
        let (doctor, date, time) = match (&draft.doctor, draft.selected_date, draft.selected_time)
        {
            (Some(doctor), Some(date), Some(time)) => (doctor, date, time),
            // from_draft already rejected this shape.
            _ => {
                return Err(SubmitError::IncompleteDraft {
                    missing: vec!["selectedDate".to_string(), "selectedTime".to_string()],
                })
            }
        };

        let fresh = self
            .resolver
            .fetch_availability(&doctor.id, auth_token)
            .await
            .map_err(|e| match e {
                AvailabilityError::AuthRequired => SubmitError::AuthExpired,
                other => SubmitError::Network(other.to_string()),
            })?;

        if !fresh.contains(date, time) {
            warn!(
                "Slot {} {} for doctor {} vanished before submission",
                date, time, doctor.id
            );
            return Err(SubmitError::SlotTaken);
        }

        Ok(())
    }
}
