// libs/booking-cell/src/services/symptoms.rs
use std::sync::Arc;

use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_http::{ApiClient, ApiError};

use crate::models::{Symptom, SymptomCatalogError};

/// Fetches the canonical symptom catalog the patient picks from. Keys from
/// this catalog are what the draft stores; labels are display-only.
pub struct SymptomCatalogService {
    client: Arc<ApiClient>,
}

impl SymptomCatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Arc::new(ApiClient::new(config)),
        }
    }

    pub fn with_client(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn fetch_catalog(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Symptom>, SymptomCatalogError> {
        debug!("Fetching symptom catalog");

        let catalog: Vec<Symptom> = self
            .client
            .request(Method::GET, "/symptoms", Some(auth_token), None)
            .await
            .map_err(|e| match e {
                ApiError::AuthRequired => SymptomCatalogError::AuthRequired,
                other => SymptomCatalogError::Unavailable(other.to_string()),
            })?;

        debug!("Symptom catalog holds {} entries", catalog.len());
        Ok(catalog)
    }
}
