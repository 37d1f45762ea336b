use std::env;
use tracing::warn;

/// Default spacing between payment verification polls, in milliseconds.
pub const DEFAULT_PAYMENT_POLL_INTERVAL_MS: u64 = 3_000;
/// Default number of verification polls before giving up (100 x 3s = 5 min).
pub const DEFAULT_PAYMENT_POLL_MAX_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub merchant_qr_url: String,
    pub payment_poll_interval_ms: u64,
    pub payment_poll_max_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("API_BASE_URL not set, using empty value");
                    String::new()
                }),
            merchant_qr_url: env::var("MERCHANT_QR_URL")
                .unwrap_or_else(|_| {
                    warn!("MERCHANT_QR_URL not set, using empty value");
                    String::new()
                }),
            payment_poll_interval_ms: env::var("PAYMENT_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PAYMENT_POLL_INTERVAL_MS),
            payment_poll_max_attempts: env::var("PAYMENT_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PAYMENT_POLL_MAX_ATTEMPTS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }

    pub fn is_qr_payment_configured(&self) -> bool {
        !self.merchant_qr_url.is_empty()
    }
}
