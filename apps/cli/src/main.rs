use std::env;

use anyhow::{bail, Context};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use availability_cell::AvailabilityResolver;
use booking_cell::SymptomCatalogService;
use shared_config::AppConfig;

/// Diagnostic binary: fetches the symptom catalog and one doctor's filtered
/// availability against a live backend, to verify config and wiring.
///
/// Usage: booking-cli <doctor-id>   (AUTH_TOKEN taken from the environment)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let doctor_id = env::args()
        .nth(1)
        .context("usage: booking-cli <doctor-id>")?;
    let auth_token = env::var("AUTH_TOKEN").context("AUTH_TOKEN must be set")?;

    let config = AppConfig::from_env();
    if !config.is_configured() {
        bail!("API_BASE_URL must be set");
    }
    info!("Using backend {}", config.api_base_url);

    let catalog = SymptomCatalogService::new(&config)
        .fetch_catalog(&auth_token)
        .await
        .context("failed to fetch symptom catalog")?;
    println!("Symptom catalog ({} entries):", catalog.len());
    for symptom in &catalog {
        println!("  {}  {}", symptom.key, symptom.label);
    }

    let availability = AvailabilityResolver::new(&config)
        .fetch_availability(&doctor_id, &auth_token)
        .await
        .context("failed to fetch availability")?;

    if availability.is_empty() {
        println!("Doctor {} has no bookable slots.", doctor_id);
        return Ok(());
    }

    println!("Bookable slots for doctor {}:", doctor_id);
    for (date, times) in availability.iter() {
        let times: Vec<String> = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
        println!("  {}  {}", date, times.join(" "));
    }

    Ok(())
}
