// libs/availability-cell/src/services/availability.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Timelike};
use reqwest::Method;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_http::{ApiClient, ApiError};

use crate::clock::{BusinessClock, SystemClock};
use crate::models::{AvailabilityError, AvailabilityMap, RawAvailability};

pub struct AvailabilityResolver {
    client: Arc<ApiClient>,
    clock: Arc<dyn BusinessClock>,
}

impl AvailabilityResolver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Arc::new(ApiClient::new(config)),
            clock: Arc::new(SystemClock),
        }
    }

    /// Share a client and pin the clock, mainly for tests and embedding.
    pub fn with_client_and_clock(client: Arc<ApiClient>, clock: Arc<dyn BusinessClock>) -> Self {
        Self { client, clock }
    }

    /// Fetch the doctor's open slots and drop everything already in the past
    /// relative to business time. An empty map is a valid answer: the doctor
    /// simply has nothing open.
    pub async fn fetch_availability(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<AvailabilityMap, AvailabilityError> {
        debug!("Fetching availability for doctor: {}", doctor_id);

        let path = format!("/appointments/availability/{}", doctor_id);
        let raw: RawAvailability = match self
            .client
            .request(Method::GET, &path, Some(auth_token), None)
            .await
        {
            Ok(raw) => raw,
            Err(ApiError::AuthRequired) => return Err(AvailabilityError::AuthRequired),
            Err(ApiError::NotFound(_)) => {
                // No published schedule for this doctor.
                return Ok(AvailabilityMap::default());
            }
            Err(ApiError::Decode(msg)) => return Err(AvailabilityError::Malformed(msg)),
            Err(e) => return Err(AvailabilityError::Unavailable(e.to_string())),
        };

        let map = self.filter_past_slots(raw.into_mapping())?;
        debug!(
            "Resolved {} bookable dates for doctor {}",
            map.len(),
            doctor_id
        );
        Ok(map)
    }

    fn filter_past_slots(
        &self,
        raw: BTreeMap<String, Vec<String>>,
    ) -> Result<AvailabilityMap, AvailabilityError> {
        let now = self.clock.now();
        let today = now.date_naive();
        // Slot times carry minute precision; compare at the same granularity.
        let current_minute = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)
            .expect("hour/minute taken from a valid timestamp");

        let mut slots = BTreeMap::new();

        for (date_str, times) in raw {
            let date = parse_slot_date(&date_str)?;
            if date < today {
                continue;
            }

            let mut kept = Vec::with_capacity(times.len());
            for time_str in times {
                let time = parse_slot_time(&time_str)?;
                // Today keeps only strictly-later times; a slot at the
                // current minute is already unbookable.
                if date == today && time <= current_minute {
                    continue;
                }
                kept.push(time);
            }

            if kept.is_empty() {
                warn!("Dropping fully elapsed date {}", date);
                continue;
            }
            slots.insert(date, kept);
        }

        Ok(AvailabilityMap::new(slots))
    }
}

fn parse_slot_date(value: &str) -> Result<NaiveDate, AvailabilityError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AvailabilityError::Malformed(format!("invalid slot date: {}", value)))
}

fn parse_slot_time(value: &str) -> Result<NaiveTime, AvailabilityError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AvailabilityError::Malformed(format!("invalid slot time: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn resolver_at(instant: &str) -> AvailabilityResolver {
        let config = AppConfig {
            api_base_url: "http://localhost:4000".to_string(),
            merchant_qr_url: String::new(),
            payment_poll_interval_ms: 3000,
            payment_poll_max_attempts: 100,
        };
        AvailabilityResolver::with_client_and_clock(
            Arc::new(ApiClient::new(&config)),
            Arc::new(FixedClock::at(instant)),
        )
    }

    fn raw(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(date, times)| {
                (
                    date.to_string(),
                    times.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn past_dates_are_dropped() {
        let resolver = resolver_at("2025-03-10T09:15:00+08:00");
        let map = resolver
            .filter_past_slots(raw(&[
                ("2025-03-09", &["10:00"]),
                ("2025-03-11", &["10:00"]),
            ]))
            .unwrap();

        assert_eq!(map.dates().collect::<Vec<_>>(), vec![date("2025-03-11")]);
    }

    #[test]
    fn today_keeps_only_strictly_later_times() {
        // now = 09:15 business time; 09:00 is gone, 09:15 is gone, 09:30 stays.
        let resolver = resolver_at("2025-03-10T09:15:00+08:00");
        let map = resolver
            .filter_past_slots(raw(&[("2025-03-10", &["09:00", "09:15", "09:30"])]))
            .unwrap();

        assert_eq!(
            map.slots_for(date("2025-03-10")).unwrap(),
            &[time("09:30")]
        );
    }

    #[test]
    fn dates_left_empty_after_filtering_disappear() {
        let resolver = resolver_at("2025-03-10T18:00:00+08:00");
        let map = resolver
            .filter_past_slots(raw(&[("2025-03-10", &["09:00", "09:30"])]))
            .unwrap();

        assert!(map.is_empty());
    }

    #[test]
    fn filtering_is_business_local_not_client_local() {
        // 23:30 UTC on the 9th is already 07:30 on the 10th in business time,
        // so the 10th is "today" and its early slot is still bookable.
        let resolver = resolver_at("2025-03-09T23:30:00Z");
        let map = resolver
            .filter_past_slots(raw(&[("2025-03-10", &["08:00"])]))
            .unwrap();

        assert!(map.contains(date("2025-03-10"), time("08:00")));
    }

    #[test]
    fn malformed_time_is_reported() {
        let resolver = resolver_at("2025-03-10T09:15:00+08:00");
        let result = resolver.filter_past_slots(raw(&[("2025-03-11", &["9 o'clock"])]));

        assert!(matches!(result, Err(AvailabilityError::Malformed(_))));
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn time(value: &str) -> NaiveTime {
        NaiveTime::parse_from_str(value, "%H:%M").unwrap()
    }
}
