// libs/availability-cell/src/clock.rs
use chrono::{DateTime, FixedOffset, Utc};

/// Slot times are business-local (UTC+8) and must not drift with the client
/// locale. Every past/future comparison in the booking flow goes through this
/// offset, never through the host timezone.
pub fn business_timezone() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset")
}

/// Injectable clock so slot filtering is deterministic under test.
pub trait BusinessClock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

pub struct SystemClock;

impl BusinessClock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&business_timezone())
    }
}

/// Clock pinned to one instant, for tests and replay.
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Parse an RFC 3339 instant, e.g. `2025-03-10T09:15:00+08:00`.
    pub fn at(rfc3339: &str) -> Self {
        let instant = DateTime::parse_from_rfc3339(rfc3339)
            .expect("fixed clock instant must be valid RFC 3339");
        Self(instant.with_timezone(&business_timezone()))
    }
}

impl BusinessClock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
