// libs/availability-cell/src/models.rs
use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// Per-doctor mapping from date to the open time slots on that date, already
/// filtered to business-future slots. The backend is the source of truth; the
/// client only removes entries, never invents them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMap {
    slots: BTreeMap<NaiveDate, Vec<NaiveTime>>,
}

impl AvailabilityMap {
    pub fn new(slots: BTreeMap<NaiveDate, Vec<NaiveTime>>) -> Self {
        Self { slots }
    }

    pub fn contains(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.slots
            .get(&date)
            .map(|times| times.contains(&time))
            .unwrap_or(false)
    }

    pub fn slots_for(&self, date: NaiveDate) -> Option<&[NaiveTime]> {
        self.slots.get(&date).map(Vec::as_slice)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.slots.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Vec<NaiveTime>)> {
        self.slots.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

/// The availability endpoint has shipped two shapes over time: a mapping of
/// date to time list, and a legacy array of per-day records. Both are accepted
/// here and nowhere else; everything inward sees [`AvailabilityMap`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawAvailability {
    Mapping(BTreeMap<String, Vec<String>>),
    Legacy(Vec<LegacyAvailabilityDay>),
}

#[derive(Debug, Deserialize)]
pub struct LegacyAvailabilityDay {
    pub date: String,
    pub time_slots: Vec<String>,
}

impl RawAvailability {
    pub fn into_mapping(self) -> BTreeMap<String, Vec<String>> {
        match self {
            RawAvailability::Mapping(map) => map,
            RawAvailability::Legacy(days) => days
                .into_iter()
                .map(|day| (day.date, day.time_slots))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Availability service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed availability data: {0}")]
    Malformed(String),
}
