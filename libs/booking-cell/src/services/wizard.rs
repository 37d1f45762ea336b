// libs/booking-cell/src/services/wizard.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use availability_cell::AvailabilityMap;
use session_cell::{clear_draft, keys, load_draft, save_draft, SessionStore};

use crate::models::{
    AppointmentPayload, BookingDraft, BookingError, Stage, StageInput, Symptom,
};

/// What goes into the `bookingDraft` session entry: the draft plus the stage
/// the patient was on, so a reload resumes where they left off.
#[derive(Serialize, Deserialize)]
struct PersistedDraft {
    stage: Stage,
    draft: BookingDraft,
}

/// The wizard conductor. Validates each stage's prerequisites before
/// advancing, merges accepted input into the draft, and persists the draft
/// after every successful transition so a full page reload loses nothing.
pub struct BookingDraftController {
    draft: BookingDraft,
    stage: Stage,
    availability: Option<AvailabilityMap>,
    store: Arc<dyn SessionStore>,
}

impl BookingDraftController {
    /// Rehydrates from the session store when a draft is present, otherwise
    /// starts empty at doctor selection.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (draft, stage) = match load_draft::<PersistedDraft>(store.as_ref()) {
            Some(persisted) => {
                info!("Rehydrated booking draft at stage {}", persisted.stage);
                (persisted.draft, persisted.stage)
            }
            None => (BookingDraft::default(), Stage::SelectDoctor),
        };

        Self {
            draft,
            stage,
            availability: None,
            store,
        }
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Date of birth, follow-up flag, and notes come from the patient's
    /// profile rather than a wizard stage; set them any time before
    /// serialization.
    pub fn set_patient_details(
        &mut self,
        date_of_birth: NaiveDate,
        follow_up: bool,
        notes: Option<String>,
    ) {
        self.draft.date_of_birth = Some(date_of_birth);
        self.draft.follow_up = follow_up;
        self.draft.notes = notes;
        self.persist();
    }

    /// Availability is fetched once per doctor per wizard entry; load it here
    /// before the date/time stage can validate anything.
    pub fn set_availability(&mut self, map: AvailabilityMap) {
        self.availability = Some(map);
    }

    pub fn availability(&self) -> Option<&AvailabilityMap> {
        self.availability.as_ref()
    }

    /// Validate `input` against the live stage, merge it into the draft, and
    /// move forward. On failure the stage does not move and the draft is
    /// untouched. Re-advancing with the same input replaces rather than
    /// accumulates, so going back and forward never duplicates anything.
    pub fn advance(&mut self, input: StageInput) -> Result<Stage, BookingError> {
        let next = match (self.stage, input) {
            (Stage::SelectDoctor, StageInput::Doctor(doctor)) => {
                self.apply_doctor(doctor);
                Stage::SelectDateTime
            }
            (Stage::SelectDateTime, StageInput::Schedule { date, time }) => {
                self.validate_slot(date, time)?;
                self.draft.selected_date = Some(date);
                self.draft.selected_time = Some(time);
                Stage::SelectSymptoms
            }
            (Stage::SelectSymptoms, StageInput::Symptoms(symptoms)) => {
                if symptoms.is_empty() {
                    return Err(BookingError::ValidationError {
                        fields: vec!["symptoms".to_string()],
                    });
                }
                self.draft.symptoms = dedupe_by_key(symptoms);
                Stage::UploadDocuments
            }
            (
                Stage::UploadDocuments,
                StageInput::Documents {
                    documents,
                    medicine_allergies,
                },
            ) => {
                self.draft.documents = documents;
                self.draft.medicine_allergies = medicine_allergies;
                Stage::Pay
            }
            (Stage::Pay, StageInput::Payment(record)) => {
                if record.status != payment_cell::PaymentStatus::Paid {
                    return Err(BookingError::IncompletePayment);
                }
                self.draft.payment = Some(record);
                Stage::Confirm
            }
            (stage, _) => return Err(BookingError::StageMismatch(stage)),
        };

        self.stage = next;
        self.persist();
        debug!("Wizard advanced to stage {}", next);
        Ok(next)
    }

    /// Step back one stage. Data entered for later stages is retained so the
    /// patient can go back and forward freely; stepping back off the first
    /// stage abandons the draft entirely.
    pub fn retreat(&mut self) -> Stage {
        match self.stage.prev() {
            Some(prev) => {
                self.stage = prev;
                self.persist();
                prev
            }
            None => {
                info!("Retreated past doctor selection, clearing draft");
                self.reset();
                Stage::SelectDoctor
            }
        }
    }

    /// Abandon the draft and wipe the persisted keys.
    pub fn reset(&mut self) {
        self.draft = BookingDraft::default();
        self.stage = Stage::SelectDoctor;
        self.availability = None;
        clear_draft(self.store.as_ref());
    }

    /// Final payload for the submitter. Only meaningful once the pay stage
    /// produced a paid record.
    pub fn serialize_for_submission(&self) -> Result<AppointmentPayload, BookingError> {
        if !self.draft.is_paid() {
            return Err(BookingError::IncompletePayment);
        }

        AppointmentPayload::from_draft(&self.draft)
            .map_err(|fields| BookingError::ValidationError { fields })
    }

    /// Slots get taken between selection and submission; re-check the chosen
    /// slot against a freshly fetched map before submitting.
    pub fn revalidate_slot(&self, fresh: &AvailabilityMap) -> Result<(), BookingError> {
        match (self.draft.selected_date, self.draft.selected_time) {
            (Some(date), Some(time)) if fresh.contains(date, time) => Ok(()),
            (Some(_), Some(_)) => Err(BookingError::SlotNotAvailable),
            _ => Err(BookingError::ValidationError {
                fields: vec!["selectedDate".to_string(), "selectedTime".to_string()],
            }),
        }
    }

    fn apply_doctor(&mut self, doctor: crate::models::DoctorProfile) {
        let changed = self
            .draft
            .doctor
            .as_ref()
            .map(|current| current.id != doctor.id)
            .unwrap_or(false);

        if changed {
            // Changing doctor restarts the draft; old slots and fee no longer apply.
            info!("Doctor changed, restarting booking draft");
            self.draft = BookingDraft::default();
            self.availability = None;
        }
        self.draft.doctor = Some(doctor);
    }

    fn validate_slot(&self, date: NaiveDate, time: NaiveTime) -> Result<(), BookingError> {
        let map = self
            .availability
            .as_ref()
            .ok_or(BookingError::SlotNotAvailable)?;

        if !map.contains(date, time) {
            return Err(BookingError::SlotNotAvailable);
        }
        Ok(())
    }

    fn persist(&self) {
        let persisted = PersistedDraft {
            stage: self.stage,
            draft: self.draft.clone(),
        };

        save_draft(self.store.as_ref(), &persisted);

        // Flat keys mirror the draft for lightweight readers. A field gone
        // from the draft (doctor change, reset) takes its key with it, so
        // stale selections never outlive the draft they belonged to.
        match &self.draft.doctor {
            Some(doctor) => {
                if let Ok(json) = serde_json::to_string(doctor) {
                    self.store.set(keys::SELECTED_DOCTOR, &json);
                }
            }
            None => self.store.remove(keys::SELECTED_DOCTOR),
        }
        match self.draft.selected_date {
            Some(date) => self
                .store
                .set(keys::SELECTED_DATE, &date.format("%Y-%m-%d").to_string()),
            None => self.store.remove(keys::SELECTED_DATE),
        }
        match self.draft.selected_time {
            Some(time) => self
                .store
                .set(keys::SELECTED_TIME, &time.format("%H:%M").to_string()),
            None => self.store.remove(keys::SELECTED_TIME),
        }
        self.store.set(
            keys::APPOINTMENT_TYPE,
            &self.draft.appointment_type.to_string(),
        );
    }
}

fn dedupe_by_key(symptoms: Vec<Symptom>) -> Vec<Symptom> {
    let mut seen = Vec::with_capacity(symptoms.len());
    let mut result = Vec::with_capacity(symptoms.len());
    for symptom in symptoms {
        if seen.contains(&symptom.key) {
            continue;
        }
        seen.push(symptom.key.clone());
        result.push(symptom);
    }
    result
}
