pub mod models;
pub mod services;

pub use models::{
    AppointmentPayload, AppointmentType, BookedEvent, BookingDraft, BookingError,
    DocumentAttachment, DoctorProfile, Stage, StageInput, SubmitError, Symptom,
    SymptomCatalogError, MAX_DOCUMENT_BYTES,
};
pub use services::submit::AppointmentSubmitter;
pub use services::symptoms::SymptomCatalogService;
pub use services::wizard::BookingDraftController;
