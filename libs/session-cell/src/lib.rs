pub mod draft;
pub mod store;

pub use draft::{clear_draft, load_draft, save_draft};
pub use store::{MemorySessionStore, SessionStore};

/// Flat keys making up the persisted booking draft. They are written together
/// after every successful wizard step and cleared together on submission or
/// explicit reset.
pub mod keys {
    pub const SELECTED_DOCTOR: &str = "selectedDoctor";
    pub const SELECTED_DATE: &str = "selectedDate";
    pub const SELECTED_TIME: &str = "selectedTime";
    pub const APPOINTMENT_TYPE: &str = "appointmentType";
    pub const BOOKING_DRAFT: &str = "bookingDraft";

    pub const ALL: [&str; 5] = [
        SELECTED_DOCTOR,
        SELECTED_DATE,
        SELECTED_TIME,
        APPOINTMENT_TYPE,
        BOOKING_DRAFT,
    ];
}
