pub mod models;
pub mod services;

pub use models::{
    CardDetails, PaymentError, PaymentMethod, PaymentRecord, PaymentSession, PaymentStatus,
    PollPolicy, ScannableCode, VerificationOutcome,
};
pub use services::card::CardPaymentService;
pub use services::gcash::{GcashPaymentService, VerificationTask};
pub use services::outcome::OutcomeCell;
