pub mod clock;
pub mod models;
pub mod services;

pub use clock::{business_timezone, BusinessClock, FixedClock, SystemClock};
pub use models::{AvailabilityError, AvailabilityMap};
pub use services::availability::AvailabilityResolver;
