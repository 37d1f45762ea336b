pub mod card;
pub mod gcash;
pub mod outcome;
