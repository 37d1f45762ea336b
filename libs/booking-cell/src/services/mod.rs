pub mod submit;
pub mod symptoms;
pub mod wizard;
