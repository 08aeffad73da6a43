pub mod types;
pub mod classification;

pub use types::HnpError;
pub use classification::ErrorClassification;
