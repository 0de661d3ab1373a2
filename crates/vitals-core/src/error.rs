use thiserror::Error;

/// Errors raised while building the synthesis configuration.
///
/// Synthesis itself cannot fail once a catalog has been validated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("value set must not be empty")]
    EmptyValueSet,
    #[error("value set must be strictly increasing: {prev} then {next}")]
    UnorderedValueSet { prev: f64, next: f64 },
    #[error("value set contains a non-finite value")]
    NonFiniteValue,
    #[error("invalid drift parameters: {0}")]
    InvalidDrift(String),
    #[error("invalid device profile: {0}")]
    InvalidDeviceProfile(String),
    #[error("invalid overlay parameters: {0}")]
    InvalidOverlay(String),
}
