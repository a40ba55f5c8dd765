use thiserror::Error;

/// Errors raised while setting up or running a simulation.
///
/// All of these are detected before the stepping loop begins; a run either
/// completes every step or does not start.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Out of domain: {0}")]
    Domain(String),

    #[error("Courant number {courant} exceeds 1, the explicit update would be unstable")]
    NumericalInstability { courant: f64 },
}

pub type Result<T> = std::result::Result<T, SimError>;
