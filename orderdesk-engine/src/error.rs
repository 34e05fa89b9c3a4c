//! Engine error types.

use orderdesk_domain::DomainError;
use thiserror::Error;

/// Errors raised while configuring or running engine computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Fee schedule rates are out of range
    #[error("Invalid fee schedule: {0}")]
    InvalidFeeSchedule(String),

    /// Scenario inputs are inconsistent
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
