//! Daemon error types.

use orderdesk_domain::{DomainError, TicketId, ValidationErrors};
use orderdesk_engine::EngineError;
use orderdesk_exec::ExecError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Engine error
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Execution error
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    /// Order inputs failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Estimated cost exceeds the available balance
    #[error("Insufficient funds: short by {shortfall}")]
    InsufficientFunds {
        /// Cost of the rejected order
        estimated_cost: Decimal,
        /// Balance at the time of the check
        available: Decimal,
        /// estimated_cost - available
        shortfall: Decimal,
    },

    /// Ticket not found
    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shutdown requested
    #[error("Shutdown requested")]
    Shutdown,
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
