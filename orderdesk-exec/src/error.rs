//! Execution layer error types.

use thiserror::Error;

use orderdesk_domain::TicketId;

/// Errors that can occur while submitting orders.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Gateway communication error
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Order was rejected by the venue
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Ticket was already submitted once (at-most-once check)
    #[error("Ticket already submitted: {0}")]
    AlreadySubmitted(TicketId),

    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] orderdesk_domain::DomainError),

    /// Gateway reply does not match the submitted order
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ExecError {
    /// Whether the venue refused the order, as opposed to an internal fault.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(self, ExecError::Gateway(_) | ExecError::OrderRejected(_))
    }
}

/// Result type for execution operations.
pub type ExecResult<T> = Result<T, ExecError>;
