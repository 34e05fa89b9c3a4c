//! Order Desk Execution Layer
//!
//! At-most-once order submission through a gateway port.
//!
//! # Architecture
//!
//! ```text
//! Confirmed ticket → Executor → Submission journal → Gateway → Confirmation
//! ```
//!
//! # Components
//!
//! - **Ports**: `OrderGateway`, the boundary to an execution venue
//! - **Executor**: journals and verifies submissions
//! - **Simulated**: gateway with a fixed processing delay
//!
//! # Example
//!
//! ```rust,ignore
//! use orderdesk_exec::{Executor, SimulatedGateway};
//! use std::sync::Arc;
//!
//! let executor = Executor::new(Arc::new(SimulatedGateway::default()));
//! let confirmation = executor.submit(ticket.id, &ticket.request, &ticket.pricing).await?;
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod executor;
pub mod ports;
pub mod simulated;

// Re-exports for convenience
pub use error::{ExecError, ExecResult};
pub use executor::{Executor, SubmissionJournal};
pub use ports::OrderGateway;
pub use simulated::SimulatedGateway;
