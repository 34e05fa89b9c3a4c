//! Order Desk Daemon Library
//!
//! Runtime orchestrator for the stock order confirmation desk.
//!
//! # Architecture
//!
//! ```text
//! Client → API Server → Trading Session → Engine (pricing, funds, analysis)
//!                              │
//!                              └→ Executor → Order Gateway
//!                              │
//!                         Event Bus (ticket lifecycle)
//! ```
//!
//! # Components
//!
//! - **Daemon**: Main runtime orchestrator
//! - **Trading Session**: Watchlist, balance and order tickets
//! - **Event Bus**: Ticket lifecycle notifications
//! - **API**: HTTP endpoints for the order form and confirmation dialog
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use orderdeskd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::new_stub(config).expect("Failed to build daemon");
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod event_bus;
pub mod session;

// Re-exports for convenience
pub use api::{create_router, ApiState};
pub use config::{ApiConfig, Config, Environment, SessionConfig};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
pub use event_bus::{DaemonEvent, EventBus, EventReceiver};
pub use session::{confirm_order, PendingSubmission, TradingSession};
