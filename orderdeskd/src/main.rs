//! Order Desk Daemon
//!
//! Serves the order entry and confirmation API over a simulated gateway.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration
//! cargo run -p orderdeskd
//!
//! # Start with custom environment
//! ORDERDESK_ENV=test ORDERDESK_API_PORT=8081 cargo run -p orderdeskd
//! ```
//!
//! # Environment Variables
//!
//! - `ORDERDESK_ENV`: Environment (test, development, production)
//! - `ORDERDESK_API_HOST`: API host (default: 0.0.0.0)
//! - `ORDERDESK_API_PORT`: API port (default: 8080)
//! - `ORDERDESK_ACCOUNT_BALANCE`: Opening balance in rupees (default: 150000)
//! - `ORDERDESK_BROKERAGE_RATE`: Brokerage rate (default: 0.0003)
//! - `ORDERDESK_GST_RATE`: GST rate on brokerage (default: 0.18)
//! - `ORDERDESK_STT_RATE`: Securities transaction tax rate (default: 0.001)
//! - `ORDERDESK_ANALYSIS_SEED`: Fixed seed for pre-trade analysis (default: random)
//! - `ORDERDESK_SUBMIT_DELAY_MS`: Simulated gateway delay (default: 2000)

use orderdeskd::{Config, Daemon};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("orderdeskd=info".parse()?))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        account_balance = %config.session.account_balance,
        "Order Desk Daemon"
    );

    // Create and run daemon
    let daemon = Daemon::new_stub(config)?;
    daemon.run().await?;

    Ok(())
}
