//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together all components:
//! - Trading Session (pricing, analysis, tickets)
//! - Event Bus (internal communication)
//! - API Server (HTTP endpoints)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Initialize components
//! 3. Start API server
//! 4. Main event loop (log ticket events)
//! 5. Graceful shutdown on SIGINT

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use orderdesk_exec::{Executor, OrderGateway, SimulatedGateway};

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};
use crate::event_bus::{DaemonEvent, EventBus};
use crate::session::TradingSession;

// =============================================================================
// Daemon
// =============================================================================

/// The main Order Desk daemon.
pub struct Daemon {
    /// Configuration
    config: Config,
    /// Trading session
    session: Arc<RwLock<TradingSession>>,
    /// Event bus
    event_bus: Arc<EventBus>,
}

impl Daemon {
    /// Create a new daemon with the simulated gateway.
    pub fn new_stub(config: Config) -> DaemonResult<Self> {
        let gateway = Arc::new(SimulatedGateway::new(config.session.submit_delay));
        Self::with_gateway(config, gateway)
    }

    /// Create a new daemon submitting through `gateway`.
    pub fn with_gateway(config: Config, gateway: Arc<dyn OrderGateway>) -> DaemonResult<Self> {
        let executor = Arc::new(Executor::new(gateway));
        let event_bus = Arc::new(EventBus::new(1000));
        let session = TradingSession::new(&config.session, executor, event_bus.clone())?;

        Ok(Self {
            config,
            session: Arc::new(RwLock::new(session)),
            event_bus,
        })
    }

    /// Shared trading session.
    pub fn session(&self) -> Arc<RwLock<TradingSession>> {
        self.session.clone()
    }

    /// Shared event bus.
    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT or a
    /// `Shutdown` event).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            "Starting Order Desk daemon"
        );

        // 1. Check the gateway
        let gateway = self.session.read().await.executor().gateway().clone();
        if let Err(e) = gateway.health_check().await {
            warn!(gateway = gateway.name(), error = %e, "Gateway health check failed");
        }

        // 2. Start API server
        let api_addr = self.start_api_server().await?;
        info!(%api_addr, "API server started");

        // 3. Subscribe to event bus
        let mut event_receiver = self.event_bus.subscribe();

        // 4. Main event loop
        info!("Entering main event loop");
        loop {
            tokio::select! {
                // Process events from event bus
                Some(event_result) = event_receiver.recv() => {
                    match event_result {
                        Ok(event) => {
                            if let Err(e) = self.handle_event(event) {
                                match e {
                                    DaemonError::Shutdown => break,
                                    other => error!(error = %other, "Error handling event"),
                                }
                            }
                        }
                        Err(lag_msg) => {
                            warn!(%lag_msg, "Event receiver lagged");
                        }
                    }
                }

                // Handle shutdown signals
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        // 5. Graceful shutdown
        self.shutdown().await;

        Ok(())
    }

    /// Start the API server.
    pub async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let state = Arc::new(ApiState {
            session: self.session.clone(),
        });

        let router = create_router(state);
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DaemonError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| DaemonError::Config(format!("Failed to get local address: {}", e)))?;

        // Spawn the server task
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "API server error");
            }
        });

        Ok(local_addr)
    }

    /// Handle an event from the event bus.
    fn handle_event(&self, event: DaemonEvent) -> DaemonResult<()> {
        match event {
            DaemonEvent::TicketOpened {
                ticket_id,
                symbol,
                estimated_cost,
                ..
            } => {
                info!(%ticket_id, %symbol, %estimated_cost, "Ticket opened");
            },

            DaemonEvent::TicketStateChanged {
                ticket_id,
                previous_state,
                new_state,
                ..
            } => {
                info!(%ticket_id, %previous_state, %new_state, "Ticket state changed");
            },

            DaemonEvent::OrderSubmitted(confirmation) => {
                info!(
                    ticket_id = %confirmation.order_id,
                    exchange_order_id = %confirmation.exchange_order_id,
                    symbol = %confirmation.symbol,
                    executed_price = %confirmation.executed_price,
                    "Order submitted"
                );
            },

            DaemonEvent::Shutdown => {
                info!("Shutdown event received");
                return Err(DaemonError::Shutdown);
            },
        }

        Ok(())
    }

    /// Graceful shutdown.
    async fn shutdown(&self) {
        info!("Initiating graceful shutdown");

        let session = self.session.read().await;
        let open = session.tickets().filter(|t| !t.state.is_terminal()).count();
        info!(tickets = session.ticket_count(), open, "Shutdown complete");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_domain::{FieldInput, OrderForm};

    #[tokio::test]
    async fn test_daemon_stub_creation() {
        let config = Config::test();
        let daemon = Daemon::new_stub(config).unwrap();

        let session = daemon.session.read().await;
        assert_eq!(session.ticket_count(), 0);
        assert_eq!(session.instruments().len(), 8);
    }

    #[tokio::test]
    async fn test_daemon_rejects_negative_balance() {
        let mut config = Config::test();
        config.session.account_balance = rust_decimal_macros::dec!(-1);

        assert!(matches!(Daemon::new_stub(config), Err(DaemonError::Domain(_))));
    }

    #[tokio::test]
    async fn test_daemon_api_server_start() {
        let config = Config::test();
        let daemon = Daemon::new_stub(config).unwrap();

        let addr = daemon.start_api_server().await.unwrap();

        // Server should be running on a port
        assert!(addr.port() > 0);

        // Can make a health check request
        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_event() {
        let config = Config::test();
        let daemon = Daemon::new_stub(config).unwrap();
        let bus = daemon.event_bus();

        let handle = tokio::spawn(daemon.run());

        // Wait for the loop to subscribe
        while bus.receiver_count() == 0 {
            tokio::task::yield_now().await;
        }
        bus.send(DaemonEvent::Shutdown);

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_session_events_reach_bus() {
        let daemon = Daemon::new_stub(Config::test()).unwrap();
        let mut events = daemon.event_bus().subscribe();

        let form = OrderForm {
            symbol: Some("ICICI".to_string()),
            quantity: FieldInput::Parsed(10),
            ..Default::default()
        };
        daemon.session().write().await.place_order(&form).unwrap();

        assert!(matches!(events.recv().await, Some(Ok(DaemonEvent::TicketOpened { .. }))));
    }
}
