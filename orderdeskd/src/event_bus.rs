//! Event bus for internal daemon communication.
//!
//! Ticket lifecycle events published by the trading session. Every
//! subscriber sees every event sent after it subscribed.

use chrono::{DateTime, Utc};
use orderdesk_domain::{OrderConfirmation, Symbol, TicketId};
use rust_decimal::Decimal;
use tokio::sync::broadcast;

// =============================================================================
// Event Types
// =============================================================================

/// Events that flow through the daemon event bus.
#[derive(Debug, Clone)]
pub enum DaemonEvent {
    /// A new ticket was opened in REVIEWING
    TicketOpened {
        ticket_id: TicketId,
        symbol: Symbol,
        estimated_cost: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// Ticket moved between confirmation states
    TicketStateChanged {
        ticket_id: TicketId,
        previous_state: String,
        new_state: String,
        timestamp: DateTime<Utc>,
    },

    /// Gateway accepted an order
    OrderSubmitted(OrderConfirmation),

    /// Shutdown signal
    Shutdown,
}

// =============================================================================
// Event Bus
// =============================================================================

/// Broadcast channel shared by the session and the daemon loop.
pub struct EventBus {
    sender: broadcast::Sender<DaemonEvent>,
}

impl EventBus {
    /// A subscriber more than `capacity` events behind starts dropping the oldest.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish `event`, returning how many subscribers it reached.
    pub fn send(&self, event: DaemonEvent) -> usize {
        // No subscribers is not an error for a ticket event
        self.sender.send(event).unwrap_or(0)
    }

    /// New subscriber, starting from the next event sent.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// One subscription to an [`EventBus`].
pub struct EventReceiver {
    receiver: broadcast::Receiver<DaemonEvent>,
}

impl EventReceiver {
    /// Next event, `None` once the bus is gone. `Some(Err(_))` reports
    /// how many events this subscriber fell behind by.
    pub async fn recv(&mut self) -> Option<Result<DaemonEvent, String>> {
        match self.receiver.recv().await {
            Ok(event) => Some(Ok(event)),
            Err(broadcast::error::RecvError::Closed) => None,
            Err(broadcast::error::RecvError::Lagged(count)) => {
                Some(Err(format!("skipped {} events", count)))
            },
        }
    }

    /// Like [`recv`](Self::recv) but returns `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<Result<DaemonEvent, String>> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Ok(event)),
            Err(broadcast::error::TryRecvError::Empty) => None,
            Err(broadcast::error::TryRecvError::Closed) => None,
            Err(broadcast::error::TryRecvError::Lagged(count)) => {
                Some(Err(format!("skipped {} events", count)))
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
