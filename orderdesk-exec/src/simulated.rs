//! Simulated order gateway.
//!
//! Fills every order at its effective price after a fixed delay, without
//! contacting any venue.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use orderdesk_domain::{OrderConfirmation, OrderRequest, PricingBreakdown, TicketId};

use crate::error::ExecError;
use crate::ports::OrderGateway;

/// Simulated gateway.
///
/// Exchange order ids are `SIM-1`, `SIM-2`, ... in submission order.
pub struct SimulatedGateway {
    /// Processing delay per submission
    delay: Duration,
    /// Order counter for generating IDs
    order_counter: AtomicU64,
    /// Whether to fail the next submission
    fail_next: AtomicBool,
}

impl SimulatedGateway {
    /// Processing delay of the order screen
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

    /// Create a gateway with the given processing delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            order_counter: AtomicU64::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Gateway that answers immediately.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured processing delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Configure the next submission to fail.
    pub fn set_fail_next(&self, fail: bool) {
        self.fail_next.store(fail, Ordering::SeqCst);
    }

    /// Number of orders filled so far.
    pub fn filled_count(&self) -> u64 {
        self.order_counter.load(Ordering::SeqCst)
    }

    fn next_order_id(&self) -> String {
        let n = self.order_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("SIM-{}", n)
    }

    /// Check-and-reset the failure flag.
    fn should_fail(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

#[async_trait]
impl OrderGateway for SimulatedGateway {
    async fn submit(
        &self,
        ticket_id: TicketId,
        request: &OrderRequest,
        pricing: &PricingBreakdown,
    ) -> Result<OrderConfirmation, ExecError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.should_fail() {
            return Err(ExecError::Gateway("Simulated gateway failure".to_string()));
        }

        let exchange_order_id = self.next_order_id();
        debug!(%ticket_id, %exchange_order_id, "Simulated fill");

        Ok(OrderConfirmation {
            order_id: ticket_id,
            exchange_order_id,
            symbol: request.instrument().symbol.clone(),
            quantity: request.quantity(),
            order_type: request.order_type(),
            executed_price: request.effective_price(),
            estimated_cost: pricing.estimated_cost(),
            submitted_at: Utc::now(),
        })
    }

    async fn health_check(&self) -> Result<(), ExecError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

// =============================================================================
// Tests
// =============================================================================
