//! Execution layer port definitions.
//!
//! The gateway port is the boundary to whatever venue executes orders.
//! Only a simulated adapter exists.

use async_trait::async_trait;

use orderdesk_domain::{OrderConfirmation, OrderRequest, PricingBreakdown, TicketId};

use crate::error::ExecError;

// =============================================================================
// Order Gateway Port
// =============================================================================

/// Port for submitting confirmed orders.
///
/// Implementations:
/// - `SimulatedGateway` - fixed delay, fills at the effective price
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit an order.
    ///
    /// # Arguments
    ///
    /// * `ticket_id` - Ticket the order belongs to; echoed in the confirmation
    /// * `request` - Validated order
    /// * `pricing` - Breakdown the user confirmed
    ///
    /// # Returns
    ///
    /// `OrderConfirmation` with the venue's order id on success.
    async fn submit(
        &self,
        ticket_id: TicketId,
        request: &OrderRequest,
        pricing: &PricingBreakdown,
    ) -> Result<OrderConfirmation, ExecError>;

    /// Check if the gateway is reachable.
    async fn health_check(&self) -> Result<(), ExecError>;

    /// Short adapter name for logs.
    fn name(&self) -> &'static str;
}
