//! Executor: submits confirmed tickets through the gateway.
//!
//! The executor never touches ticket state. The caller moves the ticket to
//! PROCESSING, hands over a copy of the order, and applies the outcome.
//!
//! # Flow
//!
//! ```text
//! Ticket (PROCESSING) → Executor → Submission journal → Gateway → Confirmation
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use orderdesk_domain::{OrderConfirmation, OrderRequest, PricingBreakdown, TicketId};

use crate::error::{ExecError, ExecResult};
use crate::ports::OrderGateway;

// =============================================================================
// Submission journal
// =============================================================================

/// At-most-once record of submitted tickets.
///
/// A ticket id is claimed before the gateway call and released again if the
/// gateway fails, so a failed order can be retried by the user.
#[derive(Debug, Default)]
pub struct SubmissionJournal {
    /// ticket id → exchange order id (None while in flight)
    entries: Mutex<HashMap<TicketId, Option<String>>>,
}

impl SubmissionJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&self, ticket_id: TicketId) -> ExecResult<()> {
        let mut entries = self.lock()?;
        if entries.contains_key(&ticket_id) {
            return Err(ExecError::AlreadySubmitted(ticket_id));
        }
        entries.insert(ticket_id, None);
        Ok(())
    }

    fn record(&self, ticket_id: TicketId, exchange_order_id: &str) -> ExecResult<()> {
        self.lock()?.insert(ticket_id, Some(exchange_order_id.to_string()));
        Ok(())
    }

    fn release(&self, ticket_id: TicketId) -> ExecResult<()> {
        self.lock()?.remove(&ticket_id);
        Ok(())
    }

    /// Exchange order id for a filled ticket.
    pub fn exchange_order_id(&self, ticket_id: TicketId) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(&ticket_id).cloned().flatten())
    }

    /// Number of tickets claimed or filled.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing has been submitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> ExecResult<std::sync::MutexGuard<'_, HashMap<TicketId, Option<String>>>> {
        self.entries
            .lock()
            .map_err(|e| ExecError::InvalidState(format!("Submission journal poisoned: {}", e)))
    }
}

// =============================================================================
// Executor
// =============================================================================

/// Submits orders through an [`OrderGateway`], at most once per ticket.
pub struct Executor {
    /// Gateway port for placing orders
    gateway: Arc<dyn OrderGateway>,
    /// Journal for idempotency
    journal: SubmissionJournal,
}

impl Executor {
    /// Create a new executor.
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self {
            gateway,
            journal: SubmissionJournal::new(),
        }
    }

    /// The gateway in use.
    pub fn gateway(&self) -> &Arc<dyn OrderGateway> {
        &self.gateway
    }

    /// The submission journal.
    pub fn journal(&self) -> &SubmissionJournal {
        &self.journal
    }

    /// Submit one order.
    ///
    /// # Errors
    ///
    /// - `AlreadySubmitted` if the ticket was submitted before
    /// - `Gateway` / `OrderRejected` if the gateway refused the order
    /// - `InvalidState` if the confirmation does not match the order
    pub async fn submit(
        &self,
        ticket_id: TicketId,
        request: &OrderRequest,
        pricing: &PricingBreakdown,
    ) -> ExecResult<OrderConfirmation> {
        self.journal.claim(ticket_id)?;

        info!(
            %ticket_id,
            symbol = %request.instrument().symbol,
            quantity = request.quantity().shares(),
            order_type = %request.order_type(),
            gateway = self.gateway.name(),
            "Submitting order"
        );

        let confirmation = match self.gateway.submit(ticket_id, request, pricing).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                error!(%ticket_id, error = %e, "Order submission failed");
                self.journal.release(ticket_id)?;
                return Err(e);
            },
        };

        if let Err(e) = verify(&confirmation, ticket_id, request) {
            self.journal.release(ticket_id)?;
            return Err(e);
        }

        self.journal.record(ticket_id, &confirmation.exchange_order_id)?;

        info!(
            %ticket_id,
            exchange_order_id = %confirmation.exchange_order_id,
            executed_price = %confirmation.executed_price,
            "Order submitted"
        );

        Ok(confirmation)
    }
}

fn verify(confirmation: &OrderConfirmation, ticket_id: TicketId, request: &OrderRequest) -> ExecResult<()> {
    if confirmation.order_id != ticket_id {
        return Err(ExecError::InvalidState(format!(
            "Gateway confirmed {} for ticket {}",
            confirmation.order_id, ticket_id
        )));
    }
    if confirmation.symbol != request.instrument().symbol || confirmation.quantity != request.quantity() {
        return Err(ExecError::InvalidState(format!(
            "Gateway confirmation {} does not match ticket {}",
            confirmation.exchange_order_id, ticket_id
        )));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedGateway;
    use async_trait::async_trait;
    use orderdesk_domain::{Instrument, OrderDraft, OrderType};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn order() -> (OrderRequest, PricingBreakdown) {
        let request = OrderDraft {
            instrument: Some(Instrument::new("TCS", "Tata Consultancy Services", dec!(3678.90)).unwrap()),
            quantity: 3,
            order_type: OrderType::Market,
            limit_price: None,
        }
        .validate()
        .unwrap();
        let pricing =
            PricingBreakdown::from_components(dec!(11036.70), dec!(3.31101), dec!(0.5959818), dec!(11.0367))
                .unwrap();
        (request, pricing)
    }

    #[tokio::test]
    async fn test_submit_records_journal() {
        let gateway = Arc::new(SimulatedGateway::instant());
        let executor = Executor::new(gateway);
        let (request, pricing) = order();
        let ticket_id = Uuid::now_v7();

        let confirmation = executor.submit(ticket_id, &request, &pricing).await.unwrap();

        assert_eq!(confirmation.exchange_order_id, "SIM-1");
        assert_eq!(executor.journal().exchange_order_id(ticket_id), Some("SIM-1".to_string()));
    }

    #[tokio::test]
    async fn test_second_submission_rejected() {
        let executor = Executor::new(Arc::new(SimulatedGateway::instant()));
        let (request, pricing) = order();
        let ticket_id = Uuid::now_v7();

        executor.submit(ticket_id, &request, &pricing).await.unwrap();
        let result = executor.submit(ticket_id, &request, &pricing).await;

        assert!(matches!(result, Err(ExecError::AlreadySubmitted(id)) if id == ticket_id));
        assert_eq!(executor.journal().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_releases_claim() {
        let gateway = Arc::new(SimulatedGateway::instant());
        let executor = Executor::new(gateway.clone());
        let (request, pricing) = order();
        let ticket_id = Uuid::now_v7();

        gateway.set_fail_next(true);
        let result = executor.submit(ticket_id, &request, &pricing).await;
        assert!(result.unwrap_err().is_gateway_failure());
        assert!(executor.journal().is_empty());

        // Retry goes through
        assert!(executor.submit(ticket_id, &request, &pricing).await.is_ok());
    }

    struct MisroutingGateway;

    #[async_trait]
    impl OrderGateway for MisroutingGateway {
        async fn submit(
            &self,
            _ticket_id: TicketId,
            request: &OrderRequest,
            pricing: &PricingBreakdown,
        ) -> Result<OrderConfirmation, ExecError> {
            SimulatedGateway::instant().submit(Uuid::now_v7(), request, pricing).await
        }

        async fn health_check(&self) -> Result<(), ExecError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "misrouting"
        }
    }

    #[tokio::test]
    async fn test_mismatched_confirmation_rejected() {
        let executor = Executor::new(Arc::new(MisroutingGateway));
        let (request, pricing) = order();

        let result = executor.submit(Uuid::now_v7(), &request, &pricing).await;
        assert!(matches!(result, Err(ExecError::InvalidState(_))));
        assert!(executor.journal().is_empty());
    }
}
