//! Trading Session: session-scoped state behind the API.
//!
//! The session owns the watchlist, the account balance, the fee schedule,
//! the analysis generator and every ticket opened since the daemon started.
//! Nothing is persisted.
//!
//! # Confirmation flow
//!
//! ```text
//! place_order → REVIEWING ─proceed→ CONFIRMING ─confirm_order→ PROCESSING → SUBMITTED
//!                    └──────cancel──────┴→ CANCELLED
//! ```
//!
//! `confirm_order` releases the session lock while the gateway works, so
//! other requests are served during the processing delay.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use orderdesk_domain::{
    AccountBalance, InstrumentCatalog, OrderForm, OrderRequest, OrderTicket, PricingBreakdown, Quote,
    TicketId,
};
use orderdesk_engine::{
    Affordability, Engine, OrderReview, PreTradeAnalysis, PreTradeAnalysisGenerator, ScenarioRequest,
    SeededSignalSource, SignalSource, TradeScenario,
};
use orderdesk_exec::Executor;

use crate::config::SessionConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::event_bus::{DaemonEvent, EventBus};

// =============================================================================
// Trading Session
// =============================================================================

/// In-memory trading session.
pub struct TradingSession {
    /// Tradable instruments
    catalog: InstrumentCatalog,
    /// Funds available for orders (read-only)
    balance: AccountBalance,
    /// Pricing and balance checks
    engine: Engine,
    /// Mock analysis source
    analysis: PreTradeAnalysisGenerator<Box<dyn SignalSource>>,
    /// Tickets by id; UUID v7 keys keep creation order
    tickets: BTreeMap<TicketId, OrderTicket>,
    /// Order executor
    executor: Arc<Executor>,
    /// Event bus for publishing events
    event_bus: Arc<EventBus>,
}

/// Order handed to the gateway while the session lock is released.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    /// Ticket in PROCESSING
    pub ticket_id: TicketId,
    /// Order copy
    pub request: OrderRequest,
    /// Pricing copy
    pub pricing: PricingBreakdown,
}

impl TradingSession {
    /// Create a session trading the NSE watchlist.
    pub fn new(config: &SessionConfig, executor: Arc<Executor>, event_bus: Arc<EventBus>) -> DaemonResult<Self> {
        let signals: Box<dyn SignalSource> = Box::new(SeededSignalSource::from_seed_option(config.analysis_seed));

        Ok(Self {
            catalog: InstrumentCatalog::nse_watchlist(),
            balance: AccountBalance::new(config.account_balance)?,
            engine: Engine::new(config.fees),
            analysis: PreTradeAnalysisGenerator::new(signals),
            tickets: BTreeMap::new(),
            executor,
            event_bus,
        })
    }

    /// Replace the analysis signal source.
    pub fn with_signal_source(mut self, signals: Box<dyn SignalSource>) -> Self {
        self.analysis = PreTradeAnalysisGenerator::new(signals);
        self
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Watchlist quotes in listing order.
    pub fn instruments(&self) -> &[Quote] {
        self.catalog.quotes()
    }

    /// Available balance.
    pub fn balance(&self) -> AccountBalance {
        self.balance
    }

    /// Shared executor.
    pub fn executor(&self) -> Arc<Executor> {
        self.executor.clone()
    }

    /// A ticket by id.
    pub fn ticket(&self, id: TicketId) -> DaemonResult<&OrderTicket> {
        self.tickets.get(&id).ok_or(DaemonError::TicketNotFound(id))
    }

    /// All tickets, oldest first.
    pub fn tickets(&self) -> impl Iterator<Item = &OrderTicket> {
        self.tickets.values()
    }

    /// Number of tickets opened.
    pub fn ticket_count(&self) -> usize {
        self.tickets.len()
    }

    // -------------------------------------------------------------------------
    // Pricing & analysis
    // -------------------------------------------------------------------------

    /// Validate, price and balance-check an order without opening a ticket.
    pub fn estimate(&self, form: &OrderForm) -> DaemonResult<OrderReview> {
        Ok(self.engine.review_form(form, &self.catalog, &self.balance)?)
    }

    /// Price an order and generate a pre-trade analysis for it.
    pub fn analyze(&mut self, form: &OrderForm) -> DaemonResult<(PricingBreakdown, PreTradeAnalysis)> {
        let request = form.validate(&self.catalog)?;
        let pricing = self.engine.estimate(&request);
        let analysis = self.analysis.generate(&request, &pricing);
        Ok((pricing, analysis))
    }

    /// Run a target/stop scenario.
    pub fn simulate(&self, scenario: &ScenarioRequest) -> DaemonResult<TradeScenario> {
        Ok(scenario.run()?)
    }

    // -------------------------------------------------------------------------
    // Ticket lifecycle
    // -------------------------------------------------------------------------

    /// Validate, price and balance-check an order, then open a ticket in
    /// REVIEWING.
    ///
    /// # Errors
    ///
    /// - `Validation` if any input rule fails
    /// - `InsufficientFunds` if the estimated cost exceeds the balance
    pub fn place_order(&mut self, form: &OrderForm) -> DaemonResult<OrderTicket> {
        let review = self.estimate(form).map_err(|e| {
            warn!(error = %e, "Order rejected");
            e
        })?;

        if let Affordability::InsufficientFunds { shortfall, .. } = review.affordability {
            warn!(
                symbol = %review.request.instrument().symbol,
                estimated_cost = %review.pricing.estimated_cost(),
                %shortfall,
                "Order rejected: insufficient funds"
            );
            return Err(DaemonError::InsufficientFunds {
                estimated_cost: review.pricing.estimated_cost(),
                available: self.balance.available(),
                shortfall,
            });
        }

        let ticket = OrderTicket::open(review.request, review.pricing);
        let ticket_id = ticket.id;
        let symbol = ticket.request.instrument().symbol.clone();
        let estimated_cost = ticket.pricing.estimated_cost();

        info!(
            %ticket_id,
            %symbol,
            quantity = ticket.request.quantity().shares(),
            order_type = %ticket.request.order_type(),
            %estimated_cost,
            "Ticket opened"
        );

        self.tickets.insert(ticket_id, ticket.clone());
        self.event_bus.send(DaemonEvent::TicketOpened {
            ticket_id,
            symbol,
            estimated_cost,
            timestamp: Utc::now(),
        });

        Ok(ticket)
    }

    /// REVIEWING → CONFIRMING
    pub fn proceed(&mut self, id: TicketId) -> DaemonResult<OrderTicket> {
        self.transition(id, OrderTicket::proceed)
    }

    /// REVIEWING | CONFIRMING → CANCELLED
    pub fn cancel(&mut self, id: TicketId) -> DaemonResult<OrderTicket> {
        self.transition(id, OrderTicket::cancel)
    }

    /// CONFIRMING → PROCESSING; returns the copy to submit.
    pub fn begin_submission(&mut self, id: TicketId) -> DaemonResult<PendingSubmission> {
        let ticket = self.transition(id, OrderTicket::begin_submission)?;
        Ok(PendingSubmission {
            ticket_id: ticket.id,
            request: ticket.request,
            pricing: ticket.pricing,
        })
    }

    /// Apply the gateway outcome: PROCESSING → SUBMITTED, or back to
    /// CONFIRMING on failure (the gateway error is returned).
    pub fn finish_submission(
        &mut self,
        id: TicketId,
        outcome: Result<orderdesk_domain::OrderConfirmation, orderdesk_exec::ExecError>,
    ) -> DaemonResult<OrderTicket> {
        match outcome {
            Ok(confirmation) => {
                let ticket = self.transition(id, |t| t.complete_submission(confirmation.clone()))?;
                self.event_bus.send(DaemonEvent::OrderSubmitted(confirmation));
                Ok(ticket)
            },
            Err(e) => {
                error!(ticket_id = %id, error = %e, "Gateway refused order");
                self.transition(id, OrderTicket::fail_submission)?;
                Err(e.into())
            },
        }
    }

    fn transition<F>(&mut self, id: TicketId, apply: F) -> DaemonResult<OrderTicket>
    where
        F: FnOnce(&mut OrderTicket) -> Result<(), orderdesk_domain::DomainError>,
    {
        let ticket = self.tickets.get_mut(&id).ok_or(DaemonError::TicketNotFound(id))?;
        let previous_state = ticket.state.name();

        apply(&mut *ticket).map_err(|e| {
            warn!(ticket_id = %id, state = previous_state, error = %e, "Transition rejected");
            e
        })?;

        let new_state = ticket.state.name();
        info!(
            ticket_id = %id,
            symbol = %ticket.request.instrument().symbol,
            %previous_state,
            %new_state,
            "Ticket state changed"
        );

        let snapshot = ticket.clone();
        self.event_bus.send(DaemonEvent::TicketStateChanged {
            ticket_id: id,
            previous_state: previous_state.to_string(),
            new_state: new_state.to_string(),
            timestamp: snapshot.updated_at,
        });

        Ok(snapshot)
    }
}

/// CONFIRMING → PROCESSING → SUBMITTED through the gateway.
///
/// The write lock is held only for the two state transitions, never across
/// the gateway call.
pub async fn confirm_order(session: &RwLock<TradingSession>, id: TicketId) -> DaemonResult<OrderTicket> {
    let (pending, executor) = {
        let mut session = session.write().await;
        let pending = session.begin_submission(id)?;
        (pending, session.executor())
    };

    let outcome = executor
        .submit(pending.ticket_id, &pending.request, &pending.pricing)
        .await;

    let mut session = session.write().await;
    session.finish_submission(id, outcome)
}

// =============================================================================
// Tests
// =============================================================================
