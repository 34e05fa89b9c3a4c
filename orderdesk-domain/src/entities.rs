//! Domain Entities for the Order Desk
//!
//! Order tickets with their confirmation lifecycle, plus the pricing and
//! confirmation records attached to them.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::order::OrderRequest;
use crate::value_objects::{DomainError, OrderType, Price, Quantity, Symbol};

/// Unique identifier for an order ticket
pub type TicketId = Uuid;

/// Round a rupee amount for display (2dp, half away from zero).
pub fn round_rupees(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Pricing Breakdown
// =============================================================================

/// Cost breakdown of an order.
///
/// # Invariants
/// - All components >= 0
/// - `estimated_cost == total_value + brokerage + gst + stt`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingBreakdown {
    total_value: Decimal,
    brokerage: Decimal,
    gst: Decimal,
    stt: Decimal,
    estimated_cost: Decimal,
}

impl PricingBreakdown {
    /// Build a breakdown from its components; the estimated cost is derived.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if any component is negative or
    /// the sum overflows
    pub fn from_components(
        total_value: Decimal,
        brokerage: Decimal,
        gst: Decimal,
        stt: Decimal,
    ) -> Result<Self, DomainError> {
        if [total_value, brokerage, gst, stt].iter().any(|v| *v < Decimal::ZERO) {
            return Err(DomainError::InvalidPrice(
                "Pricing components cannot be negative".to_string(),
            ));
        }

        let estimated_cost = [brokerage, gst, stt]
            .iter()
            .try_fold(total_value, |sum, part| sum.checked_add(*part))
            .ok_or_else(|| DomainError::InvalidPrice("Estimated cost is out of range".to_string()))?;

        Ok(Self {
            total_value,
            brokerage,
            gst,
            stt,
            estimated_cost,
        })
    }

    /// Gross value of the shares
    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    /// Brokerage fee
    pub fn brokerage(&self) -> Decimal {
        self.brokerage
    }

    /// GST charged on brokerage
    pub fn gst(&self) -> Decimal {
        self.gst
    }

    /// Securities transaction tax
    pub fn stt(&self) -> Decimal {
        self.stt
    }

    /// Total cash required
    pub fn estimated_cost(&self) -> Decimal {
        self.estimated_cost
    }

    /// Charges and taxes on top of the gross value
    pub fn charges(&self) -> Decimal {
        self.estimated_cost - self.total_value
    }
}

// =============================================================================
// Order Confirmation
// =============================================================================

/// Receipt for a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    /// Ticket the order was placed from
    pub order_id: TicketId,
    /// Identifier assigned by the execution venue
    pub exchange_order_id: String,
    /// Instrument traded
    pub symbol: Symbol,
    /// Shares
    pub quantity: Quantity,
    /// Market or limit
    pub order_type: OrderType,
    /// Unit price the order executed at
    pub executed_price: Price,
    /// Cash debited including charges
    pub estimated_cost: Decimal,
    /// When the venue accepted the order
    pub submitted_at: DateTime<Utc>,
}

// =============================================================================
// Ticket State Machine
// =============================================================================

/// Confirmation lifecycle of an order ticket.
///
/// ```text
/// Reviewing ──proceed──▶ Confirming ──begin──▶ Processing ──complete──▶ Submitted
///     │                     │  ▲                   │
///     └──cancel──▶ Cancelled ◀─┘  └──────fail──────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    /// First dialog step: user reviews the order details
    Reviewing,
    /// Second dialog step: final verification before execution
    Confirming,
    /// Submission in flight; cannot be cancelled
    Processing,
    /// Order accepted by the venue
    Submitted {
        /// Venue receipt
        confirmation: OrderConfirmation,
    },
    /// User abandoned the order
    Cancelled {
        /// When the ticket was cancelled
        cancelled_at: DateTime<Utc>,
    },
}

impl TicketState {
    /// Get the name of the state for display
    pub fn name(&self) -> &'static str {
        match self {
            TicketState::Reviewing => "REVIEWING",
            TicketState::Confirming => "CONFIRMING",
            TicketState::Processing => "PROCESSING",
            TicketState::Submitted { .. } => "SUBMITTED",
            TicketState::Cancelled { .. } => "CANCELLED",
        }
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketState::Submitted { .. } | TicketState::Cancelled { .. })
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Order Ticket
// =============================================================================

/// A priced order moving through the two-step confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTicket {
    /// Ticket identifier (UUID v7)
    pub id: TicketId,
    /// Validated order inputs
    pub request: OrderRequest,
    /// Pricing at the time the ticket was opened
    pub pricing: PricingBreakdown,
    /// Confirmation state
    pub state: TicketState,
    /// Audit
    pub created_at: DateTime<Utc>,
    /// Audit
    pub updated_at: DateTime<Utc>,
}

impl OrderTicket {
    /// Open a new ticket in the Reviewing state
    pub fn open(request: OrderRequest, pricing: PricingBreakdown) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            request,
            pricing,
            state: TicketState::Reviewing,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reviewing → Confirming
    pub fn proceed(&mut self) -> Result<(), DomainError> {
        match self.state {
            TicketState::Reviewing => self.transition(TicketState::Confirming),
            _ => Err(self.rejected("proceed")),
        }
    }

    /// Confirming → Processing
    pub fn begin_submission(&mut self) -> Result<(), DomainError> {
        match self.state {
            TicketState::Confirming => self.transition(TicketState::Processing),
            _ => Err(self.rejected("submit")),
        }
    }

    /// Processing → Submitted
    pub fn complete_submission(&mut self, confirmation: OrderConfirmation) -> Result<(), DomainError> {
        if confirmation.order_id != self.id {
            return Err(DomainError::InvalidStateTransition(format!(
                "Confirmation {} does not belong to ticket {}",
                confirmation.order_id, self.id
            )));
        }

        match self.state {
            TicketState::Processing => self.transition(TicketState::Submitted { confirmation }),
            _ => Err(self.rejected("complete submission of")),
        }
    }

    /// Processing → Confirming, after the venue refused the order
    pub fn fail_submission(&mut self) -> Result<(), DomainError> {
        match self.state {
            TicketState::Processing => self.transition(TicketState::Confirming),
            _ => Err(self.rejected("fail submission of")),
        }
    }

    /// Reviewing | Confirming → Cancelled
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        match self.state {
            TicketState::Reviewing | TicketState::Confirming => {
                self.transition(TicketState::Cancelled { cancelled_at: Utc::now() })
            },
            _ => Err(self.rejected("cancel")),
        }
    }

    /// Whether the ticket can still be cancelled
    pub fn can_cancel(&self) -> bool {
        matches!(self.state, TicketState::Reviewing | TicketState::Confirming)
    }

    /// Venue receipt, once submitted
    pub fn confirmation(&self) -> Option<&OrderConfirmation> {
        match &self.state {
            TicketState::Submitted { confirmation } => Some(confirmation),
            _ => None,
        }
    }

    fn transition(&mut self, next: TicketState) -> Result<(), DomainError> {
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn rejected(&self, action: &str) -> DomainError {
        DomainError::InvalidStateTransition(format!(
            "Cannot {} ticket {} in state {}",
            action, self.id, self.state
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================
