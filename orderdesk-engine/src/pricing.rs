//! Order pricing.
//!
//! ```text
//! total_value    = effective_price × quantity
//! brokerage      = total_value × brokerage_rate
//! gst            = brokerage × gst_rate
//! stt            = total_value × stt_rate
//! estimated_cost = total_value + brokerage + gst + stt
//! ```
//!
//! The default rates are flat illustrative charges, not an exchange fee
//! schedule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use orderdesk_domain::{OrderRequest, PricingBreakdown};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Fee Schedule
// =============================================================================

/// Charge rates applied on top of the order value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    brokerage_rate: Decimal,
    gst_rate: Decimal,
    stt_rate: Decimal,
}

impl FeeSchedule {
    /// Brokerage: 0.03% of order value
    pub const DEFAULT_BROKERAGE_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 4);
    /// GST: 18% of brokerage
    pub const DEFAULT_GST_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);
    /// STT: 0.1% of order value
    pub const DEFAULT_STT_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

    /// Create a fee schedule with validation.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidFeeSchedule` if any rate is negative or
    /// not below 1 (100%).
    pub fn new(brokerage_rate: Decimal, gst_rate: Decimal, stt_rate: Decimal) -> EngineResult<Self> {
        for (name, rate) in [("brokerage", brokerage_rate), ("gst", gst_rate), ("stt", stt_rate)] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(EngineError::InvalidFeeSchedule(format!(
                    "{} rate must be in [0, 1), got {}",
                    name, rate
                )));
            }
        }

        Ok(Self {
            brokerage_rate,
            gst_rate,
            stt_rate,
        })
    }

    /// Brokerage as a fraction of order value
    pub fn brokerage_rate(&self) -> Decimal {
        self.brokerage_rate
    }

    /// GST as a fraction of brokerage
    pub fn gst_rate(&self) -> Decimal {
        self.gst_rate
    }

    /// STT as a fraction of order value
    pub fn stt_rate(&self) -> Decimal {
        self.stt_rate
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            brokerage_rate: Self::DEFAULT_BROKERAGE_RATE,
            gst_rate: Self::DEFAULT_GST_RATE,
            stt_rate: Self::DEFAULT_STT_RATE,
        }
    }
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Computes the cost breakdown of validated orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine {
    fees: FeeSchedule,
}

impl PricingEngine {
    /// Create a pricing engine with the given fee schedule.
    pub fn new(fees: FeeSchedule) -> Self {
        Self { fees }
    }

    /// Fee schedule in use.
    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Price an order. Pure; cannot fail for a validated request.
    pub fn compute(&self, request: &OrderRequest) -> PricingBreakdown {
        let total_value = self.total_value(request);
        let brokerage = total_value * self.fees.brokerage_rate;
        let gst = brokerage * self.fees.gst_rate;
        let stt = total_value * self.fees.stt_rate;

        debug!(
            symbol = %request.instrument().symbol,
            quantity = request.quantity().shares(),
            %total_value,
            %brokerage,
            %gst,
            %stt,
            "Order priced"
        );

        // Every component is a product of non-negative factors.
        PricingBreakdown::from_components(total_value, brokerage, gst, stt)
            .unwrap_or_else(|_| unreachable!("pricing components are non-negative"))
    }

    /// Gross order value at the effective unit price.
    pub fn total_value(&self, request: &OrderRequest) -> Decimal {
        request.effective_price().as_decimal() * request.quantity().as_decimal()
    }
}

// =============================================================================
// Tests
// =============================================================================
