//! Trade scenario simulator
//!
//! What-if arithmetic for a position between a stop loss and a target.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use orderdesk_domain::{Price, Quantity};

use crate::analysis::Ratio;
use crate::error::{EngineError, EngineResult};

/// Outcome of a simulated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TradeScenario {
    /// Entry price
    pub current_price: Price,
    /// Exit price on success
    pub target_price: Price,
    /// Exit price on failure
    pub stop_loss: Price,
    /// Shares (>= 1)
    pub quantity: Quantity,
    /// current_price × quantity
    pub investment: Decimal,
    /// (target - current) × quantity
    pub potential_profit: Decimal,
    /// (current - stop) × quantity
    pub potential_loss: Decimal,
    /// (target - current) / current × 100
    pub profit_percent: Decimal,
    /// (current - stop) / current × 100
    pub loss_percent: Decimal,
    /// |potential_profit / potential_loss|
    pub risk_reward_ratio: Ratio,
}

/// Simulation request as accepted over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    /// Entry price
    pub current_price: Decimal,
    /// Target price
    pub target_price: Decimal,
    /// Stop loss
    pub stop_loss: Decimal,
    /// Shares; values below 1 are clamped
    #[serde(default = "ScenarioRequest::default_quantity")]
    pub quantity: i64,
    /// Size the position from a rupee amount instead of `quantity`
    #[serde(default)]
    pub investment_amount: Option<Decimal>,
}

impl ScenarioRequest {
    fn default_quantity() -> i64 {
        10
    }

    /// Run the simulation.
    ///
    /// # Errors
    /// Returns an error if any price is not positive or the position is
    /// too large to represent.
    pub fn run(&self) -> EngineResult<TradeScenario> {
        let simulator = TradeScenarioSimulator::new(self.current_price, self.target_price, self.stop_loss)?;
        match self.investment_amount {
            Some(amount) => {
                let quantity = simulator.quantity_for_investment(amount)?;
                simulator.simulate(quantity)
            },
            None => simulator.simulate_shares(self.quantity),
        }
    }
}

/// Scenario calculator for one instrument's price levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeScenarioSimulator {
    current_price: Price,
    target_price: Price,
    stop_loss: Price,
}

impl TradeScenarioSimulator {
    /// Create a simulator.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidScenario` if any price is not positive.
    pub fn new(current_price: Decimal, target_price: Decimal, stop_loss: Decimal) -> EngineResult<Self> {
        let price = |name: &str, value: Decimal| {
            Price::new(value)
                .map_err(|_| EngineError::InvalidScenario(format!("{} must be positive, got {}", name, value)))
        };

        Ok(Self {
            current_price: price("current_price", current_price)?,
            target_price: price("target_price", target_price)?,
            stop_loss: price("stop_loss", stop_loss)?,
        })
    }

    /// Simulate with a raw share count; values below 1 are clamped to 1.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidScenario` if the position overflows.
    pub fn simulate_shares(&self, shares: i64) -> EngineResult<TradeScenario> {
        let quantity = Quantity::new(shares.max(1)).unwrap_or_else(|_| unreachable!("clamped to >= 1"));
        self.simulate(quantity)
    }

    /// Simulate a position of `quantity` shares.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidScenario` if the position overflows.
    pub fn simulate(&self, quantity: Quantity) -> EngineResult<TradeScenario> {
        let current = self.current_price.as_decimal();
        let target = self.target_price.as_decimal();
        let stop = self.stop_loss.as_decimal();
        let shares = quantity.as_decimal();

        let times = |a: Decimal, b: Decimal| a.checked_mul(b).ok_or_else(|| Self::overflow(quantity));
        let percent_of_current = |delta: Decimal| {
            delta
                .checked_div(current)
                .and_then(|r| r.checked_mul(dec!(100)))
                .ok_or_else(|| Self::overflow(quantity))
        };

        let potential_profit = times(target - current, shares)?;
        let potential_loss = times(current - stop, shares)?;

        Ok(TradeScenario {
            current_price: self.current_price,
            target_price: self.target_price,
            stop_loss: self.stop_loss,
            quantity,
            investment: times(current, shares)?,
            potential_profit,
            potential_loss,
            profit_percent: percent_of_current(target - current)?,
            loss_percent: percent_of_current(current - stop)?,
            risk_reward_ratio: Ratio::of(potential_profit, potential_loss).map(|r| r.abs()),
        })
    }

    fn overflow(quantity: Quantity) -> EngineError {
        EngineError::InvalidScenario(format!("Position of {} shares is out of range", quantity))
    }

    /// Whole shares a rupee amount buys. The amount is raised to at least
    /// one share's price, so the result is always >= 1.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidScenario` if the share count overflows.
    pub fn quantity_for_investment(&self, amount: Decimal) -> EngineResult<Quantity> {
        let current = self.current_price.as_decimal();
        let amount = amount.max(current);
        let shares = amount
            .checked_div(current)
            .and_then(|n| n.floor().to_i64())
            .ok_or_else(|| EngineError::InvalidScenario(format!("Investment amount too large: {}", amount)))?;
        Ok(Quantity::new(shares)?)
    }
}

/// Convenience wrapper over [`TradeScenarioSimulator`].
///
/// # Errors
/// Returns `EngineError::InvalidScenario` if any price is not positive or the
/// position overflows.
pub fn simulate(
    current_price: Decimal,
    target_price: Decimal,
    stop_loss: Decimal,
    quantity: i64,
) -> EngineResult<TradeScenario> {
    TradeScenarioSimulator::new(current_price, target_price, stop_loss)?.simulate_shares(quantity)
}
