//! Order Desk Engine Layer
//!
//! Pure computations over validated orders: pricing, the balance check,
//! pre-trade analysis and scenario simulation. No I/O.
//!
//! Randomness is confined to [`analysis::SignalSource`], so everything else
//! here is deterministic.

#![warn(clippy::all)]

pub mod analysis;
pub mod balance;
pub mod error;
pub mod pricing;
pub mod review;
pub mod simulator;

pub use analysis::{
    AnalysisMetric, MetricStatus, PreTradeAnalysis, PreTradeAnalysisGenerator, Ratio, Recommendation,
    ReplaySignalSource, SeededSignalSource, SignalSource,
};
pub use balance::{Affordability, BalanceValidator};
pub use error::{EngineError, EngineResult};
pub use pricing::{FeeSchedule, PricingEngine};
pub use review::{Engine, OrderReview};
pub use simulator::{simulate, ScenarioRequest, TradeScenario, TradeScenarioSimulator};
