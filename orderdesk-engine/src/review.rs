//! Order review: validation, pricing and the balance check in one pass.

use serde::Serialize;
use tracing::{debug, warn};

use orderdesk_domain::{
    AccountBalance, InstrumentCatalog, OrderDraft, OrderForm, OrderRequest, PricingBreakdown,
    ValidationErrors,
};

use crate::balance::{Affordability, BalanceValidator};
use crate::pricing::{FeeSchedule, PricingEngine};

/// A validated, priced order and whether the account can cover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReview {
    /// Validated inputs
    pub request: OrderRequest,
    /// Cost breakdown
    pub pricing: PricingBreakdown,
    /// Balance check outcome
    pub affordability: Affordability,
}

impl OrderReview {
    /// Whether the order may be placed
    pub fn is_affordable(&self) -> bool {
        self.affordability.is_affordable()
    }
}

/// Stateless order review pipeline.
///
/// Pricing is never computed for a draft that fails validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    pricing: PricingEngine,
}

impl Engine {
    /// Create an engine with the given fee schedule.
    pub fn new(fees: FeeSchedule) -> Self {
        Self {
            pricing: PricingEngine::new(fees),
        }
    }

    /// The pricing engine in use.
    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    /// Price a validated request.
    pub fn estimate(&self, request: &OrderRequest) -> PricingBreakdown {
        self.pricing.compute(request)
    }

    /// Price a validated request and check it against the balance.
    pub fn review_request(&self, request: OrderRequest, balance: &AccountBalance) -> OrderReview {
        let pricing = self.pricing.compute(&request);
        let affordability = BalanceValidator::validate(&pricing, balance);

        if let Affordability::InsufficientFunds { shortfall, .. } = affordability {
            warn!(
                symbol = %request.instrument().symbol,
                estimated_cost = %pricing.estimated_cost(),
                %shortfall,
                "Order exceeds available balance"
            );
        } else {
            debug!(
                symbol = %request.instrument().symbol,
                estimated_cost = %pricing.estimated_cost(),
                "Order affordable"
            );
        }

        OrderReview {
            request,
            pricing,
            affordability,
        }
    }

    /// Validate, price and balance-check a draft.
    ///
    /// # Errors
    /// Returns every violated validation rule; nothing is priced in that case.
    pub fn review(&self, draft: &OrderDraft, balance: &AccountBalance) -> Result<OrderReview, ValidationErrors> {
        let request = draft.validate()?;
        Ok(self.review_request(request, balance))
    }

    /// Like [`Engine::review`], resolving the ticker against `catalog`.
    ///
    /// # Errors
    /// Returns every violated validation rule, including unknown tickers.
    pub fn review_form(
        &self,
        form: &OrderForm,
        catalog: &InstrumentCatalog,
        balance: &AccountBalance,
    ) -> Result<OrderReview, ValidationErrors> {
        let request = form.validate(catalog)?;
        Ok(self.review_request(request, balance))
    }
}
