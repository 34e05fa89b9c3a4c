//! Balance Validator
//!
//! Decides whether the account can cover an order's estimated cost.
//! Equality is affordable.

use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::debug;

use orderdesk_domain::{AccountBalance, PricingBreakdown};

/// Outcome of a balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordability {
    /// Funds cover the order
    Affordable {
        /// Balance left after the order (>= 0)
        remaining_balance: Decimal,
    },
    /// Estimated cost exceeds available funds
    InsufficientFunds {
        /// estimated_cost - available (> 0)
        shortfall: Decimal,
        /// Balance left after the order (< 0)
        remaining_balance: Decimal,
    },
}

impl Affordability {
    /// Whether the order can be placed
    pub fn is_affordable(&self) -> bool {
        matches!(self, Affordability::Affordable { .. })
    }

    /// Missing funds, if any
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            Affordability::Affordable { .. } => None,
            Affordability::InsufficientFunds { shortfall, .. } => Some(*shortfall),
        }
    }

    /// available - estimated_cost; negative when unaffordable
    pub fn remaining_balance(&self) -> Decimal {
        match self {
            Affordability::Affordable { remaining_balance }
            | Affordability::InsufficientFunds { remaining_balance, .. } => *remaining_balance,
        }
    }
}

// Wire shape: {"ok": true, ...} | {"ok": false, "reason": "INSUFFICIENT_FUNDS", "shortfall": ...}
impl Serialize for Affordability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Affordability::Affordable { remaining_balance } => {
                let mut state = serializer.serialize_struct("Affordability", 2)?;
                state.serialize_field("ok", &true)?;
                state.serialize_field("remaining_balance", remaining_balance)?;
                state.end()
            },
            Affordability::InsufficientFunds {
                shortfall,
                remaining_balance,
            } => {
                let mut state = serializer.serialize_struct("Affordability", 4)?;
                state.serialize_field("ok", &false)?;
                state.serialize_field("reason", "INSUFFICIENT_FUNDS")?;
                state.serialize_field("shortfall", shortfall)?;
                state.serialize_field("remaining_balance", remaining_balance)?;
                state.end()
            },
        }
    }
}

/// Checks priced orders against the available balance.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceValidator;

impl BalanceValidator {
    /// Compare the estimated cost with available funds.
    pub fn validate(pricing: &PricingBreakdown, balance: &AccountBalance) -> Affordability {
        let estimated_cost = pricing.estimated_cost();
        let available = balance.available();
        let remaining_balance = available - estimated_cost;

        if estimated_cost > available {
            let shortfall = estimated_cost - available;
            debug!(%estimated_cost, %available, %shortfall, "Insufficient funds");
            Affordability::InsufficientFunds {
                shortfall,
                remaining_balance,
            }
        } else {
            Affordability::Affordable { remaining_balance }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pricing_with_cost(estimated_cost: Decimal) -> PricingBreakdown {
        PricingBreakdown::from_components(estimated_cost, dec!(0), dec!(0), dec!(0)).unwrap()
    }

    #[test]
    fn test_shortfall_is_exact() {
        let pricing = pricing_with_cost(dec!(123004));
        let balance = AccountBalance::new(dec!(100000)).unwrap();

        let result = BalanceValidator::validate(&pricing, &balance);
        assert!(!result.is_affordable());
        assert_eq!(result.shortfall(), Some(dec!(23004.00)));
        assert_eq!(result.remaining_balance(), dec!(-23004));
    }

    #[test]
    fn test_equal_balance_is_affordable() {
        let pricing = pricing_with_cost(dec!(5000.50));
        let balance = AccountBalance::new(dec!(5000.50)).unwrap();

        let result = BalanceValidator::validate(&pricing, &balance);
        assert!(result.is_affordable());
        assert_eq!(result.remaining_balance(), dec!(0));
        assert_eq!(result.shortfall(), None);
    }

    #[test]
    fn test_one_paisa_over_is_unaffordable() {
        let pricing = pricing_with_cost(dec!(5000.51));
        let balance = AccountBalance::new(dec!(5000.50)).unwrap();

        let result = BalanceValidator::validate(&pricing, &balance);
        assert_eq!(result.shortfall(), Some(dec!(0.01)));
    }

    #[test]
    fn test_serialization() {
        let balance = AccountBalance::new(dec!(100000)).unwrap();

        let ok = BalanceValidator::validate(&pricing_with_cost(dec!(40000)), &balance);
        let json = serde_json::to_value(ok).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["remaining_balance"], "60000");
        assert!(json.get("reason").is_none());

        let short = BalanceValidator::validate(&pricing_with_cost(dec!(123004)), &balance);
        let json = serde_json::to_value(short).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["reason"], "INSUFFICIENT_FUNDS");
        assert_eq!(json["shortfall"], "23004");
    }
}
