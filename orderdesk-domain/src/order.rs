//! Order inputs and their validation
//!
//! Raw user selections arrive as an [`OrderDraft`] (or an [`OrderForm`] when
//! the instrument is still a ticker string). Validation collects every
//! violated rule at once and, on success, yields an [`OrderRequest`], which is
//! the only input the pricing engine accepts.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::instruments::{Instrument, InstrumentCatalog};
use crate::value_objects::{OrderType, Price, Quantity};

// =============================================================================
// Validation errors
// =============================================================================

/// Form field a validation error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    /// Instrument selection
    Instrument,
    /// Share quantity
    Quantity,
    /// Limit price input
    LimitPrice,
}

/// Machine-readable reason for a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    /// No instrument selected
    InstrumentRequired,
    /// Ticker is not in the catalog
    InstrumentUnknown,
    /// Quantity is not a positive integer
    QuantityInvalid,
    /// Limit order without a positive limit price
    LimitPriceInvalid,
}

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field
    pub field: OrderField,
    /// Reason code
    pub code: ValidationCode,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    fn new(field: OrderField, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

/// All rules an order draft violated, in field order.
///
/// Never empty when returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// The individual field errors.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any error carries the given code.
    pub fn has(&self, code: ValidationCode) -> bool {
        self.0.iter().any(|e| e.code == code)
    }

    /// Error for a specific field, if any.
    pub fn for_field(&self, field: OrderField) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// Number of violated rules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for errors produced by validation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// OrderDraft
// =============================================================================

/// Unvalidated order inputs as selected by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderDraft {
    /// Selected instrument, if any
    pub instrument: Option<Instrument>,
    /// Requested shares; may be zero or negative before validation
    pub quantity: i64,
    /// Market or limit
    pub order_type: OrderType,
    /// Limit price; only meaningful for limit orders
    pub limit_price: Option<Decimal>,
}

impl OrderDraft {
    /// Validate the draft, collecting every violated rule.
    ///
    /// A limit price supplied on a market order is dropped.
    ///
    /// # Errors
    /// Returns `ValidationErrors` listing all failures (never fail-fast).
    pub fn validate(&self) -> Result<OrderRequest, ValidationErrors> {
        let mut errors = Vec::new();

        if self.instrument.is_none() {
            errors.push(FieldError::new(
                OrderField::Instrument,
                ValidationCode::InstrumentRequired,
                "Please select a stock",
            ));
        }

        let quantity = Quantity::new(self.quantity).ok();
        if quantity.is_none() {
            errors.push(FieldError::new(
                OrderField::Quantity,
                ValidationCode::QuantityInvalid,
                "Quantity must be at least 1",
            ));
        }

        let limit_price = match self.order_type {
            OrderType::Market => None,
            OrderType::Limit => {
                let price = self
                    .limit_price
                    .and_then(|p| Price::new(p).ok())
                    .filter(|p| p.as_decimal() <= OrderRequest::MAX_ORDER_VALUE);
                if price.is_none() {
                    errors.push(FieldError::new(
                        OrderField::LimitPrice,
                        ValidationCode::LimitPriceInvalid,
                        "Please enter a valid limit price",
                    ));
                }
                price
            },
        };

        let (instrument, quantity) = match (&self.instrument, quantity) {
            (Some(instrument), Some(quantity)) if errors.is_empty() => (instrument, quantity),
            _ => return Err(ValidationErrors(errors)),
        };

        let request = OrderRequest {
            instrument: instrument.clone(),
            quantity,
            order_type: self.order_type,
            limit_price,
        };

        if !request.within_order_value_limit() {
            return Err(ValidationErrors(vec![FieldError::new(
                OrderField::Quantity,
                ValidationCode::QuantityInvalid,
                "Order value exceeds the maximum allowed",
            )]));
        }

        Ok(request)
    }
}

// =============================================================================
// OrderForm
// =============================================================================

/// Order inputs referencing the instrument by ticker.
///
/// This is the wire shape accepted by the API. Numeric fields accept JSON
/// numbers or strings; anything unparseable is kept as [`FieldInput::Malformed`]
/// and reported by validation alongside the other rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderForm {
    /// Ticker of the selected instrument
    #[serde(default)]
    pub symbol: Option<String>,
    /// Requested shares
    #[serde(default)]
    pub quantity: FieldInput<i64>,
    /// Market or limit
    #[serde(default)]
    pub order_type: OrderType,
    /// Limit price for limit orders
    #[serde(default)]
    pub limit_price: Option<FieldInput<Decimal>>,
}

impl OrderForm {
    /// Resolve the ticker against the catalog into a draft.
    ///
    /// A malformed quantity becomes 0 and a malformed limit price becomes
    /// absent, so both fail their rules.
    pub fn resolve(&self, catalog: &InstrumentCatalog) -> OrderDraft {
        OrderDraft {
            instrument: self.ticker().and_then(|t| catalog.find(t)).cloned(),
            quantity: self.quantity.parsed().unwrap_or(0),
            order_type: self.order_type,
            limit_price: self.limit_price.as_ref().and_then(FieldInput::parsed),
        }
    }

    /// Resolve and validate in one step.
    ///
    /// A ticker that is present but not listed reports `INSTRUMENT_UNKNOWN`
    /// instead of `INSTRUMENT_REQUIRED`.
    ///
    /// # Errors
    /// Returns `ValidationErrors` listing all failures.
    pub fn validate(&self, catalog: &InstrumentCatalog) -> Result<OrderRequest, ValidationErrors> {
        let ticker = self.ticker();
        self.resolve(catalog).validate().map_err(|mut errors| {
            for error in errors.0.iter_mut() {
                match (error.code, ticker, &self.quantity) {
                    (ValidationCode::InstrumentRequired, Some(ticker), _) => {
                        error.code = ValidationCode::InstrumentUnknown;
                        error.message = format!("Unknown stock: {}", ticker.trim());
                    },
                    (ValidationCode::QuantityInvalid, _, FieldInput::Malformed(_)) => {
                        error.message = "Quantity must be a whole number".to_string();
                    },
                    _ => {},
                }
            }
            errors
        })
    }

    fn ticker(&self) -> Option<&str> {
        self.symbol.as_deref().filter(|s| !s.trim().is_empty())
    }
}

// =============================================================================
// FieldInput
// =============================================================================

/// A numeric form input that either parsed or was rejected as malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput<T> {
    /// Parsed value
    Parsed(T),
    /// Raw input that could not be parsed
    Malformed(String),
}

impl<T: Copy> FieldInput<T> {
    /// The parsed value, if any
    pub fn parsed(&self) -> Option<T> {
        match self {
            FieldInput::Parsed(value) => Some(*value),
            FieldInput::Malformed(_) => None,
        }
    }
}

impl<T: Default> Default for FieldInput<T> {
    fn default() -> Self {
        FieldInput::Parsed(T::default())
    }
}

impl<T> From<T> for FieldInput<T> {
    fn from(value: T) -> Self {
        FieldInput::Parsed(value)
    }
}

/// Lenient parsing of a raw JSON form value.
pub trait FormValue: Sized {
    /// Parse a JSON number or numeric string.
    fn from_form_value(raw: &Value) -> Option<Self>;
}

impl FormValue for i64 {
    fn from_form_value(raw: &Value) -> Option<Self> {
        match raw {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FormValue for Decimal {
    fn from_form_value(raw: &Value) -> Option<Self> {
        match raw {
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }
}

impl<'de, T: FormValue> Deserialize<'de> for FieldInput<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(match T::from_form_value(&raw) {
            Some(value) => FieldInput::Parsed(value),
            None => FieldInput::Malformed(raw.to_string()),
        })
    }
}

impl<T: Serialize> Serialize for FieldInput<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldInput::Parsed(value) => value.serialize(serializer),
            FieldInput::Malformed(raw) => serializer.serialize_str(raw),
        }
    }
}

// =============================================================================
// OrderRequest
// =============================================================================

/// A validated order.
///
/// Can only be obtained through [`OrderDraft::validate`], so quantity >= 1 and
/// limit orders always carry a positive limit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    instrument: Instrument,
    quantity: Quantity,
    order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_price: Option<Price>,
}

impl OrderRequest {
    /// Largest accepted order value (₹1,00,000 crore). Keeps every fee and
    /// projection product well inside `Decimal` range.
    pub const MAX_ORDER_VALUE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

    /// The instrument snapshot this order was priced against
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Number of shares
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Market or limit
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Limit price (limit orders only)
    pub fn limit_price(&self) -> Option<Price> {
        self.limit_price
    }

    /// Unit price used for pricing: the limit price for limit orders,
    /// otherwise the instrument's current price.
    pub fn effective_price(&self) -> Price {
        match (self.order_type, self.limit_price) {
            (OrderType::Limit, Some(limit)) => limit,
            _ => self.instrument.current_price,
        }
    }

    fn within_order_value_limit(&self) -> bool {
        self.effective_price()
            .as_decimal()
            .checked_mul(self.quantity.as_decimal())
            .map_or(false, |value| value <= Self::MAX_ORDER_VALUE)
    }
}
