//! Value Objects for the Order Desk Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Price must be positive
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity must be a positive whole number
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Symbol must be a valid ticker
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Account balance cannot be negative
    #[error("Invalid balance: {0}")]
    InvalidBalance(String),

    /// Order inputs failed validation
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Invalid state transition
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

// =============================================================================
// Price
// =============================================================================

/// Price represents a positive decimal price in rupees
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Price(pub(crate) Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice("Price must be positive".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// Quantity represents a whole number of shares
///
/// # Invariants
/// - Must be >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64")]
pub struct Quantity(u64);

impl Quantity {
    /// Create a new Quantity with validation
    ///
    /// Accepts a signed value because form input can be zero or negative.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if value < 1
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 1 {
            return Err(DomainError::InvalidQuantity(
                "Quantity must be at least 1".to_string(),
            ));
        }
        Ok(Self(value as u64))
    }

    /// Get the number of shares
    pub fn shares(&self) -> u64 {
        self.0
    }

    /// Get the quantity as a Decimal for arithmetic
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Symbol
// =============================================================================

/// Symbol represents an exchange ticker (e.g., RELIANCE, TCS)
///
/// # Invariants
/// - Non-empty
/// - ASCII uppercase letters, digits, `&` or `-` only
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(pub(crate) String);

impl Symbol {
    /// Create a Symbol from a ticker string
    ///
    /// Input is trimmed and upper-cased before validation.
    ///
    /// # Examples
    /// ```
    /// # use orderdesk_domain::value_objects::Symbol;
    /// let symbol = Symbol::new("reliance").unwrap();
    /// assert_eq!(symbol.as_str(), "RELIANCE");
    /// ```
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSymbol` if the ticker is empty or malformed
    pub fn new(ticker: &str) -> Result<Self, DomainError> {
        let ticker = ticker.trim().to_ascii_uppercase();

        if ticker.is_empty() {
            return Err(DomainError::InvalidSymbol("Symbol must be non-empty".to_string()));
        }

        if !ticker
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '&' || c == '-')
        {
            return Err(DomainError::InvalidSymbol(format!("Malformed ticker: {}", ticker)));
        }

        Ok(Self(ticker))
    }

    /// Get the ticker as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// OrderType
// =============================================================================

/// How the order is priced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Executed at the instrument's current price
    #[default]
    #[serde(alias = "market")]
    Market,
    /// Executed at a user-chosen price
    #[serde(alias = "limit")]
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
        }
    }
}

// =============================================================================
// AccountBalance
// =============================================================================

/// Funds available for new orders
///
/// # Invariants
/// - Must be >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    available: Decimal,
}

impl AccountBalance {
    /// Create a new AccountBalance with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidBalance` if available < 0
    pub fn new(available: Decimal) -> Result<Self, DomainError> {
        if available < Decimal::ZERO {
            return Err(DomainError::InvalidBalance(
                "Available balance cannot be negative".to_string(),
            ));
        }
        Ok(Self { available })
    }

    /// Get the available funds
    pub fn available(&self) -> Decimal {
        self.available
    }
}

impl fmt::Display for AccountBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.available.round_dp(2))
    }
}

// =============================================================================
// Tests
// =============================================================================
