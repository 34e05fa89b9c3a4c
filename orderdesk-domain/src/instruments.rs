//! Instruments and the tradable watchlist
//!
//! An [`Instrument`] is an immutable price snapshot. The [`InstrumentCatalog`]
//! is the fixed set of instruments a session can trade.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::{DomainError, Price, Symbol};

// =============================================================================
// Instrument
// =============================================================================

/// A tradable stock with its current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Exchange ticker
    pub symbol: Symbol,
    /// Company name
    pub name: String,
    /// Last traded price
    pub current_price: Price,
}

impl Instrument {
    /// Create a new instrument snapshot.
    ///
    /// # Errors
    /// Returns `DomainError` if the ticker or price is invalid.
    pub fn new(symbol: &str, name: impl Into<String>, current_price: Decimal) -> Result<Self, DomainError> {
        Ok(Self {
            symbol: Symbol::new(symbol)?,
            name: name.into(),
            current_price: Price::new(current_price)?,
        })
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Watchlist entry: an instrument plus the day's move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// The instrument snapshot
    #[serde(flatten)]
    pub instrument: Instrument,
    /// Absolute change since previous close
    pub change: Decimal,
    /// Percentage change since previous close
    pub change_percent: Decimal,
}

// =============================================================================
// Instrument Catalog
// =============================================================================

/// Ordered, in-memory set of tradable instruments.
///
/// Symbols are unique; lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct InstrumentCatalog {
    quotes: Vec<Quote>,
}

impl InstrumentCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The NSE watchlist offered on the order screen.
    pub fn nse_watchlist() -> Self {
        // (symbol, name, price, change, change %), prices in paise
        const WATCHLIST: &[(&str, &str, i64, i64, i64)] = &[
            ("RELIANCE", "Reliance Industries Ltd", 245675, 2350, 97),
            ("TCS", "Tata Consultancy Services", 367890, -1230, -33),
            ("INFY", "Infosys Limited", 154320, 1875, 123),
            ("HDFC", "HDFC Bank Limited", 168745, 890, 53),
            ("ICICI", "ICICI Bank Limited", 98760, -540, -54),
            ("SBIN", "State Bank of India", 62385, 1520, 250),
            ("BHARTI", "Bharti Airtel Limited", 123450, 2230, 184),
            ("ITC", "ITC Limited", 45675, -325, -71),
        ];

        let mut catalog = Self::new();
        for (symbol, name, price, change, change_pct) in WATCHLIST {
            let quote = Quote {
                instrument: Instrument {
                    symbol: Symbol(symbol.to_string()),
                    name: name.to_string(),
                    current_price: Price(Decimal::new(*price, 2)),
                },
                change: Decimal::new(*change, 2),
                change_percent: Decimal::new(*change_pct, 2),
            };
            catalog.quotes.push(quote);
        }
        catalog
    }

    /// Add a quote to the catalog.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSymbol` if the symbol is already listed.
    pub fn insert(&mut self, quote: Quote) -> Result<(), DomainError> {
        if self.get(&quote.instrument.symbol).is_some() {
            return Err(DomainError::InvalidSymbol(format!(
                "Duplicate symbol: {}",
                quote.instrument.symbol
            )));
        }
        self.quotes.push(quote);
        Ok(())
    }

    /// Look up an instrument by symbol.
    pub fn get(&self, symbol: &Symbol) -> Option<&Instrument> {
        self.quotes
            .iter()
            .map(|q| &q.instrument)
            .find(|i| &i.symbol == symbol)
    }

    /// Look up an instrument by raw ticker text.
    ///
    /// Returns `None` for malformed tickers as well as unknown ones.
    pub fn find(&self, ticker: &str) -> Option<&Instrument> {
        let symbol = Symbol::new(ticker).ok()?;
        self.get(&symbol)
    }

    /// All quotes in listing order.
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Number of listed instruments.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
