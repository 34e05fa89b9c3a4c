//! Order Desk Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains instruments, order inputs and validation, and the order ticket
//! confirmation lifecycle.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod entities;
pub mod instruments;
pub mod order;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{
    round_rupees, OrderConfirmation, OrderTicket, PricingBreakdown, TicketId, TicketState,
};
pub use instruments::{Instrument, InstrumentCatalog, Quote};
pub use order::{
    FieldError, FieldInput, FormValue, OrderDraft, OrderField, OrderForm, OrderRequest, ValidationCode,
    ValidationErrors,
};
pub use value_objects::{AccountBalance, DomainError, OrderType, Price, Quantity, Symbol};
