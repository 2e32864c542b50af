#![warn(clippy::uninlined_format_args)]

pub mod model;
pub mod services;

pub use model::{
    Balance, DivisionMethod, Event, EventError, EventId, Invoice, InvoiceId, InvoiceItem, ItemId,
    Money, ParseMoneyError, Person, PersonId, SettlementTransfer,
};
pub use services::{calculate_balances, suggest_transfers};
