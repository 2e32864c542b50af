#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod ports;
pub mod snapshot;
pub mod state;
pub mod validation;

pub use error::AppError;
pub use ports::PersonDirectory;
pub use snapshot::{
    EventSnapshot, SnapshotError, decode_event, encode_event, load_event, save_event,
};
pub use state::{AppState, SettlementSummary, summarize};
pub use validation::{
    InvoiceDraft, ItemDraft, PersonDraft, ValidationError, validate_invoice, validate_person,
};
