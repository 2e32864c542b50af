use fairsplit_domain::{EventError, EventId};
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Event #{0} not found")]
    EventNotFound(EventId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Event(#[from] EventError),
}
