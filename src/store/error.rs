use ulid::Ulid;

use crate::model::{CenterId, TemplateId};

#[derive(Debug)]
pub enum StoreError {
    CenterNotFound(CenterId),
    CenterExists(CenterId),
    TemplateExists(TemplateId),
    HolidayExists(Ulid),
    /// Guarded insert refused: an existing session intersects the exclusion window.
    Conflict(Ulid),
    InvalidInput(&'static str),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::CenterNotFound(id) => write!(f, "center not found: {id}"),
            StoreError::CenterExists(id) => write!(f, "center already exists: {id}"),
            StoreError::TemplateExists(id) => write!(f, "template already exists: {id}"),
            StoreError::HolidayExists(id) => {
                write!(f, "holiday range already recorded as {id}")
            }
            StoreError::Conflict(id) => write!(f, "conflict with session: {id}"),
            StoreError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            StoreError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            StoreError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}
