use std::io;
use thiserror::Error;

/// Errors surfaced by the index builder and the mapped store.
///
/// Query parsing never fails with an error: a query that matches nothing
/// (or that a unique-only parse rejects as ambiguous) yields an empty
/// result list instead.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid index file: {0}")]
    BadFile(String),

    #[error("no object was mapped from the input dump")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, GeoError>;
