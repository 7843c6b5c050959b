use std::io;

use thiserror::Error;

/// Failures surfaced while reading or writing a packed dawg file. Format
/// trouble is kept apart from plain stream trouble so callers can tell a
/// corrupt dictionary from a flaky disk.
#[derive(Debug, Error)]
pub enum DawgError {
    #[error("dawg data ended mid-cell")]
    Truncated(#[source] io::Error),
    #[error("malformed dawg data: {0}")]
    Format(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
