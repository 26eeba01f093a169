//! Run-level error taxonomy

use crate::store::StoreError;
use thiserror::Error;

/// Failures surfaced by a run. Intermediate layers return these instead of
/// printing; the CLI boundary decides the exit code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[source] anyhow::Error),

    /// No holdings, no symbols, or no quotes at all. A skipped run, not a
    /// crash.
    #[error("no data available: {0}")]
    NoData(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// Unexpected input shape that left no computable rows.
    #[error("computation failure: {0}")]
    Computation(String),
}
