pub mod disk;
pub mod memory;

use crate::core::model::{Holding, PortfolioValuation, PriceQuote};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] fjall::Error),

    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence for holdings, price history and valuation
/// snapshots. Reads return owned records; writes are idempotent upserts
/// (same key overwrites, last writer wins).
pub trait Repository: Send + Sync {
    fn get_holdings(&self) -> Result<Vec<Holding>, StoreError>;

    /// Distinct symbols across all stored holdings, sorted.
    fn get_unique_symbols(&self) -> Result<Vec<String>, StoreError>;

    /// Most recent quote per symbol.
    fn get_latest_quotes(&self) -> Result<Vec<PriceQuote>, StoreError>;

    fn upsert_holdings(&self, holdings: &[Holding]) -> Result<(), StoreError>;

    /// Batch upsert; one row per symbol/date, latest write wins.
    fn upsert_quotes(&self, quotes: &[PriceQuote]) -> Result<(), StoreError>;

    /// Batch upsert keyed by (portfolio, owner, date). All rows for one
    /// run are committed as a single unit.
    fn upsert_valuations(&self, valuations: &[PortfolioValuation]) -> Result<(), StoreError>;

    /// Valuation rows dated on or after `since`, newest first.
    fn get_valuation_history(&self, since: NaiveDate)
        -> Result<Vec<PortfolioValuation>, StoreError>;
}
