//! Price source abstractions and validation

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Price returned by a single source, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePrice {
    pub price: Decimal,
    pub source: String,
}

/// Failure modes of one fetch attempt against one source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or parse failure from a provider. Recovered by retry, then
    /// fallback to the next source.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Price outside configured bounds. Recovered by fallback only; the
    /// same payload is never retried against the same source.
    #[error("invalid price {price} from {src}")]
    InvalidPrice { price: Decimal, src: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::SourceUnavailable(e.to_string())
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Stable label recorded in persisted quotes.
    fn label(&self) -> &str;

    async fn fetch_price(&self, symbol: &str) -> Result<SourcePrice, FetchError>;
}

/// Bounds check for fetched prices. Both ends inclusive.
#[derive(Debug, Clone, Copy)]
pub struct PriceValidator {
    enabled: bool,
    min_price: Decimal,
    max_price: Decimal,
}

impl PriceValidator {
    pub fn new(enabled: bool, min_price: Decimal, max_price: Decimal) -> Self {
        Self {
            enabled,
            min_price,
            max_price,
        }
    }

    pub fn is_valid(&self, price: Decimal) -> bool {
        if !self.enabled {
            return true;
        }
        price >= self.min_price && price <= self.max_price
    }
}
