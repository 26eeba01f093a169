//! Ordered-source price fetching with retry, validation and fallback

use crate::core::model::PriceQuote;
use crate::core::price::{FetchError, PriceValidator, QuoteProvider, SourcePrice};
use chrono::NaiveDate;
use futures::future::join_all;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One registered price source with its retry budget.
pub struct PriceSource {
    pub provider: Arc<dyn QuoteProvider>,
    /// Lower number = tried first.
    pub priority: u32,
    /// Total attempts against this source per symbol.
    pub retry_count: u32,
    pub retry_delay: Duration,
}

pub struct PriceFetcher {
    sources: Vec<PriceSource>,
    validator: PriceValidator,
    fallback_enabled: bool,
}

impl PriceFetcher {
    pub fn new(
        mut sources: Vec<PriceSource>,
        validator: PriceValidator,
        fallback_enabled: bool,
    ) -> Self {
        sources.sort_by_key(|s| s.priority);
        Self {
            sources,
            validator,
            fallback_enabled,
        }
    }

    /// Fetches current prices for all requested symbols. Symbols with no
    /// valid price from any source are omitted from the result; partial
    /// coverage is the caller's problem, never an error.
    pub async fn fetch(
        &self,
        symbols: &[String],
        price_date: NaiveDate,
        pb: &ProgressBar,
    ) -> HashMap<String, PriceQuote> {
        let fetches = symbols.iter().map(|symbol| async move {
            let result = self.fetch_single(symbol).await;
            pb.inc(1);
            (symbol.clone(), result)
        });

        let mut quotes = HashMap::new();
        for (symbol, result) in join_all(fetches).await {
            if let Some(source_price) = result {
                quotes.insert(
                    symbol.clone(),
                    PriceQuote {
                        stock_symbol: symbol,
                        price: source_price.price,
                        source: source_price.source,
                        price_date,
                    },
                );
            }
        }

        if quotes.is_empty() {
            warn!("Could not fetch any stock prices");
        } else {
            debug!("Successfully fetched {} stock prices", quotes.len());
        }
        quotes
    }

    async fn fetch_single(&self, symbol: &str) -> Option<SourcePrice> {
        for source in &self.sources {
            if let Some(price) = self.try_source(source, symbol).await {
                return Some(price);
            }
            if !self.fallback_enabled {
                break;
            }
        }
        warn!("Failed to fetch price for {} from all available sources", symbol);
        None
    }

    /// Runs up to `retry_count` attempts against one source. An
    /// out-of-bounds price aborts the source immediately; re-requesting
    /// the same payload cannot make it valid.
    async fn try_source(&self, source: &PriceSource, symbol: &str) -> Option<SourcePrice> {
        let label = source.provider.label().to_string();
        for attempt in 1..=source.retry_count {
            match source.provider.fetch_price(symbol).await {
                Ok(source_price) => {
                    if self.validator.is_valid(source_price.price) {
                        return Some(source_price);
                    }
                    let err = FetchError::InvalidPrice {
                        price: source_price.price,
                        src: label,
                    };
                    warn!(symbol, "{}", err);
                    return None;
                }
                Err(err) => {
                    if attempt == source.retry_count {
                        warn!(symbol, source = %label, "{}", err);
                    } else {
                        debug!(
                            "Retry {}/{} for {} using {}: {}",
                            attempt, source.retry_count, symbol, label, err
                        );
                        tokio::time::sleep(source.retry_delay).await;
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then returns `price`.
    struct FlakyProvider {
        label: String,
        price: Decimal,
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyProvider {
        fn new(label: &str, price: Decimal, failures: u32) -> Self {
            Self {
                label: label.to_string(),
                price,
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for FlakyProvider {
        fn label(&self) -> &str {
            &self.label
        }

        async fn fetch_price(&self, _symbol: &str) -> Result<SourcePrice, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(FetchError::SourceUnavailable("connection reset".to_string()));
            }
            Ok(SourcePrice {
                price: self.price,
                source: self.label.clone(),
            })
        }
    }

    fn source(provider: Arc<dyn QuoteProvider>, priority: u32, retry_count: u32) -> PriceSource {
        PriceSource {
            provider,
            priority,
            retry_count,
            retry_delay: Duration::from_millis(0),
        }
    }

    fn lenient_validator() -> PriceValidator {
        PriceValidator::new(false, Decimal::ZERO, Decimal::ZERO)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    async fn fetch_one(fetcher: &PriceFetcher, symbol: &str) -> Option<PriceQuote> {
        let pb = ui::new_progress_bar(1, false);
        let mut quotes = fetcher.fetch(&[symbol.to_string()], today(), &pb).await;
        quotes.remove(symbol)
    }

    #[tokio::test]
    async fn test_valid_price_from_first_source() {
        let primary = Arc::new(FlakyProvider::new("yahoo_finance", dec!(120.50), 0));
        let fetcher = PriceFetcher::new(
            vec![source(primary.clone(), 1, 3)],
            lenient_validator(),
            true,
        );

        let quote = fetch_one(&fetcher, "X").await.unwrap();
        assert_eq!(quote.price, dec!(120.50));
        assert_eq!(quote.source, "yahoo_finance");
        assert_eq!(quote.price_date, today());
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_to_second_source() {
        let primary = Arc::new(FlakyProvider::new("yahoo_finance", dec!(1), u32::MAX));
        let secondary = Arc::new(FlakyProvider::new("google_finance", dec!(99), 0));
        let fetcher = PriceFetcher::new(
            vec![
                source(secondary.clone(), 2, 2),
                source(primary.clone(), 1, 2),
            ],
            lenient_validator(),
            true,
        );

        let quote = fetch_one(&fetcher, "X").await.unwrap();
        assert_eq!(quote.source, "google_finance");
        // Priority ordering held even though sources were registered
        // out of order
        assert_eq!(primary.calls(), 2);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_disabled_stops_after_first_source() {
        let primary = Arc::new(FlakyProvider::new("yahoo_finance", dec!(1), u32::MAX));
        let secondary = Arc::new(FlakyProvider::new("google_finance", dec!(99), 0));
        let fetcher = PriceFetcher::new(
            vec![
                source(primary.clone(), 1, 2),
                source(secondary.clone(), 2, 2),
            ],
            lenient_validator(),
            false,
        );

        assert!(fetch_one(&fetcher, "X").await.is_none());
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_retry_until_last_attempt_succeeds() {
        let primary = Arc::new(FlakyProvider::new("yahoo_finance", dec!(42), 2));
        let fetcher = PriceFetcher::new(
            vec![source(primary.clone(), 1, 3)],
            lenient_validator(),
            true,
        );

        let quote = fetch_one(&fetcher, "X").await.unwrap();
        assert_eq!(quote.price, dec!(42));
        assert_eq!(primary.calls(), 3);
    }

    #[tokio::test]
    async fn test_all_attempts_exhausted_yields_nothing() {
        let primary = Arc::new(FlakyProvider::new("yahoo_finance", dec!(42), u32::MAX));
        let fetcher = PriceFetcher::new(
            vec![source(primary.clone(), 1, 3)],
            lenient_validator(),
            true,
        );

        assert!(fetch_one(&fetcher, "X").await.is_none());
        assert_eq!(primary.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalid_price_triggers_fallback_without_retry() {
        let primary = Arc::new(FlakyProvider::new("yahoo_finance", dec!(0.50), 0));
        let secondary = Arc::new(FlakyProvider::new("google_finance", dec!(10), 0));
        let validator = PriceValidator::new(true, dec!(1), dec!(1000));
        let fetcher = PriceFetcher::new(
            vec![
                source(primary.clone(), 1, 3),
                source(secondary.clone(), 2, 3),
            ],
            validator,
            true,
        );

        let quote = fetch_one(&fetcher, "X").await.unwrap();
        assert_eq!(quote.source, "google_finance");
        // The invalid payload was not retried against the same source
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_exact_min_price_is_accepted() {
        let primary = Arc::new(FlakyProvider::new("yahoo_finance", dec!(1), 0));
        let validator = PriceValidator::new(true, dec!(1), dec!(1000));
        let fetcher = PriceFetcher::new(vec![source(primary, 1, 1)], validator, true);

        let quote = fetch_one(&fetcher, "X").await.unwrap();
        assert_eq!(quote.price, dec!(1));
    }

    #[tokio::test]
    async fn test_failed_symbols_are_omitted_not_errors() {
        let primary = Arc::new(FlakyProvider::new("yahoo_finance", dec!(42), u32::MAX));
        let fetcher =
            PriceFetcher::new(vec![source(primary, 1, 1)], lenient_validator(), true);

        let pb = ui::new_progress_bar(2, false);
        let quotes = fetcher
            .fetch(&["X".to_string(), "Y".to_string()], today(), &pb)
            .await;
        assert!(quotes.is_empty());
    }
}
