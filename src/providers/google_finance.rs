use async_trait::async_trait;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::core::price::{FetchError, QuoteProvider, SourcePrice};

pub const SOURCE_LABEL: &str = "google_finance";

// Markup dependency of the quote page. Brittle by nature; isolated here so
// the rest of the fetcher never sees HTML.
const PRICE_SELECTOR: &str = "div.YMlKec.fxKbKc";

/// HTML-scraping source for the Google Finance quote page.
pub struct GoogleFinanceProvider {
    base_url: String,
}

impl GoogleFinanceProvider {
    pub fn new(base_url: &str) -> Self {
        GoogleFinanceProvider {
            base_url: base_url.to_string(),
        }
    }

    /// NSE symbols use the `:NSE` suffix on Google Finance instead of the
    /// Yahoo-style `.NS`.
    fn to_google_symbol(symbol: &str) -> String {
        symbol.replace(".NS", ":NSE")
    }

    fn extract_price(html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        // Selector is a compile-time constant; parse cannot fail at runtime.
        let selector = Selector::parse(PRICE_SELECTOR).ok()?;
        document
            .select(&selector)
            .next()
            .map(|div| div.text().collect::<String>())
    }
}

#[async_trait]
impl QuoteProvider for GoogleFinanceProvider {
    fn label(&self) -> &str {
        SOURCE_LABEL
    }

    #[instrument(
        name = "GooglePriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<SourcePrice, FetchError> {
        let google_symbol = Self::to_google_symbol(symbol);
        let url = format!("{}/finance/quote/{}", self.base_url, google_symbol);
        debug!("Requesting quote page from {}", url);

        let client = super::http_client()?;
        let response = client.get(&url).send().await.map_err(|e| {
            FetchError::SourceUnavailable(format!(
                "Request error: {e} for symbol: {symbol} URL: {url}"
            ))
        })?;

        if !response.status().is_success() {
            return Err(FetchError::SourceUnavailable(format!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::SourceUnavailable(format!("Failed to read body: {e}")))?;

        let price_text = Self::extract_price(&body).ok_or_else(|| {
            FetchError::SourceUnavailable(format!(
                "Price element not found on quote page for symbol: {symbol}"
            ))
        })?;

        let cleaned: String = price_text
            .trim()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        let price = Decimal::from_str(&cleaned).map_err(|e| {
            FetchError::SourceUnavailable(format!(
                "Could not parse price '{price_text}' for symbol {symbol}: {e}"
            ))
        })?;

        debug!("Fetched {} = {} from google", symbol, price);
        Ok(SourcePrice {
            price,
            source: SOURCE_LABEL.to_string(),
        })
    }
}
