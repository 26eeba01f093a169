use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::{FetchError, QuoteProvider, SourcePrice};

pub const SOURCE_LABEL: &str = "yahoo_finance";

// YahooFinanceProvider implementation for QuoteProvider
pub struct YahooFinanceProvider {
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Self {
        YahooFinanceProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Vec<PriceChartItem>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(alias = "chartPreviousClose")]
    previous_close: Option<f64>,
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn label(&self) -> &str {
        SOURCE_LABEL
    }

    #[instrument(
        name = "YahooPriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<SourcePrice, FetchError> {
        let url = format!("{}/v8/finance/chart/{}?interval=1d", self.base_url, symbol);
        debug!("Requesting price data from {}", url);

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

        let data = response
            .json::<YahooPriceResponse>()
            .await
            .map_err(|e| FetchError::SourceUnavailable(format!("Malformed response: {e}")))?;
        let item = data.chart.result.first().ok_or_else(|| {
            FetchError::SourceUnavailable(format!("No price data found for symbol: {symbol}"))
        })?;

        // Fall back to the previous close when the live price is missing,
        // same as quote pages do outside market hours.
        let raw = item
            .meta
            .regular_market_price
            .or(item.meta.previous_close)
            .ok_or_else(|| {
                FetchError::SourceUnavailable(format!("No usable price for symbol: {symbol}"))
            })?;

        let price = Decimal::from_f64_retain(raw).ok_or_else(|| {
            FetchError::SourceUnavailable(format!("Non-numeric price {raw} for symbol: {symbol}"))
        })?;

        debug!("Fetched {} = {} from yahoo", symbol, price);
        Ok(SourcePrice {
            price,
            source: SOURCE_LABEL.to_string(),
        })
    }
}
