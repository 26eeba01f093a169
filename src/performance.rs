//! Per-holding performance computation

use crate::core::model::{Holding, PerformanceRow, PriceQuote};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use tracing::warn;

/// Percent gain/loss, rounded half-away-from-zero to 2 decimal places.
/// `None` when either side is missing or the purchase price is zero.
fn percent_performance(purchase_price: Decimal, price: Option<Decimal>) -> Option<Decimal> {
    let price = price?;
    (price - purchase_price)
        .checked_div(purchase_price)
        .map(|r| (r * Decimal::ONE_HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Whole days between the quote date and today. A missing date counts as
/// today; a quote dated in the future is clamped to 0 rather than failing
/// the row.
fn price_age_days(price_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match price_date {
        None => 0,
        Some(date) => {
            let age = (today - date).num_days();
            if age < 0 {
                warn!("Quote dated {} is in the future, treating age as 0", date);
                0
            } else {
                age
            }
        }
    }
}

/// Left-joins holdings with their quotes and computes per-holding
/// performance. Every holding appears in the output; rows without a quote
/// keep `None` price and performance. Sorted by performance descending,
/// nulls last.
pub fn compute(
    holdings: &[Holding],
    quotes: &HashMap<String, PriceQuote>,
    today: NaiveDate,
) -> Vec<PerformanceRow> {
    let mut rows: Vec<PerformanceRow> = holdings
        .iter()
        .map(|holding| {
            let quote = quotes.get(&holding.stock_symbol);
            let price = quote.map(|q| q.price);
            let price_date = quote.map(|q| q.price_date);
            PerformanceRow {
                owner: holding.owner.clone(),
                portfolio_name: holding.portfolio_name.clone(),
                stock_symbol: holding.stock_symbol.clone(),
                purchase_price: holding.purchase_price,
                price,
                source: quote.map(|q| q.source.clone()),
                price_date,
                performance: percent_performance(holding.purchase_price, price),
                price_age_days: price_age_days(price_date, today),
            }
        })
        .collect();

    rows.sort_by(|a, b| match (a.performance, b.performance) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    rows
}
