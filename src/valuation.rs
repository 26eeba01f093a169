//! Portfolio valuation aggregation

use crate::core::model::{Holding, PortfolioValuation, PriceQuote};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap};

/// Groups holdings by (portfolio, owner) and sums position values.
/// Holdings without a quote contribute 0 to the group value but never drop
/// the group. Output is ordered by group key.
pub fn compute(
    holdings: &[Holding],
    quotes: &HashMap<String, PriceQuote>,
    valuation_date: NaiveDate,
) -> Vec<PortfolioValuation> {
    let mut groups: BTreeMap<(String, String), Decimal> = BTreeMap::new();

    for holding in holdings {
        let key = (holding.portfolio_name.clone(), holding.owner.clone());
        let entry = groups.entry(key).or_insert(Decimal::ZERO);
        if let Some(quote) = quotes.get(&holding.stock_symbol) {
            *entry += quote.price * Decimal::from(holding.total_qty());
        }
    }

    groups
        .into_iter()
        .map(|((portfolio_name, owner), value)| PortfolioValuation {
            portfolio_name,
            owner,
            value: value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            valuation_date,
        })
        .collect()
}
