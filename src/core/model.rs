//! Typed records shared across the fetch, performance and valuation engines

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single position in an owner's portfolio. Reference data for a run;
/// only `additional_qty` accrues over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub owner: String,
    pub portfolio_name: String,
    pub stock_symbol: String,
    pub purchase_price: Decimal,
    pub purchase_qty: u32,
    #[serde(default)]
    pub additional_qty: u32,
}

impl Holding {
    /// Purchased plus accrued units.
    pub fn total_qty(&self) -> u32 {
        self.purchase_qty + self.additional_qty
    }
}

/// Latest known market price for a symbol. One quote per symbol per fetch
/// cycle; the most recent date per symbol is authoritative for valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub stock_symbol: String,
    pub price: Decimal,
    pub source: String,
    pub price_date: NaiveDate,
}

/// A holding left-joined with its quote. Unmatched holdings keep `None`
/// price and performance but still appear in the output.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRow {
    pub owner: String,
    pub portfolio_name: String,
    pub stock_symbol: String,
    pub purchase_price: Decimal,
    pub price: Option<Decimal>,
    pub source: Option<String>,
    pub price_date: Option<NaiveDate>,
    pub performance: Option<Decimal>,
    pub price_age_days: i64,
}

/// Aggregate value of one (portfolio, owner) group on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub portfolio_name: String,
    pub owner: String,
    pub value: Decimal,
    pub valuation_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_qty_includes_additional() {
        let holding = Holding {
            owner: "A".to_string(),
            portfolio_name: "P1".to_string(),
            stock_symbol: "X".to_string(),
            purchase_price: dec!(100),
            purchase_qty: 10,
            additional_qty: 5,
        };
        assert_eq!(holding.total_qty(), 15);
    }

    #[test]
    fn test_holding_additional_qty_defaults_to_zero() {
        let yaml = r#"
owner: "A"
portfolio_name: "P1"
stock_symbol: "X"
purchase_price: 100.5
purchase_qty: 10
"#;
        let holding: Holding = serde_yaml::from_str(yaml).expect("Failed to deserialize");
        assert_eq!(holding.additional_qty, 0);
        assert_eq!(holding.purchase_price, dec!(100.5));
    }
}
