use crate::core::model::{Holding, PortfolioValuation, PriceQuote};
use crate::store::{Repository, StoreError};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

/// In-memory repository with the same upsert semantics as the disk store.
/// Used in tests and anywhere persistence is not wanted.
#[derive(Default)]
pub struct MemoryStore {
    holdings: RwLock<BTreeMap<String, Holding>>,
    quotes: RwLock<BTreeMap<String, PriceQuote>>,
    valuations: RwLock<BTreeMap<String, PortfolioValuation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryStore {
    fn get_holdings(&self) -> Result<Vec<Holding>, StoreError> {
        Ok(self.holdings.read().unwrap().values().cloned().collect())
    }

    fn get_unique_symbols(&self) -> Result<Vec<String>, StoreError> {
        let symbols: BTreeSet<String> = self
            .holdings
            .read()
            .unwrap()
            .values()
            .map(|h| h.stock_symbol.clone())
            .collect();
        Ok(symbols.into_iter().collect())
    }

    fn get_latest_quotes(&self) -> Result<Vec<PriceQuote>, StoreError> {
        let mut latest: BTreeMap<String, PriceQuote> = BTreeMap::new();
        for quote in self.quotes.read().unwrap().values() {
            match latest.get(&quote.stock_symbol) {
                Some(existing) if existing.price_date >= quote.price_date => {}
                _ => {
                    latest.insert(quote.stock_symbol.clone(), quote.clone());
                }
            }
        }
        Ok(latest.into_values().collect())
    }

    fn upsert_holdings(&self, holdings: &[Holding]) -> Result<(), StoreError> {
        let mut map = self.holdings.write().unwrap();
        for holding in holdings {
            let key = format!(
                "{}|{}|{}",
                holding.owner, holding.portfolio_name, holding.stock_symbol
            );
            map.insert(key, holding.clone());
        }
        Ok(())
    }

    fn upsert_quotes(&self, quotes: &[PriceQuote]) -> Result<(), StoreError> {
        let mut map = self.quotes.write().unwrap();
        for quote in quotes {
            let key = format!("{}|{}", quote.stock_symbol, quote.price_date);
            map.insert(key, quote.clone());
        }
        Ok(())
    }

    fn upsert_valuations(&self, valuations: &[PortfolioValuation]) -> Result<(), StoreError> {
        let mut map = self.valuations.write().unwrap();
        for valuation in valuations {
            let key = format!(
                "{}|{}|{}",
                valuation.valuation_date, valuation.portfolio_name, valuation.owner
            );
            map.insert(key, valuation.clone());
        }
        Ok(())
    }

    fn get_valuation_history(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<PortfolioValuation>, StoreError> {
        let mut history: Vec<PortfolioValuation> = self
            .valuations
            .read()
            .unwrap()
            .values()
            .filter(|v| v.valuation_date >= since)
            .cloned()
            .collect();
        history.sort_by(|a, b| {
            b.valuation_date
                .cmp(&a.valuation_date)
                .then_with(|| a.portfolio_name.cmp(&b.portfolio_name))
                .then_with(|| a.owner.cmp(&b.owner))
        });
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_memory_store_upsert_semantics() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let mut valuation = PortfolioValuation {
            portfolio_name: "P1".to_string(),
            owner: "A".to_string(),
            value: dec!(100),
            valuation_date: date,
        };
        store.upsert_valuations(std::slice::from_ref(&valuation)).unwrap();
        valuation.value = dec!(200);
        store.upsert_valuations(std::slice::from_ref(&valuation)).unwrap();

        let history = store.get_valuation_history(date).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, dec!(200));
    }
}
