use crate::core::model::{Holding, PortfolioValuation, PriceQuote};
use crate::store::{Repository, StoreError};
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// Disk-backed repository. One fjall partition per table, JSON values.
/// Keys are composite strings with `|` separators so same-key writes are
/// natural upserts.
pub struct FjallStore {
    keyspace: Keyspace,
    holdings: PartitionHandle,
    quotes: PartitionHandle,
    valuations: PartitionHandle,
}

fn holding_key(h: &Holding) -> String {
    format!("{}|{}|{}", h.owner, h.portfolio_name, h.stock_symbol)
}

fn quote_key(q: &PriceQuote) -> String {
    format!("{}|{}", q.stock_symbol, q.price_date)
}

fn valuation_key(v: &PortfolioValuation) -> String {
    format!("{}|{}|{}", v.valuation_date, v.portfolio_name, v.owner)
}

impl FjallStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let keyspace = fjall::Config::new(path).open()?;
        let holdings = keyspace.open_partition("holdings", PartitionCreateOptions::default())?;
        let quotes = keyspace.open_partition("quotes", PartitionCreateOptions::default())?;
        let valuations =
            keyspace.open_partition("valuations", PartitionCreateOptions::default())?;
        debug!("Opened store at {}", path.display());
        Ok(Self {
            keyspace,
            holdings,
            quotes,
            valuations,
        })
    }

    /// Deserializes every value in a partition, skipping (and logging)
    /// rows that do not parse instead of failing the whole read.
    fn read_all<T: serde::de::DeserializeOwned>(
        partition: &PartitionHandle,
    ) -> Result<Vec<T>, StoreError> {
        let mut records = Vec::new();
        for entry in partition.iter() {
            let (key, value) = entry?;
            match serde_json::from_slice::<T>(&value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        "Skipping undecodable row {}: {}",
                        String::from_utf8_lossy(&key),
                        e
                    );
                }
            }
        }
        Ok(records)
    }
}

impl Repository for FjallStore {
    fn get_holdings(&self) -> Result<Vec<Holding>, StoreError> {
        Self::read_all(&self.holdings)
    }

    fn get_unique_symbols(&self) -> Result<Vec<String>, StoreError> {
        let symbols: BTreeSet<String> = Self::read_all::<Holding>(&self.holdings)?
            .into_iter()
            .map(|h| h.stock_symbol)
            .collect();
        Ok(symbols.into_iter().collect())
    }

    fn get_latest_quotes(&self) -> Result<Vec<PriceQuote>, StoreError> {
        let mut latest: HashMap<String, PriceQuote> = HashMap::new();
        for quote in Self::read_all::<PriceQuote>(&self.quotes)? {
            match latest.get(&quote.stock_symbol) {
                Some(existing) if existing.price_date >= quote.price_date => {}
                _ => {
                    latest.insert(quote.stock_symbol.clone(), quote);
                }
            }
        }
        Ok(latest.into_values().collect())
    }

    fn upsert_holdings(&self, holdings: &[Holding]) -> Result<(), StoreError> {
        let mut batch = self.keyspace.batch();
        for holding in holdings {
            batch.insert(&self.holdings, holding_key(holding).into_bytes(), serde_json::to_vec(holding)?);
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    fn upsert_quotes(&self, quotes: &[PriceQuote]) -> Result<(), StoreError> {
        let mut batch = self.keyspace.batch();
        for quote in quotes {
            batch.insert(&self.quotes, quote_key(quote).into_bytes(), serde_json::to_vec(quote)?);
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Upserted {} quotes", quotes.len());
        Ok(())
    }

    fn upsert_valuations(&self, valuations: &[PortfolioValuation]) -> Result<(), StoreError> {
        let mut batch = self.keyspace.batch();
        for valuation in valuations {
            batch.insert(
                &self.valuations,
                valuation_key(valuation).into_bytes(),
                serde_json::to_vec(valuation)?,
            );
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Upserted {} valuations", valuations.len());
        Ok(())
    }

    fn get_valuation_history(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<PortfolioValuation>, StoreError> {
        let mut history: Vec<PortfolioValuation> = Self::read_all(&self.valuations)?;
        history.retain(|v| v.valuation_date >= since);
        history.sort_by(|a, b| {
            b.valuation_date
                .cmp(&a.valuation_date)
                .then_with(|| a.portfolio_name.cmp(&b.portfolio_name))
                .then_with(|| a.owner.cmp(&b.owner))
        });
        Ok(history)
    }
}
