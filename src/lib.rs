pub mod config;
pub mod core;
pub mod fetcher;
pub mod notify;
pub mod performance;
pub mod providers;
pub mod report;
pub mod store;
pub mod ui;
pub mod valuation;

use crate::config::AppConfig;
use crate::core::error::AppError;
use crate::core::model::{Holding, PriceQuote};
use crate::core::price::PriceValidator;
use crate::fetcher::{PriceFetcher, PriceSource};
use crate::notify::{FileNotifier, Notifier};
use crate::providers::google_finance::GoogleFinanceProvider;
use crate::providers::yahoo_finance::YahooFinanceProvider;
use crate::store::Repository;
use crate::store::disk::FjallStore;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a run computes and persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Valuation snapshot only.
    Value,
    /// Performance table only.
    Performance,
    /// Both (default).
    Both,
}

impl Action {
    fn wants_performance(self) -> bool {
        matches!(self, Action::Performance | Action::Both)
    }

    fn wants_value(self) -> bool {
        matches!(self, Action::Value | Action::Both)
    }
}

pub async fn run(owner: &str, action: Action, config_path: Option<&str>) -> Result<(), AppError> {
    info!("Portfolio tracker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
    .map_err(AppError::Config)?;
    debug!("Loaded config: {config:#?}");

    let data_dir = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => AppConfig::default_data_path().map_err(AppError::Config)?,
    };
    let store = FjallStore::open(&data_dir)?;

    run_with_store(owner, action, &config, &store).await
}

/// Run against an explicit repository. Seam for tests and embedding.
pub async fn run_with_store(
    owner: &str,
    action: Action,
    config: &AppConfig,
    store: &dyn Repository,
) -> Result<(), AppError> {
    let today = Utc::now().date_naive();

    // Holdings declared in the config are synced into the repository at
    // the start of each run; the store stays the single source for reads.
    let configured = config.holdings();
    if !configured.is_empty() {
        store.upsert_holdings(&configured)?;
    }

    let holdings: Vec<Holding> = store
        .get_holdings()?
        .into_iter()
        .filter(|h| h.owner == owner)
        .collect();
    if holdings.is_empty() {
        return Err(AppError::NoData(format!(
            "no holdings found for owner '{owner}'"
        )));
    }

    let symbols: Vec<String> = holdings
        .iter()
        .map(|h| h.stock_symbol.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let fetcher = build_fetcher(config);
    let pb = ui::new_progress_bar(symbols.len() as u64, true);
    pb.set_message("Fetching prices...");
    let fetched = fetcher.fetch(&symbols, today, &pb).await;
    pb.finish_and_clear();

    // Persist fresh quotes before computing anything, so a later failure
    // never loses them.
    if !fetched.is_empty() {
        let quotes: Vec<PriceQuote> = fetched.into_values().collect();
        store.upsert_quotes(&quotes)?;
    }

    // Compute from the latest persisted quotes: a symbol that failed to
    // fetch today falls back to its stored quote with a non-zero age.
    let latest: HashMap<String, PriceQuote> = store
        .get_latest_quotes()?
        .into_iter()
        .map(|q| (q.stock_symbol.clone(), q))
        .collect();
    if latest.is_empty() {
        return Err(AppError::NoData(
            "no price data available from any source".to_string(),
        ));
    }

    let rows = performance::compute(&holdings, &latest, today);

    if action.wants_performance() {
        println!("{}", report::performance_table(&rows));
        if let Some(warning) = report::stale_price_warning(&rows) {
            println!("\n{warning}");
        }
    }

    if action.wants_value() {
        let valuations = valuation::compute(&holdings, &latest, today);
        store.upsert_valuations(&valuations)?;
        if action.wants_performance() {
            ui::print_separator();
        }
        println!("{}", report::valuation_table(&valuations));

        let history = store.get_valuation_history(today - chrono::Duration::days(7))?;
        if !history.is_empty() {
            ui::print_separator();
            println!("{}", report::history_table(&history));
        }
    }

    if config.notification.enabled {
        let report_path = match &config.notification.report_path {
            Some(path) => path.clone(),
            None => AppConfig::default_data_path()
                .map_err(AppError::Config)?
                .join("report.html"),
        };
        let notifier = FileNotifier::new(report_path);
        // Notification failures are reported, never propagated.
        if let Err(e) = notifier.send_summary(&rows, today) {
            warn!("Failed to send performance notification: {e}");
        }
    } else {
        debug!("Notifications are disabled");
    }

    Ok(())
}

fn build_fetcher(config: &AppConfig) -> PriceFetcher {
    let mut sources = Vec::new();

    if let Some(source) = &config.sources.yahoo
        && source.enabled
    {
        sources.push(PriceSource {
            provider: Arc::new(YahooFinanceProvider::new(&source.base_url)),
            priority: source.priority,
            retry_count: source.retry_count,
            retry_delay: Duration::from_millis(source.retry_delay_ms),
        });
    }
    if let Some(source) = &config.sources.google
        && source.enabled
    {
        sources.push(PriceSource {
            provider: Arc::new(GoogleFinanceProvider::new(&source.base_url)),
            priority: source.priority,
            retry_count: source.retry_count,
            retry_delay: Duration::from_millis(source.retry_delay_ms),
        });
    }

    let validator = PriceValidator::new(
        config.validation.enabled,
        config.validation.min_price,
        config.validation.max_price,
    );
    PriceFetcher::new(sources, validator, config.fallback_enabled)
}
