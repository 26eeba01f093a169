use crate::core::model::Holding;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HoldingConfig {
    pub symbol: String,
    pub purchase_price: Decimal,
    pub purchase_qty: u32,
    #[serde(default)]
    pub additional_qty: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PortfolioConfig {
    pub name: String,
    pub owner: String,
    pub holdings: Vec<HoldingConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lower number = higher priority.
    pub priority: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    pub base_url: String,
}

fn default_true() -> bool {
    true
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourcesConfig {
    pub yahoo: Option<SourceConfig>,
    pub google: Option<SourceConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            yahoo: Some(SourceConfig {
                enabled: true,
                priority: 1,
                retry_count: 3,
                retry_delay_ms: 1000,
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            google: Some(SourceConfig {
                enabled: true,
                priority: 2,
                retry_count: 2,
                retry_delay_ms: 1000,
                base_url: "https://www.google.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ValidationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub min_price: Decimal,
    #[serde(default = "default_max_price")]
    pub max_price: Decimal,
}

fn default_max_price() -> Decimal {
    Decimal::from(1_000_000)
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            enabled: true,
            min_price: Decimal::ZERO,
            max_price: default_max_price(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Where the rendered HTML summary is written for the mailer to pick
    /// up. Defaults to `report.html` under the data directory.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

/// Immutable application configuration. Constructed once at startup and
/// passed by reference; business logic never reads ambient state.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub portfolios: Vec<PortfolioConfig>,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    /// Override for the fjall store location.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "foliotrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "foliotrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Flattens the configured portfolios into holding records.
    pub fn holdings(&self) -> Vec<Holding> {
        self.portfolios
            .iter()
            .flat_map(|p| {
                p.holdings.iter().map(|h| Holding {
                    owner: p.owner.clone(),
                    portfolio_name: p.name.clone(),
                    stock_symbol: h.symbol.clone(),
                    purchase_price: h.purchase_price,
                    purchase_qty: h.purchase_qty,
                    additional_qty: h.additional_qty,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
portfolios:
  - name: "Long Term"
    owner: "alice"
    holdings:
      - symbol: "RELIANCE.NS"
        purchase_price: 2500.50
        purchase_qty: 10
        additional_qty: 2
      - symbol: "TCS.NS"
        purchase_price: 3200
        purchase_qty: 5
  - name: "Trading"
    owner: "bob"
    holdings: []
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.portfolios.len(), 2);
        assert_eq!(config.portfolios[0].name, "Long Term");
        assert_eq!(config.portfolios[0].owner, "alice");
        assert_eq!(config.portfolios[0].holdings.len(), 2);
        assert_eq!(config.portfolios[0].holdings[1].additional_qty, 0);

        // Defaults kick in for everything else
        assert!(config.fallback_enabled);
        assert!(config.validation.enabled);
        assert_eq!(config.validation.min_price, Decimal::ZERO);
        assert_eq!(config.validation.max_price, dec!(1000000));
        assert!(!config.notification.enabled);
        let yahoo = config.sources.yahoo.expect("yahoo source");
        assert_eq!(yahoo.priority, 1);
        assert_eq!(yahoo.retry_count, 3);
    }

    #[test]
    fn test_config_with_sources_and_validation() {
        let yaml_str = r#"
portfolios: []
sources:
  yahoo:
    priority: 2
    retry_count: 1
    retry_delay_ms: 50
    base_url: "http://example.com/yahoo"
  google:
    enabled: false
    priority: 1
    base_url: "http://example.com/google"
fallback_enabled: false
validation:
  enabled: true
  min_price: 1
  max_price: 5000
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert!(!config.fallback_enabled);
        let yahoo = config.sources.yahoo.unwrap();
        assert_eq!(yahoo.priority, 2);
        assert_eq!(yahoo.retry_delay_ms, 50);
        let google = config.sources.google.unwrap();
        assert!(!google.enabled);
        assert_eq!(config.validation.min_price, dec!(1));
        assert_eq!(config.validation.max_price, dec!(5000));
    }

    #[test]
    fn test_holdings_flatten_owner_and_portfolio() {
        let yaml_str = r#"
portfolios:
  - name: "P1"
    owner: "A"
    holdings:
      - symbol: "X"
        purchase_price: 100
        purchase_qty: 10
  - name: "P2"
    owner: "B"
    holdings:
      - symbol: "Y"
        purchase_price: 50
        purchase_qty: 4
        additional_qty: 1
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        let holdings = config.holdings();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].owner, "A");
        assert_eq!(holdings[0].portfolio_name, "P1");
        assert_eq!(holdings[1].stock_symbol, "Y");
        assert_eq!(holdings[1].total_qty(), 5);
    }
}
