use clap::{Parser, ValueEnum};
use foliotrack::core::error::AppError;
use foliotrack::core::log::init_logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Owner whose holdings are tracked
    #[arg(short, long, required_unless_present = "init")]
    owner: Option<String>,

    /// What to compute for this run
    #[arg(short, long, value_enum, default_value_t = CliAction::Both)]
    action: CliAction,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,

    /// Create a default configuration file and exit
    #[arg(long)]
    init: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAction {
    Value,
    Performance,
    Both,
}

impl From<CliAction> for foliotrack::Action {
    fn from(action: CliAction) -> foliotrack::Action {
        match action {
            CliAction::Value => foliotrack::Action::Value,
            CliAction::Performance => foliotrack::Action::Performance,
            CliAction::Both => foliotrack::Action::Both,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.init {
        return match init_config() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create configuration");
                ExitCode::FAILURE
            }
        };
    }

    // required_unless_present guarantees owner is set past this point
    let owner = cli.owner.unwrap_or_default();

    match foliotrack::run(&owner, cli.action.into(), cli.config_path.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        // Nothing to do is a skipped run, not a failure
        Err(AppError::NoData(msg)) => {
            tracing::warn!("Run skipped: {msg}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

fn init_config() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = foliotrack::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
portfolios:
  - name: "Example"
    owner: "me"
    holdings: []

sources:
  yahoo:
    priority: 1
    retry_count: 3
    retry_delay_ms: 1000
    base_url: "https://query1.finance.yahoo.com"
  google:
    priority: 2
    retry_count: 2
    retry_delay_ms: 1000
    base_url: "https://www.google.com"

fallback_enabled: true

validation:
  enabled: true
  min_price: 0
  max_price: 1000000

notification:
  enabled: false
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
