//! Performance summary notification
//!
//! Renders the HTML body consumed by the mail pipeline. Actual delivery is
//! an external collaborator; the notifier hands the rendered report to a
//! sink (a file the mailer watches) and never propagates failures to the
//! run.

use crate::core::model::PerformanceRow;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to write report: {0}")]
    Sink(#[from] std::io::Error),

    #[error("nothing to report")]
    Empty,
}

pub trait Notifier: Send + Sync {
    /// Consumes computed performance rows and delivers a summary. Failures
    /// are returned for the caller to report, never to abort the run.
    fn send_summary(&self, rows: &[PerformanceRow], today: NaiveDate) -> Result<(), NotifyError>;
}

fn average_performance(rows: &[PerformanceRow]) -> Option<Decimal> {
    let values: Vec<Decimal> = rows.iter().filter_map(|r| r.performance).collect();
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    sum.checked_div(Decimal::from(values.len()))
        .map(|avg| avg.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders the summary HTML body: average performance plus one table row
/// per holding, with N/A for missing prices.
pub fn render_html_summary(rows: &[PerformanceRow], today: NaiveDate) -> String {
    let average = average_performance(rows)
        .map_or("N/A".to_string(), |avg| format!("{avg:.2}%"));

    let mut body_rows = String::new();
    for row in rows {
        let price = row
            .price
            .map_or("N/A".to_string(), |p| format!("{p:.2}"));
        let performance = row
            .performance
            .map_or("N/A".to_string(), |p| format!("{p:.2}%"));
        body_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&row.stock_symbol),
            escape(&row.owner),
            escape(&row.portfolio_name),
            row.purchase_price,
            price,
            performance,
        ));
    }

    format!(
        r#"<html>
<body>
<h2>Portfolio Performance Summary</h2>
<p>Average Performance: {average}</p>
<h3>Performance Details:</h3>
<table border="1">
<tr><th>Stock</th><th>Owner</th><th>Portfolio</th><th>Purchase Price</th><th>Current Price</th><th>Performance</th></tr>
{body_rows}</table>
<p><small>Generated on {today}</small></p>
</body>
</html>
"#
    )
}

/// Writes the rendered summary to a file for the external mailer.
pub struct FileNotifier {
    path: PathBuf,
}

impl FileNotifier {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Notifier for FileNotifier {
    fn send_summary(&self, rows: &[PerformanceRow], today: NaiveDate) -> Result<(), NotifyError> {
        if rows.is_empty() {
            return Err(NotifyError::Empty);
        }
        let html = render_html_summary(rows, today);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, html)?;
        info!("Performance summary written to {}", self.path.display());
        Ok(())
    }
}
