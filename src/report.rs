//! Console rendering of performance and valuation results

use crate::core::model::{PerformanceRow, PortfolioValuation};
use crate::ui;
use comfy_table::Cell;

/// Renders the per-holding performance table, sorted as computed.
pub fn performance_table(rows: &[PerformanceRow]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Owner"),
        ui::header_cell("Portfolio"),
        ui::header_cell("Purchase"),
        ui::header_cell("Price"),
        ui::header_cell("Perf"),
        ui::header_cell("Source"),
        ui::header_cell("Date"),
        ui::header_cell("Age"),
    ]);

    for row in rows {
        let performance = row
            .performance
            .map_or(Cell::new("N/A").fg(comfy_table::Color::DarkGrey), ui::change_cell);
        table.add_row(vec![
            Cell::new(&row.stock_symbol),
            Cell::new(&row.owner),
            Cell::new(&row.portfolio_name),
            Cell::new(format!("{:.2}", row.purchase_price)),
            ui::format_optional_cell(row.price, |p| format!("{p:.2}")),
            performance,
            ui::format_optional_cell(row.source.as_deref(), |s| s.to_string()),
            ui::format_optional_cell(row.price_date, |d| d.format("%Y-%m-%d").to_string()),
            Cell::new(format!("{} days", row.price_age_days)),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Portfolio Performance", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output
}

/// Rows whose price is more than one day old, for the staleness warning.
pub fn stale_rows(rows: &[PerformanceRow]) -> Vec<&PerformanceRow> {
    rows.iter().filter(|r| r.price_age_days > 1).collect()
}

pub fn stale_price_warning(rows: &[PerformanceRow]) -> Option<String> {
    let stale = stale_rows(rows);
    if stale.is_empty() {
        return None;
    }
    let mut lines = vec![ui::style_text(
        "Warning: some prices are more than 1 day old:",
        ui::StyleType::Error,
    )];
    for row in stale {
        lines.push(format!("  {}: {} days", row.stock_symbol, row.price_age_days));
    }
    Some(lines.join("\n"))
}

/// Renders the per-run valuation summary table.
pub fn valuation_table(valuations: &[PortfolioValuation]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Portfolio"),
        ui::header_cell("Owner"),
        ui::header_cell("Value"),
        ui::header_cell("Date"),
    ]);

    let mut total = rust_decimal::Decimal::ZERO;
    for valuation in valuations {
        total += valuation.value;
        table.add_row(vec![
            Cell::new(&valuation.portfolio_name),
            Cell::new(&valuation.owner),
            ui::format_optional_cell(Some(valuation.value), |v| format!("{v:.2}")),
            Cell::new(valuation.valuation_date.format("%Y-%m-%d").to_string()),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Portfolio Valuation Summary", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{}: {}",
        ui::style_text("Total", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{total:.2}"), ui::StyleType::TotalValue)
    ));
    output
}

/// Renders recent valuation history, newest first.
pub fn history_table(history: &[PortfolioValuation]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Portfolio"),
        ui::header_cell("Owner"),
        ui::header_cell("Value"),
    ]);

    for valuation in history {
        table.add_row(vec![
            Cell::new(valuation.valuation_date.format("%Y-%m-%d").to_string()),
            Cell::new(&valuation.portfolio_name),
            Cell::new(&valuation.owner),
            ui::format_optional_cell(Some(valuation.value), |v| format!("{v:.2}")),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Recent Valuation History", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn row(symbol: &str, age: i64) -> PerformanceRow {
        PerformanceRow {
            owner: "A".to_string(),
            portfolio_name: "P1".to_string(),
            stock_symbol: symbol.to_string(),
            purchase_price: dec!(100),
            price: Some(dec!(110)),
            source: Some("yahoo_finance".to_string()),
            price_date: NaiveDate::from_ymd_opt(2026, 3, 2),
            performance: Some(dec!(10.00)),
            price_age_days: age,
        }
    }

    #[test]
    fn test_performance_table_contains_rows() {
        let rows = vec![row("X", 0)];
        let rendered = performance_table(&rows);
        assert!(rendered.contains("X"));
        assert!(rendered.contains("10.00%"));
        assert!(rendered.contains("yahoo_finance"));
    }

    #[test]
    fn test_stale_warning_only_for_old_prices() {
        let rows = vec![row("FRESH", 0), row("DAY_OLD", 1), row("STALE", 3)];
        let warning = stale_price_warning(&rows).unwrap();
        assert!(warning.contains("STALE: 3 days"));
        assert!(!warning.contains("FRESH"));
        assert!(!warning.contains("DAY_OLD"));

        assert!(stale_price_warning(&[row("FRESH", 0)]).is_none());
    }

    #[test]
    fn test_valuation_table_totals() {
        let valuations = vec![
            PortfolioValuation {
                portfolio_name: "P1".to_string(),
                owner: "A".to_string(),
                value: dec!(1200.00),
                valuation_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            },
            PortfolioValuation {
                portfolio_name: "P2".to_string(),
                owner: "B".to_string(),
                value: dec!(800.00),
                valuation_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            },
        ];
        let rendered = valuation_table(&valuations);
        assert!(rendered.contains("1200.00"));
        assert!(rendered.contains("2000.00"));
    }
}
