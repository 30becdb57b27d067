//! The `ledger view` command and the renderings of a ledger view.

use crate::args::ViewArgs;
use crate::commands::{Out, OutputFormat};
use crate::model::Amount;
use crate::sources::Sources;
use crate::view::{LedgerView, SortState};
use crate::{Config, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use tracing::debug;

const HEADERS: [&str; 6] = ["Date", "Kind", "Label", "Gross", "Net", "Payment Method"];

/// A rendered ledger view in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows {
    /// The rows, sort state and totals as a JSON object.
    Json(serde_json::Value),
    /// Markdown table followed by the totals.
    Table(String),
    /// CSV data as a properly escaped string.
    Csv(String),
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({:?})", v),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rows::Table(s) => write!(f, "{}", s),
            Rows::Csv(s) => write!(f, "{}", s),
        }
    }
}

/// Loads the purchase and expense collections, builds the ledger view and renders it.
///
/// The collections come from the paths in `args` when given, otherwise from the config. Either
/// collection that cannot be loaded is shown as empty.
///
/// # Errors
/// - Returns an error if the view cannot be rendered in the requested format.
pub async fn view(config: Config, args: ViewArgs) -> Result<Out<Rows>> {
    let purchases = args
        .purchases()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.purchases_path());
    let expenses = args
        .expenses()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.expenses_path());
    let sources = Sources::load(&purchases, &expenses).await;

    let sort = sort_state(&args);
    let ledger = LedgerView::build(sources.purchases, sources.expenses, sort);
    let format = args.format().unwrap_or_else(|| config.output_format());
    let rows = render(&ledger, format)?;

    let summary = ledger.summary();
    let message = format!(
        "Showing {} of {} record{} sorted by {} {}",
        ledger.rows().len(),
        summary.record_count(),
        if summary.record_count() == 1 { "" } else { "s" },
        sort.key(),
        sort.direction()
    );
    Ok(Out::new(message, rows))
}

/// Replays each `--sort` selection from the initial state, then applies `--direction`.
fn sort_state(args: &ViewArgs) -> SortState {
    let selected = args
        .sort()
        .iter()
        .fold(SortState::default(), |state, key| state.select(*key));
    let sort = match args.direction() {
        Some(direction) => SortState::new(selected.key(), direction),
        None => selected,
    };
    debug!("Sorting by {} {}", sort.key(), sort.direction());
    sort
}

/// Renders `ledger` in `format`.
pub fn render(ledger: &LedgerView, format: OutputFormat) -> Result<Rows> {
    match format {
        OutputFormat::Json => Ok(Rows::Json(
            serde_json::to_value(ledger).context("Unable to serialize the ledger view")?,
        )),
        OutputFormat::Table => Ok(Rows::Table(render_table(ledger))),
        OutputFormat::Csv => Ok(Rows::Csv(render_csv(ledger)?)),
    }
}

fn cells(ledger: &LedgerView) -> Vec<[String; 6]> {
    ledger
        .rows()
        .iter()
        .map(|row| {
            [
                row.date_display(),
                row.kind_label().to_string(),
                row.label().to_string(),
                row.gross_display().to_string(),
                row.net_display().to_string(),
                row.payment_method_label().to_string(),
            ]
        })
        .collect()
}

fn render_table(ledger: &LedgerView) -> String {
    let rows = cells(ledger);
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &[String]| {
        let padded: Vec<String> = values
            .iter()
            .zip(widths.iter())
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut out = Vec::with_capacity(rows.len() + 6);
    out.push(line(HEADERS.map(String::from).as_slice()));
    out.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in &rows {
        out.push(line(row.as_slice()));
    }

    let summary = ledger.summary();
    out.push(String::new());
    out.push(format!(
        "Purchases: {} ({} gross, {} net, {} recoverable tax)",
        summary.purchase_count,
        Amount::new(summary.purchase_gross),
        Amount::new(summary.purchase_net),
        Amount::new(summary.recoverable_tax)
    ));
    out.push(format!(
        "Expenses: {} ({})",
        summary.expense_count,
        Amount::new(summary.expense_total)
    ));
    out.push(format!("Net outflow: {}", Amount::new(summary.net_outflow())));
    out.join("\n")
}

fn render_csv(ledger: &LedgerView) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADERS)
        .context("Unable to write CSV headers")?;
    for row in ledger.rows() {
        writer
            .write_record([
                row.date_display(),
                row.kind_label().to_string(),
                row.label().to_string(),
                row.gross_amount().normalize().to_string(),
                row.net_amount().round_dp(2).normalize().to_string(),
                row.payment_method_label().to_string(),
            ])
            .context("Unable to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush CSV data: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
