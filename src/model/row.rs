use crate::model::{Amount, Record, RecordKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A display-ready ledger row derived from a [`Record`].
///
/// Rows are recomputed every time the ledger view is built and carry no identity of their own.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerRow {
    pub(crate) kind: RecordKind,
    /// The trimmed description, or `"Compra"`/`"Gasto"` when there is none.
    pub(crate) label: String,
    /// Epoch milliseconds used for ordering, `0` when the date is absent or unparseable.
    pub(crate) date_ordinal: i64,
    pub(crate) gross_amount: Decimal,
    /// The gross amount minus recoverable tax.
    pub(crate) net_amount: Decimal,
    pub(crate) payment_method_label: String,
}

impl From<&Record> for LedgerRow {
    fn from(record: &Record) -> Self {
        Self {
            kind: record.kind(),
            label: record.label(),
            date_ordinal: record.date_ordinal(),
            gross_amount: record.gross_amount(),
            net_amount: record.net_amount(),
            payment_method_label: record.payment_method_label(),
        }
    }
}

impl From<Record> for LedgerRow {
    fn from(record: Record) -> Self {
        LedgerRow::from(&record)
    }
}

impl LedgerRow {
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// The label of the row's kind, `"Compra"` or `"Gasto"`.
    pub fn kind_label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn date_ordinal(&self) -> i64 {
        self.date_ordinal
    }

    pub fn gross_amount(&self) -> Decimal {
        self.gross_amount
    }

    pub fn net_amount(&self) -> Decimal {
        self.net_amount
    }

    /// Recoverable tax: the difference between the gross and net amounts.
    pub fn tax_amount(&self) -> Decimal {
        self.gross_amount - self.net_amount
    }

    pub fn payment_method_label(&self) -> &str {
        &self.payment_method_label
    }

    /// Formats the row's date as a local calendar date, or an empty string when it has none.
    pub fn date_display(&self) -> String {
        if self.date_ordinal == 0 {
            return String::new();
        }
        chrono::DateTime::from_timestamp_millis(self.date_ordinal)
            .map(|dt| {
                dt.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d")
                    .to_string()
            })
            .unwrap_or_default()
    }

    pub fn gross_display(&self) -> Amount {
        Amount::new(self.gross_amount)
    }

    pub fn net_display(&self) -> Amount {
        Amount::new(self.net_amount)
    }
}
