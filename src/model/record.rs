use crate::model::{parse_amount, RecordDate, TAX_RATE};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

/// The document type of a purchase whose total includes recoverable tax.
pub const INVOICE: &str = "invoice";

/// Display label of a purchase without a description.
pub const PURCHASE_LABEL: &str = "Compra";

/// Display label of an expense without a description.
pub const EXPENSE_LABEL: &str = "Gasto";

/// Display label used when a record has no payment method.
pub const NO_PAYMENT_METHOD: &str = "N/A";

/// Keys under which a description may be found.
const DESCRIPTION_KEYS: [&str; 2] = ["description", "descripcion"];

/// Whether a ledger record is a purchase or an expense.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Purchase,
    Expense,
}

serde_plain::derive_display_from_serialize!(RecordKind);

impl RecordKind {
    /// Classifies a raw JSON record. A record is a purchase if, and only if, it has a non-null
    /// `totalAmount`. Everything else, including values that are not JSON objects, is an expense.
    pub fn classify(raw: &Value) -> RecordKind {
        match raw.get("totalAmount") {
            Some(total) if !total.is_null() => RecordKind::Purchase,
            _ => RecordKind::Expense,
        }
    }

    /// The label shown for this kind, which is also the fallback description.
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Purchase => PURCHASE_LABEL,
            RecordKind::Expense => EXPENSE_LABEL,
        }
    }
}

/// A procurement transaction. Its total may include tax when it is backed by an invoice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Purchase {
    pub(crate) total_amount: Value,
    pub(crate) document_type: Option<String>,
    /// The `description` of the first entry in `details`.
    pub(crate) description: Option<String>,
    pub(crate) payment_method: Option<String>,
    pub(crate) observations: Option<String>,
    pub(crate) date: RecordDate,
}

/// A generic operating expense.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expense {
    pub(crate) amount: Value,
    pub(crate) description: Option<String>,
    pub(crate) payment_method: Option<String>,
    pub(crate) date: RecordDate,
}

/// A ledger record, classified once when it is read from the backend's loosely-typed JSON.
///
/// Conversion from JSON never fails. Fields that are missing or of the wrong type are carried as
/// absent and resolved to defaults by the accessors.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Purchase(Purchase),
    Expense(Expense),
}

impl From<Value> for Record {
    fn from(raw: Value) -> Self {
        let kind = RecordKind::classify(&raw);
        let mut fields = match raw {
            Value::Object(map) => map,
            other => {
                trace!("Record is not a JSON object, treating it as an empty expense: {other}");
                Map::new()
            }
        };
        let date = RecordDate::from(fields.remove("date"));
        let payment_method = payment_method_name(fields.get("paymentMethod"));

        match kind {
            RecordKind::Purchase => {
                let description = fields
                    .get("details")
                    .and_then(Value::as_array)
                    .and_then(|details| details.first())
                    .and_then(description_text);
                Record::Purchase(Purchase {
                    total_amount: fields.remove("totalAmount").unwrap_or_default(),
                    document_type: fields
                        .get("documentType")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    description,
                    payment_method,
                    observations: fields
                        .get("observations")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    date,
                })
            }
            RecordKind::Expense => Record::Expense(Expense {
                amount: fields.remove("amount").unwrap_or_default(),
                description: description_text(&Value::Object(fields)),
                payment_method,
                date,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Record::from(Value::deserialize(deserializer)?))
    }
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Purchase(_) => RecordKind::Purchase,
            Record::Expense(_) => RecordKind::Expense,
        }
    }

    /// The trimmed description, or the kind's label when there is none.
    pub fn label(&self) -> String {
        let description = match self {
            Record::Purchase(p) => p.description.as_deref(),
            Record::Expense(e) => e.description.as_deref(),
        };
        match description.map(str::trim).filter(|s| !s.is_empty()) {
            Some(label) => label.to_string(),
            None => {
                trace!("Record has no description, labelling it '{}'", self.kind().label());
                self.kind().label().to_string()
            }
        }
    }

    /// Epoch milliseconds of the record's date, `0` when it is absent or unparseable.
    pub fn date_ordinal(&self) -> i64 {
        self.date().ordinal()
    }

    pub fn date(&self) -> &RecordDate {
        match self {
            Record::Purchase(p) => &p.date,
            Record::Expense(e) => &e.date,
        }
    }

    /// The recorded total: `totalAmount` of a purchase, `amount` of an expense.
    pub fn gross_amount(&self) -> Decimal {
        match self {
            Record::Purchase(p) => parse_amount(&p.total_amount),
            Record::Expense(e) => parse_amount(&e.amount),
        }
    }

    /// The recoverable tax contained in the gross amount.
    ///
    /// Only invoice purchases carry tax. Their total includes it at [`TAX_RATE`], so
    /// `tax = gross - gross / (1 + TAX_RATE)`. Tax is never negative.
    pub fn tax_amount(&self) -> Decimal {
        match self {
            Record::Purchase(p) if p.is_invoice() => {
                let gross = self.gross_amount();
                let divisor = Decimal::ONE + TAX_RATE;
                let tax = gross - gross / divisor;
                tax.max(Decimal::ZERO)
            }
            _ => Decimal::ZERO,
        }
    }

    /// The gross amount minus recoverable tax. Equal to the gross amount for everything but
    /// invoice purchases.
    pub fn net_amount(&self) -> Decimal {
        self.gross_amount() - self.tax_amount()
    }

    /// The payment method's name, or `"N/A"` when there is none.
    pub fn payment_method_label(&self) -> String {
        let name = match self {
            Record::Purchase(p) => p.payment_method.as_deref(),
            Record::Expense(e) => e.payment_method.as_deref(),
        };
        name.unwrap_or(NO_PAYMENT_METHOD).to_string()
    }

    /// Free-text observations. Only purchases have them.
    pub fn observations(&self) -> Option<&str> {
        match self {
            Record::Purchase(p) => p.observations.as_deref(),
            Record::Expense(_) => None,
        }
    }
}

impl Purchase {
    pub fn is_invoice(&self) -> bool {
        self.document_type.as_deref() == Some(INVOICE)
    }
}

/// Reads the first non-null description key of `value` as text.
fn description_text(value: &Value) -> Option<String> {
    DESCRIPTION_KEYS
        .iter()
        .filter_map(|key| value.get(key))
        .find(|v| !v.is_null())
        .and_then(scalar_text)
}

/// Coerces the `name` of a payment method relation to text.
fn payment_method_name(relation: Option<&Value>) -> Option<String> {
    let Some(relation) = relation.filter(|r| !r.is_null()) else {
        trace!("Record has no payment method");
        return None;
    };
    let Some(name) = relation.get("name") else {
        trace!("Payment method has no name: {relation}");
        return None;
    };
    let text = scalar_text(name);
    if text.is_none() {
        trace!("Payment method has no usable name: {name}");
    }
    text
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
