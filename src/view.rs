//! The ledger view: purchases and expenses merged into one sorted, size-capped table.
//!
//! The caller owns a [`SortState`] and moves it with [`SortState::select`] whenever a column is
//! chosen. [`build_ledger_view`] is a pure function of the two source collections and that state.

use crate::model::{LedgerRow, Record, RecordKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::str::FromStr;
use tracing::debug;

/// The maximum number of rows in a ledger view.
pub const PAGE_SIZE: usize = 10;

/// The column a ledger view is sorted by.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Date,
    Kind,
    Label,
    Gross,
    Net,
    PaymentMethod,
}

serde_plain::derive_display_from_serialize!(SortKey);

impl SortKey {
    /// Parses a sort key by name. Unrecognized names fall back to [`SortKey::Date`].
    pub fn from_name(name: &str) -> SortKey {
        match name.trim() {
            "date" => SortKey::Date,
            "kind" => SortKey::Kind,
            "label" => SortKey::Label,
            "gross" => SortKey::Gross,
            "net" => SortKey::Net,
            "paymentMethod" | "payment_method" => SortKey::PaymentMethod,
            other => {
                debug!("Unrecognized sort key '{other}', sorting by date");
                SortKey::Date
            }
        }
    }

    /// The direction a column starts in when it is first selected.
    pub fn initial_direction(&self) -> SortDirection {
        match self {
            SortKey::Date => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    /// Compares two rows on this key, in ascending order.
    pub fn compare(&self, a: &LedgerRow, b: &LedgerRow) -> Ordering {
        match self {
            SortKey::Date => a.date_ordinal().cmp(&b.date_ordinal()),
            SortKey::Kind => compare_text(a.kind_label(), b.kind_label()),
            SortKey::Label => compare_text(a.label(), b.label()),
            SortKey::Gross => a.gross_amount().cmp(&b.gross_amount()),
            SortKey::Net => a.net_amount().cmp(&b.net_amount()),
            SortKey::PaymentMethod => {
                compare_text(a.payment_method_label(), b.payment_method_label())
            }
        }
    }
}

impl FromStr for SortKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortKey::from_name(s))
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SortKey::from_name(&s))
    }
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

serde_plain::derive_display_from_serialize!(SortDirection);
serde_plain::derive_fromstr_from_deserialize!(SortDirection);

impl SortDirection {
    pub fn flip(&self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// The active sort column and direction of a ledger view.
///
/// The initial state is `date`, descending. Selecting the active column flips the direction;
/// selecting another column switches to it in that column's initial direction.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SortState {
    key: SortKey,
    direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn key(&self) -> SortKey {
        self.key
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Returns the state after the column `key` is selected.
    pub fn select(self, key: SortKey) -> SortState {
        if key == self.key {
            SortState::new(key, self.direction.flip())
        } else {
            SortState::new(key, key.initial_direction())
        }
    }

    /// Compares two rows under this state's key and direction.
    pub fn compare(&self, a: &LedgerRow, b: &LedgerRow) -> Ordering {
        self.direction.apply(self.key.compare(a, b))
    }
}

/// Merges `purchases` and `expenses`, sorts them by `sort` and keeps the first [`PAGE_SIZE`] rows.
///
/// Every element is classified on its own, so a record in either collection ends up as a purchase
/// exactly when it has a non-null `totalAmount`. The relative order of rows that compare equal is
/// unspecified.
pub fn build_ledger_view<P, E>(purchases: P, expenses: E, sort: SortState) -> Vec<LedgerRow>
where
    P: IntoIterator,
    P::Item: Into<Record>,
    E: IntoIterator,
    E::Item: Into<Record>,
{
    let rows = normalize(purchases, expenses);
    page(rows, sort)
}

fn normalize<P, E>(purchases: P, expenses: E) -> Vec<LedgerRow>
where
    P: IntoIterator,
    P::Item: Into<Record>,
    E: IntoIterator,
    E::Item: Into<Record>,
{
    purchases
        .into_iter()
        .map(Into::<Record>::into)
        .chain(expenses.into_iter().map(Into::<Record>::into))
        .map(|record| LedgerRow::from(&record))
        .collect()
}

fn page(mut rows: Vec<LedgerRow>, sort: SortState) -> Vec<LedgerRow> {
    let total = rows.len();
    rows.sort_by(|a, b| sort.compare(a, b));
    rows.truncate(PAGE_SIZE);
    debug!(
        "Ledger view sorted by {} {} shows {} of {total} records",
        sort.key(),
        sort.direction(),
        rows.len()
    );
    rows
}

/// A ledger view together with totals over every record it was built from.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerView {
    sort: SortState,
    rows: Vec<LedgerRow>,
    summary: LedgerSummary,
}

impl LedgerView {
    /// Builds the page of rows exactly like [`build_ledger_view`], and summarizes all records,
    /// including those that did not make it onto the page.
    pub fn build<P, E>(purchases: P, expenses: E, sort: SortState) -> Self
    where
        P: IntoIterator,
        P::Item: Into<Record>,
        E: IntoIterator,
        E::Item: Into<Record>,
    {
        let rows = normalize(purchases, expenses);
        let summary = LedgerSummary::from_rows(&rows);
        Self {
            sort,
            rows: page(rows, sort),
            summary,
        }
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn summary(&self) -> &LedgerSummary {
        &self.summary
    }
}

/// Totals over a set of ledger rows.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerSummary {
    pub purchase_count: usize,
    pub expense_count: usize,
    /// Sum of purchase totals as recorded.
    pub purchase_gross: Decimal,
    /// Sum of purchase totals with recoverable tax removed.
    pub purchase_net: Decimal,
    pub recoverable_tax: Decimal,
    pub expense_total: Decimal,
}

impl LedgerSummary {
    /// Sums `rows` by kind. Totals beyond the range of `Decimal` saturate.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a LedgerRow>) -> Self {
        rows.into_iter()
            .fold(LedgerSummary::default(), |mut summary, row| {
                match row.kind() {
                    RecordKind::Purchase => {
                        summary.purchase_count += 1;
                        summary.purchase_gross =
                            summary.purchase_gross.saturating_add(row.gross_amount());
                        summary.purchase_net =
                            summary.purchase_net.saturating_add(row.net_amount());
                        summary.recoverable_tax =
                            summary.recoverable_tax.saturating_add(row.tax_amount());
                    }
                    RecordKind::Expense => {
                        summary.expense_count += 1;
                        summary.expense_total =
                            summary.expense_total.saturating_add(row.gross_amount());
                    }
                }
                summary
            })
    }

    /// Net purchases plus expenses. Totals beyond the range of `Decimal` saturate.
    pub fn net_outflow(&self) -> Decimal {
        self.purchase_net.saturating_add(self.expense_total)
    }

    pub fn record_count(&self) -> usize {
        self.purchase_count + self.expense_count
    }
}

/// Case-insensitive comparison that orders accented Latin letters with their base letter.
/// Strings that differ only by accents are ordered unaccented first.
fn compare_text(a: &str, b: &str) -> Ordering {
    let (a_lower, b_lower) = (a.to_lowercase(), b.to_lowercase());
    fold_accents(&a_lower)
        .cmp(&fold_accents(&b_lower))
        .then_with(|| a_lower.cmp(&b_lower))
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            'ý' | 'ÿ' => 'y',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn purchase(total: i64, label: &str) -> Value {
        json!({"totalAmount": total, "details": [{"description": label}]})
    }

    fn expense(amount: i64, label: &str) -> Value {
        json!({"amount": amount, "description": label})
    }

    fn state(key: SortKey, direction: SortDirection) -> SortState {
        SortState::new(key, direction)
    }

    #[test]
    fn test_initial_state() {
        let initial = SortState::default();
        assert_eq!(initial.key(), SortKey::Date);
        assert_eq!(initial.direction(), SortDirection::Desc);
    }

    #[test]
    fn test_select_transitions() {
        let s = SortState::default().select(SortKey::Gross);
        assert_eq!(s, state(SortKey::Gross, SortDirection::Asc));
        let s = s.select(SortKey::Gross);
        assert_eq!(s, state(SortKey::Gross, SortDirection::Desc));
        let s = s.select(SortKey::Date);
        assert_eq!(s, state(SortKey::Date, SortDirection::Desc));
        let s = s.select(SortKey::Date);
        assert_eq!(s, state(SortKey::Date, SortDirection::Asc));
        let s = s.select(SortKey::PaymentMethod);
        assert_eq!(s, state(SortKey::PaymentMethod, SortDirection::Asc));
    }

    #[test]
    fn test_sort_key_names() {
        assert_eq!(SortKey::from_name("gross"), SortKey::Gross);
        assert_eq!(SortKey::from_name("paymentMethod"), SortKey::PaymentMethod);
        assert_eq!(SortKey::from_name("payment_method"), SortKey::PaymentMethod);
        assert_eq!(SortKey::from_name("fecha"), SortKey::Date);
        assert_eq!(SortKey::from_name(""), SortKey::Date);
        assert_eq!(SortKey::PaymentMethod.to_string(), "paymentMethod");
        assert_eq!("net".parse::<SortKey>().unwrap(), SortKey::Net);
    }

    #[test]
    fn test_sort_key_deserialize_falls_back_to_date() {
        let s: SortState = serde_json::from_str(r#"{"key": "monto", "direction": "asc"}"#).unwrap();
        assert_eq!(s, state(SortKey::Date, SortDirection::Asc));
    }

    #[test]
    fn test_direction_strings() {
        assert_eq!(SortDirection::Asc.to_string(), "asc");
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("down".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_view_is_capped() {
        let purchases: Vec<Value> = (0..50).map(|i| purchase(i, "p")).collect();
        let expenses: Vec<Value> = (0..50).map(|i| expense(i, "e")).collect();
        let rows = build_ledger_view(purchases, expenses, SortState::default());
        assert_eq!(rows.len(), PAGE_SIZE);
    }

    #[test]
    fn test_small_view_keeps_every_row() {
        let rows = build_ledger_view(
            vec![purchase(1, "a")],
            vec![expense(2, "b"), expense(3, "c")],
            SortState::default(),
        );
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_empty_view() {
        let rows = build_ledger_view(Vec::<Value>::new(), Vec::<Value>::new(), SortState::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_sort_by_gross_ascending_and_descending() {
        let purchases = vec![purchase(300, "a"), purchase(100, "b")];
        let expenses = vec![expense(200, "c"), expense(50, "d")];

        let asc = build_ledger_view(
            purchases.clone(),
            expenses.clone(),
            state(SortKey::Gross, SortDirection::Asc),
        );
        let amounts: Vec<Decimal> = asc.iter().map(LedgerRow::gross_amount).collect();
        assert!(amounts.windows(2).all(|w| w[0] <= w[1]));

        let desc = build_ledger_view(purchases, expenses, state(SortKey::Gross, SortDirection::Desc));
        let mut reversed = asc.clone();
        reversed.reverse();
        assert_eq!(desc, reversed);
    }

    #[test]
    fn test_sort_by_gross_keeps_the_largest_page() {
        let expenses: Vec<Value> = (1..=25).map(|i| expense(i, "e")).collect();
        let rows = build_ledger_view(
            Vec::<Value>::new(),
            expenses,
            state(SortKey::Gross, SortDirection::Desc),
        );
        let amounts: Vec<Decimal> = rows.iter().map(LedgerRow::gross_amount).collect();
        let expected: Vec<Decimal> = (16..=25).rev().map(Decimal::from).collect();
        assert_eq!(amounts, expected);
    }

    #[test]
    fn test_sort_by_net_uses_tax_exclusive_amount() {
        let invoice = json!({"totalAmount": 1190, "documentType": "invoice"});
        let rows = build_ledger_view(
            vec![invoice],
            vec![expense(1100, "luz")],
            state(SortKey::Net, SortDirection::Asc),
        );
        assert_eq!(rows[0].net_amount(), Decimal::from(1000));
        assert_eq!(rows[1].net_amount(), Decimal::from(1100));

        let by_gross = build_ledger_view(
            vec![json!({"totalAmount": 1190, "documentType": "invoice"})],
            vec![expense(1100, "luz")],
            state(SortKey::Gross, SortDirection::Asc),
        );
        assert_eq!(by_gross[0].gross_amount(), Decimal::from(1100));
    }

    #[test]
    fn test_sort_by_kind() {
        let rows = build_ledger_view(
            vec![purchase(1, "p")],
            vec![expense(2, "e")],
            state(SortKey::Kind, SortDirection::Asc),
        );
        assert_eq!(rows[0].kind(), RecordKind::Purchase);
        assert_eq!(rows[1].kind(), RecordKind::Expense);
    }

    #[test]
    fn test_sort_by_label_ignores_case_and_accents() {
        let rows = build_ledger_view(
            vec![purchase(1, "cuero"), purchase(2, "Álcali")],
            vec![expense(3, "Bencina"), expense(4, "agua")],
            state(SortKey::Label, SortDirection::Asc),
        );
        let labels: Vec<&str> = rows.iter().map(LedgerRow::label).collect();
        assert_eq!(labels, vec!["agua", "Álcali", "Bencina", "cuero"]);
    }

    #[test]
    fn test_sort_by_payment_method() {
        let with_method = |amount: i64, name: &str| {
            json!({"amount": amount, "paymentMethod": {"name": name}})
        };
        let rows = build_ledger_view(
            Vec::<Value>::new(),
            vec![
                with_method(1, "tarjeta"),
                json!({"amount": 2}),
                with_method(3, "Efectivo"),
            ],
            state(SortKey::PaymentMethod, SortDirection::Desc),
        );
        let methods: Vec<&str> = rows.iter().map(LedgerRow::payment_method_label).collect();
        assert_eq!(methods, vec!["tarjeta", "N/A", "Efectivo"]);
    }

    #[test]
    fn test_sort_by_date_puts_undated_last_when_descending() {
        let rows = build_ledger_view(
            vec![json!({"totalAmount": 1, "date": "2024-01-10"})],
            vec![
                json!({"amount": 2}),
                json!({"amount": 3, "date": [2024, 1, 5]}),
                json!({"amount": 4, "date": "garbage"}),
            ],
            SortState::default(),
        );
        assert_eq!(rows[0].gross_amount(), Decimal::from(1));
        assert_eq!(rows[1].gross_amount(), Decimal::from(3));
        assert_eq!(rows[2].date_ordinal(), 0);
        assert_eq!(rows[3].date_ordinal(), 0);
    }

    #[test]
    fn test_ties_neither_drop_nor_duplicate_rows() {
        let rows = build_ledger_view(
            vec![purchase(100, "a"), purchase(100, "b")],
            vec![expense(100, "c")],
            state(SortKey::Gross, SortDirection::Asc),
        );
        let mut labels: Vec<&str> = rows.iter().map(LedgerRow::label).collect();
        labels.sort();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_classification_is_per_record() {
        let rows = build_ledger_view(
            vec![json!({"amount": 5, "description": "misfiled"})],
            vec![json!({"totalAmount": 7})],
            state(SortKey::Gross, SortDirection::Asc),
        );
        assert_eq!(rows[0].kind(), RecordKind::Expense);
        assert_eq!(rows[1].kind(), RecordKind::Purchase);
    }

    #[test]
    fn test_summary_covers_every_record() {
        let purchases = vec![
            json!({"totalAmount": 1190, "documentType": "invoice"}),
            json!({"totalAmount": 500, "documentType": "boleta"}),
        ];
        let expenses: Vec<Value> = (0..20).map(|_| expense(10, "e")).collect();
        let view = LedgerView::build(purchases, expenses, SortState::default());
        assert_eq!(view.rows().len(), PAGE_SIZE);

        let summary = view.summary();
        assert_eq!(summary.purchase_count, 2);
        assert_eq!(summary.expense_count, 20);
        assert_eq!(summary.record_count(), 22);
        assert_eq!(summary.purchase_gross, Decimal::from(1690));
        assert_eq!(summary.purchase_net, Decimal::from(1500));
        assert_eq!(summary.recoverable_tax, Decimal::from(190));
        assert_eq!(summary.expense_total, Decimal::from(200));
        assert_eq!(summary.net_outflow(), Decimal::from(1700));
    }

    #[test]
    fn test_summary_saturates_huge_totals() {
        let purchases = vec![
            json!({"totalAmount": Decimal::MAX.to_string()}),
            json!({"totalAmount": Decimal::MAX.to_string()}),
        ];
        let expenses = vec![
            json!({"amount": Decimal::MAX.to_string()}),
            json!({"amount": Decimal::MAX.to_string()}),
        ];
        let view = LedgerView::build(purchases, expenses, SortState::default());
        assert_eq!(view.rows().len(), 4);

        let summary = view.summary();
        assert_eq!(summary.purchase_gross, Decimal::MAX);
        assert_eq!(summary.purchase_net, Decimal::MAX);
        assert_eq!(summary.expense_total, Decimal::MAX);
        assert_eq!(summary.net_outflow(), Decimal::MAX);

        let debts = vec![json!({"amount": Decimal::MIN.to_string()}); 2];
        let view = LedgerView::build(Vec::<Value>::new(), debts, SortState::default());
        assert_eq!(view.summary().expense_total, Decimal::MIN);
    }

    #[test]
    fn test_compare_text() {
        assert_eq!(compare_text("ABC", "abc"), Ordering::Equal);
        assert_eq!(compare_text("árbol", "Arbusto"), Ordering::Less);
        assert_eq!(compare_text("Compra", "Gasto"), Ordering::Less);
        assert_eq!(compare_text("a", "á"), Ordering::Less);
    }
}
