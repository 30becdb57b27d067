//! Types that represent the ledger data model: raw purchase and expense records as they come from
//! the backend, and the normalized rows derived from them.
mod amount;
mod date;
mod record;
mod row;

use rust_decimal::Decimal;

pub use amount::{parse_amount, parse_amount_text, Amount};
pub use date::RecordDate;
pub use record::{
    Expense, Purchase, Record, RecordKind, EXPENSE_LABEL, INVOICE, NO_PAYMENT_METHOD,
    PURCHASE_LABEL,
};
pub use row::LedgerRow;

/// The tax rate included in invoice totals: 19%.
pub const TAX_RATE: Decimal = Decimal::from_parts(19, 0, 0, false, 2);
