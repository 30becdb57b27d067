//! A combined ledger of purchases and expenses.
//!
//! Raw records from the backend are loosely typed: a purchase is recognized only by a non-null
//! `totalAmount`, amounts may be numbers or text, and dates come in several shapes. The [`model`]
//! module turns each record into a [`LedgerRow`] without ever failing, and [`build_ledger_view`]
//! merges, sorts and caps the rows for display.

pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod sources;
mod utils;
pub mod view;

pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use model::{Amount, LedgerRow, Record, RecordKind};
pub use view::{
    build_ledger_view, LedgerSummary, LedgerView, SortDirection, SortKey, SortState, PAGE_SIZE,
};
