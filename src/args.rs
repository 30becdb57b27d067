//! These structs provide the CLI interface for the ledger CLI.

use crate::commands::OutputFormat;
use crate::view::{SortDirection, SortKey};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledger: A command-line view of purchases and expenses.
///
/// Purchases and expenses exported from the backend as JSON arrays are merged into a single table
/// of at most 10 rows with gross amounts, tax-exclusive net amounts and payment methods. Invoice
/// purchases have their 19% recoverable tax removed from the net amount.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the ledger home directory and its configuration file.
    ///
    /// After this, place the exported purchases in `$LEDGER_HOME/purchases.json` and expenses in
    /// `$LEDGER_HOME/expenses.json`, or point `purchases_path` and `expenses_path` in
    /// `config.json` elsewhere.
    Init,
    /// Print the combined ledger of purchases and expenses.
    View(ViewArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where ledger configuration is held. Defaults to ~/ledger
    #[arg(long, env = "LEDGER_HOME", default_value_t = default_ledger_home())]
    ledger_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home: ledger_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &DisplayPath {
        &self.ledger_home
    }
}

/// (Not shown): Args for the `ledger view` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ViewArgs {
    /// A JSON array of purchase records. Overrides `purchases_path` from the config file.
    #[arg(long)]
    purchases: Option<PathBuf>,

    /// A JSON array of expense records. Overrides `expenses_path` from the config file.
    #[arg(long)]
    expenses: Option<PathBuf>,

    /// Select a column to sort by: date, kind, label, gross, net or paymentMethod. May be given
    /// more than once; each occurrence acts like clicking the column header, so repeating a
    /// column flips its direction. The view starts sorted by date, newest first.
    #[arg(long = "sort")]
    sort: Vec<SortKey>,

    /// Force the sort direction, asc or desc, after all --sort selections are applied.
    #[arg(long)]
    direction: Option<SortDirection>,

    /// How to print the view. Defaults to `output_format` from the config file.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl ViewArgs {
    pub fn new(
        purchases: Option<PathBuf>,
        expenses: Option<PathBuf>,
        sort: Vec<SortKey>,
        direction: Option<SortDirection>,
        format: Option<OutputFormat>,
    ) -> Self {
        Self {
            purchases,
            expenses,
            sort,
            direction,
            format,
        }
    }

    pub fn purchases(&self) -> Option<&Path> {
        self.purchases.as_deref()
    }

    pub fn expenses(&self) -> Option<&Path> {
        self.expenses.as_deref()
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.direction
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }
}

fn default_ledger_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_HOME instead of relying on the default \
                ledger home directory.",
            );
            PathBuf::from("ledger")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
