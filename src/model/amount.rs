//! Monetary values for ledger rows.
//!
//! Amounts arrive from the backend either as JSON numbers or as free text such as `"$ 1190"`.
//! [`parse_amount`] turns either form into a `Decimal` and never fails: malformed text degrades to
//! zero. The [`Amount`] type wraps a `Decimal` and knows how to display it.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Converts a loosely-typed monetary value into a `Decimal`.
///
/// - A JSON number is returned unchanged.
/// - Text has every character that is not an ASCII digit, a period or a minus sign removed and the
///   remainder is parsed as a decimal. Anything that does not parse yields zero.
/// - Every other JSON type yields zero.
///
/// # Examples
///
/// ```
/// # use ledger_view::model::parse_amount;
/// # use rust_decimal::Decimal;
/// # use serde_json::json;
/// assert_eq!(parse_amount(&json!(1200)), Decimal::from(1200));
/// assert_eq!(parse_amount(&json!("$ 1200")), Decimal::from(1200));
/// assert_eq!(parse_amount(&json!("abc")), Decimal::ZERO);
/// ```
pub fn parse_amount(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => number_to_decimal(n),
        Value::String(s) => parse_amount_text(s),
        other => {
            trace!("Amount of unexpected JSON type treated as zero: {other}");
            Decimal::ZERO
        }
    }
}

/// Parses monetary text after stripping everything except digits, periods and minus signs.
pub fn parse_amount_text(s: &str) -> Decimal {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    // Decimal::from_str wants digits on both sides of the point
    let (sign, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", cleaned.as_str()),
    };
    let unsigned = unsigned.strip_suffix('.').unwrap_or(unsigned);
    let candidate = if unsigned.starts_with('.') {
        format!("{sign}0{unsigned}")
    } else {
        format!("{sign}{unsigned}")
    };

    match Decimal::from_str(&candidate) {
        Ok(value) => value,
        Err(e) => {
            trace!("Unable to parse amount '{s}' (cleaned to '{cleaned}'): {e}");
            Decimal::ZERO
        }
    }
}

fn number_to_decimal(n: &Number) -> Decimal {
    if let Some(i) = n.as_i64() {
        return Decimal::from(i);
    }
    if let Some(u) = n.as_u64() {
        return Decimal::from(u);
    }
    match n.as_f64().and_then(Decimal::from_f64) {
        Some(value) => value,
        None => {
            trace!("Number {n} cannot be represented as a decimal, treating as zero");
            Decimal::ZERO
        }
    }
}

/// Represents a dollar amount for display.
///
/// # Examples
///
/// ```
/// # use ledger_view::Amount;
/// # use rust_decimal::Decimal;
/// let amount = Amount::new(Decimal::from(-1190));
/// assert_eq!(amount.to_string(), "-$1,190.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.is_zero()
    }
}

impl FromStr for Amount {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Amount::new(parse_amount_text(s)))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.value.abs().to_f64().unwrap_or_default();
        write!(f, "{sign}${}", format_num::format_num!(",.2", num))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
