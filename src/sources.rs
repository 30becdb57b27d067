//! Loading of the purchase and expense collections that feed the ledger view.
//!
//! Both collections are read concurrently. A collection that is missing or malformed is replaced
//! by an empty one so that the other can still be shown.

use crate::model::Record;
use crate::{utils, Result};
use anyhow::bail;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// The two raw collections behind a ledger view.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sources {
    pub purchases: Vec<Record>,
    pub expenses: Vec<Record>,
}

impl Sources {
    /// Reads both collections at the same time. Each one falls back to empty on its own.
    pub async fn load(purchases: &Path, expenses: &Path) -> Self {
        let (purchases, expenses) = tokio::join!(
            load_or_empty("purchases", purchases),
            load_or_empty("expenses", expenses)
        );
        Self {
            purchases,
            expenses,
        }
    }
}

async fn load_or_empty(name: &str, path: &Path) -> Vec<Record> {
    match load_collection(path).await {
        Ok(records) => {
            debug!("Loaded {} {name} from {}", records.len(), path.display());
            records
        }
        Err(e) => {
            warn!("Unable to load {name}, showing none: {e:#}");
            Vec::new()
        }
    }
}

/// Reads a JSON array of raw records. Individual elements are never rejected.
pub async fn load_collection(path: &Path) -> Result<Vec<Record>> {
    let value: Value = utils::deserialize(path).await?;
    match value {
        Value::Array(items) => Ok(items.into_iter().map(Record::from).collect()),
        other => bail!(
            "Expected a JSON array of records in {}, found {}",
            path.display(),
            json_type(&other)
        ),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
