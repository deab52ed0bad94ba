//! Turns a raw portfolio response into a [`Snapshot`].
//!
//! Every key whose value is a JSON object becomes a column; the union of the
//! object keys becomes the row index. `spotrefs` is always the first column.
//! The scalar `pv` key becomes the portfolio value.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{RawResponse, Snapshot, SnapshotRow};

pub const PORTFOLIO_VALUE_KEY: &str = "pv";
pub const LEADING_COLUMN: &str = "spotrefs";

/// Normalize `raw`, stamping the snapshot with the current UTC time.
pub fn normalize(raw: &RawResponse) -> Snapshot {
    normalize_at(raw, Utc::now())
}

/// Normalize `raw` with an explicit publish timestamp.
pub fn normalize_at(raw: &RawResponse, published_at: DateTime<Utc>) -> Snapshot {
    let mut columns: Vec<(&str, &Map<String, Value>)> = raw
        .iter()
        .filter_map(|(key, value)| value.as_object().map(|mapping| (key.as_str(), mapping)))
        .collect();

    // Row order follows raw key order, before spotrefs is moved up.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut row_ids: Vec<&str> = Vec::new();
    for (_, mapping) in &columns {
        for row_id in mapping.keys() {
            if seen.insert(row_id.as_str()) {
                row_ids.push(row_id.as_str());
            }
        }
    }

    if let Some(pos) = columns.iter().position(|(name, _)| *name == LEADING_COLUMN) {
        let leading = columns.remove(pos);
        columns.insert(0, leading);
    }

    let rows = row_ids
        .iter()
        .map(|row_id| {
            let cells = columns
                .iter()
                .map(|(_, mapping)| mapping.get(*row_id).filter(|v| !v.is_null()).cloned())
                .collect();
            SnapshotRow::new(row_id.to_string(), cells)
        })
        .collect();

    let column_names = columns.iter().map(|(name, _)| name.to_string()).collect();

    Snapshot::new(column_names, rows, portfolio_value(raw), published_at)
}

/// `pv` as a number; strings holding a number are accepted, anything else is `None`.
fn portfolio_value(raw: &RawResponse) -> Option<f64> {
    match raw.get(PORTFOLIO_VALUE_KEY)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
