use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// One row of a snapshot: the row identifier and one optional cell per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    id: String,
    cells: Vec<Option<Value>>,
}

impl SnapshotRow {
    pub(crate) fn new(id: String, cells: Vec<Option<Value>>) -> Self {
        Self { id, cells }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cells in column order; `None` where the column had no entry for this row.
    pub fn cells(&self) -> &[Option<Value>] {
        &self.cells
    }
}

/// Normalized, immutable view of one portfolio response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    columns: Vec<String>,
    rows: Vec<SnapshotRow>,
    portfolio_value: Option<f64>,
    last_published: DateTime<Utc>,
    /// Row id -> position in `rows`.
    #[serde(skip)]
    row_index: HashMap<String, usize>,
}

impl Snapshot {
    pub(crate) fn new(
        columns: Vec<String>,
        rows: Vec<SnapshotRow>,
        portfolio_value: Option<f64>,
        last_published: DateTime<Utc>,
    ) -> Self {
        debug_assert!(rows.iter().all(|row| row.cells.len() == columns.len()));
        let row_index = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.id.clone(), idx))
            .collect();
        Self {
            columns,
            rows,
            portfolio_value,
            last_published,
            row_index,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    pub fn row_ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.id.as_str())
    }

    pub fn portfolio_value(&self) -> Option<f64> {
        self.portfolio_value
    }

    pub fn last_published(&self) -> DateTime<Utc> {
        self.last_published
    }

    /// ISO-8601 form of `last_published`.
    pub fn last_published_iso(&self) -> String {
        self.last_published.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// True when the response carried no column mappings.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row(&self, row_id: &str) -> Option<&SnapshotRow> {
        self.row_index.get(row_id).and_then(|&idx| self.rows.get(idx))
    }

    /// Cell at (`row_id`, `column`), `None` when either is unknown or the cell is missing.
    pub fn cell(&self, row_id: &str, column: &str) -> Option<&Value> {
        let col_idx = self.columns.iter().position(|c| c == column)?;
        self.row(row_id)?.cells.get(col_idx)?.as_ref()
    }

    /// Flatten into a 2-D grid: a header row (blank corner, then column names)
    /// followed by one row per identifier. Missing cells become empty strings.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(String::new());
        header.extend(self.columns.iter().cloned());
        grid.push(header);

        for row in &self.rows {
            let mut line = Vec::with_capacity(row.cells.len() + 1);
            line.push(row.id.clone());
            line.extend(row.cells.iter().map(|cell| render_cell(cell.as_ref())));
            grid.push(line);
        }

        grid
    }
}

/// Plain-text form of a cell: strings without quotes, missing as empty.
pub fn render_cell(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
