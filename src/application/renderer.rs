//! Tabular rendering of fetch results

use std::collections::HashMap;
use std::io::Write;

use tracing::{debug, error, info};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{FetchResult, Row};

/// Named columns and string cells, rows in delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Convert rows to a table.
    ///
    /// Columns appear in the order their keys are first seen. A row missing a
    /// column gets an empty cell there. Cells must be scalars; a nested
    /// object or array makes the rows unconvertible.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Result<Table, String> {
        let rows: Vec<&Row> = rows.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for row in &rows {
            for key in row.keys() {
                if !index.contains_key(key.as_str()) {
                    index.insert(key.as_str(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let mut cells = Vec::with_capacity(rows.len());
        for (n, row) in rows.iter().enumerate() {
            let mut record = vec![String::new(); columns.len()];
            for (key, value) in row.iter() {
                let cell = cell_text(value)
                    .ok_or_else(|| format!("row {} column '{}' holds a nested value", n + 1, key))?;
                record[index[key.as_str()]] = cell;
            }
            cells.push(record);
        }

        Ok(Table {
            columns,
            rows: cells,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => Some(String::new()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

/// What happened to one rendered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written { rows: usize },
    FetchFailed,
    RenderFailed,
    WriteFailed,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Written { .. })
    }
}

/// Writes results as delimited text with a header row and no index column.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    delimiter: u8,
}

impl Default for Renderer {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl Renderer {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Render `result` to `sink`.
    ///
    /// Failures produce exactly one diagnostic event (naming `label` and the
    /// reason) and leave the sink untouched. Output is encoded in full before
    /// the first byte reaches the sink.
    pub fn render<W: Write>(&self, label: &str, result: &FetchResult, sink: &mut W) -> Outcome {
        let rows = match result {
            FetchResult::Failure(failure) => {
                error!(command = label, reason = %failure, "could not pull {}", label);
                return Outcome::FetchFailed;
            }
            FetchResult::Page(_) | FetchResult::Stream(_) => result.rows(),
        };

        let table = match Table::from_rows(rows) {
            Ok(table) => table,
            Err(reason) => {
                let err = ApplicationError::Render {
                    label: label.to_string(),
                    reason,
                };
                error!(command = label, reason = %err, "could not convert {} to a table", label);
                return Outcome::RenderFailed;
            }
        };
        if table.is_empty() {
            info!(command = label, "no rows returned");
            return Outcome::Written { rows: 0 };
        }

        let written = self
            .encode(label, &table)
            .and_then(|bytes| write_all(label, sink, &bytes));
        match written {
            Ok(()) => {
                debug!(command = label, rows = table.rows.len(), "wrote table");
                Outcome::Written {
                    rows: table.rows.len(),
                }
            }
            Err(err) => {
                error!(command = label, reason = %err, "could not write {} output", label);
                Outcome::WriteFailed
            }
        }
    }

    /// Delimited text for `table`, header first.
    pub fn encode(&self, label: &str, table: &Table) -> ApplicationResult<Vec<u8>> {
        let write_err = |source: std::io::Error| ApplicationError::Write {
            label: label.to_string(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());
        writer
            .write_record(&table.columns)
            .map_err(|e| write_err(e.into()))?;
        for row in &table.rows {
            writer.write_record(row).map_err(|e| write_err(e.into()))?;
        }
        writer.into_inner().map_err(|e| write_err(e.into_error()))
    }
}

fn write_all<W: Write>(label: &str, sink: &mut W, bytes: &[u8]) -> ApplicationResult<()> {
    sink.write_all(bytes)
        .and_then(|()| sink.flush())
        .map_err(|source| ApplicationError::Write {
            label: label.to_string(),
            source,
        })
}
