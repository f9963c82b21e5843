/// Table: in-memory tabular dataset
///
/// Rows are documents, columns are field names in first-seen order. Cells are
/// JSON values; `Value::Null` is a missing value. Persisted as CSV with a
/// header row and no index column.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from flat records. The column set is the union of all
    /// record keys; a record lacking a key gets a missing cell there.
    pub fn from_records(records: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for record in &records {
            for key in record.keys() {
                if !positions.contains_key(key) {
                    positions.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|column| record.remove(column).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Rename a column in place. Returns false if `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.columns.iter_mut().find(|c| c.as_str() == from) {
            Some(column) => {
                *column = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a column and its cells. Returns false if it was absent.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.columns.iter().position(|c| c == name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Replace every string cell equal to `sentinel` with a missing value.
    /// Returns the number of cells replaced.
    pub fn replace_with_missing(&mut self, sentinel: &str) -> usize {
        let mut replaced = 0;
        for cell in self.rows.iter_mut().flatten() {
            if matches!(cell, Value::String(s) if s.as_str() == sentinel) {
                *cell = Value::Null;
                replaced += 1;
            }
        }
        replaced
    }

    /// Write the table as CSV, header first, missing cells as empty fields.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(cell_to_field))?;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Read a CSV file written by [`Table::write_csv`]. Empty fields load as
    /// missing; numeric and boolean fields are parsed back to their types.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;

        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let mut table = Table::new(columns);

        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(field_to_cell).collect());
        }

        debug!("Read {} rows from {}", table.num_rows(), path.display());
        Ok(table)
    }
}

fn cell_to_field(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn field_to_cell(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = field.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    match field {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(field.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_records_unions_columns() {
        let table = Table::from_records(vec![
            record(json!({"Word": "He", "Tag": "O"})),
            record(json!({"Word": "Paris", "POS": "NNP"})),
        ]);

        assert_eq!(table.columns(), &["Word", "Tag", "POS"]);
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.column("POS").unwrap(), vec![&Value::Null, &json!("NNP")]);
    }

    #[test]
    fn test_rename_and_drop() {
        let mut table = Table::from_records(vec![record(json!({"a": 1, "b": 2}))]);

        assert!(table.rename_column("a", "x"));
        assert!(!table.rename_column("missing", "y"));
        assert!(table.drop_column("b"));
        assert_eq!(table.columns(), &["x"]);
        assert_eq!(table.rows()[0], vec![json!(1)]);
    }

    #[test]
    fn test_replace_with_missing_only_exact_strings() {
        let mut table = Table::from_records(vec![
            record(json!({"a": "na", "b": "nan"})),
            record(json!({"a": 3, "b": "na"})),
        ]);

        assert_eq!(table.replace_with_missing("na"), 2);
        assert_eq!(table.column("a").unwrap(), vec![&Value::Null, &json!(3)]);
        assert_eq!(table.column("b").unwrap(), vec![&json!("nan"), &Value::Null]);
    }

    #[test]
    fn test_csv_preserves_missing_and_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");

        let table = Table::from_records(vec![
            record(json!({"Sentence": 1, "Word": "Thousands, of", "Tag": "O"})),
            record(json!({"Sentence": null, "Word": "demonstrators", "Tag": "O"})),
        ]);
        table.write_csv(&path).unwrap();

        let loaded = Table::read_csv(&path).unwrap();
        assert_eq!(loaded, table);
    }
}
