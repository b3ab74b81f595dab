//! In-memory tabular dataset.
//!
//! A [`Table`] is an ordered list of named columns of equal length. Rows keep
//! the order they had in the source file. Pipelines never mutate a table they
//! were handed by reference; row-level operations either consume the table or
//! return a new one.

use std::{
    collections::HashSet,
    io::{Read, Write},
    path::Path,
};

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::{debug, warn};
use serde::Serialize;

use crate::{
    data::{Value, is_na_token, parse_number},
    io_utils,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Builds a column from raw text cells, reading NA tokens as missing and
    /// typing the column as numeric when every other cell parses as a number.
    pub fn from_raw(name: impl Into<String>, raw: Vec<String>) -> Self {
        let numeric = raw
            .iter()
            .filter(|cell| !is_na_token(cell))
            .all(|cell| parse_number(cell).is_some());
        let values = raw
            .into_iter()
            .map(|cell| {
                if is_na_token(&cell) {
                    Value::Missing
                } else if numeric {
                    parse_number(&cell).map_or(Value::Missing, Value::Number)
                } else {
                    Value::Text(cell)
                }
            })
            .collect();
        Self::new(name, values)
    }

    pub fn has_text(&self) -> bool {
        self.values.iter().any(|v| matches!(v, Value::Text(_)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn from_columns(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].values.len() == w[1].values.len()),
            "columns must have equal length"
        );
        Self { columns }
    }

    /// Builds a table from raw text rows, inferring numeric columns.
    pub fn from_raw_rows(headers: &[String], rows: Vec<Vec<String>>) -> Self {
        let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for row in rows {
            let mut row = row.into_iter();
            for column in cells.iter_mut() {
                column.push(row.next().unwrap_or_default());
            }
        }
        let columns = mangle_duplicate_headers(headers)
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| Column::from_raw(name, raw))
            .collect();
        Self::from_columns(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Values of `name`, or `None` when the column is absent.
    pub fn values(&self, name: &str) -> Option<&[Value]> {
        self.column(name).map(|c| c.values.as_slice())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn row(&self, idx: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }

    /// Replaces the column named `name`, or appends it when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert!(self.columns.is_empty() || values.len() == self.row_count());
        match self.column_mut(name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column::new(name, values)),
        }
    }

    /// Applies `f` to every cell of `name`. Absent columns are left alone.
    pub fn map_column<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnMut(Value) -> Value,
    {
        let Some(column) = self.column_mut(name) else {
            return false;
        };
        column.values = std::mem::take(&mut column.values)
            .into_iter()
            .map(f)
            .collect();
        true
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.name != name);
        before != self.columns.len()
    }

    /// Renames every column with `f`. When two names collapse onto the same
    /// result, the later column wins and takes the earlier one's position.
    pub fn rename_columns<F>(self, mut f: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        let mut renamed: Vec<Column> = Vec::with_capacity(self.columns.len());
        for mut column in self.columns {
            column.name = f(&column.name);
            if let Some(existing) = renamed.iter_mut().find(|c| c.name == column.name) {
                warn!("Column '{}' appears more than once; keeping the last", column.name);
                *existing = column;
            } else {
                renamed.push(column);
            }
        }
        Self { columns: renamed }
    }

    /// Keeps the rows whose index satisfies `keep`, returning a new table.
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let mask: Vec<bool> = (0..self.row_count()).map(&mut keep).collect();
        self.select_rows(&mask)
    }

    fn select_rows(&self, mask: &[bool]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let values = column
                    .values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(value, _)| value.clone())
                    .collect();
                Column::new(column.name.clone(), values)
            })
            .collect();
        Self { columns }
    }

    /// Removes rows identical in every column to an earlier row.
    pub fn drop_duplicate_rows(self) -> Self {
        let mut seen = HashSet::with_capacity(self.row_count());
        let mask: Vec<bool> = (0..self.row_count())
            .map(|idx| seen.insert(self.row(idx)))
            .collect();
        let deduped = self.select_rows(&mask);
        debug!(
            "Dropped {} duplicate row(s)",
            self.row_count() - deduped.row_count()
        );
        deduped
    }

    /// Removes rows with a missing value in any of `required`. Absent
    /// columns count as missing for every row.
    pub fn drop_rows_missing(self, required: &[&str]) -> Self {
        let columns: Vec<Option<&[Value]>> = required.iter().map(|name| self.values(name)).collect();
        self.filter_rows(|idx| {
            columns
                .iter()
                .all(|values| values.is_some_and(|values| !values[idx].is_missing()))
        })
    }

    pub fn head(&self, rows: usize) -> Self {
        let limit = rows.min(self.row_count());
        self.filter_rows(|idx| idx < limit)
    }

    /// Distinct non-missing values of `name` in ascending order.
    pub fn distinct_values(&self, name: &str) -> Vec<Value> {
        let Some(values) = self.values(name) else {
            return Vec::new();
        };
        let mut distinct: Vec<Value> = values
            .iter()
            .filter(|v| !v.is_missing())
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        distinct.sort();
        distinct
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        (0..self.row_count())
            .map(|idx| self.row(idx).into_iter().map(Value::as_display).collect())
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        writer
            .write_record(self.columns.iter().map(|c| c.name.as_str()))
            .context("Writing CSV headers")?;
        for (idx, row) in self.display_rows().into_iter().enumerate() {
            writer
                .write_record(&row)
                .with_context(|| format!("Writing CSV row {}", idx + 2))?;
        }
        writer.flush().context("Flushing CSV writer")?;
        Ok(())
    }
}

/// Suffixes repeated header names with `.1`, `.2`, ... so every column stays
/// addressable.
fn mangle_duplicate_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    headers
        .iter()
        .map(|header| {
            let mut candidate = header.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{header}.{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}

pub fn read_csv(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    read_table(reader, encoding).with_context(|| format!("Reading CSV from {path:?}"))
}

pub fn read_csv_from<R: Read>(input: R, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    read_table(io_utils::open_csv_reader(input, delimiter), encoding)
}

fn read_table<R: Read>(mut reader: csv::Reader<R>, encoding: &'static Encoding) -> Result<Table> {
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        bail!("CSV input has no header row");
    }
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)?;
        if decoded.len() > headers.len() {
            bail!(
                "Row {} has {} field(s) but the header declares {}",
                row_idx + 2,
                decoded.len(),
                headers.len()
            );
        }
        rows.push(decoded);
    }
    Ok(Table::from_raw_rows(&headers, rows))
}
