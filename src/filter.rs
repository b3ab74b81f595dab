//! Inclusion filters.
//!
//! Filters are plain configuration values handed to a pipeline on each run.
//! A filter whose column is absent from the table is skipped entirely. When
//! the column is present, rows whose value is missing never match, even for
//! the default "everything" selection.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    data::{Value, parse_datetime},
    dataset::Table,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Failed to parse '{0}' as a date")]
    InvalidDate(String),
    #[error("Date range start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Values chosen for a membership filter. `None` selects every non-missing
/// value present in the column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(Option<BTreeSet<String>>);

impl Selection {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Some(values.into_iter().map(Into::into).collect()))
    }

    /// Builds a selection from repeated CLI values, each of which may hold a
    /// comma-separated list. No values at all means "everything".
    pub fn from_cli(values: &[String]) -> Self {
        let picked: BTreeSet<String> = values
            .iter()
            .flat_map(|v| v.split(','))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if picked.is_empty() {
            Self::all()
        } else {
            Self(Some(picked))
        }
    }

    pub fn is_all(&self) -> bool {
        self.0.is_none()
    }

    pub fn matches(&self, value: &Value) -> bool {
        if value.is_missing() {
            return false;
        }
        match &self.0 {
            None => true,
            Some(picked) => picked.contains(&value.as_display()),
        }
    }

    /// Restricts `table` to rows whose `column` is selected.
    pub fn apply(&self, table: &Table, column: &str) -> Table {
        let Some(values) = table.values(column) else {
            debug!("Column '{column}' absent; skipping its filter");
            return table.clone();
        };
        if let Some(picked) = &self.0 {
            let present: BTreeSet<String> = values.iter().map(Value::as_display).collect();
            for unknown in picked.iter().filter(|p| !present.contains(*p)) {
                warn!("Filter value '{unknown}' does not occur in column '{column}'");
            }
        }
        table.filter_rows(|idx| self.matches(&values[idx]))
    }
}

/// Inclusive range of calendar days. Unset bounds default to the earliest
/// and latest dates in the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, FilterError> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(FilterError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Resolves unset bounds against the date extent of `column`. Returns
    /// `None` when the column holds no dates.
    pub fn resolve(&self, table: &Table, column: &str) -> Option<(NaiveDate, NaiveDate)> {
        let (min, max) = date_extent(table, column)?;
        Some((self.start.unwrap_or(min), self.end.unwrap_or(max)))
    }

    pub fn apply(&self, table: &Table, column: &str) -> Table {
        let Some((start, end)) = self.resolve(table, column) else {
            return table.clone();
        };
        let Some(values) = table.values(column) else {
            return table.clone();
        };
        table.filter_rows(|idx| {
            values[idx]
                .as_date()
                .is_some_and(|dt| (start..=end).contains(&dt.date()))
        })
    }
}

pub fn date_extent(table: &Table, column: &str) -> Option<(NaiveDate, NaiveDate)> {
    let dates = table
        .values(column)?
        .iter()
        .filter_map(|v| v.as_date().map(|dt| dt.date()));
    dates.fold(None, |acc, date| match acc {
        None => Some((date, date)),
        Some((min, max)) => Some((min.min(date), max.max(date))),
    })
}

/// Parses a date bound supplied by the user: `YYYY-MM-DD`, or a slash date
/// read in the same day/month order as the data.
pub fn parse_date_bound(raw: &str, day_first: bool) -> Result<NaiveDate, FilterError> {
    parse_datetime(raw, day_first)
        .map(|dt| dt.date())
        .ok_or_else(|| FilterError::InvalidDate(raw.trim().to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFilters {
    pub regions: Selection,
    pub categories: Selection,
    pub dates: DateRange,
}

impl SalesFilters {
    pub fn apply(&self, table: &Table) -> Table {
        let filtered = self.regions.apply(table, "region");
        let filtered = self.categories.apply(&filtered, "category");
        let filtered = self.dates.apply(&filtered, "order_date");
        debug!(
            "Sales filters kept {} of {} row(s)",
            filtered.row_count(),
            table.row_count()
        );
        filtered
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnFilters {
    pub contracts: Selection,
}

impl ChurnFilters {
    pub fn apply(&self, table: &Table) -> Table {
        let filtered = self.contracts.apply(table, "contract");
        debug!(
            "Churn filters kept {} of {} row(s)",
            filtered.row_count(),
            table.row_count()
        );
        filtered
    }
}
