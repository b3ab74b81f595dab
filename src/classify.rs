use std::fmt;

use serde::Serialize;

use crate::dataset::Table;

pub const SALES_REQUIRED_COLUMNS: &[&str] = &["order_date", "sales"];
pub const CHURN_REQUIRED_COLUMNS: &[&str] = &["churn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Sales,
    Churn,
    Unknown,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DatasetKind::Sales => "sales",
            DatasetKind::Churn => "churn",
            DatasetKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Classifies a table from its standardized column names. Sales is checked
/// before churn, so a table carrying both shapes is always sales.
pub fn classify(table: &Table) -> DatasetKind {
    let has_all = |required: &[&str]| required.iter().all(|name| table.has_column(name));
    if has_all(SALES_REQUIRED_COLUMNS) {
        DatasetKind::Sales
    } else if has_all(CHURN_REQUIRED_COLUMNS) {
        DatasetKind::Churn
    } else {
        DatasetKind::Unknown
    }
}

/// Informational result for a table matching neither supported shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownDataset {
    pub columns: Vec<String>,
}

impl UnknownDataset {
    pub fn from_table(table: &Table) -> Self {
        Self {
            columns: table.headers(),
        }
    }
}

impl fmt::Display for UnknownDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Unknown dataset format.")?;
        writeln!(f, "Sales needs at least: {}", SALES_REQUIRED_COLUMNS.join(", "))?;
        writeln!(f, "Churn needs at least: {}", CHURN_REQUIRED_COLUMNS.join(", "))?;
        writeln!(f, "Your columns are:")?;
        write!(f, "{}", self.columns.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn table_with(names: &[&str]) -> Table {
        Table::from_columns(names.iter().map(|n| Column::new(*n, Vec::new())).collect())
    }

    #[test]
    fn classify_requires_both_sales_columns() {
        assert_eq!(classify(&table_with(&["order_date", "sales"])), DatasetKind::Sales);
        assert_eq!(classify(&table_with(&["sales"])), DatasetKind::Unknown);
        assert_eq!(classify(&table_with(&["order_date"])), DatasetKind::Unknown);
    }

    #[test]
    fn classify_prefers_sales_over_churn() {
        assert_eq!(
            classify(&table_with(&["churn", "sales", "order_date"])),
            DatasetKind::Sales
        );
        assert_eq!(classify(&table_with(&["churn", "sales"])), DatasetKind::Churn);
    }

    #[test]
    fn unknown_message_lists_actual_columns() {
        let message = UnknownDataset::from_table(&table_with(&["foo", "bar"])).to_string();
        assert!(message.contains("Sales needs at least: order_date, sales"));
        assert!(message.contains("Churn needs at least: churn"));
        assert!(message.ends_with("foo, bar"));
    }
}
