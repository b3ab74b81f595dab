//! Column name standardization.
//!
//! Names are trimmed, lowercased, and have each space replaced with an
//! underscore. Nothing else is touched: punctuation survives, and names that
//! collapse onto each other resolve last-wins.

use log::debug;

use crate::dataset::Table;

pub fn standardize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

pub fn standardize_columns(table: Table) -> Table {
    let table = table.rename_columns(standardize_name);
    debug!("Standardized columns: {}", table.column_names().join(", "));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::Column, data::Value};

    #[test]
    fn standardize_name_trims_lowercases_and_underscores() {
        assert_eq!(standardize_name("  Order Date "), "order_date");
        assert_eq!(standardize_name("Product Name"), "product_name");
        assert_eq!(standardize_name("Sub-Category"), "sub-category");
        assert_eq!(standardize_name("Total  Charges"), "total__charges");
    }

    #[test]
    fn standardize_columns_keeps_order_and_values() {
        let table = Table::from_columns(vec![
            Column::new("Order Date", vec![Value::Text("01/02/2023".into())]),
            Column::new(" Sales", vec![Value::Number(100.0)]),
        ]);
        let table = standardize_columns(table);
        assert_eq!(table.column_names(), vec!["order_date", "sales"]);
        assert_eq!(table.values("sales").unwrap(), &[Value::Number(100.0)]);
    }
}
