//! Column type coercion.
//!
//! Both coercers are permissive: an absent column is a no-op and a cell that
//! cannot be read as the target type becomes [`Value::Missing`].

use log::debug;

use crate::{
    data::{Value, parse_datetime, parse_number},
    dataset::Table,
};

pub fn ensure_numeric(mut table: Table, column: &str) -> Table {
    let coerced = table.map_column(column, |value| match value {
        Value::Number(_) | Value::Missing => value,
        Value::Text(text) => parse_number(&text).map_or(Value::Missing, Value::Number),
        Value::Date(_) => Value::Missing,
    });
    if coerced {
        debug!("Coerced '{column}' to numeric");
    }
    table
}

/// Numbers are read through their text form, so `20230101` is not treated
/// as an epoch offset and becomes missing.
pub fn ensure_datetime(mut table: Table, column: &str, day_first: bool) -> Table {
    let coerced = table.map_column(column, |value| match value {
        Value::Date(_) | Value::Missing => value,
        Value::Text(text) => parse_datetime(&text, day_first).map_or(Value::Missing, Value::Date),
        Value::Number(n) => parse_datetime(&n.to_string(), day_first).map_or(Value::Missing, Value::Date),
    });
    if coerced {
        debug!("Coerced '{column}' to date-time (day first: {day_first})");
    }
    table
}
