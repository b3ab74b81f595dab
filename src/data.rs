use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A single table cell.
///
/// `Missing` marks a cell that was absent in the source or could not be
/// coerced into the type a pipeline step asked for. Numbers are always finite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Missing,
}

impl Eq for Value {}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Date(dt) => format_datetime(dt),
            Value::Missing => String::new(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Number(_) => 1,
            Value::Date(_) => 2,
            Value::Text(_) => 3,
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            // -0.0 and 0.0 compare equal so they must hash equal
            Value::Number(n) => (if *n == 0.0 { 0.0f64 } else { *n }).to_bits().hash(state),
            Value::Date(dt) => dt.hash(state),
            Value::Missing => {}
        }
    }
}

/// Total order used for group keys and sorted option lists: missing first,
/// then numbers, dates, and text.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Missing, Value::Missing) => Ordering::Equal,
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Tokens read as missing when a CSV is loaded, mirroring the usual
/// spreadsheet/dataframe NA spellings.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_token(value: &str) -> bool {
    NA_TOKENS.contains(&value.trim())
}

/// Parses a finite number, returning `None` for NA tokens and anything else
/// that does not read as a float.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if is_na_token(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];
const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DAY_FIRST_DATETIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];
const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const MONTH_FIRST_DATETIME_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
const MONTH_FIRST_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y"];
const DAY_FIRST_SHORT_DATETIME_FORMATS: &[&str] = &["%d/%m/%y %H:%M:%S", "%d/%m/%y %H:%M"];
const DAY_FIRST_SHORT_DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];
const MONTH_FIRST_SHORT_DATETIME_FORMATS: &[&str] = &["%m/%d/%y %H:%M:%S", "%m/%d/%y %H:%M"];
const MONTH_FIRST_SHORT_DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m-%d-%y"];

type FormatSet = (&'static [&'static str], &'static [&'static str]);

/// Where the year sits in a numeric date, read from the width of its fields.
///
/// chrono's `%Y` accepts a year of any width, so `01/02/23` would match
/// `%Y/%m/%d` as year 1 unless the layout is chosen up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLayout {
    YearFirst,
    YearLast,
    ShortYearLast,
}

impl DateLayout {
    fn detect(value: &str) -> Option<Self> {
        let date_part = value.split([' ', 'T']).next()?;
        let fields: Vec<&str> = date_part.split(['-', '/', '.']).collect();
        let [first, _, last] = fields.as_slice() else {
            return None;
        };
        if !fields
            .iter()
            .all(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
        {
            return None;
        }
        match (first.len(), last.len()) {
            (4, _) => Some(Self::YearFirst),
            (_, 4) => Some(Self::YearLast),
            (_, 2) => Some(Self::ShortYearLast),
            _ => None,
        }
    }

    /// Format sets to try in order: the preferred day/month order first,
    /// then the other one.
    fn format_sets(self, day_first: bool) -> Vec<FormatSet> {
        let (day_first_set, month_first_set): (FormatSet, FormatSet) = match self {
            Self::YearFirst => return vec![(ISO_DATETIME_FORMATS, ISO_DATE_FORMATS)],
            Self::YearLast => (
                (DAY_FIRST_DATETIME_FORMATS, DAY_FIRST_DATE_FORMATS),
                (MONTH_FIRST_DATETIME_FORMATS, MONTH_FIRST_DATE_FORMATS),
            ),
            Self::ShortYearLast => (
                (DAY_FIRST_SHORT_DATETIME_FORMATS, DAY_FIRST_SHORT_DATE_FORMATS),
                (MONTH_FIRST_SHORT_DATETIME_FORMATS, MONTH_FIRST_SHORT_DATE_FORMATS),
            ),
        };
        if day_first {
            vec![day_first_set, month_first_set]
        } else {
            vec![month_first_set, day_first_set]
        }
    }
}

/// Parses a date or date-time.
///
/// A four-digit leading field selects the ISO layouts. Otherwise the year is
/// the last field (four digits, or two digits read as 1969-2068) and
/// `day_first` decides whether `01/02/2023` is the 1st of February or the 2nd
/// of January; a value that is impossible in the preferred order
/// (`25/12/2023` when month-first) falls back to the other order.
pub fn parse_datetime(value: &str, day_first: bool) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if is_na_token(trimmed) {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_local());
    }

    DateLayout::detect(trimmed)?
        .format_sets(day_first)
        .into_iter()
        .find_map(|(datetime_formats, date_formats)| {
            try_formats(trimmed, datetime_formats, date_formats)
        })
}

fn try_formats(value: &str, datetime_formats: &[&str], date_formats: &[&str]) -> Option<NaiveDateTime> {
    datetime_formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            date_formats
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Formats a number in its shortest form: whole values drop the fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub fn format_datetime(value: &NaiveDateTime) -> String {
    if value.num_seconds_from_midnight() == 0 && value.nanosecond() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn parse_number_rejects_text_and_na_tokens() {
        assert_eq!(parse_number(" 42.5 "), Some(42.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn parse_datetime_honours_day_first() {
        assert_eq!(parse_datetime("01/02/2023", true), Some(date(2023, 2, 1)));
        assert_eq!(parse_datetime("01/02/2023", false), Some(date(2023, 1, 2)));
    }

    #[test]
    fn parse_datetime_falls_back_when_preferred_order_is_impossible() {
        assert_eq!(parse_datetime("12/25/2023", true), Some(date(2023, 12, 25)));
        assert_eq!(parse_datetime("25/12/2023", false), Some(date(2023, 12, 25)));
    }

    #[test]
    fn parse_datetime_supports_iso_and_times() {
        assert_eq!(parse_datetime("2023-02-15", true), Some(date(2023, 2, 15)));
        let expected = NaiveDateTime::parse_from_str("2023-02-15 08:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(parse_datetime("2023-02-15T08:30:00", true), Some(expected));
        assert_eq!(parse_datetime("15/02/2023 08:30", true), Some(expected));
        assert_eq!(parse_datetime("not a date", true), None);
    }

    #[test]
    fn parse_datetime_reads_two_digit_years_at_the_end() {
        assert_eq!(parse_datetime("01/02/23", true), Some(date(2023, 2, 1)));
        assert_eq!(parse_datetime("01/02/23", false), Some(date(2023, 1, 2)));
        assert_eq!(parse_datetime("25-12-99", true), Some(date(1999, 12, 25)));
        assert_eq!(parse_datetime("13/12/23", false), Some(date(2023, 12, 13)));
        assert_eq!(
            parse_datetime("15/02/23 08:30", true),
            Some(date(2023, 2, 15).with_hour(8).unwrap().with_minute(30).unwrap())
        );
    }

    #[test]
    fn parse_datetime_rejects_short_leading_years() {
        assert_eq!(parse_datetime("23/02/01x", true), None);
        assert_eq!(parse_datetime("1/2/3", true), None);
        assert_eq!(parse_datetime("20230101", true), None);
        assert_eq!(parse_datetime("123/02/2023", true), None);
    }

    #[test]
    fn display_round_trips_through_parsers() {
        let dt = date(2023, 2, 1);
        assert_eq!(Value::Date(dt).as_display(), "2023-02-01");
        assert_eq!(parse_datetime(&Value::Date(dt).as_display(), true), Some(dt));
        assert_eq!(Value::Number(300.0).as_display(), "300");
        assert_eq!(Value::Number(0.1 + 0.2).as_display(), (0.1f64 + 0.2).to_string());
        assert_eq!(Value::Missing.as_display(), "");
    }

    #[test]
    fn ordering_is_total_across_variants() {
        let mut values = vec![
            Value::Text("b".into()),
            Value::Number(2.0),
            Value::Missing,
            Value::Text("a".into()),
            Value::Number(-1.0),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Missing,
                Value::Number(-1.0),
                Value::Number(2.0),
                Value::Text("a".into()),
                Value::Text("b".into()),
            ]
        );
    }

    #[test]
    fn signed_zero_hashes_as_one_value() {
        let set: HashSet<Value> = [Value::Number(0.0), Value::Number(-0.0)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
