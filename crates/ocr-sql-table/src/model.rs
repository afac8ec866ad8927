use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Largest integer an `f64` holds exactly; integral numbers below it are
/// emitted as JSON integers.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

static LEADING_FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Reads the longest numeric prefix of the trimmed cell, so `90%` and
    /// `85pts` become numbers. Cells without one, or whose prefix is not
    /// finite, stay text.
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        match leading_float(trimmed) {
            Some(number) => Self::Number(number),
            None => Self::Text(trimmed.to_string()),
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    fn as_exact_integer(number: f64) -> Option<i64> {
        if number.fract() != 0.0 || number.abs() >= MAX_EXACT_INTEGER {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let integer = number as i64;
        Some(integer)
    }
}

/// Finite float parsed from the start of `text`, ignoring any trailing
/// characters.
pub(crate) fn leading_float(text: &str) -> Option<f64> {
    let prefix = LEADING_FLOAT_RE.find(text)?;
    prefix
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => match Self::as_exact_integer(*number) {
                Some(integer) => write!(f, "{integer}"),
                None => write!(f, "{number}"),
            },
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Number(number) => match Self::as_exact_integer(*number) {
                Some(integer) => serializer.serialize_i64(integer),
                None => serializer.serialize_f64(*number),
            },
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Ordered column → value mapping. Keys are unique; re-inserting a key
/// overwrites the value without moving the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    cells: Vec<(String, CellValue)>,
}

impl TableRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        let key = key.into();
        if let Some(slot) = self.cells.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = value;
        } else {
            self.cells.push((key, value));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K> FromIterator<(K, CellValue)> for TableRow
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

impl Serialize for TableRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, value) in &self.cells {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSetKind {
    /// Rows reconstructed from a detected header and aligned data lines.
    Table,
    /// Scalar aggregate wrapped as `[{"count": N}]`.
    Count,
    /// Placeholder rows guessed from name/number pairs.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRowSet {
    pub kind: RowSetKind,
    pub rows: Vec<TableRow>,
}

impl TableRowSet {
    #[must_use]
    pub fn count(value: f64) -> Self {
        let mut row = TableRow::new();
        row.insert("count", CellValue::Number(value));
        Self {
            kind: RowSetKind::Count,
            rows: vec![row],
        }
    }

    /// One row with one column whose name mentions "count".
    #[must_use]
    pub fn is_count_result(&self) -> bool {
        let [row] = self.rows.as_slice() else {
            return false;
        };
        row.len() == 1
            && row
                .keys()
                .next()
                .is_some_and(|key| key.to_ascii_lowercase().contains("count"))
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.kind == RowSetKind::Synthetic
    }

    /// Union of row keys in first-seen order.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !headers.iter().any(|existing| existing == key) {
                    headers.push(key.to_string());
                }
            }
        }
        headers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(i64),
    Text(String),
}

impl ConditionValue {
    /// Integer when the digits fit an `i64`, text otherwise.
    #[must_use]
    pub fn from_digits(digits: &str) -> Self {
        digits
            .parse::<i64>()
            .map_or_else(|_| Self::Text(digits.to_string()), Self::Number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: ConditionValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryAnalysis {
    pub is_count_query: bool,
    pub has_filter: bool,
    pub tables: Vec<String>,
    pub conditions: Vec<Condition>,
    pub count_target: Option<String>,
    pub filter_field: Option<String>,
    pub filter_operator: Option<String>,
    pub filter_value: Option<ConditionValue>,
}
