use std::sync::LazyLock;

use regex::Regex;

use crate::model::{CellValue, RowSetKind, TableRow, TableRowSet};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z]+\s+[A-Za-z]+)").expect("valid regex"));

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{2,3})\b").expect("valid regex"));

/// Placeholder `Student`/`Score` rows for lines that pair a two-word name
/// with a two or three digit number. These are guesses, not extracted
/// cells, and are tagged [`RowSetKind::Synthetic`].
pub(crate) fn synthesize_rows(lines: &[&str]) -> Option<TableRowSet> {
    let rows = lines
        .iter()
        .filter_map(|line| synthesize_row(line.trim()))
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return None;
    }

    Some(TableRowSet {
        kind: RowSetKind::Synthetic,
        rows,
    })
}

fn synthesize_row(line: &str) -> Option<TableRow> {
    let name = NAME_RE.captures(line)?.get(1)?.as_str();
    let score = SCORE_RE.captures(line)?.get(1)?.as_str().parse::<f64>().ok()?;

    let mut row = TableRow::new();
    row.insert("Student", CellValue::from(name));
    row.insert("Score", CellValue::Number(score));
    Some(row)
}
