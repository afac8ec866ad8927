use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::model::{CellValue, RowSetKind, TableRow, TableRowSet};
use crate::options::ExtractOptions;
use crate::synthetic::synthesize_rows;
use crate::table_parse::{
    DATA_SKIP_RULES, HEADER_EXCLUSIONS, candidate_tokens, first_matching_rule,
    is_separator_line, parse_header_cells, split_row_cells,
};

// Substring match: aliases like `student_count` must trigger it.
static COUNT_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)count|rows").expect("valid regex"));

static FIRST_INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

static DOMAIN_VOCABULARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)student|name|score|grade|math|english|science").expect("valid regex")
});

const MAX_HEADER_TOKEN_CHARS: usize = 20;
const STUDENT_NAME_COLUMN: &str = "Student Name";
const SCORE_COLUMN: &str = "Score";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Detection {
    pub rows: TableRowSet,
    /// Line the result was anchored on: the header for tables, the line of
    /// the counted number for count results.
    pub line: Option<usize>,
}

/// Reconstructs table rows from OCR text with the default options.
///
/// Returns `None` when nothing table-like is found; a returned row set is
/// never empty.
#[must_use]
pub fn parse_table_data(text: &str) -> Option<TableRowSet> {
    parse_table_data_with(text, &ExtractOptions::default())
}

#[must_use]
pub fn parse_table_data_with(text: &str, options: &ExtractOptions) -> Option<TableRowSet> {
    detect_table(text, options).map(|detection| detection.rows)
}

pub(crate) fn detect_table(text: &str, options: &ExtractOptions) -> Option<Detection> {
    if text.trim().is_empty() {
        return None;
    }

    if options.count_shortcut {
        if let Some((count, line)) = detect_count(text) {
            debug!(count, line, "text reads as a count result");
            return Some(Detection {
                rows: TableRowSet::count(count),
                line: Some(line),
            });
        }
    }

    let lines = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    if lines.len() < options.min_lines {
        return None;
    }

    for header_index in header_candidates(&lines, options) {
        if let Some(rows) = evaluate_candidate(&lines, header_index, options) {
            debug!(
                header_index,
                rows = rows.len(),
                kind = ?rows.kind,
                "header candidate accepted"
            );
            return Some(Detection {
                rows,
                line: Some(header_index),
            });
        }
    }

    if !options.synthetic_fallback {
        return None;
    }

    synthesize_rows(&lines).map(|rows| Detection { rows, line: None })
}

/// First integer of a text that mentions "count" or "rows".
fn detect_count(text: &str) -> Option<(f64, usize)> {
    if !COUNT_WORD_RE.is_match(text) {
        return None;
    }

    let found = FIRST_INTEGER_RE.find(text)?;
    let count = found.as_str().parse::<f64>().ok()?;
    let line = text[..found.start()].matches('\n').count();
    Some((count, line))
}

fn header_candidates(lines: &[&str], options: &ExtractOptions) -> Vec<usize> {
    lines
        .iter()
        .take(options.header_scan_limit)
        .enumerate()
        .filter(|(_, line)| is_header_candidate(line.trim(), options.min_header_columns))
        .map(|(index, _)| index)
        .collect()
}

fn is_header_candidate(line: &str, min_columns: usize) -> bool {
    if first_matching_rule(HEADER_EXCLUSIONS, line).is_some() {
        return false;
    }

    let tokens = candidate_tokens(line);
    if tokens.len() < min_columns {
        return false;
    }

    DOMAIN_VOCABULARY_RE.is_match(line)
        || tokens
            .iter()
            .any(|token| token.trim().eq_ignore_ascii_case("id"))
        || tokens
            .iter()
            .all(|token| token.chars().count() < MAX_HEADER_TOKEN_CHARS)
}

fn evaluate_candidate(
    lines: &[&str],
    header_index: usize,
    options: &ExtractOptions,
) -> Option<TableRowSet> {
    let headers = parse_header_cells(lines[header_index]);
    if headers.len() < options.min_header_columns {
        trace!(header_index, "too few header cells");
        return None;
    }
    // Rows are measured against the header as split, empty cells included.
    let header_width = split_row_cells(lines[header_index]).len();

    let mut data_start = header_index + 1;
    while data_start < lines.len() && is_separator_line(lines[data_start]) {
        data_start += 1;
    }
    let data_end = data_start.saturating_add(options.max_data_rows).min(lines.len());

    let mut rows = Vec::new();
    let mut consecutive = 0_usize;
    for (offset, raw) in lines[data_start..data_end].iter().enumerate() {
        let line = raw.trim();
        if let Some(rule) = first_matching_rule(DATA_SKIP_RULES, line) {
            trace!(line = data_start + offset, rule, "skipping line");
            continue;
        }

        let cells = split_row_cells(line);
        if cells.len().abs_diff(header_width) <= options.column_tolerance {
            rows.push(build_row(&headers, &cells));
            consecutive += 1;
            continue;
        }

        trace!(
            line = data_start + offset,
            cells = cells.len(),
            headers = header_width,
            "row width does not match header"
        );
        if consecutive >= options.min_consecutive_rows {
            break;
        }
        consecutive = 0;
    }

    if consecutive < options.min_consecutive_rows && rows.len() < options.min_consecutive_rows {
        return None;
    }

    Some(finish_rows(rows))
}

fn build_row(headers: &[String], cells: &[String]) -> TableRow {
    headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let raw = cells.get(index).map_or("", String::as_str);
            (header.clone(), CellValue::coerce(raw))
        })
        .collect()
}

fn finish_rows(rows: Vec<TableRow>) -> TableRowSet {
    if let [row] = rows.as_slice() {
        if row.len() == 1 {
            if let Some(count) = row.values().next().and_then(CellValue::as_number) {
                return TableRowSet::count(count);
            }
        }
    }

    TableRowSet {
        kind: RowSetKind::Table,
        rows: promote_student_columns(rows),
    }
}

fn is_name_column(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.contains("name") || lower.contains("student")
}

fn is_score_column(key: &str) -> bool {
    let lower = key.to_lowercase();
    ["score", "mark", "grade", "point"]
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Moves a name-like and a score-like column to the front as
/// `Student Name` and `Score`. The last matching column of each kind is
/// used; a column that reads as a name is never taken as the score. Rows are
/// left alone when another column already carries one of the target names.
fn promote_student_columns(rows: Vec<TableRow>) -> Vec<TableRow> {
    let Some(first) = rows.first() else {
        return rows;
    };

    let keys = first.keys().map(str::to_string).collect::<Vec<_>>();
    let mut name_column = None;
    let mut score_column = None;
    for key in &keys {
        if is_name_column(key) {
            name_column = Some(key.as_str());
        } else if is_score_column(key) {
            score_column = Some(key.as_str());
        }
    }

    let (Some(name_column), Some(score_column)) = (name_column, score_column) else {
        return rows;
    };
    if keys.len() < 2 || (keys[0] == name_column && keys[1] == score_column) {
        return rows;
    }
    let renamed_over = keys.iter().any(|key| {
        key != name_column
            && key != score_column
            && (key == STUDENT_NAME_COLUMN || key == SCORE_COLUMN)
    });
    if renamed_over {
        return rows;
    }

    rows.iter()
        .map(|row| {
            let mut promoted = TableRow::new();
            promoted.insert(
                STUDENT_NAME_COLUMN,
                row.get(name_column).cloned().unwrap_or_default(),
            );
            promoted.insert(
                SCORE_COLUMN,
                row.get(score_column).cloned().unwrap_or_default(),
            );
            for (key, value) in row.iter() {
                if key != name_column && key != score_column {
                    promoted.insert(key, value.clone());
                }
            }
            promoted
        })
        .collect()
}
