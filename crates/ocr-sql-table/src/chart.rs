//! Chart-ready series derived from extracted rows.
//!
//! Only the data side of charting lives here: labels, values and dataset
//! names. Colors and rendering belong to whoever draws the chart.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::{CellValue, TableRow, TableRowSet, leading_float};
use crate::options::{ChartKind, ChartOptions};
use crate::query_analysis::analyze_query;

static THRESHOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([><=!]+)\s*([0-9]+)").expect("valid regex"));

static DATE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9]{4}-[0-9]{2}-[0-9]{2}|^[0-9]{2}/[0-9]{2}/[0-9]{4}|^[0-9]{2}-[0-9]{2}-[0-9]{4}",
    )
    .expect("valid regex")
});

const PIE_MAX_CATEGORIES: usize = 6;
const DEFAULT_FILTER_COLUMN: &str = "score";

/// First column as labels, second (or the first again) as values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label_column: String,
    pub value_column: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    #[must_use]
    pub fn from_rows(rows: &TableRowSet) -> Option<Self> {
        let first = rows.rows.first()?;
        let mut keys = first.keys();
        let label_column = keys.next()?.to_string();
        let value_column = keys.next().map_or_else(|| label_column.clone(), str::to_string);

        Some(Self {
            labels: column_labels(&rows.rows, &label_column),
            values: column_values(&rows.rows, &value_column),
            label_column,
            value_column,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// Pie for a handful of categories, line for date-like labels, bar
/// otherwise.
#[must_use]
pub fn suggest_chart_kind(series: &ChartSeries) -> ChartKind {
    if series.labels.len() <= PIE_MAX_CATEGORIES {
        return ChartKind::Pie;
    }

    if series.labels.iter().any(|label| DATE_LABEL_RE.is_match(label)) {
        return ChartKind::Line;
    }

    ChartKind::Bar
}

#[must_use]
pub fn build_chart(
    rows: &TableRowSet,
    query: Option<&str>,
    kind: ChartKind,
    options: &ChartOptions,
) -> Option<ChartData> {
    let series = ChartSeries::from_rows(rows)?;

    let is_count_query = query.is_some_and(|query| query.to_lowercase().contains("count"));
    if kind == ChartKind::Pie && is_count_query && rows.len() == 1 {
        return Some(count_comparison(rows, query.unwrap_or_default(), options));
    }

    if kind == ChartKind::Bar {
        return Some(student_bar_chart(rows, &series));
    }

    Some(ChartData {
        kind,
        labels: series.labels,
        datasets: vec![ChartDataset {
            label: format!("{} by {}", series.value_column, series.label_column),
            data: series.values,
        }],
    })
}

/// Splits a lone COUNT result into matching and not-matching slices of an
/// assumed population.
fn count_comparison(rows: &TableRowSet, query: &str, options: &ChartOptions) -> ChartData {
    let count = rows
        .rows
        .first()
        .and_then(|row| row.values().next())
        .map_or(0.0, numeric_value);

    let (operator, threshold) = THRESHOLD_RE
        .captures(query)
        .map_or((">".to_string(), "0".to_string()), |capture| {
            (capture[1].to_string(), capture[2].to_string())
        });
    let column = analyze_query(query)
        .and_then(|analysis| analysis.filter_field)
        .unwrap_or_else(|| DEFAULT_FILTER_COLUMN.to_string());

    let matching_label = match operator.as_str() {
        ">" => format!("{column} > {threshold}"),
        "<" => format!("{column} < {threshold}"),
        ">=" => format!("{column} ≥ {threshold}"),
        "<=" => format!("{column} ≤ {threshold}"),
        "=" => format!("{column} = {threshold}"),
        _ => "Matching".to_string(),
    };
    let not_matching = (f64::from(options.count_total_estimate) - count).max(0.0);

    ChartData {
        kind: ChartKind::Pie,
        labels: vec![
            format!("{matching_label} ({})", CellValue::Number(count)),
            format!("Not Matching ({})", CellValue::Number(not_matching)),
        ],
        datasets: vec![ChartDataset {
            label: "SQL Query Results".to_string(),
            data: vec![count, not_matching],
        }],
    }
}

fn student_bar_chart(rows: &TableRowSet, series: &ChartSeries) -> ChartData {
    let headers = rows.headers();
    let name_column = headers
        .iter()
        .rfind(|header| {
            let lower = header.to_lowercase();
            lower.contains("name") || lower.contains("student")
        })
        .unwrap_or(&series.label_column);
    let score_column = headers
        .iter()
        .rfind(|header| {
            let lower = header.to_lowercase();
            !lower.contains("name")
                && !lower.contains("student")
                && ["score", "mark", "grade", "point"]
                    .iter()
                    .any(|marker| lower.contains(marker))
        })
        .unwrap_or(&series.value_column);

    ChartData {
        kind: ChartKind::Bar,
        labels: column_labels(&rows.rows, name_column),
        datasets: vec![ChartDataset {
            label: score_column.clone(),
            data: column_values(&rows.rows, score_column),
        }],
    }
}

fn column_labels(rows: &[TableRow], column: &str) -> Vec<String> {
    rows.iter()
        .map(|row| row.get(column).map(ToString::to_string).unwrap_or_default())
        .collect()
}

fn column_values(rows: &[TableRow], column: &str) -> Vec<f64> {
    rows.iter()
        .map(|row| row.get(column).map_or(0.0, numeric_value))
        .collect()
}

fn numeric_value(value: &CellValue) -> f64 {
    match value {
        CellValue::Number(number) => *number,
        CellValue::Text(text) => leading_float(text.trim()).unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ChartDataset, ChartSeries, build_chart, suggest_chart_kind};
    use crate::model::{CellValue, RowSetKind, TableRow, TableRowSet};
    use crate::options::{ChartKind, ChartOptions};

    fn student_rows() -> TableRowSet {
        let rows = [("Alice", "91", "7A"), ("Bob", "78", "7C"), ("Carol", "n/a", "7B")]
            .iter()
            .map(|(name, score, class)| {
                let mut row = TableRow::new();
                row.insert("Student Name", CellValue::from(*name));
                row.insert("Score", CellValue::coerce(score));
                row.insert("Class", CellValue::from(*class));
                row
            })
            .collect();
        TableRowSet {
            kind: RowSetKind::Table,
            rows,
        }
    }

    #[test]
    fn series_uses_first_two_columns() {
        let series = ChartSeries::from_rows(&student_rows()).expect("series");
        assert_eq!(series.label_column, "Student Name");
        assert_eq!(series.value_column, "Score");
        assert_eq!(series.labels, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(series.values, vec![91.0, 78.0, 0.0]);
    }

    #[test]
    fn suggests_pie_line_or_bar() {
        let mut series = ChartSeries::from_rows(&student_rows()).expect("series");
        assert_eq!(suggest_chart_kind(&series), ChartKind::Pie);

        series.labels = (1..=8).map(|day| format!("2024-01-0{day}")).collect();
        assert_eq!(suggest_chart_kind(&series), ChartKind::Line);

        series.labels = (1..=8).map(|index| format!("item {index}")).collect();
        assert_eq!(suggest_chart_kind(&series), ChartKind::Bar);
    }

    #[test]
    fn bar_chart_picks_name_and_score_columns() {
        let chart = build_chart(&student_rows(), None, ChartKind::Bar, &ChartOptions::default())
            .expect("chart");
        assert_eq!(chart.labels, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(
            chart.datasets,
            vec![ChartDataset {
                label: "Score".to_string(),
                data: vec![91.0, 78.0, 0.0],
            }]
        );
    }

    #[test]
    fn bar_chart_uses_last_score_like_column() {
        let rows = [("Alice", "88", "91%"), ("Bob", "70", "84pts")]
            .iter()
            .map(|(name, midterm, final_score)| {
                let mut row = TableRow::new();
                row.insert("Name", CellValue::from(*name));
                row.insert("Midterm Score", CellValue::coerce(midterm));
                row.insert("Final Score", CellValue::from(*final_score));
                row
            })
            .collect();
        let rows = TableRowSet {
            kind: RowSetKind::Table,
            rows,
        };

        let chart =
            build_chart(&rows, None, ChartKind::Bar, &ChartOptions::default()).expect("chart");
        assert_eq!(chart.labels, vec!["Alice", "Bob"]);
        assert_eq!(
            chart.datasets,
            vec![ChartDataset {
                label: "Final Score".to_string(),
                data: vec![91.0, 84.0],
            }]
        );
    }

    #[test]
    fn pie_chart_for_count_query_compares_against_estimate() {
        let chart = build_chart(
            &TableRowSet::count(12.0),
            Some("SELECT COUNT(*) FROM students WHERE score >= 60"),
            ChartKind::Pie,
            &ChartOptions::default(),
        )
        .expect("chart");

        assert_eq!(chart.labels, vec!["score ≥ 60 (12)", "Not Matching (68)"]);
        assert_eq!(chart.datasets[0].data, vec![12.0, 68.0]);
    }

    #[test]
    fn other_kinds_label_value_by_label() {
        let chart = build_chart(&student_rows(), None, ChartKind::Line, &ChartOptions::default())
            .expect("chart");
        assert_eq!(chart.datasets[0].label, "Score by Student Name");
    }

    #[test]
    fn empty_rows_have_no_chart() {
        let rows = TableRowSet {
            kind: RowSetKind::Table,
            rows: Vec::new(),
        };
        assert_eq!(
            build_chart(&rows, None, ChartKind::Bar, &ChartOptions::default()),
            None
        );
    }
}
