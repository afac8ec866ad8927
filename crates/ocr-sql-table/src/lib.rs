mod chart;
mod csv_out;
mod detect;
mod error;
mod model;
mod options;
mod query_analysis;
mod sql_extract;
mod synthetic;
mod table_detect;
mod table_parse;
mod warning;

use serde::Serialize;
use tracing::debug;

use crate::table_detect::detect_table;
use crate::warning::WarningCode;

pub use chart::{ChartData, ChartDataset, ChartSeries, build_chart, suggest_chart_kind};
pub use csv_out::{rows_to_csv_string, write_rows_csv};
pub use detect::{ContentSignals, detect_content, should_visualize};
pub use error::ExtractError;
pub use model::{
    CellValue, Condition, ConditionValue, QueryAnalysis, RowSetKind, TableRow, TableRowSet,
};
pub use options::{ChartKind, ChartOptions, ExtractOptions, OutputFormat};
pub use query_analysis::analyze_query;
pub use sql_extract::extract_sql_query;
pub use table_detect::{parse_table_data, parse_table_data_with};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

/// Everything recovered from one piece of captured text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub query: Option<String>,
    pub analysis: Option<QueryAnalysis>,
    pub table: Option<TableRowSet>,
    pub signals: ContentSignals,
    pub visualize: bool,
    pub warnings: Vec<ExtractWarning>,
}

impl Extraction {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.table.as_ref().map_or(0, TableRowSet::len)
    }

    /// Chart for the extracted table, using `kind` or the suggestion for
    /// the table's first two columns.
    #[must_use]
    pub fn chart(&self, kind: Option<ChartKind>, options: &ChartOptions) -> Option<ChartData> {
        let table = self.table.as_ref()?;
        let kind = match kind {
            Some(kind) => kind,
            None => suggest_chart_kind(&ChartSeries::from_rows(table)?),
        };
        build_chart(table, self.query.as_deref(), kind, options)
    }
}

pub fn extract(text: &str, options: &ExtractOptions) -> Result<Extraction, ExtractError> {
    options.validate()?;

    let mut warnings = Vec::new();
    let query = extract_sql_query(text);
    let analysis = query.as_deref().and_then(analyze_query);
    if query.is_none() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoQueryDetected,
            "no line containing a SQL keyword was found",
        ));
    }

    let detection = detect_table(text, options);
    match &detection {
        Some(detection) => match detection.rows.kind {
            RowSetKind::Table => {}
            RowSetKind::Count => {
                let warning = ExtractWarning::new(
                    WarningCode::CountResult,
                    "text was read as a single aggregate count",
                );
                warnings.push(match detection.line {
                    Some(line) => warning.with_line(line),
                    None => warning,
                });
            }
            RowSetKind::Synthetic => warnings.push(
                ExtractWarning::new(
                    WarningCode::SyntheticRows,
                    "no table header was found; rows were guessed from name/score pairs",
                )
                .with_row_count(detection.rows.len()),
            ),
        },
        None => warnings.push(ExtractWarning::new(
            WarningCode::NoTableDetected,
            "no table structure was detected",
        )),
    }

    let table = detection.map(|detection| detection.rows);
    let signals = detect_content(text);
    let visualize = should_visualize(query.as_deref(), table.as_ref(), &signals);
    debug!(
        has_query = query.is_some(),
        rows = table.as_ref().map_or(0, TableRowSet::len),
        visualize,
        "extraction finished"
    );

    Ok(Extraction {
        query,
        analysis,
        table,
        signals,
        visualize,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::{ExtractOptions, ExtractWarningCode, RowSetKind, extract};

    #[test]
    fn collects_query_table_and_signals() {
        let text = "\
mysql> SELECT name, score FROM students WHERE score > 80;
+-------+-------+
| name  | score |
+-------+-------+
| Alice |    91 |
| Carol |    85 |
+-------+-------+";

        let options = ExtractOptions {
            count_shortcut: false,
            ..ExtractOptions::default()
        };
        let extraction = extract(text, &options).expect("extraction succeeds");

        assert_eq!(
            extraction.query.as_deref(),
            Some("mysql> SELECT name, score FROM students WHERE score > 80;")
        );
        let analysis = extraction.analysis.as_ref().expect("query analyzed");
        assert_eq!(analysis.filter_field.as_deref(), Some("score"));
        assert_eq!(extraction.row_count(), 2);
        assert!(extraction.visualize);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn warns_about_synthetic_rows() {
        let text = "Report\nAlice Smith got 91 today\nBob Jones got 78 today";
        let extraction = extract(text, &ExtractOptions::default()).expect("extraction succeeds");

        let table = extraction.table.as_ref().expect("synthetic table");
        assert_eq!(table.kind, RowSetKind::Synthetic);
        let codes = extraction
            .warnings
            .iter()
            .map(|warning| warning.code.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            codes,
            vec![ExtractWarningCode::NoQueryDetected, ExtractWarningCode::SyntheticRows]
        );
    }

    #[test]
    fn count_result_warning_points_at_the_number() {
        let text = "query finished\n12 rows in set";
        let extraction = extract(text, &ExtractOptions::default()).expect("extraction succeeds");

        let warning = extraction
            .warnings
            .iter()
            .find(|warning| warning.code == ExtractWarningCode::CountResult)
            .expect("count warning");
        assert_eq!(warning.line, Some(1));
        assert!(extraction.table.expect("count table").is_count_result());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = ExtractOptions {
            header_scan_limit: 0,
            ..ExtractOptions::default()
        };
        assert!(extract("anything", &options).is_err());
    }
}
