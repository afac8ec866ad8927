use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Condition, ConditionValue, QueryAnalysis};

// All patterns run against the lower-cased query.
static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"from\s+([a-z0-9_,\s]+?)(?:\s+where|\s+group|\s+having|\s+order|\s+limit|\s*;|$)")
        .expect("valid regex")
});

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"count\(\s*(?:distinct\s+)?([a-z0-9_.*]+)\s*\)").expect("valid regex")
});

static WHERE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)where\s+(.+?)(?:\s+group|\s+having|\s+order|\s+limit|\s*;|$)")
        .expect("valid regex")
});

static SCORE_FILTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-z0-9_]*(?:score|mark|grade|point)[a-z0-9_]*)\s*([><=!]+)\s*([0-9]+)")
        .expect("valid regex")
});

static CLAUSE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+and\s+|\s+or\s+").expect("valid regex"));

static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-z0-9_]+)\s*([><=!]+)\s*(['"]?[^'"\s]+['"]?)"#).expect("valid regex")
});

/// Derives tables, the COUNT target and WHERE conditions from a query.
///
/// Returns `None` only for an empty query. Everything else produces an
/// analysis, possibly with no tables or conditions.
#[must_use]
pub fn analyze_query(query: &str) -> Option<QueryAnalysis> {
    if query.trim().is_empty() {
        return None;
    }

    let lower = query.to_lowercase();
    let mut analysis = QueryAnalysis {
        is_count_query: lower.contains("count("),
        has_filter: lower.contains("where") || lower.contains("having"),
        ..QueryAnalysis::default()
    };

    if let Some(body) = FROM_RE.captures(&lower).and_then(|capture| capture.get(1)) {
        analysis.tables = body
            .as_str()
            .split(',')
            .map(|table| table.trim().to_string())
            .collect();
    }

    analysis.count_target = COUNT_RE
        .captures(&lower)
        .and_then(|capture| capture.get(1))
        .map(|target| target.as_str().to_string());

    if let Some(body) = WHERE_RE.captures(&lower).and_then(|capture| capture.get(1)) {
        collect_conditions(body.as_str(), &mut analysis);
    }

    Some(analysis)
}

fn collect_conditions(where_clause: &str, analysis: &mut QueryAnalysis) {
    if let Some(capture) = SCORE_FILTER_RE.captures(where_clause) {
        let field = capture[1].to_string();
        let operator = capture[2].to_string();
        let value = ConditionValue::from_digits(&capture[3]);

        analysis.filter_field = Some(field.clone());
        analysis.filter_operator = Some(operator.clone());
        analysis.filter_value = Some(value.clone());
        analysis.conditions.push(Condition {
            field,
            operator,
            value,
        });
    }

    for clause in CLAUSE_SPLIT_RE.split(where_clause) {
        let Some(capture) = CLAUSE_RE.captures(clause) else {
            continue;
        };

        let field = &capture[1];
        if analysis
            .conditions
            .iter()
            .any(|condition| condition.field == field)
        {
            continue;
        }

        analysis.conditions.push(Condition {
            field: field.to_string(),
            operator: capture[2].to_string(),
            value: ConditionValue::Text(strip_quotes(&capture[3]).to_string()),
        });
    }
}

fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(['\'', '"']).unwrap_or(value);
    value.strip_suffix(['\'', '"']).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::analyze_query;
    use crate::model::{Condition, ConditionValue};

    #[test]
    fn empty_query_has_no_analysis() {
        assert_eq!(analyze_query(""), None);
        assert_eq!(analyze_query("  \n"), None);
    }

    #[test]
    fn count_query_with_score_filter() {
        let analysis = analyze_query("SELECT COUNT(id) FROM students WHERE score > 60")
            .expect("query is analyzed");

        assert!(analysis.is_count_query);
        assert!(analysis.has_filter);
        assert_eq!(analysis.count_target.as_deref(), Some("id"));
        assert_eq!(analysis.tables, vec!["students"]);
        assert_eq!(analysis.filter_field.as_deref(), Some("score"));
        assert_eq!(analysis.filter_operator.as_deref(), Some(">"));
        assert_eq!(analysis.filter_value, Some(ConditionValue::Number(60)));
        assert_eq!(
            analysis.conditions,
            vec![Condition {
                field: "score".to_string(),
                operator: ">".to_string(),
                value: ConditionValue::Number(60),
            }]
        );
    }

    #[test]
    fn tables_stop_at_clause_keywords_and_semicolons() {
        let analysis =
            analyze_query("select * from students, classes order by name;").expect("analyzed");
        assert_eq!(analysis.tables, vec!["students", "classes"]);

        let analysis = analyze_query("SELECT * FROM students;").expect("analyzed");
        assert_eq!(analysis.tables, vec!["students"]);
        assert!(!analysis.has_filter);
        assert!(analysis.conditions.is_empty());
    }

    #[test]
    fn distinct_prefix_is_ignored_in_count_target() {
        let analysis =
            analyze_query("SELECT COUNT( DISTINCT s.class_id ) FROM students s").expect("analyzed");
        assert_eq!(analysis.count_target.as_deref(), Some("s.class_id"));
    }

    #[test]
    fn first_condition_per_field_wins() {
        let analysis = analyze_query(
            "SELECT name FROM students WHERE final_grade >= 70 AND name = 'Alice' OR name = 'Bob' AND final_grade < 90",
        )
        .expect("analyzed");

        assert_eq!(
            analysis.conditions,
            vec![
                Condition {
                    field: "final_grade".to_string(),
                    operator: ">=".to_string(),
                    value: ConditionValue::Number(70),
                },
                Condition {
                    field: "name".to_string(),
                    operator: "=".to_string(),
                    value: ConditionValue::Text("alice".to_string()),
                },
            ]
        );
    }

    #[test]
    fn where_clause_may_span_lines() {
        let analysis = analyze_query("SELECT name\nFROM students\nWHERE class = 'b'\n  AND age < 12\nORDER BY name")
            .expect("analyzed");

        assert_eq!(analysis.tables, vec!["students"]);
        assert_eq!(analysis.filter_field, None);
        let fields = analysis
            .conditions
            .iter()
            .map(|condition| condition.field.as_str())
            .collect::<Vec<_>>();
        assert_eq!(fields, vec!["class", "age"]);
    }
}
