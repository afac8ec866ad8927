use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::TableRowSet;

static SQL_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)SELECT|FROM|WHERE|JOIN|GROUP BY|ORDER BY|INSERT|UPDATE|DELETE")
        .expect("valid regex")
});

static TABLE_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)table|database|sql|rows?|records?|results?|id|name|score|data|values?")
        .expect("valid regex")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentSignals {
    pub has_sql_keywords: bool,
    pub has_table_keywords: bool,
}

#[must_use]
pub fn detect_content(text: &str) -> ContentSignals {
    ContentSignals {
        has_sql_keywords: SQL_CONTENT_RE.is_match(text),
        has_table_keywords: TABLE_CONTENT_RE.is_match(text),
    }
}

/// Whether a capture is worth offering a chart for: any extracted query, a
/// table of two or more rows, or a single-row result backed by SQL or
/// table vocabulary.
#[must_use]
pub fn should_visualize(
    query: Option<&str>,
    table: Option<&TableRowSet>,
    signals: &ContentSignals,
) -> bool {
    if query.is_some() {
        return true;
    }

    let Some(table) = table.filter(|table| !table.is_empty()) else {
        return false;
    };

    table.len() >= 2 || signals.has_sql_keywords || signals.has_table_keywords
}

#[cfg(test)]
mod tests {
    use super::{ContentSignals, detect_content, should_visualize};
    use crate::model::TableRowSet;

    #[test]
    fn detects_sql_and_table_vocabulary() {
        let signals = detect_content("select * from scores");
        assert!(signals.has_sql_keywords);
        assert!(signals.has_table_keywords);

        let signals = detect_content("lunch at noon?");
        assert_eq!(signals, ContentSignals::default());
    }

    #[test]
    fn query_alone_is_enough() {
        assert!(should_visualize(
            Some("SELECT 1"),
            None,
            &ContentSignals::default()
        ));
    }

    #[test]
    fn single_row_needs_supporting_vocabulary() {
        let count = TableRowSet::count(3.0);
        assert!(!should_visualize(None, Some(&count), &ContentSignals::default()));

        let signals = ContentSignals {
            has_sql_keywords: false,
            has_table_keywords: true,
        };
        assert!(should_visualize(None, Some(&count), &signals));
        assert!(!should_visualize(None, None, &signals));
    }
}
