use std::sync::LazyLock;

use regex::Regex;

static SQL_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER|DROP|TRUNCATE|JOIN|FROM|WHERE|GROUP BY|ORDER BY",
    )
    .expect("valid regex")
});

/// Returns the first block of lines that looks like SQL.
///
/// The block starts at the first line containing a SQL keyword and ends at
/// the first line holding a `;`, just before a `----` result border, or just
/// before a blank line that is followed by more text (once the block is
/// longer than two lines). Nothing is validated: a keyword substring is
/// enough to start a block.
#[must_use]
pub fn extract_sql_query(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    let lines = text.split('\n').collect::<Vec<_>>();
    let start = lines.iter().position(|line| SQL_KEYWORD_RE.is_match(line))?;
    let end = find_query_end(&lines, start).unwrap_or(lines.len() - 1);

    Some(lines[start..=end].join("\n"))
}

fn find_query_end(lines: &[&str], start: usize) -> Option<usize> {
    for index in start..lines.len() {
        let line = lines[index];
        if line.contains(';') {
            return Some(index);
        }

        if index > start && line.contains("----") {
            return Some(index - 1);
        }

        let results_follow = lines
            .get(index + 1)
            .is_some_and(|next| !next.trim().is_empty());
        if index > start + 2 && line.trim().is_empty() && results_follow {
            return Some(index - 1);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::extract_sql_query;

    #[test]
    fn returns_none_without_keywords() {
        assert_eq!(extract_sql_query(""), None);
        assert_eq!(extract_sql_query("Alice  90\nBob  85"), None);
    }

    #[test]
    fn extracts_single_statement_line() {
        let text = "mysql> SELECT * FROM students;\n+----+\n| id |\n+----+";
        assert_eq!(
            extract_sql_query(text).as_deref(),
            Some("mysql> SELECT * FROM students;")
        );
    }

    #[test]
    fn multi_line_query_stops_before_result_border() {
        let text = "select name, score\nfrom students\nwhere score > 60\n-----------\nAlice 90";
        assert_eq!(
            extract_sql_query(text).as_deref(),
            Some("select name, score\nfrom students\nwhere score > 60")
        );
    }

    #[test]
    fn blank_line_after_long_query_marks_results() {
        let text = "SELECT name\n  , score\n  , grade\nFROM students\n\nAlice  90  A";
        assert_eq!(
            extract_sql_query(text).as_deref(),
            Some("SELECT name\n  , score\n  , grade\nFROM students")
        );
    }

    #[test]
    fn early_blank_line_does_not_end_query() {
        let text = "SELECT name\n\nFROM students";
        assert_eq!(extract_sql_query(text).as_deref(), Some("SELECT name\n\nFROM students"));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let text = "notes\nplease delete this row\nthanks";
        assert_eq!(
            extract_sql_query(text).as_deref(),
            Some("please delete this row\nthanks")
        );
    }
}
