use std::sync::LazyLock;

use regex::Regex;

static FOOTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[0-9]+\s+rows?(?:\s+in\s+set)?").expect("valid regex"));

static CANDIDATE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}|\||\t").expect("valid regex"));

/// A named line predicate. Rule tables are evaluated in order and the first
/// match wins.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
}

/// Lines that can never be a header row.
pub(crate) const HEADER_EXCLUSIONS: &[LineRule] = &[
    LineRule {
        name: "sql",
        matches: is_sql_line,
    },
    LineRule {
        name: "border",
        matches: is_border_line,
    },
];

/// Lines skipped while collecting data rows below a header.
pub(crate) const DATA_SKIP_RULES: &[LineRule] = &[
    LineRule {
        name: "blank",
        matches: is_blank_line,
    },
    LineRule {
        name: "separator",
        matches: is_separator_line,
    },
    LineRule {
        name: "sql",
        matches: is_sql_line,
    },
    LineRule {
        name: "footer",
        matches: is_footer_line,
    },
];

pub(crate) fn first_matching_rule(rules: &[LineRule], line: &str) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| (rule.matches)(line))
        .map(|rule| rule.name)
}

fn is_blank_line(line: &str) -> bool {
    line.trim().is_empty()
}

// Case-sensitive: lower-case prose mentioning "from" stays eligible.
fn is_sql_line(line: &str) -> bool {
    ["SELECT", "FROM", "WHERE"]
        .iter()
        .any(|keyword| line.contains(keyword))
}

fn is_border_line(line: &str) -> bool {
    ["+--", "|--", "---"].iter().any(|marker| line.contains(marker))
}

pub(crate) fn is_separator_line(line: &str) -> bool {
    if ["+--", "|--", "---+", "---|"]
        .iter()
        .any(|marker| line.contains(marker))
    {
        return true;
    }

    let trimmed = line.trim();
    let rule_chars = trimmed.chars().filter(|ch| matches!(ch, '-' | '=')).count();
    rule_chars >= 3
        && trimmed
            .chars()
            .all(|ch| matches!(ch, '-' | '=' | '+' | '|' | ':') || ch.is_whitespace())
}

fn is_footer_line(line: &str) -> bool {
    FOOTER_RE.is_match(line.trim())
}

/// Tokens used only to judge whether a line looks like a header. They are
/// not trimmed so padded pipe cells count their padding toward the length
/// limit.
pub(crate) fn candidate_tokens(line: &str) -> Vec<&str> {
    CANDIDATE_SPLIT_RE
        .split(line)
        .filter(|token| !token.trim().is_empty())
        .collect()
}

/// Splits a header or data row. Pipe rows keep empty cells so positions
/// line up with the header; whitespace rows split on tabs or runs of two or
/// more spaces.
pub(crate) fn split_row_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);

    if trimmed.contains('|') {
        return trimmed
            .split('|')
            .map(|cell| cell.trim().to_string())
            .collect();
    }

    split_whitespace_cells(trimmed)
}

fn split_whitespace_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut whitespace_run = 0_usize;

    for ch in trimmed.chars() {
        if ch == '\t' {
            if !current.trim().is_empty() {
                cells.push(current.trim().to_string());
                current.clear();
            }
            whitespace_run = 0;
            continue;
        }

        if ch.is_whitespace() {
            whitespace_run += 1;
            if whitespace_run >= 2 {
                if !current.trim().is_empty() {
                    cells.push(current.trim().to_string());
                    current.clear();
                }
                continue;
            }
            current.push(' ');
            continue;
        }

        whitespace_run = 0;
        current.push(ch);
    }

    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }

    cells
}

/// Header cells with one surrounding quote character removed; empty names
/// are dropped.
pub(crate) fn parse_header_cells(line: &str) -> Vec<String> {
    split_row_cells(line)
        .iter()
        .map(|cell| strip_quotes(cell.trim()).trim().to_string())
        .filter(|cell| !cell.is_empty())
        .collect()
}

fn strip_quotes(value: &str) -> &str {
    const QUOTES: [char; 3] = ['"', '\'', '`'];
    let value = value.strip_prefix(QUOTES).unwrap_or(value);
    value.strip_suffix(QUOTES).unwrap_or(value)
}
