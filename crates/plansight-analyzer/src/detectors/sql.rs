//! Lexical helpers shared by the SQL-text detectors

use crate::explain::Engine;
use regex::Regex;
use std::sync::LazyLock;

/// Standard string literals and comments.
/// Handles: 'text', 'it''s', -- line comments, /* block comments */
static STRING_LITERAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'(?:[^']|'')*'|--[^\n]*|/\*[\s\S]*?\*/").expect("valid regex")
});

/// MySQL literals, where a backslash also escapes the next character: 'it\'s'
static BACKSLASH_LITERAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'(?:[^'\\]|\\.|'')*'|--[^\n]*|#[^\n]*|/\*[\s\S]*?\*/").expect("valid regex")
});

/// An identifier on the left of a comparison, with optional quoting and `::type` cast
static COMPARED_COLUMN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b([a-z_][\w$]*)["\])]*(?:::[a-z ]+?)?\s*(?:\bNOT\s+)?(?:=|<>|!=|<=|>=|<|>|~~|\bLIKE\b|\bILIKE\b|\bIN\b|\bIS\b|\bBETWEEN\b)"#,
    )
    .expect("valid regex")
});

static WHERE_CLAUSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bWHERE\b(.*?)(?:\bGROUP\s+BY\b|\bORDER\s+BY\b|\bHAVING\b|\bLIMIT\b|\bUNION\b|$)")
        .expect("valid regex")
});

const NON_COLUMN_WORDS: &[&str] = &[
    "and", "or", "not", "null", "true", "false", "where", "on", "then", "else", "when", "case",
];

/// How an engine escapes quotes inside string literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    /// Only a doubled quote escapes (`'it''s'`); a backslash is an ordinary character
    #[default]
    Standard,
    /// A backslash escapes the next character as well (MySQL)
    Backslash,
}

impl QuoteStyle {
    /// Unknown engine names fall back to the standard rules
    pub fn for_engine(engine: &str) -> Self {
        match engine.parse::<Engine>() {
            Ok(Engine::MySql) => Self::Backslash,
            _ => Self::Standard,
        }
    }
}

/// Replaces standard string literals with a placeholder and blanks out comments.
///
/// A literal starting with `%` becomes `'%'`, any other literal becomes `'?'`, so
/// keywords inside literals never match while leading wildcards stay visible.
/// Masking already masked text changes nothing.
pub fn mask_literals(sql: &str) -> String {
    mask_literals_with(sql, QuoteStyle::Standard)
}

pub fn mask_literals_with(sql: &str, style: QuoteStyle) -> String {
    let regex = match style {
        QuoteStyle::Standard => &*STRING_LITERAL_REGEX,
        QuoteStyle::Backslash => &*BACKSLASH_LITERAL_REGEX,
    };
    regex
        .replace_all(sql, |caps: &regex::Captures<'_>| {
            let text = &caps[0];
            if text.starts_with("'%") {
                "'%'".to_string()
            } else if text.starts_with('\'') {
                "'?'".to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned()
}

/// Lowercased column names compared in a predicate, in first-seen order.
///
/// Table qualifiers and bracket/quote decoration are dropped.
pub fn compared_columns(predicate: &str) -> Vec<String> {
    let masked = mask_literals(predicate);
    let mut columns: Vec<String> = Vec::new();
    for caps in COMPARED_COLUMN_REGEX.captures_iter(&masked) {
        let column = caps[1].to_lowercase();
        if NON_COLUMN_WORDS.contains(&column.as_str()) || columns.contains(&column) {
            continue;
        }
        columns.push(column);
    }
    columns
}

/// Columns compared in every WHERE clause of a statement
pub fn where_columns(sql: &str) -> Vec<String> {
    let masked = mask_literals(sql);
    let mut columns: Vec<String> = Vec::new();
    for caps in WHERE_CLAUSE_REGEX.captures_iter(&masked) {
        for column in compared_columns(&caps[1]) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }
    columns
}

/// Whether `word` appears as a whole word, ignoring case
pub fn mentions_word(sql: &str, word: &str) -> bool {
    let lower = sql.to_lowercase();
    let word = word.to_lowercase();
    lower.match_indices(&word).any(|(start, _)| {
        let end = start + word.len();
        let before = lower[..start].chars().next_back();
        let after = lower[end..].chars().next();
        !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
    })
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Strips a `schema.` or `alias.` qualifier
pub fn unqualified(identifier: &str) -> &str {
    identifier
        .rsplit_once('.')
        .map_or(identifier, |(_, name)| name)
}

#[cfg(test)]
mod tests;
