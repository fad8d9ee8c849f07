//! Lexical SQL anti-patterns
//!
//! Works on SQL text alone, so it runs whether or not a plan is available. String
//! literals and comments are masked first, so keywords inside them never match.

use super::sql::{QuoteStyle, mask_literals_with, unqualified};
use super::{DetectionContext, Detector};
use crate::analysis::{Issue, IssueType, Severity};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `*` or `alias.*` as the first select item, or as a later item followed by `,` or FROM
static SELECT_STAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\bSELECT\s+(?:DISTINCT\s+|ALL\s+)?(?:TOP\s*\(?\s*\d+\s*\)?\s+)?(?:[\w"`\[\]]+\.)?\*|,\s*(?:[\w"`\[\]]+\.)?\*\s*(?:,|\bFROM\b)"#,
    )
    .expect("valid regex")
});

/// Three or more `col = value` comparisons chained with OR, each optionally parenthesized
static OR_CHAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[a-z_][\w.]*\s*=\s*[^\s()]+(?:[\s)]*\bOR\b[\s(]*[a-z_][\w.]*\s*=\s*[^\s()]+){2,}",
    )
    .expect("valid regex")
});

static EQUALITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-z_][\w.]*)\s*=").expect("valid regex")
});

static LEADING_WILDCARD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bI?LIKE\s+N?'%'").expect("valid regex"));

static NOT_IN_SUBQUERY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bNOT\s+IN\s*\(\s*SELECT\b").expect("valid regex")
});

/// A scalar function whose arguments include a column, compared to something.
///
/// Arguments may hold one level of nested calls; deeper nesting is caught at the inner
/// call, whose closing parentheses run straight into the comparison.
static FUNCTION_ON_COLUMN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(UPPER|LOWER|TRIM|LTRIM|RTRIM|YEAR|MONTH|DAY|DATE|SUBSTRING|SUBSTR|LEFT|RIGHT|CAST|COALESCE|DATE_TRUNC|DATE_FORMAT|TO_CHAR|LENGTH|ABS|ROUND)\s*\(((?:[^()]|\([^()]*\))*)\)(?:\s*\))*\s*(?:=|<>|!=|<=|>=|<|>|\bLIKE\b|\bIN\b|\bBETWEEN\b)",
    )
    .expect("valid regex")
});

static EXTRACT_ON_COLUMN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bEXTRACT\s*\(\s*\w+\s+FROM\s+([a-z_][\w.]*)\s*\)\s*(?:=|<>|!=|<=|>=|<|>|\bIN\b|\bBETWEEN\b)",
    )
    .expect("valid regex")
});

/// A word in an argument list; the second group marks a function name
static FUNCTION_ARGUMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([a-z_][\w.]*)\s*(\()?").expect("valid regex"));

const ARGUMENT_KEYWORDS: &[&str] = &["as", "from", "for", "null", "true", "false"];

/// Runs every lexical rule over `sql`, each yielding at most one issue.
///
/// Literals follow standard quoting; see [`detect_patterns_with`] for MySQL text.
pub fn detect_patterns(sql: &str) -> Vec<Issue> {
    detect_patterns_with(sql, QuoteStyle::Standard)
}

pub fn detect_patterns_with(sql: &str, quotes: QuoteStyle) -> Vec<Issue> {
    let masked = mask_literals_with(sql, quotes);

    [
        select_star(&masked),
        or_chain(&masked),
        leading_wildcard(&masked),
        not_in_subquery(&masked),
        function_on_column(&masked),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn select_star(masked: &str) -> Option<Issue> {
    SELECT_STAR_REGEX.is_match(masked).then(|| {
        Issue::new(
            IssueType::SuboptimalPattern,
            Severity::Medium,
            "SELECT * retrieves every column",
            "The query selects all columns, which reads more data than needed and \
             prevents index-only scans.",
        )
        .with_affected("SELECT *")
        .with_recommendation("List only the columns the caller needs instead of SELECT *")
    })
}

fn or_chain(masked: &str) -> Option<Issue> {
    OR_CHAIN_REGEX.find_iter(masked).find_map(|chain| {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for caps in EQUALITY_REGEX.captures_iter(chain.as_str()) {
            *counts
                .entry(unqualified(&caps[1]).to_lowercase())
                .or_default() += 1;
        }
        let (column, count) = counts.into_iter().max_by_key(|(_, count)| *count)?;
        (count >= 3).then(|| {
            Issue::new(
                IssueType::SuboptimalPattern,
                Severity::Medium,
                "Chained OR conditions on one column",
                format!(
                    "{count} OR-ed equality checks on `{column}` are hard for the planner \
                     to turn into a single index lookup."
                ),
            )
            .with_affected(column.clone())
            .with_recommendation(format!("Rewrite the OR chain as `{column} IN (...)`"))
            .with_metric("condition_count", count as f64)
        })
    })
}

fn leading_wildcard(masked: &str) -> Option<Issue> {
    LEADING_WILDCARD_REGEX.is_match(masked).then(|| {
        Issue::new(
            IssueType::SuboptimalPattern,
            Severity::High,
            "LIKE pattern starts with a wildcard",
            "A pattern beginning with '%' cannot use a B-tree index and forces every row \
             to be examined.",
        )
        .with_affected("LIKE '%...'")
        .with_recommendation("Anchor the LIKE pattern at the start, or use a trigram/full-text index")
    })
}

fn not_in_subquery(masked: &str) -> Option<Issue> {
    NOT_IN_SUBQUERY_REGEX.is_match(masked).then(|| {
        Issue::new(
            IssueType::SuboptimalPattern,
            Severity::Medium,
            "NOT IN with a subquery",
            "NOT IN over a subquery is slow to plan as an anti-join and returns no rows \
             when the subquery yields a NULL.",
        )
        .with_affected("NOT IN (SELECT ...)")
        .with_recommendation("Rewrite NOT IN (SELECT ...) as NOT EXISTS (SELECT ...)")
    })
}

fn function_on_column(masked: &str) -> Option<Issue> {
    let mut wrapped: Vec<(String, String)> = Vec::new();

    for caps in FUNCTION_ON_COLUMN_REGEX.captures_iter(masked) {
        if let Some(column) = first_column_argument(&caps[2]) {
            wrapped.push((caps[1].to_uppercase(), column));
        }
    }
    for caps in EXTRACT_ON_COLUMN_REGEX.captures_iter(masked) {
        wrapped.push((
            "EXTRACT".to_string(),
            unqualified(&caps[1]).to_lowercase(),
        ));
    }

    let (function, column) = wrapped.first()?.clone();
    let issue = Issue::new(
        IssueType::SuboptimalPattern,
        Severity::High,
        "Function applied to a filtered column",
        format!(
            "`{function}({column})` in a predicate hides the column from any index on it."
        ),
    )
    .with_recommendation(format!(
        "Compare `{column}` directly, or create an expression index on {function}({column})"
    ));

    Some(
        wrapped
            .into_iter()
            .fold(issue, |issue, (_, column)| issue.with_affected(column)),
    )
}

fn first_column_argument(arguments: &str) -> Option<String> {
    let mut words = FUNCTION_ARGUMENT_REGEX
        .captures_iter(arguments)
        .filter(|caps| caps.get(2).is_none())
        .map(|caps| caps[1].to_lowercase());

    while let Some(word) = words.next() {
        if word == "as" {
            // the cast target type follows
            words.next();
            continue;
        }
        if !ARGUMENT_KEYWORDS.contains(&word.as_str()) {
            return Some(unqualified(&word).to_string());
        }
    }
    None
}

/// Lexical anti-pattern detector
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector;

impl Detector for PatternDetector {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue> {
        detect_patterns_with(ctx.sql, ctx.quote_style())
    }
}
