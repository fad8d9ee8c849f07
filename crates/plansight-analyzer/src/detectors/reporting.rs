//! Unbounded reporting queries

use super::sql::mask_literals;
use super::{DetectionContext, Detector};
use crate::analysis::{AnalyzerConfig, Issue, IssueType, Severity};
use regex::Regex;
use std::sync::LazyLock;

static GROUP_BY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGROUP\s+BY\b").expect("valid regex"));

static AGGREGATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:COUNT|SUM|AVG|MIN|MAX|STRING_AGG|ARRAY_AGG|GROUP_CONCAT|LISTAGG|STDDEV|VARIANCE)\s*\(",
    )
    .expect("valid regex")
});

static WINDOW_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bOVER\s*\(").expect("valid regex"));

/// LIMIT, FETCH FIRST/NEXT, TOP n or a ROWNUM bound
static ROW_LIMIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bLIMIT\b|\bFETCH\s+(?:FIRST|NEXT)\b|\bTOP\s*\(?\s*\d|\bROWNUM\b")
        .expect("valid regex")
});

/// Flags aggregation queries that return an unbounded result set
pub fn detect_reporting_patterns(sql: &str, config: &AnalyzerConfig) -> Option<Issue> {
    let masked = mask_literals(sql);

    let grouped = GROUP_BY_REGEX.is_match(&masked);
    let aggregates = AGGREGATE_REGEX.find_iter(&masked).count();
    let windows = WINDOW_REGEX.find_iter(&masked).count();

    let reporting = grouped || aggregates >= 2 || windows > 0;
    if !reporting || ROW_LIMIT_REGEX.is_match(&masked) {
        return None;
    }

    let severity = if aggregates >= config.reporting_aggregate_threshold || windows > 0 {
        Severity::Medium
    } else {
        Severity::Low
    };

    Some(
        Issue::new(
            IssueType::InefficientReporting,
            severity,
            "Unbounded aggregation query",
            format!(
                "The query computes {aggregates} aggregate(s) and {windows} window function(s) \
                 over an unbounded result with no LIMIT or pagination."
            ),
        )
        .with_metric("aggregate_count", aggregates as f64)
        .with_metric("window_function_count", windows as f64)
        .with_recommendation("Add LIMIT or keyset pagination to the reporting query")
        .with_recommendation("Precompute the aggregates in a materialized view refreshed on a schedule"),
    )
}

/// Reporting shape check
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportingDetector;

impl Detector for ReportingDetector {
    fn name(&self) -> &'static str {
        "reporting"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue> {
        detect_reporting_patterns(&ctx.masked_sql(), ctx.config)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests;
