//! ORM-generated SQL shapes

use super::sql::mask_literals;
use super::{DetectionContext, Detector};
use crate::analysis::{AnalyzerConfig, Issue, IssueType, QueryContext, Severity};
use crate::explain::PlanNode;
use regex::Regex;
use std::sync::LazyLock;

static JOIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bJOIN\b").expect("valid regex"));

/// `JOIN` keywords outside literals and comments
pub fn count_sql_joins(sql: &str) -> usize {
    JOIN_REGEX.find_iter(&mask_literals(sql)).count()
}

/// Flags excessive joins and, with workload context, N+1 access patterns
pub fn detect_orm_patterns(
    sql: &str,
    plan: Option<&PlanNode>,
    context: Option<&QueryContext>,
    config: &AnalyzerConfig,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    let plan_joins = plan.map_or(0, |p| p.iter().filter(|n| n.node_type.is_join()).count());
    let join_count = count_sql_joins(sql).max(plan_joins);
    if join_count > config.max_joins {
        issues.push(
            Issue::new(
                IssueType::OrmGenerated,
                Severity::Medium,
                format!("Query joins {join_count} tables"),
                format!(
                    "{join_count} joins in one statement is typical of eager loading in an \
                     ORM and makes join ordering expensive to plan."
                ),
            )
            .with_metric("join_count", join_count as f64)
            .with_recommendation("Load related data in separate, narrower queries")
            .with_recommendation("Select only the associations the caller uses"),
        );
    }

    if let Some(count) = context.and_then(|c| c.similar_query_count)
        && count >= config.n_plus_one_threshold
    {
        let mut issue = Issue::new(
            IssueType::OrmGenerated,
            Severity::High,
            "Possible N+1 query pattern",
            format!(
                "{count} near-identical statements were issued together, which usually \
                 means one query per row of an outer result."
            ),
        )
        .with_metric("similar_query_count", count as f64)
        .with_recommendation("Batch the lookups into one query with IN (...) or a join")
        .with_recommendation("Enable eager loading for the association being iterated");

        if let Some(source) = context.and_then(|c| c.source.as_deref()) {
            issue = issue.with_affected(source);
        }
        issues.push(issue);
    }

    issues
}

/// Join fan-out and N+1 check
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmPatternDetector;

impl Detector for OrmPatternDetector {
    fn name(&self) -> &'static str {
        "orm"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue> {
        detect_orm_patterns(&ctx.masked_sql(), ctx.plan, ctx.query_context, ctx.config)
    }
}

#[cfg(test)]
mod tests;
