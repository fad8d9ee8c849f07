//! Join strategy detection

use super::{DetectionContext, Detector};
use crate::analysis::{AnalyzerConfig, Issue, IssueType, Severity};
use crate::explain::{NodeType, PlanNode};

/// Flags nested loops that drive too many rows
pub fn detect_join_strategies(plan: &PlanNode, config: &AnalyzerConfig) -> Vec<Issue> {
    plan.iter()
        .filter(|node| node.node_type == NodeType::NestedLoop)
        .filter_map(|node| {
            let rows = node.row_count()?;
            if rows < config.nested_loop_row_threshold {
                return None;
            }
            let severity = if rows >= config.nested_loop_critical_rows {
                Severity::Critical
            } else {
                Severity::High
            };
            Some(nested_loop_issue(node, rows, severity))
        })
        .collect()
}

fn nested_loop_issue(node: &PlanNode, rows: u64, severity: Severity) -> Issue {
    let tables = joined_tables(node);

    let mut issue = Issue::new(
        IssueType::PoorJoinStrategy,
        severity,
        format!("Nested loop over {rows} rows"),
        "A nested loop re-scans its inner side once per outer row; at this volume a hash \
         or merge join is usually far cheaper.",
    )
    .with_affected(node.display_name())
    .with_metric("row_count", rows as f64)
    .with_recommendation(
        "Check join selectivity so the planner can choose a hash or merge join",
    );

    for table in &tables {
        issue = issue.with_affected(table.clone());
    }
    if !tables.is_empty() {
        issue = issue.with_recommendation(format!(
            "Index the join columns of {}",
            tables.join(", ")
        ));
    }
    issue
}

/// Tables read beneath a join, in plan order
fn joined_tables(node: &PlanNode) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for rel in node.iter().skip(1).filter_map(|n| n.relation_name.as_ref()) {
        if !tables.contains(rel) {
            tables.push(rel.clone());
        }
    }
    tables
}

/// Nested loop volume check
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinStrategyDetector;

impl Detector for JoinStrategyDetector {
    fn name(&self) -> &'static str {
        "join"
    }

    fn requires_plan(&self) -> bool {
        true
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue> {
        ctx.plan
            .map(|plan| detect_join_strategies(plan, ctx.config))
            .unwrap_or_default()
    }
}
