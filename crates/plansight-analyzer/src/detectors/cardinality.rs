//! Row estimate accuracy

use super::{DetectionContext, Detector};
use crate::analysis::{AnalyzerConfig, Issue, IssueType, Severity};
use crate::explain::PlanNode;

/// `max(est, act) / max(min(est, act), 1)` for nodes with both counts
pub fn cardinality_ratio(node: &PlanNode) -> Option<f64> {
    let estimated = node.estimated_rows?;
    let actual = node.actual_rows?;
    let high = estimated.max(actual) as f64;
    let low = estimated.min(actual).max(1) as f64;
    Some(high / low)
}

/// Flags every node whose estimate is off by at least the configured ratio
pub fn detect_cardinality_errors(plan: &PlanNode, config: &AnalyzerConfig) -> Vec<Issue> {
    plan.iter()
        .filter_map(|node| {
            let ratio = cardinality_ratio(node)?;
            if ratio < config.cardinality_ratio_threshold {
                return None;
            }
            let severity = if ratio >= config.cardinality_critical_ratio {
                Severity::Critical
            } else {
                Severity::High
            };
            Some(misestimate(node, ratio, severity))
        })
        .collect()
}

fn misestimate(node: &PlanNode, ratio: f64, severity: Severity) -> Issue {
    let estimated = node.estimated_rows.unwrap_or(0);
    let actual = node.actual_rows.unwrap_or(0);
    let direction = if actual > estimated { "under" } else { "over" };

    let issue = Issue::new(
        IssueType::WrongCardinality,
        severity,
        format!("Row estimate off by {ratio:.1}x at {}", node.display_name()),
        format!(
            "The planner expected {estimated} rows but got {actual}; it {direction}estimated \
             by {ratio:.1}x, which can lead to a poor join order or join method."
        ),
    )
    .with_affected(node.display_name())
    .with_metric("ratio", ratio)
    .with_metric("estimated_rows", estimated as f64)
    .with_metric("actual_rows", actual as f64);

    match &node.relation_name {
        Some(table) => issue
            .with_recommendation(format!("ANALYZE {table};"))
            .with_recommendation(format!(
                "Raise the statistics target on the filtered columns of {table}"
            )),
        None => issue.with_recommendation("Run ANALYZE on the tables feeding this operation"),
    }
}

/// Estimate versus actual row count check
#[derive(Debug, Clone, Copy, Default)]
pub struct CardinalityDetector;

impl Detector for CardinalityDetector {
    fn name(&self) -> &'static str {
        "cardinality"
    }

    fn requires_plan(&self) -> bool {
        true
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue> {
        ctx.plan
            .map(|plan| detect_cardinality_errors(plan, ctx.config))
            .unwrap_or_default()
    }
}
