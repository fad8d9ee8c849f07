//! I/O workload detection

use super::{DetectionContext, Detector};
use crate::analysis::{AnalyzerConfig, Issue, IssueType, QueryStats, Severity};
use crate::explain::{NodeType, PlanNode};

/// Flags a buffer cache hit ratio below the configured threshold
pub fn detect_cache_pressure(stats: &QueryStats, config: &AnalyzerConfig) -> Option<Issue> {
    let ratio = stats.cache_hit_ratio()?;
    if ratio >= config.cache_hit_ratio_threshold {
        return None;
    }
    let severity = if ratio < config.severe_cache_hit_ratio {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(
        Issue::new(
            IssueType::HighIoWorkload,
            severity,
            format!("Low buffer cache hit ratio ({:.1}%)", ratio * 100.0),
            format!(
                "Only {:.1}% of the blocks this query touched were already cached; the rest \
                 were read from disk.",
                ratio * 100.0
            ),
        )
        .with_metric("cache_hit_ratio", ratio)
        .with_metric("buffer_hits", stats.buffer_hits.unwrap_or(0) as f64)
        .with_metric("buffer_reads", stats.buffer_reads.unwrap_or(0) as f64)
        .with_recommendation("Reduce the blocks read with a more selective index")
        .with_recommendation("Review shared_buffers against the working set size"),
    )
}

/// Whether a node spilled to disk: an external or on-disk sort, or a multi-batch hash
pub fn spills_to_disk(node: &PlanNode) -> bool {
    let external_sort = node.node_type == NodeType::Sort
        && (node
            .sort_method
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains("external"))
            || node
                .sort_space_type
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("disk")));
    external_sort || node.hash_batches.is_some_and(|batches| batches > 1)
}

/// Collects every spilling node into one issue
pub fn detect_disk_operations(plan: &PlanNode) -> Option<Issue> {
    let spilled: Vec<&PlanNode> = plan.iter().filter(|n| spills_to_disk(n)).collect();
    if spilled.is_empty() {
        return None;
    }

    let issue = Issue::new(
        IssueType::HighIoWorkload,
        Severity::Medium,
        "Operations spilled to disk",
        format!(
            "{} operation(s) ran out of working memory and wrote temporary data to disk.",
            spilled.len()
        ),
    )
    .with_metric("disk_operations", spilled.len() as f64)
    .with_recommendation("Increase work_mem so sorts and hashes fit in memory")
    .with_recommendation("Reduce the rows reaching the sort or hash with an earlier filter");

    Some(
        spilled
            .iter()
            .fold(issue, |issue, node| issue.with_affected(node.display_name())),
    )
}

/// Cache hit ratio and disk spill check
#[derive(Debug, Clone, Copy, Default)]
pub struct IoWorkloadDetector;

impl Detector for IoWorkloadDetector {
    fn name(&self) -> &'static str {
        "io"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue> {
        let cache = ctx
            .query_stats
            .and_then(|stats| detect_cache_pressure(stats, ctx.config));
        let disk = ctx.plan.and_then(detect_disk_operations);
        cache.into_iter().chain(disk).collect()
    }
}

#[cfg(test)]
mod tests;
