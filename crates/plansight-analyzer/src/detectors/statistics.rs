//! Statistics freshness

use super::{DetectionContext, Detector};
use crate::analysis::{AnalyzerConfig, Issue, IssueType, Severity, TableStatsMap};
use chrono::{DateTime, Duration, Utc};

/// Flags tables in use whose last ANALYZE is missing or older than the staleness window.
///
/// Tables are visited in name order.
pub fn detect_stale_statistics(
    table_stats: &TableStatsMap,
    now: DateTime<Utc>,
    config: &AnalyzerConfig,
) -> Vec<Issue> {
    // a window too large for chrono never expires
    let window = Duration::try_days(config.stale_statistics_days);

    table_stats
        .iter()
        .filter_map(|(table, stats)| {
            let activity = stats.scan_activity();
            if activity < config.min_scan_activity {
                return None;
            }

            let last_analyzed = stats.last_analyzed();
            let description = match last_analyzed {
                None => format!("{table} has never been analyzed but has been scanned {activity} times."),
                Some(at) if window.is_some_and(|window| now - at > window) => format!(
                    "{table} was last analyzed {} days ago, so the planner is working from \
                     outdated row counts and value distributions.",
                    (now - at).num_days()
                ),
                Some(_) => return None,
            };

            let mut issue = Issue::new(
                IssueType::StaleStatistics,
                Severity::Medium,
                format!("Stale statistics on {table}"),
                description,
            )
            .with_affected(table.clone())
            .with_metric("scan_count", activity as f64)
            .with_recommendation(format!("ANALYZE {table};"));

            if let Some(at) = last_analyzed {
                issue = issue.with_metric("days_since_analyze", (now - at).num_days() as f64);
            }
            Some(issue)
        })
        .collect()
}

/// Staleness check over table statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsDetector;

impl Detector for StatisticsDetector {
    fn name(&self) -> &'static str {
        "statistics"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue> {
        ctx.table_stats
            .map(|stats| detect_stale_statistics(stats, ctx.reference_time, ctx.config))
            .unwrap_or_default()
    }
}
