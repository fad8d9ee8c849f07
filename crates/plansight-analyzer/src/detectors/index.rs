//! Missing and inefficient index detection

use super::sql::{compared_columns, mentions_word, unqualified, where_columns};
use super::{DetectionContext, Detector};
use crate::analysis::{AnalyzerConfig, Issue, IssueType, Severity, TableStatsMap};
use crate::explain::{NodeType, PlanNode};

/// Flags large sequential and bitmap scans.
///
/// A scan with a filter is reported as `missing_index`; an unfiltered sequential scan
/// is reported as `full_table_scan`.
pub fn detect_scan_issues(plan: &PlanNode, config: &AnalyzerConfig) -> Vec<Issue> {
    plan.iter()
        .filter(|node| {
            matches!(
                node.node_type,
                NodeType::SequentialScan | NodeType::BitmapScan
            )
        })
        .filter_map(|node| {
            let rows = node.row_count()?;
            if rows < config.missing_index_row_threshold {
                return None;
            }
            let severity = scan_severity(rows, config);
            match node.filter.as_deref().map(str::trim) {
                Some(filter) if !filter.is_empty() => {
                    Some(missing_index(node, filter, rows, severity))
                }
                _ if node.node_type == NodeType::SequentialScan => {
                    Some(full_table_scan(node, rows, severity))
                }
                _ => None,
            }
        })
        .collect()
}

fn scan_severity(rows: u64, config: &AnalyzerConfig) -> Severity {
    if rows >= config.critical_row_threshold {
        Severity::Critical
    } else {
        Severity::High
    }
}

fn missing_index(node: &PlanNode, filter: &str, rows: u64, severity: Severity) -> Issue {
    let columns = compared_columns(filter);
    let target = node
        .relation_name
        .clone()
        .unwrap_or_else(|| node.display_name());

    let mut issue = Issue::new(
        IssueType::MissingIndex,
        severity,
        format!("{} filters {rows} rows without an index", node.display_name()),
        format!(
            "The scan reads about {rows} rows and discards those failing `{filter}`; \
             an index on the filtered columns would avoid reading the whole table."
        ),
    )
    .with_affected(target)
    .with_metric("row_count", rows as f64);

    for column in &columns {
        issue = issue.with_affected(column.clone());
    }

    match (&node.relation_name, columns.is_empty()) {
        (Some(table), false) => {
            let table = unqualified(table);
            issue.with_recommendation(format!(
                "CREATE INDEX idx_{}_{} ON {} ({});",
                table.to_lowercase(),
                columns.join("_"),
                table,
                columns.join(", ")
            ))
        }
        _ => issue.with_recommendation(format!("Add an index covering the predicate `{filter}`")),
    }
}

fn full_table_scan(node: &PlanNode, rows: u64, severity: Severity) -> Issue {
    let target = node
        .relation_name
        .clone()
        .unwrap_or_else(|| node.display_name());

    Issue::new(
        IssueType::FullTableScan,
        severity,
        format!("Full scan of {target} ({rows} rows)"),
        format!("Every row of {target} is read with no predicate to narrow the scan."),
    )
    .with_affected(target)
    .with_metric("row_count", rows as f64)
    .with_recommendation("Add a WHERE clause or LIMIT if the caller does not need every row")
}

/// Flags columns with few distinct values that the statement filters on.
///
/// Candidate columns come from the statement's WHERE clauses and from plan filters on
/// the table. Tables are visited in name order.
pub fn detect_low_selectivity(
    sql: &str,
    plan: Option<&PlanNode>,
    table_stats: &TableStatsMap,
    config: &AnalyzerConfig,
) -> Vec<Issue> {
    let sql_columns = where_columns(sql);
    let mut issues = Vec::new();

    for (table, stats) in table_stats {
        let live_rows = stats.n_live_tup.unwrap_or(0);
        if live_rows < config.min_selectivity_rows || stats.columns.is_empty() {
            continue;
        }

        let mut candidates: Vec<String> = Vec::new();
        if mentions_word(sql, unqualified(table)) {
            candidates.extend(sql_columns.iter().cloned());
        }
        if let Some(plan) = plan {
            for node in plan.iter().filter(|n| reads_table(n, table)) {
                if let Some(filter) = &node.filter {
                    candidates.extend(compared_columns(filter));
                }
            }
        }

        for (column, column_stats) in &stats.columns {
            if !candidates.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                continue;
            }
            let Some(selectivity) = column_stats.selectivity(live_rows) else {
                continue;
            };
            if selectivity >= config.low_selectivity_ratio {
                continue;
            }
            issues.push(
                Issue::new(
                    IssueType::InefficientIndex,
                    Severity::Medium,
                    format!("Low selectivity on {table}.{column}"),
                    format!(
                        "Only {:.2}% of the {live_rows} rows in {table} have a distinct \
                         `{column}`, so an index on it alone matches large parts of the table.",
                        selectivity * 100.0
                    ),
                )
                .with_affected(format!("{table}.{column}"))
                .with_metric("selectivity", selectivity)
                .with_metric("row_count", live_rows as f64)
                .with_recommendation(format!(
                    "Combine {column} with a more selective column in a composite index, \
                     or use a partial index on {table}"
                )),
            );
        }
    }

    issues
}

fn reads_table(node: &PlanNode, table: &str) -> bool {
    node.relation_name
        .as_deref()
        .is_some_and(|rel| unqualified(rel).eq_ignore_ascii_case(unqualified(table)))
}

/// Scan and selectivity checks
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexDetector;

impl Detector for IndexDetector {
    fn name(&self) -> &'static str {
        "index"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue> {
        let mut issues = ctx
            .plan
            .map(|plan| detect_scan_issues(plan, ctx.config))
            .unwrap_or_default();
        if let Some(table_stats) = ctx.table_stats {
            issues.extend(detect_low_selectivity(
                &ctx.masked_sql(),
                ctx.plan,
                table_stats,
                ctx.config,
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests;
