//! Tests for index detection

use super::*;
use crate::analysis::{ColumnStats, TableStats};

fn seq_scan(table: &str, rows: u64) -> PlanNode {
    PlanNode::with_operation(NodeType::SequentialScan, "Seq Scan")
        .with_relation(table)
        .with_estimated_rows(rows)
}

mod scan_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filtered_scan_is_missing_index() {
        let plan = seq_scan("orders", 5000).with_filter("(total > 100::numeric)");
        let issues = detect_scan_issues(&plan, &AnalyzerConfig::default());

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.issue_type, IssueType::MissingIndex);
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.affected_objects, vec!["orders", "total"]);
        assert_eq!(issue.metric("row_count"), Some(5000.0));
        assert_eq!(
            issue.recommendations,
            vec!["CREATE INDEX idx_orders_total ON orders (total);"]
        );
    }

    #[test]
    fn test_negated_filter_keeps_column() {
        let plan = seq_scan("orders", 5000)
            .with_filter("((region_id = 3) AND (status <> ALL ('{a,b}'::text[])) AND (kind NOT IN (1, 2)))");
        let issues = detect_scan_issues(&plan, &AnalyzerConfig::default());

        assert_eq!(issues[0].affected_objects, vec!["orders", "region_id", "status", "kind"]);
    }

    #[test]
    fn test_severity_scales_with_rows() {
        let config = AnalyzerConfig::default();
        let big = seq_scan("orders", 10_000).with_filter("(total > 1)");
        assert_eq!(detect_scan_issues(&big, &config)[0].severity, Severity::Critical);

        let small = seq_scan("orders", 999).with_filter("(total > 1)");
        assert!(detect_scan_issues(&small, &config).is_empty());
    }

    #[test]
    fn test_actual_rows_count() {
        let plan = PlanNode::new(NodeType::SequentialScan)
            .with_relation("orders")
            .with_estimated_rows(10)
            .with_actual_rows(2000)
            .with_filter("(status = 'x'::text)");
        let issues = detect_scan_issues(&plan, &AnalyzerConfig::default());
        assert_eq!(issues[0].metric("row_count"), Some(2000.0));
    }

    #[test]
    fn test_unfiltered_scan_is_full_table_scan() {
        let plan = seq_scan("events", 20_000);
        let issues = detect_scan_issues(&plan, &AnalyzerConfig::default());

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::FullTableScan);
        assert_eq!(issues[0].severity, Severity::Critical);
    }

    #[test]
    fn test_bitmap_scan_needs_filter() {
        let config = AnalyzerConfig::default();
        let bare = PlanNode::new(NodeType::BitmapScan)
            .with_relation("orders")
            .with_estimated_rows(5000);
        assert!(detect_scan_issues(&bare, &config).is_empty());

        let filtered = bare.with_filter("(region = 3)");
        assert_eq!(
            detect_scan_issues(&filtered, &config)[0].issue_type,
            IssueType::MissingIndex
        );
    }

    #[test]
    fn test_index_scan_ignored() {
        let plan = PlanNode::new(NodeType::IndexScan)
            .with_relation("orders")
            .with_estimated_rows(50_000)
            .with_filter("(total > 1)");
        assert!(detect_scan_issues(&plan, &AnalyzerConfig::default()).is_empty());
    }

    #[test]
    fn test_nested_children_found() {
        let plan = PlanNode::new(NodeType::NestedLoop)
            .with_estimated_rows(50_000)
            .with_child(seq_scan("users", 2000).with_filter("(active = true)"))
            .with_child(seq_scan("orders", 3000).with_filter("(o.user_id = 1)"));
        let issues = detect_scan_issues(&plan, &AnalyzerConfig::default());

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].affected_objects[0], "users");
        assert_eq!(issues[1].affected_objects[0], "orders");
    }

    #[test]
    fn test_filter_without_columns_gets_generic_recommendation() {
        let plan = seq_scan("t", 5000).with_filter("(random() < 0.5)");
        let issues = detect_scan_issues(&plan, &AnalyzerConfig::default());
        assert!(issues[0].recommendations[0].starts_with("Add an index covering"));
    }
}

mod selectivity_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stats() -> TableStatsMap {
        TableStatsMap::from([(
            "users".to_string(),
            TableStats::new()
                .with_live_rows(100_000)
                .with_column("status", ColumnStats::with_distinct(3.0))
                .with_column("email", ColumnStats::with_distinct(-1.0)),
        )])
    }

    #[test]
    fn test_low_selectivity_column_in_where() {
        let issues = detect_low_selectivity(
            "SELECT id FROM users WHERE status = 'active' AND email = 'a@b.c'",
            None,
            &stats(),
            &AnalyzerConfig::default(),
        );

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.issue_type, IssueType::InefficientIndex);
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.affected_objects, vec!["users.status"]);
        assert_eq!(issue.metric("row_count"), Some(100_000.0));
        assert!(issue.metric("selectivity").unwrap() < 0.001);
    }

    #[test]
    fn test_column_not_filtered() {
        let issues = detect_low_selectivity(
            "SELECT status FROM users WHERE email = 'a@b.c'",
            None,
            &stats(),
            &AnalyzerConfig::default(),
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_other_table_ignored() {
        let issues = detect_low_selectivity(
            "SELECT id FROM accounts WHERE status = 'active'",
            None,
            &stats(),
            &AnalyzerConfig::default(),
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_plan_filter_supplies_candidates() {
        let plan = PlanNode::new(NodeType::IndexScan)
            .with_relation("users")
            .with_filter("((status)::text = 'active'::text)");
        let issues = detect_low_selectivity(
            "SELECT id FROM u",
            Some(&plan),
            &stats(),
            &AnalyzerConfig::default(),
        );
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_small_table_skipped() {
        let stats = TableStatsMap::from([(
            "users".to_string(),
            TableStats::new()
                .with_live_rows(50)
                .with_column("status", ColumnStats::with_distinct(2.0)),
        )]);
        let issues = detect_low_selectivity(
            "SELECT id FROM users WHERE status = 'x'",
            None,
            &stats,
            &AnalyzerConfig::default(),
        );
        assert!(issues.is_empty());
    }
}
