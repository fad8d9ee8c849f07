use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_group_by_without_limit() {
    let issue = detect_reporting_patterns(
        "SELECT region, SUM(total) FROM orders GROUP BY region",
        &AnalyzerConfig::default(),
    )
    .unwrap();

    assert_eq!(issue.issue_type, IssueType::InefficientReporting);
    assert_eq!(issue.severity, Severity::Low);
    assert_eq!(issue.metric("aggregate_count"), Some(1.0));
}

#[test]
fn test_many_aggregates_is_medium() {
    let issue = detect_reporting_patterns(
        "SELECT COUNT(*), SUM(total), AVG(total) FROM orders",
        &AnalyzerConfig::default(),
    )
    .unwrap();
    assert_eq!(issue.severity, Severity::Medium);
}

#[test]
fn test_window_function_is_medium() {
    let issue = detect_reporting_patterns(
        "SELECT id, RANK() OVER (ORDER BY total DESC) FROM orders",
        &AnalyzerConfig::default(),
    )
    .unwrap();
    assert_eq!(issue.severity, Severity::Medium);
    assert_eq!(issue.metric("window_function_count"), Some(1.0));
}

#[test]
fn test_bounded_queries_pass() {
    let config = AnalyzerConfig::default();
    for sql in [
        "SELECT region, SUM(total) FROM orders GROUP BY region LIMIT 10",
        "SELECT region, SUM(total) FROM orders GROUP BY region FETCH FIRST 10 ROWS ONLY",
        "SELECT TOP 10 region, SUM(total) FROM orders GROUP BY region",
    ] {
        assert!(detect_reporting_patterns(sql, &config).is_none(), "{sql}");
    }
}

#[test]
fn test_single_aggregate_not_reporting() {
    assert!(
        detect_reporting_patterns("SELECT COUNT(*) FROM users", &AnalyzerConfig::default())
            .is_none()
    );
}

#[test]
fn test_keywords_in_literals_ignored() {
    assert!(
        detect_reporting_patterns(
            "SELECT id FROM notes WHERE body = 'GROUP BY x'",
            &AnalyzerConfig::default()
        )
        .is_none()
    );
}
