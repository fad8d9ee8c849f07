use super::*;
use crate::explain::NodeType;
use pretty_assertions::assert_eq;

fn joined_sql(joins: usize) -> String {
    (0..joins).fold("SELECT t0.id FROM t0".to_string(), |sql, i| {
        format!("{sql} LEFT OUTER JOIN t{n} ON t{n}.parent_id = t{i}.id", n = i + 1)
    })
}

#[test]
fn test_count_sql_joins() {
    assert_eq!(count_sql_joins(&joined_sql(3)), 3);
    assert_eq!(count_sql_joins("SELECT 'JOIN' FROM joins -- JOIN"), 0);
}

#[test]
fn test_many_joins() {
    let issues = detect_orm_patterns(&joined_sql(6), None, None, &AnalyzerConfig::default());

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].issue_type, IssueType::OrmGenerated);
    assert_eq!(issues[0].severity, Severity::Medium);
    assert_eq!(issues[0].metric("join_count"), Some(6.0));
}

#[test]
fn test_join_threshold_is_exclusive() {
    assert!(detect_orm_patterns(&joined_sql(5), None, None, &AnalyzerConfig::default()).is_empty());
}

#[test]
fn test_plan_joins_count() {
    let plan = (0..6).fold(PlanNode::new(NodeType::SequentialScan), |child, _| {
        PlanNode::new(NodeType::HashJoin).with_child(child)
    });
    let issues = detect_orm_patterns("SELECT * FROM v", Some(&plan), None, &AnalyzerConfig::default());
    assert_eq!(issues[0].metric("join_count"), Some(6.0));
}

#[test]
fn test_n_plus_one() {
    let context = QueryContext {
        similar_query_count: Some(25),
        source: Some("django".to_string()),
    };
    let issues = detect_orm_patterns(
        "SELECT id FROM comments WHERE post_id = 7",
        None,
        Some(&context),
        &AnalyzerConfig::default(),
    );

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::High);
    assert_eq!(issues[0].affected_objects, vec!["django"]);
    assert_eq!(issues[0].metric("similar_query_count"), Some(25.0));
}

#[test]
fn test_few_similar_queries() {
    let context = QueryContext::with_similar_queries(9);
    assert!(
        detect_orm_patterns("SELECT 1", None, Some(&context), &AnalyzerConfig::default())
            .is_empty()
    );
}
