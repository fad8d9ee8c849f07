use super::*;
use plansight_analyzer::{QueryStats, TableStatsMap};
use pretty_assertions::assert_eq;
use std::io::Write;

fn temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_read_source_file() {
    let file = temp_file("SELECT * FROM users");
    let sql = read_source(file.path().to_str().unwrap()).unwrap();
    assert_eq!(sql, "SELECT * FROM users");
}

#[test]
fn test_read_source_missing() {
    let err = read_source("/definitely/not/here.sql").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.sql"));
}

#[test]
fn test_load_json_plan() {
    let file = temp_file(r#"[{"Plan": {"Node Type": "Seq Scan"}}]"#);
    let plan = load_plan(file.path()).unwrap();
    assert!(plan.is_array());
}

#[test]
fn test_load_text_plan() {
    let text = "Seq Scan on users  (cost=0.00..35.50 rows=2550 width=4)";
    let file = temp_file(text);
    assert_eq!(load_plan(file.path()).unwrap(), Value::String(text.to_string()));
}

#[test]
fn test_load_stats() {
    let file = temp_file(r#"{"users": {"seq_scan": 10, "idx_scan": 1}}"#);
    let stats: TableStatsMap = load_json(file.path()).unwrap();
    assert_eq!(stats["users"].seq_scan, Some(10));

    let file = temp_file(r#"{"buffer_hits": 5, "buffer_reads": 5}"#);
    let stats: QueryStats = load_json(file.path()).unwrap();
    assert_eq!(stats.cache_hit_ratio(), Some(0.5));
}

#[test]
fn test_load_json_invalid() {
    let file = temp_file("{not json");
    let err = load_json::<QueryStats>(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("Invalid JSON"));
}

#[test]
fn test_load_config_file() {
    let file = temp_file(r#"{"max_joins": 2}"#);
    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.max_joins, 2);
    assert_eq!(config.max_recommendations, 10);
}
