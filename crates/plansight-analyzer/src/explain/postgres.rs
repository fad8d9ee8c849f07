//! PostgreSQL EXPLAIN Normalizer
//!
//! Accepts the shapes PostgreSQL produces:
//! - `EXPLAIN (FORMAT JSON)`: an array holding one object whose `"Plan"` is the root node,
//!   with children nested under `"Plans"`
//! - a bare `{"Plan": ...}` object or a bare node object
//! - the default text format, carried as a JSON string
//!
//! # Examples
//!
//! ```
//! use plansight_analyzer::explain::{NodeType, postgres};
//! use serde_json::json;
//!
//! let raw = json!([{
//!     "Plan": {
//!         "Node Type": "Seq Scan",
//!         "Relation Name": "users",
//!         "Total Cost": 10.0,
//!         "Plan Rows": 100,
//!         "Filter": "(age > 30)"
//!     }
//! }]);
//!
//! let root = postgres::normalize(&raw).unwrap();
//! assert_eq!(root.node_type, NodeType::SequentialScan);
//! assert_eq!(root.filter.as_deref(), Some("(age > 30)"));
//! ```

use crate::error::{AnalyzerError, Result};
use crate::explain::plan::{NodeType, PlanNode};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static COST_SECTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(cost=([\d.]+)\.\.([\d.]+) rows=(\d+)(?: width=\d+)?\)").expect("valid regex")
});

static ACTUAL_SECTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(actual time=([\d.]+)\.\.([\d.]+) rows=(\d+)(?: loops=\d+)?\)")
        .expect("valid regex")
});

static SORT_SPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(Disk|Memory):\s*\d+kB").expect("valid regex"));

static HASH_BATCHES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bBatches:\s*(\d+)").expect("valid regex"));

/// Normalizes a PostgreSQL plan payload, or returns `None` for unrecognized shapes
pub fn normalize(raw: &Value) -> Option<PlanNode> {
    match raw {
        Value::Array(items) => items.first().and_then(|first| first.get("Plan")).map(node_or_leaf),
        Value::Object(obj) => {
            if let Some(plan) = obj.get("Plan") {
                Some(node_or_leaf(plan))
            } else if obj.contains_key("Node Type") {
                Some(node_or_leaf(raw))
            } else {
                None
            }
        }
        Value::String(text) => match parse_text_explain(text) {
            Ok(root) => Some(root),
            Err(err) => {
                tracing::debug!(%err, "unreadable text plan");
                None
            }
        },
        _ => None,
    }
}

/// Parses a node, recovering a malformed one as an `Other` leaf
fn node_or_leaf(value: &Value) -> PlanNode {
    parse_plan_node(value).unwrap_or_else(|err| {
        tracing::debug!(%err, "recovering plan node as leaf");
        let label = value
            .get("Node Type")
            .and_then(|v| v.as_str())
            .unwrap_or("Unrecognized");
        PlanNode::unrecognized(label)
    })
}

/// Parses a single plan node (and its subtree) from JSON
fn parse_plan_node(value: &Value) -> Result<PlanNode> {
    let obj = value
        .as_object()
        .ok_or_else(|| AnalyzerError::MalformedPlanShape("plan node is not an object".into()))?;

    let operation = obj
        .get("Node Type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AnalyzerError::MalformedPlanShape("missing Node Type".into()))?;

    let mut node = PlanNode::with_operation(NodeType::from_operation(operation), operation);

    node.relation_name = string_field(value, "Relation Name");
    node.estimated_rows = value.get("Plan Rows").and_then(row_count);
    node.actual_rows = value.get("Actual Rows").and_then(row_count);
    node.estimated_cost = value.get("Total Cost").and_then(non_negative);
    node.actual_time_ms = value.get("Actual Total Time").and_then(non_negative);
    node.filter = string_field(value, "Filter");
    node.index_name = string_field(value, "Index Name");
    node.sort_method = string_field(value, "Sort Method");
    node.sort_space_type = string_field(value, "Sort Space Type");
    node.hash_batches = value.get("Hash Batches").and_then(row_count);

    if let Some(plans) = obj.get("Plans").and_then(|v| v.as_array()) {
        node.children = plans.iter().map(node_or_leaf).collect();
    }

    Ok(node)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Reads a non-negative count; older servers emit row estimates as floats
pub(crate) fn row_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| non_negative(value).map(|f| f.round() as u64))
}

pub(crate) fn non_negative(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|f: &f64| *f >= 0.0)
}

/// Parses PostgreSQL text-format EXPLAIN output
///
/// Node lines are recognized by their `->` arrow (the first node has none); the arrow's
/// column decides nesting. Detail lines such as `Filter:` or `Sort Method:` attach to the
/// node above them.
pub fn parse_text_explain(text: &str) -> Result<PlanNode> {
    let mut stack: Vec<(usize, PlanNode)> = Vec::new();

    for line in text.lines() {
        let content = line.trim();
        if content.is_empty()
            || content.starts_with("Planning")
            || content.starts_with("Execution")
            || content.starts_with("QUERY PLAN")
            || content.chars().all(|c| c == '-')
        {
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        if stack.is_empty() || content.starts_with("->") {
            let node = parse_text_line(content.trim_start_matches("->").trim());
            while stack.len() > 1 && stack.last().is_some_and(|(i, _)| *i >= indent) {
                attach_top(&mut stack);
            }
            stack.push((indent, node));
        } else if let Some((_, current)) = stack.last_mut() {
            apply_detail_line(current, content);
        }
    }

    while stack.len() > 1 {
        attach_top(&mut stack);
    }

    stack
        .pop()
        .map(|(_, root)| root)
        .ok_or_else(|| AnalyzerError::MalformedPlanShape("no plan nodes in text output".into()))
}

fn attach_top(stack: &mut Vec<(usize, PlanNode)>) {
    if let Some((_, child)) = stack.pop()
        && let Some((_, parent)) = stack.last_mut()
    {
        parent.children.push(child);
    }
}

/// Parses "Index Scan using users_pkey on users u  (cost=0.29..8.31 rows=1 width=40)"
fn parse_text_line(content: &str) -> PlanNode {
    let label = match content.find(" (cost=").or_else(|| content.find(" (actual")) {
        Some(idx) => content[..idx].trim(),
        None => content,
    };

    let (operation, target) = match label.find(" on ") {
        Some(idx) => (&label[..idx], Some(&label[idx + 4..])),
        None => (label, None),
    };

    let (operation, index_name) = match operation.find(" using ") {
        Some(idx) => (&operation[..idx], Some(operation[idx + 7..].trim())),
        None => (operation, None),
    };

    let mut node = PlanNode::with_operation(NodeType::from_operation(operation), operation);
    node.relation_name = target
        .and_then(|t| t.split_whitespace().next())
        .map(String::from);
    node.index_name = index_name.map(String::from);

    if let Some(caps) = COST_SECTION_REGEX.captures(content) {
        node.estimated_cost = caps[2].parse().ok();
        node.estimated_rows = caps[3].parse().ok();
    }
    if let Some(caps) = ACTUAL_SECTION_REGEX.captures(content) {
        node.actual_time_ms = caps[2].parse().ok();
        node.actual_rows = caps[3].parse().ok();
    }

    node
}

fn apply_detail_line(node: &mut PlanNode, content: &str) {
    if let Some(filter) = content.strip_prefix("Filter:") {
        node.filter = Some(filter.trim().to_string());
    } else if let Some(method) = content.strip_prefix("Sort Method:") {
        let method = method.trim();
        let name_end = method.find("  ").unwrap_or(method.len());
        node.sort_method = Some(method[..name_end].trim().to_string());
        if let Some(caps) = SORT_SPACE_REGEX.captures(method) {
            node.sort_space_type = Some(caps[1].to_string());
        }
    } else if let Some(caps) = HASH_BATCHES_REGEX.captures(content) {
        node.hash_batches = caps[1].parse().ok();
    }
}
