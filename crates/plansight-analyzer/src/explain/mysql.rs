//! MySQL EXPLAIN Normalizer
//!
//! Maps `EXPLAIN FORMAT=JSON` output onto the canonical tree. MySQL structures its plans
//! differently from PostgreSQL:
//! - the root is a `"query_block"` instead of `"Plan"`
//! - scans are described by `"access_type"` rather than a node label
//! - joins are a flat `"nested_loop"` array, rebuilt here as a left-deep chain
//! - ORDER BY / GROUP BY / DISTINCT wrap their input as `ordering_operation`,
//!   `grouping_operation` and `duplicates_removal`
//!
//! # Examples
//!
//! ```
//! use plansight_analyzer::explain::{NodeType, mysql};
//! use serde_json::json;
//!
//! let raw = json!({
//!     "query_block": {
//!         "select_id": 1,
//!         "table": {"table_name": "users", "access_type": "ALL", "rows_examined_per_scan": 100}
//!     }
//! });
//!
//! let root = mysql::normalize(&raw).unwrap();
//! assert_eq!(root.node_type, NodeType::SequentialScan);
//! ```

use crate::explain::plan::{NodeType, PlanNode};
use crate::explain::postgres::{non_negative, row_count};
use serde_json::Value;

/// Normalizes a MySQL plan payload, or returns `None` when there is no `query_block`.
///
/// A JSON string holding the FORMAT=JSON document is accepted too, since drivers often
/// hand the EXPLAIN column back as text.
pub fn normalize(raw: &Value) -> Option<PlanNode> {
    if let Value::String(text) = raw {
        let parsed: Value = serde_json::from_str(text).ok()?;
        return normalize(&parsed);
    }
    raw.get("query_block").map(parse_query_block)
}

/// Parses a query_block, dispatching on whichever operation wraps it
fn parse_query_block(block: &Value) -> PlanNode {
    let mut node = if let Some(ordering) = block.get("ordering_operation") {
        parse_wrapping_operation(ordering, NodeType::Sort, "ORDER BY")
    } else if let Some(grouping) = block.get("grouping_operation") {
        parse_wrapping_operation(grouping, NodeType::Aggregate, "GROUP BY")
    } else if let Some(distinct) = block.get("duplicates_removal") {
        parse_wrapping_operation(distinct, NodeType::Other, "DISTINCT")
    } else if let Some(inner) = parse_input(block) {
        inner
    } else if let Some(union) = block.get("union_result") {
        parse_union_result(union)
    } else {
        PlanNode::unrecognized("query_block")
    };

    if node.estimated_cost.is_none() {
        node.estimated_cost = block
            .get("cost_info")
            .and_then(|c| c.get("query_cost"))
            .and_then(non_negative);
    }

    node
}

/// ORDER BY, GROUP BY and DISTINCT all wrap a single input
fn parse_wrapping_operation(op: &Value, node_type: NodeType, label: &str) -> PlanNode {
    let mut node = PlanNode::with_operation(node_type, label);

    let filesort = flag(op, "using_filesort");
    let temporary = flag(op, "using_temporary_table");
    node.sort_method = match (filesort, temporary) {
        (true, true) => Some("filesort (temporary table)".to_string()),
        (true, false) => Some("filesort".to_string()),
        (false, true) => Some("temporary table".to_string()),
        (false, false) => None,
    };

    let child = if let Some(input) = parse_input(op) {
        Some(input)
    } else if let Some(grouping) = op.get("grouping_operation") {
        Some(parse_wrapping_operation(
            grouping,
            NodeType::Aggregate,
            "GROUP BY",
        ))
    } else {
        op.get("duplicates_removal")
            .map(|distinct| parse_wrapping_operation(distinct, NodeType::Other, "DISTINCT"))
    };
    node.children.extend(child);

    node
}

/// Parses the `nested_loop` or `table` input of an operation
fn parse_input(op: &Value) -> Option<PlanNode> {
    if let Some(nested_loop) = op.get("nested_loop") {
        Some(parse_nested_loop(nested_loop))
    } else {
        op.get("table").map(parse_table_access)
    }
}

/// Builds a left-deep nested loop chain from MySQL's flat join list
fn parse_nested_loop(nested_loop: &Value) -> PlanNode {
    let Some(entries) = nested_loop.as_array() else {
        tracing::debug!("nested_loop is not an array");
        return PlanNode::unrecognized("nested_loop");
    };

    let mut tables = entries.iter().map(|entry| match entry.get("table") {
        Some(table) => parse_table_access(table),
        None => PlanNode::unrecognized("nested_loop entry"),
    });

    let Some(first) = tables.next() else {
        return PlanNode::unrecognized("nested_loop");
    };

    tables.fold(first, |outer, inner| {
        let rows = match (outer.estimated_rows, inner.estimated_rows) {
            (Some(a), Some(b)) => Some(a.saturating_mul(b.max(1))),
            _ => None,
        };
        let mut join = PlanNode::with_operation(NodeType::NestedLoop, "Nested Loop")
            .with_child(outer)
            .with_child(inner);
        join.estimated_rows = rows;
        join
    })
}

/// Parses a single table access
fn parse_table_access(table: &Value) -> PlanNode {
    if !table.is_object() {
        return PlanNode::unrecognized("table");
    }

    let access_type = table
        .get("access_type")
        .and_then(|v| v.as_str())
        .unwrap_or("ALL");

    let mut node_type = access_type_to_node_type(access_type);
    if node_type == NodeType::IndexScan && flag(table, "using_index") {
        node_type = NodeType::IndexOnlyScan;
    }

    let operation = format!("{} access", access_type.to_uppercase());
    let mut node = PlanNode::with_operation(node_type, operation);
    node.relation_name = table
        .get("table_name")
        .and_then(|v| v.as_str())
        .map(String::from);
    node.estimated_rows = table.get("rows_examined_per_scan").and_then(row_count);
    node.filter = table
        .get("attached_condition")
        .and_then(|v| v.as_str())
        .map(String::from);
    node.index_name = table
        .get("key")
        .and_then(|v| v.as_str())
        .filter(|k| !k.eq_ignore_ascii_case("null"))
        .map(String::from);

    if let Some(cost_info) = table.get("cost_info") {
        let read = cost_info.get("read_cost").and_then(non_negative);
        let eval = cost_info.get("eval_cost").and_then(non_negative);
        node.estimated_cost = cost_info
            .get("prefix_cost")
            .and_then(non_negative)
            .or_else(|| read.map(|r| r + eval.unwrap_or(0.0)));
    }

    if let Some(subqueries) = table.get("attached_subqueries").and_then(|v| v.as_array()) {
        for subquery in subqueries {
            if let Some(block) = subquery.get("query_block") {
                node.children.push(parse_query_block(block));
            }
        }
    }

    node
}

fn parse_union_result(union: &Value) -> PlanNode {
    let mut node = PlanNode::with_operation(NodeType::Other, "UNION");

    if let Some(specs) = union.get("query_specifications").and_then(|v| v.as_array()) {
        for spec in specs {
            if let Some(block) = spec.get("query_block") {
                node.children.push(parse_query_block(block));
            }
        }
    }

    node
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

/// Maps MySQL access_type to the canonical node type
fn access_type_to_node_type(access_type: &str) -> NodeType {
    match access_type.to_lowercase().as_str() {
        "all" => NodeType::SequentialScan,
        "index_merge" => NodeType::BitmapScan,
        "index" | "range" | "ref" | "eq_ref" | "const" | "system" | "ref_or_null"
        | "fulltext" | "unique_subquery" | "index_subquery" => NodeType::IndexScan,
        _ => NodeType::Other,
    }
}
