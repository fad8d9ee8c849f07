//! Row-Set Plan Normalizer
//!
//! SQL Server (`SET SHOWPLAN_ALL ON` / `SET STATISTICS PROFILE ON`) and Oracle
//! (`PLAN_TABLE` / `V$SQL_PLAN`) both describe a plan as flat rows linked by parent ids.
//! Both are rebuilt here into the canonical tree. Opaque payloads (XML showplans,
//! DBMS_XPLAN text) are not interpreted and yield `None`.
//!
//! Column lookups are case-insensitive, since drivers differ on how they report them.

use crate::explain::plan::{NodeType, PlanNode};
use crate::explain::postgres::{non_negative, row_count};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static SQL_SERVER_OBJECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"OBJECT:\(([^)]*)\)").expect("valid regex"));

static SQL_SERVER_WHERE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"WHERE:\((.*)\)\s*$").expect("valid regex"));

/// One plan row before the tree is assembled
struct FlatRow {
    id: i64,
    parent: Option<i64>,
    node: PlanNode,
}

/// Normalizes SHOWPLAN_ALL / STATISTICS PROFILE rows
pub fn normalize_sql_server(raw: &Value) -> Option<PlanNode> {
    let rows = raw.as_array()?;
    let flat = rows
        .iter()
        .filter_map(|row| row.as_object())
        .filter_map(|row| {
            let id = field(row, "NodeId").and_then(as_id)?;
            let physical_op = field(row, "PhysicalOp").and_then(|v| v.as_str())?;
            let logical_op = field(row, "LogicalOp")
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            let mut node =
                PlanNode::with_operation(sql_server_node_type(physical_op, logical_op), physical_op);
            node.estimated_rows = field(row, "EstimateRows").and_then(row_count);
            node.actual_rows = field(row, "Rows").and_then(row_count);
            node.estimated_cost = field(row, "TotalSubtreeCost").and_then(non_negative);

            if let Some(argument) = field(row, "Argument").and_then(|v| v.as_str()) {
                apply_sql_server_argument(&mut node, argument);
            }

            Some(FlatRow {
                id,
                parent: field(row, "Parent").and_then(as_id),
                node,
            })
        })
        .collect();

    build_tree(flat)
}

/// Normalizes PLAN_TABLE rows
pub fn normalize_oracle(raw: &Value) -> Option<PlanNode> {
    let rows = raw.as_array()?;
    let flat = rows
        .iter()
        .filter_map(|row| row.as_object())
        .filter_map(|row| {
            let id = field(row, "ID").and_then(as_id)?;
            let operation = field(row, "OPERATION").and_then(|v| v.as_str())?;
            let options = field(row, "OPTIONS")
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            let label = if options.is_empty() {
                operation.to_string()
            } else {
                format!("{operation} {options}")
            };
            let mut node = PlanNode::with_operation(oracle_node_type(operation, options), label);
            node.relation_name = field(row, "OBJECT_NAME")
                .and_then(|v| v.as_str())
                .filter(|_| !operation.eq_ignore_ascii_case("INDEX"))
                .map(String::from);
            node.index_name = field(row, "OBJECT_NAME")
                .and_then(|v| v.as_str())
                .filter(|_| operation.eq_ignore_ascii_case("INDEX"))
                .map(String::from);
            node.estimated_rows = field(row, "CARDINALITY").and_then(row_count);
            node.actual_rows = field(row, "LAST_OUTPUT_ROWS").and_then(row_count);
            node.estimated_cost = field(row, "COST").and_then(non_negative);
            node.filter = field(row, "FILTER_PREDICATES")
                .and_then(|v| v.as_str())
                .map(String::from);

            Some(FlatRow {
                id,
                parent: field(row, "PARENT_ID").and_then(as_id),
                node,
            })
        })
        .collect();

    build_tree(flat)
}

fn sql_server_node_type(physical_op: &str, logical_op: &str) -> NodeType {
    match physical_op {
        "Table Scan" | "Clustered Index Scan" => NodeType::SequentialScan,
        "Index Seek" | "Clustered Index Seek" | "Index Scan" => NodeType::IndexScan,
        "Nested Loops" => NodeType::NestedLoop,
        "Merge Join" => NodeType::MergeJoin,
        "Hash Match" if logical_op.contains("Join") => NodeType::HashJoin,
        "Hash Match" if logical_op.contains("Aggregate") => NodeType::Aggregate,
        "Stream Aggregate" => NodeType::Aggregate,
        "Sort" => NodeType::Sort,
        other => NodeType::from_operation(other),
    }
}

fn oracle_node_type(operation: &str, options: &str) -> NodeType {
    let operation = operation.to_uppercase();
    let options = options.to_uppercase();
    match operation.as_str() {
        "TABLE ACCESS" if options.contains("FULL") => NodeType::SequentialScan,
        "TABLE ACCESS" => NodeType::IndexScan,
        "SORT" if options.contains("AGGREGATE") || options.contains("GROUP BY") => {
            NodeType::Aggregate
        }
        _ => NodeType::from_operation(&format!("{operation} {options}")),
    }
}

/// Pulls the table, index and residual predicate out of a SHOWPLAN Argument column,
/// e.g. `OBJECT:([shop].[dbo].[users].[IX_users_email]), WHERE:([u].[age]>(30))`
fn apply_sql_server_argument(node: &mut PlanNode, argument: &str) {
    if let Some(caps) = SQL_SERVER_OBJECT_REGEX.captures(argument) {
        let parts: Vec<&str> = caps[1]
            .split(" AS ")
            .next()
            .unwrap_or_default()
            .split('.')
            .map(|p| p.trim().trim_start_matches('[').trim_end_matches(']'))
            .collect();
        match parts.len() {
            0 => {}
            1 => node.relation_name = Some(parts[0].to_string()),
            2 | 3 => node.relation_name = parts.last().map(|p| p.to_string()),
            _ => {
                node.relation_name = Some(parts[2].to_string());
                node.index_name = Some(parts[3].to_string());
            }
        }
    }

    if let Some(caps) = SQL_SERVER_WHERE_REGEX.captures(argument) {
        node.filter = Some(caps[1].to_string());
    }
}

/// Assembles flat rows into a tree rooted at the first row without a known parent.
///
/// Each row is placed at most once, so cyclic parent links cannot recurse forever.
fn build_tree(rows: Vec<FlatRow>) -> Option<PlanNode> {
    let ids: HashSet<i64> = rows.iter().map(|r| r.id).collect();
    let root = rows
        .iter()
        .position(|r| r.parent.is_none_or(|p| p == r.id || !ids.contains(&p)))?;

    let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if let Some(parent) = row.parent
            && parent != row.id
            && ids.contains(&parent)
        {
            children.entry(parent).or_default().push(idx);
        }
    }

    let row_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut slots: Vec<Option<PlanNode>> = rows.into_iter().map(|r| Some(r.node)).collect();
    assemble(root, &row_ids, &children, &mut slots)
}

fn assemble(
    idx: usize,
    row_ids: &[i64],
    children: &HashMap<i64, Vec<usize>>,
    slots: &mut [Option<PlanNode>],
) -> Option<PlanNode> {
    let mut node = slots[idx].take()?;
    if let Some(kids) = children.get(&row_ids[idx]) {
        for &kid in kids {
            if let Some(child) = assemble(kid, row_ids, children, slots) {
                node.children.push(child);
            }
        }
    }
    Some(node)
}

fn field<'a>(row: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    row.get(name).or_else(|| {
        row.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn as_id(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}
