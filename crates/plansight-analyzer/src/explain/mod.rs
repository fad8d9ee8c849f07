//! Plan Normalizer Module
//!
//! Turns engine-native EXPLAIN payloads into the canonical [`PlanNode`] tree:
//! - PostgreSQL (JSON format, or default text format carried as a JSON string)
//! - MySQL (EXPLAIN FORMAT=JSON)
//! - SQL Server (SHOWPLAN_ALL rows) and Oracle (PLAN_TABLE rows)
//!
//! Normalization never fails loudly. Unknown engines and unrecognized shapes yield
//! `None`, and individual nodes that cannot be interpreted become `Other` leaves.
//!
//! # Example
//!
//! ```
//! use plansight_analyzer::explain::{NodeType, normalize};
//! use serde_json::json;
//!
//! let raw = json!([{"Plan": {"Node Type": "Seq Scan", "Relation Name": "users", "Plan Rows": 100}}]);
//! let root = normalize(Some(&raw), "postgresql").unwrap();
//! assert_eq!(root.node_type, NodeType::SequentialScan);
//! assert_eq!(root.estimated_rows, Some(100));
//!
//! assert!(normalize(Some(&raw), "db2").is_none());
//! ```

pub mod engine;
pub mod mysql;
pub mod plan;
pub mod postgres;
pub mod tabular;

pub use engine::Engine;
pub use plan::{
    NodeType, PlanMetrics, PlanNode, PlanNodeIterator, cardinality_error, extract_metrics,
};

use serde_json::Value;

/// Normalizes a raw plan for the named engine.
///
/// Returns `None` when the plan is absent, the engine is not supported, or the payload
/// does not have a shape the engine's parser recognizes.
pub fn normalize(raw_plan: Option<&Value>, engine_name: &str) -> Option<PlanNode> {
    let raw_plan = raw_plan.filter(|v| !v.is_null())?;
    let engine = match engine_name.parse::<Engine>() {
        Ok(engine) => engine,
        Err(err) => {
            tracing::debug!(%err, "skipping plan normalization");
            return None;
        }
    };
    normalize_for(raw_plan, engine)
}

/// Normalizes a raw plan for an already-resolved engine
pub fn normalize_for(raw_plan: &Value, engine: Engine) -> Option<PlanNode> {
    let root = match engine {
        Engine::PostgreSql => postgres::normalize(raw_plan),
        Engine::MySql => mysql::normalize(raw_plan),
        Engine::SqlServer => tabular::normalize_sql_server(raw_plan),
        Engine::Oracle => tabular::normalize_oracle(raw_plan),
    };
    if root.is_none() {
        tracing::debug!(%engine, "plan shape not recognized");
    }
    root
}
