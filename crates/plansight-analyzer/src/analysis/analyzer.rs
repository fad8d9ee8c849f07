//! Plan analyzer
//!
//! Normalizes the plan, runs every detector in order and builds the report.

use super::config::AnalyzerConfig;
use super::inputs::{AnalysisInput, QueryContext, QueryStats, TableStatsMap};
use super::report::{DetectionReport, Severity};
use crate::detectors::{DetectionContext, Detector, default_detectors};
use crate::error::{AnalyzerError, Result};
use crate::explain::{extract_metrics, normalize};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Note recorded when no plan tree could be built
pub const PLAN_UNAVAILABLE_NOTE: &str =
    "Execution plan unavailable; only plan-independent checks were run.";

/// Runs the detectors over one statement and aggregates their findings
#[derive(Debug)]
pub struct PlanAnalyzer {
    config: AnalyzerConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl Default for PlanAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanAnalyzer {
    /// Creates an analyzer with default thresholds
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Creates an analyzer with custom thresholds
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            config,
            detectors: default_detectors(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes one statement. Never fails: missing or unusable inputs only silence
    /// the detectors that need them.
    pub fn analyze(&self, input: &AnalysisInput<'_>) -> DetectionReport {
        let plan = normalize(input.plan, input.engine);
        let ctx = DetectionContext {
            plan: plan.as_ref(),
            engine: input.engine,
            sql: input.sql_query,
            query_stats: input.query_stats,
            table_stats: input.table_stats,
            query_context: input.query_context,
            config: &self.config,
            reference_time: input.reference_time.unwrap_or_else(Utc::now),
        };

        let mut issues = Vec::new();
        for detector in &self.detectors {
            if detector.requires_plan() && ctx.plan.is_none() {
                continue;
            }
            let found = detector.detect(&ctx);
            tracing::debug!(detector = detector.name(), issues = found.len(), "detector finished");
            issues.extend(found);
        }

        let mut report = DetectionReport::from_issues(issues, self.config.max_recommendations);
        match &plan {
            Some(root) => report.plan_metrics = Some(extract_metrics(root)),
            None => report.notes.push(PLAN_UNAVAILABLE_NOTE.to_string()),
        }
        report.summary = generate_summary(&report);

        tracing::debug!(
            engine = input.engine,
            total = report.total_issues,
            critical = report.critical_issues,
            high = report.high_issues,
            medium = report.medium_issues,
            low = report.low_issues,
            "analysis complete"
        );

        report
    }

    /// Analyzes an untyped JSON request.
    ///
    /// The request is an object with a required string `sql_query` and optional
    /// `engine` (defaults to `postgresql`), `plan`, `query_stats`, `table_stats`,
    /// `query_context` and `reference_time` (RFC 3339). Fields of the wrong JSON type
    /// are rejected with [`AnalyzerError::InvalidInput`].
    pub fn analyze_value(&self, request: &Value) -> Result<DetectionReport> {
        let request = request.as_object().ok_or_else(|| {
            AnalyzerError::InvalidInput(format!(
                "request must be an object, got {}",
                json_type(request)
            ))
        })?;

        let sql_query = match request.get("sql_query") {
            Some(Value::String(sql)) => sql.as_str(),
            Some(other) => {
                return Err(AnalyzerError::InvalidInput(format!(
                    "sql_query must be a string, got {}",
                    json_type(other)
                )));
            }
            None => return Err(AnalyzerError::InvalidInput("sql_query is required".into())),
        };

        let engine = match request.get("engine") {
            None | Some(Value::Null) => "postgresql",
            Some(Value::String(engine)) => engine.as_str(),
            Some(other) => {
                return Err(AnalyzerError::InvalidInput(format!(
                    "engine must be a string, got {}",
                    json_type(other)
                )));
            }
        };

        let plan = match request.get("plan") {
            None | Some(Value::Null) => None,
            Some(plan @ (Value::Object(_) | Value::Array(_) | Value::String(_))) => Some(plan),
            Some(other) => {
                return Err(AnalyzerError::InvalidInput(format!(
                    "plan must be an object, array or string, got {}",
                    json_type(other)
                )));
            }
        };

        let query_stats: Option<QueryStats> = object_field(request, "query_stats")?;
        let table_stats: Option<TableStatsMap> = object_field(request, "table_stats")?;
        let query_context: Option<QueryContext> = object_field(request, "query_context")?;
        let reference_time: Option<DateTime<Utc>> = match request.get("reference_time") {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value.clone()).map_err(|e| {
                AnalyzerError::InvalidInput(format!("reference_time: {e}"))
            })?),
        };

        let input = AnalysisInput {
            plan,
            engine,
            sql_query,
            query_stats: query_stats.as_ref(),
            table_stats: table_stats.as_ref(),
            query_context: query_context.as_ref(),
            reference_time,
        };
        Ok(self.analyze(&input))
    }
}

/// Deserializes an optional object-valued field
fn object_field<T: DeserializeOwned>(request: &Map<String, Value>, key: &str) -> Result<Option<T>> {
    match request.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| AnalyzerError::InvalidInput(format!("{key}: {e}"))),
        Some(other) => Err(AnalyzerError::InvalidInput(format!(
            "{key} must be an object, got {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Analyzes one statement with default thresholds and the current time
pub fn analyze_plan(
    plan: Option<&Value>,
    engine: &str,
    sql_query: &str,
    query_stats: Option<&QueryStats>,
    table_stats: Option<&TableStatsMap>,
    query_context: Option<&QueryContext>,
) -> DetectionReport {
    PlanAnalyzer::new().analyze(&AnalysisInput {
        plan,
        engine,
        sql_query,
        query_stats,
        table_stats,
        query_context,
        reference_time: None,
    })
}

/// Builds a one or two sentence digest naming the issue count and the dominant tier
pub fn generate_summary(report: &DetectionReport) -> String {
    let Some(highest) = report.highest_severity() else {
        return "No performance issues detected.".to_string();
    };

    let breakdown: Vec<String> = Severity::DESCENDING
        .iter()
        .filter_map(|&severity| {
            let count = report.count_for(severity);
            (count > 0).then(|| format!("{count} {}", severity.as_str()))
        })
        .collect();

    let plural = |n: usize| if n == 1 { "" } else { "s" };
    let top = report.count_for(highest);
    format!(
        "Found {} performance issue{} ({}). Address the {} {} issue{} first.",
        report.total_issues,
        plural(report.total_issues),
        breakdown.join(", "),
        top,
        highest.as_str(),
        plural(top)
    )
}
