//! Issue Detectors Module
//!
//! Each detector looks for one category of issue. Detectors are pure: they read the
//! [`DetectionContext`] and return the issues they found, in a stable order.
//!
//! - [`pattern`]: lexical SQL anti-patterns, no plan required
//! - [`index`]: scans that lack an index, and indexes on unselective columns
//! - [`join`]: nested loops over large row counts
//! - [`cardinality`]: planner estimates far from actual row counts
//! - [`statistics`]: tables whose statistics have gone stale
//! - [`io`]: low buffer cache hit ratio and operations that spill to disk
//! - [`orm`]: ORM-generated join fan-out and N+1 access patterns
//! - [`reporting`]: unbounded aggregation queries

pub mod cardinality;
pub mod index;
pub mod io;
pub mod join;
pub mod orm;
pub mod pattern;
pub mod reporting;
pub mod sql;
pub mod statistics;

pub use cardinality::CardinalityDetector;
pub use index::IndexDetector;
pub use io::IoWorkloadDetector;
pub use join::JoinStrategyDetector;
pub use orm::OrmPatternDetector;
pub use pattern::{PatternDetector, detect_patterns, detect_patterns_with};
pub use reporting::ReportingDetector;
pub use sql::QuoteStyle;
pub use statistics::StatisticsDetector;

use crate::analysis::{AnalyzerConfig, Issue, QueryContext, QueryStats, TableStatsMap};
use crate::explain::PlanNode;
use chrono::{DateTime, Utc};
use std::fmt;

/// Everything a detector may look at during one analysis run
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    /// Normalized plan, when one could be built
    pub plan: Option<&'a PlanNode>,
    pub engine: &'a str,
    pub sql: &'a str,
    pub query_stats: Option<&'a QueryStats>,
    pub table_stats: Option<&'a TableStatsMap>,
    pub query_context: Option<&'a QueryContext>,
    pub config: &'a AnalyzerConfig,
    /// Clock for age-based checks
    pub reference_time: DateTime<Utc>,
}

impl<'a> DetectionContext<'a> {
    /// A context with only SQL text, for detectors that need nothing else
    pub fn for_sql(sql: &'a str, config: &'a AnalyzerConfig) -> Self {
        Self {
            plan: None,
            engine: "",
            sql,
            query_stats: None,
            table_stats: None,
            query_context: None,
            config,
            reference_time: Utc::now(),
        }
    }

    pub fn with_plan(mut self, plan: &'a PlanNode) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_engine(mut self, engine: &'a str) -> Self {
        self.engine = engine;
        self
    }

    pub fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::for_engine(self.engine)
    }

    /// The statement with literals and comments masked under the engine's quoting rules
    pub fn masked_sql(&self) -> String {
        sql::mask_literals_with(self.sql, self.quote_style())
    }
}

/// One category of issue detection
pub trait Detector: fmt::Debug + Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Whether the detector is skipped when no plan tree is available
    fn requires_plan(&self) -> bool {
        false
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Issue>;
}

/// The detectors in the order their issues appear in a report
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(PatternDetector),
        Box::new(IndexDetector),
        Box::new(JoinStrategyDetector),
        Box::new(CardinalityDetector),
        Box::new(StatisticsDetector),
        Box::new(IoWorkloadDetector),
        Box::new(OrmPatternDetector),
        Box::new(ReportingDetector),
    ]
}
