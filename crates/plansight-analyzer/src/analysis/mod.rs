//! Analysis Module
//!
//! The orchestrator and the data it consumes and produces:
//! - [`PlanAnalyzer`] runs the detectors in a fixed order and aggregates their issues
//! - [`DetectionReport`] holds the issues with severity counts, a summary and a
//!   de-duplicated recommendation list
//! - [`AnalyzerConfig`] holds every detection threshold

mod analyzer;
mod config;
mod inputs;
mod report;

pub use analyzer::{PLAN_UNAVAILABLE_NOTE, PlanAnalyzer, analyze_plan, generate_summary};
pub use config::AnalyzerConfig;
pub use inputs::{AnalysisInput, ColumnStats, QueryContext, QueryStats, TableStats, TableStatsMap};
pub use report::{DetectionReport, Issue, IssueType, Severity};
