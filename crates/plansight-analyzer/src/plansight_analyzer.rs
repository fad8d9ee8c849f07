//! Plansight Analyzer - execution plan analysis and issue detection
//!
//! This crate provides functionality for:
//! - Normalizing EXPLAIN output from PostgreSQL, MySQL, SQL Server and Oracle
//!   into one canonical plan tree
//! - Lexical detection of SQL anti-patterns, independent of any plan
//! - Structural detectors over the plan tree and table/query statistics
//! - Aggregating the findings into a ranked, deterministic report
//!
//! # Example
//!
//! ```
//! use plansight_analyzer::{IssueType, analyze_plan};
//!
//! let report = analyze_plan(None, "postgresql", "SELECT * FROM users WHERE id > 100", None, None, None);
//! assert!(report.issues.iter().any(|i| i.issue_type == IssueType::SuboptimalPattern));
//! assert_eq!(report.total_issues, report.issues.len());
//! ```

pub mod analysis;
pub mod detectors;
pub mod error;
pub mod explain;

pub use analysis::*;
pub use detectors::{DetectionContext, Detector, QuoteStyle, detect_patterns, detect_patterns_with};
pub use error::{AnalyzerError, Result};
pub use explain::*;
