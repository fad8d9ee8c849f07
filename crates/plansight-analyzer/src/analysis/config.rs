//! Detector thresholds

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Thresholds consulted by the detectors.
///
/// Missing keys in a config file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Rows on a scan before it is reported as missing an index
    pub missing_index_row_threshold: u64,
    /// Rows on a scan at which that report becomes critical
    pub critical_row_threshold: u64,
    /// Rows on a nested loop before its strategy is questioned
    pub nested_loop_row_threshold: u64,
    pub nested_loop_critical_rows: u64,
    /// Estimate/actual ratio that counts as a misestimate
    pub cardinality_ratio_threshold: f64,
    pub cardinality_critical_ratio: f64,
    /// Age in days after which statistics are stale
    pub stale_statistics_days: i64,
    /// Minimum seq + index scans for a table to be considered in use
    pub min_scan_activity: u64,
    pub cache_hit_ratio_threshold: f64,
    pub severe_cache_hit_ratio: f64,
    /// Joins above which a statement looks ORM-generated
    pub max_joins: usize,
    /// Near-identical statements that indicate an N+1 access pattern
    pub n_plus_one_threshold: u64,
    /// Distinct-value fraction below which an index is considered unselective
    pub low_selectivity_ratio: f64,
    /// Rows an index scan must touch before selectivity matters
    pub min_selectivity_rows: u64,
    /// Aggregate calls at which an unbounded reporting query is escalated
    pub reporting_aggregate_threshold: usize,
    /// Cap on the flattened recommendation list
    pub max_recommendations: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            missing_index_row_threshold: 1_000,
            critical_row_threshold: 10_000,
            nested_loop_row_threshold: 10_000,
            nested_loop_critical_rows: 100_000,
            cardinality_ratio_threshold: 10.0,
            cardinality_critical_ratio: 100.0,
            stale_statistics_days: 30,
            min_scan_activity: 1,
            cache_hit_ratio_threshold: 0.80,
            severe_cache_hit_ratio: 0.50,
            max_joins: 5,
            n_plus_one_threshold: 10,
            low_selectivity_ratio: 0.01,
            min_selectivity_rows: 1_000,
            reporting_aggregate_threshold: 3,
            max_recommendations: 10,
        }
    }
}

impl AnalyzerConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan row thresholds (missing index, critical)
    pub fn with_scan_thresholds(mut self, missing_index: u64, critical: u64) -> Self {
        self.missing_index_row_threshold = missing_index;
        self.critical_row_threshold = critical;
        self
    }

    /// Sets the nested loop row thresholds (flagged, critical)
    pub fn with_nested_loop_thresholds(mut self, rows: u64, critical: u64) -> Self {
        self.nested_loop_row_threshold = rows;
        self.nested_loop_critical_rows = critical;
        self
    }

    /// Sets the cardinality ratios (flagged, critical)
    pub fn with_cardinality_ratios(mut self, ratio: f64, critical: f64) -> Self {
        self.cardinality_ratio_threshold = ratio;
        self.cardinality_critical_ratio = critical;
        self
    }

    pub fn with_stale_statistics_days(mut self, days: i64) -> Self {
        self.stale_statistics_days = days;
        self
    }

    pub fn with_cache_hit_ratios(mut self, threshold: f64, severe: f64) -> Self {
        self.cache_hit_ratio_threshold = threshold;
        self.severe_cache_hit_ratio = severe;
        self
    }

    pub fn with_max_joins(mut self, max_joins: usize) -> Self {
        self.max_joins = max_joins;
        self
    }

    pub fn with_n_plus_one_threshold(mut self, threshold: u64) -> Self {
        self.n_plus_one_threshold = threshold;
        self
    }

    pub fn with_max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = max;
        self
    }

    /// Default location: `<config dir>/plansight/analyzer.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("plansight").join("analyzer.json"))
    }

    /// Reads a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalyzerError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| AnalyzerError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Reads the config from the default location, falling back to defaults when
    /// the file is absent
    pub fn load_or_default() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading analyzer config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}
