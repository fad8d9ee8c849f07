//! Inputs to an analysis run besides the plan itself

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Table statistics keyed by table name
pub type TableStatsMap = BTreeMap<String, TableStats>;

/// Maintenance and access counters for one table (`pg_stat_user_tables` semantics)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStats {
    pub last_analyze: Option<DateTime<Utc>>,
    pub last_autoanalyze: Option<DateTime<Utc>>,
    pub last_vacuum: Option<DateTime<Utc>>,
    /// Estimated live rows
    pub n_live_tup: Option<u64>,
    pub seq_scan: Option<u64>,
    pub idx_scan: Option<u64>,
    /// Per-column distribution statistics
    pub columns: BTreeMap<String, ColumnStats>,
}

impl TableStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_analyze(mut self, at: DateTime<Utc>) -> Self {
        self.last_analyze = Some(at);
        self
    }

    pub fn with_last_autoanalyze(mut self, at: DateTime<Utc>) -> Self {
        self.last_autoanalyze = Some(at);
        self
    }

    pub fn with_live_rows(mut self, rows: u64) -> Self {
        self.n_live_tup = Some(rows);
        self
    }

    pub fn with_scans(mut self, seq_scan: u64, idx_scan: u64) -> Self {
        self.seq_scan = Some(seq_scan);
        self.idx_scan = Some(idx_scan);
        self
    }

    pub fn with_column(mut self, name: impl Into<String>, stats: ColumnStats) -> Self {
        self.columns.insert(name.into(), stats);
        self
    }

    /// The most recent of the manual and automatic ANALYZE timestamps
    pub fn last_analyzed(&self) -> Option<DateTime<Utc>> {
        self.last_analyze.max(self.last_autoanalyze)
    }

    /// Sequential plus index scans recorded for the table
    pub fn scan_activity(&self) -> u64 {
        self.seq_scan
            .unwrap_or(0)
            .saturating_add(self.idx_scan.unwrap_or(0))
    }
}

/// Column distribution statistics (`pg_stats` semantics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnStats {
    /// Distinct values; a negative number is the negated fraction of rows that are distinct
    pub n_distinct: Option<f64>,
    pub null_frac: Option<f64>,
}

impl ColumnStats {
    pub fn with_distinct(n_distinct: f64) -> Self {
        Self {
            n_distinct: Some(n_distinct),
            null_frac: None,
        }
    }

    /// Fraction of rows holding a distinct value, given the table's live row count
    pub fn selectivity(&self, live_rows: u64) -> Option<f64> {
        let n_distinct = self.n_distinct?;
        if n_distinct < 0.0 {
            Some(-n_distinct)
        } else if live_rows == 0 {
            None
        } else {
            Some((n_distinct / live_rows as f64).min(1.0))
        }
    }
}

/// Runtime counters for one statement (`pg_stat_statements` semantics)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryStats {
    /// Blocks found in the buffer cache
    pub buffer_hits: Option<u64>,
    /// Blocks read from disk
    pub buffer_reads: Option<u64>,
    pub avg_time_ms: Option<f64>,
    pub calls: Option<u64>,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set buffer hits and reads
    pub fn with_buffers(mut self, hits: u64, reads: u64) -> Self {
        self.buffer_hits = Some(hits);
        self.buffer_reads = Some(reads);
        self
    }

    /// Builder method: set average execution time
    pub fn with_avg_time_ms(mut self, time_ms: f64) -> Self {
        self.avg_time_ms = Some(time_ms);
        self
    }

    /// Builder method: set call count
    pub fn with_calls(mut self, calls: u64) -> Self {
        self.calls = Some(calls);
        self
    }

    /// `hits / (hits + reads)`, or `None` without any buffer activity
    pub fn cache_hit_ratio(&self) -> Option<f64> {
        let hits = self.buffer_hits.unwrap_or(0);
        let reads = self.buffer_reads.unwrap_or(0);
        let total = hits.checked_add(reads)?;
        if total == 0 {
            return None;
        }
        Some(hits as f64 / total as f64)
    }
}

/// Caller knowledge about the workload the statement came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryContext {
    /// How many near-identical statements were seen in the same window
    pub similar_query_count: Option<u64>,
    /// Free-form origin label ("django", "hibernate", ...)
    pub source: Option<String>,
}

impl QueryContext {
    pub fn with_similar_queries(count: u64) -> Self {
        Self {
            similar_query_count: Some(count),
            source: None,
        }
    }
}

/// Everything one analysis run looks at
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub plan: Option<&'a Value>,
    pub engine: &'a str,
    pub sql_query: &'a str,
    pub query_stats: Option<&'a QueryStats>,
    pub table_stats: Option<&'a TableStatsMap>,
    pub query_context: Option<&'a QueryContext>,
    /// Clock used for staleness checks; the current time when unset
    pub reference_time: Option<DateTime<Utc>>,
}

impl<'a> AnalysisInput<'a> {
    pub fn new(engine: &'a str, sql_query: &'a str) -> Self {
        Self {
            plan: None,
            engine,
            sql_query,
            query_stats: None,
            table_stats: None,
            query_context: None,
            reference_time: None,
        }
    }

    pub fn with_plan(mut self, plan: &'a Value) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_query_stats(mut self, stats: &'a QueryStats) -> Self {
        self.query_stats = Some(stats);
        self
    }

    pub fn with_table_stats(mut self, stats: &'a TableStatsMap) -> Self {
        self.table_stats = Some(stats);
        self
    }

    pub fn with_query_context(mut self, context: &'a QueryContext) -> Self {
        self.query_context = Some(context);
        self
    }

    pub fn with_reference_time(mut self, at: DateTime<Utc>) -> Self {
        self.reference_time = Some(at);
        self
    }
}
