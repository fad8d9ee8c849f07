//! Issues and the aggregated detection report

use crate::explain::PlanMetrics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Severity of a detected issue, ordered `Low < Medium < High < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All tiers from most to least severe
    pub const DESCENDING: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Category of a detected issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MissingIndex,
    InefficientIndex,
    PoorJoinStrategy,
    FullTableScan,
    SuboptimalPattern,
    StaleStatistics,
    WrongCardinality,
    OrmGenerated,
    HighIoWorkload,
    InefficientReporting,
}

impl IssueType {
    /// Returns a human-readable description of this issue type
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingIndex => "Missing index on a filtered scan",
            Self::InefficientIndex => "Index on a low-selectivity column",
            Self::PoorJoinStrategy => "Join strategy unsuited to the row volume",
            Self::FullTableScan => "Full table scan detected",
            Self::SuboptimalPattern => "SQL pattern that defeats the optimizer",
            Self::StaleStatistics => "Planner statistics are out of date",
            Self::WrongCardinality => "Row estimate far from actual row count",
            Self::OrmGenerated => "ORM-generated query shape",
            Self::HighIoWorkload => "Query is dominated by disk I/O",
            Self::InefficientReporting => "Unbounded reporting query",
        }
    }
}

/// A single detected problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_type: IssueType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Tables, columns or plan operations the issue concerns
    pub affected_objects: Vec<String>,
    /// Actionable fixes, possibly literal DDL
    pub recommendations: Vec<String>,
    /// Named numbers backing the finding (`ratio`, `row_count`, `cache_hit_ratio`, ...)
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl Issue {
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity,
            title: title.into(),
            description: description.into(),
            affected_objects: Vec::new(),
            recommendations: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Adds an affected object, ignoring duplicates
    pub fn with_affected(mut self, object: impl Into<String>) -> Self {
        let object = object.into();
        if !self.affected_objects.contains(&object) {
            self.affected_objects.push(object);
        }
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Outcome of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Issues in detection order: pattern findings first, then each structural detector
    pub issues: Vec<Issue>,
    /// Flattened, de-duplicated and capped recommendations
    pub recommendations: Vec<String>,
    pub summary: String,
    pub total_issues: usize,
    pub critical_issues: usize,
    pub high_issues: usize,
    pub medium_issues: usize,
    pub low_issues: usize,
    /// Informational remarks that are not issues and are not counted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_metrics: Option<PlanMetrics>,
}

impl DetectionReport {
    /// Builds a report from issues in their canonical order.
    ///
    /// The summary is left empty for the analyzer to fill in.
    pub fn from_issues(issues: Vec<Issue>, max_recommendations: usize) -> Self {
        let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();

        let recommendations = {
            let mut seen = HashSet::new();
            issues
                .iter()
                .flat_map(|issue| issue.recommendations.iter())
                .filter(|rec| seen.insert(rec.as_str()))
                .take(max_recommendations)
                .cloned()
                .collect()
        };

        Self {
            total_issues: issues.len(),
            critical_issues: count(Severity::Critical),
            high_issues: count(Severity::High),
            medium_issues: count(Severity::Medium),
            low_issues: count(Severity::Low),
            recommendations,
            issues,
            summary: String::new(),
            notes: Vec::new(),
            plan_metrics: None,
        }
    }

    pub fn count_for(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical_issues,
            Severity::High => self.high_issues,
            Severity::Medium => self.medium_issues,
            Severity::Low => self.low_issues,
        }
    }

    /// The most severe tier present in the report
    pub fn highest_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.critical_issues > 0
    }

    /// Issues ordered by descending severity; ties keep detection order
    pub fn sorted_issues(&self) -> Vec<&Issue> {
        let mut sorted: Vec<_> = self.issues.iter().collect();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity));
        sorted
    }

    pub fn issues_of_type(&self, issue_type: IssueType) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.issue_type == issue_type)
    }
}
