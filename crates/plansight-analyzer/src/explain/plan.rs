//! Normalized Plan Model - the canonical execution plan tree
//!
//! Every engine-specific parser produces this shape, so detectors never need to know
//! which database the plan came from.

use serde::{Deserialize, Serialize};

/// Canonical operation category of a plan node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    SequentialScan,
    IndexScan,
    IndexOnlyScan,
    BitmapScan,
    NestedLoop,
    HashJoin,
    MergeJoin,
    Sort,
    Aggregate,
    Other,
}

impl NodeType {
    /// Maps an engine operation label to the canonical category.
    ///
    /// Exact PostgreSQL labels are tried first, then a case-insensitive substring match
    /// so that engine variants ("Incremental Sort", "HashAggregate", "TABLE ACCESS FULL")
    /// still land in a sensible bucket. Anything else becomes [`NodeType::Other`].
    pub fn from_operation(label: &str) -> Self {
        match label {
            "Seq Scan" | "Parallel Seq Scan" => Self::SequentialScan,
            "Index Scan" | "Parallel Index Scan" => Self::IndexScan,
            "Index Only Scan" | "Parallel Index Only Scan" => Self::IndexOnlyScan,
            "Bitmap Heap Scan" | "Bitmap Index Scan" => Self::BitmapScan,
            "Nested Loop" => Self::NestedLoop,
            "Hash Join" => Self::HashJoin,
            "Merge Join" => Self::MergeJoin,
            "Sort" => Self::Sort,
            "Aggregate" => Self::Aggregate,
            _ => Self::fuzzy(label),
        }
    }

    fn fuzzy(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("index only") {
            Self::IndexOnlyScan
        } else if lower.contains("bitmap") {
            Self::BitmapScan
        } else if lower.contains("index") {
            Self::IndexScan
        } else if lower.contains("nested loop") {
            Self::NestedLoop
        } else if lower.contains("hash") && lower.contains("join") {
            Self::HashJoin
        } else if lower.contains("merge") && lower.contains("join") {
            Self::MergeJoin
        } else if lower.contains("seq scan")
            || lower.contains("table scan")
            || lower.contains("full")
        {
            Self::SequentialScan
        } else if lower.contains("sort") {
            Self::Sort
        } else if lower.contains("aggregate") || lower.contains("group") {
            Self::Aggregate
        } else {
            Self::Other
        }
    }

    /// Generic label used when a node is built without an engine label
    pub fn label(&self) -> &'static str {
        match self {
            Self::SequentialScan => "Sequential Scan",
            Self::IndexScan => "Index Scan",
            Self::IndexOnlyScan => "Index Only Scan",
            Self::BitmapScan => "Bitmap Scan",
            Self::NestedLoop => "Nested Loop",
            Self::HashJoin => "Hash Join",
            Self::MergeJoin => "Merge Join",
            Self::Sort => "Sort",
            Self::Aggregate => "Aggregate",
            Self::Other => "Unknown",
        }
    }

    pub fn is_scan(&self) -> bool {
        matches!(
            self,
            Self::SequentialScan | Self::IndexScan | Self::IndexOnlyScan | Self::BitmapScan
        )
    }

    pub fn is_index_access(&self) -> bool {
        matches!(self, Self::IndexScan | Self::IndexOnlyScan | Self::BitmapScan)
    }

    pub fn is_join(&self) -> bool {
        matches!(self, Self::NestedLoop | Self::HashJoin | Self::MergeJoin)
    }
}

/// A single node in the normalized plan tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanNode {
    /// Canonical operation category
    pub node_type: NodeType,
    /// Original engine label, kept for display
    pub operation: String,
    /// Table the node reads, if any
    pub relation_name: Option<String>,
    /// Planner row estimate
    pub estimated_rows: Option<u64>,
    /// Rows actually produced (EXPLAIN ANALYZE)
    pub actual_rows: Option<u64>,
    /// Planner total cost
    pub estimated_cost: Option<f64>,
    /// Total time spent in the node in milliseconds (EXPLAIN ANALYZE)
    pub actual_time_ms: Option<f64>,
    /// Filter predicate applied by the node
    pub filter: Option<String>,
    /// Index used by index-based access paths
    pub index_name: Option<String>,
    /// Sort algorithm reported by the engine ("quicksort", "external merge", "filesort")
    pub sort_method: Option<String>,
    /// Where a sort kept its data ("Memory" or "Disk")
    pub sort_space_type: Option<String>,
    /// Number of batches a hash table was split into
    pub hash_batches: Option<u64>,
    /// Child nodes, in engine order
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Node labelled with the generic name of its category
    pub fn new(node_type: NodeType) -> Self {
        Self::with_operation(node_type, node_type.label())
    }

    pub fn with_operation(node_type: NodeType, operation: impl Into<String>) -> Self {
        Self {
            node_type,
            operation: operation.into(),
            relation_name: None,
            estimated_rows: None,
            actual_rows: None,
            estimated_cost: None,
            actual_time_ms: None,
            filter: None,
            index_name: None,
            sort_method: None,
            sort_space_type: None,
            hash_batches: None,
            children: Vec::new(),
        }
    }

    /// A node that could not be interpreted: an `Other` leaf with no metrics
    pub fn unrecognized(operation: impl Into<String>) -> Self {
        Self::with_operation(NodeType::Other, operation)
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation_name = Some(relation.into());
        self
    }

    pub fn with_estimated_rows(mut self, rows: u64) -> Self {
        self.estimated_rows = Some(rows);
        self
    }

    pub fn with_actual_rows(mut self, rows: u64) -> Self {
        self.actual_rows = Some(rows);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = Some(cost);
        self
    }

    pub fn with_actual_time(mut self, ms: f64) -> Self {
        self.actual_time_ms = Some(ms);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn with_sort_method(mut self, method: impl Into<String>) -> Self {
        self.sort_method = Some(method.into());
        self
    }

    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    /// Pre-order walk: the node itself, then each child subtree in engine order
    pub fn iter(&self) -> PlanNodeIterator<'_> {
        PlanNodeIterator { pending: vec![self] }
    }

    /// Nodes in this subtree, counting `self`
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Levels in this subtree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        let deepest_child = self.children.iter().map(PlanNode::depth).max();
        deepest_child.map_or(1, |d| d + 1)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The larger of the estimated and actual row counts, when either is known
    pub fn row_count(&self) -> Option<u64> {
        match (self.estimated_rows, self.actual_rows) {
            (Some(est), Some(act)) => Some(est.max(act)),
            (est, act) => est.or(act),
        }
    }

    /// Label used when naming this node in an issue
    pub fn display_name(&self) -> String {
        match &self.relation_name {
            Some(rel) => format!("{} on {}", self.operation, rel),
            None => self.operation.clone(),
        }
    }
}

/// Relative estimate error: `|actual - estimated| / max(estimated, 1)`.
///
/// Returns `None` unless both row counts are present.
pub fn cardinality_error(node: &PlanNode) -> Option<f64> {
    let estimated = node.estimated_rows? as f64;
    let actual = node.actual_rows? as f64;
    Some((actual - estimated).abs() / estimated.max(1.0))
}

/// Whole-tree aggregates gathered in one depth-first pass
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanMetrics {
    pub node_count: usize,
    pub max_depth: usize,
    pub total_estimated_rows: u64,
    pub sequential_scans: usize,
    pub index_scans: usize,
    pub join_count: usize,
    /// Estimated cost of the root node
    pub total_cost: Option<f64>,
}

/// Collects [`PlanMetrics`] for a normalized tree
pub fn extract_metrics(root: &PlanNode) -> PlanMetrics {
    let mut metrics = PlanMetrics {
        max_depth: root.depth(),
        total_cost: root.estimated_cost,
        ..PlanMetrics::default()
    };

    for node in root.iter() {
        metrics.node_count += 1;
        metrics.total_estimated_rows = metrics
            .total_estimated_rows
            .saturating_add(node.estimated_rows.unwrap_or(0));
        if node.node_type == NodeType::SequentialScan {
            metrics.sequential_scans += 1;
        }
        if node.node_type.is_index_access() {
            metrics.index_scans += 1;
        }
        if node.node_type.is_join() {
            metrics.join_count += 1;
        }
    }

    metrics
}

/// Pre-order traversal returned by [`PlanNode::iter`]
pub struct PlanNodeIterator<'a> {
    pending: Vec<&'a PlanNode>,
}

impl<'a> Iterator for PlanNodeIterator<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<&'a PlanNode> {
        let current = self.pending.pop()?;
        // stack is LIFO, so the first child must be pushed last
        self.pending.extend(current.children.iter().rev());
        Some(current)
    }
}
