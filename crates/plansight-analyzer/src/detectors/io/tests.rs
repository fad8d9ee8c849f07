use super::*;
use pretty_assertions::assert_eq;

mod cache_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_low_hit_ratio() {
        let stats = QueryStats::new().with_buffers(700, 300);
        let issue = detect_cache_pressure(&stats, &AnalyzerConfig::default()).unwrap();

        assert_eq!(issue.issue_type, IssueType::HighIoWorkload);
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.metric("cache_hit_ratio"), Some(0.7));
        assert_eq!(issue.metric("buffer_reads"), Some(300.0));
    }

    #[test]
    fn test_severe_hit_ratio() {
        let stats = QueryStats::new().with_buffers(100, 900);
        let issue = detect_cache_pressure(&stats, &AnalyzerConfig::default()).unwrap();
        assert_eq!(issue.severity, Severity::High);
    }

    #[test]
    fn test_healthy_or_unknown() {
        let config = AnalyzerConfig::default();
        assert!(detect_cache_pressure(&QueryStats::new().with_buffers(800, 200), &config).is_none());
        assert!(detect_cache_pressure(&QueryStats::new(), &config).is_none());
    }
}

mod disk_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sort(method: &str, space: &str) -> PlanNode {
        let mut node = PlanNode::new(NodeType::Sort).with_sort_method(method);
        node.sort_space_type = Some(space.to_string());
        node
    }

    #[test]
    fn test_spill_detection() {
        assert!(spills_to_disk(&sort("external merge", "Disk")));
        assert!(spills_to_disk(&sort("top-N heapsort", "Disk")));
        assert!(!spills_to_disk(&sort("quicksort", "Memory")));

        let mut hash = PlanNode::new(NodeType::HashJoin);
        hash.hash_batches = Some(4);
        assert!(spills_to_disk(&hash));
        hash.hash_batches = Some(1);
        assert!(!spills_to_disk(&hash));
    }

    #[test]
    fn test_disk_issue_collects_nodes() {
        let mut hash = PlanNode::with_operation(NodeType::Other, "Hash");
        hash.hash_batches = Some(8);
        let plan = PlanNode::with_operation(NodeType::Sort, "Sort")
            .with_sort_method("external merge")
            .with_child(PlanNode::new(NodeType::HashJoin).with_child(hash));

        let issue = detect_disk_operations(&plan).unwrap();
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.affected_objects, vec!["Sort", "Hash"]);
        assert_eq!(issue.metric("disk_operations"), Some(2.0));
    }

    #[test]
    fn test_in_memory_plan() {
        let plan = sort("quicksort", "Memory");
        assert!(detect_disk_operations(&plan).is_none());
    }
}

#[test]
fn test_detector_combines_both_sources() {
    let config = AnalyzerConfig::default();
    let stats = QueryStats::new().with_buffers(10, 90);
    let plan = PlanNode::new(NodeType::Sort).with_sort_method("external sort");
    let ctx = DetectionContext {
        query_stats: Some(&stats),
        ..DetectionContext::for_sql("SELECT 1", &config).with_plan(&plan)
    };

    let issues = IoWorkloadDetector.detect(&ctx);
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].severity, Severity::High);
    assert_eq!(issues[1].title, "Operations spilled to disk");
}
