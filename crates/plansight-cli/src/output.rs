//! Report rendering

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use plansight_analyzer::{DetectionReport, Severity};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

/// Renders a report in the requested format
pub fn render_report(report: &DetectionReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => Ok(render_table(report)),
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::Magenta,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Cyan,
    }
}

/// Issues by descending severity, followed by the summary, notes and recommendations
pub fn render_table(report: &DetectionReport) -> String {
    let mut out = String::new();

    if !report.issues.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "Severity", "Type", "Issue", "Affected"]);

        for (i, issue) in report.sorted_issues().into_iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(issue.severity.as_str()).fg(severity_color(issue.severity)),
                Cell::new(issue.issue_type.description()),
                Cell::new(&issue.title),
                Cell::new(issue.affected_objects.join(", ")),
            ]);
        }
        let _ = writeln!(out, "{table}");
    }

    let _ = writeln!(out, "{}", report.summary);
    for note in &report.notes {
        let _ = writeln!(out, "note: {note}");
    }

    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "\nRecommendations:");
        for (i, rec) in report.recommendations.iter().enumerate() {
            let _ = writeln!(out, "  {}. {rec}", i + 1);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plansight_analyzer::analyze_plan;

    #[test]
    fn test_json_output_shape() {
        let report = analyze_plan(None, "postgresql", "SELECT * FROM users", None, None, None);
        let json = render_report(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_issues"], 1);
        assert_eq!(value["issues"][0]["issue_type"], "suboptimal_pattern");
    }

    #[test]
    fn test_table_output() {
        let report = analyze_plan(
            None,
            "postgresql",
            "SELECT * FROM products WHERE name LIKE '%phone%'",
            None,
            None,
            None,
        );
        let text = render_table(&report);

        assert!(text.contains("LIKE pattern starts with a wildcard"));
        assert!(text.contains(&report.summary));
        assert!(text.contains("note: Execution plan unavailable"));
        assert!(text.contains("Recommendations:"));
        // high severity sorts first
        assert!(text.find("high").unwrap() < text.find("medium").unwrap());
    }

    #[test]
    fn test_empty_report() {
        let report = analyze_plan(None, "postgresql", "SELECT 1", None, None, None);
        let text = render_table(&report);
        assert!(text.starts_with("No performance issues detected."));
        assert!(!text.contains("Recommendations:"));
    }
}
