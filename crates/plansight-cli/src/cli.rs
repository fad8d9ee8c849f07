//! plansight - analyze SQL statements and their execution plans from the command line

mod input;
mod logging;
mod output;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use output::OutputFormat;
use plansight_analyzer::{AnalysisInput, PlanAnalyzer, QueryContext, QueryStats, TableStatsMap};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "plansight")]
#[command(about = "Find performance issues in SQL statements and execution plans")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Analyzer config file (defaults to <config dir>/plansight/analyzer.json)
    #[arg(long, global = true, env = "PLANSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Write JSON logs to the default log directory
    #[arg(long, global = true)]
    json_logs: bool,

    /// Directory for JSON logs (implies --json-logs)
    #[arg(long, global = true, env = "PLANSIGHT_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Verbose console logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze a statement with an optional plan and statistics
    Analyze(AnalyzeArgs),
    /// Analyze a single JSON request ({"sql_query": ..., "plan": ..., ...})
    AnalyzeRequest(RequestArgs),
    /// Print the effective analyzer configuration
    Config,
}

#[derive(Debug, clap::Args)]
struct AnalyzeArgs {
    /// SQL file, or - for stdin
    #[arg(long)]
    sql: String,

    /// Execution plan file (JSON, or PostgreSQL text EXPLAIN output)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Database engine that produced the plan
    #[arg(long, env = "PLANSIGHT_ENGINE", default_value = "postgresql")]
    engine: String,

    /// Table statistics JSON file ({"table": {"last_analyze": ..., ...}})
    #[arg(long)]
    table_stats: Option<PathBuf>,

    /// Query runtime statistics JSON file
    #[arg(long)]
    query_stats: Option<PathBuf>,

    /// Workload context JSON file ({"similar_query_count": ...})
    #[arg(long)]
    context: Option<PathBuf>,

    /// Clock for staleness checks (RFC 3339), defaults to now
    #[arg(long)]
    reference_time: Option<DateTime<Utc>>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Debug, clap::Args)]
struct RequestArgs {
    /// Request JSON file, or - for stdin
    file: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging_config = if cli.verbose {
        logging::LoggingConfig::verbose()
    } else {
        logging::LoggingConfig::default()
    };
    if cli.json_logs || cli.log_dir.is_some() {
        let dir = cli.log_dir.clone().unwrap_or_else(logging::log_directory);
        logging_config = logging_config.with_log_dir(dir);
    }
    let _guard = match logging::init(&logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("warning: logging disabled: {e:#}");
            None
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = input::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => {
            let analyzer = PlanAnalyzer::with_config(config);
            let output = analyze(&analyzer, &args)?;
            println!("{output}");
        }
        Commands::AnalyzeRequest(args) => {
            let analyzer = PlanAnalyzer::with_config(config);
            let raw = input::read_source(&args.file)?;
            let request: serde_json::Value =
                serde_json::from_str(&raw).context("Request is not valid JSON")?;
            let report = analyzer.analyze_value(&request)?;
            println!("{}", output::render_report(&report, args.format)?);
        }
        Commands::Config => {
            if let Some(path) = cli
                .config
                .or_else(plansight_analyzer::AnalyzerConfig::config_path)
            {
                eprintln!("config file: {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn analyze(analyzer: &PlanAnalyzer, args: &AnalyzeArgs) -> Result<String> {
    let sql = input::read_source(&args.sql)?;
    let plan = args.plan.as_deref().map(input::load_plan).transpose()?;
    let table_stats: Option<TableStatsMap> = args
        .table_stats
        .as_deref()
        .map(input::load_json)
        .transpose()?;
    let query_stats: Option<QueryStats> = args
        .query_stats
        .as_deref()
        .map(input::load_json)
        .transpose()?;
    let query_context: Option<QueryContext> =
        args.context.as_deref().map(input::load_json).transpose()?;

    tracing::info!(engine = %args.engine, has_plan = plan.is_some(), "analyzing statement");

    let report = analyzer.analyze(&AnalysisInput {
        plan: plan.as_ref(),
        engine: &args.engine,
        sql_query: &sql,
        query_stats: query_stats.as_ref(),
        table_stats: table_stats.as_ref(),
        query_context: query_context.as_ref(),
        reference_time: args.reference_time,
    });

    output::render_report(&report, args.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "plansight",
            "analyze",
            "--sql",
            "query.sql",
            "--plan",
            "plan.json",
            "--engine",
            "mysql",
            "--format",
            "table",
        ])
        .unwrap();

        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze command");
        };
        assert_eq!(args.sql, "query.sql");
        assert_eq!(args.plan, Some(PathBuf::from("plan.json")));
        assert_eq!(args.engine, "mysql");
        assert_eq!(args.format, OutputFormat::Table);
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["plansight", "analyze", "--sql", "-"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze command");
        };
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.reference_time.is_none());
    }

    #[test]
    fn test_parse_reference_time() {
        let cli = Cli::try_parse_from([
            "plansight",
            "analyze",
            "--sql",
            "q.sql",
            "--reference-time",
            "2026-10-16T12:00:00Z",
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze command");
        };
        assert!(args.reference_time.is_some());
    }

    #[test]
    fn test_sql_is_required() {
        assert!(Cli::try_parse_from(["plansight", "analyze"]).is_err());
    }

    #[test]
    fn test_analyze_files() {
        let dir = tempfile::tempdir().unwrap();
        let sql_path = dir.path().join("query.sql");
        let plan_path = dir.path().join("plan.json");
        std::fs::File::create(&sql_path)
            .unwrap()
            .write_all(b"SELECT id FROM orders WHERE total > 100")
            .unwrap();
        std::fs::File::create(&plan_path)
            .unwrap()
            .write_all(
                br#"[{"Plan": {"Node Type": "Seq Scan", "Relation Name": "orders",
                    "Plan Rows": 25000, "Filter": "(total > 100::numeric)"}}]"#,
            )
            .unwrap();

        let cli = Cli::try_parse_from([
            "plansight",
            "analyze",
            "--sql",
            sql_path.to_str().unwrap(),
            "--plan",
            plan_path.to_str().unwrap(),
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze command");
        };

        let output = analyze(&PlanAnalyzer::new(), &args).unwrap();
        let report: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(report["issues"][0]["issue_type"], "missing_index");
        assert_eq!(report["critical_issues"], 1);
    }
}
