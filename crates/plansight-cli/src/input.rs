//! Loading analysis inputs from files and stdin

use anyhow::{Context, Result};
use plansight_analyzer::AnalyzerConfig;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Reads a file, or stdin when `source` is `-`
pub fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
}

/// Reads a plan file. JSON documents are parsed; anything else is kept as text so
/// PostgreSQL's default EXPLAIN output can be passed through.
pub fn load_plan(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    Ok(plan_value(content))
}

fn plan_value(content: String) -> Value {
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(_) => Value::String(content),
    }
}

/// Reads and deserializes a JSON file
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Loads `path` when given, else the default config file or built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    let config = match path {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::load_or_default()?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests;
