//! Database engine identifiers

use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Engines whose plans can be normalized
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    PostgreSql,
    MySql,
    SqlServer,
    Oracle,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::SqlServer => "sqlserver",
            Self::Oracle => "oracle",
        }
    }
}

impl FromStr for Engine {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSql),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlserver" | "mssql" | "sql server" => Ok(Self::SqlServer),
            "oracle" => Ok(Self::Oracle),
            _ => Err(AnalyzerError::UnsupportedEngine(s.to_string())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
