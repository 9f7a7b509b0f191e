//! Output formatting functions.

pub mod json;
pub mod pretty;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::strategy::{tool_available, StrategyRegistry};

/// Format a value for output.
pub fn format_output<T: Serialize>(value: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_json(value),
        OutputFormat::Pretty => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

/// A registered dialect and the tools it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialectStatus {
    pub dialect: String,
    pub tools: Vec<ToolStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
}

/// Probes `PATH` for every tool of every registered strategy.
pub fn dialect_statuses(registry: &StrategyRegistry) -> Vec<DialectStatus> {
    registry
        .strategies()
        .map(|strategy| DialectStatus {
            dialect: strategy.dialect().to_string(),
            tools: strategy
                .tools()
                .iter()
                .map(|tool| ToolStatus {
                    name: tool.to_string(),
                    available: tool_available(tool),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_statuses_cover_defaults() {
        let statuses = dialect_statuses(&StrategyRegistry::with_defaults());

        let names: Vec<(&str, Vec<&str>)> = statuses
            .iter()
            .map(|s| {
                (
                    s.dialect.as_str(),
                    s.tools.iter().map(|t| t.name.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("postgresql", vec!["pg_dump", "psql"]),
                ("sqlite", vec!["sqlite3"]),
            ]
        );
    }

    #[test]
    fn test_format_output_json_is_compact() {
        let status = ToolStatus {
            name: "psql".to_string(),
            available: false,
        };

        assert_eq!(
            format_output(&status, OutputFormat::Json),
            r#"{"name":"psql","available":false}"#
        );
    }
}
