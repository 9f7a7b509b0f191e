//! Pretty output formatting.

use chrono::{DateTime, Local};
use dumpkeeper_core::backup::RestorePoint;

use super::DialectStatus;

const TAKEN_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format a restore point for display.
pub fn format_restore_point(point: &RestorePoint) -> String {
    let mut output = format!(
        "{}\n  Database: {}\n  Taken: {}\n  Path: {}",
        point.id,
        point.database,
        point.timestamp.format(TAKEN_FORMAT),
        point.path.display()
    );
    for (key, value) in &point.metadata {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        output.push_str(&format!("\n  {}: {}", key, value));
    }
    output
}

/// Format restore points for display.
pub fn format_restore_points(points: &[RestorePoint]) -> String {
    if points.is_empty() {
        return "No restore points found.".to_string();
    }
    let mut output = format!("RESTORE POINTS ({})\n", points.len());
    output.push_str(&"-".repeat(40));
    for point in points {
        output.push_str(&format!("\n{}", format_restore_point(point)));
        output.push('\n');
    }
    output
}

/// Format the last restore time for display.
pub fn format_last_restore(last: Option<DateTime<Local>>) -> String {
    match last {
        Some(at) => format!("Last restored: {}", at.format("%Y-%m-%d %H:%M:%S %:z")),
        None => "Never restored.".to_string(),
    }
}

/// Format dialects and their tools for display.
pub fn format_dialects(dialects: &[DialectStatus]) -> String {
    let mut output = format!("DIALECTS ({})\n", dialects.len());
    output.push_str(&"-".repeat(40));
    for dialect in dialects {
        output.push_str(&format!("\n{}", dialect.dialect));
        for tool in &dialect.tools {
            let state = if tool.available { "found" } else { "missing" };
            output.push_str(&format!("\n  {}: {}", tool.name, state));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::output::ToolStatus;

    fn point() -> RestorePoint {
        let mut point = RestorePoint::from_path(
            Path::new("backups/foo.db.dump.20120101-1200.gz"),
            Default::default(),
        )
        .unwrap();
        point.metadata.insert("ticket".to_string(), json!("OPS-12"));
        point.metadata.insert("rows".to_string(), json!(3));
        point
    }

    #[test]
    fn test_format_restore_point() {
        assert_eq!(
            format_restore_point(&point()),
            "58e5f54867606384bae9c27723c3e621\n  Database: foo.db\n  Taken: 2012-01-01 12:00\n  \
             Path: backups/foo.db.dump.20120101-1200.gz\n  rows: 3\n  ticket: OPS-12"
        );
    }

    #[test]
    fn test_format_empty_restore_points() {
        assert_eq!(format_restore_points(&[]), "No restore points found.");
    }

    #[test]
    fn test_format_restore_points_header() {
        let output = format_restore_points(&[point()]);

        assert!(output.starts_with("RESTORE POINTS (1)\n"));
        assert!(output.contains("58e5f54867606384bae9c27723c3e621"));
    }

    #[test]
    fn test_format_last_restore() {
        assert_eq!(format_last_restore(None), "Never restored.");

        let at = Local.with_ymd_and_hms(2012, 10, 4, 3, 0, 0).unwrap();
        assert!(format_last_restore(Some(at)).starts_with("Last restored: 2012-10-04 03:00:00"));
    }

    #[test]
    fn test_format_dialects() {
        let dialects = vec![DialectStatus {
            dialect: "sqlite".to_string(),
            tools: vec![ToolStatus {
                name: "sqlite3".to_string(),
                available: true,
            }],
        }];

        assert_eq!(
            format_dialects(&dialects),
            format!("DIALECTS (1)\n{}\nsqlite\n  sqlite3: found", "-".repeat(40))
        );
    }
}
