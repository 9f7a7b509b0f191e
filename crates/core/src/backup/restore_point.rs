use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use super::naming::{parse_dump_file_name, restore_point_id, DUMP_TIMESTAMP_FORMAT};
use crate::error::{CoreError, Result};

/// Caller supplied metadata stored next to a dump.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A dump that can be loaded to bring a database back to an earlier state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestorePoint {
    /// Hex MD5 of the dump file name.
    pub id: String,
    /// Database name the dump was taken from.
    pub database: String,
    /// When the dump was taken (local time, minute resolution).
    pub timestamp: NaiveDateTime,
    pub path: PathBuf,
    pub metadata: Metadata,
}

impl RestorePoint {
    /// Builds a restore point from the path of a dump file.
    ///
    /// Returns `None` when the file name does not follow the dump naming
    /// scheme.
    pub fn from_path(path: &Path, metadata: Metadata) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let parsed = parse_dump_file_name(file_name)?;

        Some(Self {
            id: restore_point_id(file_name),
            database: parsed.database,
            timestamp: parsed.timestamp,
            path: path.to_path_buf(),
            metadata,
        })
    }

    /// The timestamp as it appears in the file name (`YYYYMMDD-HHMM`).
    pub fn stamp(&self) -> String {
        self.timestamp.format(DUMP_TIMESTAMP_FORMAT).to_string()
    }
}

/// Sorts restore points oldest first, breaking ties by database name.
pub fn sort_by_timestamp(points: &mut [RestorePoint]) {
    points.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.database.cmp(&b.database))
    });
}

/// Parses the contents of a metadata sidecar, which must be a JSON object.
pub fn parse_metadata(text: &str) -> Result<Metadata> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(CoreError::InvalidMetadata(format!(
            "expected a JSON object, found {other}"
        ))),
        Err(e) => Err(CoreError::InvalidMetadata(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_from_path() {
        let path = Path::new("/backups/foo.db.dump.20120101-1200.gz");

        let point = RestorePoint::from_path(path, Metadata::new()).unwrap();

        assert_eq!(point.id, "58e5f54867606384bae9c27723c3e621");
        assert_eq!(point.database, "foo.db");
        assert_eq!(point.stamp(), "20120101-1200");
        assert_eq!(point.path, path);
        assert!(point.metadata.is_empty());
    }

    #[test]
    fn test_from_path_rejects_other_files() {
        let path = Path::new("/backups/foo.db.last_restore");

        assert_eq!(RestorePoint::from_path(path, Metadata::new()), None);
    }

    #[test]
    fn test_sort_by_timestamp() {
        let mut points: Vec<RestorePoint> = [
            "b.dump.20120103-1200.gz",
            "a.dump.20120101-1200.gz",
            "b.dump.20120101-1200.gz",
        ]
        .iter()
        .map(|name| RestorePoint::from_path(Path::new(name), Metadata::new()).unwrap())
        .collect();

        sort_by_timestamp(&mut points);

        let order: Vec<(&str, String)> = points
            .iter()
            .map(|p| (p.database.as_str(), p.stamp()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a", "20120101-1200".to_string()),
                ("b", "20120101-1200".to_string()),
                ("b", "20120103-1200".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_metadata_object() {
        let metadata = parse_metadata(r#"{"k": "v", "n": 1}"#).unwrap();

        assert_eq!(metadata.get("k"), Some(&json!("v")));
        assert_eq!(metadata.get("n"), Some(&json!(1)));
    }

    #[test]
    fn test_parse_metadata_rejects_non_objects() {
        assert!(matches!(
            parse_metadata("[1, 2]"),
            Err(CoreError::InvalidMetadata(_))
        ));
        assert!(matches!(
            parse_metadata("{not json"),
            Err(CoreError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn test_serializes_timestamp_and_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("reason".to_string(), json!("nightly"));
        let point = RestorePoint {
            id: "abc".to_string(),
            database: "app".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(2, 30, 0)
                .unwrap(),
            path: PathBuf::from("/b/app.dump.20240501-0230.gz"),
            metadata,
        };

        let value = serde_json::to_value(&point).unwrap();

        assert_eq!(value["timestamp"], json!("2024-05-01T02:30:00"));
        assert_eq!(value["metadata"]["reason"], json!("nightly"));
        assert_eq!(value["path"], json!("/b/app.dump.20240501-0230.gz"));
    }
}
