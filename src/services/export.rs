use crate::models::{LoadResult, NormalizedGame, RESULT_KEYS};
use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;

/// Producer tag written into every export
pub const EXPORTED_BY: &str = "octoarcade";

/// Keys written by the exporter itself
const EXPORT_KEYS: &[&str] = &["exportedAt", "exportedBy", "exporterVersion"];

/// A loaded configuration in its downloadable form.
///
/// Carries the document metadata and the normalized games, stamped with the
/// export time and producer. Load telemetry is not part of an export, so an
/// export can be fed back to the loader as a configuration document.
/// Readers must tolerate fields they do not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedConfiguration {
    #[serde(flatten)]
    pub metadata: IndexMap<String, Value>,
    pub games: Vec<NormalizedGame>,
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
    pub exporter_version: String,
}

/// Build the export of a load result
pub fn export_configuration(result: &LoadResult) -> ExportedConfiguration {
    let metadata = result
        .metadata
        .iter()
        .filter(|(key, _)| {
            !RESULT_KEYS.contains(&key.as_str()) && !EXPORT_KEYS.contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    ExportedConfiguration {
        metadata,
        games: result.games.clone(),
        exported_at: Utc::now(),
        exported_by: EXPORTED_BY.to_string(),
        exporter_version: crate::VERSION.to_string(),
    }
}

/// Write an export as pretty-printed JSON.
pub fn write_export(path: &Utf8Path, export: &ExportedConfiguration) -> Result<()> {
    let json = serde_json::to_string_pretty(export).context("Failed to serialize export")?;

    fs::write(path, json).with_context(|| format!("Failed to write export: {}", path))?;

    tracing::info!("Exported {} games to {}", export.games.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::UsageSnapshot;
    use crate::models::ReleaseYear;
    use serde_json::json;

    fn sample_result() -> LoadResult {
        let mut metadata = IndexMap::new();
        metadata.insert("name".to_string(), json!("Cabinet"));
        metadata.insert("exportedBy".to_string(), json!("someone else"));

        LoadResult {
            metadata,
            games: vec![NormalizedGame {
                id: "game_0".to_string(),
                name: "Asteroids".to_string(),
                genre: "Shoot 'em up".to_string(),
                year: ReleaseYear::Year(1979),
                players: 2,
                description: String::new(),
                controls: vec![],
                screenshot: false,
                rom: true,
                loaded_at: 0,
            }],
            total_games: 1,
            loaded_at: Utc::now(),
            memory_stats: UsageSnapshot::default(),
        }
    }

    #[test]
    fn test_export_excludes_telemetry() {
        let export = export_configuration(&sample_result());
        let value = serde_json::to_value(&export).unwrap();

        assert_eq!(value["name"], json!("Cabinet"));
        assert_eq!(value["exportedBy"], json!("octoarcade"));
        assert_eq!(value["exporterVersion"], json!(crate::VERSION));
        assert!(value.get("exportedAt").is_some());
        assert!(value.get("memoryStats").is_none());
        assert!(value.get("totalGames").is_none());
        assert_eq!(value["games"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_write_export() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = camino::Utf8PathBuf::try_from(temp_dir.path().join("export.json")).unwrap();

        write_export(&path, &export_configuration(&sample_result())).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let parsed: ExportedConfiguration = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.games[0].name, "Asteroids");
        assert_eq!(parsed.exported_by, "octoarcade");
    }
}
