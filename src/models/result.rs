use crate::metrics::UsageSnapshot;
use crate::models::NormalizedGame;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level keys the loader owns in a [`LoadResult`].
///
/// Document metadata with one of these names is dropped so the result
/// serializes without duplicate keys.
pub const RESULT_KEYS: &[&str] = &["games", "totalGames", "loadedAt", "memoryStats"];

/// Aggregate produced by a successful load.
///
/// Serializes as the document's own metadata (in original order) followed by
/// the normalized games and the loader's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResult {
    #[serde(flatten)]
    pub metadata: IndexMap<String, Value>,
    pub games: Vec<NormalizedGame>,
    pub total_games: usize,
    pub loaded_at: DateTime<Utc>,
    pub memory_stats: UsageSnapshot,
}

impl LoadResult {
    /// Collection name from the document metadata, if present
    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }

    /// Collection version from the document metadata, if present
    pub fn version(&self) -> Option<&str> {
        self.metadata.get("version").and_then(Value::as_str)
    }
}
