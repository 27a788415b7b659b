use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Read-only view over one untyped entry of a configuration's `games` list.
///
/// The view borrows from the parsed document; nothing is copied until the
/// entry is normalized.
#[derive(Debug, Clone, Copy)]
pub struct RawGame<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> RawGame<'a> {
    /// Wrap a games-list element. Returns `None` for anything that is not an object.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(|fields| Self { fields })
    }

    /// Look up a raw field. `null` is treated the same as absent.
    pub fn field(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }
}

/// Release year as found in the document.
///
/// Collections mix numeric years with free text ("1980s", "Unknown"),
/// so both shapes survive normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReleaseYear {
    Year(i64),
    Text(String),
}

impl ReleaseYear {
    pub fn unknown() -> Self {
        ReleaseYear::Text("Unknown".to_string())
    }
}

impl Default for ReleaseYear {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for ReleaseYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseYear::Year(year) => write!(f, "{}", year),
            ReleaseYear::Text(text) => f.write_str(text),
        }
    }
}

/// A game entry after validation and defaulting.
///
/// `screenshot` and `rom` only record whether the source carried a value;
/// the payload itself is never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedGame {
    pub id: String,
    pub name: String,
    pub genre: String,
    pub year: ReleaseYear,
    pub players: u32,
    pub description: String,
    pub controls: Vec<String>,
    pub screenshot: bool,
    pub rom: bool,
    /// Unix epoch milliseconds at normalization
    pub loaded_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_game_rejects_non_objects() {
        assert!(RawGame::from_value(&json!(42)).is_none());
        assert!(RawGame::from_value(&json!(["a"])).is_none());
        assert!(RawGame::from_value(&json!({"name": "Pac-Man"})).is_some());
    }

    #[test]
    fn test_raw_game_null_is_absent() {
        let value = json!({"name": "Galaga", "genre": null});
        let raw = RawGame::from_value(&value).unwrap();
        assert!(raw.field("genre").is_none());
        assert_eq!(raw.field("name"), Some(&json!("Galaga")));
    }

    #[test]
    fn test_release_year_serialization() {
        assert_eq!(serde_json::to_value(ReleaseYear::Year(1981)).unwrap(), json!(1981));
        assert_eq!(serde_json::to_value(ReleaseYear::unknown()).unwrap(), json!("Unknown"));
        assert_eq!(ReleaseYear::Year(1991).to_string(), "1991");
    }

    #[test]
    fn test_normalized_game_uses_camel_case() {
        let game = NormalizedGame {
            id: "game_0".to_string(),
            name: "Frogger".to_string(),
            genre: "Arcade".to_string(),
            year: ReleaseYear::Year(1981),
            players: 2,
            description: String::new(),
            controls: vec!["joystick".to_string()],
            screenshot: true,
            rom: false,
            loaded_at: 1_700_000_000_000,
        };

        let value = serde_json::to_value(&game).unwrap();
        assert_eq!(value["loadedAt"], json!(1_700_000_000_000i64));
        assert_eq!(value["screenshot"], json!(true));
        assert!(value.get("loaded_at").is_none());
    }
}
