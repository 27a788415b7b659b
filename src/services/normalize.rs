use crate::models::{NormalizedGame, RawGame, ReleaseYear};
use crate::services::LoadError;
use serde_json::Value;

/// Default for a missing or empty `genre`
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Id assigned to an entry that does not carry one
pub fn synthesized_id(index: usize) -> String {
    format!("game_{}", index)
}

/// Whether a raw value counts as "set".
///
/// `null`, `false`, `0`, `NaN` and the empty string are unset; everything
/// else (including empty arrays and objects) is set.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text of a string or number value, if it is set
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if is_truthy(value) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Integer value of a number, accepting floats with no fractional part (`2.0`)
fn whole_number(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn year_of(value: Option<&Value>) -> ReleaseYear {
    match value {
        Some(Value::Number(n)) => match whole_number(n) {
            Some(0) => ReleaseYear::unknown(),
            Some(year) => ReleaseYear::Year(year),
            // A fractional year is kept as written
            None => ReleaseYear::Text(n.to_string()),
        },
        Some(Value::String(s)) if !s.is_empty() => ReleaseYear::Text(s.clone()),
        _ => ReleaseYear::unknown(),
    }
}

fn players_of(value: Option<&Value>) -> u32 {
    let count = match value {
        Some(Value::Number(n)) => whole_number(n).and_then(|n| u64::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    count
        .filter(|&n| n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1)
}

fn controls_of(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize one entry of the `games` list.
///
/// Applies the defaulting rules (`genre`/`year` "Unknown", `players` 1, empty
/// `description` and `controls`, `game_<index>` id) and reduces `screenshot`
/// and `rom` to presence flags. No part of those two payloads is copied.
///
/// # Errors
/// [`LoadError::MissingField`] when the entry is not an object or has no
/// usable `name`.
pub fn normalize_game(
    entry: &Value,
    index: usize,
    loaded_at: i64,
) -> Result<NormalizedGame, LoadError> {
    let missing_name = || LoadError::MissingField {
        index,
        field: "name",
    };

    let raw = RawGame::from_value(entry).ok_or_else(missing_name)?;
    let name = raw.field("name").and_then(text_of).ok_or_else(missing_name)?;

    Ok(NormalizedGame {
        id: raw
            .field("id")
            .and_then(text_of)
            .unwrap_or_else(|| synthesized_id(index)),
        name,
        genre: non_empty_str(raw.field("genre"))
            .unwrap_or(UNKNOWN_GENRE)
            .to_string(),
        year: year_of(raw.field("year")),
        players: players_of(raw.field("players")),
        description: non_empty_str(raw.field("description"))
            .unwrap_or_default()
            .to_string(),
        controls: controls_of(raw.field("controls")),
        screenshot: raw.field("screenshot").is_some_and(is_truthy),
        rom: raw.field("rom").is_some_and(is_truthy),
        loaded_at,
    })
}
