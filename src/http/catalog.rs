use serde_json::Value;

use super::error::ApiError;
use crate::model::Track;

/// Turns the loosely-typed `/api/tracks` payload into tracks.
///
/// Accepts an array of tracks or an object whose values are tracks. Object
/// values come out with integer-like keys ascending, then the remaining keys
/// in document order.
pub fn normalize_catalog(payload: Value) -> Result<Vec<Track>, ApiError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut indexed = Vec::new();
            let mut named = Vec::new();
            for (key, value) in map {
                match key.parse::<u32>() {
                    Ok(index) if index.to_string() == key => indexed.push((index, value)),
                    _ => named.push(value),
                }
            }
            indexed.sort_by_key(|(index, _)| *index);
            indexed
                .into_iter()
                .map(|(_, value)| value)
                .chain(named)
                .collect()
        }
        other => {
            return Err(ApiError::Format(format!(
                "expected an array or object of tracks, got {}",
                json_kind(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            serde_json::from_value::<Track>(item)
                .map_err(|e| ApiError::Format(format!("entry {position}: {e}")))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
