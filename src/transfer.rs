//! Backup export and import
//!
//! Export writes the full state as pretty JSON. Import parses an arbitrary
//! document, coerces it into a complete state, and hands it back for the
//! caller to install; it is always a full replacement, never a merge.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{ImportError, Result};
use crate::model::{AppState, DocumentParts};

/// Default prefix for export file names
pub const DEFAULT_EXPORT_PREFIX: &str = "hogares_backup";

/// Serialize the whole state for a backup file
pub fn export_document(state: &AppState) -> Result<Vec<u8>> {
    let mut data = serde_json::to_vec_pretty(state)?;
    data.push(b'\n');
    Ok(data)
}

/// `<prefix>_<YYYY-MM-DD>.json`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.json", date.format("%Y-%m-%d"))
}

/// Build the replacement state from an external document.
///
/// Missing or empty `places`/`categories` keep the current ones; missing
/// `tasks` means no tasks. A repeated task id is replaced by a fresh one.
pub fn import_document(
    raw: &[u8],
    current: &AppState,
) -> std::result::Result<AppState, ImportError> {
    let value: Value = serde_json::from_slice(raw).map_err(ImportError::Malformed)?;
    let map = match &value {
        Value::Object(map) => map,
        other => return Err(ImportError::NotAnObject(json_kind(other))),
    };

    let parts = DocumentParts::from_object(map);
    Ok(parts.into_state(|| current.places.clone(), || current.categories.clone()))
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
