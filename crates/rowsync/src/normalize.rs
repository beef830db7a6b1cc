//! Field-casing normalization at the persistence boundary.
//!
//! Different backend endpoints return the same column as `ServerName`,
//! `serverName` or `server_name`, and identifiers as `ID`, `Id` or `id`.
//! Records are mapped to lower-camel keys once, when they cross into the
//! crate, so nothing downstream needs fallback chains.

use convert_case::{Case, Casing};
use rowsync_api::{Fields, Value};

/// Map one key to its lower-camel form.
///
/// `ServerName` -> `serverName`, `ID` -> `id`, `RTUName` -> `rtuName`,
/// `ExpectedResultID` -> `expectedResultId`, `server_name` -> `serverName`.
/// Keys already in lower-camel are returned unchanged.
pub fn canonical_key(key: &str) -> String {
    key.to_case(Case::Camel)
}

/// Normalize every key of `fields`.
///
/// When two keys collapse onto the same canonical key, the one that was
/// already canonical wins regardless of order.
pub fn normalize_fields(fields: Fields) -> Fields {
    let mut out = Fields::new();
    for (key, value) in fields {
        let canonical = canonical_key(&key);
        let already_canonical = canonical == key;
        if already_canonical || !out.contains(&canonical) {
            out.insert(canonical, value);
        }
    }
    out
}

/// Normalize a JSON object into [`Fields`]. Non-object values yield `None`.
pub fn normalize_json(value: serde_json::Value) -> Option<Fields> {
    match value {
        serde_json::Value::Object(map) => Some(normalize_fields(
            map.into_iter()
                .map(|(k, v)| (k, Value::from_json_value(v)))
                .collect(),
        )),
        _ => None,
    }
}
