use serde::{Deserialize, Serialize};

use crate::Value;

/// One `{id, name}` entry of a reference-data list (status enumerations,
/// warehouse-scoped equipment names and the like).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    pub id: Value,
    pub name: String,
}

impl OptionItem {
    pub fn new(id: impl Into<Value>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Case- and whitespace-insensitive name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Find the option whose name matches `name`.
pub fn find_by_name<'a>(options: &'a [OptionItem], name: &str) -> Option<&'a OptionItem> {
    options.iter().find(|o| o.name_matches(name))
}
