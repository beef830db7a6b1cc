//! Static description of one editable table.

use rowsync_api::Fields;
use rowsync_core::{AutofillRule, CompletionRule, ReconciledCollection};
use serde::{Deserialize, Serialize};

/// A reference-data list a section needs while editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLookup {
    pub key: String,
    /// Whether the list depends on the selected station
    #[serde(default)]
    pub scoped: bool,
}

impl ReferenceLookup {
    pub fn global(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            scoped: false,
        }
    }

    pub fn scoped(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            scoped: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSchema {
    pub name: String,
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub autofill: Vec<AutofillRule>,
    #[serde(default)]
    pub lookups: Vec<ReferenceLookup>,
    /// Rows a brand-new report starts with
    #[serde(default)]
    pub seed_rows: Vec<Fields>,
    /// Field that carries the parent report id on every created row
    #[serde(default)]
    pub parent_link: Option<String>,
}

impl SectionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_fields: Vec::new(),
            autofill: Vec::new(),
            lookups: Vec::new(),
            seed_rows: Vec::new(),
            parent_link: None,
        }
    }

    pub fn require<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn autofill(mut self, rule: AutofillRule) -> Self {
        self.autofill.push(rule);
        self
    }

    pub fn lookup(mut self, lookup: ReferenceLookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    pub fn seed(mut self, row: Fields) -> Self {
        self.seed_rows.push(row);
        self
    }

    pub fn parent_link(mut self, field: impl Into<String>) -> Self {
        self.parent_link = Some(field.into());
        self
    }

    pub fn completion_rule(&self) -> CompletionRule {
        CompletionRule::new(self.required_fields.iter().cloned())
    }

    /// An empty, uninitialized collection carrying this table's auto-fill
    /// rules.
    pub fn new_collection(&self) -> ReconciledCollection {
        ReconciledCollection::new().with_autofill(self.autofill.clone())
    }

    pub fn has_scoped_lookups(&self) -> bool {
        self.lookups.iter().any(|l| l.scoped)
    }
}
