use serde::{Deserialize, Serialize};

use crate::collection::ReconciledCollection;

/// "Section complete" heuristic.
///
/// Complete when at least one non-deleted row has every required field
/// populated and the section remarks are not blank. Has no bearing on what
/// gets saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRule {
    pub required_fields: Vec<String>,
}

impl CompletionRule {
    pub fn new<I, S>(required_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_fields: required_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_complete(&self, collection: &ReconciledCollection, remarks: &str) -> bool {
        if remarks.trim().is_empty() {
            return false;
        }
        collection.active_rows().any(|row| {
            self.required_fields
                .iter()
                .all(|field| row.fields().is_populated(field))
        })
    }
}
