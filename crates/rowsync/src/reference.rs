//! Loading of reference data into sections.
//!
//! Lookups run when a section mounts and again when the station scope
//! changes. A failed lookup leaves the section with an empty option list and
//! never blocks editing.

use rowsync_core::ReferenceDataSource;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::form::ReportForm;
use crate::schema::ReferenceLookup;
use crate::section::Section;

pub struct ReferenceDataLoader {
    source: Arc<dyn ReferenceDataSource>,
    /// Scope each mounted section was last loaded with
    scopes: HashMap<String, Option<String>>,
}

impl ReferenceDataLoader {
    pub fn new(source: Arc<dyn ReferenceDataSource>) -> Self {
        Self {
            source,
            scopes: HashMap::new(),
        }
    }

    /// Load every lookup of `section`. Returns the number of lookups that
    /// failed and were degraded to empty lists.
    pub async fn mount(&mut self, section: &mut Section, scope: Option<&str>) -> usize {
        let lookups = section.schema().lookups.clone();
        let failures = self.load(section, &lookups, scope).await;
        self.scopes
            .insert(section.name().to_string(), scope.map(str::to_string));
        failures
    }

    /// Mount every section of `form` with the same scope.
    pub async fn mount_form(&mut self, form: &mut ReportForm, scope: Option<&str>) -> usize {
        let mut failures = 0;
        for section in form.sections_mut() {
            failures += self.mount(section, scope).await;
        }
        failures
    }

    /// Reload the scoped lookups of `section` when `scope` differs from the
    /// one it was last loaded with. Returns `false` when nothing was fetched.
    pub async fn change_scope(&mut self, section: &mut Section, scope: Option<&str>) -> bool {
        let current = self.scopes.get(section.name()).map(Option::as_deref);
        if current == Some(scope) {
            debug!("Scope of section {} unchanged, not refetching", section.name());
            return false;
        }

        let scoped: Vec<ReferenceLookup> = section
            .schema()
            .lookups
            .iter()
            .filter(|l| l.scoped)
            .cloned()
            .collect();
        self.load(section, &scoped, scope).await;
        self.scopes
            .insert(section.name().to_string(), scope.map(str::to_string));
        true
    }

    /// Apply a scope change to every section of `form`. Returns how many
    /// sections refetched.
    pub async fn change_form_scope(&mut self, form: &mut ReportForm, scope: Option<&str>) -> usize {
        let mut refetched = 0;
        for section in form.sections_mut() {
            if self.change_scope(section, scope).await {
                refetched += 1;
            }
        }
        refetched
    }

    pub fn scope_of(&self, section: &str) -> Option<&str> {
        self.scopes.get(section).and_then(Option::as_deref)
    }

    async fn load(
        &self,
        section: &mut Section,
        lookups: &[ReferenceLookup],
        scope: Option<&str>,
    ) -> usize {
        let mut failures = 0;
        for lookup in lookups {
            let lookup_scope = if lookup.scoped { scope } else { None };
            let options = match self.source.fetch(&lookup.key, lookup_scope).await {
                Ok(options) => {
                    debug!(
                        "Loaded {} options for {} of section {}",
                        options.len(),
                        lookup.key,
                        section.name()
                    );
                    options
                }
                Err(err) => {
                    warn!(
                        "Reference lookup {} for section {} failed, using no options: {}",
                        lookup.key,
                        section.name(),
                        err
                    );
                    failures += 1;
                    Vec::new()
                }
            };
            section.set_reference_options(&lookup.key, options);
        }
        failures
    }
}

impl std::fmt::Debug for ReferenceDataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceDataLoader")
            .field("scopes", &self.scopes)
            .finish()
    }
}
