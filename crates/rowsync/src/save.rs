//! Save orchestration.
//!
//! A save walks the form's sections in order. Within a section the creates,
//! updates and deletes are independent, so they are dispatched together and
//! awaited as a batch. Sections run one after another because later sections
//! may depend on ids created by earlier ones. The first failing section stops
//! the save; it stays uncommitted so a retry re-issues the same change-set.

use futures::future::join_all;
use rowsync_api::{RowId, Value};
use rowsync_core::{ChangeSet, CommitIds, PersistenceService};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Instrument, debug, error, info, info_span};

use crate::error::{Result, SaveError};
use crate::form::ReportForm;
use crate::registry::PersistenceRegistry;
use crate::section::Section;

/// Outcome of one section within a save.
#[derive(Debug)]
pub enum SectionOutcome {
    Committed {
        created: usize,
        updated: usize,
        deleted: usize,
    },
    /// Nothing to persist
    Unchanged,
    Failed(SaveError),
    /// Not attempted because an earlier section failed
    Skipped,
}

impl SectionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionOutcome::Committed { .. } => "committed",
            SectionOutcome::Unchanged => "unchanged",
            SectionOutcome::Failed(_) => "failed",
            SectionOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-section outcomes of one save, in form order.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub sections: Vec<(String, SectionOutcome)>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    /// The failing section and its error, if any.
    pub fn failure(&self) -> Option<(&str, &SaveError)> {
        self.sections.iter().find_map(|(name, outcome)| match outcome {
            SectionOutcome::Failed(err) => Some((name.as_str(), err)),
            _ => None,
        })
    }

    pub fn outcome(&self, section: &str) -> Option<&SectionOutcome> {
        self.sections
            .iter()
            .find(|(name, _)| name == section)
            .map(|(_, outcome)| outcome)
    }

    /// Turn a failed report into its error.
    pub fn into_result(self) -> Result<Self> {
        let mut sections = Vec::with_capacity(self.sections.len());
        for (name, outcome) in self.sections {
            match outcome {
                SectionOutcome::Failed(err) => return Err(err),
                other => sections.push((name, other)),
            }
        }
        Ok(Self { sections })
    }
}

/// Clears the saving flag when a save settles, however it ends.
struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives saves and rejects a save while another one is running.
///
/// Clones share the saving flag.
#[derive(Debug, Clone, Default)]
pub struct SaveCoordinator {
    saving: Arc<AtomicBool>,
}

impl SaveCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    /// Persist every pending change of `form`.
    ///
    /// Fails with [`SaveError::SaveInProgress`] when another save holds the
    /// flag. Otherwise returns a report; persistence failures are recorded in
    /// it rather than returned, see [`SaveReport::into_result`].
    pub async fn save(
        &self,
        form: &mut ReportForm,
        registry: &PersistenceRegistry,
    ) -> Result<SaveReport> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SaveError::SaveInProgress);
        }
        let _guard = SavingGuard(&self.saving);

        let report_id = form.report_id().cloned();
        let span = info_span!(
            "save_form",
            report_id = report_id.as_ref().map(RowId::as_str).unwrap_or("-")
        );
        save_sections(form, registry, report_id).instrument(span).await
    }
}

async fn save_sections(
    form: &mut ReportForm,
    registry: &PersistenceRegistry,
    report_id: Option<RowId>,
) -> Result<SaveReport> {
    let mut report = SaveReport::default();
    let mut failed = false;

    for section in form.sections_mut() {
        let name = section.name().to_string();
        if failed {
            report.sections.push((name, SectionOutcome::Skipped));
            continue;
        }

        let span = info_span!("save_section", section = %name);
        let outcome = save_section(section, registry, report_id.as_ref())
            .instrument(span)
            .await;
        if let SectionOutcome::Failed(err) = &outcome {
            error!("Saving section {} failed: {}", name, err);
            failed = true;
        }
        report.sections.push((name, outcome));
    }

    info!(
        "Save finished: {} sections, success={}",
        report.sections.len(),
        !failed
    );
    Ok(report)
}

async fn save_section(
    section: &mut Section,
    registry: &PersistenceRegistry,
    report_id: Option<&RowId>,
) -> SectionOutcome {
    let changes = section.diff();
    if changes.is_empty() {
        debug!("Section {} has no pending changes", section.name());
        return SectionOutcome::Unchanged;
    }

    let Some(service) = registry.get(section.name()) else {
        return SectionOutcome::Failed(SaveError::NoPersistenceService {
            section: section.name().to_string(),
        });
    };

    info!(
        "Saving section {}: {} creates, {} updates, {} deletes",
        section.name(),
        changes.to_create.len(),
        changes.to_update.len(),
        changes.to_delete.len()
    );

    let parent = section
        .schema()
        .parent_link
        .as_deref()
        .zip(report_id)
        .map(|(field, id)| (field.to_string(), Value::from(id.as_str())));

    let ids = match dispatch(section.name(), &changes, service, parent).await {
        Ok(ids) => ids,
        Err(err) => return SectionOutcome::Failed(err),
    };

    if let Err(err) = section.commit(&ids) {
        return SectionOutcome::Failed(err.into());
    }
    SectionOutcome::Committed {
        created: changes.to_create.len(),
        updated: changes.to_update.len(),
        deleted: changes.to_delete.len(),
    }
}

/// Issue every call of `changes` concurrently and collect the ids of the
/// created rows.
async fn dispatch(
    section: &str,
    changes: &ChangeSet,
    service: Arc<dyn PersistenceService>,
    parent: Option<(String, Value)>,
) -> Result<CommitIds> {
    let creates = changes.to_create.iter().map(|create| {
        let mut fields = create.fields.clone();
        if let Some((field, id)) = &parent {
            fields.insert(field.clone(), id.clone());
        }
        let service = service.clone();
        async move { (create.position, service.create(fields).await) }
    });
    let updates = changes.to_update.iter().map(|update| {
        let service = service.clone();
        async move { service.update(&update.id, update.fields.clone()).await }
    });
    let deletes = changes.to_delete.iter().map(|id| {
        let service = service.clone();
        async move { service.delete(id).await }
    });

    let (created, updated, deleted) =
        futures::join!(join_all(creates), join_all(updates), join_all(deletes));

    let failure = |operation: &str, err: Box<dyn std::error::Error + Send + Sync>| {
        SaveError::PersistenceFailure {
            section: section.to_string(),
            operation: operation.to_string(),
            message: err.to_string(),
        }
    };

    let mut ids = CommitIds::new();
    for (position, result) in created {
        ids.insert(position, result.map_err(|e| failure("create", e))?);
    }
    for result in updated {
        result.map_err(|e| failure("update", e))?;
    }
    for result in deleted {
        result.map_err(|e| failure("delete", e))?;
    }
    Ok(ids)
}
