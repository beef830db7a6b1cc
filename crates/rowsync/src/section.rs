//! One editable table of a report form.
//!
//! A [`Section`] owns the reconciled collection of its table plus the
//! table's free-text remarks. Every mutation goes through the section so
//! that completion is recomputed and observers hear about the change.

use rowsync_api::{Fields, OptionItem, SectionEvent, Value};
use rowsync_core::{
    ChangeSet, CommitIds, CompletionRule, DeleteOutcome, ReconciledCollection, SectionObserver,
    SnapshotRow,
};
use std::sync::Arc;
use tracing::debug;

use crate::schema::SectionSchema;

pub struct Section {
    schema: SectionSchema,
    completion: CompletionRule,
    collection: ReconciledCollection,
    remarks: String,
    complete: bool,
    observers: Vec<Arc<dyn SectionObserver>>,
}

impl std::fmt::Debug for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Section")
            .field("name", &self.schema.name)
            .field("rows", &self.collection.len())
            .field("complete", &self.complete)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Section {
    /// An empty section waiting for its snapshot.
    pub fn new(schema: SectionSchema) -> Self {
        Self {
            completion: schema.completion_rule(),
            collection: schema.new_collection(),
            schema,
            remarks: String::new(),
            complete: false,
            observers: Vec::new(),
        }
    }

    /// A section for a report that has never been saved, holding the
    /// table's seed rows.
    pub fn for_new_report(schema: SectionSchema) -> Self {
        let seeds: Vec<SnapshotRow> = schema.seed_rows.iter().cloned().map(SnapshotRow::seed).collect();
        let mut section = Self::new(schema);
        section.collection.hydrate(seeds);
        section.complete = section.compute_complete();
        section
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &SectionSchema {
        &self.schema
    }

    pub fn collection(&self) -> &ReconciledCollection {
        &self.collection
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_dirty(&self) -> bool {
        self.collection.is_dirty()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn SectionObserver>) {
        self.observers.push(observer);
    }

    /// Load persisted rows and remarks through the collection's hydration
    /// gate. Returns `false` when the snapshot was ignored.
    pub fn hydrate(
        &mut self,
        snapshot: impl IntoIterator<Item = SnapshotRow>,
        remarks: impl Into<String>,
    ) -> bool {
        if !self.collection.hydrate(snapshot) {
            return false;
        }
        self.remarks = remarks.into();
        self.changed();
        true
    }

    /// Replace rows and remarks after a save-and-reload.
    pub fn reload(
        &mut self,
        snapshot: impl IntoIterator<Item = SnapshotRow>,
        remarks: impl Into<String>,
    ) {
        self.collection.reload(snapshot);
        self.remarks = remarks.into();
        self.changed();
    }

    pub fn add_row(&mut self, initial_fields: Fields) -> usize {
        let position = self.collection.add_row(initial_fields);
        self.changed();
        position
    }

    pub fn edit_field(
        &mut self,
        position: usize,
        field: &str,
        value: impl Into<Value>,
    ) -> rowsync_core::error::Result<bool> {
        let changed = self.collection.edit_field(position, field, value)?;
        if changed {
            self.changed();
        }
        Ok(changed)
    }

    pub fn delete_row(&mut self, position: usize) -> rowsync_core::error::Result<DeleteOutcome> {
        let outcome = self.collection.delete_row(position)?;
        self.changed();
        Ok(outcome)
    }

    pub fn restore_row(&mut self, position: usize) -> rowsync_core::error::Result<()> {
        self.collection.restore_row(position)?;
        self.changed();
        Ok(())
    }

    pub fn set_remarks(&mut self, remarks: impl Into<String>) {
        let remarks = remarks.into();
        if remarks == self.remarks {
            return;
        }
        self.remarks = remarks;
        self.changed();
    }

    /// Install loaded reference options. New rows may pick up auto-filled
    /// values, so observers are told when any row changed.
    pub fn set_reference_options(&mut self, key: &str, options: Vec<OptionItem>) {
        let before = self.collection.records();
        self.collection.set_reference_options(key, options);
        if self.collection.records() != before {
            self.changed();
        }
    }

    pub fn diff(&self) -> ChangeSet {
        self.collection.diff()
    }

    pub fn commit(&mut self, ids: &CommitIds) -> rowsync_core::error::Result<()> {
        self.collection.commit(ids)?;
        self.changed();
        Ok(())
    }

    fn compute_complete(&self) -> bool {
        self.completion.is_complete(&self.collection, &self.remarks)
    }

    fn changed(&mut self) {
        let complete = self.compute_complete();
        if complete != self.complete {
            self.complete = complete;
            debug!("Section {} complete: {}", self.schema.name, complete);
            self.emit(SectionEvent::StatusChanged {
                section: self.schema.name.clone(),
                complete,
            });
        }
        self.emit(SectionEvent::DataChanged {
            section: self.schema.name.clone(),
            rows: self.collection.records(),
            remarks: self.remarks.clone(),
        });
    }

    fn emit(&self, event: SectionEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use rowsync_api::LifecycleState;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<SectionEvent>>);

    impl SectionObserver for Recorder {
        fn on_event(&self, event: &SectionEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    impl Recorder {
        fn statuses(&self) -> Vec<bool> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    SectionEvent::StatusChanged { complete, .. } => Some(*complete),
                    _ => None,
                })
                .collect()
        }

        fn data_events(&self) -> usize {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| matches!(e, SectionEvent::DataChanged { .. }))
                .count()
        }
    }

    fn time_sync_section() -> (Section, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let mut section = Section::new(catalog::time_sync());
        section.subscribe(recorder.clone());
        (section, recorder)
    }

    #[test]
    fn test_status_reported_only_on_change() {
        let (mut section, recorder) = time_sync_section();
        let position = section.add_row(Fields::from([("machineName", "HMI-1")]));
        section.edit_field(position, "timeSyncResultId", 1).unwrap();
        assert!(recorder.statuses().is_empty());

        section.set_remarks("clocks aligned");
        section.set_remarks("clocks aligned within 1s");
        assert_eq!(recorder.statuses(), vec![true]);

        section.delete_row(position).unwrap();
        assert_eq!(recorder.statuses(), vec![true, false]);
        assert!(!section.is_complete());
    }

    #[test]
    fn test_every_data_change_is_reported() {
        let (mut section, recorder) = time_sync_section();
        section.hydrate(
            vec![SnapshotRow::persisted("t1", Fields::from([("machineName", "HMI-1")]))],
            "",
        );
        section.edit_field(0, "machineName", "HMI-1").unwrap();
        assert_eq!(recorder.data_events(), 1, "no-op edit must stay silent");

        section.edit_field(0, "machineName", "HMI-2").unwrap();
        section.set_remarks("done");
        section.set_remarks("done");
        assert_eq!(recorder.data_events(), 3);
    }

    #[test]
    fn test_restore_recomputes_completion() {
        let (mut section, recorder) = time_sync_section();
        section.hydrate(
            vec![SnapshotRow::persisted(
                "t1",
                Fields::from([("machineName", "HMI-1"), ("timeSyncResultId", "1")]),
            )],
            "checked",
        );
        assert!(section.is_complete());

        section.delete_row(0).unwrap();
        section.restore_row(0).unwrap();
        assert!(section.is_complete());
        assert_eq!(recorder.statuses(), vec![true, false, true]);
        assert_eq!(section.collection().row(0).unwrap().state(), LifecycleState::Modified);
    }

    #[test]
    fn test_new_report_starts_with_seed_rows() {
        let section = Section::for_new_report(catalog::asa_firewall());
        assert_eq!(section.collection().len(), 5);
        assert!(section.is_dirty());
        assert!(
            section
                .collection()
                .rows()
                .iter()
                .all(|r| r.state() == LifecycleState::New)
        );
    }

    #[test]
    fn test_loading_options_autofills_seed_rows() {
        let recorder = Arc::new(Recorder::default());
        let mut section = Section::for_new_report(catalog::asa_firewall());
        section.subscribe(recorder.clone());

        section.set_reference_options(
            catalog::lookups::ASA_EXPECTED_RESULTS,
            vec![OptionItem::new(7, "Active/Standby Ready")],
        );
        let failover = section
            .collection()
            .rows()
            .iter()
            .find(|r| r.get("commandInput") == Some(&Value::from("show failover")))
            .unwrap();
        assert_eq!(failover.get("expectedResultId"), Some(&Value::Integer(7)));
        assert_eq!(recorder.data_events(), 1);

        section.set_reference_options(catalog::lookups::YES_NO_STATUS, Vec::new());
        assert_eq!(recorder.data_events(), 1);
    }
}
