//! A report form: the ordered set of editable sections a report is made of.

use indexmap::IndexMap;
use rowsync_api::{RowId, RowRecord};
use rowsync_core::SectionObserver;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{Result, SaveError};
use crate::schema::SectionSchema;
use crate::section::Section;

/// Completed sections out of all sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub complete: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.complete == self.total
    }
}

/// Serializable state of one section as submitted with the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSnapshot {
    pub name: String,
    pub complete: bool,
    pub remarks: String,
    pub rows: Vec<RowRecord>,
}

/// The aggregate a form hands to its parent on submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub report_id: Option<RowId>,
    pub sections: Vec<SectionSnapshot>,
}

#[derive(Default)]
pub struct ReportForm {
    report_id: Option<RowId>,
    sections: IndexMap<String, Section>,
    observers: Vec<Arc<dyn SectionObserver>>,
}

impl std::fmt::Debug for ReportForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportForm")
            .field("report_id", &self.report_id)
            .field("sections", &self.sections)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ReportForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// An edit form for an existing report: sections start empty and wait
    /// for their snapshots.
    pub fn for_report(report_id: impl Into<RowId>, schemas: Vec<SectionSchema>) -> Self {
        let mut form = Self::new().with_report_id(report_id);
        for schema in schemas {
            form.sections.insert(schema.name.clone(), Section::new(schema));
        }
        form
    }

    /// A form for a report that does not exist yet: sections hold their
    /// seed rows.
    pub fn for_new_report(schemas: Vec<SectionSchema>) -> Self {
        let mut form = Self::new();
        for schema in schemas {
            form.sections
                .insert(schema.name.clone(), Section::for_new_report(schema));
        }
        form
    }

    pub fn with_report_id(mut self, report_id: impl Into<RowId>) -> Self {
        self.report_id = Some(report_id.into());
        self
    }

    pub fn report_id(&self) -> Option<&RowId> {
        self.report_id.as_ref()
    }

    pub fn set_report_id(&mut self, report_id: impl Into<RowId>) {
        self.report_id = Some(report_id.into());
    }

    /// Append a section. Observers already registered on the form are
    /// subscribed to it.
    pub fn add_section(&mut self, mut section: Section) -> Result<()> {
        if self.sections.contains_key(section.name()) {
            return Err(SaveError::DuplicateSection(section.name().to_string()));
        }
        for observer in &self.observers {
            section.subscribe(observer.clone());
        }
        self.sections.insert(section.name().to_string(), section);
        Ok(())
    }

    /// Register an observer on every current and future section.
    pub fn add_observer(&mut self, observer: Arc<dyn SectionObserver>) {
        for section in self.sections.values_mut() {
            section.subscribe(observer.clone());
        }
        self.observers.push(observer);
    }

    pub fn section(&self, name: &str) -> Result<&Section> {
        self.sections
            .get(name)
            .ok_or_else(|| SaveError::UnknownSection(name.to_string()))
    }

    pub fn section_mut(&mut self, name: &str) -> Result<&mut Section> {
        self.sections
            .get_mut(name)
            .ok_or_else(|| SaveError::UnknownSection(name.to_string()))
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn sections_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.values_mut()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.sections.values().any(Section::is_dirty)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            complete: self.sections.values().filter(|s| s.is_complete()).count(),
            total: self.sections.len(),
        }
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            report_id: self.report_id.clone(),
            sections: self
                .sections
                .values()
                .map(|section| SectionSnapshot {
                    name: section.name().to_string(),
                    complete: section.is_complete(),
                    remarks: section.remarks().to_string(),
                    rows: section.collection().records(),
                })
                .collect(),
        }
    }
}
