//! Collaborator interfaces for persistence, plus an in-memory store

use std::collections::HashMap;

use thiserror::Error;

use crate::report::Report;
use crate::template::{FieldMap, Template};

/// Errors raised by a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    #[error("report not found: {id}")]
    ReportNotFound { id: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Lookup of previously approved reports
pub trait HistoryLookup {
    /// The most recently approved report other than `excluding`,
    /// restricted to `business_key` when one is given
    fn latest_approved(&self, business_key: Option<&str>, excluding: &str) -> Option<Report>;
}

/// Everything the engine reads from or writes to persistence
pub trait Store: HistoryLookup {
    fn get_template(&self, id: &str) -> Result<Template, StoreError>;

    fn get_report(&self, id: &str) -> Result<Report, StoreError>;

    /// The stored field map for a template, if it has been compiled
    fn field_map(&self, template_id: &str) -> Option<FieldMap>;

    /// Replace the field map of `field_map.template_id` in one step; never merges
    fn persist_field_map(&mut self, field_map: FieldMap) -> Result<(), StoreError>;
}

/// Store backed by in-process maps
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    templates: HashMap<String, Template>,
    /// Insertion order breaks ties between equal approval stamps
    reports: Vec<Report>,
    field_maps: HashMap<String, FieldMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_template(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Add or replace a report
    pub fn insert_report(&mut self, report: Report) {
        match self.reports.iter_mut().find(|r| r.id == report.id) {
            Some(existing) => *existing = report,
            None => self.reports.push(report),
        }
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.insert_template(template);
        self
    }

    pub fn with_report(mut self, report: Report) -> Self {
        self.insert_report(report);
        self
    }

    pub fn with_reports(mut self, reports: impl IntoIterator<Item = Report>) -> Self {
        for report in reports {
            self.insert_report(report);
        }
        self
    }
}

impl HistoryLookup for MemoryStore {
    fn latest_approved(&self, business_key: Option<&str>, excluding: &str) -> Option<Report> {
        self.reports
            .iter()
            .filter(|r| r.status.is_approved() && r.id != excluding)
            .filter(|r| business_key.map_or(true, |key| r.business_key == key))
            .max_by(|a, b| a.approved_at.cmp(&b.approved_at))
            .cloned()
    }
}

impl Store for MemoryStore {
    fn get_template(&self, id: &str) -> Result<Template, StoreError> {
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TemplateNotFound { id: id.to_string() })
    }

    fn get_report(&self, id: &str) -> Result<Report, StoreError> {
        self.reports
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::ReportNotFound { id: id.to_string() })
    }

    fn field_map(&self, template_id: &str) -> Option<FieldMap> {
        self.field_maps.get(template_id).cloned()
    }

    fn persist_field_map(&mut self, field_map: FieldMap) -> Result<(), StoreError> {
        self.field_maps.insert(field_map.template_id.clone(), field_map);
        Ok(())
    }
}
