//! Report data: the generation context and historical records

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading report files
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to read report file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse report TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// A value written into an output cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Empty or whitespace-only text
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Integer(n)
    }
}

/// Review state of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl ReportStatus {
    /// Only approved reports feed reference fields
    pub fn is_approved(&self) -> bool {
        matches!(self, ReportStatus::Approved)
    }
}

/// One row of the repeating table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub limit: String,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment: Option<String>,
}

impl LineItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A report, either the one being generated or a historical one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    /// Groups reports of the same subject, e.g. the sample number
    #[serde(default)]
    pub business_key: String,
    #[serde(default)]
    pub status: ReportStatus,
    /// Sortable approval timestamp; later sorts last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
    #[serde(default)]
    pub field_values: HashMap<String, CellValue>,
    /// Loosely structured extra data kept alongside the fields
    #[serde(default)]
    pub metadata: HashMap<String, CellValue>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Report {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_business_key(mut self, key: impl Into<String>) -> Self {
        self.business_key = key.into();
        self
    }

    pub fn with_status(mut self, status: ReportStatus) -> Self {
        self.status = status;
        self
    }

    pub fn approved_at(mut self, stamp: impl Into<String>) -> Self {
        self.status = ReportStatus::Approved;
        self.approved_at = Some(stamp.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.field_values.insert(name.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }

    /// Load a report from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ReportError> {
        Ok(toml::from_str(content)?)
    }
}

/// A file of historical reports
#[derive(Debug, Clone, Default, Deserialize)]
pub struct History {
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl History {
    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
