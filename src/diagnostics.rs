//! Non-fatal findings collected during compilation and generation.
//!
//! Nothing in here stops a run. Each diagnostic is also emitted as a
//! `tracing` warning at the point it is recorded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::template::CellAddress;

/// A non-fatal condition worth surfacing to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<CellAddress>,
}

/// Category of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCategory {
    /// A `[` that never closes
    MalformedCell,
    /// A marker with no name
    EmptyMarker,
    /// `#code` missing from the registry
    UnknownCode,
    /// Template compiled to an empty field map
    NoMarkers,
    /// Region-end marker that cannot bound a table
    RegionEnd,
    /// Line items left over after the last page
    Overflow,
    /// Post-processing conversion failed or timed out
    Conversion,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            DiagnosticCategory::MalformedCell => "malformed-cell",
            DiagnosticCategory::EmptyMarker => "empty-marker",
            DiagnosticCategory::UnknownCode => "unknown-code",
            DiagnosticCategory::NoMarkers => "no-markers",
            DiagnosticCategory::RegionEnd => "region-end",
            DiagnosticCategory::Overflow => "overflow",
            DiagnosticCategory::Conversion => "conversion",
        };
        f.write_str(tag)
    }
}

impl Diagnostic {
    pub fn new(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            page_id: None,
            cell: None,
        }
    }

    /// Attach the cell the diagnostic is about
    pub fn at(mut self, page_id: impl Into<String>, cell: CellAddress) -> Self {
        self.page_id = Some(page_id.into());
        self.cell = Some(cell);
        self
    }

    /// Emit the diagnostic as a tracing warning and hand it back
    pub fn logged(self) -> Self {
        tracing::warn!(
            category = %self.category,
            page = self.page_id.as_deref().unwrap_or("-"),
            cell = %self.cell.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
            "{}",
            self.message
        );
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.category)?;
        match (&self.page_id, &self.cell) {
            (Some(page), Some(cell)) => write!(f, " {}!{}", page, cell)?,
            (Some(page), None) => write!(f, " {}", page)?,
            _ => {}
        }
        write!(f, ": {}", self.message)
    }
}
