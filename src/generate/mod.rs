//! Generation: fills a compiled template with one report's data
//!
//! Scalar fields go through the resolver and the compositor; line items go
//! through pagination. The result is a [`FilledGrid`] with the same page and
//! cell shape as the template, plus the diagnostics collected on the way.

mod compositor;
pub mod convert;
mod format;
mod pagination;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use compositor::compose_cell;
pub use convert::{postprocess, Artifact, CommandConverter, ConvertError, Converter};
pub use format::{format_date, format_method, format_resolved};
pub use pagination::{place, PlacedCell, Placement};

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCategory};
use crate::report::{CellValue, Report};
use crate::store::HistoryLookup;
use crate::template::{resolve, CellAddress, ColumnRole, FieldMap, FieldRegistry, Template};

/// One output page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledPage {
    pub id: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub cells: BTreeMap<CellAddress, CellValue>,
}

impl FilledPage {
    pub fn get(&self, cell: &CellAddress) -> Option<&CellValue> {
        self.cells.get(cell)
    }

    /// Write a cell, growing the page if the cell lies outside it
    pub fn set(&mut self, cell: CellAddress, value: CellValue) {
        self.rows = self.rows.max(cell.row);
        self.cols = self.cols.max(cell.col);
        self.cells.insert(cell, value);
    }
}

/// The generated document before any conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledGrid {
    pub template_id: String,
    pub report_id: String,
    pub pages: Vec<FilledPage>,
}

impl FilledGrid {
    /// Start from the template's literal cell text
    fn from_template(template: &Template, report_id: &str) -> Self {
        let pages = template
            .pages
            .iter()
            .map(|page| FilledPage {
                id: page.id.clone(),
                rows: page.rows,
                cols: page.cols,
                cells: page
                    .cells
                    .iter()
                    .map(|(cell, text)| (*cell, CellValue::text(text.clone())))
                    .collect(),
            })
            .collect();
        Self {
            template_id: template.id.clone(),
            report_id: report_id.to_string(),
            pages,
        }
    }

    pub fn page(&self, id: &str) -> Option<&FilledPage> {
        self.pages.iter().find(|p| p.id == id)
    }

    fn page_mut(&mut self, id: &str) -> Option<&mut FilledPage> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    /// Value at `page!cell`, if written
    pub fn value(&self, page_id: &str, cell: &CellAddress) -> Option<&CellValue> {
        self.page(page_id).and_then(|p| p.get(cell))
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// The grid as the pre-conversion artifact
    pub fn to_artifact(&self) -> Result<Artifact, toml::ser::Error> {
        Ok(Artifact::new(self.to_toml()?, "toml"))
    }
}

/// Result of one generation
#[derive(Debug, Clone)]
pub struct Generation {
    pub grid: FilledGrid,
    pub placement: Placement,
    pub diagnostics: Vec<Diagnostic>,
}

/// Fill `template` with `report`.
///
/// Never fails: malformed markers were dropped at compile time and their
/// diagnostics are replayed from the field map. History misses resolve to
/// empty text and overflow is reported as a diagnostic.
pub fn generate(
    template: &Template,
    field_map: &FieldMap,
    report: &Report,
    history: &dyn HistoryLookup,
    registry: &FieldRegistry,
    config: &EngineConfig,
) -> Generation {
    let mut grid = FilledGrid::from_template(template, &report.id);
    let (plans, plan_diagnostics) = field_map.page_plans();
    let mut diagnostics = field_map.issues.clone();
    diagnostics.extend(plan_diagnostics);

    for group in field_map.cells() {
        let Some(page) = grid.page_mut(group.page_id) else {
            tracing::debug!(page = %group.page_id, "field map names a page the template lacks");
            continue;
        };

        // Table and control markers never leak into the output
        if group.fields.iter().any(|d| !d.is_resolvable()) {
            page.set(group.cell, CellValue::empty());
            continue;
        }

        let resolved: Vec<_> = group
            .fields
            .iter()
            .map(|desc| {
                let value = resolve(desc, report, history, registry);
                (desc.source_span.clone(), format_resolved(desc, value, config))
            })
            .collect();
        page.set(group.cell, compose_cell(group.original_text, &resolved));
    }

    let placement = place(&report.line_items, &plans);
    for placed in &placement.cells {
        let Some(page) = grid.page_mut(&placed.page_id) else {
            continue;
        };
        let value = match (&placed.value, placed.role) {
            (CellValue::Text(method), ColumnRole::Method) if config.split_methods => {
                CellValue::Text(format_method(method))
            }
            (value, _) => value.clone(),
        };
        page.set(placed.cell, value);
    }

    if placement.overflow > 0 {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCategory::Overflow,
                format!(
                    "{} of {} line items did not fit the template's table rows",
                    placement.overflow,
                    report.line_items.len()
                ),
            )
            .logged(),
        );
    }

    tracing::debug!(
        template = %template.id,
        report = %report.id,
        fields = field_map.len(),
        placed = placement.placed,
        overflow = placement.overflow,
        "generated report"
    );

    Generation {
        grid,
        placement,
        diagnostics,
    }
}
