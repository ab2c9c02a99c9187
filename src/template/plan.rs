//! Per-page placement plans for the repeating line-item table

use std::collections::BTreeMap;
use std::fmt;

use super::field::{FieldKind, FieldMap};
use super::model::CellAddress;
use super::registry::{ColumnRole, ControlKind};
use crate::diagnostics::{Diagnostic, DiagnosticCategory};

/// How many table rows a page can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Bounded(usize),
    /// No region-end marker on the page
    Unbounded,
}

impl Capacity {
    /// Items this page takes out of `remaining`
    pub fn take(&self, remaining: usize) -> usize {
        match self {
            Capacity::Bounded(n) => (*n).min(remaining),
            Capacity::Unbounded => remaining,
        }
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Bounded(n) => write!(f, "{}", n),
            Capacity::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Where one page's share of line items goes
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub page_id: String,
    /// Row of the column markers; the first item lands here
    pub start_row: u32,
    pub capacity: Capacity,
    pub columns: BTreeMap<ColumnRole, CellAddress>,
}

/// Build one plan per page that declares table columns, in page order
pub fn build_plans(field_map: &FieldMap) -> (Vec<PagePlan>, Vec<Diagnostic>) {
    let mut plans: Vec<PagePlan> = Vec::new();
    let mut region_ends: Vec<(String, CellAddress)> = Vec::new();
    let mut diagnostics = Vec::new();

    for desc in field_map.descriptors() {
        match desc.kind {
            FieldKind::DetectionColumn => {
                let Some(role) = desc.column_role else {
                    continue;
                };
                let idx = match plans.iter().position(|p| p.page_id == desc.page_id) {
                    Some(idx) => idx,
                    None => {
                        plans.push(PagePlan {
                            page_id: desc.page_id.clone(),
                            start_row: desc.cell.row,
                            capacity: Capacity::Unbounded,
                            columns: BTreeMap::new(),
                        });
                        plans.len() - 1
                    }
                };
                plans[idx].columns.entry(role).or_insert(desc.cell);
            }
            FieldKind::ControlMark if desc.control == Some(ControlKind::RegionEnd) => {
                if !region_ends.iter().any(|(page, _)| page == &desc.page_id) {
                    region_ends.push((desc.page_id.clone(), desc.cell));
                }
            }
            _ => {}
        }
    }

    for (page_id, end) in region_ends {
        let Some(plan) = plans.iter_mut().find(|p| p.page_id == page_id) else {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCategory::RegionEnd,
                    "region-end marker on a page without table columns is ignored",
                )
                .at(page_id, end)
                .logged(),
            );
            continue;
        };

        if end.row > plan.start_row {
            plan.capacity = Capacity::Bounded((end.row - plan.start_row) as usize);
        } else {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCategory::RegionEnd,
                    format!(
                        "region-end marker at row {} is not below the table header at row {}; page holds no items",
                        end.row, plan.start_row
                    ),
                )
                .at(page_id, end)
                .logged(),
            );
            plan.capacity = Capacity::Bounded(0);
        }
    }

    for plan in &plans {
        tracing::debug!(
            page = %plan.page_id,
            start_row = plan.start_row,
            capacity = %plan.capacity,
            "table plan"
        );
    }

    (plans, diagnostics)
}
