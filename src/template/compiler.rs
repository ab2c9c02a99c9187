//! Template compiler: scans every cell and emits the field map

use super::field::{FieldDescriptor, FieldKind, FieldMap, FieldType};
use super::model::{CellAddress, Template};
use super::plan::{build_plans, PagePlan};
use super::registry::{EntryKind, FieldRegistry};
use crate::diagnostics::{Diagnostic, DiagnosticCategory};
use crate::parser::ast::{Marker, MarkerKind};
use crate::parser::{parse_markers, MarkerIssue};

/// Output of one compilation
#[derive(Debug, Clone)]
pub struct Compilation {
    pub field_map: FieldMap,
    pub plans: Vec<PagePlan>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile a template into a fresh field map.
///
/// Pages are visited in order and cells row-major within a page. Only cells
/// containing both `[` and `]` are parsed. A malformed marker is skipped with
/// a diagnostic; compilation itself never fails.
pub fn compile(template: &Template, registry: &FieldRegistry) -> Compilation {
    let mut descriptors = Vec::new();
    let mut diagnostics = Vec::new();

    for page in &template.pages {
        for (cell, text) in &page.cells {
            if !(text.contains('[') && text.contains(']')) {
                continue;
            }

            let parse = parse_markers(text, registry);
            for issue in parse.issues {
                if let MarkerIssue::Syntax(err) = &issue {
                    tracing::debug!("\n{}", err.format(text, &format!("{}!{}", page.id, cell)));
                }
                diagnostics.push(issue_diagnostic(issue, text).at(page.id.clone(), *cell).logged());
            }
            for marker in parse.markers {
                descriptors.push(describe(marker, &page.id, *cell, text));
            }
        }
    }

    if descriptors.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCategory::NoMarkers,
                format!("template '{}' contains no recognized markers", template.id),
            )
            .logged(),
        );
    }
    let field_map =
        FieldMap::new(template.id.clone(), descriptors).with_issues(diagnostics.clone());

    let (plans, plan_diagnostics) = build_plans(&field_map);
    diagnostics.extend(plan_diagnostics);

    tracing::debug!(
        template = %template.id,
        fields = field_map.len(),
        tables = plans.len(),
        "compiled template"
    );

    Compilation {
        field_map,
        plans,
        diagnostics,
    }
}

fn issue_diagnostic(issue: MarkerIssue, text: &str) -> Diagnostic {
    match issue {
        MarkerIssue::Syntax(err) => Diagnostic::new(
            DiagnosticCategory::MalformedCell,
            format!("marker {:?} skipped: {}", &text[err.span().clone()], err),
        ),
        MarkerIssue::EmptyMarker { span } => Diagnostic::new(
            DiagnosticCategory::EmptyMarker,
            format!("marker {:?} has no field name", &text[span]),
        ),
        MarkerIssue::UnknownCode { code, .. } => Diagnostic::new(
            DiagnosticCategory::UnknownCode,
            format!("unknown field code '{}' treated as a plain field", code),
        ),
    }
}

/// Bind a marker to its cell
fn describe(marker: Marker, page_id: &str, cell: CellAddress, text: &str) -> FieldDescriptor {
    let mut desc = FieldDescriptor {
        page_id: page_id.to_string(),
        cell,
        kind: FieldKind::Basic,
        canonical_name: String::new(),
        display_name: String::new(),
        default_value: None,
        placeholder: None,
        required: false,
        editable: false,
        column_role: None,
        control: None,
        field_type: FieldType::Text,
        registry_code: None,
        original_cell_text: text.to_string(),
        source_span: marker.span,
    };

    match marker.kind {
        MarkerKind::Registry(entry) => {
            desc.kind = match entry.kind {
                EntryKind::BasicField => FieldKind::Basic,
                EntryKind::DetectionColumn(_) => FieldKind::DetectionColumn,
                EntryKind::ControlMark(_) => FieldKind::ControlMark,
            };
            desc.canonical_name = entry.canonical_name.to_string();
            desc.display_name = entry.display_name.to_string();
            desc.column_role = entry.column_role();
            desc.control = entry.control_kind();
            desc.registry_code = Some(entry.code.to_string());
        }
        MarkerKind::Reference { name } => {
            desc.kind = FieldKind::Reference;
            desc.placeholder = Some(format!("copied from the latest approved report: {}", name));
            desc.display_name = name.clone();
            desc.canonical_name = name;
        }
        MarkerKind::Plain(field) => {
            desc.display_name = field.name.clone();
            desc.canonical_name = field.name;
            desc.default_value = field.default_value;
            desc.placeholder = field.placeholder;
            desc.required = field.required;
            desc.editable = true;
        }
    }

    desc.field_type = match FieldType::infer(&desc.canonical_name) {
        FieldType::Text => FieldType::infer(&desc.display_name),
        inferred => inferred,
    };
    desc
}
