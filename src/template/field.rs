//! Field descriptors and the field map produced by compilation

use serde::{Deserialize, Serialize};

use super::model::CellAddress;
use super::plan::{build_plans, PagePlan};
use super::registry::{ColumnRole, ControlKind};
use crate::diagnostics::Diagnostic;
use crate::parser::ast::Span;

/// How a field gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// From the current report, falling back to the marker default
    Basic,
    /// From the latest approved report
    Reference,
    /// Column of the repeating line-item table
    DetectionColumn,
    /// Structural marker
    ControlMark,
}

/// Input type of a field, inferred from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Date,
    DateTime,
    Number,
    TextArea,
}

impl FieldType {
    /// Guess the type from a field name (either language)
    pub fn infer(name: &str) -> Self {
        let lower = name.to_lowercase();
        if name.contains("日期") || lower.contains("date") {
            FieldType::Date
        } else if name.contains("时间") || lower.contains("time") {
            FieldType::DateTime
        } else if name.contains("数量") || name.contains("编号") {
            FieldType::Number
        } else if name.contains("备注") || name.contains("说明") {
            FieldType::TextArea
        } else {
            FieldType::Text
        }
    }
}

/// One recognized marker occurrence in a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub page_id: String,
    pub cell: CellAddress,
    pub kind: FieldKind,
    pub canonical_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
    pub editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_role: Option<ColumnRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlKind>,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_code: Option<String>,
    pub original_cell_text: String,
    /// Bytes of `original_cell_text` this marker occupies
    pub source_span: Span,
}

impl FieldDescriptor {
    /// Whether the resolver fills this field
    pub fn is_resolvable(&self) -> bool {
        matches!(self.kind, FieldKind::Basic | FieldKind::Reference)
    }

    pub fn is_reference(&self) -> bool {
        self.kind == FieldKind::Reference
    }
}

/// What an entry form needs to know about an editable field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    pub display_name: String,
    pub field_type: FieldType,
    pub default_value: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    /// e.g. `page1!B3`
    pub location: String,
}

/// All descriptors from compiling one template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    pub template_id: String,
    #[serde(default)]
    pub descriptors: Vec<FieldDescriptor>,
    /// Problems found while scanning the cells, kept so every generation
    /// from this map reports them again
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Diagnostic>,
}

/// The descriptors that share one cell, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct CellFields<'a> {
    pub page_id: &'a str,
    pub cell: CellAddress,
    pub original_text: &'a str,
    pub fields: Vec<&'a FieldDescriptor>,
}

impl FieldMap {
    pub fn new(template_id: impl Into<String>, descriptors: Vec<FieldDescriptor>) -> Self {
        Self {
            template_id: template_id.into(),
            descriptors,
            issues: Vec::new(),
        }
    }

    pub fn with_issues(mut self, issues: Vec<Diagnostic>) -> Self {
        self.issues = issues;
        self
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn for_page<'a>(&'a self, page_id: &'a str) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
        self.descriptors.iter().filter(move |d| d.page_id == page_id)
    }

    /// Group descriptors by owning cell; relies on compile order
    pub fn cells(&self) -> Vec<CellFields<'_>> {
        let mut groups: Vec<CellFields<'_>> = Vec::new();
        for desc in &self.descriptors {
            match groups.last_mut() {
                Some(group) if group.page_id == desc.page_id && group.cell == desc.cell => {
                    group.fields.push(desc);
                }
                _ => groups.push(CellFields {
                    page_id: &desc.page_id,
                    cell: desc.cell,
                    original_text: &desc.original_cell_text,
                    fields: vec![desc],
                }),
            }
        }
        for group in &mut groups {
            group.fields.sort_by_key(|d| d.source_span.start);
        }
        groups
    }

    /// Editable fields, for building an entry form
    pub fn form_fields(&self) -> Vec<FormField> {
        self.descriptors
            .iter()
            .filter(|d| d.editable)
            .map(|d| FormField {
                name: d.canonical_name.clone(),
                display_name: d.display_name.clone(),
                field_type: d.field_type,
                default_value: d.default_value.clone(),
                placeholder: d.placeholder.clone(),
                required: d.required,
                location: format!("{}!{}", d.page_id, d.cell),
            })
            .collect()
    }

    /// Table plans derived from the column and region-end descriptors
    pub fn page_plans(&self) -> (Vec<PagePlan>, Vec<Diagnostic>) {
        build_plans(self)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
