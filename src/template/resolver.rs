//! Field resolution: turns a descriptor plus report data into a cell value

use std::collections::HashMap;

use super::field::{FieldDescriptor, FieldKind};
use super::registry::FieldRegistry;
use crate::report::{CellValue, Report};
use crate::store::HistoryLookup;

/// Resolve one scalar field.
///
/// Reference fields read the latest approved report sharing the current
/// report's business key, or the latest approved report overall when the key
/// has no history. Basic fields read the current report and fall back to the
/// marker default. Neither path fails: a miss resolves to empty text.
///
/// Table columns and control marks are placed by pagination and resolve to
/// empty text here.
pub fn resolve(
    descriptor: &FieldDescriptor,
    report: &Report,
    history: &dyn HistoryLookup,
    registry: &FieldRegistry,
) -> CellValue {
    match descriptor.kind {
        FieldKind::Reference => resolve_reference(descriptor, report, history, registry),
        FieldKind::Basic => resolve_basic(descriptor, report, registry),
        FieldKind::DetectionColumn | FieldKind::ControlMark => CellValue::empty(),
    }
}

fn resolve_basic(descriptor: &FieldDescriptor, report: &Report, registry: &FieldRegistry) -> CellValue {
    let names = candidate_names(&descriptor.canonical_name, registry);
    if let Some(value) = lookup(&report.field_values, &names) {
        return value.clone();
    }
    match &descriptor.default_value {
        Some(default) => CellValue::text(default.clone()),
        None => CellValue::empty(),
    }
}

fn resolve_reference(
    descriptor: &FieldDescriptor,
    report: &Report,
    history: &dyn HistoryLookup,
    registry: &FieldRegistry,
) -> CellValue {
    let key = report.business_key.trim();
    let source = if key.is_empty() {
        None
    } else {
        history.latest_approved(Some(key), &report.id)
    }
    .or_else(|| history.latest_approved(None, &report.id));

    let Some(source) = source else {
        tracing::debug!(field = %descriptor.canonical_name, "no approved history for reference field");
        return CellValue::empty();
    };

    let names = candidate_names(&descriptor.canonical_name, registry);
    lookup(&source.field_values, &names)
        .or_else(|| lookup(&source.metadata, &names))
        .cloned()
        .unwrap_or_else(|| {
            tracing::debug!(
                field = %descriptor.canonical_name,
                source = %source.id,
                "reference field empty in approved report"
            );
            CellValue::empty()
        })
}

/// The literal name, then the canonical name it aliases in the registry
fn candidate_names<'a>(name: &'a str, registry: &FieldRegistry) -> Vec<&'a str> {
    let mut names = vec![name];
    if let Some(canonical) = registry.canonical_for_display(name) {
        if canonical != name {
            names.push(canonical);
        }
    }
    names
}

/// First non-empty value stored under any of `names`
fn lookup<'m>(values: &'m HashMap<String, CellValue>, names: &[&str]) -> Option<&'m CellValue> {
    names
        .iter()
        .filter_map(|name| values.get(*name))
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::template::field::FieldType;
    use crate::template::model::CellAddress;

    fn descriptor(kind: FieldKind, name: &str) -> FieldDescriptor {
        FieldDescriptor {
            page_id: "p".to_string(),
            cell: CellAddress::new(1, 1),
            kind,
            canonical_name: name.to_string(),
            display_name: name.to_string(),
            default_value: None,
            placeholder: None,
            required: false,
            editable: kind == FieldKind::Basic,
            column_role: None,
            control: None,
            field_type: FieldType::Text,
            registry_code: None,
            original_cell_text: format!("[{}]", name),
            source_span: 0..name.len() + 2,
        }
    }

    fn registry() -> &'static FieldRegistry {
        FieldRegistry::standard()
    }

    #[test]
    fn test_basic_from_report() {
        let report = Report::new("r").with_field("检测人", "张三");
        let value = resolve(
            &descriptor(FieldKind::Basic, "检测人"),
            &report,
            &MemoryStore::new(),
            registry(),
        );
        assert_eq!(value, CellValue::text("张三"));
    }

    #[test]
    fn test_basic_falls_back_to_default() {
        let mut desc = descriptor(FieldKind::Basic, "检测日期");
        desc.default_value = Some("2026-01-01".to_string());
        let report = Report::new("r").with_field("检测日期", "  ");
        let value = resolve(&desc, &report, &MemoryStore::new(), registry());
        assert_eq!(value, CellValue::text("2026-01-01"));
    }

    #[test]
    fn test_basic_missing_is_empty() {
        let value = resolve(
            &descriptor(FieldKind::Basic, "x"),
            &Report::new("r"),
            &MemoryStore::new(),
            registry(),
        );
        assert_eq!(value, CellValue::empty());
    }

    #[test]
    fn test_basic_keeps_value_type() {
        let report = Report::new("r").with_field("page_count", 3);
        let value = resolve(
            &descriptor(FieldKind::Basic, "page_count"),
            &report,
            &MemoryStore::new(),
            registry(),
        );
        assert_eq!(value, CellValue::Integer(3));
    }

    #[test]
    fn test_reference_without_history_is_empty() {
        let report = Report::new("r").with_business_key("S1");
        let value = resolve(
            &descriptor(FieldKind::Reference, "unit"),
            &report,
            &MemoryStore::new(),
            registry(),
        );
        assert_eq!(value, CellValue::empty());
    }

    #[test]
    fn test_reference_prefers_same_business_key() {
        let history = MemoryStore::new().with_reports([
            Report::new("a")
                .with_business_key("S1")
                .approved_at("2025-01-01")
                .with_field("unit", "mg/L"),
            Report::new("b")
                .with_business_key("S2")
                .approved_at("2025-06-01")
                .with_field("unit", "μg/L"),
        ]);
        let report = Report::new("r").with_business_key("S1");
        let value = resolve(&descriptor(FieldKind::Reference, "unit"), &report, &history, registry());
        assert_eq!(value, CellValue::text("mg/L"));
    }

    #[test]
    fn test_reference_falls_back_to_latest_overall() {
        let history = MemoryStore::new().with_reports([
            Report::new("a").approved_at("2025-01-01").with_field("unit", "old"),
            Report::new("b").approved_at("2025-06-01").with_field("unit", "new"),
        ]);
        let report = Report::new("r").with_business_key("S9");
        let value = resolve(&descriptor(FieldKind::Reference, "unit"), &report, &history, registry());
        assert_eq!(value, CellValue::text("new"));
    }

    #[test]
    fn test_reference_ignores_unapproved_and_self() {
        let history = MemoryStore::new().with_reports([
            Report::new("r")
                .with_business_key("S1")
                .approved_at("2025-09-01")
                .with_field("unit", "self"),
            Report::new("draft").with_business_key("S1").with_field("unit", "draft"),
        ]);
        let report = Report::new("r").with_business_key("S1");
        let value = resolve(&descriptor(FieldKind::Reference, "unit"), &report, &history, registry());
        assert_eq!(value, CellValue::empty());
    }

    #[test]
    fn test_reference_probes_metadata_when_empty() {
        let history = MemoryStore::new().with_report(
            Report::new("a")
                .with_business_key("S1")
                .approved_at("2025-01-01")
                .with_field("采样地点", "")
                .with_metadata("采样地点", "出厂水"),
        );
        let report = Report::new("r").with_business_key("S1");
        let value = resolve(
            &descriptor(FieldKind::Reference, "采样地点"),
            &report,
            &history,
            registry(),
        );
        assert_eq!(value, CellValue::text("出厂水"));
    }

    #[test]
    fn test_reference_resolves_display_name_alias() {
        let history = MemoryStore::new().with_report(
            Report::new("a")
                .with_business_key("S1")
                .approved_at("2025-01-01")
                .with_field("customer_unit", "市自来水公司"),
        );
        let report = Report::new("r").with_business_key("S1");
        let value = resolve(
            &descriptor(FieldKind::Reference, "被检单位"),
            &report,
            &history,
            registry(),
        );
        assert_eq!(value, CellValue::text("市自来水公司"));
    }

    #[test]
    fn test_columns_not_resolved() {
        let report = Report::new("r").with_field("name", "pH");
        let value = resolve(
            &descriptor(FieldKind::DetectionColumn, "name"),
            &report,
            &MemoryStore::new(),
            registry(),
        );
        assert_eq!(value, CellValue::empty());
    }
}
