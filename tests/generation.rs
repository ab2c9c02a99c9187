//! End-to-end tests: compile a template, then fill it from a report and history

use gridfill::{
    CellAddress, CellValue, DiagnosticCategory, Engine, EngineConfig, LineItem, MemoryStore,
    Report, Store, Template,
};
use pretty_assertions::assert_eq;

const TEMPLATE: &str = r#"
id = "water"

[[pages]]
id = "page1"
rows = 12
cols = 6

[pages.cells]
A1 = "检验检测报告"
B2 = "报告编号：[#report_no]"
B3 = "[#sampling_date]"
B4 = "[*被检单位]"
B5 = "[检测人]张三;(检测人员)"
C5 = "[A];(x)[B];(y)"
A7 = "[#dt_index]"
B7 = "[#dt_name]"
C7 = "[#dt_unit]"
D7 = "[#dt_result]"
E7 = "[#dt_limit]"
F7 = "[#dt_method]"
A10 = "[#dt_end]"

[[pages]]
id = "page2"
rows = 10
cols = 6

[pages.cells]
A1 = "续页"
A2 = "[#dt_index]"
B2 = "[#dt_name]"
F2 = "[#dt_method]"
A5 = "[#dt_end]"
"#;

fn addr(s: &str) -> CellAddress {
    s.parse().unwrap()
}

fn report(items: usize) -> Report {
    let mut report = Report::new("r-current")
        .with_business_key("S-001")
        .with_field("report_number", "WQ-2025-001")
        .with_field("sampling_date", "2025/1/15")
        .with_field("A", "1")
        .with_field("B", "2");
    for i in 1..=items {
        let mut item = LineItem::new(format!("item{}", i));
        item.unit = "mg/L".to_string();
        item.result = format!("{}.0", i);
        item.method = "GB/T 5750.4-2023 玻璃电极法".to_string();
        report = report.with_item(item);
    }
    report
}

fn history() -> Vec<Report> {
    vec![
        Report::new("r-old")
            .with_business_key("S-001")
            .approved_at("2024-11-02T09:00:00")
            .with_field("customer_unit", "市水务集团"),
        Report::new("r-other")
            .with_business_key("S-999")
            .approved_at("2025-01-01T09:00:00")
            .with_field("customer_unit", "别的单位"),
    ]
}

fn engine(report: Report, history: Vec<Report>) -> Engine<MemoryStore> {
    let template = Template::from_toml(TEMPLATE).expect("Should parse");
    let store = MemoryStore::new()
        .with_template(template)
        .with_reports(history)
        .with_report(report);
    Engine::new(store)
}

fn index_cells(grid: &gridfill::FilledGrid, page: &str, rows: &[u32]) -> Vec<Option<CellValue>> {
    rows.iter()
        .map(|row| grid.value(page, &CellAddress::new(*row, 1)).cloned())
        .collect()
}

#[test]
fn test_scalar_fields_filled() {
    let mut engine = engine(report(0), history());
    let output = engine.generate("water", "r-current").expect("Should generate");
    let grid = &output.grid;

    assert_eq!(grid.value("page1", &addr("A1")), Some(&CellValue::text("检验检测报告")));
    assert_eq!(
        grid.value("page1", &addr("B2")),
        Some(&CellValue::text("报告编号：WQ-2025-001"))
    );
    assert_eq!(grid.value("page1", &addr("B3")), Some(&CellValue::text("2025年01月15日")));
    assert_eq!(grid.value("page1", &addr("B4")), Some(&CellValue::text("市水务集团")));
    assert_eq!(grid.value("page1", &addr("B5")), Some(&CellValue::text("张三")));
    assert_eq!(grid.value("page1", &addr("C5")), Some(&CellValue::text("12")));
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_index_is_global_across_pages() {
    let mut engine = engine(report(5), history());
    let output = engine.generate("water", "r-current").expect("Should generate");

    assert_eq!(
        index_cells(&output.grid, "page1", &[7, 8, 9]),
        vec![
            Some(CellValue::Integer(1)),
            Some(CellValue::Integer(2)),
            Some(CellValue::Integer(3)),
        ]
    );
    assert_eq!(
        index_cells(&output.grid, "page2", &[2, 3, 4]),
        vec![Some(CellValue::Integer(4)), Some(CellValue::Integer(5)), None]
    );
    assert_eq!(output.grid.value("page2", &addr("B3")), Some(&CellValue::text("item5")));
    assert_eq!(
        output.grid.value("page2", &addr("F2")),
        Some(&CellValue::text("GB/T 5750.4-2023\n玻璃电极法"))
    );
    assert_eq!(output.placement.overflow, 0);
}

#[test]
fn test_overflow_places_what_fits() {
    let mut engine = engine(report(8), history());
    let output = engine.generate("water", "r-current").expect("Should generate");

    assert_eq!(output.placement.placed, 6);
    assert_eq!(output.placement.overflow, 2);
    assert_eq!(output.grid.value("page2", &addr("A4")), Some(&CellValue::Integer(6)));
    assert_eq!(output.grid.value("page2", &addr("A5")), Some(&CellValue::empty()));

    let overflow: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.category == DiagnosticCategory::Overflow)
        .collect();
    assert_eq!(overflow.len(), 1);
    insta::assert_snapshot!(
        overflow[0].to_string(),
        @"[overflow]: 2 of 8 line items did not fit the template's table rows"
    );
}

#[test]
fn test_reference_without_history_is_empty() {
    let mut engine = engine(report(0), Vec::new());
    let output = engine.generate("water", "r-current").expect("Should generate");
    assert_eq!(output.grid.value("page1", &addr("B4")), Some(&CellValue::empty()));
}

#[test]
fn test_region_end_markers_cleared() {
    let mut engine = engine(report(1), history());
    let output = engine.generate("water", "r-current").expect("Should generate");
    assert_eq!(output.grid.value("page1", &addr("A10")), Some(&CellValue::empty()));
    assert_eq!(output.grid.value("page2", &addr("A2")), Some(&CellValue::empty()));
    assert_eq!(output.grid.value("page2", &addr("A5")), Some(&CellValue::empty()));
    assert_eq!(output.grid.value("page2", &addr("A1")), Some(&CellValue::text("续页")));
}

#[test]
fn test_dates_left_alone_when_disabled() {
    let template = Template::from_toml(TEMPLATE).expect("Should parse");
    let store = MemoryStore::new().with_template(template).with_report(report(0));
    let mut engine = Engine::with_config(store, EngineConfig::new().with_format_dates(false));
    let output = engine.generate("water", "r-current").expect("Should generate");
    assert_eq!(output.grid.value("page1", &addr("B3")), Some(&CellValue::text("2025/1/15")));
}

#[test]
fn test_recompile_replaces_field_map() {
    let mut engine = engine(report(0), Vec::new());
    let first = engine.compile_template("water").expect("Should compile");
    assert_eq!(first.field_map.len(), 17);

    let revised = Template::from_toml(
        r#"
id = "water"

[[pages]]
id = "page1"
rows = 2
cols = 2

[pages.cells]
A1 = "[#sample_no]"
B2 = "[备注](可选)"
"#,
    )
    .expect("Should parse");
    engine.store_mut().insert_template(revised);
    engine.compile_template("water").expect("Should compile");
    engine.compile_template("water").expect("Should compile");

    let stored = engine.store().field_map("water").expect("field map stored");
    let names: Vec<_> = stored
        .descriptors()
        .iter()
        .map(|d| d.canonical_name.as_str())
        .collect();
    assert_eq!(names, vec!["sample_number", "备注"]);
}

#[test]
fn test_grid_serializes_to_toml() {
    let mut engine = engine(report(2), history());
    let output = engine.generate("water", "r-current").expect("Should generate");
    let text = output.grid.to_toml().expect("Should serialize");
    assert!(text.contains("template_id = \"water\""));
    assert!(text.contains("WQ-2025-001"));
}
