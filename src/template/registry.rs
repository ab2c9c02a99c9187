//! Field-code registry: the static table behind `[#code]` markers

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building a registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The same code appears twice
    #[error("duplicate field code: {code}")]
    DuplicateCode { code: String },

    /// Codes must carry the `#` prefix used in templates
    #[error("field code must start with '#': {code}")]
    MissingPrefix { code: String },
}

/// Column of the repeating line-item table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Index,
    Name,
    Unit,
    Result,
    Limit,
    Method,
    Judgment,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 7] = [
        ColumnRole::Index,
        ColumnRole::Name,
        ColumnRole::Unit,
        ColumnRole::Result,
        ColumnRole::Limit,
        ColumnRole::Method,
        ColumnRole::Judgment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Index => "index",
            ColumnRole::Name => "name",
            ColumnRole::Unit => "unit",
            ColumnRole::Result => "result",
            ColumnRole::Limit => "limit",
            ColumnRole::Method => "method",
            ColumnRole::Judgment => "judgment",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural control markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Last usable row (exclusive) of the repeating table on a page
    RegionEnd,
}

/// What a registry code stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Scalar report field
    BasicField,
    /// Column inside the repeating table
    DetectionColumn(ColumnRole),
    /// Structural marker
    ControlMark(ControlKind),
}

/// One row of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRegistryEntry {
    pub code: &'static str,
    pub kind: EntryKind,
    pub canonical_name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
}

impl FieldRegistryEntry {
    const fn basic(
        code: &'static str,
        canonical_name: &'static str,
        display_name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            code,
            kind: EntryKind::BasicField,
            canonical_name,
            display_name,
            description,
        }
    }

    const fn column(
        code: &'static str,
        role: ColumnRole,
        canonical_name: &'static str,
        display_name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            code,
            kind: EntryKind::DetectionColumn(role),
            canonical_name,
            display_name,
            description,
        }
    }

    /// Present exactly when the entry is a table column
    pub fn column_role(&self) -> Option<ColumnRole> {
        match self.kind {
            EntryKind::DetectionColumn(role) => Some(role),
            _ => None,
        }
    }

    pub fn control_kind(&self) -> Option<ControlKind> {
        match self.kind {
            EntryKind::ControlMark(kind) => Some(kind),
            _ => None,
        }
    }
}

const STANDARD_ENTRIES: &[FieldRegistryEntry] = &[
    // Report
    FieldRegistryEntry::basic("#report_no", "report_number", "报告编号", "报告编号"),
    FieldRegistryEntry::basic("#sample_no", "sample_number", "样品编号", "样品编号"),
    FieldRegistryEntry::basic("#sample_type", "sample_type_name", "样品类型", "样品类型"),
    FieldRegistryEntry::basic("#company", "company_name", "委托单位", "委托单位名称"),
    FieldRegistryEntry::basic("#customer_unit", "customer_unit", "被检单位", "被检单位"),
    FieldRegistryEntry::basic("#customer_plant", "customer_plant", "被检水厂", "被检水厂"),
    FieldRegistryEntry::basic("#unit_address", "unit_address", "单位地址", "单位地址"),
    // Sampling
    FieldRegistryEntry::basic("#sampling_date", "sampling_date", "采样日期", "采样日期"),
    FieldRegistryEntry::basic("#sampler", "sampler", "采样人", "采样人员"),
    FieldRegistryEntry::basic("#sampling_location", "sampling_location", "采样地点", "采样地点"),
    FieldRegistryEntry::basic("#sampling_basis", "sampling_basis", "采样依据", "采样依据标准"),
    FieldRegistryEntry::basic("#sample_source", "sample_source", "样品来源", "样品来源"),
    FieldRegistryEntry::basic("#sample_status", "sample_status", "样品状态", "样品状态描述"),
    FieldRegistryEntry::basic("#sample_received", "sample_received_date", "收样日期", "收样日期"),
    // Detection
    FieldRegistryEntry::basic("#detection_date", "detection_date", "检测日期", "检测日期"),
    FieldRegistryEntry::basic("#detection_person", "detection_person", "检测人", "检测人员"),
    FieldRegistryEntry::basic("#review_person", "review_person", "审核人", "审核人员"),
    FieldRegistryEntry::basic("#report_date", "report_date", "报告编制日期", "报告编制日期"),
    // Other
    FieldRegistryEntry::basic("#product_standard", "product_standard", "产品标准", "产品标准/检测依据"),
    FieldRegistryEntry::basic("#detection_items", "detection_items_description", "检测项目", "检测项目列表描述"),
    FieldRegistryEntry::basic("#test_conclusion", "test_conclusion", "检测结论", "检测结论"),
    FieldRegistryEntry::basic("#additional_info", "additional_info", "附加信息", "附加信息或说明"),
    FieldRegistryEntry::basic("#attachment_info", "attachment_info", "附件信息", "附件说明"),
    FieldRegistryEntry::basic("#remark", "remark", "备注", "备注信息"),
    // Line-item table
    FieldRegistryEntry::column("#dt_index", ColumnRole::Index, "index", "序号", "检测项目序号（自动编号）"),
    FieldRegistryEntry::column("#dt_name", ColumnRole::Name, "name", "检测项目", "检测项目名称"),
    FieldRegistryEntry::column("#dt_unit", ColumnRole::Unit, "unit", "单位", "检测项目单位"),
    FieldRegistryEntry::column("#dt_result", ColumnRole::Result, "result", "检测结果", "检测结果值"),
    FieldRegistryEntry::column("#dt_limit", ColumnRole::Limit, "limit", "标准限值", "标准限值"),
    FieldRegistryEntry::column("#dt_method", ColumnRole::Method, "method", "检测方法", "检测方法/依据"),
    FieldRegistryEntry::column("#dt_judgment", ColumnRole::Judgment, "judgment", "单项判定", "单项判定结果"),
    // Control
    FieldRegistryEntry {
        code: "#dt_end",
        kind: EntryKind::ControlMark(ControlKind::RegionEnd),
        canonical_name: "data_region_end",
        display_name: "数据区结束",
        description: "标记数据区域的结束位置（用于多页数据表）",
    },
];

static STANDARD: Lazy<FieldRegistry> = Lazy::new(|| {
    FieldRegistry::from_entries(STANDARD_ENTRIES.to_vec())
        .expect("Standard field codes should be unique")
});

/// Immutable lookup table from code to entry
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    entries: Vec<FieldRegistryEntry>,
    by_code: HashMap<&'static str, usize>,
}

impl FieldRegistry {
    /// The built-in registry, constructed once
    pub fn standard() -> &'static FieldRegistry {
        &STANDARD
    }

    /// Build a registry, rejecting duplicate or unprefixed codes
    pub fn from_entries(entries: Vec<FieldRegistryEntry>) -> Result<Self, RegistryError> {
        let mut by_code = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if !entry.code.starts_with('#') {
                return Err(RegistryError::MissingPrefix {
                    code: entry.code.to_string(),
                });
            }
            if by_code.insert(entry.code, idx).is_some() {
                return Err(RegistryError::DuplicateCode {
                    code: entry.code.to_string(),
                });
            }
        }
        Ok(Self { entries, by_code })
    }

    /// Look up a code, including its `#` prefix
    pub fn lookup(&self, code: &str) -> Option<&FieldRegistryEntry> {
        self.by_code.get(code).map(|&idx| &self.entries[idx])
    }

    /// All entries in declaration order
    pub fn entries(&self) -> &[FieldRegistryEntry] {
        &self.entries
    }

    /// Map a scalar field's display name (e.g. `被检单位`) to its canonical name
    pub fn canonical_for_display(&self, display_name: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::BasicField && e.display_name == display_name)
            .map(|e| e.canonical_name)
    }

    /// Human-readable reference of every code, grouped by family
    pub fn documentation(&self) -> String {
        let mut doc = Vec::new();
        let rule = "-".repeat(72);

        let mut section = |title: &str, pred: &dyn Fn(&EntryKind) -> bool| {
            doc.push(title.to_string());
            doc.push(rule.clone());
            for e in self.entries.iter().filter(|e| pred(&e.kind)) {
                doc.push(format!(
                    "[{:<20}] {} ({})",
                    e.code, e.display_name, e.description
                ));
            }
            doc.push(String::new());
        };

        section("REPORT FIELDS", &|k| matches!(k, EntryKind::BasicField));
        section("TABLE COLUMNS", &|k| matches!(k, EntryKind::DetectionColumn(_)));
        section("CONTROL MARKS", &|k| matches!(k, EntryKind::ControlMark(_)));

        doc.push("OTHER MARKERS".to_string());
        doc.push(rule.clone());
        doc.push("[*name]                 value copied from the latest approved report".to_string());
        doc.push("[name]                  required input field".to_string());
        doc.push("[name];(hint)           required input field with a hint".to_string());
        doc.push("[name]default;(hint)    optional input field with a default".to_string());
        doc.push("[name](hint)            hint only; trailing text becomes the default".to_string());

        doc.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_basic_field() {
        let entry = FieldRegistry::standard().lookup("#report_no").expect("known code");
        assert_eq!(entry.kind, EntryKind::BasicField);
        assert_eq!(entry.canonical_name, "report_number");
        assert_eq!(entry.column_role(), None);
    }

    #[test]
    fn test_lookup_detection_column() {
        let entry = FieldRegistry::standard().lookup("#dt_name").expect("known code");
        assert_eq!(entry.column_role(), Some(ColumnRole::Name));
    }

    #[test]
    fn test_lookup_region_end() {
        let entry = FieldRegistry::standard().lookup("#dt_end").expect("known code");
        assert_eq!(entry.control_kind(), Some(ControlKind::RegionEnd));
    }

    #[test]
    fn test_lookup_requires_prefix() {
        assert!(FieldRegistry::standard().lookup("report_no").is_none());
        assert!(FieldRegistry::standard().lookup("#nope").is_none());
    }

    #[test]
    fn test_every_role_has_a_code() {
        let registry = FieldRegistry::standard();
        for role in ColumnRole::ALL {
            assert!(
                registry.entries().iter().any(|e| e.column_role() == Some(role)),
                "no code for {}",
                role
            );
        }
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let entry = FieldRegistryEntry::basic("#a", "a", "A", "A");
        let result = FieldRegistry::from_entries(vec![entry, entry]);
        assert!(matches!(result, Err(RegistryError::DuplicateCode { .. })));
    }

    #[test]
    fn test_unprefixed_code_rejected() {
        let entry = FieldRegistryEntry::basic("a", "a", "A", "A");
        let result = FieldRegistry::from_entries(vec![entry]);
        assert!(matches!(result, Err(RegistryError::MissingPrefix { .. })));
    }

    #[test]
    fn test_canonical_for_display() {
        let registry = FieldRegistry::standard();
        assert_eq!(registry.canonical_for_display("被检单位"), Some("customer_unit"));
        assert_eq!(registry.canonical_for_display("序号"), None);
    }

    #[test]
    fn test_documentation_lists_codes() {
        let doc = FieldRegistry::standard().documentation();
        assert!(doc.contains("#report_no"));
        assert!(doc.contains("#dt_end"));
        assert!(doc.contains("[*name]"));
    }
}
