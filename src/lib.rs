//! gridfill - fills grid templates with report data
//!
//! Templates are ordered pages of cells whose text carries bracketed
//! markers such as `[#report_no]`, `[*被检单位]` or `[检测日期]2025-01-15;(选择日期)`.
//! This library compiles those markers into a field map, resolves each
//! field against a report and its approved history, and paginates the
//! report's line items across the pages' table regions.
//!
//! # Example
//!
//! ```rust
//! use gridfill::{Engine, MemoryStore, Page, Report, Template};
//!
//! let template = Template::new("t").with_page(
//!     Page::new("p1").with_cell("B2".parse().unwrap(), "[#report_no]"),
//! );
//! let report = Report::new("r1").with_field("report_number", "WQ-001");
//!
//! let store = MemoryStore::new().with_template(template).with_report(report);
//! let mut engine = Engine::new(store);
//!
//! let output = engine.generate("t", "r1").unwrap();
//! let value = output.grid.value("p1", &"B2".parse().unwrap()).unwrap();
//! assert_eq!(value.to_string(), "WQ-001");
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod parser;
pub mod report;
pub mod store;
pub mod template;

use std::time::Duration;

use thiserror::Error;

pub use config::{ConfigError, ConversionConfig, EngineConfig};
pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use error::ParseError;
pub use generate::{Artifact, CommandConverter, Converter, FilledGrid, Placement};
pub use report::{CellValue, History, LineItem, Report, ReportError, ReportStatus};
pub use store::{HistoryLookup, MemoryStore, Store, StoreError};
pub use template::{
    compile, CellAddress, Compilation, FieldDescriptor, FieldMap, FieldRegistry, Page, Template,
    TemplateError,
};

/// Timeout for an injected converter when the config names none
const DEFAULT_CONVERSION_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors that stop a compile or generate request
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing template or report, or a failing store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The filled grid could not be serialized for conversion
    #[error("failed to serialize filled grid: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Everything one generation request produces
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub grid: FilledGrid,
    /// Converter output, or the serialized grid when conversion failed;
    /// `None` when no converter is configured
    pub artifact: Option<Artifact>,
    pub placement: Placement,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile and generate against a store
pub struct Engine<S: Store> {
    store: S,
    registry: FieldRegistry,
    config: EngineConfig,
    converter: Option<Box<dyn Converter>>,
}

impl<S: Store> Engine<S> {
    /// Create an engine with the default configuration and standard codes
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create an engine; a `[conversion]` section installs a command converter
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        let converter = config
            .conversion
            .clone()
            .map(|c| Box::new(CommandConverter::new(c)) as Box<dyn Converter>);
        Self {
            store,
            registry: FieldRegistry::standard().clone(),
            config,
            converter,
        }
    }

    /// Use a custom field-code registry
    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the post-processing converter
    pub fn with_converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converter = Some(Box::new(converter));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile a stored template and replace its stored field map
    pub fn compile_template(&mut self, template_id: &str) -> Result<Compilation, EngineError> {
        let template = self.store.get_template(template_id)?;
        let compilation = compile(&template, &self.registry);
        self.store.persist_field_map(compilation.field_map.clone())?;
        tracing::info!(
            template = %template_id,
            fields = compilation.field_map.len(),
            diagnostics = compilation.diagnostics.len(),
            "field map replaced"
        );
        Ok(compilation)
    }

    /// Fill a stored template with a stored report.
    ///
    /// The template is compiled first when no field map is stored for it.
    /// Diagnostics recorded at compile time are reported with every call.
    pub fn generate(&mut self, template_id: &str, report_id: &str) -> Result<GeneratedReport, EngineError> {
        let template = self.store.get_template(template_id)?;
        let report = self.store.get_report(report_id)?;

        let field_map = match self.store.field_map(template_id) {
            Some(field_map) => field_map,
            None => self.compile_template(template_id)?.field_map,
        };

        let generation = generate::generate(
            &template,
            &field_map,
            &report,
            &self.store,
            &self.registry,
            &self.config,
        );
        let mut diagnostics = generation.diagnostics;

        let artifact = match &self.converter {
            Some(converter) => {
                let timeout = self
                    .config
                    .conversion
                    .as_ref()
                    .map(ConversionConfig::timeout)
                    .unwrap_or(DEFAULT_CONVERSION_TIMEOUT);
                let (artifact, failure) =
                    generate::postprocess(converter.as_ref(), generation.grid.to_artifact()?, timeout);
                diagnostics.extend(failure);
                Some(artifact)
            }
            None => None,
        };

        Ok(GeneratedReport {
            grid: generation.grid,
            artifact,
            placement: generation.placement,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::ConvertError;

    fn addr(s: &str) -> CellAddress {
        s.parse().unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_template(Template::new("t").with_page(
                Page::new("p").with_cell(addr("A1"), "[#report_no]"),
            ))
            .with_report(Report::new("r").with_field("report_number", "N-1"))
    }

    #[test]
    fn test_generate_compiles_on_demand() {
        let mut engine = Engine::new(store());
        assert!(engine.store().field_map("t").is_none());

        let output = engine.generate("t", "r").unwrap();
        assert_eq!(output.grid.value("p", &addr("A1")), Some(&CellValue::text("N-1")));
        assert!(output.artifact.is_none());
        assert_eq!(engine.store().field_map("t").map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let mut engine = Engine::new(store());
        let err = engine.generate("nope", "r").unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::TemplateNotFound { .. })));
    }

    #[test]
    fn test_missing_report_is_fatal() {
        let mut engine = Engine::new(store());
        let err = engine.generate("t", "nope").unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::ReportNotFound { .. })));
    }

    #[test]
    fn test_compile_diagnostics_reported_by_later_generate() {
        let store = MemoryStore::new()
            .with_template(Template::new("t").with_page(
                Page::new("p").with_cell(addr("A1"), "[#report_no] see [note"),
            ))
            .with_report(Report::new("r").with_field("report_number", "WQ-1"));
        let mut engine = Engine::new(store);

        let compiled = engine.compile_template("t").unwrap();
        assert_eq!(compiled.diagnostics.len(), 1);

        for _ in 0..2 {
            let output = engine.generate("t", "r").unwrap();
            assert_eq!(output.diagnostics, compiled.diagnostics);
            assert_eq!(output.grid.value("p", &addr("A1")), Some(&CellValue::text("WQ-1 see [note")));
        }
    }

    #[test]
    fn test_on_demand_compile_reports_each_diagnostic_once() {
        let store = MemoryStore::new()
            .with_template(Template::new("t").with_page(
                Page::new("p")
                    .with_cell(addr("A1"), "[#nope]")
                    .with_cell(addr("A3"), "[#dt_name]")
                    .with_cell(addr("A2"), "[#dt_end]"),
            ))
            .with_report(Report::new("r"));
        let mut engine = Engine::new(store);
        let output = engine.generate("t", "r").unwrap();
        let categories: Vec<_> = output.diagnostics.iter().map(|d| d.category).collect();
        assert_eq!(
            categories,
            vec![DiagnosticCategory::UnknownCode, DiagnosticCategory::RegionEnd]
        );
    }

    struct AlwaysFails;

    impl Converter for AlwaysFails {
        fn convert(&self, _artifact: &Artifact, timeout: Duration) -> Result<Artifact, ConvertError> {
            Err(ConvertError::Timeout {
                program: "slow".to_string(),
                timeout,
            })
        }
    }

    #[test]
    fn test_conversion_failure_returns_grid_artifact() {
        let mut engine = Engine::new(store()).with_converter(AlwaysFails);
        let output = engine.generate("t", "r").unwrap();

        let artifact = output.artifact.expect("artifact returned");
        assert_eq!(artifact.extension, "toml");
        assert!(String::from_utf8_lossy(&artifact.bytes).contains("N-1"));
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.category == DiagnosticCategory::Conversion));
    }
}
