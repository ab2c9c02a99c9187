//! Templates and their compilation into field maps
//!
//! A [`Template`] is an ordered list of pages, each a grid of cell text.
//! Compiling it against the [`FieldRegistry`] yields a [`FieldMap`]: one
//! [`FieldDescriptor`] per marker, plus the per-page table plans pagination
//! needs.
//!
//! # Example
//!
//! ```text
//! B3  = "[#report_no]"                 registry field
//! B4  = "[*被检单位]"                   reference field
//! B5  = "[检测日期]2025-01-15;(选择日期)"  plain field with default and hint
//! A8  = "[#dt_index]"                  table column
//! A30 = "[#dt_end]"                    end of the table region
//! ```

mod compiler;
mod field;
mod model;
mod plan;
mod registry;
mod resolver;

pub use compiler::{compile, Compilation};
pub use field::{CellFields, FieldDescriptor, FieldKind, FieldMap, FieldType, FormField};
pub use model::{AddressError, CellAddress, Page, Template, TemplateError};
pub use plan::{build_plans, Capacity, PagePlan};
pub use registry::{
    ColumnRole, ControlKind, EntryKind, FieldRegistry, FieldRegistryEntry, RegistryError,
};
pub use resolver::resolve;
