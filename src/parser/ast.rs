//! Syntax types for markers embedded in cell text

use crate::error::ParseError;
use crate::template::FieldRegistryEntry;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Bracket positions of one marker as found by the grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSyntax {
    /// Span of the opening `[`
    pub open: Span,
    /// Span of the closing `]`
    pub close: Span,
}

/// What the grammar finds in one cell: well-formed markers plus an error
/// for each `[` that never closes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellSyntax {
    pub markers: Vec<MarkerSyntax>,
    pub errors: Vec<ParseError>,
}

/// A marker after interpretation, before it is bound to a cell
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    /// Source span replaced during composite substitution. Plain fields own
    /// their default and hint text up to the next `[` or the end of the
    /// cell; registry and reference markers end at their `]`.
    pub span: Span,
}

/// The three marker forms
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    /// `[#code]` with a code known to the registry
    Registry(FieldRegistryEntry),
    /// `[*name]`
    Reference { name: String },
    /// `[name]...`, including unknown `#` codes
    Plain(PlainField),
}

/// Everything a plain marker declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainField {
    pub name: String,
    pub default_value: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
}

impl PlainField {
    /// A required field with no default and no hint
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: None,
            placeholder: None,
            required: true,
        }
    }
}
