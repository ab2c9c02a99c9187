//! Interpretation of located markers into typed forms
//!
//! Precedence for the bracket content:
//! 1. `#code` known to the registry
//! 2. `*name` reference
//! 3. anything else is a plain field; an unknown `#code` lands here too

use crate::error::ParseError;
use crate::parser::ast::{Marker, MarkerKind, PlainField, Span};
use crate::parser::grammar::parse_cell;
use crate::template::FieldRegistry;

/// Non-fatal problems found while interpreting a cell
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerIssue {
    /// The cell could not be delimited into markers at all
    Syntax(ParseError),
    /// `[]` or `[*]` with nothing to name the field
    EmptyMarker { span: Span },
    /// `#code` not in the registry; kept as a plain field
    UnknownCode { code: String, span: Span },
}

/// Markers and issues for one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerParse {
    pub markers: Vec<Marker>,
    pub issues: Vec<MarkerIssue>,
}

/// Parse every marker in a cell's text.
///
/// An unclosed `[` is reported as a syntax issue and skipped; the markers
/// around it are still interpreted.
pub fn parse_markers(text: &str, registry: &FieldRegistry) -> MarkerParse {
    let syntax = parse_cell(text);
    let mut parse = MarkerParse {
        markers: Vec::new(),
        issues: syntax.errors.into_iter().map(MarkerIssue::Syntax).collect(),
    };

    for found in &syntax.markers {
        let end = text[found.close.end..]
            .find('[')
            .map(|at| found.close.end + at)
            .unwrap_or(text.len());
        let content = text[found.open.end..found.close.start].trim();
        let remainder = &text[found.close.end..end];

        let (kind, unknown) = match interpret(content, remainder, registry) {
            Interpreted::Kind(kind) => (kind, false),
            Interpreted::Unknown(kind) => (kind, true),
            Interpreted::Empty => {
                parse.issues.push(MarkerIssue::EmptyMarker {
                    span: found.open.start..found.close.end,
                });
                continue;
            }
        };

        // Only plain fields own the text after their `]`
        let span = match kind {
            MarkerKind::Plain(_) => found.open.start..end,
            _ => found.open.start..found.close.end,
        };
        if unknown {
            parse.issues.push(MarkerIssue::UnknownCode {
                code: content.to_string(),
                span: span.clone(),
            });
        }

        parse.markers.push(Marker { kind, span });
    }

    parse
}

enum Interpreted {
    Kind(MarkerKind),
    Unknown(MarkerKind),
    Empty,
}

fn interpret(content: &str, remainder: &str, registry: &FieldRegistry) -> Interpreted {
    if content.is_empty() {
        return Interpreted::Empty;
    }

    if content.starts_with('#') {
        return match registry.lookup(content) {
            Some(entry) => Interpreted::Kind(MarkerKind::Registry(*entry)),
            None => Interpreted::Unknown(MarkerKind::Plain(parse_plain(content, remainder))),
        };
    }

    if let Some(name) = content.strip_prefix('*') {
        let name = name.trim();
        if name.is_empty() {
            return Interpreted::Empty;
        }
        return Interpreted::Kind(MarkerKind::Reference {
            name: name.to_string(),
        });
    }

    Interpreted::Kind(MarkerKind::Plain(parse_plain(content, remainder)))
}

/// Apply the default/placeholder rules to the text after `]`
pub fn parse_plain(name: &str, remainder: &str) -> PlainField {
    let mut field = PlainField::required(name);

    if let Some((before, after)) = remainder.split_once(';') {
        let default = before.trim();
        if !default.is_empty() {
            field.default_value = Some(default.to_string());
            field.required = false;
        }
        field.placeholder = first_group(after);
    } else {
        field.placeholder = first_group(remainder);
        let leftover = strip_groups(remainder);
        let leftover = leftover.trim();
        if !leftover.is_empty() {
            field.default_value = Some(leftover.to_string());
            field.required = false;
        }
    }

    field
}

/// Inner text of the first `(...)` group; an unclosed group runs to the end
fn first_group(text: &str) -> Option<String> {
    let start = text.find('(')? + 1;
    let inner = match text[start..].find(')') {
        Some(len) => &text[start..start + len],
        None => &text[start..],
    };
    let inner = inner.trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

/// Text with every `(...)` group removed
fn strip_groups(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('(') {
        out.push_str(&rest[..open]);
        match rest[open..].find(')') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}
