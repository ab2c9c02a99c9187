//! Parser for the marker grammar embedded in template cells

pub mod ast;
mod grammar;
pub mod lexer;
pub mod marker;

pub use ast::*;
pub use grammar::parse_cell;
pub use marker::{parse_markers, MarkerIssue, MarkerParse};
