//! Lexer for template cell text using logos
//!
//! Cell text is split into bracket delimiters and literal runs. Nothing is
//! skipped: every byte of the cell ends up in exactly one token so spans can
//! be used to slice the original text back out.

use std::fmt;

use logos::Logos;

use crate::parser::ast::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,

    #[regex(r"[^\[\]]+", |lex| lex.slice().to_string())]
    Text(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::BracketOpen => write!(f, "["),
            Token::BracketClose => write!(f, "]"),
            Token::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Lex cell text into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}
