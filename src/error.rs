//! Error types for marker parsing and generation

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::ast::Span;
use crate::parser::lexer::Token;

/// A syntax error inside a single cell's text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    /// A `[` with no matching `]` before the next `[` or the end of the cell
    pub fn unclosed(span: Span) -> Self {
        ParseError::Syntax {
            span,
            message: "Unclosed marker".to_string(),
            expected: vec!["']'".to_string()],
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with the cell text as context using ariadne
    pub fn format(&self, source: &str, location: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, location, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((location, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((location, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8(buf).unwrap_or_else(|_| self.to_string())
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::{RichPattern, RichReason};

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("Unexpected {}", format_token(tok)),
                None => "Unexpected end of cell".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
            #[allow(unreachable_patterns)]
            _ => "Malformed marker".to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_token(tok)),
                RichPattern::EndOfInput => Some("end of cell".to_string()),
                _ => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::Text(s) => format!("text \"{}\"", s),
    }
}
