//! Cell grammar using chumsky
//!
//! ```text
//! cell    := loose* segment*
//! segment := marker | broken
//! marker  := '[' text? ']' loose*
//! broken  := '[' text?
//! loose   := text | ']'
//! ```
//!
//! A `[` that is not closed before the next `[` or the end of the cell is a
//! broken segment. It is reported on its own and scanning carries on, so the
//! well-formed markers around it survive.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::parser::ast::{CellSyntax, MarkerSyntax, Span};
use crate::parser::lexer::{lex, Token};

#[derive(Debug, Clone)]
enum Segment {
    Marker(MarkerSyntax),
    Broken(Span),
}

/// Locate every marker in a cell's text
pub fn parse_cell(input: &str) -> CellSyntax {
    let len = input.len();

    let token_iter = lex(input).map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    match cell_parser().parse(token_stream).into_result() {
        Ok(segments) => {
            let mut cell = CellSyntax::default();
            for segment in segments {
                match segment {
                    Segment::Marker(marker) => cell.markers.push(marker),
                    Segment::Broken(span) => cell.errors.push(ParseError::unclosed(span)),
                }
            }
            cell
        }
        Err(errs) => CellSyntax {
            markers: Vec::new(),
            errors: errs.into_iter().map(|e| e.into()).collect(),
        },
    }
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn cell_parser<'a, I>() -> impl Parser<'a, I, Vec<Segment>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let text = select! { Token::Text(_) => () };

    // Literal text between markers; a stray ']' is just text here
    let loose = choice((text.clone(), just(Token::BracketClose).ignored()));

    let open = just(Token::BracketOpen).map_with(|_, e| span_range(&e.span()));
    let close = just(Token::BracketClose).map_with(|_, e| span_range(&e.span()));

    let marker = open
        .then_ignore(text.clone().or_not())
        .then(close)
        .then_ignore(loose.clone().repeated())
        .map(|(open, close)| Segment::Marker(MarkerSyntax { open, close }));

    let broken = just(Token::BracketOpen)
        .then_ignore(text.or_not())
        .map_with(|_, e| Segment::Broken(span_range(&e.span())));

    loose
        .repeated()
        .ignore_then(choice((marker, broken)).repeated().collect::<Vec<_>>())
        .then_ignore(end())
}
