//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::parser::ast::*;
use crate::parser::lexer::{lex, Token};

/// Parse template text into segments
///
/// Only the first error is reported; a template with one malformed
/// placeholder is rejected as a whole.
pub fn parse(input: &str) -> Result<Vec<Segment>, ParseError> {
    let len = input.len();

    let mut tokens = Vec::new();
    for (tok, span) in lex(input) {
        match tok {
            Ok(tok) => tokens.push((tok, SimpleSpan::from(span))),
            Err(()) => {
                return Err(ParseError::syntax(
                    span,
                    "placeholder index is too large",
                    Vec::new(),
                ))
            }
        }
    }

    // Turn the token list into a stream that chumsky can use
    let token_stream = Stream::from_iter(tokens)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => err.into(),
            None => ParseError::syntax(0..len, "invalid template", Vec::new()),
        })
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Vec<Segment>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let text = select! {
        Token::Text(s) => Segment::Text(s),
        Token::EscapedOpen => Segment::Text("{".to_string()),
        Token::EscapedClose => Segment::Text("}".to_string()),
    };

    let placeholder = select! {
        Token::Placeholder(p) => p,
    }
    .map_with(|p, e| Segment::Placeholder(Placeholder::new(p.index, p.tag, span_range(&e.span()))));

    choice((text, placeholder))
        .repeated()
        .collect::<Vec<_>>()
        .map(merge_text)
}

/// Join adjacent text segments so escapes don't fragment literal runs
fn merge_text(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        if let (Some(Segment::Text(prev)), Segment::Text(next)) = (merged.last_mut(), &segment) {
            prev.push_str(next);
            continue;
        }
        merged.push(segment);
    }
    merged
}
