//! Lexer for the placeholder mini-language using logos
//!
//! Template text is split into literal runs, escaped braces and `{index:tag}`
//! placeholders. Stray braces are lexed as their own tokens so the grammar can
//! report them with a precise span.

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Index and raw tag of a lexed placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub index: usize,
    /// `None` for `{0}`, `Some("")` for `{0:}`
    pub tag: Option<String>,
}

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Escapes (longer than a stray brace, so they win)
    #[token("{{")]
    EscapedOpen,
    #[token("}}")]
    EscapedClose,

    #[regex(r"\{[0-9]+(:[^{}]*)?\}", placeholder)]
    Placeholder(PlaceholderToken),

    #[regex(r"[^{}]+", |lex| lex.slice().to_string())]
    Text(String),

    // Unmatched braces
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
}

fn placeholder(lex: &mut Lexer<Token>) -> Option<PlaceholderToken> {
    let inner = &lex.slice()[1..lex.slice().len() - 1];
    let (index, tag) = match inner.split_once(':') {
        Some((index, tag)) => (index, Some(tag.to_string())),
        None => (inner, None),
    };
    // Overflowing indices fall through to a lexer error
    let index = index.parse().ok()?;
    Some(PlaceholderToken { index, tag })
}

/// Lex template text into tokens with spans
///
/// Lexer errors are kept (as `Err`) so the caller can reject the template
/// instead of silently dropping text.
pub fn lex(input: &str) -> impl Iterator<Item = (Result<Token, ()>, Span)> + '_ {
    Token::lexer(input).spanned()
}
