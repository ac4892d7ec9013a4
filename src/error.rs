//! Error types for template parsing

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("Placeholder {{{index}}} at {span:?} has no argument ({arguments} supplied)")]
    IndexOutOfRange {
        span: Span,
        index: usize,
        arguments: usize,
    },
}

impl ParseError {
    pub fn syntax(span: Span, message: impl Into<String>, expected: Vec<String>) -> Self {
        Self::Syntax {
            span,
            message: message.into(),
            expected,
        }
    }

    /// Get the source span of the error
    pub fn span(&self) -> &Span {
        match self {
            Self::Syntax { span, .. } | Self::IndexOutOfRange { span, .. } => span,
        }
    }

    /// Text for the report label pointing at the span
    pub fn label(&self) -> String {
        match self {
            ParseError::Syntax {
                message, expected, ..
            } => {
                if expected.is_empty() {
                    message.clone()
                } else {
                    format!("{}\nExpected: {}", message, expected.join(", "))
                }
            }
            ParseError::IndexOutOfRange { arguments, .. } => {
                format!("only {} argument(s) supplied", arguments)
            }
        }
    }
}

/// Write a single-label ariadne report into a string
pub(crate) fn render_report(
    source: &str,
    filename: &str,
    span: &Span,
    message: &str,
    label: &str,
    note: Option<&str>,
) -> String {
    let mut buf = Vec::new();
    // Plain output: reports end up in logs and test assertions.
    // Spans are byte offsets into the template text.
    let config = Config::default()
        .with_color(false)
        .with_index_type(IndexType::Byte);
    let mut report = Report::build(ReportKind::Error, filename, span.start)
        .with_config(config)
        .with_message(message)
        .with_label(Label::new((filename, span.clone())).with_message(label));
    if let Some(note) = note {
        report = report.with_note(note);
    }
    // Writing into a Vec cannot fail
    let _ = report
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        use crate::parser::lexer::Token;
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => {
                    let tok: &Token = tok;
                    match tok {
                        Token::BraceOpen => {
                            "Unmatched '{' (write '{{' for a literal brace)".to_string()
                        }
                        Token::BraceClose => {
                            "Unmatched '}' (write '}}' for a literal brace)".to_string()
                        }
                        other => format!("Unexpected {}", format_token(other)),
                    }
                }
                None => "Unexpected end of input".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected: Vec::new(),
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::parser::lexer::Token) -> String {
    use crate::parser::lexer::Token;
    match tok {
        Token::Text(s) => format!("text \"{}\"", s),
        Token::Placeholder(p) => match &p.tag {
            Some(tag) => format!("placeholder '{{{}:{}}}'", p.index, tag),
            None => format!("placeholder '{{{}}}'", p.index),
        },
        Token::EscapedOpen => "'{{'".to_string(),
        Token::EscapedClose => "'}}'".to_string(),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_display() {
        let err = ParseError::syntax(3..4, "Unmatched '{'", Vec::new());
        assert_eq!(err.to_string(), "Parse error at 3..4: Unmatched '{'");
    }

    #[test]
    fn test_index_out_of_range_display() {
        let err = ParseError::IndexOutOfRange {
            span: 0..6,
            index: 2,
            arguments: 1,
        };
        assert!(err.to_string().contains("{2}"));
        assert!(err.to_string().contains("1 supplied"));
    }

    #[test]
    fn test_syntax_label_lists_expected() {
        let err = ParseError::syntax(7..8, "Unmatched '{'", vec!["placeholder".to_string()]);
        assert_eq!(err.label(), "Unmatched '{'\nExpected: placeholder");
    }

    #[test]
    fn test_report_points_at_source() {
        let source = "SELECT { FROM t";
        let report = render_report(source, "query.sql", &(7..8), "bad brace", "here", None);
        assert!(report.contains("query.sql"));
        assert!(report.contains("SELECT { FROM t"));
        assert!(report.contains("here"));
    }

    #[test]
    fn test_report_spans_are_byte_offsets() {
        // "é" takes two bytes, so the brace sits at byte 12 but char 11
        let source = "SELECT [é] { FROM t";
        let brace = source.find('{').unwrap();
        assert_eq!(brace, 12);
        let report = render_report(source, "query.sql", &(brace..brace + 1), "bad brace", "stray brace", None);
        assert!(report.contains("SELECT [é] { FROM t"));
        assert!(report.contains("stray brace"));
    }
}
