//! Parsed form of template text

use std::fmt;

pub use super::lexer::Span;

/// A piece of template text
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal SQL text, with `{{`/`}}` escapes already collapsed
    Text(String),
    /// A `{index:tag}` marker
    Placeholder(Placeholder),
}

/// A `{index:tag}` marker and where it sits in the template text
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub index: usize,
    /// Raw tag text; `None` when the marker has no colon at all
    pub tag: Option<String>,
    pub span: Span,
}

impl Placeholder {
    pub fn new(index: usize, tag: Option<String>, span: Span) -> Self {
        Self { index, tag, span }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{{{}:{}}}", self.index, tag),
            None => write!(f, "{{{}}}", self.index),
        }
    }
}

/// Render segments back into template text, re-escaping literal braces
pub fn render_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => {
                for c in text.chars() {
                    match c {
                        '{' => out.push_str("{{"),
                        '}' => out.push_str("}}"),
                        c => out.push(c),
                    }
                }
            }
            Segment::Placeholder(p) => out.push_str(&p.to_string()),
        }
    }
    out
}

/// Iterate over the placeholders of a segment list
pub fn placeholders(segments: &[Segment]) -> impl Iterator<Item = &Placeholder> {
    segments.iter().filter_map(|s| match s {
        Segment::Placeholder(p) => Some(p),
        Segment::Text(_) => None,
    })
}
