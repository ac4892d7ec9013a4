//! Placeholder resolution - turns `{index:tag}` markers into SQL text

use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::FormatterConfig;
use crate::error::{ParseError, Span};
use crate::output::{reindent, OutputConfig};
use crate::parser::{Placeholder, Segment};
use crate::quote::{quote, QuoteStyle};

use super::{Arg, Parameters, Template, Value};

/// How a placeholder's argument is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Bound parameter (`@pN`)
    Value,
    /// Decimal integer literal
    Int,
    /// Validated, bracket-quoted identifier
    Id,
    /// Validated, single-quoted JSON path
    JsonPath,
    /// Validated SQL type name, emitted as-is
    Type,
    /// Single-quoted literal, escaped but not validated
    UnsafeString,
    /// Raw passthrough, neither validated nor escaped
    Fqn,
    DatePart,
    OrderBy,
    /// Nested template sharing the caller's parameters
    Inline,
}

impl Tag {
    pub const ALL: [Tag; 10] = [
        Tag::Value,
        Tag::Int,
        Tag::Id,
        Tag::JsonPath,
        Tag::Type,
        Tag::UnsafeString,
        Tag::Fqn,
        Tag::DatePart,
        Tag::OrderBy,
        Tag::Inline,
    ];

    /// The tag as written after the colon
    pub fn name(self) -> &'static str {
        match self {
            Tag::Value => "value",
            Tag::Int => "int",
            Tag::Id => "id",
            Tag::JsonPath => "jsonpath",
            Tag::Type => "type",
            Tag::UnsafeString => "unsafeString",
            Tag::Fqn => "fqn",
            Tag::DatePart => "datepart",
            Tag::OrderBy => "orderby",
            Tag::Inline => "inline",
        }
    }

    pub fn from_name(name: &str) -> Option<Tag> {
        Self::ALL.into_iter().find(|tag| tag.name() == name)
    }

    /// One-line summary, used by the CLI reference
    pub fn description(self) -> &'static str {
        match self {
            Tag::Value => "bind as a parameter (@p0, @p1, ...); equal values share a slot",
            Tag::Int => "integer literal; text must parse as an integer",
            Tag::Id => "[bracketed] identifier, checked against the identifier pattern",
            Tag::JsonPath => "'quoted' JSON path, checked against the JSON path pattern",
            Tag::Type => "SQL type name, checked against the type pattern, emitted as-is",
            Tag::UnsafeString => "'quoted' string literal, escaped but not validated",
            Tag::Fqn => "raw text, neither validated nor escaped",
            Tag::DatePart => "date part keyword (YEAR, MONTH, ...)",
            Tag::OrderBy => "sort direction keyword (ASC, DESC)",
            Tag::Inline => "nested template, evaluated with the same parameters",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Broad class of an evaluation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or unknown tag, or unparseable template text
    MalformedPlaceholder,
    /// Value failed its tag's validity pattern
    Injection,
    /// Argument type doesn't fit the tag
    TypeMismatch,
    /// Template used without `inline`, or `inline` without a template
    NestedMisuse,
    RecursionLimit,
}

fn display_template(text: &str) -> String {
    reindent(text, &OutputConfig::default())
}

/// Errors raised while evaluating a template
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{0}")]
    Syntax(#[from] ParseError),

    #[error("{marker}: missing format for value \"{value}\"")]
    MissingTag {
        marker: String,
        span: Span,
        value: String,
    },

    #[error("{marker}: invalid format '{tag}' for value \"{value}\"")]
    UnknownTag {
        marker: String,
        span: Span,
        tag: String,
        value: String,
    },

    #[error("{marker}: potential SQL injection detected ({value}), malicious characters found")]
    Injection {
        marker: String,
        span: Span,
        value: String,
    },

    #[error("{marker}: invalid SQL type, doesn't match required pattern: {value}")]
    InvalidType {
        marker: String,
        span: Span,
        value: String,
    },

    #[error("{marker}: argument must be a valid integer, \"{value}\" is not")]
    InvalidInt {
        marker: String,
        span: Span,
        value: String,
    },

    #[error("{marker}: expected {expected} argument, found {found}")]
    TypeMismatch {
        marker: String,
        span: Span,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{marker}: templates can only be used with :inline")]
    TemplateNotInline { marker: String, span: Span },

    #[error("{marker}: only templates can be used with :inline, found {found} (value = {value})")]
    NotATemplate {
        marker: String,
        span: Span,
        found: &'static str,
        value: String,
    },

    #[error("{marker}: templates nested deeper than {limit} levels")]
    RecursionLimit {
        marker: String,
        span: Span,
        limit: usize,
    },

    #[error("where {marker} =\n{}\n{source}", display_template(.template))]
    Nested {
        marker: String,
        span: Span,
        /// Raw text of the nested template that failed
        template: String,
        source: Box<EvalError>,
    },
}

impl EvalError {
    fn missing_tag(p: &Placeholder, arg: &Arg) -> Self {
        Self::MissingTag {
            marker: p.to_string(),
            span: p.span.clone(),
            value: arg.to_string(),
        }
    }

    fn unknown_tag(p: &Placeholder, tag: &str, arg: &Arg) -> Self {
        Self::UnknownTag {
            marker: p.to_string(),
            span: p.span.clone(),
            tag: tag.to_string(),
            value: arg.to_string(),
        }
    }

    fn injection(p: &Placeholder, value: &str) -> Self {
        Self::Injection {
            marker: p.to_string(),
            span: p.span.clone(),
            value: value.to_string(),
        }
    }

    fn invalid_type(p: &Placeholder, value: &str) -> Self {
        Self::InvalidType {
            marker: p.to_string(),
            span: p.span.clone(),
            value: value.to_string(),
        }
    }

    fn invalid_int(p: &Placeholder, value: String) -> Self {
        Self::InvalidInt {
            marker: p.to_string(),
            span: p.span.clone(),
            value,
        }
    }

    fn mismatch(p: &Placeholder, expected: &'static str, arg: &Arg) -> Self {
        Self::TypeMismatch {
            marker: p.to_string(),
            span: p.span.clone(),
            expected,
            found: arg.kind(),
        }
    }

    fn template_not_inline(p: &Placeholder) -> Self {
        Self::TemplateNotInline {
            marker: p.to_string(),
            span: p.span.clone(),
        }
    }

    fn not_a_template(p: &Placeholder, arg: &Arg) -> Self {
        Self::NotATemplate {
            marker: p.to_string(),
            span: p.span.clone(),
            found: arg.kind(),
            value: arg.to_string(),
        }
    }

    /// Classify the failure; nested failures report their innermost cause
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax(_) | Self::MissingTag { .. } | Self::UnknownTag { .. } => {
                ErrorKind::MalformedPlaceholder
            }
            Self::Injection { .. } | Self::InvalidType { .. } => ErrorKind::Injection,
            Self::InvalidInt { .. } | Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::TemplateNotInline { .. } | Self::NotATemplate { .. } => ErrorKind::NestedMisuse,
            Self::RecursionLimit { .. } => ErrorKind::RecursionLimit,
            Self::Nested { source, .. } => source.kind(),
        }
    }

    /// Span of the offending placeholder within its own template text
    pub fn span(&self) -> &Span {
        match self {
            Self::Syntax(e) => e.span(),
            Self::MissingTag { span, .. }
            | Self::UnknownTag { span, .. }
            | Self::Injection { span, .. }
            | Self::InvalidType { span, .. }
            | Self::InvalidInt { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::TemplateNotInline { span, .. }
            | Self::NotATemplate { span, .. }
            | Self::RecursionLimit { span, .. }
            | Self::Nested { span, .. } => span,
        }
    }

    /// The `{index:tag}` marker, if the failure is tied to one
    pub fn marker(&self) -> Option<&str> {
        match self {
            Self::Syntax(_) => None,
            Self::MissingTag { marker, .. }
            | Self::UnknownTag { marker, .. }
            | Self::Injection { marker, .. }
            | Self::InvalidType { marker, .. }
            | Self::InvalidInt { marker, .. }
            | Self::TypeMismatch { marker, .. }
            | Self::TemplateNotInline { marker, .. }
            | Self::NotATemplate { marker, .. }
            | Self::RecursionLimit { marker, .. }
            | Self::Nested { marker, .. } => Some(marker),
        }
    }
}

/// Walks a template, resolving each placeholder into text
///
/// Nested `inline` templates are evaluated by the same evaluator, so every
/// level registers into one shared [`Parameters`].
#[derive(Debug)]
pub struct Evaluator<'a> {
    config: &'a FormatterConfig,
    parameters: &'a mut Parameters,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(config: &'a FormatterConfig, parameters: &'a mut Parameters) -> Self {
        Self {
            config,
            parameters,
            depth: 0,
        }
    }

    /// Evaluate a template into flat SQL text
    ///
    /// Placeholders are resolved in index order (text order for repeats of
    /// one index) and spliced back into their positions. No re-indentation
    /// happens here.
    pub fn evaluate(&mut self, template: &Template) -> Result<String, EvalError> {
        let segments = template.segments()?;
        let args = template.args();

        let mut order: Vec<(usize, &Placeholder)> = segments
            .iter()
            .enumerate()
            .filter_map(|(i, segment)| match segment {
                Segment::Placeholder(p) => Some((i, p)),
                Segment::Text(_) => None,
            })
            .collect();
        order.sort_by_key(|(_, p)| p.index);

        let mut resolved = vec![String::new(); segments.len()];
        for (position, placeholder) in order {
            let text = self.resolve(placeholder, &args[placeholder.index])?;
            trace!(placeholder = %placeholder, depth = self.depth, "resolved placeholder");
            resolved[position] = text;
        }

        let mut out = String::new();
        for (segment, text) in segments.iter().zip(&resolved) {
            match segment {
                Segment::Text(literal) => out.push_str(literal),
                Segment::Placeholder(_) => out.push_str(text),
            }
        }
        Ok(out)
    }

    fn resolve(&mut self, placeholder: &Placeholder, arg: &Arg) -> Result<String, EvalError> {
        let tag = match placeholder.tag.as_deref() {
            None => return Err(EvalError::missing_tag(placeholder, arg)),
            Some(name) if name.trim().is_empty() => {
                return Err(EvalError::missing_tag(placeholder, arg))
            }
            Some(name) => Tag::from_name(name)
                .ok_or_else(|| EvalError::unknown_tag(placeholder, name, arg))?,
        };

        // Null renders as nothing, except as a bound parameter
        if arg.is_null() && tag != Tag::Value {
            return Ok(String::new());
        }
        if matches!(arg, Arg::Template(_)) && tag != Tag::Inline {
            return Err(EvalError::template_not_inline(placeholder));
        }

        match tag {
            Tag::Value => match arg {
                Arg::Value(value) => Ok(self.parameters.register(value.clone())),
                other => Err(EvalError::mismatch(placeholder, "bindable value", other)),
            },
            Tag::Int => match arg {
                Arg::Value(Value::Int(i)) => Ok(i.to_string()),
                Arg::Value(Value::Text(s)) => s
                    .trim()
                    .parse::<i64>()
                    .map(|i| i.to_string())
                    .map_err(|_| EvalError::invalid_int(placeholder, s.clone())),
                other => Err(EvalError::invalid_int(placeholder, other.to_string())),
            },
            Tag::Id => {
                let text = text_arg(placeholder, arg)?;
                if !self.config.is_valid_identifier(&text) {
                    return Err(EvalError::injection(placeholder, &text));
                }
                Ok(quote(&text, QuoteStyle::Bracket))
            }
            Tag::JsonPath => {
                // The pattern is the only protection here; prefer parameters where the
                // SQL allows them
                let text = text_arg(placeholder, arg)?;
                if !self.config.is_valid_json_path(&text) {
                    return Err(EvalError::injection(placeholder, &text));
                }
                Ok(quote(&text, QuoteStyle::SingleQuote))
            }
            Tag::Type => {
                let text = text_arg(placeholder, arg)?;
                if !self.config.is_valid_sql_type(&text) {
                    return Err(EvalError::invalid_type(placeholder, &text));
                }
                Ok(text)
            }
            Tag::UnsafeString => {
                let text = text_arg(placeholder, arg)?;
                Ok(quote(&text, QuoteStyle::SingleQuote))
            }
            Tag::Fqn => {
                debug!(placeholder = %placeholder, "fqn argument passed through unvalidated");
                text_arg(placeholder, arg)
            }
            Tag::DatePart => match arg {
                Arg::DatePart(part) => Ok(part.keyword().to_string()),
                other => Err(EvalError::mismatch(placeholder, "date part", other)),
            },
            Tag::OrderBy => match arg {
                Arg::OrderBy(direction) => Ok(direction.keyword().to_string()),
                other => Err(EvalError::mismatch(placeholder, "order direction", other)),
            },
            Tag::Inline => match arg {
                Arg::Template(nested) => self.inline(placeholder, nested),
                other => Err(EvalError::not_a_template(placeholder, other)),
            },
        }
    }

    fn inline(&mut self, placeholder: &Placeholder, nested: &Template) -> Result<String, EvalError> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::RecursionLimit {
                marker: placeholder.to_string(),
                span: placeholder.span.clone(),
                limit: self.config.max_depth,
            });
        }

        self.depth += 1;
        let result = self.evaluate(nested);
        self.depth -= 1;

        result.map_err(|source| EvalError::Nested {
            marker: placeholder.to_string(),
            span: placeholder.span.clone(),
            template: nested.text().to_string(),
            source: Box::new(source),
        })
    }
}

/// Text form of a scalar argument for the text-valued tags
fn text_arg(placeholder: &Placeholder, arg: &Arg) -> Result<String, EvalError> {
    match arg {
        Arg::Value(value) => Ok(value.to_string()),
        Arg::Template(_) => Err(EvalError::template_not_inline(placeholder)),
        other => Err(EvalError::mismatch(placeholder, "text", other)),
    }
}
