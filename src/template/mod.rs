//! Templates: SQL text with `{index:tag}` placeholders plus their arguments
//!
//! A [`Template`] is immutable raw text and an ordered argument list. Nothing
//! is validated until the template is evaluated or joined, at which point the
//! text is parsed into [`Segment`]s.
//!
//! # Example
//!
//! ```rust
//! use sql_compositor::{build, sql};
//!
//! let filter = sql!("AND Age > {0:value}", 18);
//! let query = sql!("SELECT * FROM {0:id} WHERE 1 = 1 {1:inline}", "Users", filter);
//!
//! let compiled = build(&query).unwrap();
//! assert_eq!(compiled.sql(), "SELECT * FROM [Users] WHERE 1 = 1 AND Age > @p0");
//! ```

mod join;
mod registry;
mod resolver;

pub use join::{concat_map, join};
pub use registry::Parameters;
pub use resolver::{ErrorKind, EvalError, Evaluator, Tag};

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ParseError;
use crate::keywords::{DatePart, OrderBy};
use crate::parser::{self, Segment};

/// A runtime value that can be bound as a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Short name of the value's type, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// One placeholder argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    DatePart(DatePart),
    OrderBy(OrderBy),
    /// Only valid with the `inline` tag
    Template(Template),
}

impl Arg {
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Value(v) => v.kind(),
            Arg::DatePart(_) => "date part",
            Arg::OrderBy(_) => "order direction",
            Arg::Template(_) => "template",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Arg::Value(Value::Null))
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(v) => write!(f, "{}", v),
            Arg::DatePart(d) => write!(f, "{}", d),
            Arg::OrderBy(o) => write!(f, "{}", o),
            Arg::Template(t) => f.write_str(t.text()),
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }

            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    &String => Text,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        Arg::Value(Value::from(v))
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<DatePart> for Arg {
    fn from(v: DatePart) -> Self {
        Arg::DatePart(v)
    }
}

impl From<OrderBy> for Arg {
    fn from(v: OrderBy) -> Self {
        Arg::OrderBy(v)
    }
}

impl From<Template> for Arg {
    fn from(v: Template) -> Self {
        Arg::Template(v)
    }
}

/// Raw text with positional placeholders plus one argument per index
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    text: String,
    args: Vec<Arg>,
}

impl Template {
    pub fn new(text: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            text: text.into(),
            args,
        }
    }

    /// A template with no text and no arguments
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.args.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<Arg>) {
        (self.text, self.args)
    }

    /// Parse the text, checking every placeholder has an argument
    pub fn segments(&self) -> Result<Vec<Segment>, ParseError> {
        let segments = parser::parse(&self.text)?;
        if let Some(p) = parser::placeholders(&segments).find(|p| p.index >= self.args.len()) {
            return Err(ParseError::IndexOutOfRange {
                span: p.span.clone(),
                index: p.index,
                arguments: self.args.len(),
            });
        }
        Ok(segments)
    }

    /// Number of placeholder markers in the text
    pub fn placeholder_count(&self) -> Result<usize, ParseError> {
        Ok(parser::placeholders(&self.segments()?).count())
    }
}

/// Include a template only when `condition` holds
///
/// The template is built lazily, which makes optional clauses over
/// `Option`s read naturally:
///
/// ```rust
/// use sql_compositor::{build, sql, sql_if};
///
/// let take: Option<i64> = Some(10);
/// let top = sql_if(take.is_some(), || sql!("TOP({0:int})", take));
/// let query = sql!("SELECT {0:inline} * FROM {1:id}", top, "Users");
/// assert_eq!(build(&query).unwrap().sql(), "SELECT TOP(10) * FROM [Users]");
/// ```
pub fn sql_if(condition: bool, if_true: impl FnOnce() -> Template) -> Template {
    if condition {
        if_true()
    } else {
        Template::empty()
    }
}

/// Build exactly one of two templates depending on `condition`
pub fn sql_if_else(
    condition: bool,
    if_true: impl FnOnce() -> Template,
    if_false: impl FnOnce() -> Template,
) -> Template {
    if condition {
        if_true()
    } else {
        if_false()
    }
}
