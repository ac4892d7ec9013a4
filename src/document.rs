//! TOML query documents: a template, its arguments and initial parameters
//!
//! ```toml
//! sql = "SELECT * FROM {0:id} WHERE Created > {1:value} {2:inline}"
//! params = ["tenant-1"]
//! args = [
//!     "Orders",
//!     2024-01-01,
//!     { sql = "ORDER BY {0:id} {1:orderby}", args = ["Created", { orderby = "desc" }] },
//! ]
//! ```
//!
//! Scalars map onto [`Value`]s directly; an empty table `{}` is null. Tables
//! with a single recognised key build the richer arguments: `datepart`,
//! `orderby`, a nested `sql` template (with optional `args`), or `join`, a list
//! of nested templates merged with an optional `separator` (default `", "`).

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use toml::value::{Datetime, Table};

use crate::error::ParseError;
use crate::keywords::{DatePart, OrderBy, UnknownKeyword};
use crate::template::{join, Arg, Template, Value};
use crate::BuildConfig;

const DEFAULT_JOIN_SEPARATOR: &str = ", ";

/// Errors that can occur when loading a query document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read query document: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse query document: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("{path}: {message}")]
    InvalidArg { path: String, message: String },
    #[error("{path}: {source}")]
    InvalidKeyword {
        path: String,
        #[source]
        source: UnknownKeyword,
    },
    #[error("{path}: cannot join templates: {source}")]
    Join {
        path: String,
        #[source]
        source: ParseError,
    },
}

impl DocumentError {
    fn invalid(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidArg {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// TOML structure for deserializing query documents
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDocument {
    sql: String,
    #[serde(default)]
    args: Vec<toml::Value>,
    #[serde(default)]
    params: Vec<toml::Value>,
}

/// A template plus the values to seed its parameters with
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
    pub template: Template,
    pub params: Vec<Value>,
}

impl QueryDocument {
    /// Load a document from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a document from a TOML string
    pub fn from_str(content: &str) -> Result<Self, DocumentError> {
        let parsed: TomlDocument = toml::from_str(content)?;

        let args = convert_args(&parsed.args, "args")?;
        let params = parsed
            .params
            .iter()
            .enumerate()
            .map(|(i, value)| to_value(value, &format!("params[{}]", i)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            template: Template::new(parsed.sql, args),
            params,
        })
    }

    /// Build options seeded with this document's parameters
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig::new().with_initial(self.params.clone())
    }
}

fn convert_args(values: &[toml::Value], path: &str) -> Result<Vec<Arg>, DocumentError> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| to_arg(value, &format!("{}[{}]", path, i)))
        .collect()
}

fn to_arg(value: &toml::Value, path: &str) -> Result<Arg, DocumentError> {
    match value {
        toml::Value::Table(table) if !table.is_empty() => table_arg(table, path),
        other => Ok(Arg::Value(to_value(other, path)?)),
    }
}

fn to_value(value: &toml::Value, path: &str) -> Result<Value, DocumentError> {
    match value {
        toml::Value::String(s) => Ok(Value::Text(s.clone())),
        toml::Value::Integer(i) => Ok(Value::Int(*i)),
        toml::Value::Float(f) => Ok(Value::Float(*f)),
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Datetime(dt) => datetime_value(dt, path),
        toml::Value::Table(table) if table.is_empty() => Ok(Value::Null),
        toml::Value::Table(_) => Err(DocumentError::invalid(path, "expected a plain value, found a table")),
        toml::Value::Array(_) => Err(DocumentError::invalid(path, "arrays are not supported as values")),
    }
}

/// Dates become [`Value::Date`], date-times [`Value::DateTime`]; offsets are dropped
fn datetime_value(dt: &Datetime, path: &str) -> Result<Value, DocumentError> {
    let Some(d) = dt.date else {
        return Err(DocumentError::invalid(path, "a time needs a date"));
    };
    let date = NaiveDate::from_ymd_opt(d.year.into(), d.month.into(), d.day.into())
        .ok_or_else(|| DocumentError::invalid(path, format!("invalid date {}", dt)))?;

    match dt.time {
        None => Ok(Value::Date(date)),
        Some(t) => date
            .and_hms_nano_opt(t.hour.into(), t.minute.into(), t.second.into(), t.nanosecond)
            .map(Value::DateTime)
            .ok_or_else(|| DocumentError::invalid(path, format!("invalid time {}", dt))),
    }
}

fn expect_keys(table: &Table, allowed: &[&str], path: &str) -> Result<(), DocumentError> {
    match table.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(DocumentError::invalid(
            path,
            format!("unexpected key '{}' (allowed: {})", key, allowed.join(", ")),
        )),
        None => Ok(()),
    }
}

fn keyword_text<'v>(table: &'v Table, key: &str, path: &str) -> Result<&'v str, DocumentError> {
    table
        .get(key)
        .and_then(toml::Value::as_str)
        .ok_or_else(|| DocumentError::invalid(path, format!("'{}' must be a string", key)))
}

fn table_arg(table: &Table, path: &str) -> Result<Arg, DocumentError> {
    if table.contains_key("datepart") {
        expect_keys(table, &["datepart"], path)?;
        let part: DatePart = keyword_text(table, "datepart", path)?
            .parse()
            .map_err(|source| DocumentError::InvalidKeyword {
                path: path.to_string(),
                source,
            })?;
        return Ok(Arg::DatePart(part));
    }

    if table.contains_key("orderby") {
        expect_keys(table, &["orderby"], path)?;
        let direction: OrderBy = keyword_text(table, "orderby", path)?
            .parse()
            .map_err(|source| DocumentError::InvalidKeyword {
                path: path.to_string(),
                source,
            })?;
        return Ok(Arg::OrderBy(direction));
    }

    if table.contains_key("sql") {
        return nested_template(table, path).map(Arg::Template);
    }

    if table.contains_key("join") {
        expect_keys(table, &["join", "separator"], path)?;
        let separator = match table.get("separator") {
            None => DEFAULT_JOIN_SEPARATOR,
            Some(value) => value
                .as_str()
                .ok_or_else(|| DocumentError::invalid(path, "'separator' must be a string"))?,
        };
        let fragments = table
            .get("join")
            .and_then(toml::Value::as_array)
            .ok_or_else(|| DocumentError::invalid(path, "'join' must be an array of templates"))?
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let item_path = format!("{}.join[{}]", path, i);
                match value {
                    toml::Value::Table(t) if t.contains_key("sql") => nested_template(t, &item_path),
                    _ => Err(DocumentError::invalid(&item_path, "expected { sql = \"...\", args = [...] }")),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let joined = join(fragments, separator).map_err(|source| DocumentError::Join {
            path: path.to_string(),
            source,
        })?;
        return Ok(Arg::Template(joined));
    }

    expect_keys(table, &["datepart", "orderby", "sql", "join"], path)?;
    Err(DocumentError::invalid(path, "unrecognised argument table"))
}

fn nested_template(table: &Table, path: &str) -> Result<Template, DocumentError> {
    expect_keys(table, &["sql", "args"], path)?;
    let sql = table
        .get("sql")
        .and_then(toml::Value::as_str)
        .ok_or_else(|| DocumentError::invalid(path, "'sql' must be a string"))?;
    let args = match table.get("args") {
        None => Vec::new(),
        Some(toml::Value::Array(values)) => convert_args(values, &format!("{}.args", path))?,
        Some(_) => return Err(DocumentError::invalid(path, "'args' must be an array")),
    };
    Ok(Template::new(sql, args))
}
