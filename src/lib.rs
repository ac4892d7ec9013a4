//! SQL Compositor - composable SQL templates with injection-checked placeholders
//!
//! Templates are raw SQL text with `{index:tag}` placeholders plus one argument
//! per index. The tag decides how each argument lands in the text: as a bound
//! parameter, a validated identifier, a quoted literal, a keyword, or a nested
//! template sharing the same parameters.
//!
//! # Example
//!
//! ```rust
//! use sql_compositor::{build, sql, Value};
//!
//! let query = sql!("SELECT * FROM {0:id} WHERE id = {1:value}", "Users", 5);
//! let compiled = build(&query).unwrap();
//!
//! assert_eq!(compiled.sql(), "SELECT * FROM [Users] WHERE id = @p0");
//! assert_eq!(compiled.parameters().values(), &[Value::Int(5)]);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod keywords;
pub mod output;
pub mod parser;
pub mod quote;
pub mod template;

pub use config::{ConfigError, FormatterConfig};
pub use document::{DocumentError, QueryDocument};
pub use error::ParseError;
pub use keywords::{DatePart, OrderBy, UnknownKeyword};
pub use output::{reindent, OutputConfig, WhitespaceType};
pub use quote::{is_valid_identifier, is_valid_json_path, is_valid_sql_type, quote, QuoteStyle};
pub use template::{
    concat_map, join, sql_if, sql_if_else, Arg, ErrorKind, EvalError, Evaluator, Parameters, Tag,
    Template, Value,
};

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use output::diagnostic_script;

/// Build a [`Template`] from text and arguments, converting each with `Arg::from`
///
/// ```rust
/// use sql_compositor::{sql, DatePart};
///
/// let t = sql!("DATEADD({0:datepart}, {1:int}, {2:id})", DatePart::Day, 7, "Created");
/// assert_eq!(t.args().len(), 3);
/// ```
#[macro_export]
macro_rules! sql {
    ($text:expr $(, $arg:expr)* $(,)?) => {
        $crate::template::Template::new($text, vec![$($crate::template::Arg::from($arg)),*])
    };
}

/// Build a template, recording the calling module as the tracking origin
///
/// An origin already set on an explicit [`BuildConfig`] is kept.
///
/// ```rust
/// use sql_compositor::{build, sql};
///
/// let compiled = build!(&sql!("SELECT 1")).unwrap();
/// assert_eq!(compiled.tracking().origin.as_deref(), Some(module_path!()));
/// ```
#[macro_export]
macro_rules! build {
    ($template:expr $(,)?) => {
        $crate::build_with_config(
            $template,
            $crate::BuildConfig::new().with_origin(module_path!()),
        )
    };
    ($template:expr, $config:expr $(,)?) => {
        $crate::build_with_config($template, ($config).or_origin(module_path!()))
    };
}

/// Where a build was requested from; diagnostics only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingInfo {
    /// Caller-supplied name, typically the enclosing function
    pub origin: Option<String>,
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl TrackingInfo {
    /// Capture the location of the (tracked) caller
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            origin: None,
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

impl fmt::Display for TrackingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{} ({}:{})", origin, self.file, self.line),
            None => write!(f, "{}:{}:{}", self.file, self.line, self.column),
        }
    }
}

/// Per-call build options
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Overrides the process-wide [`FormatterConfig::active`] for this call
    pub formatter: Option<Arc<FormatterConfig>>,
    /// Values bound before any placeholder, keeping their positions
    pub initial: Vec<Value>,
    pub origin: Option<String>,
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formatter(mut self, formatter: impl Into<Arc<FormatterConfig>>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    pub fn with_initial(mut self, values: Vec<Value>) -> Self {
        self.initial = values;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set the origin unless one is already present
    pub fn or_origin(mut self, origin: impl Into<String>) -> Self {
        if self.origin.is_none() {
            self.origin = Some(origin.into());
        }
        self
    }
}

fn display_template(text: &str) -> String {
    reindent(text, &OutputConfig::default())
}

/// A failed top-level build
#[derive(Debug, Error)]
#[error("failed to format\n{}\n{source}", display_template(.template))]
pub struct BuildError {
    template: String,
    tracking: TrackingInfo,
    #[source]
    source: EvalError,
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// The evaluation failure, possibly wrapped in nested context
    pub fn inner(&self) -> &EvalError {
        &self.source
    }

    /// Raw text of the top-level template
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn tracking(&self) -> &TrackingInfo {
        &self.tracking
    }

    /// Render an ariadne report on the innermost failing template
    ///
    /// Nested failures are unwrapped down to the template that actually
    /// rejected a placeholder; the chain of `inline` markers leading there
    /// becomes a note.
    pub fn format(&self, filename: &str) -> String {
        let mut text = self.template.as_str();
        let mut err = &self.source;
        let mut chain = Vec::new();
        while let EvalError::Nested {
            marker,
            template,
            source,
            ..
        } = err
        {
            chain.push(marker.as_str());
            text = template;
            err = &**source;
        }

        let note = (!chain.is_empty()).then(|| format!("inside {}", chain.join(" -> ")));
        let label = match err {
            EvalError::Syntax(parse) => parse.label(),
            other => kind_label(other.kind()).to_string(),
        };
        error::render_report(
            text,
            filename,
            err.span(),
            &err.to_string(),
            &label,
            note.as_deref(),
        )
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::MalformedPlaceholder => "malformed placeholder",
        ErrorKind::Injection => "rejected by validation pattern",
        ErrorKind::TypeMismatch => "argument doesn't fit this tag",
        ErrorKind::NestedMisuse => "nested template misuse",
        ErrorKind::RecursionLimit => "nesting limit reached",
    }
}

/// Finished SQL text with its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    sql: String,
    parameters: Parameters,
    tracking: TrackingInfo,
}

impl Compiled {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn tracking(&self) -> &TrackingInfo {
        &self.tracking
    }

    pub fn into_parts(self) -> (String, Parameters, TrackingInfo) {
        (self.sql, self.parameters, self.tracking)
    }
}

/// The `DECLARE`/`EXEC sp_executesql` diagnostic script
impl fmt::Display for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&diagnostic_script(&self.sql, &self.parameters))
    }
}

/// Evaluate a template with the active configuration
#[track_caller]
pub fn build(template: &Template) -> Result<Compiled, BuildError> {
    build_with_config(template, BuildConfig::default())
}

/// Evaluate a template, then re-indent the result
///
/// The formatter configuration is resolved once up front; replacing the
/// active configuration meanwhile has no effect on this call.
#[track_caller]
pub fn build_with_config(template: &Template, config: BuildConfig) -> Result<Compiled, BuildError> {
    let mut tracking = TrackingInfo::caller();
    tracking.origin = config.origin;

    let formatter = config.formatter.unwrap_or_else(FormatterConfig::active);
    let mut parameters = Parameters::with_initial(config.initial);

    let text = match Evaluator::new(&formatter, &mut parameters).evaluate(template) {
        Ok(text) => text,
        Err(source) => {
            debug!(origin = %tracking, kind = ?source.kind(), "build failed");
            return Err(BuildError {
                template: template.text().to_string(),
                tracking,
                source,
            });
        }
    };
    let sql = reindent(&text, &formatter.output);

    debug!(
        origin = %tracking,
        parameters = parameters.len(),
        length = sql.len(),
        "built SQL"
    );

    Ok(Compiled {
        sql,
        parameters,
        tracking,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_by_id() {
        let compiled = build(&sql!(
            "SELECT * FROM {0:id} WHERE id = {1:value}",
            "Users",
            5
        ))
        .unwrap();
        assert_eq!(compiled.sql(), "SELECT * FROM [Users] WHERE id = @p0");
        assert_eq!(compiled.parameters().values(), &[Value::Int(5)]);
    }

    #[test]
    fn test_injection_produces_no_output() {
        let err = build(&sql!("{0:id}", "Users; DROP TABLE Users")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Injection);
        assert_eq!(err.template(), "{0:id}");
    }

    #[test]
    fn test_initial_values_keep_positions() {
        let config = BuildConfig::new().with_initial(vec![Value::from("tenant-1")]);
        let compiled = build_with_config(
            &sql!("WHERE tenant = @p0 AND name = {0:value} AND t2 = {1:value}", "bob", "tenant-1"),
            config,
        )
        .unwrap();
        assert_eq!(
            compiled.sql(),
            "WHERE tenant = @p0 AND name = @p1 AND t2 = @p0"
        );
        assert_eq!(compiled.parameters().len(), 2);
    }

    #[test]
    fn test_build_reindents_nested_fragments() {
        let filter = sql!("\n        AND a = {0:value}\n        AND b = {1:value}", 1, 2);
        let query = sql!(
            "\n    SELECT *\n    FROM {0:id}\n    WHERE 1 = 1{1:inline}",
            "T",
            filter
        );
        let compiled = build(&query).unwrap();
        assert_eq!(
            compiled.sql(),
            "    SELECT *\n    FROM [T]\n    WHERE 1 = 1\n        AND a = @p0\n        AND b = @p1"
        );
    }

    #[test]
    fn test_formatter_override() {
        let formatter = FormatterConfig::default()
            .with_output(OutputConfig::default().with_whitespace(WhitespaceType::Tabs).with_indent_size(1));
        let config = BuildConfig::new().with_formatter(formatter);
        let compiled = build_with_config(&sql!("SELECT 1\n    FROM t"), config).unwrap();
        assert_eq!(compiled.sql(), "\tSELECT 1\n\tFROM t");
    }

    #[test]
    fn test_tracking_records_call_site() {
        let (compiled, line) = (build(&sql!("SELECT 1")).unwrap(), line!());
        assert_eq!(compiled.tracking().line, line);
        assert!(compiled.tracking().file.ends_with("lib.rs"));
        assert_eq!(compiled.tracking().origin, None);

        let config = BuildConfig::new().with_origin("load_users");
        let compiled = build_with_config(&sql!("SELECT 1"), config).unwrap();
        assert_eq!(compiled.tracking().origin.as_deref(), Some("load_users"));
        assert!(compiled.tracking().to_string().starts_with("load_users ("));
    }

    #[test]
    fn test_error_display_includes_template() {
        let err = build(&sql!("SELECT {0:int}", "ten")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to format\nSELECT {0:int}\n{0:int}: argument must be a valid integer, \"ten\" is not"
        );
    }

    #[test]
    fn test_format_points_into_nested_template() {
        let inner = sql!("WHERE {0:jsonpath} IS NULL", "$.a'--");
        let query = sql!("SELECT 1 {0:inline}", inner);
        let err = build(&query).unwrap_err();
        let report = err.format("query.sql");
        assert!(report.contains("WHERE {0:jsonpath} IS NULL"));
        assert!(report.contains("rejected by validation pattern"));
        assert!(report.contains("inside {0:inline}"));
        assert!(!report.contains("SELECT 1"));
    }

    #[test]
    fn test_format_handles_multibyte_text() {
        let err = build(&sql!("SELECT [Créée] FROM {0:id}", "a;b")).unwrap_err();
        let report = err.format("query.sql");
        assert!(report.contains("SELECT [Créée] FROM {0:id}"));
        assert!(report.contains("rejected by validation pattern"));

        let inner = sql!("WHERE Libellé = {0:id}", "x--y");
        let err = build(&sql!("SELECT « {0:inline} »", inner)).unwrap_err();
        let report = err.format("query.sql");
        assert!(report.contains("WHERE Libellé = {0:id}"));
        assert!(report.contains("rejected by validation pattern"));
        assert!(report.contains("inside {0:inline}"));
    }

    #[test]
    fn test_format_labels_syntax_errors() {
        let err = build(&sql!("SELECT { FROM t")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPlaceholder);
        let report = err.format("query.sql");
        assert!(report.contains("SELECT { FROM t"));
        assert!(report.contains("Unmatched '{'"));
    }

    #[test]
    fn test_build_macro_records_module() {
        let compiled = build!(&sql!("SELECT 1")).unwrap();
        assert_eq!(compiled.tracking().origin.as_deref(), Some("sql_compositor::tests"));

        let config = BuildConfig::new().with_origin("load_users");
        let compiled = build!(&sql!("SELECT 1"), config).unwrap();
        assert_eq!(compiled.tracking().origin.as_deref(), Some("load_users"));
    }

    #[test]
    fn test_display_is_diagnostic_script() {
        let compiled = build(&sql!("SELECT {0:value}", "x")).unwrap();
        assert_eq!(
            compiled.to_string(),
            "DECLARE @SQL NVARCHAR(MAX) = 'SELECT @p0'\nEXEC sp_executesql @SQL, N'@p0 NVARCHAR(1)', @p0=N'x'"
        );
    }

    #[test]
    fn test_macro_trailing_comma_and_no_args() {
        assert_eq!(sql!("SELECT 1").args().len(), 0);
        assert_eq!(sql!("{0:value}", 1,).args().len(), 1);
    }
}
