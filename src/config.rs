//! Formatter configuration: validation patterns and output style
//!
//! A process-wide default is kept behind [`FormatterConfig::active`]. Builds
//! take one snapshot of it up front, so replacing the default never affects an
//! evaluation already in flight.

use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::output::{OutputConfig, WhitespaceType};

/// Identifier characters: letters, digits, whitespace and `()/&_$:.`
///
/// A `-` is allowed but never twice in a row, so a `--` comment can't ride
/// along inside an identifier.
pub const DEFAULT_IDENTIFIER_PATTERN: &str =
    r"^#?(?:[\p{L}0-9()/&_$:.\s]|-[\p{L}0-9()/&_$:.\s])*-?$";

/// Alphanumeric type name with an optional length (or `max`)
pub const DEFAULT_SQL_TYPE_PATTERN: &str = r"(?i)^[a-z0-9]+(?:\((?:\d+|max)\))?$";

/// Identifier characters plus `[`, `]` and `"`
pub const DEFAULT_JSON_PATH_PATTERN: &str = r#"^(?:[a-zA-Z0-9\-_$:./&\[\]"]|\s)*$"#;

/// Default limit on nested `inline` templates
pub const DEFAULT_MAX_DEPTH: usize = 64;

static ACTIVE: LazyLock<RwLock<Arc<FormatterConfig>>> =
    LazyLock::new(|| RwLock::new(Arc::new(FormatterConfig::default())));

/// Errors that can occur when loading a formatter configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid {name} pattern: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("indent_size must be at least 1")]
    InvalidIndentSize,
}

/// Patterns and output settings used during evaluation
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Validity pattern for the `id` tag
    pub identifier: Regex,
    /// Validity pattern for the `type` tag
    pub sql_type: Regex,
    /// Validity pattern for the `jsonpath` tag
    pub json_path: Regex,
    /// Re-indentation settings
    pub output: OutputConfig,
    /// Maximum nesting of `inline` templates
    pub max_depth: usize,
}

/// TOML structure for deserializing formatter configs
#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlConfig {
    patterns: TomlPatterns,
    output: TomlOutput,
    max_depth: Option<usize>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlPatterns {
    identifier: Option<String>,
    sql_type: Option<String>,
    json_path: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct TomlOutput {
    whitespace: Option<WhitespaceType>,
    indent_size: Option<usize>,
}

fn builtin(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is valid")
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { name, source })
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            identifier: builtin(DEFAULT_IDENTIFIER_PATTERN),
            sql_type: builtin(DEFAULT_SQL_TYPE_PATTERN),
            json_path: builtin(DEFAULT_JSON_PATH_PATTERN),
            output: OutputConfig::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FormatterConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default configuration
    pub fn active() -> Arc<FormatterConfig> {
        let guard = ACTIVE.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the process-wide default configuration
    pub fn set_active(config: FormatterConfig) {
        let mut guard = ACTIVE.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(config);
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a configuration from a TOML string; missing keys keep defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(pattern) = parsed.patterns.identifier {
            config.identifier = compile("identifier", &pattern)?;
        }
        if let Some(pattern) = parsed.patterns.sql_type {
            config.sql_type = compile("sql_type", &pattern)?;
        }
        if let Some(pattern) = parsed.patterns.json_path {
            config.json_path = compile("json_path", &pattern)?;
        }
        if let Some(whitespace) = parsed.output.whitespace {
            config.output.whitespace = whitespace;
        }
        if let Some(size) = parsed.output.indent_size {
            if size == 0 {
                return Err(ConfigError::InvalidIndentSize);
            }
            config.output.indent_size = size;
        }
        if let Some(depth) = parsed.max_depth {
            config.max_depth = depth;
        }

        Ok(config)
    }

    /// Set the identifier pattern
    pub fn with_identifier(mut self, pattern: Regex) -> Self {
        self.identifier = pattern;
        self
    }

    /// Set the SQL type pattern
    pub fn with_sql_type(mut self, pattern: Regex) -> Self {
        self.sql_type = pattern;
        self
    }

    /// Set the JSON path pattern
    pub fn with_json_path(mut self, pattern: Regex) -> Self {
        self.json_path = pattern;
        self
    }

    /// Set the output configuration
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Set the nesting limit for `inline` templates
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn is_valid_identifier(&self, name: &str) -> bool {
        self.identifier.is_match(name)
    }

    pub fn is_valid_json_path(&self, path: &str) -> bool {
        self.json_path.is_match(path)
    }

    pub fn is_valid_sql_type(&self, name: &str) -> bool {
        self.sql_type.is_match(name)
    }
}
