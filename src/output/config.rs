//! Configuration for formatted output

use serde::Deserialize;

/// Columns a tab counts for when measuring indentation
pub const TAB_WIDTH: usize = 4;

/// Character used for indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceType {
    #[default]
    Spaces,
    Tabs,
}

impl WhitespaceType {
    pub fn as_char(self) -> char {
        match self {
            WhitespaceType::Spaces => ' ',
            WhitespaceType::Tabs => '\t',
        }
    }
}

/// Configuration options for re-indented output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// What characters to use for indents
    pub whitespace: WhitespaceType,

    /// How many tabs or spaces make one indent level
    pub indent_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            whitespace: WhitespaceType::Spaces,
            indent_size: 4,
        }
    }
}

impl OutputConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indent character
    pub fn with_whitespace(mut self, whitespace: WhitespaceType) -> Self {
        self.whitespace = whitespace;
        self
    }

    /// Set the number of indent characters per level
    pub fn with_indent_size(mut self, size: usize) -> Self {
        self.indent_size = size;
        self
    }

    /// One indent level
    pub fn unit(&self) -> String {
        self.whitespace.as_char().to_string().repeat(self.indent_size)
    }

    /// Width of one indent level in columns
    pub fn unit_width(&self) -> usize {
        match self.whitespace {
            WhitespaceType::Spaces => self.indent_size,
            WhitespaceType::Tabs => self.indent_size * TAB_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OutputConfig::default();
        assert_eq!(config.whitespace, WhitespaceType::Spaces);
        assert_eq!(config.indent_size, 4);
        assert_eq!(config.unit(), "    ");
        assert_eq!(config.unit_width(), 4);
    }

    #[test]
    fn test_builder_pattern() {
        let config = OutputConfig::new()
            .with_whitespace(WhitespaceType::Tabs)
            .with_indent_size(2);

        assert_eq!(config.unit(), "\t\t");
        assert_eq!(config.unit_width(), 8);
    }
}
