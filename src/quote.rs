//! Quoting and validation helpers for values spliced directly into SQL text

use crate::config::FormatterConfig;

/// Delimiters used when wrapping a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `[identifier]`
    Bracket,
    /// `'literal'`
    SingleQuote,
}

impl QuoteStyle {
    /// (prefix, suffix)
    pub fn delimiters(self) -> (char, char) {
        match self {
            QuoteStyle::Bracket => ('[', ']'),
            QuoteStyle::SingleQuote => ('\'', '\''),
        }
    }
}

/// Wrap `value` in the style's delimiters
///
/// Only the suffix is doubled inside the value: `[[A]` is the identifier `[A`,
/// and `'it''s'` is the literal `it's`.
pub fn quote(value: &str, style: QuoteStyle) -> String {
    let (prefix, suffix) = style.delimiters();
    let mut out = String::with_capacity(value.len() + 2);
    out.push(prefix);
    for c in value.chars() {
        if c == suffix {
            out.push(suffix);
        }
        out.push(c);
    }
    out.push(suffix);
    out
}

/// Check `name` against the active identifier pattern
pub fn is_valid_identifier(name: &str) -> bool {
    FormatterConfig::active().is_valid_identifier(name)
}

/// Check `path` against the active JSON path pattern
pub fn is_valid_json_path(path: &str) -> bool {
    FormatterConfig::active().is_valid_json_path(path)
}

/// Check `name` against the active SQL type pattern
pub fn is_valid_sql_type(name: &str) -> bool {
    FormatterConfig::active().is_valid_sql_type(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_quote_doubles_quotes() {
        assert_eq!(quote("it's", QuoteStyle::SingleQuote), "'it''s'");
        assert_eq!(quote("''", QuoteStyle::SingleQuote), "''''''");
    }

    #[test]
    fn test_bracket_doubles_only_suffix() {
        assert_eq!(quote("Users", QuoteStyle::Bracket), "[Users]");
        assert_eq!(quote("[A", QuoteStyle::Bracket), "[[A]");
        assert_eq!(quote("a]b", QuoteStyle::Bracket), "[a]]b]");
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(quote("", QuoteStyle::SingleQuote), "''");
        assert_eq!(quote("", QuoteStyle::Bracket), "[]");
    }

    #[test]
    fn test_predicates_use_default_patterns() {
        assert!(is_valid_identifier("Users"));
        assert!(is_valid_identifier("Order Date (UTC)"));
        assert!(!is_valid_identifier("Users; DROP TABLE Users"));
        assert!(!is_valid_identifier("a--b"));
        assert!(is_valid_json_path("$.items[0].\"name\""));
        assert!(!is_valid_json_path("$.a'; --"));
        assert!(is_valid_sql_type("NVARCHAR(max)"));
        assert!(!is_valid_sql_type("INT; DROP"));
    }
}
