//! Human-readable `sp_executesql` script for a built command
//!
//! The script mirrors how the command would actually be executed, so it can
//! be pasted into a query window while debugging. It is not guaranteed to run
//! for every value type.

use crate::quote::{quote, QuoteStyle};
use crate::template::{Parameters, Value};

/// Storage type and literal for one bound value
fn declaration(value: &Value) -> (String, String) {
    match value {
        Value::Null => ("BIT".to_string(), "NULL".to_string()),
        Value::Text(s) => (
            format!("NVARCHAR({})", s.chars().count().max(1)),
            format!("N{}", quote(s, QuoteStyle::SingleQuote)),
        ),
        Value::Date(d) => (
            "DATETIME2".to_string(),
            format!("'{}'", d.format("%Y-%m-%d")),
        ),
        // TODO: emit the time component instead of truncating to the date
        Value::DateTime(dt) => (
            "DATETIME2".to_string(),
            format!("'{}'", dt.date().format("%Y-%m-%d")),
        ),
        Value::Int(i) => {
            let sql_type = if i32::try_from(*i).is_ok() { "INT" } else { "BIGINT" };
            (sql_type.to_string(), i.to_string())
        }
        other => {
            let text = other.to_string();
            (format!("NVARCHAR({})", text.chars().count().max(1)), text)
        }
    }
}

/// Render `sql` and its parameters as a `DECLARE`/`EXEC sp_executesql` script
pub fn diagnostic_script(sql: &str, parameters: &Parameters) -> String {
    let mut types = Vec::with_capacity(parameters.len());
    let mut values = String::new();
    for (name, value) in parameters.iter() {
        let (sql_type, literal) = declaration(value);
        types.push(format!("{} {}", name, sql_type));
        values.push_str(&format!(", {}={}", name, literal));
    }

    format!(
        "DECLARE @SQL NVARCHAR(MAX) = {}\nEXEC sp_executesql @SQL, N'{}'{}",
        quote(sql, QuoteStyle::SingleQuote),
        types.join(", "),
        values
    )
}
