//! Re-indentation of evaluated SQL
//!
//! Nested templates each assume their own left margin, so splicing them
//! together leaves indentation all over the place. This pass rescales every
//! line's indentation relative to the first line, so `8 -> 16 -> 24` becomes
//! `4 -> 8 -> 12`. It only fixes relative nesting depth; it does not
//! understand SQL.

use super::config::{OutputConfig, TAB_WIDTH};

/// Convert `\r\n` and lone `\r` into `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Width of a line's leading whitespace in columns
fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Re-indent `sql` onto the configured indent unit
pub fn reindent(sql: &str, output: &OutputConfig) -> String {
    let sql = normalize_line_endings(sql);
    let lines: Vec<&str> = sql
        .trim_end()
        .split('\n')
        .skip_while(|line| line.trim().is_empty())
        .collect();

    match lines.as_slice() {
        [] => return String::new(),
        [line] => return (*line).to_string(),
        _ => {}
    }

    let scale = indent_width(lines[0]);
    // Too shallow to rescale from; everything collapses to one level
    let threshold = output.unit_width().max(1);
    let unit = output.unit();

    lines
        .iter()
        .map(|line| {
            let indent = indent_width(line);
            let levels = if indent == 0 || scale < threshold {
                1
            } else {
                indent.div_ceil(scale)
            };
            format!("{}{}", unit.repeat(levels), line.trim_start())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
