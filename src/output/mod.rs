//! Output stage: re-indentation and the diagnostic script

mod config;
mod indent;
mod script;

pub use config::{OutputConfig, WhitespaceType, TAB_WIDTH};
pub use indent::{normalize_line_endings, reindent};
pub use script::diagnostic_script;
