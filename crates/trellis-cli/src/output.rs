//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

/// One row of a printed component tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Distance from the root.
    pub depth: usize,
    /// Local name.
    pub name: String,
    /// Component class.
    pub class_name: String,
    /// Whether the component is materialized.
    pub loaded: bool,
}

/// Renders tree rows as an indented listing, two spaces per level.
#[must_use]
pub fn render_tree(lines: &[TreeLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let marker = if line.loaded { "" } else { " (lazy)" };
        let _ = writeln!(
            out,
            "{:indent$}{}: {}{marker}",
            "",
            line.name,
            line.class_name,
            indent = line.depth * 2
        );
    }
    out
}

/// Parses a parameter argument: JSON when it parses, a string otherwise.
#[must_use]
pub fn parse_params(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Prints a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
