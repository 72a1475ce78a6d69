//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use generation_lib::stream::write_yaml_stream;
use serde_json::json;
use serde_yaml::Value;

/// Output format for generated documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Multi-document YAML stream (default)
    #[default]
    Yaml,
    /// A single JSON `List` wrapping every document
    Json,
}

/// Render documents in the requested format
///
/// The header only applies to YAML, JSON has no comments.
pub fn render(documents: &[Value], format: OutputFormat, header: Option<&str>) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            write_yaml_stream(documents, header).context("Failed to serialize YAML output")
        }
        OutputFormat::Json => {
            let items = serde_json::to_value(documents)
                .context("Documents cannot be represented as JSON")?;
            let list = json!({
                "apiVersion": "v1",
                "kind": "List",
                "items": items,
            });
            let mut text =
                serde_json::to_string_pretty(&list).context("Failed to serialize JSON output")?;
            text.push('\n');
            Ok(text)
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}
