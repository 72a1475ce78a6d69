//! Experiment generation command

use anyhow::{Context, Result};
use clap::Args;
use generation_lib::stream::parse_yaml_stream;
use generation_lib::{application_selections, Application, Transformer};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::GeneratorConfig;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Application definition (YAML)
    #[arg(long, short = 'f')]
    pub application: PathBuf,

    /// Scanned application resources (multi-document YAML)
    #[arg(long, short)]
    pub resources: Option<PathBuf>,

    /// Experiment name, overrides the application name
    #[arg(long)]
    pub name: Option<String>,

    /// Merge duplicate resources in the generated stream
    #[arg(long)]
    pub merge_generated: bool,

    /// Append the scanned resources to the output
    #[arg(long)]
    pub include_resources: bool,

    /// Add the built-in Prometheus metrics
    #[arg(long)]
    pub builtin_metrics: bool,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value = "yaml")]
    pub format: OutputFormat,

    /// Write to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Generate the experiment and write the output stream
pub fn run(args: &GenerateArgs, config: &GeneratorConfig) -> Result<()> {
    let documents = generate_documents(args, config)?;
    let text = output::render(&documents, args.format, config.generated_by.as_deref())?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::print_success(&format!(
                "Wrote {} documents to {}",
                documents.len(),
                path.display()
            ));
        }
        None => print!("{text}"),
    }

    Ok(())
}

/// Build the output documents for an application
pub fn generate_documents(args: &GenerateArgs, config: &GeneratorConfig) -> Result<Vec<Value>> {
    let application = read_application(&args.application)?;
    let scanned = match &args.resources {
        Some(path) => read_resources(path)?,
        None => Vec::new(),
    };

    let name = args
        .name
        .clone()
        .or_else(|| application.name().map(str::to_string))
        .unwrap_or_else(|| config.default_experiment_name.clone());

    let transformer = Transformer {
        default_experiment_name: name,
        merge_generated: args.merge_generated || config.merge_generated,
        include_application_resources: args.include_resources
            || config.include_application_resources,
    };

    let selections =
        application_selections(&application, args.builtin_metrics || config.builtin_metrics);
    info!(
        selections = selections.len(),
        scanned = scanned.len(),
        "Generating experiment"
    );

    transformer
        .filter(&scanned, &selections)
        .context("Failed to generate experiment")
}

fn read_application(path: &Path) -> Result<Application> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read application {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("Failed to parse application {}", path.display()))
}

fn read_resources(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resources {}", path.display()))?;
    parse_yaml_stream(&text)
        .with_context(|| format!("Failed to parse resources {}", path.display()))
}
