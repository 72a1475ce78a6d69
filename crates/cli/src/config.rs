//! Configuration management for the CLI

use anyhow::{Context, Result};
use generation_lib::DEFAULT_EXPERIMENT_NAME;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Generator configuration
///
/// Read from an optional YAML file, then overridden by `OPTIMIZE_*`
/// environment variables (e.g. `OPTIMIZE_MERGE_GENERATED=true`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorConfig {
    /// Name of the experiment when neither the command line nor the application names it
    #[serde(default = "default_experiment_name")]
    pub default_experiment_name: String,

    /// Collapse duplicate resources in the generated stream
    #[serde(default)]
    pub merge_generated: bool,

    /// Append the scanned application resources to the output
    #[serde(default)]
    pub include_application_resources: bool,

    /// Add the built-in Prometheus metrics to every experiment
    #[serde(default)]
    pub builtin_metrics: bool,

    /// Comment written at the top of generated YAML
    #[serde(default)]
    pub generated_by: Option<String>,
}

fn default_experiment_name() -> String {
    DEFAULT_EXPERIMENT_NAME.to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_experiment_name: default_experiment_name(),
            merge_generated: false,
            include_application_resources: false,
            builtin_metrics: false,
            generated_by: None,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration
    ///
    /// An explicit path must exist; otherwise the file in the user's
    /// configuration directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = Self::config_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let config = builder
            .add_source(config::Environment::with_prefix("OPTIMIZE").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Default configuration file location
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("optimize").join("config.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.default_experiment_name, "experiment");
        assert!(!config.merge_generated);
        assert!(config.generated_by.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "default_experiment_name: nightly\nmerge_generated: true\ngenerated_by: optimize-gen generate"
        )
        .unwrap();

        let config = GeneratorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.default_experiment_name, "nightly");
        assert!(config.merge_generated);
        assert!(!config.include_application_resources);
        assert_eq!(config.generated_by.as_deref(), Some("optimize-gen generate"));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(GeneratorConfig::load(Some(&missing)).is_err());
    }
}
