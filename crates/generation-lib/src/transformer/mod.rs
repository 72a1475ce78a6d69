//! Experiment generation
//!
//! The transformer makes one pass over the selections produced by the scanner
//! and, for every capability a selection provides, collects its contribution
//! into a single experiment:
//!
//! 1. experiment updates
//! 2. parameters
//! 3. patch edits, grouped by target resource
//! 4. metrics
//! 5. raw documents for the output stream
//!
//! Any failing contribution aborts the pass. Accumulated patch edits are
//! rendered into one patch template per target once every selection has been
//! visited.


use crate::error::Result;
use crate::models::Experiment;
use crate::naming::ParameterNamer;
use crate::observability::{Capability, GenerationMetrics, StructuredLogger};
use crate::patch::PatchRenderer;
use crate::source::Selection;
use crate::stream::{annotate_unmanaged, merge_resources};
use serde_yaml::Value;
use std::time::Instant;
use tracing::{debug, info};

/// Name given to experiments nobody named
pub const DEFAULT_EXPERIMENT_NAME: &str = "experiment";

/// Result of one generation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub experiment: Experiment,
    /// Documents contributed directly by selections, in contribution order
    pub resources: Vec<Value>,
}

/// Converts scanner selections into an experiment and its output stream
#[derive(Debug, Clone)]
pub struct Transformer {
    /// Name used when no contribution names the experiment
    pub default_experiment_name: String,
    /// Collapse duplicate resources in the generated stream
    pub merge_generated: bool,
    /// Append the scanned resources, marked unmanaged, after the generated ones
    pub include_application_resources: bool,
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            default_experiment_name: DEFAULT_EXPERIMENT_NAME.to_string(),
            merge_generated: false,
            include_application_resources: false,
        }
    }
}

impl Transformer {
    pub fn new(default_experiment_name: impl Into<String>) -> Self {
        Self {
            default_experiment_name: default_experiment_name.into(),
            ..Default::default()
        }
    }

    /// Build the experiment from the selections
    pub fn generate(&self, selections: &[Box<dyn Selection>]) -> Result<Generation> {
        let metrics = GenerationMetrics::new();
        let start = Instant::now();

        let result = self.collect(selections, &metrics);
        match &result {
            Ok(generation) => {
                let spec = &generation.experiment.spec;
                metrics.observe_generation(
                    start.elapsed().as_secs_f64(),
                    spec.parameters.len(),
                    spec.metrics.len(),
                    spec.patches.len(),
                );
                StructuredLogger::new().log_generated(
                    generation.experiment.name(),
                    spec.parameters.len(),
                    spec.metrics.len(),
                    spec.patches.len(),
                    generation.resources.len(),
                );
            }
            Err(e) => {
                metrics.inc_generation_failures();
                StructuredLogger::new().log_failure("generate", e);
            }
        }
        result
    }

    fn collect(
        &self,
        selections: &[Box<dyn Selection>],
        metrics: &GenerationMetrics,
    ) -> Result<Generation> {
        // Names depend on everything that was selected, not just one selection
        let namer = ParameterNamer::from_selections(selections);

        let mut experiment = Experiment::new();
        let mut renderer = PatchRenderer::new();
        let mut resources = Vec::new();

        for (index, selection) in selections.iter().enumerate() {
            if let Some(source) = selection.as_experiment_source() {
                source.update(&mut experiment)?;
                metrics.add_contributions(Capability::Experiment, 1);
            }

            if let Some(source) = selection.as_parameter_source() {
                let parameters = source.parameters(&namer)?;
                debug!(selection = index, count = parameters.len(), "Collected parameters");
                metrics.add_contributions(Capability::Parameter, parameters.len());
                experiment.spec.parameters.extend(parameters);
            }

            if let Some(source) = selection.as_patch_source() {
                let target = source.target_ref();
                let filter = source.patch(&namer)?;
                debug!(selection = index, target = %target, "Collected patch edit");
                renderer.add(target, source.patch_type(), filter)?;
                metrics.add_contributions(Capability::Patch, 1);
            }

            if let Some(source) = selection.as_metric_source() {
                let collected = source.metrics()?;
                debug!(selection = index, count = collected.len(), "Collected metrics");
                metrics.add_contributions(Capability::Metric, collected.len());
                experiment.spec.metrics.extend(collected);
            }

            if let Some(reader) = selection.as_resource_reader() {
                let documents = reader.read()?;
                metrics.add_contributions(Capability::Resource, documents.len());
                resources.extend(documents);
            }
        }

        experiment.spec.patches.extend(renderer.render()?);

        if experiment.name().is_empty() {
            experiment.set_name(self.default_experiment_name.clone());
        }

        Ok(Generation {
            experiment,
            resources,
        })
    }

    /// Produce the complete output stream
    ///
    /// The experiment is always the first document, followed by the documents
    /// contributed by selections. `scanned` holds the application resources the
    /// selections were derived from; they are only emitted when
    /// `include_application_resources` is set.
    pub fn filter(
        &self,
        scanned: &[Value],
        selections: &[Box<dyn Selection>],
    ) -> Result<Vec<Value>> {
        let generation = self.generate(selections)?;

        let mut result = Vec::with_capacity(1 + generation.resources.len());
        result.push(serde_yaml::to_value(&generation.experiment)?);
        result.extend(generation.resources);

        if self.merge_generated {
            // Unmergeable streams are emitted as they are
            match merge_resources(result.clone()) {
                Ok(merged) => result = merged,
                Err(e) => {
                    GenerationMetrics::new().inc_merge_fallbacks();
                    StructuredLogger::new().log_merge_fallback(result.len(), &e);
                }
            }
        }

        if self.include_application_resources {
            let mut application = scanned.to_vec();
            annotate_unmanaged(&mut application)?;
            result.extend(application);
        }

        info!(documents = result.len(), "Generated output stream");
        Ok(result)
    }
}
