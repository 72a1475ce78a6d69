//! Capability contracts for selections
//!
//! A selection is one contribution produced by the resource scanner. It may
//! implement any subset of the capabilities below; the transformer tests each
//! capability independently through the accessors on [`Selection`], so new
//! selection types never require changes to the transformer.

mod builtin;
mod container_resources;
mod custom;
mod datadog;
mod node;
mod replicas;

pub use builtin::BuiltinMetricSource;
pub use container_resources::ContainerResourcesParameter;
pub use custom::{container_name_from_image, CustomSource};
pub use datadog::DatadogSource;
pub use node::ParameterNode;
pub use replicas::ReplicaParameter;

use crate::application::Application;
use crate::error::Result;
use crate::models::{Experiment, Metric, Parameter, PatchType, ResourceReference};
use crate::naming::ParameterNamer;
use crate::patch::PatchFilter;
use serde_yaml::Value;

/// Free-form changes to the experiment (pod template, timing hints, ...)
///
/// Parameters, patches and metrics should be contributed through their own
/// capabilities instead.
pub trait ExperimentSource {
    fn update(&self, experiment: &mut Experiment) -> Result<()>;
}

/// Contributes parameters to the experiment
///
/// Patch sources should generally also be parameter sources so every value
/// referenced by a patch is configured on the experiment.
pub trait ParameterSource {
    fn parameters(&self, namer: &ParameterNamer) -> Result<Vec<Parameter>>;
}

/// Contributes one edit operation to the patch of a single resource
pub trait PatchSource {
    fn target_ref(&self) -> ResourceReference;

    fn patch(&self, namer: &ParameterNamer) -> Result<Box<dyn PatchFilter>>;

    /// Patch strategy required by this edit, if any
    fn patch_type(&self) -> Option<PatchType> {
        None
    }
}

/// Contributes metrics to the experiment
pub trait MetricSource {
    fn metrics(&self) -> Result<Vec<Metric>>;
}

/// Emits raw documents directly into the output stream
pub trait ResourceReader {
    fn read(&self) -> Result<Vec<Value>>;
}

/// One selection produced by the scanner
///
/// Every accessor defaults to `None`; implementations override the ones for
/// the capabilities they provide.
pub trait Selection {
    fn as_experiment_source(&self) -> Option<&dyn ExperimentSource> {
        None
    }

    fn as_parameter_source(&self) -> Option<&dyn ParameterSource> {
        None
    }

    fn as_patch_source(&self) -> Option<&dyn PatchSource> {
        None
    }

    fn as_metric_source(&self) -> Option<&dyn MetricSource> {
        None
    }

    fn as_resource_reader(&self) -> Option<&dyn ResourceReader> {
        None
    }

    /// Resource this selection is about, used for parameter naming
    fn target_ref(&self) -> Option<ResourceReference> {
        self.as_patch_source().map(|source| source.target_ref())
    }
}

/// Selections derived from the scenarios and objectives of an application
///
/// Custom scenarios become [`CustomSource`]s, objectives with a Datadog goal
/// become [`DatadogSource`]s and, if requested, the built-in metrics are added.
pub fn application_selections(
    application: &Application,
    builtin_metrics: bool,
) -> Vec<Box<dyn Selection>> {
    let mut selections: Vec<Box<dyn Selection>> = Vec::new();

    for source in CustomSource::from_application(application) {
        selections.push(Box::new(source));
    }
    for source in DatadogSource::from_application(application) {
        selections.push(Box::new(source));
    }
    if builtin_metrics {
        selections.push(Box::new(BuiltinMetricSource));
    }

    selections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{CustomScenario, DatadogGoal, Objective, Scenario};

    #[test]
    fn test_application_selections() {
        let app = Application {
            scenarios: vec![
                Scenario {
                    name: "custom".to_string(),
                    custom: Some(CustomScenario::default()),
                },
                Scenario {
                    name: "other".to_string(),
                    custom: None,
                },
            ],
            objectives: vec![Objective {
                name: "requests".to_string(),
                datadog: Some(DatadogGoal::default()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let selections = application_selections(&app, true);
        assert_eq!(selections.len(), 3);
        assert!(selections[0].as_experiment_source().is_some());
        assert!(selections[0].as_metric_source().is_some());
        assert!(selections[1].as_metric_source().is_some());
        assert!(selections[1].as_experiment_source().is_none());
        assert!(selections[2].as_metric_source().is_some());
        assert!(selections.iter().all(|s| s.target_ref().is_none()));
    }
}
