//! Custom scenario source
//!
//! A custom scenario supplies its own trial job and turns request based
//! objectives into metrics evaluated against the matching pods.

use super::{ExperimentSource, MetricSource, Selection};
use crate::application::{Application, CustomScenario, Objective, RequestsObjective};
use crate::error::Result;
use crate::label_selector::parse_label_selector;
use crate::models::{Experiment, Metric, ResourceTarget};
use crate::quantity::quantity_value;
use k8s_openapi::api::core::v1::{Container, PodSpec};

/// Memory weights are given per byte; the query works in gigabytes
const MEMORY_SCALE: f64 = 1_000_000_000.0;

#[derive(Debug, Clone)]
pub struct CustomSource {
    pub scenario: CustomScenario,
    /// Objectives of the application the scenario belongs to
    pub objectives: Vec<Objective>,
}

impl CustomSource {
    pub fn new(scenario: CustomScenario, objectives: Vec<Objective>) -> Self {
        Self {
            scenario,
            objectives,
        }
    }

    /// One source per custom scenario of the application
    pub fn from_application(application: &Application) -> Vec<Self> {
        application
            .scenarios
            .iter()
            .filter_map(|scenario| scenario.custom.clone())
            .map(|custom| Self::new(custom, application.objectives.clone()))
            .collect()
    }

    fn requests_metric(
        &self,
        objective: &Objective,
        requests: &RequestsObjective,
    ) -> Result<Metric> {
        let mut weights = Vec::with_capacity(requests.weights.len());
        for (resource, quantity) in &requests.weights {
            let mut weight = quantity_value(quantity)? as f64 / 1000.0;
            if resource == "memory" {
                weight /= MEMORY_SCALE;
            }
            weights.push(format!("{resource}={weight}"));
        }

        let query = format!("{{{{ resourceRequests .Target {:?} }}}}", weights.join(","));

        let mut metric = objective.new_metric(query);
        metric.target = Some(ResourceTarget {
            api_version: "v1".to_string(),
            kind: "PodList".to_string(),
            label_selector: Some(parse_label_selector(&requests.metric_selector)?),
        });
        Ok(metric)
    }
}

/// Derive a container name from its image reference
///
/// Uses the last path component of the image with any tag removed, e.g.
/// `example.com/load/runner:1.2` becomes `runner`.
pub fn container_name_from_image(image: &str) -> String {
    let name = image.rsplit('/').next().unwrap_or(image);
    match name.find(':') {
        Some(pos) if pos > 0 => name[..pos].to_string(),
        _ => name.to_string(),
    }
}

impl ExperimentSource for CustomSource {
    fn update(&self, experiment: &mut Experiment) -> Result<()> {
        let custom = &self.scenario;

        if let Some(template) = &custom.pod_template {
            *experiment.trial_job_pod_mut() = template.clone();
        }

        if custom.initial_delay_seconds > 0 {
            experiment.spec.trial_template.spec.initial_delay_seconds =
                custom.initial_delay_seconds;
        }

        if let Some(runtime) = &custom.approximate_runtime {
            experiment.spec.trial_template.spec.approximate_runtime = Some(runtime.clone());
        }

        if let Some(image) = custom.image.as_deref().filter(|i| !i.is_empty()) {
            let pod = experiment
                .trial_job_pod_mut()
                .spec
                .get_or_insert_with(PodSpec::default);
            if pod.containers.is_empty() {
                pod.containers.push(Container::default());
            }
            pod.containers[0].image = Some(image.to_string());
        }

        // Containers without a name would be rejected by the cluster
        if experiment.spec.trial_template.spec.job_template.is_some() {
            if let Some(pod) = experiment.trial_job_pod_mut().spec.as_mut() {
                for container in pod.containers.iter_mut().filter(|c| c.name.is_empty()) {
                    container.name =
                        container_name_from_image(container.image.as_deref().unwrap_or_default());
                }
            }
        }

        Ok(())
    }
}

impl MetricSource for CustomSource {
    fn metrics(&self) -> Result<Vec<Metric>> {
        let mut metrics = Vec::new();
        for objective in &self.objectives {
            if objective.implemented {
                continue;
            }
            if let Some(requests) = &objective.requests {
                // Push gateway scenarios report their own cost
                if self.scenario.enable_push_gateway {
                    continue;
                }
                metrics.push(self.requests_metric(objective, requests)?);
            }
        }
        Ok(metrics)
    }
}

impl Selection for CustomSource {
    fn as_experiment_source(&self) -> Option<&dyn ExperimentSource> {
        Some(self)
    }

    fn as_metric_source(&self) -> Option<&dyn MetricSource> {
        Some(self)
    }
}
