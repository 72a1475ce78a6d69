//! Experiment data model produced by the generation pipeline

use k8s_openapi::api::batch::v1::{JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// API version of generated experiments
pub const EXPERIMENT_API_VERSION: &str = "redskyops.dev/v1beta1";

/// Kind of generated experiments
pub const EXPERIMENT_KIND: &str = "Experiment";

/// The generation target: parameters, metrics and patches of an optimization experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ExperimentSpec,
}

impl Experiment {
    /// Create an empty experiment
    pub fn new() -> Self {
        Self {
            api_version: EXPERIMENT_API_VERSION.to_string(),
            kind: EXPERIMENT_KIND.to_string(),
            metadata: ObjectMeta::default(),
            spec: ExperimentSpec::default(),
        }
    }

    /// Name of the experiment, empty if not yet assigned
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.metadata.name = Some(name.into());
    }

    /// Pod template of the trial job, created on demand
    pub fn trial_job_pod_mut(&mut self) -> &mut PodTemplateSpec {
        let job = self
            .spec
            .trial_template
            .spec
            .job_template
            .get_or_insert_with(JobTemplateSpec::default);
        &mut job.spec.get_or_insert_with(JobSpec::default).template
    }
}

impl Default for Experiment {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSpec {
    /// Optimization directives passed through to the optimizer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optimization: Vec<Optimization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<PatchTemplate>,
    #[serde(default, skip_serializing_if = "TrialTemplateSpec::is_empty")]
    pub trial_template: TrialTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialTemplateSpec {
    #[serde(default)]
    pub spec: TrialSpec,
}

impl TrialTemplateSpec {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_template: Option<JobTemplateSpec>,
    /// Seconds to wait after the patches are applied before starting the trial job
    #[serde(default, skip_serializing_if = "is_zero")]
    pub initial_delay_seconds: i32,
    /// Hint for how long a trial is expected to run (e.g. "5m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_runtime: Option<String>,
}

/// A tunable parameter of the experiment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub min: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<IntOrString>,
    /// Categorical values, used instead of the numeric bounds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// How a metric value is collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Kubernetes,
    Prometheus,
    Datadog,
    JsonPath,
    BuiltIn,
}

/// A measured outcome of each trial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub minimize: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<MetricType>,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Cluster objects to evaluate the query against instead of a URL host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ResourceTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTarget {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
}

/// Patch strategy applied to a target resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchType {
    Json,
    Merge,
    Strategic,
}

impl fmt::Display for PatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchType::Json => write!(f, "json"),
            PatchType::Merge => write!(f, "merge"),
            PatchType::Strategic => write!(f, "strategic"),
        }
    }
}

/// A patch body template bound to one target resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTemplate {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,
    /// Template text; not valid YAML until trial values are substituted
    pub patch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<ResourceReference>,
}

/// Identity of a Kubernetes resource targeted by a patch
///
/// Ordered by kind, namespace, name and finally API version so that
/// aggregations keyed by reference flatten deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub name: String,
}

impl ResourceReference {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            namespace: String::new(),
            name: name.into(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

impl Ord for ResourceReference {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.kind, &self.namespace, &self.name, &self.api_version).cmp(&(
            &other.kind,
            &other.namespace,
            &other.name,
            &other.api_version,
        ))
    }
}

impl PartialOrd for ResourceReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}/{}", self.kind, self.name)
        } else {
            write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
        }
    }
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_sort_by_kind_namespace_name() {
        let mut refs = vec![
            ResourceReference::new("apps/v1", "StatefulSet", "db"),
            ResourceReference::new("apps/v1", "Deployment", "web").with_namespace("b"),
            ResourceReference::new("apps/v1", "Deployment", "api").with_namespace("b"),
            ResourceReference::new("apps/v1", "Deployment", "zeta").with_namespace("a"),
        ];
        refs.sort();

        let names: Vec<String> = refs.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "Deployment/a/zeta",
                "Deployment/b/api",
                "Deployment/b/web",
                "StatefulSet/db"
            ]
        );
    }

    #[test]
    fn test_empty_experiment_serialization() {
        let mut exp = Experiment::new();
        exp.set_name("sample");

        let yaml = serde_yaml::to_string(&exp).unwrap();
        assert!(yaml.contains("apiVersion: redskyops.dev/v1beta1"));
        assert!(yaml.contains("kind: Experiment"));
        assert!(yaml.contains("name: sample"));
        assert!(!yaml.contains("parameters"));
        assert!(!yaml.contains("trialTemplate"));
    }

    #[test]
    fn test_metric_type_serialization() {
        let metric = Metric {
            name: "cost".to_string(),
            minimize: true,
            metric_type: Some(MetricType::BuiltIn),
            query: "up".to_string(),
            ..Default::default()
        };

        let yaml = serde_yaml::to_string(&metric).unwrap();
        assert!(yaml.contains("type: builtin"));
        assert!(yaml.contains("minimize: true"));
        assert!(!yaml.contains("url"));
    }

    #[test]
    fn test_trial_job_pod_created_on_demand() {
        let mut exp = Experiment::new();
        exp.trial_job_pod_mut().metadata = Some(ObjectMeta {
            name: Some("trial".to_string()),
            ..Default::default()
        });

        let job = exp.spec.trial_template.spec.job_template.as_ref().unwrap();
        let pod = &job.spec.as_ref().unwrap().template;
        assert_eq!(pod.metadata.as_ref().unwrap().name.as_deref(), Some("trial"));
    }
}
