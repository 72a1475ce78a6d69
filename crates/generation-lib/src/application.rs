//! Application description supplied by users
//!
//! An application names where its resources come from, the scenarios used to
//! put it under load and the objectives to optimize for. Scenarios and
//! objectives feed the metric sources of the generation pipeline.

use crate::models::Metric;
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Locations of the application resources, in the same format Kustomize uses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<Scenario>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<Objective>,
}

impl Application {
    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// A way of putting the application under load during a trial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomScenario>,
}

/// A user supplied trial job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomScenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplateSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub initial_delay_seconds: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_runtime: Option<String>,
    /// Metrics are pushed by the trial job rather than synthesized
    #[serde(default)]
    pub enable_push_gateway: bool,
}

/// Something to optimize for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub name: String,
    /// Maximize instead of minimize
    #[serde(default)]
    pub max: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize: Option<bool>,
    /// Already backed by a metric supplied elsewhere; nothing to synthesize
    #[serde(default)]
    pub implemented: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<RequestsObjective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datadog: Option<DatadogGoal>,
}

impl Objective {
    /// Start a metric for this objective using the supplied query
    pub fn new_metric(&self, query: impl Into<String>) -> Metric {
        Metric {
            name: self.name.clone(),
            minimize: !self.max,
            optimize: self.optimize,
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Cost expressed as weighted resource requests of the matching pods
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestsObjective {
    /// Label selector of the pods whose requests are summed
    #[serde(default)]
    pub metric_selector: String,
    /// Per-resource weights
    #[serde(default)]
    pub weights: BTreeMap<String, Quantity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatadogGoal {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<String>,
    #[serde(default)]
    pub maximize: bool,
}
