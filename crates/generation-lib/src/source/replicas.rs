//! Replica count parameter

use super::{ParameterNode, ParameterSource, PatchSource, Selection};
use crate::error::Result;
use crate::models::{Parameter, ResourceReference};
use crate::naming::ParameterNamer;
use crate::patch::{int_placeholder, PatchFilter, SetField};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// Lowest replica count offered to the optimizer
pub const MIN_REPLICAS: i32 = 1;

/// Highest replica count offered unless the current value is larger
pub const MAX_REPLICAS: i32 = 5;

/// Parameterizes the replica count of a scalable resource
///
/// The node's field path points at the replica field itself (e.g. `spec/replicas`).
#[derive(Debug, Clone)]
pub struct ReplicaParameter {
    pub node: ParameterNode,
}

impl ReplicaParameter {
    pub fn new(node: ParameterNode) -> Self {
        Self { node }
    }

    fn parameter_name(&self, namer: &ParameterNamer) -> String {
        namer.name(&self.node.target, &self.node.field_path, "replicas")
    }

    fn current_replicas(&self) -> Option<i32> {
        self.node
            .value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .filter(|v| *v > 0)
    }
}

impl ParameterSource for ReplicaParameter {
    fn parameters(&self, namer: &ParameterNamer) -> Result<Vec<Parameter>> {
        let baseline = self.current_replicas();
        let max = baseline.map_or(MAX_REPLICAS, |b| b.max(MAX_REPLICAS));

        Ok(vec![Parameter {
            name: self.parameter_name(namer),
            min: MIN_REPLICAS,
            max,
            baseline: baseline.map(IntOrString::Int),
            ..Default::default()
        }])
    }
}

impl PatchSource for ReplicaParameter {
    fn target_ref(&self) -> ResourceReference {
        self.node.target.clone()
    }

    fn patch(&self, namer: &ParameterNamer) -> Result<Box<dyn PatchFilter>> {
        let value = int_placeholder(format!("{{{{ .Values.{} }}}}", self.parameter_name(namer)));
        Ok(Box::new(SetField::new(&self.node.field_path, value)?))
    }
}

impl Selection for ReplicaParameter {
    fn as_parameter_source(&self) -> Option<&dyn ParameterSource> {
        Some(self)
    }

    fn as_patch_source(&self) -> Option<&dyn PatchSource> {
        Some(self)
    }
}
