//! Container CPU and memory parameters

use super::{ParameterNode, ParameterSource, PatchSource, Selection};
use crate::error::Result;
use crate::models::{Parameter, ResourceReference};
use crate::naming::ParameterNamer;
use crate::patch::{Chain, PatchFilter, SetField};
use crate::quantity::{quantity_milli_value, quantity_value};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde_yaml::{Mapping, Value};

/// CPU bounds in millicores
const CPU_BOUNDS: (i32, i32) = (100, 4000);

/// Memory bounds in mebibytes
const MEMORY_BOUNDS: (i32, i32) = (128, 4096);

const MEBIBYTE: i64 = 1024 * 1024;

/// Parameterizes the CPU and memory of one container
///
/// The node's field path points at the container's `resources` field, for
/// example `spec/template/spec/containers/[name=app]/resources`, and its value
/// is the current resources block. Limits and requests are patched to the
/// same value.
#[derive(Debug, Clone)]
pub struct ContainerResourcesParameter {
    pub node: ParameterNode,
}

impl ContainerResourcesParameter {
    pub fn new(node: ParameterNode) -> Self {
        Self { node }
    }

    fn names(&self, namer: &ParameterNamer) -> (String, String) {
        (
            namer.name(&self.node.target, &self.node.field_path, "cpu"),
            namer.name(&self.node.target, &self.node.field_path, "memory"),
        )
    }

    /// Current value of a resource, preferring limits over requests
    fn current(&self, resource: &str) -> Option<Quantity> {
        ["limits", "requests"].iter().find_map(|section| {
            self.node
                .value
                .get(section)
                .and_then(|s| s.get(resource))
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .map(Quantity)
        })
    }

    fn current_cpu_millis(&self) -> Result<Option<i32>> {
        self.current("cpu")
            .map(|q| quantity_milli_value(&q).map(clamp_i32))
            .transpose()
    }

    fn current_memory_mebibytes(&self) -> Result<Option<i32>> {
        self.current("memory")
            .map(|q| quantity_value(&q).map(|v| clamp_i32((v + MEBIBYTE - 1) / MEBIBYTE)))
            .transpose()
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(0, i32::MAX as i64) as i32
}

fn bounded(name: String, bounds: (i32, i32), baseline: Option<i32>) -> Parameter {
    let (mut min, mut max) = bounds;
    if let Some(b) = baseline.filter(|b| *b > 0) {
        min = min.min(b);
        max = max.max(b);
    }
    Parameter {
        name,
        min,
        max,
        baseline: baseline.filter(|b| *b > 0).map(IntOrString::Int),
        ..Default::default()
    }
}

impl ParameterSource for ContainerResourcesParameter {
    fn parameters(&self, namer: &ParameterNamer) -> Result<Vec<Parameter>> {
        let (cpu, memory) = self.names(namer);
        Ok(vec![
            bounded(cpu, CPU_BOUNDS, self.current_cpu_millis()?),
            bounded(memory, MEMORY_BOUNDS, self.current_memory_mebibytes()?),
        ])
    }
}

impl PatchSource for ContainerResourcesParameter {
    fn target_ref(&self) -> ResourceReference {
        self.node.target.clone()
    }

    fn patch(&self, namer: &ParameterNamer) -> Result<Box<dyn PatchFilter>> {
        let (cpu, memory) = self.names(namer);

        let mut values = Mapping::new();
        values.insert(
            Value::from("cpu"),
            Value::String(format!("{{{{ .Values.{cpu} }}}}m")),
        );
        values.insert(
            Value::from("memory"),
            Value::String(format!("{{{{ .Values.{memory} }}}}Mi")),
        );
        let values = Value::Mapping(values);

        Ok(Box::new(Chain(vec![
            Box::new(SetField::new(&self.node.child_path(&["limits"]), values.clone())?),
            Box::new(SetField::new(&self.node.child_path(&["requests"]), values)?),
        ])))
    }
}

impl Selection for ContainerResourcesParameter {
    fn as_parameter_source(&self) -> Option<&dyn ParameterSource> {
        Some(self)
    }

    fn as_patch_source(&self) -> Option<&dyn PatchSource> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::render_patch;

    fn resources(current: &str) -> ContainerResourcesParameter {
        ContainerResourcesParameter::new(ParameterNode::new(
            ResourceReference::new("apps/v1", "Deployment", "web"),
            ["spec", "template", "spec", "containers", "[name=app]", "resources"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            serde_yaml::from_str(current).unwrap(),
        ))
    }

    #[test]
    fn test_parameters_use_current_limits() {
        let selection = resources("{limits: {cpu: 500m, memory: 256Mi}, requests: {cpu: 100m}}");
        let namer = ParameterNamer::new([&selection.node.target]);
        let params = selection.parameters(&namer).unwrap();

        assert_eq!(params[0].name, "cpu");
        assert_eq!(params[0].baseline, Some(IntOrString::Int(500)));
        assert_eq!((params[0].min, params[0].max), CPU_BOUNDS);
        assert_eq!(params[1].name, "memory");
        assert_eq!(params[1].baseline, Some(IntOrString::Int(256)));
    }

    #[test]
    fn test_baseline_outside_bounds_widens_them() {
        let selection = resources("{requests: {cpu: 8, memory: 64Mi}}");
        let namer = ParameterNamer::default();
        let params = selection.parameters(&namer).unwrap();

        assert_eq!(params[0].max, 8000);
        assert_eq!(params[1].min, 64);
    }

    #[test]
    fn test_missing_resources_have_no_baseline() {
        let selection = resources("{}");
        let params = selection.parameters(&ParameterNamer::default()).unwrap();
        assert!(params.iter().all(|p| p.baseline.is_none()));
    }

    #[test]
    fn test_invalid_quantity_fails() {
        let selection = resources("{limits: {cpu: lots}}");
        assert!(selection.parameters(&ParameterNamer::default()).is_err());
    }

    #[test]
    fn test_patch_sets_limits_and_requests() {
        let selection = resources("{}");
        let namer = ParameterNamer::new([&selection.node.target]);
        let patch = render_patch(&[selection.patch(&namer).unwrap()]).unwrap();
        let doc: Value = serde_yaml::from_str(&patch).unwrap();

        let container = &doc["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(container["name"], Value::from("app"));
        assert_eq!(
            container["resources"]["limits"]["cpu"],
            Value::from("{{ .Values.cpu }}m")
        );
        assert_eq!(
            container["resources"]["requests"]["memory"],
            Value::from("{{ .Values.memory }}Mi")
        );
    }
}
