//! Location and current state of a value to parameterize

use crate::models::ResourceReference;
use serde_yaml::Value;

/// Something to parameterize inside an application resource
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterNode {
    /// Resource containing the value
    pub target: ResourceReference,
    /// Path from the resource root to the value
    pub field_path: Vec<String>,
    /// Current value found by the scan
    pub value: Value,
}

impl ParameterNode {
    pub fn new(target: ResourceReference, field_path: Vec<String>, value: Value) -> Self {
        Self {
            target,
            field_path,
            value,
        }
    }

    /// Field path extended by additional segments
    pub fn child_path(&self, segments: &[&str]) -> Vec<String> {
        self.field_path
            .iter()
            .cloned()
            .chain(segments.iter().map(|s| s.to_string()))
            .collect()
    }
}
