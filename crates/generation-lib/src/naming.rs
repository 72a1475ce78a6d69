//! Parameter name disambiguation
//!
//! Parameter names start as the bare leaf field name and only grow a kind,
//! resource name or list-entry prefix when the set of targeted resources makes
//! the shorter form ambiguous.

use crate::models::ResourceReference;
use crate::patch::split_index_name_value;
use crate::source::Selection;
use std::collections::HashMap;

/// Computes parameter names based on everything the scan selected
#[derive(Debug, Clone, Default)]
pub struct ParameterNamer {
    /// Number of selections per kind and name
    targets: HashMap<String, HashMap<String, usize>>,
    needs_kind: bool,
    needs_name: bool,
}

impl ParameterNamer {
    /// Index the targeted resources by kind and name
    pub fn new<'a>(targets: impl IntoIterator<Item = &'a ResourceReference>) -> Self {
        let mut counts: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for target in targets {
            *counts
                .entry(target.kind.clone())
                .or_default()
                .entry(target.name.clone())
                .or_default() += 1;
        }

        let needs_kind = counts.len() > 1;
        let needs_name = counts.values().any(|names| names.len() > 1);

        Self {
            targets: counts,
            needs_kind,
            needs_name,
        }
    }

    /// Build a namer from the target references of the selections
    pub fn from_selections(selections: &[Box<dyn Selection>]) -> Self {
        let targets: Vec<ResourceReference> =
            selections.iter().filter_map(|s| s.target_ref()).collect();
        Self::new(&targets)
    }

    /// Compute the parameter name for a field of a resource
    ///
    /// * `target` - The resource the field belongs to
    /// * `field_path` - Path to the field; keyed list entries contribute their value
    ///   when the same resource was selected more than once
    /// * `leaf` - Name of the value being parameterized (e.g. "cpu")
    pub fn name(&self, target: &ResourceReference, field_path: &[String], leaf: &str) -> String {
        let mut parts: Vec<String> = Vec::new();

        if self.needs_kind {
            parts.push(target.kind.to_lowercase());
        }

        if self.needs_name {
            parts.extend(target.name.split('-').map(str::to_string));
        }

        if self.selection_count(target) > 1 {
            for segment in field_path {
                if let Some((_, value)) = split_index_name_value(segment) {
                    if !value.is_empty() {
                        parts.push(value.to_string());
                    }
                }
            }
        }

        parts.push(leaf.to_string());
        parts.join("_")
    }

    fn selection_count(&self, target: &ResourceReference) -> usize {
        self.targets
            .get(&target.kind)
            .and_then(|names| names.get(&target.name))
            .copied()
            .unwrap_or_default()
    }
}
