//! Structural merge of duplicate resources in a document stream

use crate::error::{GenerationError, Result};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

/// Identity of a resource document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResourceKey {
    api_version: String,
    kind: String,
    namespace: String,
    name: String,
}

impl ResourceKey {
    fn of(document: &Value) -> Result<Self> {
        let field = |value: Option<&Value>| {
            value.and_then(Value::as_str).unwrap_or_default().to_string()
        };

        let metadata = document
            .get("metadata")
            .filter(|m| m.is_mapping())
            .ok_or_else(|| GenerationError::Merge("resource has no metadata".to_string()))?;
        let name = field(metadata.get("name"));
        if name.is_empty() {
            return Err(GenerationError::Merge("resource has no name".to_string()));
        }

        Ok(Self {
            api_version: field(document.get("apiVersion")),
            kind: field(document.get("kind")),
            namespace: field(metadata.get("namespace")),
            name,
        })
    }
}

/// Collapse documents describing the same resource into one
///
/// Documents are identified by API version, kind, namespace and name. Later
/// occurrences are merged onto the first one, which keeps its position in the
/// stream. Merging an already merged stream returns it unchanged.
pub fn merge_resources(documents: Vec<Value>) -> Result<Vec<Value>> {
    let mut merged: Vec<Value> = Vec::with_capacity(documents.len());
    let mut positions: HashMap<ResourceKey, usize> = HashMap::new();

    for document in documents {
        let key = ResourceKey::of(&document)?;
        match positions.get(&key) {
            Some(&index) => merge_value(&mut merged[index], document),
            None => {
                positions.insert(key, merged.len());
                merged.push(document);
            }
        }
    }

    Ok(merged)
}

/// Merge `source` onto `target`
///
/// Mappings merge field by field and a null field removes the target field.
/// Lists whose entries are all mappings with a `name` merge entry by entry;
/// any other value replaces the target value.
fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Mapping(target), Value::Mapping(source)) => merge_mapping(target, source),
        (Value::Sequence(target), Value::Sequence(source))
            if is_keyed(target) && is_keyed(&source) =>
        {
            merge_keyed(target, source)
        }
        (target, source) => *target = source,
    }
}

const MERGE_KEY: &str = "name";

fn entry_name(item: &Value) -> Option<&str> {
    item.get(MERGE_KEY).and_then(Value::as_str)
}

fn is_keyed(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(|item| entry_name(item).is_some())
}

/// Merge source entries onto target entries with the same name, appending new ones
fn merge_keyed(target: &mut Vec<Value>, source: Vec<Value>) {
    for item in source {
        let existing = entry_name(&item)
            .and_then(|name| target.iter().position(|t| entry_name(t) == Some(name)));
        match existing {
            Some(index) => merge_value(&mut target[index], item),
            None => target.push(item),
        }
    }
}

fn merge_mapping(target: &mut Mapping, source: Mapping) {
    for (key, value) in source {
        if value.is_null() {
            target.remove(&key);
            continue;
        }
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(text: &str) -> Vec<Value> {
        text.split("\n---\n")
            .map(|d| serde_yaml::from_str(d).unwrap())
            .collect()
    }

    #[test]
    fn test_duplicates_merge_in_first_position() {
        let input = docs(
            "kind: ConfigMap\nmetadata: {name: a}\ndata: {x: '1', y: '1'}\n---\n\
             kind: Service\nmetadata: {name: b}\n---\n\
             kind: ConfigMap\nmetadata: {name: a}\ndata: {y: '2', z: '3'}",
        );

        let merged = merge_resources(input).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0]["kind"], Value::from("ConfigMap"));
        assert_eq!(merged[0]["data"]["x"], Value::from("1"));
        assert_eq!(merged[0]["data"]["y"], Value::from("2"));
        assert_eq!(merged[0]["data"]["z"], Value::from("3"));
        assert_eq!(merged[1]["kind"], Value::from("Service"));
    }

    #[test]
    fn test_namespaces_distinguish_resources() {
        let input = docs(
            "kind: ConfigMap\nmetadata: {name: a, namespace: one}\n---\n\
             kind: ConfigMap\nmetadata: {name: a, namespace: two}",
        );
        assert_eq!(merge_resources(input).unwrap().len(), 2);
    }

    #[test]
    fn test_null_removes_field() {
        let input = docs(
            "kind: ConfigMap\nmetadata: {name: a}\ndata: {x: '1'}\n---\n\
             kind: ConfigMap\nmetadata: {name: a}\ndata: {x: null}",
        );
        let merged = merge_resources(input).unwrap();
        assert!(merged[0]["data"].get("x").is_none());
    }

    #[test]
    fn test_containers_merge_by_name() {
        let input = docs(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata: {name: web}\n\
             spec: {template: {spec: {containers: [{name: app, image: shop-v1}]}}}\n---\n\
             apiVersion: apps/v1\nkind: Deployment\nmetadata: {name: web}\n\
             spec: {template: {spec: {containers: [{name: sidecar}, {name: app, image: shop-v2}]}}}",
        );

        let merged = merge_resources(input).unwrap();
        assert_eq!(merged.len(), 1);
        let containers = merged[0]["spec"]["template"]["spec"]["containers"]
            .as_sequence()
            .unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0]["name"], Value::from("app"));
        assert_eq!(containers[0]["image"], Value::from("shop-v2"));
        assert_eq!(containers[1]["name"], Value::from("sidecar"));
    }

    #[test]
    fn test_unkeyed_lists_are_replaced() {
        let input = docs(
            "kind: Service\nmetadata: {name: web}\nspec: {externalIPs: [10.0.0.1]}\n---\n\
             kind: Service\nmetadata: {name: web}\nspec: {externalIPs: [10.0.0.2]}",
        );
        let merged = merge_resources(input).unwrap();
        assert_eq!(
            merged[0]["spec"]["externalIPs"],
            serde_yaml::from_str::<Value>("[10.0.0.2]").unwrap()
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = docs(
            "kind: ConfigMap\nmetadata: {name: a}\ndata: {x: '1'}\n---\n\
             kind: ConfigMap\nmetadata: {name: a}\ndata: {y: '2'}",
        );
        let once = merge_resources(input).unwrap();
        let twice = merge_resources(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_metadata_fails() {
        let input = docs("kind: ConfigMap\ndata: {x: '1'}");
        assert!(matches!(merge_resources(input), Err(GenerationError::Merge(_))));
    }
}
