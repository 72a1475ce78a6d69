//! Marking re-emitted resources as unmanaged

use crate::error::{GenerationError, Result};
use serde_yaml::{Mapping, Value};

/// Annotation telling downstream tooling how to treat a resource's formatting
pub const FORMATTING_ANNOTATION: &str = "config.kubernetes.io/formatting";

/// Leave the resource exactly as written
pub const FORMATTING_NONE: &str = "none";

/// Annotate every document so downstream tooling does not reformat it
///
/// Fails on the first document that is not a resource mapping.
pub fn annotate_unmanaged(documents: &mut [Value]) -> Result<()> {
    for (index, document) in documents.iter_mut().enumerate() {
        let invalid =
            |problem: &str| GenerationError::Annotation(format!("document {index} {problem}"));

        let resource = document
            .as_mapping_mut()
            .ok_or_else(|| invalid("is not a mapping"))?;
        let metadata =
            child_mapping(resource, "metadata").ok_or_else(|| invalid("has invalid metadata"))?;
        let annotations = child_mapping(metadata, "annotations")
            .ok_or_else(|| invalid("has invalid annotations"))?;

        annotations.insert(Value::from(FORMATTING_ANNOTATION), Value::from(FORMATTING_NONE));
    }
    Ok(())
}

/// Mapping stored under `key`, created when absent or null
fn child_mapping<'a>(parent: &'a mut Mapping, key: &str) -> Option<&'a mut Mapping> {
    let entry = parent
        .entry(Value::from(key))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if entry.is_null() {
        *entry = Value::Mapping(Mapping::new());
    }
    entry.as_mapping_mut()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotates_resources() {
        let mut docs: Vec<Value> = vec![
            serde_yaml::from_str("kind: Deployment\nmetadata: {name: web}").unwrap(),
            serde_yaml::from_str(
                "kind: Service\nmetadata: {name: web, annotations: {team: shop}}",
            )
            .unwrap(),
        ];

        annotate_unmanaged(&mut docs).unwrap();

        for doc in &docs {
            assert_eq!(
                doc["metadata"]["annotations"][FORMATTING_ANNOTATION],
                Value::from("none")
            );
        }
        assert_eq!(docs[1]["metadata"]["annotations"]["team"], Value::from("shop"));
    }

    #[test]
    fn test_missing_metadata_is_created() {
        let mut docs = vec![serde_yaml::from_str::<Value>("kind: ConfigMap").unwrap()];
        annotate_unmanaged(&mut docs).unwrap();
        assert_eq!(
            docs[0]["metadata"]["annotations"][FORMATTING_ANNOTATION],
            Value::from("none")
        );
    }

    #[test]
    fn test_non_mapping_document_fails() {
        let mut docs = vec![Value::from("just text")];
        assert!(matches!(
            annotate_unmanaged(&mut docs),
            Err(GenerationError::Annotation(_))
        ));

        let mut docs = vec![serde_yaml::from_str::<Value>("metadata: [a]").unwrap()];
        assert!(annotate_unmanaged(&mut docs).is_err());
    }
}
