//! Edit operations applied to patch documents

use super::path::{parse_path, PathSegment};
use crate::error::{GenerationError, Result};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};

/// A self-contained edit of a growing patch document
///
/// Filters for the same target run in contribution order, so later filters
/// observe the effects of earlier ones.
pub trait PatchFilter {
    fn apply(&self, document: &mut Value) -> Result<()>;
}

impl<F> PatchFilter for F
where
    F: Fn(&mut Value) -> Result<()>,
{
    fn apply(&self, document: &mut Value) -> Result<()> {
        self(document)
    }
}

/// Sets the value at a field path, creating any missing structure
#[derive(Debug, Clone)]
pub struct SetField {
    path: Vec<PathSegment>,
    value: Value,
}

impl SetField {
    pub fn new(path: &[String], value: Value) -> Result<Self> {
        if path.is_empty() {
            return Err(GenerationError::InvalidFieldPath {
                path: String::new(),
                reason: "cannot replace the whole document".to_string(),
            });
        }
        Ok(Self {
            path: parse_path(path)?,
            value,
        })
    }
}

impl PatchFilter for SetField {
    fn apply(&self, document: &mut Value) -> Result<()> {
        *lookup_create(document, &self.path)? = self.value.clone();
        Ok(())
    }
}

/// Runs several filters as one edit operation
pub struct Chain(pub Vec<Box<dyn PatchFilter>>);

impl PatchFilter for Chain {
    fn apply(&self, document: &mut Value) -> Result<()> {
        self.0.iter().try_for_each(|f| f.apply(document))
    }
}

/// A scalar placeholder for a field that holds an integer once rendered
///
/// The value carries an explicit integer tag which the patch renderer strips,
/// leaving the bare template expression in the patch body.
pub fn int_placeholder(expression: impl Into<String>) -> Value {
    Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new("int"),
        value: Value::String(expression.into()),
    }))
}

/// Follow a path through the document, creating fields and keyed list entries
pub fn lookup_create<'a>(document: &'a mut Value, path: &[PathSegment]) -> Result<&'a mut Value> {
    let mut current = document;
    for segment in path {
        current = descend(current, segment)?;
    }
    Ok(current)
}

fn descend<'a>(node: &'a mut Value, segment: &PathSegment) -> Result<&'a mut Value> {
    match segment {
        PathSegment::Field(name) => {
            if node.is_null() {
                *node = Value::Mapping(Mapping::new());
            }
            match node {
                Value::Mapping(map) => Ok(map
                    .entry(Value::String(name.clone()))
                    .or_insert(Value::Null)),
                _ => Err(mismatch(segment, "a mapping")),
            }
        }
        PathSegment::Keyed { field, value } => {
            if node.is_null() {
                *node = Value::Sequence(Vec::new());
            }
            let Value::Sequence(items) = node else {
                return Err(mismatch(segment, "a sequence"));
            };
            let index = match items.iter().position(|item| entry_matches(item, field, value)) {
                Some(index) => index,
                None => {
                    items.push(new_entry(field, value));
                    items.len() - 1
                }
            };
            Ok(&mut items[index])
        }
        PathSegment::Index(index) => match node {
            Value::Sequence(items) if *index < items.len() => Ok(&mut items[*index]),
            _ => Err(mismatch(segment, "an existing list entry")),
        },
    }
}

fn entry_matches(item: &Value, field: &str, value: &str) -> bool {
    let candidate = if field.is_empty() {
        Some(item)
    } else {
        item.get(field)
    };
    candidate.and_then(scalar_text).as_deref() == Some(value)
}

fn new_entry(field: &str, value: &str) -> Value {
    if field.is_empty() {
        return Value::String(value.to_string());
    }
    let mut entry = Mapping::new();
    entry.insert(Value::String(field.to_string()), Value::String(value.to_string()));
    Value::Mapping(entry)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn mismatch(segment: &PathSegment, expected: &str) -> GenerationError {
    GenerationError::InvalidFieldPath {
        path: format!("{segment:?}"),
        reason: format!("expected {expected}"),
    }
}
