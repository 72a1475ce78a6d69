//! Field paths into YAML documents
//!
//! A path is a list of segments. Plain segments name mapping fields; bracketed
//! segments address list entries, either by a keyed field (`[name=app]`), by
//! scalar value (`[=value]`) or by position (`[0]`).

use crate::error::{GenerationError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A field of a mapping
    Field(String),
    /// The list entry whose `field` equals `value`; an empty field matches scalar entries
    Keyed { field: String, value: String },
    /// A list entry by position
    Index(usize),
}

/// Check if a path segment addresses a list entry
pub fn is_list_index(segment: &str) -> bool {
    segment.starts_with('[') && segment.ends_with(']')
}

/// Split a `[field=value]` list index into its field and value
///
/// Returns `None` for positional indices and plain segments.
pub fn split_index_name_value(segment: &str) -> Option<(&str, &str)> {
    if !is_list_index(segment) || segment.len() < 2 {
        return None;
    }
    segment[1..segment.len() - 1].split_once('=')
}

impl PathSegment {
    pub fn parse(segment: &str) -> Result<Self> {
        if !is_list_index(segment) || segment.len() < 2 {
            if segment.is_empty() {
                return Err(invalid(segment, "empty field name"));
            }
            return Ok(PathSegment::Field(segment.to_string()));
        }

        if let Some((field, value)) = split_index_name_value(segment) {
            return Ok(PathSegment::Keyed {
                field: field.to_string(),
                value: value.to_string(),
            });
        }

        segment[1..segment.len() - 1]
            .parse()
            .map(PathSegment::Index)
            .map_err(|_| invalid(segment, "list index must be a position or field=value"))
    }
}

/// Parse every segment of a field path
pub fn parse_path(path: &[String]) -> Result<Vec<PathSegment>> {
    path.iter().map(|s| PathSegment::parse(s)).collect()
}

fn invalid(segment: &str, reason: &str) -> GenerationError {
    GenerationError::InvalidFieldPath {
        path: segment.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_index_name_value() {
        assert_eq!(split_index_name_value("[name=app]"), Some(("name", "app")));
        assert_eq!(split_index_name_value("[=value]"), Some(("", "value")));
        assert_eq!(split_index_name_value("[0]"), None);
        assert_eq!(split_index_name_value("containers"), None);
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(
            PathSegment::parse("spec").unwrap(),
            PathSegment::Field("spec".to_string())
        );
        assert_eq!(
            PathSegment::parse("[name=app]").unwrap(),
            PathSegment::Keyed {
                field: "name".to_string(),
                value: "app".to_string()
            }
        );
        assert_eq!(PathSegment::parse("[2]").unwrap(), PathSegment::Index(2));
        assert!(PathSegment::parse("[x]").is_err());
        assert!(PathSegment::parse("").is_err());
    }
}
