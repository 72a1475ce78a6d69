//! Reading and writing multi-document YAML streams

use crate::error::Result;
use serde::Deserialize;
use serde_yaml::Value;

/// Serialize documents as one YAML stream
///
/// When a header is given every line of it is written as a leading comment.
pub fn write_yaml_stream(documents: &[Value], header: Option<&str>) -> Result<String> {
    let mut out = String::new();

    if let Some(header) = header.filter(|h| !h.trim().is_empty()) {
        for line in header.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }

    for (i, document) in documents.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&serde_yaml::to_string(document)?);
    }

    Ok(out)
}

/// Parse every document of a YAML stream, dropping empty documents
pub fn parse_yaml_stream(text: &str) -> Result<Vec<Value>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}
