//! Error types for experiment generation

use crate::models::PatchType;

/// Errors raised while generating an experiment
///
/// Any of these aborts the whole generation pass; no partial experiment is
/// ever returned.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// A selection failed to produce its contribution
    #[error("selection failed: {0}")]
    Selection(String),

    /// A field path could not be followed or created in a patch document
    #[error("invalid field path {path:?}: {reason}")]
    InvalidFieldPath { path: String, reason: String },

    /// A Kubernetes label selector could not be parsed
    #[error("invalid label selector {selector:?}: {reason}")]
    InvalidLabelSelector { selector: String, reason: String },

    /// A Kubernetes resource quantity could not be parsed
    #[error("invalid quantity {0:?}")]
    InvalidQuantity(String),

    /// Two contributions disagree on how a target must be patched
    #[error("conflicting patch types for {target}: {existing} and {requested}")]
    PatchTypeConflict {
        target: String,
        existing: PatchType,
        requested: PatchType,
    },

    /// YAML (de)serialization failed
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A resource in the output stream could not be annotated
    #[error("cannot annotate resource: {0}")]
    Annotation(String),

    /// Duplicate resources in the output stream could not be merged
    #[error("cannot merge resources: {0}")]
    Merge(String),
}

/// Result alias used throughout the generation pipeline
pub type Result<T, E = GenerationError> = std::result::Result<T, E>;

/// Errors raised while talking to the built-in Prometheus instance
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    /// The request never produced a response
    #[error("prometheus request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Prometheus answered with a non-success status
    #[error("prometheus returned {status}: {body}")]
    Status { status: u16, body: String },
}
