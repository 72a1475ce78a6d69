//! Experiment generation library
//!
//! This crate turns the selections produced by an application resource scan
//! into an optimization experiment:
//! - Capability contracts implemented by selections (`source`)
//! - Parameter name disambiguation (`naming`)
//! - Per-target patch aggregation and template rendering (`patch`)
//! - Metric synthesis for custom scenarios, Datadog goals and built-in metrics
//! - Post-processing of the output document stream (`stream`)

pub mod application;
pub mod error;
pub mod label_selector;
pub mod metric;
pub mod models;
pub mod naming;
pub mod observability;
pub mod patch;
pub mod quantity;
pub mod source;
pub mod stream;
pub mod transformer;

pub use application::Application;
pub use error::{GenerationError, MetricError, Result};
pub use models::{Experiment, Metric, Parameter, PatchTemplate, PatchType, ResourceReference};
pub use naming::ParameterNamer;
pub use source::{application_selections, Selection};
pub use transformer::{Generation, Transformer, DEFAULT_EXPERIMENT_NAME};
