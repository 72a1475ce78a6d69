//! Post-processing of the generated document stream

mod annotate;
mod merge;
mod output;

pub use annotate::{annotate_unmanaged, FORMATTING_ANNOTATION, FORMATTING_NONE};
pub use merge::merge_resources;
pub use output::{parse_yaml_stream, write_yaml_stream};
