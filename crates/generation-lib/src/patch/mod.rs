//! Patch construction
//!
//! Selections contribute edit operations ([`PatchFilter`]) scoped to one
//! target resource; the [`PatchRenderer`] folds all operations for a target
//! into a single patch template.

mod filter;
mod path;
mod render;

pub use filter::{int_placeholder, lookup_create, Chain, PatchFilter, SetField};
pub use path::{is_list_index, parse_path, split_index_name_value, PathSegment};
pub use render::{render_patch, strip_int_tags, PatchRenderer};
