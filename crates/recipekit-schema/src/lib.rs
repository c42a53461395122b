//! Recipe manifest front-end: selector preprocessing, YAML loading, and normalization.
//!
//! This crate turns raw `meta.yaml` text into a [`NormalizedManifest`]. Lines carrying a
//! trailing `[condition]` selector are kept or dropped by evaluating the condition against
//! a platform [`Namespace`], the surviving text is parsed as YAML (memoized by content),
//! and the known list/string fields are coerced so consumers can index them unchecked.

pub mod loader;
pub mod manifest;
pub mod namespace;
pub mod normalize;
pub mod selector;
pub mod types;

pub use loader::{load_document, ParseCache};
pub use manifest::{parse_recipe_file, parse_recipe_str, ManifestError};
pub use namespace::{Namespace, NsValue};
pub use normalize::{normalize, FieldShape, FieldSpec, NormalizedManifest, RECIPE_SCHEMA};
pub use selector::{select_lines, split_selector, ExprError, SelectorError};
pub use types::{BuildId, DistName};
