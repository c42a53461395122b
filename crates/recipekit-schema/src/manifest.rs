use crate::loader::load_document;
use crate::namespace::Namespace;
use crate::normalize::{normalize, NormalizedManifest};
use crate::selector::{select_lines, SelectorError};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("failed to parse manifest: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("manifest must be a mapping at the top level, found {0}")]
    NotAMapping(&'static str),
    #[error("section '{section}' must be a mapping, found {found}")]
    SectionNotMapping {
        section: String,
        found: &'static str,
    },
    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

/// Run the full front-end: selectors, YAML parsing (cached), normalization.
pub fn parse_recipe_str(input: &str, ns: &Namespace) -> Result<NormalizedManifest, ManifestError> {
    let selected = select_lines(input, ns)?;
    debug!(
        "selectors kept {} of {} lines",
        selected.lines().count(),
        input.lines().count()
    );
    let doc = load_document(&selected)?;
    normalize(doc)
}

pub fn parse_recipe_file(
    path: impl AsRef<Path>,
    ns: &Namespace,
) -> Result<NormalizedManifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_recipe_str(&content, ns)
}
