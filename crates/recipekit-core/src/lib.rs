//! Recipe descriptor for the package builder.
//!
//! This crate wraps a normalized recipe manifest in a [`Recipe`] and derives what the
//! builder needs from it: validated identity (name, version, build number), runtime
//! dependency specs pinned to the configured interpreter and numeric library, the
//! build identifier and distribution name, and the info-index summary. The
//! [`BuildConfig`] supplies platform facts and pinned versions.

pub mod config;
pub mod hashing;
pub mod matchspec;
pub mod recipe;

pub use config::{BuildConfig, ConfigError};
pub use hashing::{ContentHasher, Md5Hasher};
pub use matchspec::{MatchSpec, MatchSpecError};
pub use recipe::{AppMeta, DependencyKind, InfoIndex, Recipe, MANIFEST_FILE};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("recipe directory not found: {}", .0.display())]
    RecipeDirNotFound(PathBuf),
    #[error("manifest error in {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: recipekit_schema::ManifestError,
    },
    #[error("package/name missing in: {}", .0.display())]
    MissingName(PathBuf),
    #[error("package/name must be lowercase, got: '{name}' in {}", .path.display())]
    NameNotLowercase { name: String, path: PathBuf },
    #[error("package/version missing in: {}", .0.display())]
    MissingVersion(PathBuf),
    #[error("invalid field '{field}' in {}: {reason}", .path.display())]
    InvalidField {
        path: PathBuf,
        field: String,
        reason: String,
    },
    #[error("invalid requirement in {}: {source}", .path.display())]
    Requirement {
        path: PathBuf,
        #[source]
        source: MatchSpecError,
    },
    #[error("cannot derive build id from '{spec}' in {}: version needs at least 3 characters", .path.display())]
    InvalidPin { path: PathBuf, spec: String },
    #[error("failed to hash {}: {source}", .path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
