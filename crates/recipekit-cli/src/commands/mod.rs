pub mod completions;
pub mod depends;
pub mod dist;
pub mod inspect;
pub mod namespace;
pub mod render;

use recipekit_core::{BuildConfig, Recipe};
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_RECIPE_ERROR: u8 = 2;

/// Errors caused by recipe content carry this prefix so `main` can map them
/// to [`EXIT_RECIPE_ERROR`].
pub const RECIPE_ERROR_PREFIX: &str = "recipe error:";

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn recipe_error(err: impl std::fmt::Display) -> String {
    format!("{RECIPE_ERROR_PREFIX} {err}")
}

pub fn load_recipe(dir: &Path, config: &BuildConfig) -> Result<Recipe, String> {
    Recipe::load(dir, config).map_err(recipe_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_object() {
        let val = serde_json::json!({"name": "pycosat"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"name\""));
        assert!(result.contains("\"pycosat\""));
    }

    #[test]
    fn recipe_errors_are_prefixed() {
        let msg = recipe_error("package/name missing");
        assert!(msg.starts_with(RECIPE_ERROR_PREFIX));
        assert!(msg.ends_with("package/name missing"));
    }

    #[test]
    fn load_recipe_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::new("linux-64", 27, 17).unwrap();
        let err = load_recipe(&dir.path().join("absent"), &config).unwrap_err();
        assert!(err.starts_with(RECIPE_ERROR_PREFIX), "{err}");
    }
}
