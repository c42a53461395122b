use super::{load_recipe, recipe_error, EXIT_SUCCESS};
use recipekit_core::{BuildConfig, MANIFEST_FILE};
use recipekit_schema::select_lines;
use std::path::Path;

pub fn run(recipe_dir: &Path, config: &BuildConfig, normalized: bool) -> Result<u8, String> {
    if normalized {
        let recipe = load_recipe(recipe_dir, config)?;
        let yaml = recipe.manifest().to_yaml().map_err(recipe_error)?;
        print!("{yaml}");
        return Ok(EXIT_SUCCESS);
    }

    let meta_path = recipe_dir.join(MANIFEST_FILE);
    let text = std::fs::read_to_string(&meta_path)
        .map_err(|e| recipe_error(format!("failed to read {}: {e}", meta_path.display())))?;
    let selected = select_lines(&text, &config.namespace())
        .map_err(|e| recipe_error(format!("{}: {e}", meta_path.display())))?;
    print!("{selected}");
    Ok(EXIT_SUCCESS)
}
