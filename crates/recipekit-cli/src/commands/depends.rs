use super::{json_pretty, load_recipe, recipe_error, EXIT_SUCCESS};
use recipekit_core::{BuildConfig, DependencyKind};
use std::path::Path;

pub fn run(
    recipe_dir: &Path,
    config: &BuildConfig,
    kind: DependencyKind,
    json: bool,
) -> Result<u8, String> {
    let recipe = load_recipe(recipe_dir, config)?;
    let specs = recipe.dependencies(kind).map_err(recipe_error)?;
    if json {
        println!("{}", json_pretty(&specs)?);
    } else {
        for spec in &specs {
            println!("{spec}");
        }
    }
    Ok(EXIT_SUCCESS)
}
