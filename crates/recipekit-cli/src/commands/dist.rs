use super::{json_pretty, load_recipe, recipe_error, EXIT_SUCCESS};
use recipekit_core::BuildConfig;
use std::path::Path;

pub fn run(recipe_dir: &Path, config: &BuildConfig, json: bool) -> Result<u8, String> {
    let recipe = load_recipe(recipe_dir, config)?;
    let dist = recipe.distribution_name().map_err(recipe_error)?;
    if json {
        let payload = serde_json::json!({
            "dist": dist,
            "build": recipe.build_id().map_err(recipe_error)?,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{dist}");
    }
    Ok(EXIT_SUCCESS)
}
