use super::{json_pretty, load_recipe, recipe_error, EXIT_SUCCESS};
use recipekit_core::{BuildConfig, Md5Hasher};
use std::path::Path;

pub fn run(recipe_dir: &Path, config: &BuildConfig, json: bool) -> Result<u8, String> {
    let recipe = load_recipe(recipe_dir, config)?;
    let index = recipe.summary_index(&Md5Hasher).map_err(recipe_error)?;
    if json {
        println!("{}", json_pretty(&index)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("name:          {}", index.name);
    println!("version:       {}", index.version);
    println!("build:         {}", index.build);
    println!("build_number:  {}", index.build_number);
    println!("platform:      {}", index.platform);
    println!("arch:          {}", index.arch);
    if index.depends.is_empty() {
        println!("depends:       (none)");
    } else {
        for (i, dep) in index.depends.iter().enumerate() {
            let label = if i == 0 { "depends:" } else { "" };
            println!("{label:<15}{dep}");
        }
    }
    if let Some(app) = &index.app {
        println!("app:           yes");
        if let Some(icon) = &app.icon {
            println!("icon:          {icon}");
        }
    }
    Ok(EXIT_SUCCESS)
}
