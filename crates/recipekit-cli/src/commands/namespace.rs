use super::{json_pretty, EXIT_SUCCESS};
use recipekit_core::BuildConfig;

pub fn run(config: &BuildConfig, json: bool) -> Result<u8, String> {
    let ns = config.namespace();
    if json {
        println!("{}", json_pretty(&ns)?);
    } else {
        for (name, value) in ns.iter() {
            println!("{name:<8} = {value}");
        }
    }
    Ok(EXIT_SUCCESS)
}
