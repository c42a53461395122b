mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_RECIPE_ERROR, RECIPE_ERROR_PREFIX};
use recipekit_core::{BuildConfig, DependencyKind};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "recipekit",
    version,
    about = "Load package recipes and derive their build identity"
)]
struct Cli {
    /// Build configuration file (TOML with subdir, python, numpy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target platform subdir, e.g. linux-64, osx-64, win-32.
    #[arg(long, global = true)]
    subdir: Option<String>,

    /// Interpreter version as two digits, e.g. 27.
    #[arg(long, global = true)]
    python: Option<u32>,

    /// Numeric library version as two digits, e.g. 19.
    #[arg(long, global = true)]
    numpy: Option<u32>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Build,
    Run,
}

impl From<Kind> for DependencyKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Build => DependencyKind::Build,
            Kind::Run => DependencyKind::Run,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the info index of a recipe.
    Inspect {
        /// Recipe directory containing meta.yaml.
        #[arg(default_value = ".")]
        recipe: PathBuf,
    },
    /// Print a recipe's manifest after selector filtering.
    Render {
        /// Recipe directory containing meta.yaml.
        #[arg(default_value = ".")]
        recipe: PathBuf,
        /// Print the normalized document instead of the filtered text.
        #[arg(long, default_value_t = false)]
        normalized: bool,
    },
    /// Print the distribution name (name-version-build).
    Dist {
        /// Recipe directory containing meta.yaml.
        #[arg(default_value = ".")]
        recipe: PathBuf,
    },
    /// List resolved dependency specs.
    Depends {
        /// Recipe directory containing meta.yaml.
        #[arg(default_value = ".")]
        recipe: PathBuf,
        /// Requirement list to resolve.
        #[arg(long, value_enum, default_value_t = Kind::Run)]
        kind: Kind,
    },
    /// Show the selector namespace for the active configuration.
    Namespace,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn resolve_config(cli: &Cli) -> Result<BuildConfig, String> {
    let mut config = BuildConfig::resolve(cli.config.as_deref()).map_err(|e| e.to_string())?;
    config
        .with_overrides(cli.subdir.as_deref(), cli.python, cli.numpy)
        .map_err(|e| e.to_string())?;
    Ok(config)
}

fn dispatch(command: &Commands, config: &BuildConfig, json: bool) -> Result<u8, String> {
    tracing::debug!(
        "target {} (python {}, numpy {})",
        config.subdir,
        config.python,
        config.numpy
    );
    match command {
        Commands::Inspect { recipe } => commands::inspect::run(recipe, config, json),
        Commands::Render { recipe, normalized } => {
            commands::render::run(recipe, config, *normalized)
        }
        Commands::Dist { recipe } => commands::dist::run(recipe, config, json),
        Commands::Depends { recipe, kind } => {
            commands::depends::run(recipe, config, (*kind).into(), json)
        }
        Commands::Namespace => commands::namespace::run(config, json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(*shell),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RECIPEKIT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Completions { shell } => commands::completions::run::<Cli>(*shell),
        command => resolve_config(&cli).and_then(|config| dispatch(command, &config, cli.json)),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with(RECIPE_ERROR_PREFIX) {
                EXIT_RECIPE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
