use recipekit_schema::Namespace;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const ENV_SUBDIR: &str = "RECIPEKIT_SUBDIR";
pub const ENV_PYTHON: &str = "RECIPEKIT_PY";
pub const ENV_NUMPY: &str = "RECIPEKIT_NPY";

pub const DEFAULT_PYTHON: u32 = 27;
pub const DEFAULT_NUMPY: u32 = 17;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{key} must be an integer like 27, got '{value}'")]
    InvalidVersion { key: String, value: String },
    #[error("invalid platform subdir '{0}', expected '<platform>-<bits>' (e.g. linux-64)")]
    InvalidSubdir(String),
}

/// Target platform and pinned runtime versions for one build.
///
/// `subdir` is the `<platform>-<bits>` identifier (`linux-64`, `osx-64`, `win-32`,
/// `linux-armv6l`); platform and architecture names derive from it. `python` and
/// `numpy` are two-digit versions (`27` means 2.7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    pub subdir: String,
    pub python: u32,
    pub numpy: u32,
}

/// Partial overlay read from a TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    subdir: Option<String>,
    python: Option<u32>,
    numpy: Option<u32>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::host()
    }
}

impl BuildConfig {
    /// Config for a given target, validating the subdir shape.
    pub fn new(subdir: &str, python: u32, numpy: u32) -> Result<Self, ConfigError> {
        validate_subdir(subdir)?;
        Ok(Self {
            subdir: subdir.to_owned(),
            python,
            numpy,
        })
    }

    /// The running host's subdir with default runtime versions.
    pub fn host() -> Self {
        Self {
            subdir: host_subdir(),
            python: DEFAULT_PYTHON,
            numpy: DEFAULT_NUMPY,
        }
    }

    /// Host defaults, then the optional TOML file, then environment variables.
    pub fn resolve(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::host();
        if let Some(path) = config_path {
            config.apply_file(path)?;
        }
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from a TOML file with optional `subdir`, `python`, `numpy` keys.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;
        self.with_overrides(file.subdir.as_deref(), file.python, file.numpy)
    }

    /// Overlay whichever of `subdir`, `python`, `numpy` are given.
    pub fn with_overrides(
        &mut self,
        subdir: Option<&str>,
        python: Option<u32>,
        numpy: Option<u32>,
    ) -> Result<(), ConfigError> {
        if let Some(subdir) = subdir {
            validate_subdir(subdir)?;
            subdir.clone_into(&mut self.subdir);
        }
        if let Some(py) = python {
            self.python = py;
        }
        if let Some(np) = numpy {
            self.numpy = np;
        }
        Ok(())
    }

    /// Overlay `RECIPEKIT_SUBDIR`, `RECIPEKIT_PY`, `RECIPEKIT_NPY` as found by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(subdir) = lookup(ENV_SUBDIR) {
            validate_subdir(&subdir)?;
            self.subdir = subdir;
        }
        if let Some(py) = lookup(ENV_PYTHON) {
            self.python = parse_version(ENV_PYTHON, &py)?;
        }
        if let Some(np) = lookup(ENV_NUMPY) {
            self.numpy = parse_version(ENV_NUMPY, &np)?;
        }
        Ok(())
    }

    /// Platform family: `linux`, `osx`, `win`.
    pub fn platform(&self) -> &str {
        self.subdir
            .split_once('-')
            .map_or(self.subdir.as_str(), |(platform, _)| platform)
    }

    /// Architecture name: `x86_64`, `x86`, or the subdir suffix verbatim (`armv6l`).
    pub fn arch(&self) -> &str {
        match self.subdir.split_once('-').map(|(_, bits)| bits) {
            Some("64") => "x86_64",
            Some("32") => "x86",
            Some(other) => other,
            None => "",
        }
    }

    /// Selector namespace for this target.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.subdir, self.python, self.numpy)
    }

    /// Runtimes whose unconstrained dependencies get pinned, with their versions.
    pub fn pinned_runtimes(&self) -> [(&'static str, u32); 2] {
        [("python", self.python), ("numpy", self.numpy)]
    }
}

/// Parse a two-digit runtime version. Anything but a plain integer is rejected.
pub fn parse_version(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidVersion {
            key: key.to_owned(),
            value: value.to_owned(),
        })
}

fn validate_subdir(subdir: &str) -> Result<(), ConfigError> {
    match subdir.split_once('-') {
        Some((platform, bits)) if !platform.is_empty() && !bits.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidSubdir(subdir.to_owned())),
    }
}

fn host_subdir() -> String {
    let platform = match std::env::consts::OS {
        "macos" => "osx",
        "windows" => "win",
        other => other,
    };
    let bits = match std::env::consts::ARCH {
        "x86_64" | "aarch64" => "64",
        "x86" => "32",
        "arm" => "armv6l",
        other => other,
    };
    format!("{platform}-{bits}")
}
