use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchSpecError {
    #[error("empty dependency spec")]
    Empty,
    #[error("dependency spec '{0}' has more than name, version, and build")]
    TooManyParts(String),
}

/// A `name [version [build]]` dependency requirement.
///
/// Strictness is the number of parts given: 1 leaves the version free, 2 constrains
/// it, 3 also fixes the build string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct MatchSpec {
    spec: String,
    name: String,
    strictness: u8,
}

impl MatchSpec {
    pub fn parse(spec: &str) -> Result<Self, MatchSpecError> {
        let parts: Vec<&str> = spec.split_whitespace().collect();
        let strictness = match parts.len() {
            0 => return Err(MatchSpecError::Empty),
            n @ 1..=3 => n as u8,
            _ => return Err(MatchSpecError::TooManyParts(spec.to_owned())),
        };
        Ok(Self {
            spec: parts.join(" "),
            name: parts[0].to_owned(),
            strictness,
        })
    }

    /// `name x.y*` for a two-digit runtime version such as `27`.
    pub fn pinned(name: &str, version: u32) -> Self {
        Self {
            spec: format!("{name} {}*", dotted(version)),
            name: name.to_owned(),
            strictness: 2,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn strictness(&self) -> u8 {
        self.strictness
    }

    /// Version constraint, when given.
    pub fn version(&self) -> Option<&str> {
        self.spec.split(' ').nth(1)
    }

    /// Build string, when given.
    pub fn build(&self) -> Option<&str> {
        self.spec.split(' ').nth(2)
    }
}

/// Join every decimal digit with dots: `27` becomes `2.7`.
pub fn dotted(version: u32) -> String {
    version
        .to_string()
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(".")
}

impl FromStr for MatchSpec {
    type Err = MatchSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

impl From<MatchSpec> for String {
    fn from(ms: MatchSpec) -> Self {
        ms.spec
    }
}
