use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A primitive fact visible to selector expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NsValue {
    Bool(bool),
    Int(i64),
}

impl fmt::Display for NsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

/// Platform and interpreter facts that selector conditions may reference.
///
/// The key set is closed: a condition naming anything outside it fails to evaluate.
/// Construction is pure, so identical inputs always produce an identical namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Namespace {
    entries: BTreeMap<&'static str, NsValue>,
}

impl Namespace {
    /// Build the namespace for a platform subdir (`linux-64`, `osx-64`, `win-32`, ...)
    /// and the two-digit interpreter (`27`) and numeric-library (`19`) versions.
    pub fn new(subdir: &str, python: u32, numpy: u32) -> Self {
        let py = i64::from(python);
        let bool_facts = [
            ("linux", subdir.starts_with("linux-")),
            ("linux32", subdir == "linux-32"),
            ("linux64", subdir == "linux-64"),
            ("armv6", subdir == "linux-armv6l"),
            ("osx", subdir.starts_with("osx-")),
            ("unix", subdir.starts_with("linux-") || subdir.starts_with("osx-")),
            ("win", subdir.starts_with("win-")),
            ("win32", subdir == "win-32"),
            ("win64", subdir == "win-64"),
            ("py3k", (30..40).contains(&py)),
            ("py2k", (20..30).contains(&py)),
            ("py26", py == 26),
            ("py27", py == 27),
            ("py33", py == 33),
        ];

        let mut entries: BTreeMap<&'static str, NsValue> = bool_facts
            .into_iter()
            .map(|(name, value)| (name, NsValue::Bool(value)))
            .collect();
        entries.insert("py", NsValue::Int(py));
        entries.insert("np", NsValue::Int(i64::from(numpy)));

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<NsValue> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, NsValue)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    /// Interpreter version as the two-digit integer the namespace was built with.
    pub fn python(&self) -> i64 {
        match self.get("py") {
            Some(NsValue::Int(v)) => v,
            _ => 0,
        }
    }

    /// Numeric-library version as the two-digit integer the namespace was built with.
    pub fn numpy(&self) -> i64 {
        match self.get("np") {
            Some(NsValue::Int(v)) => v,
            _ => 0,
        }
    }
}
