use crate::manifest::ManifestError;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Expected shape of a normalized field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Always present, always a sequence of strings.
    List,
    /// Always present, always a string.
    Text,
}

/// One entry of the recipe schema: `section/key` and its guaranteed shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub section: &'static str,
    pub key: &'static str,
    pub shape: FieldShape,
}

impl FieldSpec {
    const fn list(section: &'static str, key: &'static str) -> Self {
        Self {
            section,
            key,
            shape: FieldShape::List,
        }
    }

    const fn text(section: &'static str, key: &'static str) -> Self {
        Self {
            section,
            key,
            shape: FieldShape::Text,
        }
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.section, self.key)
    }
}

/// Fields whose shape is guaranteed after normalization. Everything else in the
/// document passes through untouched.
pub const RECIPE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::list("source", "patches"),
    FieldSpec::list("build", "entry_points"),
    FieldSpec::list("build", "features"),
    FieldSpec::list("build", "track_features"),
    FieldSpec::list("requirements", "build"),
    FieldSpec::list("requirements", "run"),
    FieldSpec::list("requirements", "conflicts"),
    FieldSpec::list("test", "requires"),
    FieldSpec::list("test", "files"),
    FieldSpec::list("test", "commands"),
    FieldSpec::list("test", "imports"),
    FieldSpec::text("package", "version"),
    FieldSpec::text("source", "git_tag"),
    FieldSpec::text("source", "git_branch"),
    FieldSpec::text("source", "md5"),
];

/// A parsed recipe document with every [`RECIPE_SCHEMA`] field present and well-typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedManifest {
    doc: Mapping,
}

/// Enforce [`RECIPE_SCHEMA`] on a parsed document.
pub fn normalize(mut doc: Mapping) -> Result<NormalizedManifest, ManifestError> {
    for spec in RECIPE_SCHEMA {
        let section = section_mut(&mut doc, spec.section)?;
        let slot = section
            .entry(Value::from(spec.key))
            .or_insert(Value::Null);
        let normalized = match spec.shape {
            FieldShape::List => Value::Sequence(list_value(slot, spec)?),
            FieldShape::Text => Value::String(text_value(slot, spec)?),
        };
        *slot = normalized;
    }
    Ok(NormalizedManifest { doc })
}

impl NormalizedManifest {
    pub fn section(&self, name: &str) -> Option<&Mapping> {
        self.doc.get(name).and_then(Value::as_mapping)
    }

    /// Look up a `section/key` path.
    pub fn get(&self, field: &str) -> Option<&Value> {
        let (section, key) = field.split_once('/')?;
        self.section(section)?.get(key)
    }

    /// String value of a field; empty when absent or not a string.
    pub fn get_str(&self, field: &str) -> &str {
        self.get(field).and_then(Value::as_str).unwrap_or_default()
    }

    /// Entries of a list field; empty when absent.
    pub fn get_list(&self, field: &str) -> Vec<&str> {
        self.get(field)
            .and_then(Value::as_sequence)
            .map(|seq| seq.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.doc
    }

    pub fn into_mapping(self) -> Mapping {
        self.doc
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(&self.doc)?)
    }
}

fn section_mut<'a>(doc: &'a mut Mapping, name: &str) -> Result<&'a mut Mapping, ManifestError> {
    let slot = doc.entry(Value::from(name)).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Mapping(Mapping::new());
    }
    match slot {
        Value::Mapping(m) => Ok(m),
        other => Err(ManifestError::SectionNotMapping {
            section: name.to_owned(),
            found: value_kind(other),
        }),
    }
}

fn list_value(value: &Value, spec: &FieldSpec) -> Result<Vec<Value>, ManifestError> {
    let items: Vec<&Value> = match untag(value) {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(seq) => seq.iter().collect(),
        scalar => vec![scalar],
    };
    items
        .into_iter()
        .map(|item| match scalar_text(item) {
            Some(text) if !untag(item).is_null() => Ok(Value::String(text)),
            _ => Err(ManifestError::InvalidField {
                field: spec.path(),
                reason: format!("list entries must be scalars, found {}", value_kind(item)),
            }),
        })
        .collect()
}

fn text_value(value: &Value, spec: &FieldSpec) -> Result<String, ManifestError> {
    scalar_text(value).ok_or_else(|| ManifestError::InvalidField {
        field: spec.path(),
        reason: format!("expected a scalar, found {}", value_kind(value)),
    })
}

/// String rendering of a scalar; `None` for sequences and mappings.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match untag(value) {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
