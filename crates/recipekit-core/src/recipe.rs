use crate::config::BuildConfig;
use crate::hashing::ContentHasher;
use crate::matchspec::MatchSpec;
use crate::CoreError;
use recipekit_schema::{parse_recipe_str, BuildId, DistName, NormalizedManifest};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Manifest file name inside a recipe directory.
pub const MANIFEST_FILE: &str = "meta.yaml";

/// Requirement list consulted by [`Recipe::dependencies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Build,
    Run,
}

impl DependencyKind {
    pub fn field(self) -> &'static str {
        match self {
            Self::Build => "requirements/build",
            Self::Run => "requirements/run",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => f.write_str("build"),
            Self::Run => f.write_str("run"),
        }
    }
}

/// Application metadata merged into the info index of app packages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppMeta {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_entry: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_cli_opts: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
}

/// Summary document handed to the package index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoIndex {
    pub name: String,
    pub version: String,
    pub build: BuildId,
    pub build_number: u64,
    pub platform: String,
    pub arch: String,
    pub depends: Vec<String>,
    #[serde(flatten)]
    pub app: Option<AppMeta>,
}

/// A loaded, normalized recipe. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Recipe {
    path: PathBuf,
    meta_path: PathBuf,
    meta: NormalizedManifest,
    config: BuildConfig,
}

impl Recipe {
    /// Load `<dir>/meta.yaml`, apply selectors for `config`, and normalize.
    ///
    /// Fails if the directory is missing, the manifest does not parse, or the
    /// package name is missing or not lowercase.
    pub fn load(dir: impl AsRef<Path>, config: &BuildConfig) -> Result<Self, CoreError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CoreError::RecipeDirNotFound(dir.to_path_buf()));
        }
        let meta_path = dir.join(MANIFEST_FILE);
        info!("loading recipe {}", meta_path.display());
        let text = std::fs::read_to_string(&meta_path).map_err(|e| CoreError::Manifest {
            path: meta_path.clone(),
            source: e.into(),
        })?;
        Self::from_text(dir, &text, config)
    }

    /// Build a recipe from manifest text; `dir` anchors relative paths such as the icon.
    pub fn from_text(
        dir: impl AsRef<Path>,
        text: &str,
        config: &BuildConfig,
    ) -> Result<Self, CoreError> {
        let path = dir.as_ref().to_path_buf();
        let meta_path = path.join(MANIFEST_FILE);
        let meta = parse_recipe_str(text, &config.namespace()).map_err(|source| {
            CoreError::Manifest {
                path: meta_path.clone(),
                source,
            }
        })?;
        let recipe = Self {
            path,
            meta_path,
            meta,
            config: config.clone(),
        };
        recipe.name()?;
        Ok(recipe)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    pub fn manifest(&self) -> &NormalizedManifest {
        &self.meta
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn get_section(&self, section: &str) -> Option<&Mapping> {
        self.meta.section(section)
    }

    /// Look up a `section/key` field.
    pub fn get_value(&self, field: &str) -> Option<&Value> {
        self.meta.get(field)
    }

    pub fn name(&self) -> Result<String, CoreError> {
        let name = self
            .get_value("package/name")
            .map(untag)
            .filter(|v| is_truthy(v))
            .and_then(scalar_string)
            .ok_or_else(|| CoreError::MissingName(self.meta_path.clone()))?;
        if name != name.to_lowercase() {
            return Err(CoreError::NameNotLowercase {
                name,
                path: self.meta_path.clone(),
            });
        }
        Ok(name)
    }

    pub fn version(&self) -> &str {
        self.meta.get_str("package/version")
    }

    /// `build/number`, defaulting to 0. Whole floats such as `3.0` count as integers.
    pub fn build_number(&self) -> Result<u64, CoreError> {
        let invalid = |found: String| CoreError::InvalidField {
            path: self.meta_path.clone(),
            field: "build/number".to_owned(),
            reason: format!("expected a non-negative integer, found {found}"),
        };
        match self.get_value("build/number").map(untag) {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => whole_number(n).ok_or_else(|| invalid(n.to_string())),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid(format!("'{s}'"))),
            Some(other) => Err(invalid(format!("{other:?}"))),
        }
    }

    /// Requirement specs of the given kind, with bare `python`/`numpy` pinned to the
    /// configured versions. Explicit constraints are kept as written.
    pub fn dependencies(&self, kind: DependencyKind) -> Result<Vec<MatchSpec>, CoreError> {
        let mut specs = Vec::new();
        for entry in self.meta.get_list(kind.field()) {
            let mut ms = MatchSpec::parse(entry).map_err(|source| CoreError::Requirement {
                path: self.meta_path.clone(),
                source,
            })?;
            for (runtime, version) in self.config.pinned_runtimes() {
                if ms.name() != runtime {
                    continue;
                }
                if ms.strictness() == 1 {
                    ms = MatchSpec::pinned(runtime, version);
                    debug!("{kind} requirement '{entry}' pinned to '{ms}'");
                } else {
                    debug!("{kind} requirement '{entry}' keeps its explicit constraint");
                }
            }
            specs.push(ms);
        }
        Ok(specs)
    }

    /// Short token of pinned runtimes plus build number, e.g. `np19py27_3`.
    ///
    /// Run requirements on numpy then python each contribute their tag followed by
    /// the first and third characters of the version. Without either, the id is the
    /// build number alone.
    pub fn build_id(&self) -> Result<BuildId, CoreError> {
        let run = self.dependencies(DependencyKind::Run)?;
        let mut id = String::new();
        for (runtime, tag) in [("numpy", "np"), ("python", "py")] {
            let Some(ms) = run.iter().find(|ms| ms.name() == runtime) else {
                continue;
            };
            let version: Vec<char> = ms.version().unwrap_or_default().chars().collect();
            if version.len() < 3 {
                return Err(CoreError::InvalidPin {
                    path: self.meta_path.clone(),
                    spec: ms.spec().to_owned(),
                });
            }
            id.push_str(tag);
            id.push(version[0]);
            id.push(version[2]);
        }
        if !id.is_empty() {
            id.push('_');
        }
        id.push_str(&self.build_number()?.to_string());
        Ok(BuildId::new(id))
    }

    /// `name-version-build_id`.
    pub fn distribution_name(&self) -> Result<DistName, CoreError> {
        Ok(DistName::new(format!(
            "{}-{}-{}",
            self.name()?,
            self.required_version()?,
            self.build_id()?
        )))
    }

    pub fn is_application(&self) -> bool {
        self.get_value("app/entry").is_some_and(is_truthy)
    }

    pub fn application_metadata(
        &self,
        hasher: &dyn ContentHasher,
    ) -> Result<AppMeta, CoreError> {
        let icon = match self.get_value("app/icon").filter(|v| is_truthy(v)) {
            Some(value) => {
                let rel = value.as_str().ok_or_else(|| CoreError::InvalidField {
                    path: self.meta_path.clone(),
                    field: "app/icon".to_owned(),
                    reason: "expected a relative file path".to_owned(),
                })?;
                let icon_path = self.path.join(rel);
                let digest = hasher
                    .hash_file(&icon_path)
                    .map_err(|source| CoreError::Hash {
                        path: icon_path,
                        source,
                    })?;
                Some(format!("{digest}.png"))
            }
            None => None,
        };

        let declared = |field: &str| self.get_value(field).filter(|v| is_truthy(v)).cloned();
        Ok(AppMeta {
            kind: "app".to_owned(),
            icon,
            app_entry: declared("app/entry"),
            app_type: declared("app/type"),
            app_cli_opts: declared("app/cli_opts"),
            summary: declared("app/summary"),
        })
    }

    /// The info-index document for this recipe under the active configuration.
    pub fn summary_index(&self, hasher: &dyn ContentHasher) -> Result<InfoIndex, CoreError> {
        let mut depends: Vec<String> = self
            .dependencies(DependencyKind::Run)?
            .into_iter()
            .map(String::from)
            .collect();
        depends.sort();

        let app = if self.is_application() {
            Some(self.application_metadata(hasher)?)
        } else {
            None
        };

        Ok(InfoIndex {
            name: self.name()?,
            version: self.required_version()?.to_owned(),
            build: self.build_id()?,
            build_number: self.build_number()?,
            platform: self.config.platform().to_owned(),
            arch: self.config.arch().to_owned(),
            depends,
            app,
        })
    }

    fn required_version(&self) -> Result<&str, CoreError> {
        let version = self.version();
        if version.is_empty() {
            return Err(CoreError::MissingVersion(self.meta_path.clone()));
        }
        Ok(version)
    }
}

/// Scalars only; a mapping or sequence is never a usable name.
fn scalar_string(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn whole_number(n: &serde_yaml::Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && (0.0..=u64::MAX as f64).contains(f))
            .map(|f| f as u64)
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FixedHasher;

    impl ContentHasher for FixedHasher {
        fn hash_file(&self, path: &Path) -> io::Result<String> {
            if path.ends_with("missing.png") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no icon"));
            }
            Ok("d41d8cd98f00b204e9800998ecf8427e".to_owned())
        }
    }

    fn config() -> BuildConfig {
        BuildConfig::new("linux-64", 27, 19).unwrap()
    }

    fn recipe(text: &str) -> Recipe {
        Recipe::from_text("/recipes/test", text, &config()).unwrap()
    }

    #[test]
    fn build_id_encodes_pinned_runtimes() {
        let r = recipe(
            "package:\n  name: scipy\n  version: 0.14.0\nbuild:\n  number: 3\nrequirements:\n  run:\n    - python\n    - numpy 1.9*\n",
        );
        assert_eq!(r.build_id().unwrap(), BuildId::new("np19py27_3"));
        assert_eq!(
            r.distribution_name().unwrap(),
            DistName::new("scipy-0.14.0-np19py27_3")
        );
    }

    #[test]
    fn build_id_without_runtimes_is_build_number() {
        let r = recipe("package:\n  name: zlib\n  version: 1.2.8\nbuild:\n  number: 1\n");
        assert_eq!(r.build_id().unwrap(), BuildId::new("1"));
        assert_eq!(r.distribution_name().unwrap(), DistName::new("zlib-1.2.8-1"));
    }

    #[test]
    fn build_number_only_changes_trailing_segment() {
        let base = "package:\n  name: foo\n  version: 1.0\nrequirements:\n  run:\n    - python\n";
        let a = recipe(&format!("{base}build:\n  number: 0\n"));
        let b = recipe(&format!("{base}build:\n  number: 7\n"));
        assert_eq!(a.build_id().unwrap(), BuildId::new("py27_0"));
        assert_eq!(b.build_id().unwrap(), BuildId::new("py27_7"));
    }

    #[test]
    fn build_number_defaults_to_zero_and_accepts_strings() {
        assert_eq!(recipe("package:\n  name: a\n").build_number().unwrap(), 0);
        assert_eq!(
            recipe("package:\n  name: a\nbuild:\n  number: '4'\n")
                .build_number()
                .unwrap(),
            4
        );
        assert!(recipe("package:\n  name: a\nbuild:\n  number: four\n")
            .build_number()
            .is_err());
        assert!(recipe("package:\n  name: a\nbuild:\n  number: -1\n")
            .build_number()
            .is_err());
    }

    #[test]
    fn build_number_accepts_whole_floats_only() {
        let number = |n: &str| {
            recipe(&format!("package:\n  name: a\nbuild:\n  number: {n}\n")).build_number()
        };
        assert_eq!(number("3.0").unwrap(), 3);
        assert_eq!(number("0.0").unwrap(), 0);
        assert!(number("3.5").is_err());
        assert!(number("-2.0").is_err());
        assert!(number(".nan").is_err());
        assert!(number("'3.0'").is_err());
    }

    #[test]
    fn tagged_values_are_read_through_their_tag() {
        let r = recipe("package:\n  name: !pkg foo\n  version: 1\nbuild:\n  number: !num 4\n");
        assert_eq!(r.name().unwrap(), "foo");
        assert_eq!(r.build_number().unwrap(), 4);
        assert_eq!(r.distribution_name().unwrap(), DistName::new("foo-1-4"));
    }

    #[test]
    fn unconstrained_runtimes_are_pinned() {
        let r = recipe(
            "package:\n  name: a\nrequirements:\n  build:\n    - python\n    - numpy\n    - setuptools\n",
        );
        let specs: Vec<String> = r
            .dependencies(DependencyKind::Build)
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(specs, vec!["python 2.7*", "numpy 1.9*", "setuptools"]);
    }

    #[test]
    fn explicit_runtime_constraints_are_kept() {
        let r = recipe("package:\n  name: a\nrequirements:\n  run:\n    - python 3.4*\n");
        let specs = r.dependencies(DependencyKind::Run).unwrap();
        assert_eq!(specs[0].spec(), "python 3.4*");
        assert_eq!(r.build_id().unwrap(), BuildId::new("py34_0"));
    }

    #[test]
    fn short_runtime_version_cannot_form_build_id() {
        let r = recipe("package:\n  name: a\nrequirements:\n  run:\n    - python 3\n");
        assert!(matches!(r.build_id(), Err(CoreError::InvalidPin { .. })));
    }

    #[test]
    fn mixed_case_name_is_rejected() {
        let err = Recipe::from_text("/r", "package:\n  name: Foo\n", &config()).unwrap_err();
        assert!(matches!(err, CoreError::NameNotLowercase { ref name, .. } if name == "Foo"));
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = Recipe::from_text("/r", "package:\n  version: 1.0\n", &config()).unwrap_err();
        assert!(matches!(err, CoreError::MissingName(_)));
        let err = Recipe::from_text("/r", "package:\n  name: ''\n", &config()).unwrap_err();
        assert!(matches!(err, CoreError::MissingName(_)));
    }

    #[test]
    fn missing_version_blocks_distribution_name() {
        let r = recipe("package:\n  name: foo\n");
        assert_eq!(r.version(), "");
        assert!(matches!(
            r.distribution_name(),
            Err(CoreError::MissingVersion(_))
        ));
    }

    #[test]
    fn invalid_requirement_is_reported() {
        let r = recipe("package:\n  name: a\nrequirements:\n  run:\n    - a 1 b c\n");
        assert!(matches!(
            r.dependencies(DependencyKind::Run),
            Err(CoreError::Requirement { .. })
        ));
    }

    #[test]
    fn selectors_follow_configured_platform() {
        let text = "package:\n  name: a\n  version: 1\nrequirements:\n  run:\n    - pywin32  [win]\n    - readline  [unix]\n";
        let linux = Recipe::from_text("/r", text, &config()).unwrap();
        let win =
            Recipe::from_text("/r", text, &BuildConfig::new("win-64", 27, 19).unwrap()).unwrap();
        assert_eq!(linux.manifest().get_list("requirements/run"), vec!["readline"]);
        assert_eq!(win.manifest().get_list("requirements/run"), vec!["pywin32"]);
    }

    #[test]
    fn summary_index_for_plain_package() {
        let r = recipe(
            "package:\n  name: pycosat\n  version: 0.6.1\nrequirements:\n  run:\n    - python\n    - libgcc\n",
        );
        let index = r.summary_index(&FixedHasher).unwrap();
        assert_eq!(index.name, "pycosat");
        assert_eq!(index.version, "0.6.1");
        assert_eq!(index.build, BuildId::new("py27_0"));
        assert_eq!(index.build_number, 0);
        assert_eq!(index.platform, "linux");
        assert_eq!(index.arch, "x86_64");
        assert_eq!(index.depends, vec!["libgcc", "python 2.7*"]);
        assert!(index.app.is_none());

        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["build"], "py27_0");
        assert!(json.get("type").is_none());
    }

    #[test]
    fn summary_index_merges_app_metadata() {
        let r = recipe(
            "package:\n  name: ipython-notebook\n  version: 2.0\napp:\n  entry: ipython notebook\n  icon: icon.png\n  summary: Notebook\n  type: web\n",
        );
        assert!(r.is_application());
        let index = r.summary_index(&FixedHasher).unwrap();
        let app = index.app.as_ref().unwrap();
        assert_eq!(app.icon.as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e.png"));
        assert!(app.app_cli_opts.is_none());

        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["type"], "app");
        assert_eq!(json["app_entry"], "ipython notebook");
        assert_eq!(json["app_type"], "web");
        assert_eq!(json["summary"], "Notebook");
        assert!(json.get("app_cli_opts").is_none());
    }

    #[test]
    fn app_without_icon_has_no_icon_field() {
        let r = recipe("package:\n  name: a\n  version: 1\napp:\n  entry: run-a\n  summary: ''\n");
        let meta = r.application_metadata(&FixedHasher).unwrap();
        assert!(meta.icon.is_none());
        assert!(meta.summary.is_none());
        assert_eq!(meta.app_entry, Some(Value::from("run-a")));
    }

    #[test]
    fn icon_hash_failure_is_reported() {
        let r = recipe("package:\n  name: a\n  version: 1\napp:\n  entry: a\n  icon: missing.png\n");
        assert!(matches!(
            r.application_metadata(&FixedHasher),
            Err(CoreError::Hash { .. })
        ));
    }

    #[test]
    fn non_app_recipe() {
        let r = recipe("package:\n  name: a\napp:\n  summary: not an app\n");
        assert!(!r.is_application());
    }

    #[test]
    fn generic_accessors() {
        let r = recipe("package:\n  name: a\nabout:\n  license: BSD\n");
        assert_eq!(
            r.get_value("about/license").and_then(Value::as_str),
            Some("BSD")
        );
        assert!(r.get_section("about").is_some());
        assert!(r.get_section("extra").is_none());
        assert!(r.get_value("no-slash").is_none());
    }
}
