use crate::error::{ContextError, Result};
use crate::fs::FileSystem;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use toml::Value as TomlValue;

/// Name to version constraint, in manifest order.
pub type VersionMap = IndexMap<String, String>;

/// Runtime and development dependencies of one manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestDependencies {
    pub dependencies: VersionMap,
    pub dev_dependencies: VersionMap,
}

/// Dependencies per ecosystem. An ecosystem is `None` when its manifest is
/// absent or could not be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyMap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npm: Option<ManifestDependencies>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pip: Option<VersionMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go: Option<VersionMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<ManifestDependencies>,
    #[serde(rename = "pub", skip_serializing_if = "Option::is_none")]
    pub dart_pub: Option<ManifestDependencies>,
}

impl DependencyMap {
    pub fn ecosystem_count(&self) -> usize {
        [
            self.npm.is_some(),
            self.pip.is_some(),
            self.go.is_some(),
            self.cargo.is_some(),
            self.dart_pub.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.ecosystem_count() == 0
    }

    /// Runtime npm dependency names, empty when there is no `package.json`.
    pub fn npm_names(&self) -> impl Iterator<Item = &str> {
        self.npm
            .iter()
            .flat_map(|npm| npm.dependencies.keys().map(String::as_str))
    }
}

trait DependencyParser: Send + Sync {
    fn manifest(&self) -> &'static str;
    fn parse(&self, content: &str, path: &Path, deps: &mut DependencyMap) -> Result<()>;
}

struct NodeDependencyParser;
struct PythonDependencyParser;
struct GoDependencyParser;
struct RustDependencyParser;
struct DartDependencyParser;

#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: IndexMap<String, JsonValue>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: IndexMap<String, JsonValue>,
}

fn json_versions(section: IndexMap<String, JsonValue>) -> VersionMap {
    section
        .into_iter()
        .map(|(name, version)| {
            let version = match version {
                JsonValue::String(v) => v,
                other => other.to_string(),
            };
            (name, version)
        })
        .collect()
}

impl DependencyParser for NodeDependencyParser {
    fn manifest(&self) -> &'static str {
        "package.json"
    }

    fn parse(&self, content: &str, path: &Path, deps: &mut DependencyMap) -> Result<()> {
        let package: PackageJson =
            serde_json::from_str(content).map_err(|e| ContextError::parse(path, e))?;

        deps.npm = Some(ManifestDependencies {
            dependencies: json_versions(package.dependencies),
            dev_dependencies: json_versions(package.dev_dependencies),
        });
        Ok(())
    }
}

impl DependencyParser for PythonDependencyParser {
    fn manifest(&self) -> &'static str {
        "requirements.txt"
    }

    fn parse(&self, content: &str, _path: &Path, deps: &mut DependencyMap) -> Result<()> {
        deps.pip = Some(parse_requirements(content));
        Ok(())
    }
}

impl DependencyParser for GoDependencyParser {
    fn manifest(&self) -> &'static str {
        "go.mod"
    }

    fn parse(&self, content: &str, _path: &Path, deps: &mut DependencyMap) -> Result<()> {
        deps.go = Some(parse_go_mod(content));
        Ok(())
    }
}

fn toml_versions(section: Option<&TomlValue>) -> VersionMap {
    let Some(table) = section.and_then(|d| d.as_table()) else {
        return VersionMap::new();
    };

    table
        .iter()
        .map(|(name, version)| {
            let version_str = match version {
                TomlValue::String(v) => v.clone(),
                TomlValue::Table(t) => t
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("*")
                    .to_string(),
                _ => "*".to_string(),
            };
            (name.clone(), version_str)
        })
        .collect()
}

impl DependencyParser for RustDependencyParser {
    fn manifest(&self) -> &'static str {
        "Cargo.toml"
    }

    fn parse(&self, content: &str, path: &Path, deps: &mut DependencyMap) -> Result<()> {
        let cargo_toml: TomlValue =
            toml::from_str(content).map_err(|e| ContextError::parse(path, e))?;

        deps.cargo = Some(ManifestDependencies {
            dependencies: toml_versions(cargo_toml.get("dependencies")),
            dev_dependencies: toml_versions(cargo_toml.get("dev-dependencies")),
        });
        Ok(())
    }
}

fn yaml_versions(section: Option<&serde_yaml::Value>) -> VersionMap {
    let Some(mapping) = section.and_then(|d| d.as_mapping()) else {
        return VersionMap::new();
    };

    mapping
        .iter()
        .filter_map(|(name, version)| {
            let name = name.as_str()?.to_string();
            let version = match version {
                serde_yaml::Value::String(v) => v.clone(),
                serde_yaml::Value::Mapping(m) => m
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("*")
                    .to_string(),
                _ => "*".to_string(),
            };
            Some((name, version))
        })
        .collect()
}

impl DependencyParser for DartDependencyParser {
    fn manifest(&self) -> &'static str {
        "pubspec.yaml"
    }

    fn parse(&self, content: &str, path: &Path, deps: &mut DependencyMap) -> Result<()> {
        let pubspec: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ContextError::parse(path, e))?;

        deps.dart_pub = Some(ManifestDependencies {
            dependencies: yaml_versions(pubspec.get("dependencies")),
            dev_dependencies: yaml_versions(pubspec.get("dev_dependencies")),
        });
        Ok(())
    }
}

const VERSION_OPERATORS: &[char] = &['=', '~', '<', '>'];

/// Parse `requirements.txt`. The name ends at the first version operator;
/// unconstrained requirements map to `"latest"`.
pub fn parse_requirements(content: &str) -> VersionMap {
    let mut requirements = VersionMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.find(VERSION_OPERATORS) {
            Some(idx) => {
                let name = line[..idx].trim();
                let rest = line[idx..].trim_start_matches(VERSION_OPERATORS);
                let version = rest
                    .split(VERSION_OPERATORS)
                    .next()
                    .unwrap_or_default()
                    .trim();
                requirements.insert(name.to_string(), version.to_string());
            }
            None => {
                requirements.insert(line.to_string(), "latest".to_string());
            }
        }
    }

    requirements
}

/// Parse the `require` section of a `go.mod` file.
///
/// A line starting with `require` opens the section and a line that is
/// exactly `}` closes it. The `require` line itself is never read as a
/// dependency, so single-line `require module version` entries are skipped.
pub fn parse_go_mod(content: &str) -> VersionMap {
    let mut dependencies = VersionMap::new();
    let mut in_require_block = false;

    for line in content.lines() {
        let line = line.trim();

        if line.starts_with("require") {
            in_require_block = true;
            continue;
        }

        if line == "}" && in_require_block {
            in_require_block = false;
            continue;
        }

        if in_require_block && !line.is_empty() && !line.starts_with("//") {
            let mut parts = line.split_whitespace();
            if let (Some(module), Some(version)) = (parts.next(), parts.next()) {
                dependencies.insert(module.to_string(), version.to_string());
            }
        }
    }

    dependencies
}

pub struct DependencyAnalyzer {
    dependency_parsers: Vec<Box<dyn DependencyParser>>,
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self {
            dependency_parsers: vec![
                Box::new(NodeDependencyParser),
                Box::new(PythonDependencyParser),
                Box::new(GoDependencyParser),
                Box::new(RustDependencyParser),
                Box::new(DartDependencyParser),
            ],
        }
    }

    /// Extract dependencies for every manifest found at the project root.
    /// A manifest that cannot be read or parsed is left out; the rest are
    /// still extracted.
    pub async fn analyze(&self, fs: &dyn FileSystem, root: &Path) -> DependencyMap {
        let mut deps = DependencyMap::default();

        for parser in &self.dependency_parsers {
            let manifest_path = root.join(parser.manifest());
            if !fs.exists(&manifest_path).await {
                continue;
            }

            let outcome = match fs.read_file(&manifest_path).await {
                Ok(content) => parser.parse(&content, &manifest_path, &mut deps),
                Err(e) => Err(e),
            };

            if let Err(e) = outcome {
                tracing::warn!("Skipping {} dependencies: {}", parser.manifest(), e);
            }
        }

        deps
    }
}
