use crate::config::ContextSettings;
use crate::error::Result;
use crate::fs::FileSystem;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

mod dependencies;
mod language;

pub use dependencies::{
    parse_go_mod, parse_requirements, DependencyAnalyzer, DependencyMap, ManifestDependencies,
    VersionMap,
};
pub use language::{detect_language, detect_project_language, file_extension, Language};

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    "dist",
    "build",
    "target",
    ".vscode",
    ".idea",
    "__pycache__",
];

/// Root-level files whose raw text is kept in `ProjectContext::config_files`.
pub const CONFIG_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "go.mod",
    "Cargo.toml",
    "pom.xml",
    "build.gradle",
    "pubspec.yaml",
    ".gitignore",
    "Dockerfile",
    "docker-compose.yml",
    "README.md",
    "LICENSE",
];

pub const MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StructureNode {
    File {
        name: String,
        path: PathBuf,
        language: Language,
    },
    Directory {
        name: String,
        path: PathBuf,
        children: Vec<StructureNode>,
    },
}

impl StructureNode {
    pub fn name(&self) -> &str {
        match self {
            StructureNode::File { name, .. } | StructureNode::Directory { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StructureNode::File { path, .. } | StructureNode::Directory { path, .. } => path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, StructureNode::File { .. })
    }
}

/// Snapshot of an analyzed project. Replaced wholesale on re-analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub structure: Vec<StructureNode>,
    pub dependencies: DependencyMap,
    pub config_files: IndexMap<String, String>,
    pub language: Language,
}

impl ProjectContext {
    /// All nodes of the structure tree in pre-order.
    pub fn flatten(&self) -> Vec<&StructureNode> {
        fn walk<'a>(nodes: &'a [StructureNode], out: &mut Vec<&'a StructureNode>) {
            for node in nodes {
                out.push(node);
                if let StructureNode::Directory { children, .. } = node {
                    walk(children, out);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.structure, &mut out);
        out
    }

    /// True when `file_name` is either slurped as a config file or sits at
    /// the project root.
    pub fn has_root_file(&self, file_name: &str) -> bool {
        self.config_files.contains_key(file_name)
            || self
                .structure
                .iter()
                .any(|node| node.is_file() && node.name() == file_name)
    }
}

pub struct ProjectAnalyzer {
    max_depth: usize,
    extra_exclusions: Vec<glob::Pattern>,
    extract_dependencies: bool,
    dependency_analyzer: DependencyAnalyzer,
}

impl Default for ProjectAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

type StructureFuture<'a> = Pin<Box<dyn Future<Output = Vec<StructureNode>> + Send + 'a>>;

impl ProjectAnalyzer {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            extra_exclusions: Vec::new(),
            extract_dependencies: true,
            dependency_analyzer: DependencyAnalyzer::new(),
        }
    }

    pub fn from_settings(settings: &ContextSettings) -> Self {
        let extra_exclusions = settings
            .analysis
            .excluded_dirs
            .iter()
            .filter_map(|pattern| match glob::Pattern::new(pattern) {
                Ok(glob) => Some(glob),
                Err(e) => {
                    tracing::warn!("Ignoring exclusion pattern {:?}: {}", pattern, e);
                    None
                }
            })
            .collect();

        Self {
            max_depth: settings.analysis.max_depth.min(MAX_DEPTH),
            extra_exclusions,
            extract_dependencies: settings.context.dependencies,
            dependency_analyzer: DependencyAnalyzer::new(),
        }
    }

    pub fn should_skip_directory(&self, name: &str) -> bool {
        EXCLUDED_DIRS.contains(&name) || self.extra_exclusions.iter().any(|p| p.matches(name))
    }

    /// Build a fresh `ProjectContext` for `root`.
    ///
    /// Fails only when the root itself cannot be listed. Errors deeper in the
    /// tree, in manifests, or in config files leave the affected part empty.
    pub async fn analyze(&self, fs: &dyn FileSystem, root: &Path) -> Result<ProjectContext> {
        let root_entries = fs.list(root).await?;

        let mut structure = Vec::new();
        for entry in &root_entries {
            if entry.is_directory {
                if self.should_skip_directory(&entry.name) {
                    continue;
                }
                structure.push(StructureNode::Directory {
                    name: entry.name.clone(),
                    path: entry.path.clone(),
                    children: self.walk(fs, &entry.path, 1).await,
                });
            } else {
                structure.push(StructureNode::File {
                    name: entry.name.clone(),
                    path: entry.path.clone(),
                    language: detect_language(&entry.name),
                });
            }
        }

        let language = detect_project_language(&root_entries);

        let dependencies = if self.extract_dependencies {
            self.dependency_analyzer.analyze(fs, root).await
        } else {
            DependencyMap::default()
        };

        let config_files = self.read_config_files(fs, root).await;

        tracing::info!(
            "Analyzed {}: {} top-level entries, language {}",
            root.display(),
            structure.len(),
            language
        );

        Ok(ProjectContext {
            root: root.to_path_buf(),
            structure,
            dependencies,
            config_files,
            language,
        })
    }

    fn walk<'a>(&'a self, fs: &'a dyn FileSystem, dir: &'a Path, depth: usize) -> StructureFuture<'a> {
        Box::pin(async move {
            if depth > self.max_depth {
                return Vec::new();
            }

            let entries = match fs.list(dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Could not list {}: {}", dir.display(), e);
                    return Vec::new();
                }
            };

            let mut nodes = Vec::with_capacity(entries.len());
            for entry in entries {
                if entry.is_directory {
                    if self.should_skip_directory(&entry.name) {
                        continue;
                    }
                    let children = self.walk(fs, &entry.path, depth + 1).await;
                    nodes.push(StructureNode::Directory {
                        name: entry.name,
                        path: entry.path,
                        children,
                    });
                } else {
                    let language = detect_language(&entry.name);
                    nodes.push(StructureNode::File {
                        name: entry.name,
                        path: entry.path,
                        language,
                    });
                }
            }
            nodes
        })
    }

    async fn read_config_files(&self, fs: &dyn FileSystem, root: &Path) -> IndexMap<String, String> {
        let mut configs = IndexMap::new();

        for file_name in CONFIG_FILES {
            let path = root.join(file_name);
            if !fs.exists(&path).await {
                continue;
            }
            match fs.read_file(&path).await {
                Ok(content) => {
                    configs.insert(file_name.to_string(), content);
                }
                Err(e) => tracing::warn!("Could not read config file {}: {}", file_name, e),
            }
        }

        configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(
            root.join("package.json"),
            r#"{"name": "app", "dependencies": {"react": "18.0.0"}}"#,
        )
        .unwrap();
        fs::write(root.join("README.md"), "# App\n").unwrap();
        fs::create_dir_all(root.join("src/components")).unwrap();
        fs::write(root.join("src/app.js"), "console.log('hi');\n").unwrap();
        fs::write(root.join("src/components/button.tsx"), "export {}\n").unwrap();
        fs::create_dir_all(root.join("node_modules/react")).unwrap();
        fs::write(root.join("node_modules/foo.js"), "module.exports = 1;\n").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();

        temp_dir
    }

    fn node_depth(root: &Path, node: &StructureNode) -> usize {
        node.path().strip_prefix(root).unwrap().components().count() - 1
    }

    #[tokio::test]
    async fn test_analyze_project() {
        let temp_dir = setup_test_project();
        let analyzer = ProjectAnalyzer::new();

        let project = analyzer
            .analyze(&LocalFileSystem::new(), temp_dir.path())
            .await
            .unwrap();

        assert_eq!(project.language, Language::JavaScript);
        let npm = project.dependencies.npm.as_ref().unwrap();
        assert_eq!(npm.dependencies.get("react").map(String::as_str), Some("18.0.0"));

        let config_names: Vec<_> = project.config_files.keys().map(String::as_str).collect();
        assert_eq!(config_names, vec!["package.json", "README.md"]);

        let app = project
            .flatten()
            .into_iter()
            .find(|n| n.name() == "app.js")
            .cloned()
            .unwrap();
        match app {
            StructureNode::File { language, .. } => assert_eq!(language, Language::JavaScript),
            other => panic!("expected a file node, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_excluded_directories_are_skipped() {
        let temp_dir = setup_test_project();
        let project = ProjectAnalyzer::new()
            .analyze(&LocalFileSystem::new(), temp_dir.path())
            .await
            .unwrap();

        let names: Vec<_> = project.flatten().iter().map(|n| n.name().to_string()).collect();
        assert!(!names.contains(&"foo.js".to_string()));
        assert!(!names.contains(&"node_modules".to_string()));
        assert!(!names.contains(&".git".to_string()));
        assert!(names.contains(&"button.tsx".to_string()));
    }

    #[tokio::test]
    async fn test_depth_bound() {
        let temp_dir = TempDir::new().unwrap();
        let mut dir = temp_dir.path().to_path_buf();
        for level in 0..9 {
            dir = dir.join(format!("d{}", level));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("f{}.py", level)), "pass\n").unwrap();
        }

        let project = ProjectAnalyzer::new()
            .analyze(&LocalFileSystem::new(), temp_dir.path())
            .await
            .unwrap();

        let deepest = project
            .flatten()
            .iter()
            .map(|n| node_depth(temp_dir.path(), n))
            .max()
            .unwrap();
        assert_eq!(deepest, MAX_DEPTH);
    }

    #[tokio::test]
    async fn test_configured_depth_and_exclusions() {
        let temp_dir = setup_test_project();
        fs::create_dir_all(temp_dir.path().join("vendor-libs")).unwrap();
        fs::write(temp_dir.path().join("vendor-libs/lib.js"), "").unwrap();

        let mut settings = ContextSettings::default();
        settings.analysis.max_depth = 1;
        settings.analysis.excluded_dirs = vec!["vendor*".to_string()];
        settings.context.dependencies = false;

        let project = ProjectAnalyzer::from_settings(&settings)
            .analyze(&LocalFileSystem::new(), temp_dir.path())
            .await
            .unwrap();

        let names: Vec<_> = project.flatten().iter().map(|n| n.name().to_string()).collect();
        assert!(!names.contains(&"lib.js".to_string()));
        assert!(names.contains(&"app.js".to_string()));
        assert!(!names.contains(&"button.tsx".to_string()));
        assert!(project.dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let result = ProjectAnalyzer::new()
            .analyze(&LocalFileSystem::new(), Path::new("/nonexistent/project/root"))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_has_root_file() {
        let project = ProjectContext {
            structure: vec![StructureNode::File {
                name: "jest.config.js".to_string(),
                path: PathBuf::from("/p/jest.config.js"),
                language: Language::JavaScript,
            }],
            ..Default::default()
        };
        assert!(project.has_root_file("jest.config.js"));
        assert!(!project.has_root_file(".eslintrc.js"));
    }
}
