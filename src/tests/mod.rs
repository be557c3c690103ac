use crate::config::ContextSettings;
use crate::error::{ContextError, Result};
use crate::fs::{FileSystem, FsEntry};
use crate::manager::ContextManager;
use crate::readiness::StaticReadiness;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;


// Test utilities and helpers
pub(crate) struct TestUtils;

impl TestUtils {
    /// A JavaScript project with `react` as its only runtime dependency and
    /// a single source file `src/app.js`.
    pub fn create_react_project(app_js: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        std::fs::write(
            root.join("package.json"),
            r#"{"name": "demo", "dependencies": {"react": "18.0.0"}}"#,
        )
        .unwrap();
        std::fs::create_dir(root.join("src")).unwrap();
        std::fs::write(root.join("src").join("app.js"), app_js).unwrap();

        temp_dir
    }

    pub fn create_manager(settings: ContextSettings, fs: Arc<dyn FileSystem>) -> ContextManager {
        ContextManager::new(settings, fs, Arc::new(StaticReadiness(true)))
    }

    pub fn create_local_manager() -> ContextManager {
        Self::create_manager(
            ContextSettings::default(),
            Arc::new(crate::fs::LocalFileSystem::new()),
        )
    }
}

/// In-memory `FileSystem`. Directories are implied by the file paths.
#[derive(Debug, Default)]
pub(crate) struct MemoryFileSystem {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFileSystem {
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(path, content)| (PathBuf::from(path), content.to_string()))
                .collect(),
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn list(&self, path: &Path) -> Result<Vec<FsEntry>> {
        if !self.is_dir(path) {
            return Err(ContextError::io(path, io::Error::from(io::ErrorKind::NotFound)));
        }

        let mut entries: BTreeMap<String, FsEntry> = BTreeMap::new();
        for file in self.files.keys() {
            let Ok(rest) = file.strip_prefix(path) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let is_directory = components.next().is_some();

            entries.entry(name.clone()).or_insert_with(|| FsEntry {
                path: path.join(&name),
                name,
                is_directory,
            });
        }

        Ok(entries.into_values().collect())
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ContextError::io(path, io::Error::from(io::ErrorKind::NotFound)))
    }

    async fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.is_dir(path)
    }
}
