//! The context manager: one per application, shared as `Arc<ContextManager>`.
//!
//! Snapshots are built without holding any lock and then swapped in with a
//! single assignment, so readers observe either the previous or the new
//! snapshot in full. Two overlapping `analyze_project` calls are not
//! serialized; the one that finishes last wins.

use crate::analysis::{Language, ProjectAnalyzer, ProjectContext};
use crate::cache::{CacheKind, ContextCache};
use crate::composer::{AiContextOptions, ComposedContext, ContextComposer};
use crate::config::ContextSettings;
use crate::error::Result;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::readiness::AiReadiness;
use crate::tracker::{EditorContext, EditorTracker, EditorUpdate, FileContext, FileContextOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone)]
pub enum CachedContext {
    Project(Arc<ProjectContext>),
    File(Arc<FileContext>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChange {
    Create,
    Modify,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSummary {
    pub project: ProjectSummary,
    pub file: FileSummary,
    pub editor: EditorSummary,
    pub cache_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub language: Language,
    pub has_dependencies: bool,
    pub config_file_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub path: Option<PathBuf>,
    pub language: Option<Language>,
    pub has_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSummary {
    pub history_count: usize,
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub struct ContextManager {
    settings: ContextSettings,
    fs: Arc<dyn FileSystem>,
    readiness: Arc<dyn AiReadiness>,
    analyzer: ProjectAnalyzer,
    composer: ContextComposer,
    project: RwLock<Arc<ProjectContext>>,
    file: RwLock<Arc<FileContext>>,
    editor: RwLock<EditorTracker>,
    cache: Mutex<ContextCache<CachedContext>>,
}

impl ContextManager {
    pub fn new(
        settings: ContextSettings,
        fs: Arc<dyn FileSystem>,
        readiness: Arc<dyn AiReadiness>,
    ) -> Self {
        Self {
            analyzer: ProjectAnalyzer::from_settings(&settings),
            composer: ContextComposer::new(settings.composer.clone()),
            project: RwLock::new(Arc::new(ProjectContext::default())),
            file: RwLock::new(Arc::new(FileContext::default())),
            editor: RwLock::new(EditorTracker::new(settings.editor.history_limit)),
            cache: Mutex::new(ContextCache::new(
                settings.cache.max_entries,
                settings.cache.max_age(),
            )),
            settings,
            fs,
            readiness,
        }
    }

    /// Manager over the local disk, with readiness taken from `settings.ai`.
    pub fn with_local_fs(settings: ContextSettings) -> Self {
        let readiness = Arc::new(settings.ai.clone());
        Self::new(settings, Arc::new(LocalFileSystem::new()), readiness)
    }

    pub fn with_composer(mut self, composer: ContextComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    /// Analyze the project at `project_path`. File-system change events are
    /// not watched here; route them to [`ContextManager::handle_file_change`].
    pub async fn initialize(&self, project_path: &Path) -> Result<()> {
        tracing::info!("Initializing context for project: {}", project_path.display());
        self.analyze_project(project_path).await?;
        tracing::info!("Context manager initialized");
        Ok(())
    }

    pub async fn analyze_project(&self, project_path: &Path) -> Result<Arc<ProjectContext>> {
        let project = Arc::new(self.analyzer.analyze(self.fs.as_ref(), project_path).await?);

        self.cache_set(
            CacheKind::Project,
            &path_key(project_path),
            CachedContext::Project(project.clone()),
        )
        .await;
        *self.project.write().await = project.clone();

        Ok(project)
    }

    pub async fn update_file_context(
        &self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        options: FileContextOptions,
    ) -> Arc<FileContext> {
        let path = path.into();
        let file = Arc::new(FileContext::new(path.clone(), content, options));

        self.cache_set(CacheKind::File, &path_key(&path), CachedContext::File(file.clone()))
            .await;
        *self.file.write().await = file.clone();

        tracing::debug!("Updated context for file: {}", path.display());
        file
    }

    /// Read `path` through the file system and make it the active file.
    pub async fn open_file(
        &self,
        path: &Path,
        options: FileContextOptions,
    ) -> Result<Arc<FileContext>> {
        let content = self.fs.read_file(path).await?;
        Ok(self.update_file_context(path, content, options).await)
    }

    pub async fn update_editor_context(&self, update: EditorUpdate) {
        self.editor.write().await.update(update);
    }

    pub async fn ai_context(&self, options: &AiContextOptions) -> ComposedContext {
        let toggles = &self.settings.context;

        let project = if toggles.project {
            self.project.read().await.clone()
        } else {
            Arc::new(ProjectContext::default())
        };
        let file = if toggles.file {
            self.file.read().await.clone()
        } else {
            Arc::new(FileContext::default())
        };
        let ai_ready = self.readiness.is_ai_ready();

        if toggles.editor {
            let editor = self.editor.read().await;
            self.composer
                .compose(project, file, editor.context(), ai_ready, options)
        } else {
            self.composer
                .compose(project, file, &EditorContext::default(), ai_ready, options)
        }
    }

    /// React to a change notification from the host's file watcher.
    pub async fn handle_file_change(&self, path: &Path, change: FileChange) {
        match change {
            FileChange::Create | FileChange::Modify => {
                let current = self.file.read().await.clone();
                if current.path.as_deref() != Some(path) {
                    return;
                }

                match self.fs.read_file(path).await {
                    Ok(content) => {
                        let options = FileContextOptions {
                            cursor_position: current.cursor_position,
                            ..Default::default()
                        };
                        self.update_file_context(path, content, options).await;
                    }
                    Err(e) => {
                        tracing::warn!("Could not refresh context for {}: {}", path.display(), e)
                    }
                }
            }
            FileChange::Delete => {
                self.cache.lock().await.remove(CacheKind::File, &path_key(path));

                let mut file = self.file.write().await;
                if file.path.as_deref() == Some(path) {
                    *file = Arc::new(FileContext::default());
                    tracing::debug!("Cleared context for deleted file: {}", path.display());
                }
            }
        }
    }

    pub async fn cached_project(&self, project_path: &Path) -> Option<Arc<ProjectContext>> {
        match self.cache.lock().await.get(CacheKind::Project, &path_key(project_path)) {
            Some(CachedContext::Project(project)) => Some(project),
            _ => None,
        }
    }

    pub async fn cached_file(&self, path: &Path) -> Option<Arc<FileContext>> {
        match self.cache.lock().await.get(CacheKind::File, &path_key(path)) {
            Some(CachedContext::File(file)) => Some(file),
            _ => None,
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn project(&self) -> Arc<ProjectContext> {
        self.project.read().await.clone()
    }

    pub async fn file(&self) -> Arc<FileContext> {
        self.file.read().await.clone()
    }

    pub async fn summary(&self) -> ContextSummary {
        let project = self.project().await;
        let file = self.file().await;
        let history_count = self.editor.read().await.history_len();
        let cache_size = self.cache.lock().await.len();

        ContextSummary {
            project: ProjectSummary {
                language: project.language,
                has_dependencies: !project.dependencies.is_empty(),
                config_file_count: project.config_files.len(),
            },
            file: FileSummary {
                path: file.path.clone(),
                language: file.language,
                has_content: !file.content.is_empty(),
            },
            editor: EditorSummary { history_count },
            cache_size,
        }
    }

    async fn cache_set(&self, kind: CacheKind, key: &str, data: CachedContext) {
        if self.settings.cache.enabled {
            self.cache.lock().await.set(kind, key, data);
        }
    }
}
