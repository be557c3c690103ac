pub mod analysis;
pub mod cache;
pub mod composer;
pub mod config;
pub mod error;
pub mod fs;
pub mod manager;
pub mod readiness;
pub mod tracker;

// Re-export commonly used types
pub use analysis::{DependencyMap, Language, ProjectAnalyzer, ProjectContext, StructureNode};
pub use cache::{CacheKind, ContextCache};
pub use composer::{AiContextOptions, ComposedContext, ContextComposer, FocusedContext, RequestType};
pub use config::ContextSettings;
pub use error::{ContextError, Result};
pub use fs::{FileSystem, FsEntry, LocalFileSystem};
pub use manager::{ContextManager, ContextSummary, FileChange};
pub use readiness::{AiReadiness, StaticReadiness};
pub use tracker::{
    CursorPosition, EditorContext, EditorTracker, EditorUpdate, FileContext, FileContextOptions,
    Selection,
};

#[cfg(test)]
mod tests;
