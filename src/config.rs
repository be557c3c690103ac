use crate::error::{ContextError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
#[serde(default)]
pub struct ContextSettings {
    pub context: ContextToggles,
    #[validate]
    pub analysis: AnalysisSettings,
    #[validate]
    pub cache: CacheSettings,
    #[validate]
    pub editor: EditorSettings,
    pub composer: ComposerSettings,
    pub ai: AiSettings,
}

/// Which parts of the live context are handed to the AI layer.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ContextToggles {
    pub project: bool,
    pub dependencies: bool,
    pub file: bool,
    pub editor: bool,
}

impl Default for ContextToggles {
    fn default() -> Self {
        Self {
            project: true,
            dependencies: true,
            file: true,
            editor: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(default)]
pub struct AnalysisSettings {
    #[validate(range(min = 1, max = 5, message = "max_depth must be between 1 and 5"))]
    pub max_depth: usize,
    /// Glob patterns matched against directory names, on top of the
    /// built-in exclusions.
    pub excluded_dirs: Vec<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_depth: 5,
            excluded_dirs: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    #[validate(range(min = 1, message = "Cache must hold at least one entry"))]
    pub max_entries: usize,
    pub max_age_secs: u64,
}

impl CacheSettings {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 100,
            max_age_secs: 300,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(default)]
pub struct EditorSettings {
    #[validate(range(min = 1, message = "History must keep at least one entry"))]
    pub history_limit: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self { history_limit: 50 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ComposerSettings {
    /// Lines taken before and after the cursor row
    pub window_radius: usize,
    /// Lines taken from the end of the file when no cursor is known
    pub tail_lines: usize,
    pub max_related_files: usize,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            window_radius: 10,
            tail_lines: 50,
            max_related_files: 5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub cloud_mode: bool,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            cloud_mode: true,
        }
    }
}

impl ContextSettings {
    pub fn create_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&ContextSettings::default())
            .map_err(|e| ContextError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ContextError::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| ContextError::io(path, e))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ContextError::io(path, e))?;
        let settings: ContextSettings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings from the user config file, or defaults when it does not exist.
    pub fn load_or_default() -> Result<Self> {
        let config_path = get_config_path()?;

        if !config_path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        Self::load(&config_path)
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "context-manager", "context-manager")
        .ok_or_else(|| ContextError::Config("Could not determine config directory".to_string()))?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = ContextSettings::default();
        assert_eq!(settings.analysis.max_depth, 5);
        assert_eq!(settings.cache.max_entries, 100);
        assert_eq!(settings.cache.max_age(), Duration::from_secs(300));
        assert_eq!(settings.editor.history_limit, 50);
        assert_eq!(settings.composer.window_radius, 10);
        assert!(settings.context.dependencies);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_create_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        ContextSettings::create_default(&path).unwrap();
        let loaded = ContextSettings::load(&path).unwrap();

        assert_eq!(loaded.cache.max_entries, 100);
        assert!(loaded.ai.cloud_mode);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[analysis]\nmax_depth = 3\nexcluded_dirs = [\"vendor*\"]\n\n[context]\neditor = false\n",
        )
        .unwrap();

        let loaded = ContextSettings::load(&path).unwrap();
        assert_eq!(loaded.analysis.max_depth, 3);
        assert_eq!(loaded.analysis.excluded_dirs, vec!["vendor*".to_string()]);
        assert!(!loaded.context.editor);
        assert!(loaded.context.project);
        assert_eq!(loaded.editor.history_limit, 50);
    }

    #[test]
    fn test_out_of_range_depth_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[analysis]\nmax_depth = 9\n").unwrap();

        let result = ContextSettings::load(&path);
        assert!(matches!(result, Err(ContextError::Validation(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ContextSettings::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ContextError::Io { .. })));
    }
}
