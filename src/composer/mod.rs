use crate::analysis::{Language, ProjectContext};
use crate::config::ComposerSettings;
use crate::tracker::{EditorContext, FileContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

mod patterns;

pub use patterns::{PatternDetector, Patterns, RegexPatternDetector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    CodeCompletion,
    CodeExplanation,
    BugFix,
    Documentation,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::CodeCompletion => "code-completion",
            RequestType::CodeExplanation => "code-explanation",
            RequestType::BugFix => "bug-fix",
            RequestType::Documentation => "documentation",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code-completion" => Ok(RequestType::CodeCompletion),
            "code-explanation" => Ok(RequestType::CodeExplanation),
            "bug-fix" => Ok(RequestType::BugFix),
            "documentation" => Ok(RequestType::Documentation),
            other => Err(format!("unknown request type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AiContextOptions {
    pub include_history: bool,
    pub request_type: Option<RequestType>,
    /// Error text reported by the user or a diagnostic, used by bug-fix views
    pub error_message: Option<String>,
}

impl AiContextOptions {
    /// Options for a request named by its tag. Unrecognised tags yield the
    /// plain composed context.
    pub fn for_request(tag: &str) -> Self {
        let request_type = match tag.parse() {
            Ok(request_type) => Some(request_type),
            Err(e) => {
                tracing::debug!("{}; returning base context", e);
                None
            }
        };

        Self {
            request_type,
            ..Default::default()
        }
    }

    pub fn with_history(mut self) -> Self {
        self.include_history = true;
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorContext {
    pub message: Option<String>,
    pub line: Option<usize>,
    pub line_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NamingConvention {
    #[serde(rename = "camelCase")]
    CamelCase,
    #[serde(rename = "snake_case")]
    SnakeCase,
    #[serde(rename = "PascalCase")]
    PascalCase,
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleGuide {
    Eslint,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestingFramework {
    Jest,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStandards {
    pub naming_convention: NamingConvention,
    pub style_guide: StyleGuide,
    pub testing_framework: TestingFramework,
}

/// Request-specific part of a composed context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "focus", rename_all = "kebab-case")]
pub enum FocusedContext {
    CodeCompletion {
        relevant_code: String,
        patterns: Patterns,
    },
    CodeExplanation {
        code_to_explain: String,
        related_files: Vec<PathBuf>,
    },
    BugFix {
        code_to_fix: String,
        error_context: ErrorContext,
        related_dependencies: Vec<String>,
    },
    Documentation {
        code_to_document: String,
        project_standards: ProjectStandards,
    },
}

impl FocusedContext {
    pub fn request_type(&self) -> RequestType {
        match self {
            FocusedContext::CodeCompletion { .. } => RequestType::CodeCompletion,
            FocusedContext::CodeExplanation { .. } => RequestType::CodeExplanation,
            FocusedContext::BugFix { .. } => RequestType::BugFix,
            FocusedContext::Documentation { .. } => RequestType::Documentation,
        }
    }
}

/// Everything handed to the AI layer for one request.
#[derive(Debug, Clone, Serialize)]
pub struct ComposedContext {
    pub project: Arc<ProjectContext>,
    pub file: Arc<FileContext>,
    pub editor: EditorContext,
    pub timestamp: DateTime<Utc>,
    pub ai_capabilities: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<FocusedContext>,
}

/// Stateless transform from live context snapshots to a `ComposedContext`.
pub struct ContextComposer {
    settings: ComposerSettings,
    detector: Box<dyn PatternDetector>,
}

impl Default for ContextComposer {
    fn default() -> Self {
        Self::new(ComposerSettings::default())
    }
}

impl ContextComposer {
    pub fn new(settings: ComposerSettings) -> Self {
        Self::with_detector(settings, Box::new(RegexPatternDetector))
    }

    pub fn with_detector(settings: ComposerSettings, detector: Box<dyn PatternDetector>) -> Self {
        Self { settings, detector }
    }

    pub fn compose(
        &self,
        project: Arc<ProjectContext>,
        file: Arc<FileContext>,
        editor: &EditorContext,
        ai_ready: bool,
        options: &AiContextOptions,
    ) -> ComposedContext {
        let editor = EditorContext {
            active_lines: editor.active_lines.clone(),
            visible_range: editor.visible_range,
            history: if options.include_history {
                editor.history.clone()
            } else {
                Default::default()
            },
        };

        let request = options.request_type.map(|request_type| match request_type {
            RequestType::CodeCompletion => FocusedContext::CodeCompletion {
                relevant_code: self.relevant_code(&file),
                patterns: self.detector.detect(&file.content),
            },
            RequestType::CodeExplanation => FocusedContext::CodeExplanation {
                code_to_explain: self.code_to_explain(&file),
                related_files: self.related_files(&project, &file),
            },
            RequestType::BugFix => FocusedContext::BugFix {
                code_to_fix: self.relevant_code(&file),
                error_context: error_context(&file, options.error_message.as_deref()),
                related_dependencies: related_dependencies(&project, &file),
            },
            RequestType::Documentation => FocusedContext::Documentation {
                code_to_document: self.relevant_code(&file),
                project_standards: self.project_standards(&project, &file),
            },
        });

        ComposedContext {
            project,
            file,
            editor,
            timestamp: Utc::now(),
            ai_capabilities: ai_ready,
            request,
        }
    }

    /// Lines around the cursor row, or the tail of the file when the cursor
    /// is unknown.
    pub fn relevant_code(&self, file: &FileContext) -> String {
        if file.content.is_empty() {
            return String::new();
        }

        let lines: Vec<&str> = file.content.split('\n').collect();
        let (start, end) = match file.cursor_position {
            Some(cursor) => (
                cursor.row.saturating_sub(self.settings.window_radius),
                cursor
                    .row
                    .saturating_add(self.settings.window_radius)
                    .min(lines.len()),
            ),
            None => (lines.len().saturating_sub(self.settings.tail_lines), lines.len()),
        };

        if start >= end {
            return String::new();
        }
        lines[start..end].join("\n")
    }

    fn code_to_explain(&self, file: &FileContext) -> String {
        match &file.selection {
            Some(selection) if !selection.is_empty() => selection.resolve(&file.content),
            _ => self.relevant_code(file),
        }
    }

    /// Files next to the open file named after its stem, e.g. `app.css` and
    /// `app.test.js` for `app.js`. `application.js` does not count.
    fn related_files(&self, project: &ProjectContext, file: &FileContext) -> Vec<PathBuf> {
        let Some(current) = file.path.as_deref() else {
            return Vec::new();
        };
        let dir = current.parent();
        let Some(stem) = current.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            return Vec::new();
        };
        let prefix = format!("{}.", stem);

        project
            .flatten()
            .into_iter()
            .filter(|node| node.is_file())
            .filter(|node| node.name() == stem || node.name().starts_with(&prefix))
            .map(|node| node.path())
            .filter(|path| *path != current && path.parent() == dir)
            .take(self.settings.max_related_files)
            .map(|path| path.to_path_buf())
            .collect()
    }

    fn project_standards(&self, project: &ProjectContext, file: &FileContext) -> ProjectStandards {
        let mut standards = ProjectStandards {
            naming_convention: self.naming_convention(&file.content),
            style_guide: StyleGuide::Unknown,
            testing_framework: TestingFramework::Unknown,
        };

        if project.language != Language::JavaScript {
            return standards;
        }

        let package: Option<JsonValue> = project
            .config_files
            .get("package.json")
            .and_then(|raw| match serde_json::from_str(raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("package.json is not valid JSON: {}", e);
                    None
                }
            });
        let has_field = |field: &str| package.as_ref().map_or(false, |pkg| pkg.get(field).is_some());

        if has_field("eslintConfig") || project.has_root_file(".eslintrc.js") {
            standards.style_guide = StyleGuide::Eslint;
        }
        if has_field("jest") || project.has_root_file("jest.config.js") {
            standards.testing_framework = TestingFramework::Jest;
        }

        standards
    }

    fn naming_convention(&self, content: &str) -> NamingConvention {
        let patterns = self.detector.detect(content);
        let (mut camel, mut snake, mut pascal) = (0usize, 0usize, 0usize);

        for name in patterns.function_names() {
            let trimmed = name.trim_matches('_');
            let Some(first) = trimmed.chars().next() else {
                continue;
            };
            if trimmed.contains('_') {
                snake += 1;
            } else if first.is_uppercase() {
                pascal += 1;
            } else if trimmed.chars().any(char::is_uppercase) {
                camel += 1;
            }
        }

        let best = camel.max(snake).max(pascal);
        if best == 0 || [camel, snake, pascal].iter().filter(|c| **c == best).count() > 1 {
            NamingConvention::Unknown
        } else if best == camel {
            NamingConvention::CamelCase
        } else if best == snake {
            NamingConvention::SnakeCase
        } else {
            NamingConvention::PascalCase
        }
    }
}

/// Runtime npm dependencies whose name appears anywhere in the file.
fn related_dependencies(project: &ProjectContext, file: &FileContext) -> Vec<String> {
    if file.content.is_empty() {
        return Vec::new();
    }

    project
        .dependencies
        .npm_names()
        .filter(|name| file.content.contains(name))
        .map(String::from)
        .collect()
}

fn error_context(file: &FileContext, message: Option<&str>) -> ErrorContext {
    let line = file.cursor_position.map(|cursor| cursor.row);
    let line_text = line.and_then(|row| file.content.split('\n').nth(row).map(String::from));

    ErrorContext {
        message: message.map(String::from),
        line,
        line_text,
    }
}
