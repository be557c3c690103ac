use crate::analysis::{detect_language, Language};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Zero-based row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub row: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub start: CursorPosition,
    pub end: CursorPosition,
    /// Selected text as reported by the editor, when it sends it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Selection {
    pub fn new(start: CursorPosition, end: CursorPosition) -> Self {
        Self {
            start,
            end,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end && self.text.as_deref().map_or(true, str::is_empty)
    }

    /// The selected text: the editor-supplied text if any, otherwise the
    /// slice of `content` between `start` and `end`.
    pub fn resolve(&self, content: &str) -> String {
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            return text.to_string();
        }

        let (start, end) = if (self.start.row, self.start.column) <= (self.end.row, self.end.column)
        {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };

        let lines: Vec<&str> = content.split('\n').collect();
        if start.row >= lines.len() {
            return String::new();
        }
        let last_row = end.row.min(lines.len() - 1);

        let mut selected = Vec::with_capacity(last_row - start.row + 1);
        for row in start.row..=last_row {
            let line: Vec<char> = lines[row].chars().collect();
            let from = if row == start.row { start.column.min(line.len()) } else { 0 };
            let to = if row == end.row { end.column.min(line.len()) } else { line.len() };
            selected.push(line[from..to.max(from)].iter().collect::<String>());
        }
        selected.join("\n")
    }
}

/// The currently open file. Replaced wholesale on every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileContext {
    pub path: Option<PathBuf>,
    pub content: String,
    pub language: Option<Language>,
    pub cursor_position: Option<CursorPosition>,
    pub selection: Option<Selection>,
}

#[derive(Debug, Clone, Default)]
pub struct FileContextOptions {
    pub language: Option<Language>,
    pub cursor_position: Option<CursorPosition>,
    pub selection: Option<Selection>,
}

impl FileContext {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, options: FileContextOptions) -> Self {
        let path = path.into();
        let language = options
            .language
            .unwrap_or_else(|| detect_language(&path.to_string_lossy()));

        Self {
            path: Some(path),
            content: content.into(),
            language: Some(language),
            cursor_position: options.cursor_position,
            selection: options.selection,
        }
    }

    pub fn is_open(&self) -> bool {
        self.path.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

/// One editor event. Absent fields leave the tracked value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_lines: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_range: Option<LineRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_position: Option<CursorPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    #[serde(flatten)]
    pub update: EditorUpdate,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorContext {
    pub active_lines: Vec<usize>,
    pub visible_range: Option<LineRange>,
    pub history: VecDeque<EditorSnapshot>,
}

/// Editor state for the session, with a sliding window of recent events.
#[derive(Debug, Clone)]
pub struct EditorTracker {
    context: EditorContext,
    history_limit: usize,
}

impl Default for EditorTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl EditorTracker {
    pub fn new(history_limit: usize) -> Self {
        Self {
            context: EditorContext::default(),
            history_limit: history_limit.max(1),
        }
    }

    pub fn update(&mut self, update: EditorUpdate) {
        if let Some(lines) = &update.active_lines {
            self.context.active_lines = lines.clone();
        }
        if let Some(range) = update.visible_range {
            self.context.visible_range = Some(range);
        }

        self.context.history.push_back(EditorSnapshot {
            update,
            timestamp: Utc::now(),
        });
        while self.context.history.len() > self.history_limit {
            self.context.history.pop_front();
        }
    }

    pub fn context(&self) -> &EditorContext {
        &self.context
    }

    pub fn history_len(&self) -> usize {
        self.context.history.len()
    }
}
