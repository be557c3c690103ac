use crate::fs::FsEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Go,
    Rust,
    Java,
    Kotlin,
    Dart,
    Swift,
    C,
    Cpp,
    Php,
    Ruby,
    Html,
    Css,
    Vue,
    Svelte,
    /// A file whose extension is not recognised
    Text,
    /// A project whose primary language could not be inferred
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "jsx" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "py" => Language::Python,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "java" => Language::Java,
            "kt" | "kts" => Language::Kotlin,
            "dart" => Language::Dart,
            "swift" => Language::Swift,
            "c" => Language::C,
            "cpp" | "h" | "hpp" => Language::Cpp,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "html" => Language::Html,
            "css" => Language::Css,
            "vue" => Language::Vue,
            "svelte" => Language::Svelte,
            _ => Language::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Dart => "dart",
            Language::Swift => "swift",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Html => "html",
            Language::Css => "css",
            Language::Vue => "vue",
            Language::Svelte => "svelte",
            Language::Text => "text",
            Language::Unknown => "unknown",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Unknown
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text after the last `.` of a file name, or `""` when there is none.
pub fn file_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// Language of a single file, judged by its extension. Never fails.
pub fn detect_language(file_name: &str) -> Language {
    let name = file_name.rsplit(&['/', '\\'][..]).next().unwrap_or(file_name);
    Language::from_extension(file_extension(name))
}

// Checked in order; the first manifest present decides.
const MANIFEST_LANGUAGES: &[(&str, Language)] = &[
    ("package.json", Language::JavaScript),
    ("requirements.txt", Language::Python),
    ("pyproject.toml", Language::Python),
    ("go.mod", Language::Go),
    ("cargo.toml", Language::Rust),
    ("pom.xml", Language::Java),
    ("build.gradle", Language::Java),
    ("pubspec.yaml", Language::Dart),
    ("build.gradle.kts", Language::Kotlin),
];

const EXTENSION_LANGUAGES: &[(&[&str], Language)] = &[
    (&["js", "ts"], Language::JavaScript),
    (&["py"], Language::Python),
    (&["go"], Language::Go),
    (&["rs"], Language::Rust),
    (&["java"], Language::Java),
    (&["kt", "kts"], Language::Kotlin),
    (&["dart"], Language::Dart),
    (&["swift"], Language::Swift),
    (&["cpp", "c", "h"], Language::Cpp),
];

/// Primary language of a project, judged from its top-level listing.
///
/// Manifest files win over file extensions. Names are compared
/// case-insensitively.
pub fn detect_project_language(entries: &[FsEntry]) -> Language {
    let names: Vec<String> = entries.iter().map(|e| e.name.to_lowercase()).collect();

    for (manifest, language) in MANIFEST_LANGUAGES {
        if names.iter().any(|n| n == manifest) {
            return *language;
        }
    }

    let extensions: Vec<&str> = names.iter().map(|n| file_extension(n)).collect();
    for (candidates, language) in EXTENSION_LANGUAGES {
        if extensions.iter().any(|ext| candidates.contains(ext)) {
            return *language;
        }
    }

    Language::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(name: &str) -> FsEntry {
        FsEntry {
            name: name.to_string(),
            path: PathBuf::from(name),
            is_directory: false,
        }
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("a.ts"), Language::TypeScript);
        assert_eq!(detect_language("a.ts"), detect_language("a.ts"));
        assert_eq!(detect_language("src/app.jsx"), Language::JavaScript);
        assert_eq!(detect_language("main.rs"), Language::Rust);
        assert_eq!(detect_language("widget.H"), Language::Cpp);
        assert_eq!(detect_language("a.xyz123"), Language::Text);
        assert_eq!(detect_language("Makefile"), Language::Text);
        assert_eq!(detect_language("a.xyz123").as_str(), "text");
    }

    #[test]
    fn test_language_serializes_as_tag() {
        let json = serde_json::to_string(&Language::TypeScript).unwrap();
        assert_eq!(json, "\"typescript\"");
        let json = serde_json::to_string(&Language::Cpp).unwrap();
        assert_eq!(json, "\"cpp\"");
    }

    #[test]
    fn test_manifest_priority() {
        let entries = vec![entry("go.mod"), entry("package.json"), entry("main.py")];
        assert_eq!(detect_project_language(&entries), Language::JavaScript);

        let entries = vec![entry("Cargo.toml"), entry("index.js")];
        assert_eq!(detect_project_language(&entries), Language::Rust);

        let entries = vec![entry("build.gradle.kts")];
        assert_eq!(detect_project_language(&entries), Language::Kotlin);

        let entries = vec![entry("build.gradle"), entry("build.gradle.kts")];
        assert_eq!(detect_project_language(&entries), Language::Java);
    }

    #[test]
    fn test_extension_fallback() {
        let entries = vec![entry("README.md"), entry("tool.py"), entry("util.go")];
        assert_eq!(detect_project_language(&entries), Language::Python);

        let entries = vec![entry("main.c")];
        assert_eq!(detect_project_language(&entries), Language::Cpp);
    }

    #[test]
    fn test_unknown_project() {
        assert_eq!(detect_project_language(&[]), Language::Unknown);
        assert_eq!(
            detect_project_language(&[entry("notes.txt")]),
            Language::Unknown
        );
    }
}
