use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shallow structural facts pulled out of a source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patterns {
    /// Import-like statements, e.g. `import x from 'y'` or `use std::fs`
    pub imports: Vec<String>,
    /// Declaration headers, e.g. `function render` or `class Widget`
    pub declarations: Vec<String>,
}

impl Patterns {
    /// Identifiers introduced by function-like declarations (classes excluded).
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().filter_map(|header| {
            let mut parts = header.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("class"), _) => None,
                (Some(_), Some(name)) => Some(name),
                _ => None,
            }
        })
    }
}

/// Extracts `Patterns` from file content. Swap in a parser-backed
/// implementation without touching the composer.
pub trait PatternDetector: Send + Sync {
    fn detect(&self, content: &str) -> Patterns;
}

fn import_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\b(?:import|from|require|include|using)\s+[^\n;]+")
            .expect("Valid import regex")
    });
    &PATTERN
}

fn declaration_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\b(?:function|class|def|fn|method)\s+\w+").expect("Valid declaration regex")
    });
    &PATTERN
}

/// Regex heuristics over imports and function/class headers. Language
/// agnostic and deliberately shallow.
#[derive(Debug, Default, Clone)]
pub struct RegexPatternDetector;

impl PatternDetector for RegexPatternDetector {
    fn detect(&self, content: &str) -> Patterns {
        if content.is_empty() {
            return Patterns::default();
        }

        Patterns {
            imports: import_pattern()
                .find_iter(content)
                .map(|m| m.as_str().trim_end().to_string())
                .collect(),
            declarations: declaration_pattern()
                .find_iter(content)
                .map(|m| m.as_str().to_string())
                .collect(),
        }
    }
}
