//! Language detection and the language → extension table.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Programming language of a file or a query scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Go,
    Java,
    Hcl,
    Unknown,
}

impl Language {
    /// Detect language from a name or file extension.
    pub fn from_str(s: &str) -> Self {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "rs" | "rust" => Language::Rust,
            "py" | "pyi" | "python" => Language::Python,
            "ts" | "tsx" | "typescript" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" | "javascript" => Language::JavaScript,
            "go" | "golang" => Language::Go,
            "java" => Language::Java,
            "tf" | "tfvars" | "hcl" | "terraform" => Language::Hcl,
            _ => Language::Unknown,
        }
    }

    /// Detect language from a file path's extension.
    pub fn from_path(path: &str) -> Self {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_str)
            .unwrap_or(Language::Unknown)
    }

    /// File extensions (with leading dot) belonging to this language.
    ///
    /// `Unknown` maps to no extensions.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &[".rs"],
            Language::Python => &[".py", ".pyi"],
            Language::TypeScript => &[".ts", ".tsx"],
            Language::JavaScript => &[".js", ".jsx", ".mjs", ".cjs"],
            Language::Go => &[".go"],
            Language::Java => &[".java"],
            Language::Hcl => &[".tf", ".tfvars", ".hcl"],
            Language::Unknown => &[],
        }
    }

    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Java => "java",
            Language::Hcl => "hcl",
            Language::Unknown => "unknown",
        }
    }
}
