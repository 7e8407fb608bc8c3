//! Supported language ecosystems.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language ecosystem with its own module system and resolver rules.
///
/// TypeScript and JavaScript share one ecosystem because their modules
/// import each other freely; the per-file tag still tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Java,
    Python,
    TypeScript,
    CSharp,
    Apex,
}

impl Language {
    /// Every ecosystem, in the order the pipeline processes them.
    pub const ALL: [Language; 6] = [
        Language::Go,
        Language::Java,
        Language::Python,
        Language::TypeScript,
        Language::CSharp,
        Language::Apex,
    ];

    /// File extensions (without the dot) owned by this ecosystem.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::Python => &["py"],
            Language::TypeScript => &["ts", "tsx", "js", "jsx", "mjs", "cjs"],
            Language::CSharp => &["cs"],
            Language::Apex => &["cls", "trigger"],
        }
    }

    /// Find the ecosystem that owns a file extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Find the ecosystem that owns a path.
    pub fn from_path(path: &str) -> Option<Self> {
        std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Language tag written to `FileNode::language` for a path.
    pub fn tag_for_path(path: &str) -> &'static str {
        let ext = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "go" => "go",
            "java" => "java",
            "py" => "python",
            "ts" | "tsx" => "typescript",
            "js" | "jsx" | "mjs" | "cjs" => "javascript",
            "cs" => "csharp",
            "cls" | "trigger" => "apex",
            _ => "unknown",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Java => "java",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::CSharp => "csharp",
            Language::Apex => "apex",
        }
    }

    /// Whether identifiers compare case-insensitively.
    pub fn is_case_insensitive(self) -> bool {
        matches!(self, Language::Apex)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "go" | "golang" => Ok(Language::Go),
            "java" => Ok(Language::Java),
            "python" | "py" => Ok(Language::Python),
            "typescript" | "ts" | "javascript" | "js" => Ok(Language::TypeScript),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "apex" | "salesforce" => Ok(Language::Apex),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("go"), Some(Language::Go));
        assert_eq!(Language::from_extension("TSX"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("trigger"), Some(Language::Apex));
        assert_eq!(Language::from_extension("rs"), None);
    }

    #[test]
    fn test_tag_for_path() {
        assert_eq!(Language::tag_for_path("web/app.jsx"), "javascript");
        assert_eq!(Language::tag_for_path("web/app.ts"), "typescript");
        assert_eq!(Language::tag_for_path("force-app/Foo.cls"), "apex");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("C#".parse::<Language>(), Ok(Language::CSharp));
        assert_eq!("js".parse::<Language>(), Ok(Language::TypeScript));
        assert!("cobol".parse::<Language>().is_err());
    }
}
