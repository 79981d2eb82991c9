//! Core types for manifest auditing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

static SLUG_BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

/// Configuration for manifest discovery and auditing.
///
/// Paths are relative to the repository root unless absolute.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Project root marker files, checked in order while walking up from CWD.
    pub root_markers: Vec<&'static str>,

    /// The component manifest.
    pub manifest_file: PathBuf,

    /// The generated text index whose component sections are derived.
    pub llms_file: PathBuf,

    /// Directory scanned recursively for component sources.
    pub components_dir: PathBuf,

    /// Extension (without dot) of component source files.
    pub component_extension: &'static str,

    /// Documentation root; each immediate subdirectory is one component page.
    pub docs_dir: PathBuf,

    /// File that marks a docs subdirectory as a page.
    pub page_file: &'static str,

    /// Components reviewed longer ago than this are reported as stale.
    pub staleness_days: i64,
}

impl AuditConfig {
    /// Layout of the jera component library and its companion admin docs site.
    pub fn jera() -> Self {
        Self {
            root_markers: vec!["components.json"],
            manifest_file: PathBuf::from("components.json"),
            llms_file: PathBuf::from("llms.txt"),
            components_dir: PathBuf::from("src/components"),
            component_extension: "svelte",
            docs_dir: ["..", "admin.selify.ai", "src", "routes", "(docs)", "docs", "components"]
                .iter()
                .collect(),
            page_file: "+page.svelte",
            staleness_days: 30,
        }
    }

    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest_file)
    }

    pub fn llms_path(&self, root: &Path) -> PathBuf {
        root.join(&self.llms_file)
    }

    pub fn docs_root(&self, root: &Path) -> PathBuf {
        root.join(&self.docs_dir)
    }

    /// Page file for a docs slug.
    pub fn page_path(&self, root: &Path, slug: &str) -> PathBuf {
        self.docs_root(root).join(slug).join(self.page_file)
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self::jera()
    }
}

/// Lifecycle stage of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Draft,
    Beta,
    Stable,
    Deprecated,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Draft, Stage::Beta, Stage::Stable, Stage::Deprecated];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Draft => "draft",
            Stage::Beta => "beta",
            Stage::Stable => "stable",
            Stage::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared (or detected) depth of a component's documentation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocLevel {
    None,
    Minimal,
    Standard,
    Complete,
}

impl DocLevel {
    pub const ALL: [DocLevel; 4] = [
        DocLevel::None,
        DocLevel::Minimal,
        DocLevel::Standard,
        DocLevel::Complete,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocLevel::None => "none",
            DocLevel::Minimal => "minimal",
            DocLevel::Standard => "standard",
            DocLevel::Complete => "complete",
        }
    }
}

impl fmt::Display for DocLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert a PascalCase component name to its kebab-case slug.
///
/// `LeftBarItem` becomes `left-bar-item`. Every docs, index and lookup key is
/// derived through this function.
pub fn to_slug(name: &str) -> String {
    SLUG_BOUNDARY_RE
        .replace_all(name, "$1-$2")
        .to_lowercase()
}

/// Normalize Windows separators so manifest and disk paths compare equal.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// What a schema finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFindingKind {
    MissingField,
    InvalidStage,
    InvalidDocLevel,
    BreakingNotArray,
    InvalidRevision,
    FileNotFound,
    DuplicateName,
    WrongType,
}

/// One schema violation of a manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaFinding {
    /// Component name, or `UNNAMED` when the entry has none.
    pub component: String,
    pub kind: SchemaFindingKind,
    pub message: String,
}

impl fmt::Display for SchemaFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.component, self.message)
    }
}

/// A manifest entry whose file is not among the discovered component files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocsEntry {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleComponent {
    pub name: String,
    pub last_reviewed: String,
    /// Whole days since review; `None` when the date does not parse.
    pub days_ago: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocLevelDrift {
    pub name: String,
    pub slug: String,
    /// Raw manifest value; `None` when the entry declares no docLevel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared: Option<String>,
    pub actual: DocLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_slug_pascal_case() {
        assert_eq!(to_slug("Button"), "button");
        assert_eq!(to_slug("LeftBarItem"), "left-bar-item");
        assert_eq!(to_slug("ComponentPlayground"), "component-playground");
    }

    #[test]
    fn to_slug_keeps_acronym_runs_together() {
        // Only lowercase -> uppercase boundaries split.
        assert_eq!(to_slug("HTMLEditor"), "htmleditor");
        assert_eq!(to_slug("aBC"), "a-bc");
        assert_eq!(to_slug("aBcD"), "a-bc-d");
    }

    #[test]
    fn to_slug_is_deterministic() {
        let first = to_slug("DropdownMenuItem");
        for _ in 0..3 {
            assert_eq!(to_slug("DropdownMenuItem"), first);
        }
    }

    #[test]
    fn stage_parse() {
        assert_eq!(Stage::parse("stable"), Some(Stage::Stable));
        assert_eq!(Stage::parse("deprecated"), Some(Stage::Deprecated));
        assert_eq!(Stage::parse("Stable"), None);
        assert_eq!(Stage::parse("active"), None);
    }

    #[test]
    fn doc_level_parse() {
        assert_eq!(DocLevel::parse("none"), Some(DocLevel::None));
        assert_eq!(DocLevel::parse("complete"), Some(DocLevel::Complete));
        assert_eq!(DocLevel::parse("full"), None);
    }

    #[test]
    fn normalize_separators_backslashes() {
        assert_eq!(
            normalize_separators(r"src\components\forms\Input.svelte"),
            "src/components/forms/Input.svelte"
        );
    }

    #[test]
    fn config_paths_resolve_against_root() {
        let config = AuditConfig::jera();
        let root = Path::new("/repo/jera");
        assert_eq!(config.manifest_path(root), Path::new("/repo/jera/components.json"));
        assert_eq!(
            config.page_path(root, "button"),
            Path::new("/repo/jera/../admin.selify.ai/src/routes/(docs)/docs/components/button/+page.svelte")
        );
    }

    #[test]
    fn config_absolute_docs_dir_overrides_root() {
        let mut config = AuditConfig::jera();
        config.docs_dir = PathBuf::from("/srv/docs");
        assert_eq!(config.docs_root(Path::new("/repo")), Path::new("/srv/docs"));
    }
}
