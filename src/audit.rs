//! Audit checks for the component manifest.
//!
//! Each check is a pure function of the manifest and the discovered
//! filesystem facts. Checks never fail; irregularities become findings.

use crate::manifest::ComponentRecord;
use crate::types::{
    AuditConfig, DocLevel, DocLevelDrift, DocsEntry, MissingFile, SchemaFinding,
    SchemaFindingKind, Stage, StaleComponent, to_slug,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::debug;

pub const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "category",
    "path",
    "stage",
    "revision",
    "lastReviewed",
    "docLevel",
    "breaking",
];

const UNNAMED: &str = "UNNAMED";

const PLAYGROUND_MARKER: &str = "ComponentPlayground";
const VARIANT_GRID_MARKER: &str = "variant-grid";
const EXAMPLE_CARD_MARKER: &str = "example-card";
const SECTION_DESC_MARKER: &str = "section-description";

/// Outcome of the two-way manifest/filesystem diff.
#[derive(Debug, Default)]
pub struct Drift {
    /// On disk but not in the manifest.
    pub orphan_files: Vec<String>,
    /// In the manifest but not on disk.
    pub missing_files: Vec<MissingFile>,
}

impl Drift {
    pub fn is_clean(&self) -> bool {
        self.orphan_files.is_empty() && self.missing_files.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DocsCoverage {
    pub present: Vec<DocsEntry>,
    pub missing: Vec<DocsEntry>,
}

/// Validate every manifest entry's fields, enums, and file reference.
pub fn check_schema(components: &[ComponentRecord], root: &Path) -> Vec<SchemaFinding> {
    let mut findings = Vec::new();
    let mut seen = HashSet::new();

    for comp in components {
        let name = comp.name.as_deref().filter(|n| !n.is_empty());
        let component = name.unwrap_or(UNNAMED).to_string();
        let mut push = |kind, message: String| {
            findings.push(SchemaFinding {
                component: component.clone(),
                kind,
                message,
            });
        };

        for field in REQUIRED_FIELDS {
            if comp.is_missing(field) {
                push(
                    SchemaFindingKind::MissingField,
                    format!("missing required field: {}", field),
                );
            }
        }

        // stage and docLevel are covered by the enum checks below.
        for field in &comp.wrong_types {
            if !matches!(*field, "stage" | "docLevel") {
                push(
                    SchemaFindingKind::WrongType,
                    format!("{} must be a string", field),
                );
            }
        }

        if let Some(stage) = comp.stage.as_deref().filter(|s| !s.is_empty()) {
            if Stage::parse(stage).is_none() {
                push(
                    SchemaFindingKind::InvalidStage,
                    format!("invalid stage: \"{}\"", stage),
                );
            }
        }

        if let Some(level) = comp.doc_level.as_deref().filter(|s| !s.is_empty()) {
            if DocLevel::parse(level).is_none() {
                push(
                    SchemaFindingKind::InvalidDocLevel,
                    format!("invalid docLevel: \"{}\"", level),
                );
            }
        }

        if comp.breaking.as_ref().is_some_and(|b| !b.is_array()) {
            push(
                SchemaFindingKind::BreakingNotArray,
                "breaking must be an array".to_string(),
            );
        }

        if comp.revision.as_ref().is_some_and(|r| !is_revision(r)) {
            push(
                SchemaFindingKind::InvalidRevision,
                "revision must be a non-negative integer".to_string(),
            );
        }

        if let Some(path) = comp.normalized_path() {
            if !root.join(&path).exists() {
                let shown = comp.path.as_deref().unwrap_or(path.as_str());
                push(
                    SchemaFindingKind::FileNotFound,
                    format!("file not found: {}", shown),
                );
            }
        }

        if let Some(name) = name {
            if !seen.insert(name) {
                push(
                    SchemaFindingKind::DuplicateName,
                    "duplicate name: an earlier entry already uses it".to_string(),
                );
            }
        }
    }

    debug!(findings = findings.len(), "schema check done");
    findings
}

/// Non-negative integral number. `3.0` counts, as it does in the manifest's
/// JavaScript consumers.
fn is_revision(value: &Value) -> bool {
    if value.as_u64().is_some() {
        return true;
    }
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .is_some_and(|f| f.is_finite() && f.fract() == 0.0 && f >= 0.0),
        _ => false,
    }
}

/// Diff discovered component files against manifest paths.
pub fn check_drift(components: &[ComponentRecord], disk_files: &[String]) -> Drift {
    let manifest_paths: HashSet<String> = components
        .iter()
        .filter_map(ComponentRecord::normalized_path)
        .collect();
    let disk_set: HashSet<&str> = disk_files.iter().map(String::as_str).collect();

    let orphan_files = disk_files
        .iter()
        .filter(|f| !manifest_paths.contains(f.as_str()))
        .cloned()
        .collect();

    let missing_files = components
        .iter()
        .filter_map(|comp| {
            let path = comp.normalized_path()?;
            (!disk_set.contains(path.as_str())).then(|| MissingFile {
                name: comp.name.clone().filter(|n| !n.is_empty()),
                path,
            })
        })
        .collect();

    Drift {
        orphan_files,
        missing_files,
    }
}

/// Partition non-deprecated components by whether a docs page exists.
pub fn check_docs_coverage(
    components: &[ComponentRecord],
    doc_slugs: &BTreeSet<String>,
) -> DocsCoverage {
    let mut coverage = DocsCoverage::default();
    for comp in components.iter().filter(|c| !c.is_deprecated()) {
        let slug = to_slug(comp.name());
        let entry = DocsEntry {
            name: comp.name().to_string(),
            slug,
        };
        if doc_slugs.contains(&entry.slug) {
            coverage.present.push(entry);
        } else {
            coverage.missing.push(entry);
        }
    }
    coverage
}

/// Names of non-deprecated components that never appear in the text index.
pub fn check_llms_sync(components: &[ComponentRecord], llms_content: &str) -> Vec<String> {
    components
        .iter()
        .filter(|c| !c.is_deprecated())
        .filter(|c| !llms_content.contains(c.name()))
        .map(|c| c.name().to_string())
        .collect()
}

/// Components whose last review is more than `threshold_days` old.
pub fn check_staleness(
    components: &[ComponentRecord],
    now: DateTime<Utc>,
    threshold_days: i64,
) -> Vec<StaleComponent> {
    components
        .iter()
        .filter_map(|comp| {
            let reviewed = comp.last_reviewed.as_deref().filter(|d| !d.is_empty())?;
            let days_ago = days_since(reviewed, now);
            let stale = days_ago.is_none_or(|d| d > threshold_days);
            stale.then(|| StaleComponent {
                name: comp.name().to_string(),
                last_reviewed: reviewed.to_string(),
                days_ago,
            })
        })
        .collect()
}

/// Whole days elapsed since an ISO date, rounded down.
///
/// Accepts `YYYY-MM-DD` (midnight UTC) or RFC 3339. Returns `None` for an
/// unparsable date, which callers treat as infinitely old.
pub fn days_since(date: &str, now: DateTime<Utc>) -> Option<i64> {
    let then = parse_review_date(date)?;
    let millis = (now - then).num_milliseconds();
    Some(millis.div_euclid(86_400_000))
}

pub(crate) fn parse_review_date(date: &str) -> Option<DateTime<Utc>> {
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Derive the documentation level a docs page actually provides.
pub fn detect_doc_level(content: &str) -> DocLevel {
    let playground = content.contains(PLAYGROUND_MARKER);
    let variant_grid = content.contains(VARIANT_GRID_MARKER);
    let example_card = content.contains(EXAMPLE_CARD_MARKER);
    let section_desc = content.contains(SECTION_DESC_MARKER);

    match (playground, variant_grid, example_card, section_desc) {
        (true, true, true, true) => DocLevel::Complete,
        (true, true, true, false) => DocLevel::Standard,
        (true, _, _, _) => DocLevel::Minimal,
        _ => DocLevel::None,
    }
}

/// Compare each documented component's declared docLevel with its page.
pub fn check_doc_level_drift(
    components: &[ComponentRecord],
    root: &Path,
    config: &AuditConfig,
) -> Vec<DocLevelDrift> {
    let mut drifts = Vec::new();
    for comp in components.iter().filter(|c| !c.is_deprecated()) {
        let slug = to_slug(comp.name());
        let page = config.page_path(root, &slug);
        if !page.is_file() {
            continue;
        }
        let content = match std::fs::read_to_string(&page) {
            Ok(content) => content,
            Err(e) => {
                debug!(page = %page.display(), error = %e, "unreadable docs page");
                continue;
            }
        };

        let actual = detect_doc_level(&content);
        if comp.doc_level.as_deref() != Some(actual.as_str()) {
            drifts.push(DocLevelDrift {
                name: comp.name().to_string(),
                slug,
                declared: comp.doc_level.clone(),
                actual,
            });
        }
    }
    drifts
}
