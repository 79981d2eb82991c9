//! Consistency audit for the jera component manifest.
//!
//! Reconciles `components.json` with the component sources on disk, the
//! admin docs site, and `llms.txt`, and optionally regenerates the derived
//! component sections of `llms.txt`.

mod audit;
mod discovery;
mod llms;
mod manifest;
mod meta;
mod report;
mod types;

pub use audit::{
    DocsCoverage, Drift, REQUIRED_FIELDS, check_doc_level_drift, check_docs_coverage,
    check_drift, check_llms_sync, check_schema, check_staleness, days_since, detect_doc_level,
};
pub use discovery::{find_component_files, find_doc_slugs, find_root};
pub use llms::{
    ACTIVE_HEADING, CATEGORY_ORDER, LEGACY_HEADING, READY_HEADING, regenerate, regenerate_file,
    render_sections, splice,
};
pub use manifest::{ComponentRecord, Manifest, ManifestError};
pub use meta::{Category, CategoryEntry, ComponentMeta, PropRow, resolve_stage};
pub use report::{
    AuditReport, CheckResults, Palette, StageCounts, TextOptions, render_json, render_text,
    write_text,
};
pub use types::{
    AuditConfig, DocLevel, DocLevelDrift, DocsEntry, MissingFile, SchemaFinding,
    SchemaFindingKind, Stage, StaleComponent, normalize_separators, to_slug,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

/// Run the full audit against the repository at `root`.
///
/// Fails only when the manifest cannot be loaded, or when `fix` is set and
/// `llms.txt` cannot be written. Everything else ends up in the report.
pub fn run(config: &AuditConfig, root: &Path, fix: bool) -> Result<AuditReport> {
    run_at(config, root, fix, Utc::now())
}

/// [`run`] with an explicit clock for staleness and the report timestamp.
pub fn run_at(
    config: &AuditConfig,
    root: &Path,
    fix: bool,
    now: DateTime<Utc>,
) -> Result<AuditReport> {
    let manifest_path = config.manifest_path(root);
    let manifest = Manifest::load(&manifest_path)
        .with_context(|| format!("loading {}", manifest_path.display()))?;
    let components = &manifest.components;
    debug!(count = components.len(), "manifest loaded");

    let disk_files = find_component_files(root, config);
    let doc_slugs = find_doc_slugs(&config.docs_root(root), config);

    let llms_path = config.llms_path(root);
    let llms_content = match std::fs::read_to_string(&llms_path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %llms_path.display(), error = %e, "llms.txt unavailable");
            String::new()
        }
    };

    let results = CheckResults {
        schema: check_schema(components, root),
        drift: check_drift(components, &disk_files),
        docs: check_docs_coverage(components, &doc_slugs),
        llms_missing: check_llms_sync(components, &llms_content),
        stale: check_staleness(components, now, config.staleness_days),
        doc_level_drifts: check_doc_level_drift(components, root, config),
    };

    let regenerated = if fix {
        regenerate_file(&llms_path, components)?
    } else {
        false
    };

    Ok(AuditReport::new(
        components,
        results,
        now,
        config.staleness_days,
        regenerated,
    ))
}
