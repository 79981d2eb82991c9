//! Filesystem discovery: project root, component sources, and docs pages.

use crate::types::{AuditConfig, normalize_separators};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Find the project root by walking up from CWD.
///
/// - Pass 1: Check `config.root_markers` in order
/// - Pass 2: Check for `.git` directory
/// - Pass 3: Fall back to CWD
pub fn find_root(config: &AuditConfig) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd, config)
}

fn find_root_from(start: &Path, config: &AuditConfig) -> PathBuf {
    for dir in start.ancestors() {
        if config.root_markers.iter().any(|m| dir.join(m).exists()) {
            return dir.to_path_buf();
        }
    }

    for dir in start.ancestors() {
        if dir.join(".git").exists() {
            return dir.to_path_buf();
        }
    }

    warn!(
        cwd = %start.display(),
        "no project root marker found, using current directory"
    );
    start.to_path_buf()
}

/// Discover all component source files under `config.components_dir`.
///
/// Paths are relative to `root`, `/`-separated, sorted and deduplicated.
/// A missing components directory yields an empty list.
pub fn find_component_files(root: &Path, config: &AuditConfig) -> Vec<String> {
    let dir = root.join(&config.components_dir);
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "components directory not found");
        return Vec::new();
    }

    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        config.component_extension
    );
    let mut found = BTreeSet::new();
    match glob::glob(&pattern) {
        Ok(entries) => {
            for entry in entries.flatten() {
                if !entry.is_file() {
                    continue;
                }
                let rel = entry.strip_prefix(root).unwrap_or(&entry);
                found.insert(normalize_separators(&rel.to_string_lossy()));
            }
        }
        Err(e) => debug!(%pattern, error = %e, "invalid component glob"),
    }

    debug!(count = found.len(), "component files discovered");
    found.into_iter().collect()
}

/// List docs slugs: immediate subdirectories of `docs_root` that contain
/// `config.page_file`. A missing or unreadable docs root yields an empty set.
pub fn find_doc_slugs(docs_root: &Path, config: &AuditConfig) -> BTreeSet<String> {
    let mut slugs = BTreeSet::new();
    let entries = match std::fs::read_dir(docs_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %docs_root.display(), error = %e, "docs directory unavailable");
            return slugs;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() || !path.join(config.page_file).is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            slugs.insert(name.to_string());
        }
    }
    debug!(count = slugs.len(), "docs pages discovered");
    slugs
}
