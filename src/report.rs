//! Aggregated audit report and its JSON / human-readable renderings.

use crate::audit::{DocsCoverage, Drift};
use crate::manifest::ComponentRecord;
use crate::types::{DocLevelDrift, DocsEntry, MissingFile, SchemaFinding, Stage, StaleComponent};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::{self, Write};

/// Raw outputs of the six checks, before aggregation.
#[derive(Debug, Default)]
pub struct CheckResults {
    pub schema: Vec<SchemaFinding>,
    pub drift: Drift,
    pub docs: DocsCoverage,
    pub llms_missing: Vec<String>,
    pub stale: Vec<StaleComponent>,
    pub doc_level_drifts: Vec<DocLevelDrift>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub stable: usize,
    pub beta: usize,
    pub draft: usize,
    pub deprecated: usize,
}

impl StageCounts {
    fn count(components: &[ComponentRecord]) -> Self {
        let mut counts = Self::default();
        for stage in components.iter().filter_map(ComponentRecord::stage) {
            match stage {
                Stage::Stable => counts.stable += 1,
                Stage::Beta => counts.beta += 1,
                Stage::Draft => counts.draft += 1,
                Stage::Deprecated => counts.deprecated += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Serialize)]
pub struct SchemaSection {
    pub pass: bool,
    pub errors: Vec<SchemaFinding>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftSection {
    pub pass: bool,
    pub orphan_files: Vec<String>,
    pub missing_files: Vec<MissingFile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsCoverageSection {
    pub pass: bool,
    pub with_docs: usize,
    pub without_docs: usize,
    pub missing: Vec<DocsEntry>,
}

#[derive(Debug, Serialize)]
pub struct LlmsSyncSection {
    pub pass: bool,
    pub missing: Vec<String>,
    /// Whether `--fix` rewrote the index during this run.
    pub regenerated: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StalenessSection {
    pub pass: bool,
    pub threshold_days: i64,
    pub stale: Vec<StaleComponent>,
}

#[derive(Debug, Serialize)]
pub struct DocLevelDriftSection {
    pub pass: bool,
    pub drifts: Vec<DocLevelDrift>,
}

/// Everything one audit run found.
///
/// Only `schema` and `drift` decide `pass` and `exit_code`; the other
/// sections are advisory.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub timestamp: String,
    pub total_components: usize,
    pub by_stage: StageCounts,
    pub schema: SchemaSection,
    pub drift: DriftSection,
    pub docs_coverage: DocsCoverageSection,
    pub llms_sync: LlmsSyncSection,
    pub staleness: StalenessSection,
    pub doc_level_drift: DocLevelDriftSection,
    pub pass: bool,
    pub exit_code: u8,
}

impl AuditReport {
    pub fn new(
        components: &[ComponentRecord],
        results: CheckResults,
        now: DateTime<Utc>,
        staleness_days: i64,
        regenerated: bool,
    ) -> Self {
        let schema_pass = results.schema.is_empty();
        let drift_pass = results.drift.is_clean();
        let pass = schema_pass && drift_pass;

        Self {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_components: components.len(),
            by_stage: StageCounts::count(components),
            schema: SchemaSection {
                pass: schema_pass,
                errors: results.schema,
            },
            drift: DriftSection {
                pass: drift_pass,
                orphan_files: results.drift.orphan_files,
                missing_files: results.drift.missing_files,
            },
            docs_coverage: DocsCoverageSection {
                pass: results.docs.missing.is_empty(),
                with_docs: results.docs.present.len(),
                without_docs: results.docs.missing.len(),
                missing: results.docs.missing,
            },
            llms_sync: LlmsSyncSection {
                pass: results.llms_missing.is_empty(),
                missing: results.llms_missing,
                regenerated,
            },
            staleness: StalenessSection {
                pass: results.stale.is_empty(),
                threshold_days: staleness_days,
                stale: results.stale,
            },
            doc_level_drift: DocLevelDriftSection {
                pass: results.doc_level_drifts.is_empty(),
                drifts: results.doc_level_drifts,
            },
            pass,
            exit_code: if pass { 0 } else { 1 },
        }
    }

    /// Components that are not deprecated, the denominator of docs coverage.
    pub fn documentable(&self) -> usize {
        self.docs_coverage.with_docs + self.docs_coverage.without_docs
    }

    /// Docs coverage as a rounded percentage.
    pub fn coverage_percent(&self) -> usize {
        let total = self.documentable();
        if total == 0 {
            return 0;
        }
        (self.docs_coverage.with_docs * 100 + total / 2) / total
    }
}

pub fn render_json(report: &AuditReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// ANSI escape sequences used by the text renderer.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub reset: &'static str,
    pub bold: &'static str,
    pub dim: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub cyan: &'static str,
}

impl Palette {
    pub fn ansi() -> Self {
        Self {
            reset: "\x1b[0m",
            bold: "\x1b[1m",
            dim: "\x1b[2m",
            red: "\x1b[31m",
            green: "\x1b[32m",
            yellow: "\x1b[33m",
            cyan: "\x1b[36m",
        }
    }

    pub fn plain() -> Self {
        Self {
            reset: "",
            bold: "",
            dim: "",
            red: "",
            green: "",
            yellow: "",
            cyan: "",
        }
    }

    fn pass(&self, pass: bool) -> String {
        if pass {
            format!("{}PASS{}", self.green, self.reset)
        } else {
            format!("{}FAIL{}", self.red, self.reset)
        }
    }

    fn pass_or_warn(&self, pass: bool) -> String {
        if pass {
            self.pass(true)
        } else {
            format!("{}WARN{}", self.yellow, self.reset)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    /// List every advisory finding instead of a count.
    pub verbose: bool,
    pub palette: Palette,
}

/// Render the human-readable summary.
pub fn render_text(report: &AuditReport, options: &TextOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_text(&mut out, report, options);
    out
}

pub fn write_text<W: Write>(w: &mut W, report: &AuditReport, options: &TextOptions) -> fmt::Result {
    let p = &options.palette;
    let verbose = options.verbose;

    if report.llms_sync.regenerated {
        writeln!(w, "Fixed: llms.txt component sections regenerated from components.json")?;
    }
    writeln!(w)?;
    writeln!(w, "{}@miozu/jera audit{}", p.bold, p.reset)?;
    writeln!(w, "{}{}{}", p.dim, report.timestamp, p.reset)?;
    writeln!(w)?;

    let s = &report.by_stage;
    writeln!(
        w,
        "{bold}Components:{reset} {} total | {green}{} stable{reset} | {cyan}{} beta{reset} | \
         {yellow}{} draft{reset} | {dim}{} deprecated{reset}",
        report.total_components,
        s.stable,
        s.beta,
        s.draft,
        s.deprecated,
        bold = p.bold,
        reset = p.reset,
        green = p.green,
        cyan = p.cyan,
        yellow = p.yellow,
        dim = p.dim,
    )?;
    writeln!(w)?;

    // 1. Schema
    writeln!(w, "{}1. Schema validation{}  {}", p.bold, p.reset, p.pass(report.schema.pass))?;
    if report.schema.errors.is_empty() {
        writeln!(
            w,
            "   {}All {} components pass schema checks{}",
            p.dim, report.total_components, p.reset
        )?;
    }
    for err in &report.schema.errors {
        writeln!(w, "   {}- {}{}", p.red, err, p.reset)?;
    }
    writeln!(w)?;

    // 2. Drift
    let drift = &report.drift;
    writeln!(w, "{}2. Drift detection{}  {}", p.bold, p.reset, p.pass(drift.pass))?;
    if !drift.orphan_files.is_empty() {
        writeln!(w, "   {}Orphan files (on disk, not in manifest):{}", p.yellow, p.reset)?;
        for f in &drift.orphan_files {
            writeln!(w, "   {}- {}{}", p.yellow, f, p.reset)?;
        }
    }
    if !drift.missing_files.is_empty() {
        writeln!(w, "   {}Missing files (in manifest, not on disk):{}", p.red, p.reset)?;
        for m in &drift.missing_files {
            let name = m.name.as_deref().unwrap_or("UNNAMED");
            writeln!(w, "   {}- {} -> {}{}", p.red, name, m.path, p.reset)?;
        }
    }
    if drift.pass {
        writeln!(w, "   {}Manifest and filesystem in sync{}", p.dim, p.reset)?;
    }
    writeln!(w)?;

    // 3. Docs coverage
    let docs = &report.docs_coverage;
    writeln!(
        w,
        "{}3. Docs coverage{}  {}/{} ({}%)",
        p.bold,
        p.reset,
        docs.with_docs,
        report.documentable(),
        report.coverage_percent()
    )?;
    if !docs.missing.is_empty() {
        if verbose {
            writeln!(w, "   {}Missing docs pages:{}", p.yellow, p.reset)?;
            for DocsEntry { name, slug } in &docs.missing {
                writeln!(w, "   {}- {} (expected slug: {}){}", p.yellow, name, slug, p.reset)?;
            }
        } else {
            writeln!(
                w,
                "   {}{} components without docs (use --verbose to list){}",
                p.dim,
                docs.missing.len(),
                p.reset
            )?;
        }
    }
    writeln!(w)?;

    // 4. llms.txt sync
    let llms = &report.llms_sync;
    writeln!(
        w,
        "{}4. llms.txt sync{}  {}  {} missing",
        p.bold,
        p.reset,
        p.pass_or_warn(llms.pass),
        llms.missing.len()
    )?;
    if !llms.missing.is_empty() {
        if verbose {
            for name in &llms.missing {
                writeln!(w, "   {}- {}{}", p.yellow, name, p.reset)?;
            }
        } else {
            writeln!(
                w,
                "   {}Run with --verbose to list, or --fix to auto-regenerate{}",
                p.dim, p.reset
            )?;
        }
    }
    writeln!(w)?;

    // 5. Staleness
    let staleness = &report.staleness;
    writeln!(
        w,
        "{}5. Staleness (>{}d){}  {}  {} stale",
        p.bold,
        staleness.threshold_days,
        p.reset,
        p.pass_or_warn(staleness.pass),
        staleness.stale.len()
    )?;
    if !staleness.stale.is_empty() {
        if verbose {
            for stale in &staleness.stale {
                let age = match stale.days_ago {
                    Some(days) => format!("{}d ago", days),
                    None => "unparsable date".to_string(),
                };
                writeln!(
                    w,
                    "   {}- {}: {} ({}){}",
                    p.yellow, stale.name, stale.last_reviewed, age, p.reset
                )?;
            }
        } else {
            writeln!(w, "   {}Use --verbose to list stale components{}", p.dim, p.reset)?;
        }
    }
    writeln!(w)?;

    // 6. docLevel drift
    let doc_drift = &report.doc_level_drift;
    writeln!(
        w,
        "{}6. docLevel drift{}  {}  {} mismatches",
        p.bold,
        p.reset,
        p.pass_or_warn(doc_drift.pass),
        doc_drift.drifts.len()
    )?;
    for drift in &doc_drift.drifts {
        writeln!(
            w,
            "   {}- {}: declared \"{}\", actual \"{}\"{}",
            p.yellow,
            drift.name,
            drift.declared.as_deref().unwrap_or("undefined"),
            drift.actual,
            p.reset
        )?;
    }
    writeln!(w)?;

    if report.pass {
        writeln!(w, "{}{}Audit passed{}", p.green, p.bold, p.reset)?;
    } else {
        writeln!(
            w,
            "{}{}Audit failed{} -- schema or drift errors detected",
            p.red, p.bold, p.reset
        )?;
    }
    writeln!(w)
}
