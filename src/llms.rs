//! Regeneration of the derived component sections of `llms.txt`.
//!
//! Only the range starting at the first derived heading is rewritten; every
//! other line of the file is human-owned and kept verbatim. Running the
//! regeneration twice with the same manifest leaves the file unchanged.

use crate::manifest::ComponentRecord;
use crate::types::Stage;
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

pub const ACTIVE_HEADING: &str = "## Active Components";
pub const READY_HEADING: &str = "## Ready Components";
pub const LEGACY_HEADING: &str = "## Legacy Components";

const DERIVED_HEADINGS: [&str; 3] = [ACTIVE_HEADING, READY_HEADING, LEGACY_HEADING];

const ACTIVE_BLURB: &str =
    "Used in production across dash.selify.ai, admin.selify.ai, and miozu.com.";
const READY_BLURB: &str =
    "Built and tested but not yet used in production. Available for immediate adoption.";
const LEGACY_BLURB: &str =
    "Previous implementations replaced by newer versions. Kept for backward compatibility.";

/// Preferred category order; anything else sorts after, alphabetically.
pub const CATEGORY_ORDER: &[&str] = &[
    "primitives",
    "forms",
    "feedback",
    "overlays",
    "navigation",
    "layout",
    "docs",
];

const UNCATEGORIZED: &str = "uncategorized";
const NO_DESCRIPTION: &str = "No description";
const NAVIGATION: &str = "navigation";

/// Render the three derived sections from the manifest.
///
/// Tiers without components are omitted entirely.
pub fn render_sections(components: &[ComponentRecord]) -> Vec<String> {
    let in_stage = |stage: Stage| {
        components
            .iter()
            .filter(|c| c.stage() == Some(stage))
            .collect::<Vec<_>>()
    };
    let stable = in_stage(Stage::Stable);
    let beta = in_stage(Stage::Beta);
    let deprecated = in_stage(Stage::Deprecated);

    let mut lines = Vec::new();

    if !stable.is_empty() {
        push_tier_header(&mut lines, ACTIVE_HEADING, ACTIVE_BLURB);
        render_category_blocks(&mut lines, &stable, None);
    }

    if !beta.is_empty() {
        push_tier_header(&mut lines, READY_HEADING, READY_BLURB);
        render_category_blocks(&mut lines, &beta, Some("(Ready)"));
    }

    if !deprecated.is_empty() {
        push_tier_header(&mut lines, LEGACY_HEADING, LEGACY_BLURB);

        let (nav, other): (Vec<&ComponentRecord>, Vec<&ComponentRecord>) = deprecated
            .into_iter()
            .partition(|c| c.category.as_deref() == Some(NAVIGATION));
        let mut replaced: BTreeMap<&str, Vec<&ComponentRecord>> = BTreeMap::new();
        let mut unused = Vec::new();
        for comp in nav {
            match comp.replaced_by.as_deref().filter(|r| !r.is_empty()) {
                Some(successor) => replaced.entry(successor).or_default().push(comp),
                None => unused.push(comp),
            }
        }

        for (successor, comps) in &replaced {
            lines.push(format!("### Navigation (Legacy -- replaced by {})", successor));
            lines.push(flat_name_list(comps));
            lines.push(String::new());
        }
        if !unused.is_empty() {
            lines.push("### Navigation (Legacy)".to_string());
            lines.push(flat_name_list(&unused));
            lines.push(String::new());
        }
        if !other.is_empty() {
            render_category_blocks(&mut lines, &other, Some("(Legacy)"));
        }
    }

    lines
}

fn push_tier_header(lines: &mut Vec<String>, heading: &str, blurb: &str) {
    lines.push(heading.to_string());
    lines.push(String::new());
    lines.push(blurb.to_string());
    lines.push(String::new());
}

/// `- A, B, C` in manifest order.
fn flat_name_list(comps: &[&ComponentRecord]) -> String {
    let names: Vec<&str> = comps.iter().map(|c| c.name()).collect();
    format!("- {}", names.join(", "))
}

fn render_category_blocks(
    lines: &mut Vec<String>,
    comps: &[&ComponentRecord],
    suffix: Option<&str>,
) {
    let mut groups: BTreeMap<&str, Vec<&ComponentRecord>> = BTreeMap::new();
    for &comp in comps {
        let category = comp
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);
        groups.entry(category).or_default().push(comp);
    }

    let mut categories: Vec<&str> = groups.keys().copied().collect();
    categories.sort_by(|a, b| compare_categories(a, b));

    for category in categories {
        let mut members = groups.remove(category).unwrap_or_default();
        members.sort_by(|a, b| compare_names(a.name(), b.name()));

        match suffix {
            Some(suffix) => lines.push(format!("### {} {}", capitalize(category), suffix)),
            None => lines.push(format!("### {}", capitalize(category))),
        }
        lines.extend(members.iter().map(|c| format_component(c)));
        lines.push(String::new());
    }
}

fn compare_categories(a: &str, b: &str) -> Ordering {
    let rank = |c: &str| {
        CATEGORY_ORDER
            .iter()
            .position(|known| *known == c)
            .unwrap_or(CATEGORY_ORDER.len())
    };
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_component(comp: &ComponentRecord) -> String {
    let description = comp
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION);
    format!(
        "- [{}](./{}): {}",
        comp.name(),
        comp.normalized_path().unwrap_or_default(),
        description
    )
}

fn is_derived_heading(line: &str) -> bool {
    DERIVED_HEADINGS.contains(&line.trim())
}

/// Replace the derived range of `existing` with `sections`.
///
/// The range starts at the first derived heading and ends just before the
/// next `## ` heading that is not a derived one, or at end of file. Without
/// a derived heading the sections are appended after one blank line.
pub fn splice(existing: &str, sections: &[String]) -> String {
    let lines: Vec<&str> = existing.split('\n').collect();
    let section_lines = sections.iter().map(String::as_str);

    let Some(start) = lines.iter().position(|l| is_derived_heading(l)) else {
        if sections.is_empty() {
            return existing.to_string();
        }
        let trimmed = existing.trim_end();
        let mut out: Vec<&str> = Vec::new();
        if !trimmed.is_empty() {
            out.push(trimmed);
            out.push("");
        }
        out.extend(section_lines);
        return out.join("\n");
    };

    let end = lines[start + 1..]
        .iter()
        .position(|l| l.starts_with("## ") && !is_derived_heading(l))
        .map_or(lines.len(), |offset| start + 1 + offset);
    debug!(start, end, "splicing derived llms.txt range");

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + sections.len());
    out.extend_from_slice(&lines[..start]);
    out.extend(section_lines);
    out.extend_from_slice(&lines[end..]);
    out.join("\n")
}

/// Regenerate the derived sections of an index's content.
pub fn regenerate(existing: &str, components: &[ComponentRecord]) -> String {
    splice(existing, &render_sections(components))
}

/// Regenerate the index file in place. Returns whether the file changed.
///
/// A missing file is treated as empty and created.
pub fn regenerate_file(path: &Path, components: &[ComponentRecord]) -> Result<bool> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("cannot read {}", path.display()));
        }
    };

    let updated = regenerate(&existing, components);
    if updated == existing {
        debug!(path = %path.display(), "llms.txt already up to date");
        return Ok(false);
    }

    std::fs::write(path, &updated).with_context(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), "regenerated llms.txt component sections");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn comp(name: &str, category: &str, stage: &str) -> ComponentRecord {
        ComponentRecord {
            name: Some(name.to_string()),
            category: Some(category.to_string()),
            path: Some(format!("src/components/{}/{}.svelte", category, name)),
            stage: Some(stage.to_string()),
            description: Some(format!("{} description", name)),
            ..Default::default()
        }
    }

    fn sample() -> Vec<ComponentRecord> {
        let mut old_tabs = comp("SidebarTabs", "navigation", "deprecated");
        old_tabs.replaced_by = Some("LeftBarItem".to_string());
        let mut old_menu = comp("NavMenu", "navigation", "deprecated");
        old_menu.replaced_by = Some("LeftBar".to_string());
        vec![
            comp("Input", "forms", "stable"),
            comp("Button", "primitives", "stable"),
            comp("Badge", "primitives", "stable"),
            comp("Kanban", "widgets", "stable"),
            comp("Chart", "data", "stable"),
            comp("Toast", "feedback", "beta"),
            comp("Sketch", "primitives", "draft"),
            old_tabs,
            old_menu,
            comp("Breadcrumbs", "navigation", "deprecated"),
            comp("OldSelect", "forms", "deprecated"),
        ]
    }

    #[test]
    fn render_sections_layout() {
        let lines = render_sections(&sample());
        let expected = vec![
            "## Active Components",
            "",
            ACTIVE_BLURB,
            "",
            "### Primitives",
            "- [Badge](./src/components/primitives/Badge.svelte): Badge description",
            "- [Button](./src/components/primitives/Button.svelte): Button description",
            "",
            "### Forms",
            "- [Input](./src/components/forms/Input.svelte): Input description",
            "",
            "### Data",
            "- [Chart](./src/components/data/Chart.svelte): Chart description",
            "",
            "### Widgets",
            "- [Kanban](./src/components/widgets/Kanban.svelte): Kanban description",
            "",
            "## Ready Components",
            "",
            READY_BLURB,
            "",
            "### Feedback (Ready)",
            "- [Toast](./src/components/feedback/Toast.svelte): Toast description",
            "",
            "## Legacy Components",
            "",
            LEGACY_BLURB,
            "",
            "### Navigation (Legacy -- replaced by LeftBar)",
            "- NavMenu",
            "",
            "### Navigation (Legacy -- replaced by LeftBarItem)",
            "- SidebarTabs",
            "",
            "### Navigation (Legacy)",
            "- Breadcrumbs",
            "",
            "### Forms (Legacy)",
            "- [OldSelect](./src/components/forms/OldSelect.svelte): OldSelect description",
            "",
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn legacy_navigation_grouped_by_successor() {
        let mut comps = Vec::new();
        for (name, successor) in [("Sidebar", "LeftBar"), ("SidebarItem", ""), ("TopNav", "LeftBar")] {
            let mut c = comp(name, "navigation", "deprecated");
            c.replaced_by = Some(successor.to_string());
            comps.push(c);
        }
        let lines = render_sections(&comps);
        assert_eq!(
            lines[4..],
            [
                "### Navigation (Legacy -- replaced by LeftBar)",
                "- Sidebar, TopNav",
                "",
                "### Navigation (Legacy)",
                "- SidebarItem",
                "",
            ]
        );
    }

    #[test]
    fn render_sections_skips_empty_tiers_and_drafts() {
        let lines = render_sections(&[comp("Sketch", "primitives", "draft")]);
        assert!(lines.is_empty());
    }

    #[test]
    fn format_component_defaults() {
        let mut c = comp("Card", "", "stable");
        c.description = None;
        c.path = Some(r"src\components\Card.svelte".to_string());
        assert_eq!(
            format_component(&c),
            "- [Card](./src/components/Card.svelte): No description"
        );
        let lines = render_sections(&[c]);
        assert!(lines.contains(&"### Uncategorized".to_string()));
    }

    #[test]
    fn compare_names_case_insensitive() {
        let mut names = vec!["button", "Badge", "Alert", "alert"];
        names.sort_by(|a, b| compare_names(a, b));
        assert_eq!(names, vec!["Alert", "alert", "Badge", "button"]);
    }

    #[test]
    fn splice_replaces_stale_active_section() {
        let existing = "\
# jera

> Svelte component library.

## Active Components

- [Removed](./src/components/Removed.svelte): gone
- [AlsoGone](./x.svelte): stale

## Usage

Import from `@miozu/jera`.
";
        let alpha = ComponentRecord {
            name: Some("Alpha".to_string()),
            category: Some("primitives".to_string()),
            path: Some("src/components/primitives/Alpha.svelte".to_string()),
            stage: Some("stable".to_string()),
            description: Some("First letter".to_string()),
            ..Default::default()
        };
        let result = regenerate(existing, &[alpha]);
        let expected = format!(
            "\
# jera

> Svelte component library.

## Active Components

{}

### Primitives
- [Alpha](./src/components/primitives/Alpha.svelte): First letter

## Usage

Import from `@miozu/jera`.
",
            ACTIVE_BLURB
        );
        assert_eq!(result, expected);
        assert!(!result.contains("Removed"));
    }

    #[test]
    fn splice_spans_all_derived_headings() {
        let existing = "\
intro
## Ready Components
- old beta
## Legacy Components
- old legacy
## Links
- keep me";
        let result = regenerate(existing, &[comp("Toast", "feedback", "beta")]);
        assert!(result.starts_with("intro\n## Ready Components\n"));
        assert!(!result.contains("old beta"));
        assert!(!result.contains("old legacy"));
        assert!(!result.contains(LEGACY_HEADING));
        assert!(result.ends_with("\n## Links\n- keep me"));
    }

    #[test]
    fn splice_stops_at_first_unrelated_heading() {
        let existing = "\
## Active Components
- old
## Usage
human text
## Legacy Components
- manual legacy notes
";
        let result = regenerate(existing, &[comp("Button", "primitives", "stable")]);
        assert!(result.contains("## Usage\nhuman text\n## Legacy Components\n- manual legacy notes\n"));
        assert!(!result.contains("- old\n"));
    }

    #[test]
    fn splice_appends_when_no_heading() {
        let existing = "# jera\n\nIntro text.\n\n\n";
        let result = regenerate(existing, &[comp("Button", "primitives", "stable")]);
        assert!(result.starts_with("# jera\n\nIntro text.\n\n## Active Components\n"));
        assert!(result.ends_with("Button description\n"));
    }

    #[test]
    fn splice_nothing_to_render_leaves_content() {
        let existing = "# jera\n";
        assert_eq!(regenerate(existing, &[]), existing);
    }

    #[test]
    fn regenerate_is_idempotent() {
        let inputs = [
            "",
            "# jera\n\nIntro.\n",
            "# jera\n\n## Active Components\n- stale\n\n## Usage\ntext\n",
            "## Legacy Components\nold\n## Ready Components\nold",
        ];
        for input in inputs {
            let once = regenerate(input, &sample());
            let twice = regenerate(&once, &sample());
            assert_eq!(once, twice, "not idempotent for input {:?}", input);
        }
    }

    #[test]
    fn regenerate_file_writes_only_on_change() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("llms.txt");
        fs::write(&path, "# jera\n").unwrap();

        let comps = vec![comp("Button", "primitives", "stable")];
        assert!(regenerate_file(&path, &comps).unwrap());
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.contains("- [Button]"));

        assert!(!regenerate_file(&path, &comps).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn regenerate_file_creates_missing_index() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("llms.txt");
        let comps = vec![comp("Button", "primitives", "stable")];
        assert!(regenerate_file(&path, &comps).unwrap());
        assert!(fs::read_to_string(&path).unwrap().starts_with(ACTIVE_HEADING));
    }
}
