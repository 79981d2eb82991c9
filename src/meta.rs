//! Read-only metadata queries over a loaded manifest.
//!
//! Lookups return the first matching entry when names collide; the schema
//! check reports such collisions separately.

use crate::llms::{CATEGORY_ORDER, capitalize};
use crate::manifest::{ComponentRecord, Manifest};
use crate::types::{DocLevel, Stage, to_slug};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

/// Effective stage of an entry, falling back to the v1 `status` field.
pub fn resolve_stage(comp: &ComponentRecord) -> Stage {
    if let Some(stage) = comp.stage() {
        return stage;
    }
    match comp.status.as_deref() {
        Some("active") => Stage::Stable,
        Some("ready") => Stage::Beta,
        Some("legacy") => Stage::Deprecated,
        _ => Stage::Draft,
    }
}

/// Normalized lifecycle summary of one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    pub name: String,
    pub category: Option<String>,
    pub stage: Stage,
    pub revision: u64,
    pub last_reviewed: Option<String>,
    pub doc_level: DocLevel,
    pub breaking: Vec<String>,
    pub replaced_by: Option<String>,
}

/// One row of a component's props table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropRow {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bindable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEntry {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// A documented category and its non-deprecated components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub components: Vec<CategoryEntry>,
}

impl Manifest {
    pub fn get_component(&self, name: &str) -> Option<&ComponentRecord> {
        self.components.iter().find(|c| c.name.as_deref() == Some(name))
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&ComponentRecord> {
        self.components
            .iter()
            .find(|c| c.name.is_some() && to_slug(c.name()) == slug)
    }

    pub fn get_by_stage(&self, stage: Stage) -> Vec<&ComponentRecord> {
        self.components
            .iter()
            .filter(|c| resolve_stage(c) == stage)
            .collect()
    }

    /// Components never reviewed, or last reviewed before `now - days`.
    pub fn get_stale(&self, days: i64, now: DateTime<Utc>) -> Vec<&ComponentRecord> {
        let cutoff = now - Duration::days(days);
        self.components
            .iter()
            .filter(|c| match c.last_reviewed.as_deref() {
                None | Some("") => true,
                Some(date) => {
                    crate::audit::parse_review_date(date).is_none_or(|reviewed| reviewed < cutoff)
                }
            })
            .collect()
    }

    pub fn get_component_meta(&self, name: &str) -> Option<ComponentMeta> {
        let comp = self.get_component(name)?;
        let breaking = match comp.breaking.as_ref() {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Some(ComponentMeta {
            name: comp.name().to_string(),
            category: comp.category.clone(),
            stage: resolve_stage(comp),
            revision: comp
                .revision
                .as_ref()
                .and_then(Value::as_u64)
                .filter(|r| *r > 0)
                .unwrap_or(1),
            last_reviewed: comp.last_reviewed.clone(),
            doc_level: comp.doc_level().unwrap_or(DocLevel::None),
            breaking,
            replaced_by: comp.replaced_by.clone(),
        })
    }

    /// Props in manifest order, then each event as a `function` row.
    pub fn get_props_table(&self, name: &str) -> Vec<PropRow> {
        let Some(comp) = self.get_component(name) else {
            return Vec::new();
        };
        let Some(Value::Object(props)) = comp.props.as_ref() else {
            return Vec::new();
        };

        let mut rows: Vec<PropRow> = props
            .iter()
            .map(|(prop, meta)| PropRow {
                name: prop.clone(),
                ty: meta
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                default: meta.get("default").filter(|v| !v.is_null()).cloned(),
                description: meta
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                required: meta.get("required").and_then(Value::as_bool).unwrap_or(false),
                bindable: meta.get("bindable").and_then(Value::as_bool).unwrap_or(false),
            })
            .collect();

        if let Some(Value::Array(events)) = comp.events.as_ref() {
            for event in events.iter().filter_map(Value::as_str) {
                rows.push(PropRow {
                    name: event.to_string(),
                    ty: "function".to_string(),
                    default: None,
                    description: format!("{} handler", event.replacen("on", "", 1)),
                    required: false,
                    bindable: false,
                });
            }
        }
        rows
    }

    /// Non-deprecated components grouped by the known categories, in order.
    /// Components in other categories are left out.
    pub fn categories(&self) -> Vec<Category> {
        CATEGORY_ORDER
            .iter()
            .filter_map(|id| {
                let components: Vec<CategoryEntry> = self
                    .components
                    .iter()
                    .filter(|c| resolve_stage(c) != Stage::Deprecated)
                    .filter(|c| c.category.as_deref() == Some(*id))
                    .map(|c| CategoryEntry {
                        name: c.name().to_string(),
                        slug: to_slug(c.name()),
                        description: c.description.clone(),
                    })
                    .collect();
                (!components.is_empty()).then(|| Category {
                    id: id.to_string(),
                    label: capitalize(id),
                    components,
                })
            })
            .collect()
    }
}
