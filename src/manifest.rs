//! Component manifest loading.

use crate::types::{DocLevel, Stage, normalize_separators};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Entry fields read as text. Any other JSON type is rendered to text and
/// recorded in [`ComponentRecord::wrong_types`].
const TEXT_FIELDS: &[&str] = &[
    "name",
    "category",
    "path",
    "stage",
    "lastReviewed",
    "docLevel",
    "description",
    "replacedBy",
    "status",
];

/// The only fatal condition of an audit: no usable manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("cannot read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parsed `components.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub schema_version: Option<Value>,
    #[serde(default)]
    pub stage_definitions: BTreeMap<String, Value>,
    #[serde(default)]
    pub doc_level_definitions: BTreeMap<String, Value>,
    #[serde(deserialize_with = "lenient_components")]
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    pub utilities: Option<Value>,
    #[serde(default)]
    pub actions: Option<Value>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }
}

impl FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

fn lenient_components<'de, D>(deserializer: D) -> Result<Vec<ComponentRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .map(|entry| ComponentRecord::from_value(entry).map_err(D::Error::custom))
        .collect()
}

/// One manifest entry.
///
/// Required fields are optional here so that an incomplete entry still loads
/// and is reported by the schema check instead of aborting the audit.
/// `revision` and `breaking` stay raw JSON for the same reason.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub name: Option<String>,
    pub category: Option<String>,
    pub path: Option<String>,
    pub stage: Option<String>,
    pub revision: Option<Value>,
    pub last_reviewed: Option<String>,
    pub doc_level: Option<String>,
    pub breaking: Option<Value>,
    pub description: Option<String>,
    pub replaced_by: Option<String>,
    /// Prop name to metadata object.
    pub props: Option<Value>,
    /// Event handler names.
    pub events: Option<Value>,
    /// Lifecycle field of v1 manifests (`active`, `ready`, `legacy`).
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// Text fields that held another JSON type, in [`TEXT_FIELDS`] order.
    #[serde(skip)]
    pub wrong_types: Vec<&'static str>,
}

impl ComponentRecord {
    /// Build a record from one raw entry without rejecting bad field types.
    ///
    /// A text field holding a number, boolean, array or object keeps its JSON
    /// rendering (`5` becomes `"5"`) and is listed in `wrong_types`. An entry
    /// that is not an object loads as an empty record.
    pub fn from_value(entry: Value) -> Result<Self, serde_json::Error> {
        let mut fields = match entry {
            Value::Object(fields) => fields,
            other => {
                debug!(entry = %other, "manifest entry is not an object");
                return Ok(Self::default());
            }
        };
        let wrong_types = coerce_text_fields(&mut fields);
        let mut record: Self = serde_json::from_value(Value::Object(fields))?;
        record.wrong_types = wrong_types;
        Ok(record)
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Declared stage, if it is a known one.
    pub fn stage(&self) -> Option<Stage> {
        self.stage.as_deref().and_then(Stage::parse)
    }

    pub fn doc_level(&self) -> Option<DocLevel> {
        self.doc_level.as_deref().and_then(DocLevel::parse)
    }

    pub fn is_deprecated(&self) -> bool {
        self.stage() == Some(Stage::Deprecated)
    }

    /// Manifest path with `/` separators; `None` when absent or empty.
    pub fn normalized_path(&self) -> Option<String> {
        self.path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(normalize_separators)
    }

    /// Whether a required field is absent or null.
    pub fn is_missing(&self, field: &str) -> bool {
        match field {
            "name" => self.name.is_none(),
            "category" => self.category.is_none(),
            "path" => self.path.is_none(),
            "stage" => self.stage.is_none(),
            "revision" => self.revision.is_none(),
            "lastReviewed" => self.last_reviewed.is_none(),
            "docLevel" => self.doc_level.is_none(),
            "breaking" => self.breaking.is_none(),
            other => self.extra.get(other).is_none_or(Value::is_null),
        }
    }
}

fn coerce_text_fields(fields: &mut Map<String, Value>) -> Vec<&'static str> {
    let mut coerced = Vec::new();
    for &field in TEXT_FIELDS {
        if let Some(value) = fields.get_mut(field) {
            if !(value.is_string() || value.is_null()) {
                *value = Value::String(value.to_string());
                coerced.push(field);
            }
        }
    }
    coerced
}
