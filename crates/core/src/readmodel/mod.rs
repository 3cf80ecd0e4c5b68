//! Read-model descriptors and finder generation.

mod discovery;
pub mod generator;
pub mod properties;

pub use discovery::{discover, infer_read_model_class};
pub use generator::{FinderGenerator, MappedField};
pub use properties::{FieldType, ModelPropertySet, PropertySpec};

use crate::catalog::ReadModelMarker;
use markscope_api::ClassName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a model's fields map onto its read model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadModelConfig {
    pub exclude_fields: Vec<String>,
    /// Field -> coercion (`int`, `float`, `bool`, `array`, `string`).
    pub custom_mappings: BTreeMap<String, String>,
    /// Model field -> read-model field.
    pub field_mappings: BTreeMap<String, String>,
}

impl ReadModelConfig {
    pub fn excludes(&self, field: &str) -> bool {
        self.exclude_fields.iter().any(|f| f == field)
    }

    pub fn target_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.field_mappings.get(field).map_or(field, String::as_str)
    }
}

impl From<ReadModelMarker> for ReadModelConfig {
    fn from(marker: ReadModelMarker) -> Self {
        Self {
            exclude_fields: marker.exclude_fields,
            custom_mappings: marker.custom_mappings,
            field_mappings: marker.field_mappings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadModelDescriptor {
    pub model: ClassName,
    pub read_model: ClassName,
    #[serde(flatten)]
    pub config: ReadModelConfig,
}
