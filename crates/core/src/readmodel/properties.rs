use indexmap::IndexMap;
use markscope_api::ModelSchema;
use serde::Serialize;
use std::fmt;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Array,
    Timestamp,
}

impl FieldType {
    /// Type for a declared cast; parameters after `:` are ignored.
    pub fn from_cast(cast: &str) -> Self {
        let name = cast.split(':').next().unwrap_or_default().trim().to_ascii_lowercase();
        match name.as_str() {
            "int" | "integer" => FieldType::Int,
            "float" | "double" | "decimal" => FieldType::Float,
            "bool" | "boolean" => FieldType::Bool,
            "array" | "json" => FieldType::Array,
            "datetime" | "timestamp" | "date" => FieldType::Timestamp,
            _ => FieldType::String,
        }
    }

    /// Declared type in generated source.
    pub fn source_type(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Array => "array",
            FieldType::Timestamp => "CarbonInterface",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Array => "array",
            FieldType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub nullable: bool,
}

impl PropertySpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            nullable: false,
        }
    }
}

/// Field name -> inferred type, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelPropertySet {
    properties: IndexMap<String, PropertySpec>,
}

impl ModelPropertySet {
    /// Fillable fields, `created_at`, `updated_at`, the soft-delete column
    /// and `id`, each once, at its first position.
    pub fn from_schema(schema: &ModelSchema) -> Self {
        let soft_delete = schema.soft_delete_column.as_deref();
        let timestamps: Vec<&str> = [CREATED_AT, UPDATED_AT].into_iter().chain(soft_delete).collect();

        let fields = schema
            .fillable
            .iter()
            .map(String::as_str)
            .chain(timestamps.iter().copied())
            .chain([ID_FIELD]);

        let mut properties = IndexMap::new();
        for field in fields {
            if properties.contains_key(field) {
                continue;
            }

            let mut spec = PropertySpec::new(
                schema
                    .casts
                    .get(field)
                    .map_or(FieldType::String, |cast| FieldType::from_cast(cast)),
            );
            if field == ID_FIELD {
                spec.field_type = FieldType::String;
            }
            if timestamps.contains(&field) {
                spec.field_type = FieldType::Timestamp;
                spec.nullable = Some(field) == soft_delete && field != CREATED_AT && field != UPDATED_AT;
            }
            properties.insert(field.to_string(), spec);
        }

        Self { properties }
    }

    pub fn get(&self, field: &str) -> Option<&PropertySpec> {
        self.properties.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<PropertySpec> {
        self.properties.shift_remove(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertySpec)> {
        self.properties.iter().map(|(field, spec)| (field.as_str(), spec))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn schema(fillable: &[&str], casts: &[(&str, &str)], soft_delete: Option<&str>) -> ModelSchema {
        ModelSchema {
            fillable: fillable.iter().map(|f| f.to_string()).collect(),
            casts: casts
                .iter()
                .map(|(f, c)| (f.to_string(), c.to_string()))
                .collect::<BTreeMap<_, _>>(),
            soft_delete_column: soft_delete.map(str::to_string),
            deleted_at: None,
        }
    }

    #[test]
    fn test_cast_inference() {
        let set = ModelPropertySet::from_schema(&schema(
            &["amount", "paid", "tags", "due_on", "count", "note"],
            &[
                ("amount", "decimal:2"),
                ("paid", "boolean"),
                ("tags", "json"),
                ("due_on", "date"),
                ("count", "integer"),
                ("note", "encrypted"),
            ],
            None,
        ));

        let types: Vec<(&str, FieldType)> = set.iter().map(|(f, s)| (f, s.field_type)).collect();
        assert_eq!(
            types,
            vec![
                ("amount", FieldType::Float),
                ("paid", FieldType::Bool),
                ("tags", FieldType::Array),
                ("due_on", FieldType::Timestamp),
                ("count", FieldType::Int),
                ("note", FieldType::String),
                ("created_at", FieldType::Timestamp),
                ("updated_at", FieldType::Timestamp),
                ("id", FieldType::String),
            ]
        );
        assert!(set.iter().all(|(_, s)| !s.nullable));
    }

    #[test]
    fn test_soft_delete_is_the_only_nullable_timestamp() {
        let set = ModelPropertySet::from_schema(&schema(
            &["created_at", "amount"],
            &[("amount", "decimal"), ("created_at", "string")],
            Some("archived_at"),
        ));

        assert_eq!(
            set.get("amount"),
            Some(&PropertySpec {
                field_type: FieldType::Float,
                nullable: false
            })
        );
        assert_eq!(
            set.get("archived_at"),
            Some(&PropertySpec {
                field_type: FieldType::Timestamp,
                nullable: true
            })
        );
        assert_eq!(set.get("created_at").map(|s| (s.field_type, s.nullable)), Some((FieldType::Timestamp, false)));
        let fields: Vec<&str> = set.fields().collect();
        assert_eq!(fields, vec!["created_at", "amount", "updated_at", "archived_at", "id"]);
    }

    #[test]
    fn test_id_is_always_string() {
        let set = ModelPropertySet::from_schema(&schema(&["id"], &[("id", "integer")], None));
        assert_eq!(set.get("id").map(|s| s.field_type), Some(FieldType::String));
        assert_eq!(set.len(), 3);
    }
}
