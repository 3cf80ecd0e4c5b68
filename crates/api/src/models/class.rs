use super::marker::MarkerInstance;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Separator between namespace segments and the class name.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Fully qualified class name, stored without a leading separator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ClassName(String);

impl ClassName {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().trim_start_matches(NAMESPACE_SEPARATOR).to_string())
    }

    /// Build a name from its segments, e.g. `["App", "Model", "User"]`.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\\");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The unqualified class name (`User` for `App\Model\User`).
    pub fn short_name(&self) -> &str {
        self.0
            .rsplit_once(NAMESPACE_SEPARATOR)
            .map_or(self.0.as_str(), |(_, name)| name)
    }

    /// The enclosing namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once(NAMESPACE_SEPARATOR).map(|(ns, _)| ns)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(NAMESPACE_SEPARATOR)
    }

    /// Whether this name lives under `prefix` (e.g. `App\`).
    pub fn in_namespace(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_start_matches(NAMESPACE_SEPARATOR);
        prefix.is_empty() || self.0.starts_with(prefix)
    }

    /// Join a child segment onto this name.
    pub fn join(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self::new(segment)
        } else {
            let segment = segment.trim_start_matches(NAMESPACE_SEPARATOR);
            Self(format!("{}{}{}", self.0, NAMESPACE_SEPARATOR, segment))
        }
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<ClassName> for String {
    fn from(value: ClassName) -> Self {
        value.0
    }
}

impl Borrow<str> for ClassName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    AbstractClass,
    Interface,
    Trait,
    Enum,
}

impl ClassKind {
    /// Abstract classes, interfaces and traits can never be discovery targets.
    pub fn is_concrete(&self) -> bool {
        matches!(self, ClassKind::Class | ClassKind::Enum)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub markers: Vec<MarkerInstance>,
}

impl MethodDescriptor {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Persistence-model schema as declared on the model class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Mass-assignable fields in declaration order.
    pub fillable: Vec<String>,
    /// Field -> cast name (e.g. `"amount" -> "decimal:2"`).
    pub casts: BTreeMap<String, String>,
    /// Soft-delete timestamp column, if the model declares soft deletes.
    pub soft_delete_column: Option<String>,
    /// `DELETED_AT` as declared on this class, with or without soft deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

impl ModelSchema {
    /// Fold a parent's schema under this one. Whatever this class declares
    /// wins: a non-empty `fillable` replaces the parent's, casts are merged
    /// per field, and the nearest `DELETED_AT` names the soft-delete column.
    pub fn inherit(&mut self, parent: &ModelSchema) {
        if self.fillable.is_empty() {
            self.fillable = parent.fillable.clone();
        }
        for (field, cast) in &parent.casts {
            self.casts
                .entry(field.clone())
                .or_insert_with(|| cast.clone());
        }
        if self.deleted_at.is_none() {
            self.deleted_at = parent.deleted_at.clone();
        }
        if self.soft_delete_column.is_none() {
            self.soft_delete_column = parent.soft_delete_column.clone();
        }
        if let (Some(column), Some(declared)) = (self.soft_delete_column.as_mut(), &self.deleted_at) {
            column.clone_from(declared);
        }
    }
}

/// Everything the discovery engine needs to know about one declaration,
/// read statically from source or registered by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: ClassName,
    pub kind: ClassKind,
    pub parent: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    pub traits: Vec<ClassName>,
    pub markers: Vec<MarkerInstance>,
    pub methods: Vec<MethodDescriptor>,
    pub model: Option<ModelSchema>,
    pub path: Option<PathBuf>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<ClassName>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            markers: Vec::new(),
            methods: Vec::new(),
            model: None,
            path: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ClassName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_marker(mut self, marker: MarkerInstance) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_model(mut self, model: ModelSchema) -> Self {
        self.model = Some(model);
        self
    }

    pub fn public_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter().filter(|m| m.is_public())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_parts() {
        let name = ClassName::new("\\App\\Billing\\Invoice");
        assert_eq!(name.as_str(), "App\\Billing\\Invoice");
        assert_eq!(name.short_name(), "Invoice");
        assert_eq!(name.namespace(), Some("App\\Billing"));
        assert_eq!(name.segments().count(), 3);
        assert!(name.in_namespace("App\\"));
        assert!(!name.in_namespace("Vendor\\"));
    }

    #[test]
    fn test_class_name_without_namespace() {
        let name = ClassName::new("Invoice");
        assert_eq!(name.short_name(), "Invoice");
        assert_eq!(name.namespace(), None);
        assert_eq!(ClassName::new("App").join("Invoice").as_str(), "App\\Invoice");
    }

    #[test]
    fn test_from_segments() {
        let name = ClassName::from_segments(["App", "ReadModel", "Invoice"]);
        assert_eq!(name.as_str(), "App\\ReadModel\\Invoice");
    }

    #[test]
    fn test_concrete_kinds() {
        assert!(ClassKind::Class.is_concrete());
        assert!(!ClassKind::AbstractClass.is_concrete());
        assert!(!ClassKind::Interface.is_concrete());
        assert!(!ClassKind::Trait.is_concrete());
    }

    #[test]
    fn test_schema_inherits_from_parent() {
        let parent = ModelSchema {
            fillable: vec!["legacy".into()],
            casts: [("amount".to_string(), "decimal:2".to_string()), ("paid".to_string(), "bool".to_string())]
                .into_iter()
                .collect(),
            soft_delete_column: Some("deleted_at".into()),
            deleted_at: None,
        };
        let mut child = ModelSchema {
            fillable: vec!["amount".into()],
            casts: [("paid".to_string(), "datetime".to_string())].into_iter().collect(),
            soft_delete_column: None,
            deleted_at: Some("archived_at".into()),
        };

        child.inherit(&parent);

        assert_eq!(child.fillable, vec!["amount"]);
        assert_eq!(child.casts.get("amount").map(String::as_str), Some("decimal:2"));
        assert_eq!(child.casts.get("paid").map(String::as_str), Some("datetime"));
        assert_eq!(child.soft_delete_column.as_deref(), Some("archived_at"));

        let mut bare = ModelSchema::default();
        bare.inherit(&parent);
        assert_eq!(bare.fillable, vec!["legacy"]);
        assert_eq!(bare.soft_delete_column.as_deref(), Some("deleted_at"));
    }
}
