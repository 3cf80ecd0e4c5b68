//! Class lookup without running any of the scanned code.
//!
//! A class is found in the registration table, in the structural index, or
//! by parsing the file the manifest points at. Parsed files are memoized for
//! the lifetime of the engine.

use crate::manifest::Manifest;
use crate::table::ClassTable;
use markscope_api::{ClassDescriptor, ClassName, LanguagePlugin, ModelSchema};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectionError {
    #[error("class {0} is not known")]
    UnknownClass(ClassName),
    #[error("cannot read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
    #[error("cannot parse {}: {message}", .path.display())]
    Unparsable { path: PathBuf, message: String },
    #[error("class {class} is not declared in {}", .path.display())]
    NotDeclared { class: ClassName, path: PathBuf },
}

pub type ParsedFile = Result<Vec<ClassDescriptor>, IntrospectionError>;

/// Per-path memo of parsed source files.
#[derive(Default)]
pub struct SourceCache {
    files: RefCell<HashMap<PathBuf, Rc<ParsedFile>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&self, plugin: &dyn LanguagePlugin, path: &Path) -> Rc<ParsedFile> {
        if let Some(parsed) = self.files.borrow().get(path) {
            return Rc::clone(parsed);
        }

        trace!("Parsing {}", path.display());
        let parsed = Rc::new(read_and_parse(plugin, path));
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), Rc::clone(&parsed));
        parsed
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

fn read_and_parse(plugin: &dyn LanguagePlugin, path: &Path) -> ParsedFile {
    let source = fs::read_to_string(path).map_err(|e| IntrospectionError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    plugin
        .parse_source(&source, path)
        .map_err(|e| IntrospectionError::Unparsable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

pub struct Introspector<'e> {
    plugin: &'e dyn LanguagePlugin,
    sources: &'e SourceCache,
    registered: &'e ClassTable,
    index: Option<&'e ClassTable>,
    manifest: Option<&'e Manifest>,
}

impl<'e> Introspector<'e> {
    pub fn new(
        plugin: &'e dyn LanguagePlugin,
        sources: &'e SourceCache,
        registered: &'e ClassTable,
    ) -> Self {
        Self {
            plugin,
            sources,
            registered,
            index: None,
            manifest: None,
        }
    }

    pub fn with_index(mut self, index: Option<&'e ClassTable>) -> Self {
        self.index = index;
        self
    }

    pub fn with_manifest(mut self, manifest: Option<&'e Manifest>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn reflect(&self, class: &ClassName) -> Result<ClassDescriptor, IntrospectionError> {
        if let Some(found) = self.registered.get(class.as_str()) {
            return Ok(found.clone());
        }
        if let Some(found) = self.index.and_then(|index| index.get(class.as_str())) {
            return Ok(found.clone());
        }

        let path = self
            .manifest
            .and_then(|manifest| manifest.get(class.as_str()))
            .ok_or_else(|| IntrospectionError::UnknownClass(class.clone()))?;
        self.reflect_in(class, path)
    }

    /// Find `class` among the declarations of `path`.
    pub fn reflect_in(&self, class: &ClassName, path: &Path) -> Result<ClassDescriptor, IntrospectionError> {
        let parsed = self.sources.parse(self.plugin, path);
        let classes = parsed.as_ref().as_ref().map_err(Clone::clone)?;
        classes
            .iter()
            .find(|c| &c.name == class)
            .cloned()
            .ok_or_else(|| IntrospectionError::NotDeclared {
                class: class.clone(),
                path: path.to_path_buf(),
            })
    }

    /// Whether `class` extends or implements `supertype`, directly or through
    /// any ancestor that can be looked up. Ancestors that cannot be found end
    /// that branch of the search.
    pub fn is_subclass_of(&self, class: &ClassDescriptor, supertype: &ClassName) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(class.name.clone());
        enqueue_supertypes(class, &mut queue);

        while let Some(name) = queue.pop_front() {
            if &name == supertype {
                return true;
            }
            if !visited.insert(name.clone()) {
                continue;
            }
            match self.reflect(&name) {
                Ok(ancestor) => enqueue_supertypes(&ancestor, &mut queue),
                Err(err) => trace!("Stopping supertype walk at {}: {}", name, err),
            }
        }

        false
    }

    /// The model schema of `class` with every ancestor's declarations folded
    /// underneath, nearest first. The walk stops at the first parent that
    /// cannot be looked up.
    pub fn model_schema(&self, class: &ClassDescriptor) -> Option<ModelSchema> {
        let mut merged = class.model.clone();
        let mut visited = HashSet::new();
        visited.insert(class.name.clone());
        let mut parent = class.parent.clone();

        while let Some(name) = parent {
            if !visited.insert(name.clone()) {
                break;
            }
            let ancestor = match self.reflect(&name) {
                Ok(ancestor) => ancestor,
                Err(err) => {
                    trace!("Stopping schema walk at {}: {}", name, err);
                    break;
                }
            };
            if let Some(schema) = &ancestor.model {
                merged.get_or_insert_with(ModelSchema::default).inherit(schema);
            }
            parent = ancestor.parent;
        }

        merged
    }
}

fn enqueue_supertypes(class: &ClassDescriptor, queue: &mut VecDeque<ClassName>) {
    queue.extend(class.parent.iter().cloned());
    queue.extend(class.interfaces.iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use markscope_api::ClassKind;
    use markscope_php::PhpPlugin;
    use tempfile::tempdir;

    #[test]
    fn test_subclass_walk_through_table() {
        let table = ClassTable::new()
            .with(ClassDescriptor::new("App\\Base", ClassKind::AbstractClass).with_parent("Vendor\\Command"))
            .with(ClassDescriptor::new("App\\Loop", ClassKind::Class).with_parent("App\\Loop"));
        let plugin = PhpPlugin::new();
        let sources = SourceCache::new();
        let introspector = Introspector::new(&plugin, &sources, &table);

        let command = ClassDescriptor::new("App\\Sync", ClassKind::Class).with_parent("App\\Base");
        assert!(introspector.is_subclass_of(&command, &ClassName::new("Vendor\\Command")));
        assert!(!introspector.is_subclass_of(&command, &ClassName::new("Vendor\\Other")));

        let looping = table.get("App\\Loop").unwrap().clone();
        assert!(!introspector.is_subclass_of(&looping, &ClassName::new("Vendor\\Command")));
    }

    #[test]
    fn test_model_schema_walks_parents() {
        let base = ModelSchema {
            casts: [("amount".to_string(), "float".to_string())].into_iter().collect(),
            soft_delete_column: Some("deleted_at".into()),
            ..ModelSchema::default()
        };
        let table = ClassTable::new()
            .with(
                ClassDescriptor::new("App\\BaseModel", ClassKind::AbstractClass)
                    .with_parent("Illuminate\\Database\\Eloquent\\Model")
                    .with_model(base),
            )
            .with(ClassDescriptor::new("App\\Timestamped", ClassKind::AbstractClass).with_parent("App\\BaseModel"));
        let plugin = PhpPlugin::new();
        let sources = SourceCache::new();
        let introspector = Introspector::new(&plugin, &sources, &table);

        let order = ClassDescriptor::new("App\\Order", ClassKind::Class)
            .with_parent("App\\Timestamped")
            .with_model(ModelSchema {
                fillable: vec!["amount".into()],
                ..ModelSchema::default()
            });
        let schema = introspector.model_schema(&order).unwrap();
        assert_eq!(schema.fillable, vec!["amount"]);
        assert_eq!(schema.casts.get("amount").map(String::as_str), Some("float"));
        assert_eq!(schema.soft_delete_column.as_deref(), Some("deleted_at"));

        let unrelated = ClassDescriptor::new("App\\Plain", ClassKind::Class).with_parent("Vendor\\Thing");
        assert_eq!(introspector.model_schema(&unrelated), None);
    }

    #[test]
    fn test_reflect_through_manifest_is_memoized() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("Thing.php");
        fs::write(&file, "<?php namespace App; class Thing implements \\Countable {}").unwrap();

        let manifest = Manifest::from_entries([
            (ClassName::new("App\\Thing"), file.clone()),
            (ClassName::new("App\\Ghost"), file.clone()),
            (ClassName::new("App\\Gone"), dir.path().join("Gone.php")),
        ]);
        let plugin = PhpPlugin::new();
        let sources = SourceCache::new();
        let table = ClassTable::new();
        let introspector = Introspector::new(&plugin, &sources, &table).with_manifest(Some(&manifest));

        let thing = introspector.reflect(&ClassName::new("App\\Thing")).unwrap();
        assert_eq!(thing.interfaces, vec![ClassName::new("Countable")]);
        assert!(introspector.is_subclass_of(&thing, &ClassName::new("Countable")));

        assert!(matches!(
            introspector.reflect(&ClassName::new("App\\Ghost")),
            Err(IntrospectionError::NotDeclared { .. })
        ));
        assert!(matches!(
            introspector.reflect(&ClassName::new("App\\Gone")),
            Err(IntrospectionError::Unreadable { .. })
        ));
        assert!(matches!(
            introspector.reflect(&ClassName::new("App\\Unlisted")),
            Err(IntrospectionError::UnknownClass(_))
        ));
        assert_eq!(sources.len(), 2);
    }
}
