//! The build tool's `class name -> source file` map.

use crate::error::Result;
use indexmap::IndexMap;
use markscope_api::{ClassName, LanguagePlugin};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    path: PathBuf,
    entries: IndexMap<ClassName, PathBuf>,
}

impl Manifest {
    /// `Ok(None)` when the file does not exist. A `.json` manifest is read
    /// directly (relative paths joined to `base_path`); anything else is
    /// handed to the language plugin.
    pub fn load(path: &Path, base_path: &Path, plugin: &dyn LanguagePlugin) -> Result<Option<Self>> {
        if !path.is_file() {
            debug!("No manifest at {}", path.display());
            return Ok(None);
        }

        let source = fs::read_to_string(path)?;
        let entries: Vec<(ClassName, PathBuf)> =
            if path.extension().is_some_and(|ext| ext == "json") {
                let raw: IndexMap<String, PathBuf> = serde_json::from_str(&source)?;
                raw.into_iter()
                    .map(|(class, file)| {
                        let file = if file.is_absolute() { file } else { base_path.join(file) };
                        (ClassName::new(class), file)
                    })
                    .collect()
            } else {
                plugin.parse_manifest(&source, path)?
            };

        debug!("Loaded {} manifest entries from {}", entries.len(), path.display());
        Ok(Some(Self {
            path: path.to_path_buf(),
            entries: entries.into_iter().collect(),
        }))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (ClassName, PathBuf)>) -> Self {
        Self {
            path: PathBuf::new(),
            entries: entries.into_iter().collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, class: &str) -> Option<&Path> {
        self.entries.get(class).map(PathBuf::as_path)
    }

    /// Entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClassName, &Path)> {
        self.entries.iter().map(|(class, path)| (class, path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Path with `/` separators, for fragment matching on any platform.
pub fn normalized_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use markscope_php::PhpPlugin;
    use tempfile::tempdir;

    #[test]
    fn test_missing_manifest_is_none() {
        let dir = tempdir().unwrap();
        let loaded = Manifest::load(&dir.path().join("nope.php"), dir.path(), &PhpPlugin::new()).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_json_manifest_keeps_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classmap.json");
        fs::write(
            &path,
            r#"{"App\\Zeta": "src/Zeta.php", "App\\Alpha": "/abs/Alpha.php"}"#,
        )
        .unwrap();

        let manifest = Manifest::load(&path, dir.path(), &PhpPlugin::new())
            .unwrap()
            .unwrap();
        let classes: Vec<_> = manifest.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(classes, vec!["App\\Zeta", "App\\Alpha"]);
        assert_eq!(manifest.get("App\\Zeta"), Some(dir.path().join("src/Zeta.php").as_path()));
        assert_eq!(manifest.get("App\\Alpha"), Some(Path::new("/abs/Alpha.php")));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classmap.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(Manifest::load(&path, dir.path(), &PhpPlugin::new()).is_err());
    }

    #[test]
    fn test_normalized_path() {
        assert_eq!(normalized_path(Path::new("a\\b/c")), "a/b/c");
    }
}
