pub mod classmap;
pub mod error;
pub mod lexer;
pub mod parser;

pub use classmap::parse_classmap;
pub use error::ParseError;
pub use parser::parse_declarations;

use markscope_api::{BoxError, ClassDescriptor, LanguagePlugin, ManifestEntry};
use std::path::{Path, PathBuf};

/// Composer's class map, relative to the project root.
pub const DEFAULT_CLASSMAP_PATH: &str = "vendor/composer/autoload_classmap.php";

pub struct PhpPlugin {
    manifest_path: PathBuf,
}

impl PhpPlugin {
    pub fn new() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_CLASSMAP_PATH),
        }
    }
}

impl Default for PhpPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for PhpPlugin {
    fn name(&self) -> &str {
        "php"
    }

    fn handles(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "php")
    }

    fn parse_source(&self, source: &str, path: &Path) -> Result<Vec<ClassDescriptor>, BoxError> {
        let classes = parse_declarations(source, path)?;
        tracing::trace!("Parsed {} declarations from {}", classes.len(), path.display());
        Ok(classes)
    }

    fn parse_manifest(
        &self,
        source: &str,
        manifest_path: &Path,
    ) -> Result<Vec<ManifestEntry>, BoxError> {
        Ok(parse_classmap(source, manifest_path))
    }

    fn default_manifest_path(&self) -> &Path {
        &self.manifest_path
    }
}
