use crate::models::{ClassDescriptor, ClassName};
use std::path::{Path, PathBuf};

/// Error type for plugin operations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One `class name -> source file` pair from the build tool's class map.
pub type ManifestEntry = (ClassName, PathBuf);

/// Language-specific reading of the scanned application's source tree.
///
/// The core engine never looks at source text itself: it asks the plugin for
/// the declarations in a file and for the entries of the class-map manifest.
pub trait LanguagePlugin: Send + Sync {
    /// Short identifier, e.g. `"php"`.
    fn name(&self) -> &str;

    /// Whether a file under the source tree should be parsed.
    fn handles(&self, path: &Path) -> bool;

    /// Read every type declaration in `source` (the contents of `path`).
    fn parse_source(&self, source: &str, path: &Path) -> Result<Vec<ClassDescriptor>, BoxError>;

    /// Read the build tool's class map. Relative entries are resolved against
    /// the manifest's own location.
    fn parse_manifest(
        &self,
        source: &str,
        manifest_path: &Path,
    ) -> Result<Vec<ManifestEntry>, BoxError>;

    /// Conventional manifest location relative to the project root.
    fn default_manifest_path(&self) -> &Path;
}
