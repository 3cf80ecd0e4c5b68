use super::ScanContext;
use crate::domain::{DiscoveryDomain, DiscoveryShape};
use crate::introspect::SourceCache;
use crate::report::{DiscoveryFailure, ScanReport};
use crate::table::ClassTable;
use ignore::WalkBuilder;
use markscope_api::{ClassDescriptor, LanguagePlugin};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Every declaration under the source root, plus the registration table.
///
/// Built once per engine and shared by every domain that falls back to the
/// structural scan, and by read-model discovery.
#[derive(Debug, Default)]
pub struct StructuralIndex {
    classes: Vec<ClassDescriptor>,
    table: ClassTable,
    files: usize,
    report: ScanReport,
}

impl StructuralIndex {
    /// Registered classes come first and shadow same-named declarations
    /// found in files. Files are visited in sorted path order.
    pub fn build(
        root: &Path,
        plugin: &dyn LanguagePlugin,
        sources: &SourceCache,
        registered: &ClassTable,
    ) -> Self {
        let mut index = Self {
            classes: registered.iter().cloned().collect(),
            table: registered.clone(),
            ..Self::default()
        };

        if !root.is_dir() {
            index.report.record(
                DiscoveryFailure::ScannerUnavailable,
                root.display().to_string(),
                "source root is not a directory",
            );
            return index;
        }

        for path in collect_paths(root, plugin, &mut index.report) {
            index.files += 1;
            let parsed = sources.parse(plugin, &path);
            let classes = match parsed.as_ref() {
                Ok(classes) => classes,
                Err(err) => {
                    index.report.record(
                        DiscoveryFailure::IntrospectionFailure,
                        path.display().to_string(),
                        err.to_string(),
                    );
                    continue;
                }
            };

            for class in classes {
                if index.table.contains(class.name.as_str()) {
                    trace!("{} already indexed, ignoring {}", class.name, path.display());
                    continue;
                }
                index.table.register(class.clone());
                index.classes.push(class.clone());
            }
        }

        info!(
            "Indexed {} classes from {} files under {}",
            index.classes.len(),
            index.files,
            root.display()
        );
        index
    }

    /// Declarations in scan order.
    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    pub fn table(&self) -> &ClassTable {
        &self.table
    }

    pub fn file_count(&self) -> usize {
        self.files
    }

    pub fn report(&self) -> &ScanReport {
        &self.report
    }
}

fn collect_paths(root: &Path, plugin: &dyn LanguagePlugin, report: &mut ScanReport) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkBuilder::new(root)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && plugin.handles(path) {
                    Some(path.to_path_buf())
                } else {
                    None
                }
            }
            Err(err) => {
                report.record(
                    DiscoveryFailure::ScannerUnavailable,
                    root.display().to_string(),
                    err.to_string(),
                );
                None
            }
        })
        .collect();
    paths.sort();
    paths
}

pub fn scan<D: DiscoveryDomain>(
    ctx: &ScanContext<'_>,
    index: &StructuralIndex,
    report: &mut ScanReport,
) -> D::Output {
    let mut output = D::Output::default();
    for class in index.classes() {
        ctx.visit::<D>(class, &mut output, report);
    }

    debug!(
        "Structural scan for {}: {} classes, {} entries",
        D::ID,
        index.classes().len(),
        output.entry_count()
    );
    output
}
