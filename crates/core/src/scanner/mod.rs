//! The two live discovery strategies.
//!
//! Both feed candidates through [`ScanContext::visit`], so the manifest fast
//! path and the structural walk apply exactly the same target rules.

pub mod manifest;
pub mod structural;

pub use structural::StructuralIndex;

use crate::catalog::MarkerCatalog;
use crate::config::DiscoveryConfig;
use crate::domain::{DiscoveryDomain, carries_marker};
use crate::introspect::Introspector;
use crate::report::ScanReport;
use markscope_api::{ClassDescriptor, ClassName};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Where a resolved result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Cache,
    Manifest,
    Structural,
    /// Nothing found, or live discovery not allowed.
    None,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Cache => "cache",
            Strategy::Manifest => "manifest",
            Strategy::Structural => "structural",
            Strategy::None => "none",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ScanContext<'e> {
    pub config: &'e DiscoveryConfig,
    pub catalog: &'e MarkerCatalog,
    pub introspector: Introspector<'e>,
}

impl ScanContext<'_> {
    /// Fold `class` into `output` if it is a target of domain `D`.
    pub fn visit<D: DiscoveryDomain>(
        &self,
        class: &ClassDescriptor,
        output: &mut D::Output,
        report: &mut ScanReport,
    ) {
        if !class.kind.is_concrete() {
            trace!("Skipping {:?} {}", class.kind, class.name);
            return;
        }
        let class = self.canonical(class);
        if !carries_marker::<D>(&class, self.catalog) {
            return;
        }
        if let Some(supertype) = D::supertype(self.config) {
            if !self.introspector.is_subclass_of(&class, supertype) {
                trace!("Skipping {}: not a {}", class.name, supertype);
                return;
            }
        }

        D::collect(&class, self.catalog, output, report);
    }

    /// `class` with every marker whose attribute class extends a catalog
    /// marker renamed to that marker. Borrowed when nothing is renamed.
    pub fn canonical<'c>(&self, class: &'c ClassDescriptor) -> Cow<'c, ClassDescriptor> {
        let mut derived: HashMap<ClassName, ClassName> = HashMap::new();
        let instances = class
            .markers
            .iter()
            .chain(class.methods.iter().flat_map(|m| m.markers.iter()));
        for instance in instances {
            if derived.contains_key(&instance.name) || self.catalog.kind_of(&instance.name).is_some() {
                continue;
            }
            if let Some(kind) = self.catalog.resolve_kind(&instance.name, &self.introspector) {
                let marker = self.catalog.marker_name(kind);
                trace!("{} on {} reads as {}", instance.name, class.name, marker);
                derived.insert(instance.name.clone(), marker.clone());
            }
        }
        if derived.is_empty() {
            return Cow::Borrowed(class);
        }

        let mut class = class.clone();
        let instances = class
            .markers
            .iter_mut()
            .chain(class.methods.iter_mut().flat_map(|m| m.markers.iter_mut()));
        for instance in instances {
            if let Some(marker) = derived.get(&instance.name) {
                instance.name = marker.clone();
            }
        }
        Cow::Owned(class)
    }
}
