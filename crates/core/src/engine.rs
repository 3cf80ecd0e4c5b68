//! Dual-strategy discovery engine.
//!
//! `resolve` answers from the cache artifact when one exists. Otherwise, and
//! only in the local environment, it runs live discovery: the manifest scan
//! first, the structural scan when the manifest yields nothing. Live
//! discovery never fails; whatever it had to skip ends up in the report.

use crate::cache::DiscoveryCache;
use crate::catalog::MarkerCatalog;
use crate::config::DiscoveryConfig;
use crate::domain::{DiscoveryDomain, DiscoveryShape};
use crate::error::Result;
use crate::introspect::{IntrospectionError, Introspector, SourceCache};
use crate::manifest::Manifest;
use crate::readmodel::{self, ReadModelDescriptor};
use crate::report::{DiscoveryFailure, ScanReport};
use crate::scanner::{self, ScanContext, Strategy, StructuralIndex};
use crate::table::ClassTable;
use markscope_api::{ClassDescriptor, ClassName, DiscoveryResult, DomainId, LanguagePlugin};
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A resolved domain result and how it was obtained.
#[derive(Debug, Clone)]
pub struct Discovery<T> {
    pub output: T,
    pub strategy: Strategy,
    pub report: ScanReport,
    pub duration: Duration,
}

impl<T> Discovery<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Discovery<U> {
        Discovery {
            output: f(self.output),
            strategy: self.strategy,
            report: self.report,
            duration: self.duration,
        }
    }
}

pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    plugin: Arc<dyn LanguagePlugin>,
    catalog: MarkerCatalog,
    registered: ClassTable,
    cache: DiscoveryCache,
    sources: SourceCache,
    manifest: OnceCell<(Option<Manifest>, ScanReport)>,
    index: OnceCell<StructuralIndex>,
}

impl DiscoveryEngine {
    pub fn new(config: DiscoveryConfig, plugin: Arc<dyn LanguagePlugin>) -> Self {
        let catalog = MarkerCatalog::new(&config.markers);
        let cache = DiscoveryCache::new(&config);
        Self {
            config,
            plugin,
            catalog,
            registered: ClassTable::new(),
            cache,
            sources: SourceCache::new(),
            manifest: OnceCell::new(),
            index: OnceCell::new(),
        }
    }

    pub fn with_table(mut self, table: ClassTable) -> Self {
        self.registered.extend(table.iter().cloned());
        self.index = OnceCell::new();
        self
    }

    /// Add an explicit registration. Takes effect for scans started afterwards.
    pub fn register(&mut self, class: ClassDescriptor) {
        self.registered.register(class);
        self.index = OnceCell::new();
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn catalog(&self) -> &MarkerCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &DiscoveryCache {
        &self.cache
    }

    fn manifest_state(&self) -> &(Option<Manifest>, ScanReport) {
        self.manifest.get_or_init(|| {
            let path = self.config.manifest_file(self.plugin.default_manifest_path());
            let mut report = ScanReport::new();
            let manifest = match Manifest::load(&path, &self.config.base_path, self.plugin.as_ref()) {
                Ok(Some(manifest)) => Some(manifest),
                Ok(None) => {
                    report.record(
                        DiscoveryFailure::MissingManifest,
                        path.display().to_string(),
                        "no manifest file",
                    );
                    None
                }
                Err(e) => {
                    report.record(
                        DiscoveryFailure::MissingManifest,
                        path.display().to_string(),
                        e.to_string(),
                    );
                    None
                }
            };
            (manifest, report)
        })
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest_state().0.as_ref()
    }

    /// Walks the source tree on first use.
    pub fn structural_index(&self) -> &StructuralIndex {
        self.index.get_or_init(|| {
            StructuralIndex::build(
                &self.config.source_root(),
                self.plugin.as_ref(),
                &self.sources,
                &self.registered,
            )
        })
    }

    /// Lookup through the registration table, the structural index if it
    /// was already built, and the manifest.
    pub fn introspector(&self) -> Introspector<'_> {
        Introspector::new(self.plugin.as_ref(), &self.sources, &self.registered)
            .with_index(self.index.get().map(StructuralIndex::table))
            .with_manifest(self.manifest())
    }

    /// Like [`Introspector::reflect`], but builds the structural index when
    /// the class cannot be found any other way.
    pub fn reflect(&self, class: &ClassName) -> std::result::Result<ClassDescriptor, IntrospectionError> {
        match self.introspector().reflect(class) {
            Err(IntrospectionError::UnknownClass(_)) if self.index.get().is_none() => {
                self.structural_index();
                self.introspector().reflect(class)
            }
            other => other,
        }
    }

    /// Reflect a persistence model with its schema merged along the parent
    /// chain, as the property set and the generator expect it.
    pub fn reflect_model(&self, class: &ClassName) -> std::result::Result<ClassDescriptor, IntrospectionError> {
        let mut model = self.reflect(class)?;
        self.structural_index();
        model.model = self.introspector().model_schema(&model);
        Ok(model)
    }

    fn scan_context(&self) -> ScanContext<'_> {
        ScanContext {
            config: &self.config,
            catalog: &self.catalog,
            introspector: self.introspector(),
        }
    }

    /// Live discovery only: manifest scan, then structural scan.
    pub fn discover<D: DiscoveryDomain>(&self) -> Discovery<D::Output> {
        let started = Instant::now();
        let (manifest, manifest_report) = self.manifest_state();
        let mut report = manifest_report.clone();
        let mut strategy = Strategy::None;
        let mut output = D::Output::default();

        if let Some(manifest) = manifest {
            output = scanner::manifest::scan::<D>(&self.scan_context(), manifest, &mut report);
            if !output.is_empty_result() {
                strategy = Strategy::Manifest;
            }
        }

        if output.is_empty_result() {
            let index = self.structural_index();
            report.merge(index.report().clone());
            output = scanner::structural::scan::<D>(&self.scan_context(), index, &mut report);
            if !output.is_empty_result() {
                strategy = Strategy::Structural;
            }
        }

        output.normalize();
        let duration = started.elapsed();
        info!(
            "Discovered {} entries for {} via {} in {:?} ({} diagnostics)",
            output.entry_count(),
            D::ID,
            strategy,
            duration,
            report.diagnostics().len()
        );

        Discovery {
            output,
            strategy,
            report,
            duration,
        }
    }

    /// Cache, then live discovery in the local environment. Fails only when
    /// a cache artifact exists but cannot be read.
    pub fn try_resolve<D: DiscoveryDomain>(&self) -> Result<Discovery<D::Output>> {
        let started = Instant::now();
        if let Some(output) = self.cache.load::<D::Output>(D::ID)? {
            let duration = started.elapsed();
            info!("Resolved {} from cache in {:?}", D::ID, duration);
            return Ok(Discovery {
                output,
                strategy: Strategy::Cache,
                report: ScanReport::new(),
                duration,
            });
        }

        let mut report = ScanReport::new();
        report.record(
            DiscoveryFailure::MissingCache,
            D::ID.as_str(),
            self.cache.path(D::ID).display().to_string(),
        );

        if !self.config.environment.is_local() {
            debug!(
                "Live discovery for {} disabled in the {} environment",
                D::ID,
                self.config.environment
            );
            return Ok(Discovery {
                output: D::Output::default(),
                strategy: Strategy::None,
                report,
                duration: started.elapsed(),
            });
        }

        let mut discovery = self.discover::<D>();
        report.merge(discovery.report);
        discovery.report = report;
        discovery.duration = started.elapsed();
        Ok(discovery)
    }

    /// [`Self::try_resolve`], with an unreadable artifact logged and treated
    /// as an empty result.
    pub fn resolve<D: DiscoveryDomain>(&self) -> Discovery<D::Output> {
        self.try_resolve::<D>().unwrap_or_else(|e| {
            warn!("Cannot load {} cache artifact: {}", D::ID, e);
            Discovery {
                output: D::Output::default(),
                strategy: Strategy::None,
                report: ScanReport::new(),
                duration: Duration::ZERO,
            }
        })
    }

    pub fn discover_result(&self, domain: DomainId) -> Discovery<DiscoveryResult> {
        crate::with_domain!(domain, D => self.discover::<D>().map(|output| output.to_result()))
    }

    pub fn resolve_result(&self, domain: DomainId) -> Result<Discovery<DiscoveryResult>> {
        crate::with_domain!(domain, D => Ok(self.try_resolve::<D>()?.map(|output| output.to_result())))
    }

    /// Run live discovery for `domain` and write its artifact.
    pub fn build_cache(&self, domain: DomainId) -> Result<(PathBuf, Discovery<DiscoveryResult>)> {
        crate::with_domain!(domain, D => {
            let discovery = self.discover::<D>();
            let path = self.cache.store(D::ID, &discovery.output)?;
            Ok((path, discovery.map(|output| output.to_result())))
        })
    }

    /// Persistence models carrying the read-model marker, keyed by model.
    pub fn discover_read_models(&self) -> Discovery<BTreeMap<ClassName, ReadModelDescriptor>> {
        let started = Instant::now();
        let index = self.structural_index();
        let mut report = index.report().clone();
        let output = readmodel::discover(&self.scan_context(), index, &mut report);

        let duration = started.elapsed();
        info!("Discovered {} read models in {:?}", output.len(), duration);
        Discovery {
            output,
            strategy: Strategy::Structural,
            report,
            duration,
        }
    }
}
