//! Persisted discovery artifacts, one file per domain.
//!
//! Artifacts are produced by `markscope cache build` (or any other
//! out-of-process step) and read back verbatim at startup. Nothing here checks
//! staleness; a present artifact is the answer.

use crate::config::DiscoveryConfig;
use crate::error::{MarkscopeError, Result};
use markscope_api::{CacheStats, CachedArtifactSummary, DiscoveryResult, DomainId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFormat {
    Json,
    MessagePack,
}

impl CacheFormat {
    pub fn for_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(CacheFormat::Json),
            Some("msgpack") => Ok(CacheFormat::MessagePack),
            _ => Err(MarkscopeError::UnsupportedCacheFormat(path.to_path_buf())),
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            CacheFormat::Json => Ok(serde_json::from_slice(bytes)?),
            CacheFormat::MessagePack => Ok(rmp_serde::from_slice(bytes)?),
        }
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            CacheFormat::Json => {
                let mut text = serde_json::to_string_pretty(value)?;
                text.push('\n');
                Ok(text.into_bytes())
            }
            CacheFormat::MessagePack => Ok(rmp_serde::to_vec(value)?),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryCache {
    paths: BTreeMap<DomainId, PathBuf>,
}

impl DiscoveryCache {
    pub fn new(config: &DiscoveryConfig) -> Self {
        let paths = DomainId::ALL
            .into_iter()
            .map(|domain| (domain, config.cache_file(domain)))
            .collect();
        Self { paths }
    }

    pub fn path(&self, domain: DomainId) -> &Path {
        // every domain is inserted by `new`
        &self.paths[&domain]
    }

    /// `Ok(None)` when no artifact exists. A present artifact is decoded into
    /// `T` as is; a file that does not decode is an error for the caller.
    pub fn load<T: DeserializeOwned>(&self, domain: DomainId) -> Result<Option<T>> {
        let path = self.path(domain);
        if !path.exists() {
            debug!("No cache artifact for {} at {}", domain, path.display());
            return Ok(None);
        }

        let format = CacheFormat::for_path(path)?;
        let bytes = fs::read(path)?;
        let value = format.decode(&bytes)?;
        debug!("Loaded {} from {}", domain, path.display());
        Ok(Some(value))
    }

    /// Write an artifact atomically (temp file, then rename).
    pub fn store<T: Serialize>(&self, domain: DomainId, value: &T) -> Result<PathBuf> {
        let path = self.path(domain);
        let bytes = CacheFormat::for_path(path)?.encode(value)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, path)?;

        info!("Wrote {} artifact to {}", domain, path.display());
        Ok(path.to_path_buf())
    }

    /// Returns whether an artifact was removed.
    pub fn clear(&self, domain: DomainId) -> Result<bool> {
        let path = self.path(domain);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        info!("Removed {} artifact {}", domain, path.display());
        Ok(true)
    }

    pub fn inspect(&self, domain: DomainId) -> Result<Option<CachedArtifactSummary>> {
        let path = self.path(domain);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(path)?;
        let entry_count = match CacheFormat::for_path(path)?.decode::<DiscoveryResult>(&bytes) {
            Ok(result) => result.len(),
            Err(e) => {
                warn!("Cannot decode {}: {}", path.display(), e);
                0
            }
        };

        Ok(Some(CachedArtifactSummary {
            domain,
            path: path.to_path_buf(),
            hash: format!("{:016x}", xxh3_64(&bytes)),
            size_bytes: bytes.len() as u64,
            entry_count,
        }))
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let summaries = DomainId::ALL
            .into_iter()
            .map(|domain| self.inspect(domain))
            .collect::<Result<Vec<_>>>()?;
        Ok(CacheStats::from_summaries(&summaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markscope_api::{ClassMap, ClassName};
    use tempfile::tempdir;

    fn policies() -> ClassMap {
        let mut map = ClassMap::new();
        map.insert(ClassName::new("App\\Model\\User"), ClassName::new("App\\Policy\\UserPolicy"));
        map
    }

    #[test]
    fn test_store_then_load_json() {
        let dir = tempdir().unwrap();
        let cache = DiscoveryCache::new(&DiscoveryConfig::new(dir.path()));

        assert!(cache.load::<ClassMap>(DomainId::Policies).unwrap().is_none());
        let path = cache.store(DomainId::Policies, &policies()).unwrap();
        assert_eq!(path, dir.path().join("bootstrap/cache/policies.json"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert_eq!(cache.load::<ClassMap>(DomainId::Policies).unwrap(), Some(policies()));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_msgpack_artifact() {
        let dir = tempdir().unwrap();
        let config = DiscoveryConfig::new(dir.path())
            .with_cache_path(DomainId::Policies, "cache/policies.msgpack");
        let cache = DiscoveryCache::new(&config);

        cache.store(DomainId::Policies, &policies()).unwrap();
        assert_eq!(cache.load::<ClassMap>(DomainId::Policies).unwrap(), Some(policies()));

        let summary = cache.inspect(DomainId::Policies).unwrap().unwrap();
        assert_eq!(summary.entry_count, 1);
        assert_eq!(summary.hash.len(), 16);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let config = DiscoveryConfig::new(dir.path())
            .with_cache_path(DomainId::Components, "components.yaml");
        let cache = DiscoveryCache::new(&config);
        fs::write(cache.path(DomainId::Components), "x: y").unwrap();

        assert!(matches!(
            cache.load::<ClassMap>(DomainId::Components),
            Err(MarkscopeError::UnsupportedCacheFormat(_))
        ));
        assert!(cache.store(DomainId::Components, &policies()).is_err());
    }

    #[test]
    fn test_malformed_artifact_is_an_error() {
        let dir = tempdir().unwrap();
        let cache = DiscoveryCache::new(&DiscoveryConfig::new(dir.path()));
        let path = cache.path(DomainId::ConsoleCommands).to_path_buf();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        assert!(cache.load::<Vec<ClassName>>(DomainId::ConsoleCommands).is_err());
        assert_eq!(cache.inspect(DomainId::ConsoleCommands).unwrap().unwrap().entry_count, 0);
    }

    #[test]
    fn test_clear_and_stats() {
        let dir = tempdir().unwrap();
        let cache = DiscoveryCache::new(&DiscoveryConfig::new(dir.path()));
        cache.store(DomainId::Policies, &policies()).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!((stats.present, stats.missing, stats.total_entries), (1, 5, 1));

        assert!(cache.clear(DomainId::Policies).unwrap());
        assert!(!cache.clear(DomainId::Policies).unwrap());
        assert_eq!(cache.stats().unwrap().present, 0);
    }
}
