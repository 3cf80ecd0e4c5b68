use crate::models::DomainId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of a persisted discovery artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedArtifactSummary {
    pub domain: DomainId,
    pub path: PathBuf,
    /// xxh3 of the file contents, hex encoded
    pub hash: String,
    pub size_bytes: u64,
    /// Number of top-level entries (list items or map keys)
    pub entry_count: usize,
}

/// Statistics over all configured artifacts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub present: usize,
    pub missing: usize,
    pub total_entries: usize,
}

impl CacheStats {
    pub fn from_summaries<'a>(
        summaries: impl IntoIterator<Item = &'a Option<CachedArtifactSummary>>,
    ) -> Self {
        let mut stats = Self::default();
        for summary in summaries {
            match summary {
                Some(s) => {
                    stats.present += 1;
                    stats.total_entries += s.entry_count;
                }
                None => stats.missing += 1,
            }
        }
        stats
    }
}
