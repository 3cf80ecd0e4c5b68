pub mod cache;
pub mod error;
pub mod language;
pub mod models;
pub mod registrar;

// Re-export commonly used types
pub use cache::{CacheStats, CachedArtifactSummary};
pub use error::{ApiError, ApiResult};
pub use language::{BoxError, LanguagePlugin, ManifestEntry};
pub use models::*;
pub use registrar::{
    CommandRegistrar, ComponentRegistrar, ListenerRegistrar, PolicyRegistrar, SubscriberRegistrar,
};
