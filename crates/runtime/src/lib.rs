use markscope_core::{DiscoveryConfig, DiscoveryEngine, DiscoveryRegistry};
use std::path::Path;
use std::sync::Arc;

/// Bootstraps a discovery engine with the default language plugin.
///
/// This is the central factory for the markscope runtime: it pairs the core
/// engine with the PHP plugin, which reads both source files and Composer's
/// class map.
pub fn build_default_engine(config: DiscoveryConfig) -> DiscoveryEngine {
    let plugin = Arc::new(markscope_php::PhpPlugin::new());
    tracing::debug!(
        "Building engine for {} ({} environment)",
        config.base_path.display(),
        config.environment
    );
    DiscoveryEngine::new(config, plugin)
}

/// A registry over the default engine, for hosts that boot every domain.
pub fn build_default_registry(config: DiscoveryConfig) -> DiscoveryRegistry {
    DiscoveryRegistry::new(build_default_engine(config))
}

/// Loads `markscope.toml` (or `file`) for the project at `base_path`.
pub fn load_config(base_path: &Path, file: Option<&Path>) -> markscope_core::Result<DiscoveryConfig> {
    DiscoveryConfig::load(base_path, file)
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> Option<impl Drop> {
    Some(markscope_core::logging::init_logging(component, to_stderr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use markscope_core::Environment;
    use std::fs;

    #[test]
    fn test_default_engine_reads_php_sources() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src/Subscriber");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            src.join("Audit.php"),
            "<?php namespace App\\Subscriber; #[\\Discovery\\Attribute\\Event\\AsEventSubscriber] class Audit {}",
        )
        .unwrap();

        let config = DiscoveryConfig::new(dir.path()).with_environment(Environment::Local);
        let registry = build_default_registry(config);
        let subscribers = registry.event_subscribers().unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].as_str(), "App\\Subscriber\\Audit");
    }

    #[test]
    fn test_load_config_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.base_path, dir.path());
        assert!(!config.environment.is_local());
    }
}
