//! Discovery configuration.
//!
//! Values come from an optional `markscope.toml` next to the scanned project,
//! overridden by `MARKSCOPE__*` environment variables (double underscore
//! separates nested keys, e.g. `MARKSCOPE__CACHE__POLICIES`). Every field has
//! a default, so an empty configuration is valid.

use crate::error::Result;
use config::{Config, Environment as EnvSource, File};
use markscope_api::{ApiError, ClassName, DomainId, MarkerKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub const CONFIG_FILE_NAME: &str = "markscope.toml";
pub const ENV_PREFIX: &str = "MARKSCOPE";

/// Runtime environment of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Testing,
    Staging,
    #[default]
    Production,
}

impl Environment {
    /// Live discovery is only allowed locally.
    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Testing => "testing",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "testing" => Ok(Environment::Testing),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            _ => Err(ApiError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Path fragments a manifest entry's file must contain to be a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainPaths {
    pub console_commands: String,
    pub event_listeners: String,
    pub event_subscribers: String,
    pub policies: String,
    pub domain_entities: String,
    pub components: String,
}

impl Default for DomainPaths {
    fn default() -> Self {
        Self {
            console_commands: "/Console/Command/".to_string(),
            event_listeners: "/Listener".to_string(),
            event_subscribers: "/Subscriber".to_string(),
            policies: "/Policy".to_string(),
            domain_entities: "/Persistence/Model/".to_string(),
            components: "/Presentation/Component/".to_string(),
        }
    }
}

impl DomainPaths {
    pub fn fragment(&self, domain: DomainId) -> &str {
        match domain {
            DomainId::ConsoleCommands => &self.console_commands,
            DomainId::EventListeners => &self.event_listeners,
            DomainId::EventSubscribers => &self.event_subscribers,
            DomainId::Policies => &self.policies,
            DomainId::DomainEntities => &self.domain_entities,
            DomainId::Components => &self.components,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supertypes {
    /// Base class every console command must extend.
    pub console_command: ClassName,
    /// Base class of persistence models, for read-model discovery.
    pub persistence_model: ClassName,
}

impl Default for Supertypes {
    fn default() -> Self {
        Self {
            console_command: ClassName::new("Illuminate\\Console\\Command"),
            persistence_model: ClassName::new("Illuminate\\Database\\Eloquent\\Model"),
        }
    }
}

/// Fully qualified marker class names, one per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerNames {
    pub policy: ClassName,
    pub console_command: ClassName,
    pub event_listener: ClassName,
    pub event_subscriber: ClassName,
    pub component: ClassName,
    pub domain_entity: ClassName,
    pub read_model: ClassName,
}

impl Default for MarkerNames {
    fn default() -> Self {
        Self {
            policy: ClassName::new("Discovery\\Attribute\\Auth\\AsPolicy"),
            console_command: ClassName::new("Discovery\\Attribute\\Console\\AsConsoleCommand"),
            event_listener: ClassName::new("Discovery\\Attribute\\Event\\AsEventListener"),
            event_subscriber: ClassName::new("Discovery\\Attribute\\Event\\AsEventSubscriber"),
            component: ClassName::new("Discovery\\Attribute\\Component\\AsComponent"),
            domain_entity: ClassName::new("Discovery\\Attribute\\Persistence\\UseDomainEntity"),
            read_model: ClassName::new("Discovery\\Attribute\\Persistence\\UseReadModel"),
        }
    }
}

impl MarkerNames {
    pub fn name(&self, kind: MarkerKind) -> &ClassName {
        match kind {
            MarkerKind::Policy => &self.policy,
            MarkerKind::ConsoleCommand => &self.console_command,
            MarkerKind::EventListener => &self.event_listener,
            MarkerKind::EventSubscriber => &self.event_subscriber,
            MarkerKind::Component => &self.component,
            MarkerKind::DomainEntity => &self.domain_entity,
            MarkerKind::ReadModel => &self.read_model,
        }
    }
}

/// Artifact location per domain. The extension selects the format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePaths {
    pub console_commands: PathBuf,
    pub event_listeners: PathBuf,
    pub event_subscribers: PathBuf,
    pub policies: PathBuf,
    pub domain_entities: PathBuf,
    pub components: PathBuf,
}

impl Default for CachePaths {
    fn default() -> Self {
        let dir = Path::new("bootstrap").join("cache");
        Self {
            console_commands: dir.join("console-commands.json"),
            event_listeners: dir.join("event-listeners.json"),
            event_subscribers: dir.join("event-subscribers.json"),
            policies: dir.join("policies.json"),
            domain_entities: dir.join("domain-entities.json"),
            components: dir.join("components.json"),
        }
    }
}

impl CachePaths {
    pub fn path_for(&self, domain: DomainId) -> &Path {
        match domain {
            DomainId::ConsoleCommands => &self.console_commands,
            DomainId::EventListeners => &self.event_listeners,
            DomainId::EventSubscribers => &self.event_subscribers,
            DomainId::Policies => &self.policies,
            DomainId::DomainEntities => &self.domain_entities,
            DomainId::Components => &self.components,
        }
    }

    pub fn set(&mut self, domain: DomainId, path: PathBuf) {
        let slot = match domain {
            DomainId::ConsoleCommands => &mut self.console_commands,
            DomainId::EventListeners => &mut self.event_listeners,
            DomainId::EventSubscribers => &mut self.event_subscribers,
            DomainId::Policies => &mut self.policies,
            DomainId::DomainEntities => &mut self.domain_entities,
            DomainId::Components => &mut self.components,
        };
        *slot = path;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Project root; every relative path below is resolved against it.
    pub base_path: PathBuf,
    /// Tree walked by the structural scan.
    pub source_dir: PathBuf,
    /// Class-map manifest. `None` uses the language plugin's conventional location.
    pub manifest_path: Option<PathBuf>,
    pub environment: Environment,
    /// Only manifest entries under this namespace are candidates.
    pub namespace_prefix: String,
    /// Namespace segment under which bounded contexts live.
    pub bounded_context_root: String,
    /// Treat recorded introspection and marker failures as fatal in the CLI.
    pub strict: bool,
    pub domains: DomainPaths,
    pub supertypes: Supertypes,
    pub markers: MarkerNames,
    pub cache: CachePaths,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            manifest_path: None,
            environment: Environment::default(),
            namespace_prefix: "App\\".to_string(),
            bounded_context_root: "BoundedContexts".to_string(),
            strict: false,
            domains: DomainPaths::default(),
            supertypes: Supertypes::default(),
            markers: MarkerNames::default(),
            cache: CachePaths::default(),
        }
    }
}

impl DiscoveryConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Layer `file` (or `<base>/markscope.toml` when present) with environment
    /// overrides. `base_path` always wins over a value in the file.
    pub fn load(base_path: &Path, file: Option<&Path>) -> Result<Self> {
        let default_file = base_path.join(CONFIG_FILE_NAME);
        let (file, required) = match file {
            Some(path) => (path.to_path_buf(), true),
            None => (default_file, false),
        };

        info!("Loading config from {}", file.display());

        let mut config: DiscoveryConfig = Config::builder()
            .add_source(File::from(file.as_path()).required(required))
            .add_source(EnvSource::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.base_path = base_path.to_path_buf();
        Ok(config)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = prefix.into();
        self
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn with_cache_path(mut self, domain: DomainId, path: impl Into<PathBuf>) -> Self {
        self.cache.set(domain, path.into());
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    pub fn source_root(&self) -> PathBuf {
        self.resolve_path(&self.source_dir)
    }

    /// Configured manifest, or `default` (relative to the base path).
    pub fn manifest_file(&self, default: &Path) -> PathBuf {
        self.resolve_path(self.manifest_path.as_deref().unwrap_or(default))
    }

    pub fn cache_file(&self, domain: DomainId) -> PathBuf {
        self.resolve_path(self.cache.path_for(domain))
    }
}
