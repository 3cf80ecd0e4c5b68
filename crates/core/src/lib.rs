pub mod cache;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod introspect;
pub mod logging;
pub mod manifest;
pub mod readmodel;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod table;

pub use cache::{CacheFormat, DiscoveryCache};
pub use catalog::{MarkerCatalog, MarkerError};
pub use config::{DiscoveryConfig, Environment};
pub use domain::{DiscoveryDomain, DiscoveryShape};
pub use engine::{Discovery, DiscoveryEngine};
pub use error::{MarkscopeError, Result};
pub use introspect::{IntrospectionError, Introspector};
pub use manifest::Manifest;
pub use readmodel::{FinderGenerator, ModelPropertySet, ReadModelConfig, ReadModelDescriptor};
pub use registry::{BootSummary, DiscoveryRegistry, ModelEntityRegistry};
pub use report::{DiscoveryFailure, ScanReport};
pub use scanner::Strategy;
pub use table::ClassTable;
