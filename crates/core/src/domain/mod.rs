//! The six discovery domains.
//!
//! Each domain is a fixed configuration of the engine: which marker it looks
//! for, which manifest paths are candidates, an optional supertype every
//! target must have, and how one qualifying class folds into the output.

mod commands;
mod components;
mod entities;
mod listeners;
mod policies;
pub mod shape;
mod subscribers;

pub use commands::ConsoleCommands;
pub use components::Components;
pub use entities::DomainEntities;
pub use listeners::EventListeners;
pub use policies::Policies;
pub use shape::DiscoveryShape;
pub use subscribers::EventSubscribers;

use crate::catalog::MarkerCatalog;
use crate::config::DiscoveryConfig;
use crate::report::ScanReport;
use markscope_api::{ClassDescriptor, ClassName, DomainId, MarkerKind};

pub trait DiscoveryDomain {
    type Output: DiscoveryShape;

    const ID: DomainId;
    const MARKER: MarkerKind;
    /// Also read markers on public methods.
    const INSPECTS_METHODS: bool = false;

    /// Base type every target must extend or implement.
    fn supertype(_config: &DiscoveryConfig) -> Option<&ClassName> {
        None
    }

    fn collect(
        class: &ClassDescriptor,
        catalog: &MarkerCatalog,
        output: &mut Self::Output,
        report: &mut ScanReport,
    );
}

/// Whether `class` carries the domain's marker where the domain looks for it.
pub fn carries_marker<D: DiscoveryDomain>(class: &ClassDescriptor, catalog: &MarkerCatalog) -> bool {
    catalog.has_marker(D::MARKER, &class.markers)
        || (D::INSPECTS_METHODS
            && class
                .public_methods()
                .any(|method| catalog.has_marker(D::MARKER, &method.markers)))
}

/// Run `$body` with `$d` bound to the domain type for a runtime `DomainId`.
#[macro_export]
macro_rules! with_domain {
    ($domain:expr, $d:ident => $body:expr) => {
        match $domain {
            markscope_api::DomainId::ConsoleCommands => {
                type $d = $crate::domain::ConsoleCommands;
                $body
            }
            markscope_api::DomainId::EventListeners => {
                type $d = $crate::domain::EventListeners;
                $body
            }
            markscope_api::DomainId::EventSubscribers => {
                type $d = $crate::domain::EventSubscribers;
                $body
            }
            markscope_api::DomainId::Policies => {
                type $d = $crate::domain::Policies;
                $body
            }
            markscope_api::DomainId::DomainEntities => {
                type $d = $crate::domain::DomainEntities;
                $body
            }
            markscope_api::DomainId::Components => {
                type $d = $crate::domain::Components;
                $body
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use markscope_api::{ClassKind, MarkerInstance, MethodDescriptor, Visibility};

    fn method(name: &str, visibility: Visibility, marker: &ClassName) -> MethodDescriptor {
        MethodDescriptor {
            name: name.to_string(),
            visibility,
            is_static: false,
            markers: vec![MarkerInstance::new(marker.clone())],
        }
    }

    #[test]
    fn test_method_markers_only_count_for_listeners() {
        let catalog = MarkerCatalog::default();
        let listener = catalog.marker_name(MarkerKind::EventListener).clone();
        let class = ClassDescriptor::new("App\\Listener\\Audit", ClassKind::Class)
            .with_method(method("onPaid", Visibility::Public, &listener));

        assert!(carries_marker::<EventListeners>(&class, &catalog));
        assert!(!carries_marker::<Policies>(&class, &catalog));

        let hidden = ClassDescriptor::new("App\\Listener\\Hidden", ClassKind::Class)
            .with_method(method("onPaid", Visibility::Private, &listener));
        assert!(!carries_marker::<EventListeners>(&hidden, &catalog));
    }

    #[test]
    fn test_with_domain_dispatch() {
        let ids: Vec<DomainId> = DomainId::ALL
            .into_iter()
            .map(|domain| with_domain!(domain, D => D::ID))
            .collect();
        assert_eq!(ids, DomainId::ALL.to_vec());
    }
}
