//! Per-process memoization of resolved domains and hand-off to registrars.

use crate::domain::{
    Components, ConsoleCommands, DiscoveryDomain, DomainEntities, EventListeners, EventSubscribers,
    Policies,
};
use crate::engine::DiscoveryEngine;
use crate::error::Result;
use markscope_api::{
    AliasMap, ClassList, ClassMap, ClassName, CommandRegistrar, ComponentRegistrar, DomainId,
    ListenerMap, ListenerRegistrar, PolicyRegistrar, SubscriberRegistrar,
};
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use tracing::{error, info};

/// Model -> domain entity lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelEntityRegistry {
    map: ClassMap,
}

impl ModelEntityRegistry {
    pub fn new(map: ClassMap) -> Self {
        Self { map }
    }

    pub fn all(&self) -> &ClassMap {
        &self.map
    }

    pub fn for_model(&self, model: &str) -> Option<&ClassName> {
        self.map.get(model)
    }

    pub fn set_map(&mut self, map: ClassMap) {
        self.map = map;
    }
}

/// What `boot` handed out, per domain.
#[derive(Debug, Default)]
pub struct BootSummary {
    pub registered: BTreeMap<DomainId, usize>,
    pub failed: Vec<(DomainId, String)>,
}

/// Resolves each domain at most once and keeps the result for the lifetime
/// of the registry.
pub struct DiscoveryRegistry {
    engine: DiscoveryEngine,
    commands: OnceCell<ClassList>,
    listeners: OnceCell<ListenerMap>,
    subscribers: OnceCell<ClassList>,
    policies: OnceCell<ClassMap>,
    entities: OnceCell<ClassMap>,
    components: OnceCell<AliasMap>,
}

impl DiscoveryRegistry {
    pub fn new(engine: DiscoveryEngine) -> Self {
        Self {
            engine,
            commands: OnceCell::new(),
            listeners: OnceCell::new(),
            subscribers: OnceCell::new(),
            policies: OnceCell::new(),
            entities: OnceCell::new(),
            components: OnceCell::new(),
        }
    }

    pub fn engine(&self) -> &DiscoveryEngine {
        &self.engine
    }

    fn memoized<'a, D: DiscoveryDomain>(&'a self, cell: &'a OnceCell<D::Output>) -> Result<&'a D::Output> {
        cell.get_or_try_init(|| self.engine.try_resolve::<D>().map(|discovery| discovery.output))
    }

    pub fn console_commands(&self) -> Result<&ClassList> {
        self.memoized::<ConsoleCommands>(&self.commands)
    }

    pub fn event_listeners(&self) -> Result<&ListenerMap> {
        self.memoized::<EventListeners>(&self.listeners)
    }

    pub fn event_subscribers(&self) -> Result<&ClassList> {
        self.memoized::<EventSubscribers>(&self.subscribers)
    }

    pub fn policies(&self) -> Result<&ClassMap> {
        self.memoized::<Policies>(&self.policies)
    }

    pub fn domain_entities(&self) -> Result<&ClassMap> {
        self.memoized::<DomainEntities>(&self.entities)
    }

    pub fn components(&self) -> Result<&AliasMap> {
        self.memoized::<Components>(&self.components)
    }

    /// Commands are only handed over when there are any.
    pub fn boot_commands(&self, registrar: &mut impl CommandRegistrar) -> Result<usize> {
        let commands = self.console_commands()?;
        if !commands.is_empty() {
            registrar.register_commands(commands);
        }
        Ok(commands.len())
    }

    pub fn boot_listeners(&self, registrar: &mut impl ListenerRegistrar) -> Result<usize> {
        let mut count = 0;
        for (event, listeners) in self.event_listeners()? {
            for listener in listeners {
                registrar.listen(event, listener);
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn boot_subscribers(&self, registrar: &mut impl SubscriberRegistrar) -> Result<usize> {
        let subscribers = self.event_subscribers()?;
        for subscriber in subscribers {
            registrar.subscribe(subscriber);
        }
        Ok(subscribers.len())
    }

    pub fn boot_policies(&self, registrar: &mut impl PolicyRegistrar) -> Result<usize> {
        let policies = self.policies()?;
        for (model, policy) in policies {
            registrar.policy(model, policy);
        }
        Ok(policies.len())
    }

    pub fn boot_components(&self, registrar: &mut impl ComponentRegistrar) -> Result<usize> {
        let components = self.components()?;
        for (alias, class) in components {
            registrar.component(alias, class);
        }
        Ok(components.len())
    }

    pub fn entity_registry(&self) -> Result<ModelEntityRegistry> {
        Ok(ModelEntityRegistry::new(self.domain_entities()?.clone()))
    }

    /// Hand every domain to `host`. A domain whose artifact cannot be read
    /// is logged and left out; the others still boot.
    pub fn boot<H>(&self, host: &mut H) -> BootSummary
    where
        H: CommandRegistrar + ListenerRegistrar + SubscriberRegistrar + PolicyRegistrar + ComponentRegistrar,
    {
        let mut summary = BootSummary::default();
        let results = [
            (DomainId::ConsoleCommands, self.boot_commands(&mut *host)),
            (DomainId::EventListeners, self.boot_listeners(&mut *host)),
            (DomainId::EventSubscribers, self.boot_subscribers(&mut *host)),
            (DomainId::Policies, self.boot_policies(&mut *host)),
            (DomainId::DomainEntities, self.domain_entities().map(|m| m.len())),
            (DomainId::Components, self.boot_components(&mut *host)),
        ];

        for (domain, result) in results {
            match result {
                Ok(count) => {
                    summary.registered.insert(domain, count);
                }
                Err(e) => {
                    error!("Failed to boot {}: {}", domain, e);
                    summary.failed.push((domain, e.to_string()));
                }
            }
        }

        info!(
            "Booted {} domains ({} failed)",
            summary.registered.len(),
            summary.failed.len()
        );
        summary
    }
}
