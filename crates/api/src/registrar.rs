//! Consumers of resolved discovery results.
//!
//! These are implemented by the host framework (service container, auth gate,
//! event dispatcher, component runtime). The engine only hands them finished
//! mappings.

use crate::models::{ClassName, ListenerSpec};

pub trait CommandRegistrar {
    fn register_commands(&mut self, commands: &[ClassName]);
}

pub trait ListenerRegistrar {
    /// `listener` is either a bare class or a `Class@method` pair.
    fn listen(&mut self, event: &ClassName, listener: &ListenerSpec);
}

pub trait SubscriberRegistrar {
    fn subscribe(&mut self, subscriber: &ClassName);
}

pub trait PolicyRegistrar {
    fn policy(&mut self, model: &ClassName, policy: &ClassName);
}

pub trait ComponentRegistrar {
    fn component(&mut self, alias: &str, class: &ClassName);
}
