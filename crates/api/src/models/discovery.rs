use super::class::ClassName;
use crate::error::ApiError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Separator between class and method in the textual listener form.
pub const LISTENER_METHOD_SEPARATOR: char = '@';

/// The six discovery domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainId {
    ConsoleCommands,
    EventListeners,
    EventSubscribers,
    Policies,
    DomainEntities,
    Components,
}

impl DomainId {
    pub const ALL: [DomainId; 6] = [
        DomainId::ConsoleCommands,
        DomainId::EventListeners,
        DomainId::EventSubscribers,
        DomainId::Policies,
        DomainId::DomainEntities,
        DomainId::Components,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainId::ConsoleCommands => "console-commands",
            DomainId::EventListeners => "event-listeners",
            DomainId::EventSubscribers => "event-subscribers",
            DomainId::Policies => "policies",
            DomainId::DomainEntities => "domain-entities",
            DomainId::Components => "components",
        }
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        DomainId::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| ApiError::UnknownDomain(s.to_string()))
    }
}

/// How a listener is attached: the whole class, or one public method of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListenerSpec {
    ClassOnly(ClassName),
    ClassMethod { class: ClassName, method: String },
}

impl ListenerSpec {
    pub fn class(&self) -> &ClassName {
        match self {
            ListenerSpec::ClassOnly(class) => class,
            ListenerSpec::ClassMethod { class, .. } => class,
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            ListenerSpec::ClassOnly(_) => None,
            ListenerSpec::ClassMethod { method, .. } => Some(method),
        }
    }
}

impl fmt::Display for ListenerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerSpec::ClassOnly(class) => write!(f, "{}", class),
            ListenerSpec::ClassMethod { class, method } => {
                write!(f, "{}{}{}", class, LISTENER_METHOD_SEPARATOR, method)
            }
        }
    }
}

impl FromStr for ListenerSpec {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(LISTENER_METHOD_SEPARATOR) {
            None if !s.trim().is_empty() => Ok(ListenerSpec::ClassOnly(ClassName::new(s))),
            Some((class, method)) if !class.is_empty() && !method.is_empty() => {
                Ok(ListenerSpec::ClassMethod {
                    class: ClassName::new(class),
                    method: method.to_string(),
                })
            }
            _ => Err(ApiError::InvalidListenerSpec(s.to_string())),
        }
    }
}

// Ordered by the textual form so artifacts sort the same way a plain string list would.
impl Ord for ListenerSpec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl PartialOrd for ListenerSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for ListenerSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ListenerSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Console commands and event subscribers.
pub type ClassList = Vec<ClassName>;
/// Model -> policy, model -> domain entity.
pub type ClassMap = BTreeMap<ClassName, ClassName>;
/// Component alias -> component class.
pub type AliasMap = BTreeMap<String, ClassName>;
/// Event -> listeners.
pub type ListenerMap = BTreeMap<ClassName, Vec<ListenerSpec>>;

/// Shape-erased discovery output, used where the domain is only known at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscoveryResult {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
    Grouped(BTreeMap<String, Vec<String>>),
}

impl DiscoveryResult {
    pub fn len(&self) -> usize {
        match self {
            DiscoveryResult::List(items) => items.len(),
            DiscoveryResult::Map(map) => map.len(),
            DiscoveryResult::Grouped(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into `(key, value)` rows for display. List entries have no key.
    pub fn rows(&self) -> Vec<(Option<String>, String)> {
        match self {
            DiscoveryResult::List(items) => items.iter().map(|i| (None, i.clone())).collect(),
            DiscoveryResult::Map(map) => map
                .iter()
                .map(|(k, v)| (Some(k.clone()), v.clone()))
                .collect(),
            DiscoveryResult::Grouped(map) => map
                .iter()
                .flat_map(|(k, values)| values.iter().map(move |v| (Some(k.clone()), v.clone())))
                .collect(),
        }
    }
}
