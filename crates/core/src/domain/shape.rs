use markscope_api::{ClassList, ClassName, DiscoveryResult, ListenerMap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

/// Output shape of a discovery domain.
pub trait DiscoveryShape: Default + Serialize + DeserializeOwned {
    /// Sort and deduplicate so repeated runs produce identical artifacts.
    fn normalize(&mut self);

    fn entry_count(&self) -> usize;

    fn is_empty_result(&self) -> bool {
        self.entry_count() == 0
    }

    fn to_result(&self) -> DiscoveryResult;
}

impl DiscoveryShape for ClassList {
    fn normalize(&mut self) {
        self.sort();
        self.dedup();
    }

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn to_result(&self) -> DiscoveryResult {
        DiscoveryResult::List(self.iter().map(ToString::to_string).collect())
    }
}

// Keys are unique and ordered by construction.
impl<K> DiscoveryShape for BTreeMap<K, ClassName>
where
    K: Ord + fmt::Display + Serialize + DeserializeOwned,
{
    fn normalize(&mut self) {}

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn to_result(&self) -> DiscoveryResult {
        DiscoveryResult::Map(
            self.iter()
                .map(|(key, class)| (key.to_string(), class.to_string()))
                .collect(),
        )
    }
}

impl DiscoveryShape for ListenerMap {
    fn normalize(&mut self) {
        for listeners in self.values_mut() {
            listeners.sort();
            listeners.dedup();
        }
    }

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn to_result(&self) -> DiscoveryResult {
        DiscoveryResult::Grouped(
            self.iter()
                .map(|(event, listeners)| {
                    (
                        event.to_string(),
                        listeners.iter().map(ToString::to_string).collect(),
                    )
                })
                .collect(),
        )
    }
}
