use super::class::ClassName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A literal value written in a marker's argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarkerValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// `Foo::class`, already resolved against the file's imports.
    ClassRef(ClassName),
    Array(Vec<ArrayEntry>),
    /// Anything that is not a literal (constants, calls, ...), kept as raw text.
    Expr(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayEntry {
    pub key: Option<MarkerValue>,
    pub value: MarkerValue,
}

impl MarkerValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MarkerValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Class references may be written as `Foo::class` or as a plain string.
    pub fn as_class_ref(&self) -> Option<ClassName> {
        match self {
            MarkerValue::ClassRef(name) => Some(name.clone()),
            MarkerValue::Str(s) if !s.trim().is_empty() => Some(ClassName::new(s)),
            _ => None,
        }
    }

    fn scalar_string(&self) -> Option<String> {
        match self {
            MarkerValue::Str(s) => Some(s.clone()),
            MarkerValue::Int(i) => Some(i.to_string()),
            MarkerValue::ClassRef(name) => Some(name.to_string()),
            _ => None,
        }
    }

    /// Values of a list literal; keys are ignored.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            MarkerValue::Array(entries) => entries
                .iter()
                .map(|entry| entry.value.scalar_string())
                .collect(),
            _ => None,
        }
    }

    /// A keyed literal with string keys and string values.
    pub fn as_string_map(&self) -> Option<BTreeMap<String, String>> {
        match self {
            MarkerValue::Array(entries) => entries
                .iter()
                .map(|entry| {
                    let key = entry.key.as_ref()?.scalar_string()?;
                    let value = entry.value.scalar_string()?;
                    Some((key, value))
                })
                .collect(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MarkerValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerArgument {
    /// Set for named arguments (`alias: 'x'`).
    pub name: Option<String>,
    pub value: MarkerValue,
}

impl MarkerArgument {
    pub fn positional(value: MarkerValue) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: MarkerValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// One marker written on a class or method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerInstance {
    pub name: ClassName,
    pub arguments: Vec<MarkerArgument>,
}

impl MarkerInstance {
    pub fn new(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn arg(mut self, value: MarkerValue) -> Self {
        self.arguments.push(MarkerArgument::positional(value));
        self
    }

    pub fn named_arg(mut self, name: &str, value: MarkerValue) -> Self {
        self.arguments.push(MarkerArgument::named(name, value));
        self
    }

    /// Look an argument up by name, falling back to its position among the
    /// leading positional arguments.
    pub fn argument(&self, name: &str, position: usize) -> Option<&MarkerValue> {
        if let Some(arg) = self
            .arguments
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
        {
            return Some(&arg.value);
        }

        self.arguments
            .iter()
            .take_while(|a| a.name.is_none())
            .nth(position)
            .map(|a| &a.value)
    }
}

/// The declarative marker kinds the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    Policy,
    ConsoleCommand,
    EventListener,
    EventSubscriber,
    Component,
    DomainEntity,
    ReadModel,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 7] = [
        MarkerKind::Policy,
        MarkerKind::ConsoleCommand,
        MarkerKind::EventListener,
        MarkerKind::EventSubscriber,
        MarkerKind::Component,
        MarkerKind::DomainEntity,
        MarkerKind::ReadModel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::Policy => "policy",
            MarkerKind::ConsoleCommand => "console-command",
            MarkerKind::EventListener => "event-listener",
            MarkerKind::EventSubscriber => "event-subscriber",
            MarkerKind::Component => "component",
            MarkerKind::DomainEntity => "domain-entity",
            MarkerKind::ReadModel => "read-model",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarations a marker may be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerTarget {
    pub class: bool,
    pub method: bool,
}

impl MarkerTarget {
    pub const CLASS: MarkerTarget = MarkerTarget {
        class: true,
        method: false,
    };
    pub const CLASS_OR_METHOD: MarkerTarget = MarkerTarget {
        class: true,
        method: true,
    };
}

/// Shape a marker parameter must materialize into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamShape {
    String,
    OptionalString,
    ClassRef,
    OptionalClassRef,
    StringList,
    StringMap,
}

impl ParamShape {
    pub fn is_optional(&self) -> bool {
        !matches!(self, ParamShape::String | ParamShape::ClassRef)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub shape: ParamShape,
}

/// Static description of one marker kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerSchema {
    pub kind: MarkerKind,
    pub target: MarkerTarget,
    pub repeatable: bool,
    /// Constructor parameters in positional order.
    pub params: &'static [ParamSpec],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: Option<&str>, value: &str) -> ArrayEntry {
        ArrayEntry {
            key: key.map(|k| MarkerValue::Str(k.to_string())),
            value: MarkerValue::Str(value.to_string()),
        }
    }

    #[test]
    fn test_argument_lookup_prefers_named() {
        let marker = MarkerInstance::new("App\\AsThing")
            .arg(MarkerValue::Str("first".into()))
            .named_arg("alias", MarkerValue::Str("named".into()));

        assert_eq!(marker.argument("alias", 0).and_then(|v| v.as_str()), Some("named"));
        assert_eq!(marker.argument("other", 0).and_then(|v| v.as_str()), Some("first"));
        assert!(marker.argument("other", 1).is_none());
    }

    #[test]
    fn test_positional_lookup_stops_at_named() {
        let marker = MarkerInstance::new("App\\AsThing")
            .named_arg("a", MarkerValue::Null)
            .arg(MarkerValue::Str("late".into()));

        assert!(marker.argument("b", 0).is_none());
    }

    #[test]
    fn test_string_list_and_map() {
        let list = MarkerValue::Array(vec![entry(None, "a"), entry(None, "b")]);
        assert_eq!(list.as_string_list(), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(list.as_string_map(), None);

        let map = MarkerValue::Array(vec![entry(Some("amount"), "total")]);
        let map = map.as_string_map().unwrap();
        assert_eq!(map.get("amount").map(String::as_str), Some("total"));
    }

    #[test]
    fn test_class_ref_accepts_strings() {
        let value = MarkerValue::Str("\\App\\Events\\Paid".into());
        assert_eq!(value.as_class_ref(), Some(ClassName::new("App\\Events\\Paid")));
        assert_eq!(MarkerValue::Null.as_class_ref(), None);
    }
}
