//! Marker catalog: which marker class stands for which kind, what each kind
//! accepts, and materialization of raw marker instances into typed markers.

use crate::config::MarkerNames;
use crate::introspect::Introspector;
use crate::report::{DiscoveryFailure, ScanReport};
use markscope_api::{
    ClassName, MarkerInstance, MarkerKind, MarkerSchema, MarkerTarget, MarkerValue, ParamShape,
    ParamSpec,
};
use std::collections::BTreeMap;
use thiserror::Error;

const POLICY: MarkerSchema = MarkerSchema {
    kind: MarkerKind::Policy,
    target: MarkerTarget::CLASS,
    repeatable: false,
    params: &[ParamSpec {
        name: "model",
        shape: ParamShape::ClassRef,
    }],
};

const CONSOLE_COMMAND: MarkerSchema = MarkerSchema {
    kind: MarkerKind::ConsoleCommand,
    target: MarkerTarget::CLASS,
    repeatable: false,
    params: &[ParamSpec {
        name: "signature",
        shape: ParamShape::OptionalString,
    }],
};

const EVENT_LISTENER: MarkerSchema = MarkerSchema {
    kind: MarkerKind::EventListener,
    target: MarkerTarget::CLASS_OR_METHOD,
    repeatable: true,
    params: &[ParamSpec {
        name: "event",
        shape: ParamShape::ClassRef,
    }],
};

const EVENT_SUBSCRIBER: MarkerSchema = MarkerSchema {
    kind: MarkerKind::EventSubscriber,
    target: MarkerTarget::CLASS,
    repeatable: false,
    params: &[],
};

const COMPONENT: MarkerSchema = MarkerSchema {
    kind: MarkerKind::Component,
    target: MarkerTarget::CLASS,
    repeatable: false,
    params: &[ParamSpec {
        name: "alias",
        shape: ParamShape::String,
    }],
};

const DOMAIN_ENTITY: MarkerSchema = MarkerSchema {
    kind: MarkerKind::DomainEntity,
    target: MarkerTarget::CLASS,
    repeatable: false,
    params: &[ParamSpec {
        name: "entity",
        shape: ParamShape::ClassRef,
    }],
};

const READ_MODEL: MarkerSchema = MarkerSchema {
    kind: MarkerKind::ReadModel,
    target: MarkerTarget::CLASS,
    repeatable: false,
    params: &[
        ParamSpec {
            name: "readModel",
            shape: ParamShape::OptionalClassRef,
        },
        ParamSpec {
            name: "excludeFields",
            shape: ParamShape::StringList,
        },
        ParamSpec {
            name: "customMappings",
            shape: ParamShape::StringMap,
        },
        ParamSpec {
            name: "fieldMappings",
            shape: ParamShape::StringMap,
        },
    ],
};

pub fn schema(kind: MarkerKind) -> &'static MarkerSchema {
    match kind {
        MarkerKind::Policy => &POLICY,
        MarkerKind::ConsoleCommand => &CONSOLE_COMMAND,
        MarkerKind::EventListener => &EVENT_LISTENER,
        MarkerKind::EventSubscriber => &EVENT_SUBSCRIBER,
        MarkerKind::Component => &COMPONENT,
        MarkerKind::DomainEntity => &DOMAIN_ENTITY,
        MarkerKind::ReadModel => &READ_MODEL,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("parameter `{param}` must be {expected:?}")]
    InvalidParameter {
        param: &'static str,
        expected: ParamShape,
    },
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("too many arguments: expected at most {0}")]
    TooManyArguments(usize),
    #[error("marker is not allowed on a {0}")]
    InvalidTarget(&'static str),
    #[error("marker is not repeatable")]
    NotRepeatable,
}

/// A parameter after shape checking.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Absent,
    Str(String),
    Class(ClassName),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

/// Checked parameters of one marker instance, by schema name.
#[derive(Debug, Default)]
pub struct MarkerParams {
    values: BTreeMap<&'static str, ParamValue>,
}

impl MarkerParams {
    fn get(&self, name: &str) -> &ParamValue {
        self.values.get(name).unwrap_or(&ParamValue::Absent)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        match self.get(name) {
            ParamValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn class(&self, name: &str) -> Option<ClassName> {
        match self.get(name) {
            ParamValue::Class(c) => Some(c.clone()),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            ParamValue::List(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    pub fn map(&self, name: &str) -> BTreeMap<String, String> {
        match self.get(name) {
            ParamValue::Map(map) => map.clone(),
            _ => BTreeMap::new(),
        }
    }
}

/// Typed view of one marker kind.
pub trait Marker: Sized {
    const KIND: MarkerKind;

    /// Required parameters are guaranteed present by the catalog.
    fn from_params(params: &MarkerParams) -> Result<Self, MarkerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyMarker {
    pub model: ClassName,
}

impl Marker for PolicyMarker {
    const KIND: MarkerKind = MarkerKind::Policy;

    fn from_params(params: &MarkerParams) -> Result<Self, MarkerError> {
        let model = params
            .class("model")
            .ok_or(MarkerError::MissingParameter("model"))?;
        Ok(Self { model })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleCommandMarker {
    pub signature: Option<String>,
}

impl Marker for ConsoleCommandMarker {
    const KIND: MarkerKind = MarkerKind::ConsoleCommand;

    fn from_params(params: &MarkerParams) -> Result<Self, MarkerError> {
        Ok(Self {
            signature: params.string("signature"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventListenerMarker {
    pub event: ClassName,
}

impl Marker for EventListenerMarker {
    const KIND: MarkerKind = MarkerKind::EventListener;

    fn from_params(params: &MarkerParams) -> Result<Self, MarkerError> {
        let event = params
            .class("event")
            .ok_or(MarkerError::MissingParameter("event"))?;
        Ok(Self { event })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSubscriberMarker;

impl Marker for EventSubscriberMarker {
    const KIND: MarkerKind = MarkerKind::EventSubscriber;

    fn from_params(_params: &MarkerParams) -> Result<Self, MarkerError> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentMarker {
    pub alias: String,
}

impl Marker for ComponentMarker {
    const KIND: MarkerKind = MarkerKind::Component;

    fn from_params(params: &MarkerParams) -> Result<Self, MarkerError> {
        let alias = params
            .string("alias")
            .ok_or(MarkerError::MissingParameter("alias"))?;
        Ok(Self { alias })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntityMarker {
    pub entity: ClassName,
}

impl Marker for DomainEntityMarker {
    const KIND: MarkerKind = MarkerKind::DomainEntity;

    fn from_params(params: &MarkerParams) -> Result<Self, MarkerError> {
        let entity = params
            .class("entity")
            .ok_or(MarkerError::MissingParameter("entity"))?;
        Ok(Self { entity })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadModelMarker {
    pub read_model: Option<ClassName>,
    pub exclude_fields: Vec<String>,
    pub custom_mappings: BTreeMap<String, String>,
    pub field_mappings: BTreeMap<String, String>,
}

impl Marker for ReadModelMarker {
    const KIND: MarkerKind = MarkerKind::ReadModel;

    fn from_params(params: &MarkerParams) -> Result<Self, MarkerError> {
        Ok(Self {
            read_model: params.class("readModel"),
            exclude_fields: params.list("excludeFields"),
            custom_mappings: params.map("customMappings"),
            field_mappings: params.map("fieldMappings"),
        })
    }
}

/// Where a marker instance was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Class,
    Method,
}

impl Placement {
    fn allowed_by(&self, target: MarkerTarget) -> bool {
        match self {
            Placement::Class => target.class,
            Placement::Method => target.method,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Placement::Class => "class",
            Placement::Method => "method",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkerCatalog {
    names: BTreeMap<MarkerKind, ClassName>,
}

impl Default for MarkerCatalog {
    fn default() -> Self {
        Self::new(&MarkerNames::default())
    }
}

impl MarkerCatalog {
    pub fn new(names: &MarkerNames) -> Self {
        let names = MarkerKind::ALL
            .into_iter()
            .map(|kind| (kind, names.name(kind).clone()))
            .collect();
        Self { names }
    }

    pub fn marker_name(&self, kind: MarkerKind) -> &ClassName {
        // every kind is inserted by `new`
        &self.names[&kind]
    }

    pub fn schema(&self, kind: MarkerKind) -> &'static MarkerSchema {
        schema(kind)
    }

    pub fn kind_of(&self, name: &ClassName) -> Option<MarkerKind> {
        self.names
            .iter()
            .find(|(_, n)| n == &name)
            .map(|(kind, _)| *kind)
    }

    pub fn entries(&self) -> impl Iterator<Item = (MarkerKind, &ClassName, &'static MarkerSchema)> {
        self.names
            .iter()
            .map(|(kind, name)| (*kind, name, schema(*kind)))
    }

    /// Kind of marker `name` stands for: a catalog marker itself, or an
    /// attribute class that extends one.
    pub fn resolve_kind(&self, name: &ClassName, introspector: &Introspector<'_>) -> Option<MarkerKind> {
        if let Some(kind) = self.kind_of(name) {
            return Some(kind);
        }
        let attribute = introspector.reflect(name).ok()?;
        self.names
            .iter()
            .find(|(_, marker)| introspector.is_subclass_of(&attribute, marker))
            .map(|(kind, _)| *kind)
    }

    /// Exact name match only; see [`MarkerCatalog::resolve_kind`] for derived
    /// attribute classes.
    pub fn has_marker(&self, kind: MarkerKind, markers: &[MarkerInstance]) -> bool {
        let name = self.marker_name(kind);
        markers.iter().any(|m| &m.name == name)
    }

    /// Check one instance against its schema and resolve its parameters,
    /// named first, then positional.
    pub fn resolve_params(
        &self,
        kind: MarkerKind,
        instance: &MarkerInstance,
    ) -> Result<MarkerParams, MarkerError> {
        let schema = schema(kind);

        let unknown = instance
            .arguments
            .iter()
            .filter_map(|a| a.name.as_ref())
            .find(|name| !schema.params.iter().any(|p| p.name == name.as_str()));
        if let Some(name) = unknown {
            return Err(MarkerError::UnknownParameter(name.clone()));
        }
        let positional = instance
            .arguments
            .iter()
            .filter(|a| a.name.is_none())
            .count();
        if positional > schema.params.len() {
            return Err(MarkerError::TooManyArguments(schema.params.len()));
        }

        let mut params = MarkerParams::default();
        for (position, spec) in schema.params.iter().enumerate() {
            let value = instance.argument(spec.name, position);
            params.values.insert(spec.name, check_shape(spec, value)?);
        }
        Ok(params)
    }

    pub fn materialize<M: Marker>(
        &self,
        instance: &MarkerInstance,
        placement: Placement,
    ) -> Result<M, MarkerError> {
        let schema = schema(M::KIND);
        if !placement.allowed_by(schema.target) {
            return Err(MarkerError::InvalidTarget(placement.as_str()));
        }
        let params = self.resolve_params(M::KIND, instance)?;
        M::from_params(&params)
    }

    /// Every well-formed instance of `M` among `markers`. Malformed ones are
    /// recorded against `owner` and skipped.
    pub fn collect<M: Marker>(
        &self,
        owner: &str,
        markers: &[MarkerInstance],
        placement: Placement,
        report: &mut ScanReport,
    ) -> Vec<M> {
        let name = self.marker_name(M::KIND);
        let repeatable = schema(M::KIND).repeatable;
        let mut found = Vec::new();
        let mut seen = 0usize;

        for instance in markers.iter().filter(|m| &m.name == name) {
            seen += 1;
            let result = if seen > 1 && !repeatable {
                Err(MarkerError::NotRepeatable)
            } else {
                self.materialize::<M>(instance, placement)
            };

            match result {
                Ok(marker) => found.push(marker),
                Err(err) => report.record(
                    DiscoveryFailure::MalformedMarkerInstance,
                    owner,
                    format!("#[{}]: {}", name.short_name(), err),
                ),
            }
        }

        found
    }
}

fn check_shape(spec: &ParamSpec, value: Option<&MarkerValue>) -> Result<ParamValue, MarkerError> {
    let invalid = || MarkerError::InvalidParameter {
        param: spec.name,
        expected: spec.shape,
    };
    let value = match value {
        None | Some(MarkerValue::Null) if spec.shape.is_optional() => {
            return Ok(ParamValue::Absent);
        }
        None | Some(MarkerValue::Null) => return Err(MarkerError::MissingParameter(spec.name)),
        Some(value) => value,
    };

    match spec.shape {
        ParamShape::String | ParamShape::OptionalString => value
            .as_str()
            .map(|s| ParamValue::Str(s.to_string()))
            .ok_or_else(invalid),
        ParamShape::ClassRef | ParamShape::OptionalClassRef => value
            .as_class_ref()
            .map(ParamValue::Class)
            .ok_or_else(invalid),
        ParamShape::StringList => value
            .as_string_list()
            .map(ParamValue::List)
            .ok_or_else(invalid),
        ParamShape::StringMap => value
            .as_string_map()
            .map(ParamValue::Map)
            .ok_or_else(invalid),
    }
}
