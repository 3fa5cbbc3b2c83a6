// SPDX-License-Identifier: Apache-2.0
//! Change-notification events and subscription topics.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::Filter;
use crate::ident::{generate_id, now_ms, EntityId, EventId};
use crate::metadata::EntityKind;
use crate::record::DataMap;

/// The kind of change an event describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A record was inserted.
    Create,
    /// A record was updated.
    Update,
    /// A record was soft-deleted.
    Delete,
    /// A caller-published event outside the mutation path.
    Custom,
}

impl EventKind {
    /// Canonical lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change notification produced by a mutation or an explicit publish.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id.
    pub id: EventId,
    /// What happened.
    pub kind: EventKind,
    /// Canonical rendered topic. Mutation events use `"<kind>/<id>"`;
    /// custom events carry whatever the publisher chose.
    pub topic: String,
    /// Entity kind the event concerns ([`EntityKind::Any`] for free-form
    /// custom events).
    pub entity_kind: EntityKind,
    /// The affected entity, when the event concerns one.
    pub entity_id: Option<EntityId>,
    /// Subtype tag of the affected record, when known.
    pub entity_type: Option<String>,
    /// Optional payload (mutation events carry the record's data map).
    pub data: Option<Value>,
    /// Free-form attributes; subscription filters compare against these.
    pub metadata: DataMap,
    /// Production time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Event {
    /// Builds a mutation event for an entity. The topic is the canonical
    /// `"<kind>/<id>"` rendering.
    pub fn mutation(
        kind: EventKind,
        entity_kind: EntityKind,
        entity_id: impl Into<EntityId>,
        entity_type: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let entity_id = entity_id.into();
        Self {
            id: generate_id(),
            kind,
            topic: format!("{}/{entity_id}", entity_kind.as_str()),
            entity_kind,
            entity_id: Some(entity_id),
            entity_type: Some(entity_type.into()),
            data,
            metadata: DataMap::new(),
            timestamp: now_ms(),
        }
    }

    /// Builds a custom event on a free-form topic.
    pub fn custom(topic: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            id: generate_id(),
            kind: EventKind::Custom,
            topic: topic.into(),
            entity_kind: EntityKind::Any,
            entity_id: None,
            entity_type: None,
            data,
            metadata: DataMap::new(),
            timestamp: now_ms(),
        }
    }

    /// Adds a metadata attribute (chainable).
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A subscription topic pattern.
///
/// Matching rules, from widest to narrowest:
/// - [`Topic::Any`] matches every event;
/// - [`Topic::Kind`] matches events of that entity kind;
/// - [`Topic::Entity`] matches events for one entity id;
/// - [`Topic::Typed`] additionally requires the record's subtype tag;
/// - [`Topic::Exact`] compares the rendered topic string verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topic {
    /// Match every event.
    Any,
    /// Match events of one entity kind.
    Kind(EntityKind),
    /// Match events for one entity.
    Entity {
        /// Entity kind of the pattern.
        kind: EntityKind,
        /// Entity id to match.
        id: EntityId,
    },
    /// Match events for one entity of a specific subtype.
    Typed {
        /// Entity kind of the pattern.
        kind: EntityKind,
        /// Required subtype tag.
        type_tag: String,
        /// Entity id to match.
        id: EntityId,
    },
    /// Match the rendered topic string exactly.
    Exact(String),
}

impl Topic {
    /// Canonical rendering of the pattern, mirroring event topics.
    pub fn render(&self) -> String {
        match self {
            Self::Any => "any".to_owned(),
            Self::Kind(kind) => kind.as_str().to_owned(),
            Self::Entity { kind, id } => format!("{}/{id}", kind.as_str()),
            Self::Typed { kind, type_tag, id } => {
                format!("{}/{type_tag}/{id}", kind.as_str())
            }
            Self::Exact(s) => s.clone(),
        }
    }

    /// Whether an event falls under this pattern.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Any => true,
            Self::Kind(kind) => event.entity_kind == *kind,
            Self::Entity { kind, id } => {
                event.entity_kind == *kind && event.entity_id.as_deref() == Some(id)
            }
            Self::Typed { kind, type_tag, id } => {
                event.entity_kind == *kind
                    && event.entity_id.as_deref() == Some(id)
                    && event.entity_type.as_deref() == Some(type_tag)
            }
            Self::Exact(s) => event.topic == *s,
        }
    }
}

/// Options accepted by `subscribe`.
#[derive(Clone, Debug, Default)]
pub struct SubscribeOptions {
    /// Event kinds to deliver. `None` means all kinds.
    pub events: Option<Vec<EventKind>>,
    /// Additional predicates over event fields. The reserved keys
    /// `entity_type` and `entity_id` compare their namesakes; any other key
    /// compares against `event.metadata[key]`.
    pub filter: Filter,
}

impl SubscribeOptions {
    /// Restricts delivery to the given event kinds (chainable).
    pub fn events(mut self, kinds: impl Into<Vec<EventKind>>) -> Self {
        self.events = Some(kinds.into());
        self
    }

    /// Attaches a field filter (chainable).
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Whether the kind allow-list admits this event.
    pub fn allows(&self, kind: EventKind) -> bool {
        self.events.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }

    /// Whether the field filter holds on this event.
    pub fn filter_matches(&self, event: &Event) -> bool {
        self.filter.matches_lookup(&|key| match key {
            "entity_type" => Some(
                event
                    .entity_type
                    .as_ref()
                    .map_or(Value::Null, |t| Value::String(t.clone())),
            ),
            "entity_id" => Some(
                event
                    .entity_id
                    .as_ref()
                    .map_or(Value::Null, |i| Value::String(i.clone())),
            ),
            other => event.metadata.get(other).cloned(),
        })
    }
}
