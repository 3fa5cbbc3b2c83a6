// SPDX-License-Identifier: Apache-2.0
//! Entity kinds and per-record bookkeeping metadata.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ident::now_ms;

/// The closed set of entity kinds the engine knows about.
///
/// Records are always one of the first three; `Transaction` and `Any` exist
/// for event addressing on the subscription bus and never label a stored
/// record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A logical container grouping nodes and edges.
    Graph,
    /// A vertex.
    Node,
    /// A directed connection between two nodes.
    Edge,
    /// A batched mutation, addressable on the bus only.
    Transaction,
    /// Wildcard kind used by event topics.
    Any,
}

impl EntityKind {
    /// Canonical lowercase label, used in topics and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Node => "node",
            Self::Edge => "edge",
            Self::Transaction => "transaction",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping attached to every stored record.
///
/// Invariants
/// - `version` starts at 1 on insert and increases by exactly 1 per update.
/// - `updated_at` strictly increases across mutations of the same record,
///   even when two mutations land in the same millisecond.
/// - Soft deletes set `deleted`/`deleted_at` and stamp `updated_at` but do
///   **not** bump `version`.
/// - Only the storage adapter transitions metadata; callers hand the adapter
///   drafts (see [`Metadata::draft`]) and receive stamped records back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Which of the closed entity kinds this record is.
    pub entity: EntityKind,
    /// Originating subtype tag. Defaults to the kind's own label for records
    /// inserted without a user-declared type.
    pub type_tag: String,
    /// Insert time, milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Last mutation time (update or soft delete).
    pub updated_at: i64,
    /// Soft-delete time, present only for tombstones.
    pub deleted_at: Option<i64>,
    /// Monotonically increasing mutation counter.
    pub version: u64,
    /// Tombstone flag. Tombstoned records stay in the primary table but are
    /// invisible to listings, queries, and algorithms.
    pub deleted: bool,
}

impl Metadata {
    /// A draft for a record that has not been inserted yet.
    ///
    /// Timestamps and version are zeroed; the adapter overwrites the whole
    /// draft on insert via [`Metadata::stamp`].
    pub fn draft(entity: EntityKind) -> Self {
        Self {
            entity,
            type_tag: entity.as_str().to_owned(),
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
            version: 0,
            deleted: false,
        }
    }

    /// Stamps a draft at insert time: fresh timestamps, version 1, live.
    ///
    /// `entity` and `type_tag` are preserved from the draft.
    pub fn stamp(&mut self) {
        let now = now_ms();
        self.created_at = now;
        self.updated_at = now;
        self.deleted_at = None;
        self.version = 1;
        self.deleted = false;
    }

    /// Records an update: bumps `version` by one and advances `updated_at`
    /// to a strictly greater stamp (`max(now, prev + 1)`).
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = now_ms().max(self.updated_at + 1);
    }

    /// Marks the record as soft-deleted. Idempotent; never bumps `version`.
    pub fn tombstone(&mut self) {
        if self.deleted {
            return;
        }
        let now = now_ms().max(self.updated_at + 1);
        self.deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    /// True when the record is not tombstoned.
    pub fn is_live(&self) -> bool {
        !self.deleted
    }

    /// Field lookup for the filter language's reserved `metadata` key.
    pub fn field(&self, key: &str) -> Option<Value> {
        match key {
            "entity" => Some(Value::String(self.entity.as_str().to_owned())),
            "type_tag" => Some(Value::String(self.type_tag.clone())),
            "created_at" => Some(Value::from(self.created_at)),
            "updated_at" => Some(Value::from(self.updated_at)),
            "deleted_at" => Some(self.deleted_at.map_or(Value::Null, Value::from)),
            "version" => Some(Value::from(self.version)),
            "deleted" => Some(Value::Bool(self.deleted)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_initializes_version_and_timestamps() {
        let mut meta = Metadata::draft(EntityKind::Node);
        assert_eq!(meta.version, 0);
        meta.stamp();
        assert_eq!(meta.version, 1);
        assert!(meta.created_at > 0);
        assert_eq!(meta.created_at, meta.updated_at);
        assert!(meta.is_live());
    }

    #[test]
    fn touch_bumps_version_and_strictly_advances_updated_at() {
        let mut meta = Metadata::draft(EntityKind::Edge);
        meta.stamp();
        let (v0, t0) = (meta.version, meta.updated_at);
        meta.touch();
        assert_eq!(meta.version, v0 + 1);
        assert!(meta.updated_at > t0);
        // Same-millisecond touches still move the stamp forward.
        let t1 = meta.updated_at;
        meta.touch();
        assert!(meta.updated_at > t1);
    }

    #[test]
    fn tombstone_is_idempotent_and_leaves_version_alone() {
        let mut meta = Metadata::draft(EntityKind::Node);
        meta.stamp();
        meta.tombstone();
        let first = meta.clone();
        meta.tombstone();
        assert_eq!(meta, first);
        assert_eq!(meta.version, 1);
        assert!(meta.deleted);
        assert_eq!(meta.deleted_at, Some(meta.updated_at));
    }

    #[test]
    fn metadata_fields_are_queryable() {
        let mut meta = Metadata::draft(EntityKind::Graph);
        meta.stamp();
        assert_eq!(meta.field("deleted"), Some(Value::Bool(false)));
        assert_eq!(meta.field("version"), Some(Value::from(1u64)));
        assert_eq!(meta.field("nonsense"), None);
    }
}
