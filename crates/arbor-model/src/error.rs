// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy and batch-operation outcome shapes.
use crate::ident::EntityId;
use crate::metadata::EntityKind;

/// Errors surfaced by the store.
///
/// All variants are plain data; callers match on kind. Internal signals that
/// must never escape (a cache miss, an index inconsistency) have no variant
/// here: cache reads return `Option`, and index corruption trips a
/// `debug_assert!` in the adapter rather than surfacing as a value.
///
/// `Display`/`Error` are implemented by hand rather than via `thiserror`'s
/// derive: `NoPathExists::source` is plain data (a node id), but thiserror
/// treats any field literally named `source` as the error's cause and
/// requires it to implement `std::error::Error`, which `EntityId` (`String`)
/// does not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The requested id is missing from the primary table.
    NotFound {
        /// Entity kind that was looked up.
        kind: EntityKind,
        /// The id that was requested.
        id: EntityId,
    },

    /// A strict `get` hit a tombstone.
    Deleted {
        /// Entity kind that was looked up.
        kind: EntityKind,
        /// The tombstoned id.
        id: EntityId,
    },

    /// A read requested a subtype the stored record does not carry.
    TypeTagMismatch {
        /// Tag the caller asked for.
        expected: String,
        /// Tag stamped on the stored record.
        found: String,
    },

    /// An insert collided with an id already present in the table.
    IdAlreadyExists {
        /// Entity kind of the insert.
        kind: EntityKind,
        /// The colliding id.
        id: EntityId,
    },

    /// A record failed validation against its registered schema.
    SchemaViolation {
        /// Subtype tag whose schema rejected the record.
        type_tag: String,
        /// What was missing or mistyped.
        detail: String,
    },

    /// An algorithm was invoked with an unrecognized parameter shape.
    InvalidParams(String),

    /// An unknown algorithm tag was dispatched.
    UnsupportedAlgorithm(String),

    /// Shortest path found no route between the endpoints.
    NoPathExists {
        /// Path source node id.
        source: EntityId,
        /// Path target node id.
        target: EntityId,
    },

    /// A contractual timeout elapsed (e.g. a bounded subscription receive).
    Timeout {
        /// The operation that was bounded.
        operation: &'static str,
        /// How long the caller waited.
        waited_ms: u64,
    },

    /// `start` was called with a name that is already registered.
    StoreAlreadyRunning(String),

    /// A registry lookup found no store under the given name.
    UnknownStore(String),

    /// `unsubscribe` was called with an id that is not registered.
    SubscriptionNotFound(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Deleted { kind, id } => write!(f, "{kind} is deleted: {id}"),
            Self::TypeTagMismatch { expected, found } => {
                write!(f, "type tag mismatch: expected {expected}, found {found}")
            }
            Self::IdAlreadyExists { kind, id } => write!(f, "{kind} id already exists: {id}"),
            Self::SchemaViolation { type_tag, detail } => {
                write!(f, "schema violation for type {type_tag}: {detail}")
            }
            Self::InvalidParams(inner) => write!(f, "invalid parameters: {inner}"),
            Self::UnsupportedAlgorithm(inner) => write!(f, "unsupported algorithm: {inner}"),
            Self::NoPathExists { source, target } => {
                write!(f, "no path exists from {source} to {target}")
            }
            Self::Timeout {
                operation,
                waited_ms,
            } => write!(f, "{operation} timed out after {waited_ms} ms"),
            Self::StoreAlreadyRunning(inner) => write!(f, "store already running: {inner}"),
            Self::UnknownStore(inner) => write!(f, "unknown store: {inner}"),
            Self::SubscriptionNotFound(inner) => write!(f, "unknown subscription: {inner}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// One rejected record from a batch operation.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchFailure<R> {
    /// The record as submitted by the caller.
    pub record: R,
    /// Why it was rejected.
    pub error: StoreError,
}

/// Outcome of a batch insert or update: partial failure is permitted.
///
/// Both vectors preserve submission order. An empty `failed` vector means
/// the batch applied fully.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchOutcome<R> {
    /// Records that committed, with stamped metadata.
    pub succeeded: Vec<R>,
    /// Records that were rejected, each with its reason.
    pub failed: Vec<BatchFailure<R>>,
}

impl<R> Default for BatchOutcome<R> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<R> BatchOutcome<R> {
    /// True when every submitted record committed.
    pub fn is_fully_applied(&self) -> bool {
        self.failed.is_empty()
    }
}
