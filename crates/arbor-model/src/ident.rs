// SPDX-License-Identifier: Apache-2.0
//! Identifier aliases, id generation, and the millisecond clock.
use uuid::Uuid;

/// Opaque identifier for a stored entity (graph, node, or edge).
///
/// Callers may supply their own ids (any non-empty string); ids minted by the
/// engine are UUIDv7 strings, so freshly generated ids sort by creation time.
/// Ids are unique per entity kind within a store and are never reused.
pub type EntityId = String;

/// Opaque identifier for a live subscription.
pub type SubscriptionId = String;

/// Opaque identifier for a published event.
pub type EventId = String;

/// Mints a fresh time-ordered identifier (UUIDv7).
pub fn generate_id() -> EntityId {
    Uuid::now_v7().to_string()
}

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// All metadata and event timestamps use this clock. Callers that need a
/// strictly increasing stamp must combine it with the previous value (see
/// [`crate::Metadata::touch`]).
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
