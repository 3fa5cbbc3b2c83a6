// SPDX-License-Identifier: Apache-2.0
//! arbor-model: pure data types for the Arbor graph store.
//!
//! This crate holds everything the engine stores and routes but contains no
//! storage itself: identifiers, per-entity [`Metadata`], the three record
//! kinds ([`GraphRecord`], [`NodeRecord`], [`EdgeRecord`]), user-declared
//! [`TypeSchema`]s, structured [`Filter`]s, the event/topic vocabulary of the
//! subscription bus, and the [`StoreError`] taxonomy.
//!
//! # Payload convention
//!
//! Record payloads are string-keyed maps of [`serde_json::Value`]
//! ([`DataMap`]). Anything that interprets a payload field — schema
//! validation, filters, edge weights — looks the value up by its string key.
//! The edge-weight convention is `data["weight"]` unless the caller names a
//! different property.
//!
//! # Metadata discipline
//!
//! [`Metadata`] is stamped by the storage adapter, never by callers. Record
//! constructors produce *draft* metadata (version 0, zeroed timestamps) that
//! the adapter overwrites on insert. Updates bump `version` by exactly one
//! and guarantee `updated_at` strictly increases; soft deletes stamp
//! `deleted_at` without touching `version`.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod error;
mod event;
mod filter;
mod ident;
mod metadata;
mod record;
mod schema;

pub use error::{BatchFailure, BatchOutcome, StoreError};
pub use event::{Event, EventKind, SubscribeOptions, Topic};
pub use filter::{Filter, Filterable, Predicate, PredicateFn};
pub use ident::{generate_id, now_ms, EntityId, EventId, SubscriptionId};
pub use metadata::{EntityKind, Metadata};
pub use record::{DataMap, EdgeRecord, GraphRecord, NodeRecord};
pub use schema::{BindingEnd, FieldSpec, FieldType, TypeSchema};
