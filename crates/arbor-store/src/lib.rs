// SPDX-License-Identifier: Apache-2.0
//! arbor-store: a concurrent, schema-typed in-memory graph store.
//!
//! One [`Store`] holds three primary tables (graphs, nodes, edges) plus four
//! edge indices (`by_source`, `by_target`, `by_type`, `by_source_type`),
//! kept consistent under soft deletes and updates. On top of the tables sit
//! adaptive edge-lookup helpers with a bounded TTL result cache, five graph
//! algorithms (BFS, Dijkstra, PageRank, connected components, Kruskal
//! spanning trees) that consume those helpers, and a per-store subscription
//! bus that fans mutation events out to subscribers in commit order.
//!
//! Stores are addressed by name through the process-wide registry:
//!
//! ```
//! use arbor_store::{start, stop, StoreConfig};
//! use arbor_store::{DataMap, NodeRecord};
//!
//! let store = start(StoreConfig::new("docs-example"))?;
//! let alice = store.insert_node(NodeRecord::new(DataMap::new()).with_id("alice"))?;
//! assert_eq!(alice.metadata.version, 1);
//! stop("docs-example")?;
//! # Ok::<(), arbor_store::StoreError>(())
//! ```
//!
//! # Concurrency contract
//!
//! Writes serialize per store and commit atomically with respect to
//! readers: a reader observes either the pre-write or post-write state of
//! every table, never a half-updated index. Reads run concurrently with
//! each other. Event delivery is asynchronous and never blocks a writer;
//! per-subscriber delivery order is the commit order.
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
    clippy::use_self,
    clippy::float_cmp,
    clippy::cast_precision_loss
)]

mod algo;
mod bus;
mod cache;
mod config;
mod query;
mod registry;
mod store;
mod tables;

pub use algo::{
    Algorithm, BfsOptions, ComponentsOptions, Direction, PageRankOptions, ShortestPathOptions,
    SpanningTreeOptions, Traversal, TraversalOutput,
};
pub use bus::{EventCallback, Subscriber};
pub use config::{AdapterKind, AdaptiveThresholds, CacheSettings, StoreConfig};
pub use query::CachedQueryOptions;
pub use registry::{lookup, start, stop, store, stores};
pub use store::Store;
pub use tables::{ListOptions, SortOrder};

// The data model is part of the public surface; re-export it so callers
// depend on one crate.
pub use arbor_model::{
    generate_id, now_ms, BatchFailure, BatchOutcome, BindingEnd, DataMap, EdgeRecord, EntityId,
    EntityKind, Event, EventId, EventKind, FieldSpec, FieldType, Filter, Filterable, GraphRecord,
    Metadata, NodeRecord, Predicate, PredicateFn, StoreError, SubscribeOptions, SubscriptionId,
    Topic, TypeSchema,
};
