// SPDX-License-Identifier: Apache-2.0
//! Store boot configuration.
use std::fmt;
use std::thread;

use arbor_model::TypeSchema;

/// Which storage adapter backs a store. Only the in-memory adapter is
/// defined; the kind is recorded in the registry so callers can introspect
/// what they are talking to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdapterKind {
    /// Keyed in-memory tables plus in-memory indices.
    #[default]
    Memory,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Size and TTL settings for one result cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    /// Entry cap; exceeding it arms the periodic eviction pass.
    pub max_size: usize,
    /// Entry time-to-live in milliseconds.
    pub ttl_ms: u64,
}

/// Edge-count thresholds steering the adaptive query dispatcher.
///
/// Below `medium` the plain index-intersection lookup wins; between `medium`
/// and `large` the composite index is consulted directly; above `large` the
/// composite hit list is resolved in parallel chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptiveThresholds {
    /// Live-edge count at which the composite index takes over.
    pub medium: usize,
    /// Live-edge count at which lookups go parallel.
    pub large: usize,
}

/// Options accepted by `start`.
///
/// Every knob has the engine's documented default; `new` gives a fully
/// defaulted configuration for a named store and the `with_*` builders
/// override individual settings.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Store identity; unique process-wide.
    pub name: String,
    /// Backing adapter kind.
    pub adapter: AdapterKind,
    /// Request in-memory table compression. Recorded and surfaced via
    /// [`crate::Store::config`]; the memory adapter itself stores records
    /// uncompressed and treats the flag as reserved for adapters that can
    /// honor it.
    pub compressed: bool,
    /// Subtype schemas to register before the store accepts writes.
    pub schemas: Vec<TypeSchema>,
    /// Outgoing-edges-by-type result cache (default 10 000 entries / 60 s).
    pub edge_cache: CacheSettings,
    /// Shortest-path result cache (default 1 000 entries / 300 s).
    pub path_cache: CacheSettings,
    /// Wall-clock budget for breadth-first traversal, milliseconds.
    pub bfs_timeout_ms: u64,
    /// Adaptive dispatcher thresholds (default 1 000 / 10 000).
    pub adaptive: AdaptiveThresholds,
    /// Worker cap for parallel edge lookups and chunked relaxation.
    /// Defaults to the host CPU count.
    pub max_concurrency: usize,
}

impl StoreConfig {
    /// A fully defaulted configuration for a store named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adapter: AdapterKind::Memory,
            compressed: false,
            schemas: Vec::new(),
            edge_cache: CacheSettings {
                max_size: 10_000,
                ttl_ms: 60_000,
            },
            path_cache: CacheSettings {
                max_size: 1_000,
                ttl_ms: 300_000,
            },
            bfs_timeout_ms: 5_000,
            adaptive: AdaptiveThresholds {
                medium: 1_000,
                large: 10_000,
            },
            max_concurrency: thread::available_parallelism().map_or(1, usize::from),
        }
    }

    /// Enables the compression request flag.
    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    /// Pre-registers a subtype schema.
    pub fn with_schema(mut self, schema: TypeSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Overrides the edge-cache settings.
    pub fn with_edge_cache(mut self, settings: CacheSettings) -> Self {
        self.edge_cache = settings;
        self
    }

    /// Overrides the path-cache settings.
    pub fn with_path_cache(mut self, settings: CacheSettings) -> Self {
        self.path_cache = settings;
        self
    }

    /// Overrides the BFS wall-clock budget.
    pub fn with_bfs_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.bfs_timeout_ms = timeout_ms;
        self
    }

    /// Overrides the adaptive dispatcher thresholds.
    pub fn with_adaptive(mut self, thresholds: AdaptiveThresholds) -> Self {
        self.adaptive = thresholds;
        self
    }

    /// Overrides the parallel-lookup worker cap.
    pub fn with_max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = workers.max(1);
        self
    }
}
