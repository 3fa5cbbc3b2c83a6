// SPDX-License-Identifier: Apache-2.0
//! Edge lookup primitives and the adaptive strategy dispatcher.
//!
//! Every algorithm enumerates neighbors through these helpers, never through
//! the raw tables. Three equivalent lookups exist for "outgoing edges of a
//! given type", ordered by the graph size they pay off at:
//!
//! 1. intersection of `by_source` and `by_type` (small graphs);
//! 2. direct `by_source_type` composite-index hit (medium);
//! 3. the composite hit list resolved in parallel chunks (large).
//!
//! [`Store::outgoing_edges_adaptive`] picks among them using the live edge
//! count against the configured thresholds. The composite paths fall back to
//! scanning `outgoing_edges` and filtering on the payload's `"type"` key, to
//! tolerate edges typed only in their data map.
//!
//! Every helper skips tombstoned edges, and the cached variant publishes its
//! result while still holding the read guard, so a concurrent writer's
//! invalidation cannot be overwritten by a stale fill.
use arbor_model::EdgeRecord;
use rayon::prelude::*;

use crate::store::{effective_edge_type, Store};
use crate::tables::Tables;

/// Options for [`Store::outgoing_edges_by_type_cached`].
#[derive(Clone, Copy, Debug)]
pub struct CachedQueryOptions {
    /// Consult and fill the cache (default true).
    pub use_cache: bool,
    /// Skip the lookup and overwrite the cached value (default false).
    pub refresh_cache: bool,
    /// Per-call TTL override in milliseconds.
    pub ttl_ms: Option<u64>,
}

impl Default for CachedQueryOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            refresh_cache: false,
            ttl_ms: None,
        }
    }
}

impl Store {
    /// Outgoing edges of a node: `(target id, edge)` pairs ordered by
    /// `(target, edge id)`.
    pub fn outgoing_edges(&self, node: &str) -> Vec<(String, EdgeRecord)> {
        collect_outgoing(&self.tables.read(), node)
    }

    /// Incoming edges of a node: `(source id, edge)` pairs ordered by
    /// `(source, edge id)`.
    pub fn incoming_edges(&self, node: &str) -> Vec<(String, EdgeRecord)> {
        let tables = self.tables.read();
        let Some(set) = tables.by_target.get(node) else {
            return Vec::new();
        };
        set.iter()
            .filter_map(|(source, edge_id)| {
                live_edge(&tables, edge_id).map(|edge| (source.clone(), edge))
            })
            .collect()
    }

    /// Every live edge carrying the given indexed type.
    pub fn edges_by_type(&self, edge_type: &str) -> Vec<EdgeRecord> {
        let tables = self.tables.read();
        let Some(set) = tables.by_type.get(edge_type) else {
            return Vec::new();
        };
        set.iter()
            .filter_map(|edge_id| live_edge(&tables, edge_id))
            .collect()
    }

    /// Baseline typed lookup: intersection of `by_source` and `by_type`.
    pub fn outgoing_edges_by_type(&self, node: &str, edge_type: &str) -> Vec<(String, EdgeRecord)> {
        collect_intersect(&self.tables.read(), node, edge_type)
    }

    /// Composite-index typed lookup with the scan fallback.
    pub fn outgoing_edges_by_type_optimized(
        &self,
        node: &str,
        edge_type: &str,
    ) -> Vec<(String, EdgeRecord)> {
        collect_composite(&self.tables.read(), node, edge_type)
    }

    /// Typed lookup that resolves the composite hit list in parallel chunks
    /// on the store's worker pool. Falls back like the optimized variant
    /// when the composite index has no hits.
    pub fn outgoing_edges_by_type_parallel(
        &self,
        node: &str,
        edge_type: &str,
    ) -> Vec<(String, EdgeRecord)> {
        let tables = self.tables.read();
        self.collect_composite_parallel(&tables, node, edge_type)
    }

    /// Strategy-selecting typed lookup: picks the baseline, composite, or
    /// parallel path from the live edge count against the configured
    /// thresholds. An untyped request is a plain `outgoing_edges`.
    pub fn outgoing_edges_adaptive(
        &self,
        node: &str,
        edge_type: Option<&str>,
    ) -> Vec<(String, EdgeRecord)> {
        let tables = self.tables.read();
        self.collect_adaptive(&tables, node, edge_type)
    }

    /// Cached typed lookup keyed on `(source, type)`.
    ///
    /// A hit is served straight from the cache; a miss (or a `refresh_cache`
    /// call) computes via the adaptive path and fills the cache. Writers
    /// invalidate the key before their write guard drops, and the fill here
    /// happens under the read guard, so the cache never resurrects a result
    /// a writer has already invalidated.
    pub fn outgoing_edges_by_type_cached(
        &self,
        node: &str,
        edge_type: &str,
        options: &CachedQueryOptions,
    ) -> Vec<(String, EdgeRecord)> {
        let key = (node.to_owned(), edge_type.to_owned());
        if options.use_cache && !options.refresh_cache {
            if let Some(hit) = self.edge_cache.get(&key) {
                return hit;
            }
        }
        let tables = self.tables.read();
        let result = self.collect_adaptive(&tables, node, Some(edge_type));
        if options.use_cache {
            match options.ttl_ms {
                Some(ttl) => self.edge_cache.put_with_ttl(key, result.clone(), ttl),
                None => self.edge_cache.put(key, result.clone()),
            }
        }
        drop(tables);
        result
    }

    pub(crate) fn collect_adaptive(
        &self,
        tables: &Tables,
        node: &str,
        edge_type: Option<&str>,
    ) -> Vec<(String, EdgeRecord)> {
        let Some(edge_type) = edge_type else {
            return collect_outgoing(tables, node);
        };
        let edges = tables.edge_count();
        if edges < self.config.adaptive.medium {
            collect_intersect(tables, node, edge_type)
        } else if edges < self.config.adaptive.large {
            collect_composite(tables, node, edge_type)
        } else {
            self.collect_composite_parallel(tables, node, edge_type)
        }
    }

    fn collect_composite_parallel(
        &self,
        tables: &Tables,
        node: &str,
        edge_type: &str,
    ) -> Vec<(String, EdgeRecord)> {
        let key = (node.to_owned(), edge_type.to_owned());
        let Some(set) = tables.by_source_type.get(&key) else {
            return collect_scan_fallback(tables, node, edge_type);
        };
        let hits: Vec<&String> = set.iter().collect();
        if hits.is_empty() {
            return collect_scan_fallback(tables, node, edge_type);
        }
        // ≤ `max_concurrency` chunks; chunk order is preserved on collect,
        // so the output matches the sequential composite path.
        let workers = self.config.max_concurrency.max(1);
        let chunk_size = hits.len().div_ceil(workers).max(1);
        self.pool.install(|| {
            hits.par_chunks(chunk_size)
                .flat_map_iter(|chunk| {
                    chunk.iter().filter_map(|edge_id| {
                        live_edge(tables, edge_id.as_str())
                            .map(|edge| (edge.target.clone(), edge))
                    })
                })
                .collect()
        })
    }
}

fn live_edge(tables: &Tables, edge_id: &str) -> Option<EdgeRecord> {
    tables
        .edges
        .get(edge_id)
        .filter(|edge| edge.metadata.is_live())
        .cloned()
}

fn collect_outgoing(tables: &Tables, node: &str) -> Vec<(String, EdgeRecord)> {
    let Some(set) = tables.by_source.get(node) else {
        return Vec::new();
    };
    set.iter()
        .filter_map(|(target, edge_id)| {
            live_edge(tables, edge_id).map(|edge| (target.clone(), edge))
        })
        .collect()
}

/// The baseline intersection. No fallback: an empty result is the answer,
/// here and in the adaptive small-graph branch. Only the composite-index
/// paths scan for payload-typed edges.
fn collect_intersect(tables: &Tables, node: &str, edge_type: &str) -> Vec<(String, EdgeRecord)> {
    let type_set = tables.by_type.get(edge_type);
    let Some(source_set) = tables.by_source.get(node) else {
        return Vec::new();
    };
    source_set
        .iter()
        .filter(|(_, edge_id)| type_set.is_some_and(|set| set.contains(edge_id)))
        .filter_map(|(target, edge_id)| {
            live_edge(tables, edge_id).map(|edge| (target.clone(), edge))
        })
        .collect()
}

fn collect_composite(tables: &Tables, node: &str, edge_type: &str) -> Vec<(String, EdgeRecord)> {
    let key = (node.to_owned(), edge_type.to_owned());
    let hits: Vec<(String, EdgeRecord)> = tables
        .by_source_type
        .get(&key)
        .into_iter()
        .flatten()
        .filter_map(|edge_id| {
            live_edge(tables, edge_id).map(|edge| (edge.target.clone(), edge))
        })
        .collect();
    if hits.is_empty() {
        collect_scan_fallback(tables, node, edge_type)
    } else {
        hits
    }
}

/// Tolerates edges inserted with their type only in the payload map: scans
/// the node's outgoing edges and filters on the effective type.
fn collect_scan_fallback(
    tables: &Tables,
    node: &str,
    edge_type: &str,
) -> Vec<(String, EdgeRecord)> {
    collect_outgoing(tables, node)
        .into_iter()
        .filter(|(_, edge)| effective_edge_type(edge) == Some(edge_type))
        .collect()
}
