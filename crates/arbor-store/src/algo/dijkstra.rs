// SPDX-License-Identifier: Apache-2.0
//! Weighted shortest path (Dijkstra with lazy decrease-key).
//!
//! The priority queue is a `BinaryHeap` of `(distance, node id)` entries
//! ordered as a min-heap with the id as tie-break; superseded entries are
//! skipped when popped instead of being removed in place.
//!
//! Large frontiers relax in parallel: when a node's neighbor list exceeds
//! [`PARALLEL_THRESHOLD`], it is split into at most [`MAX_RELAX_WORKERS`]
//! chunks of at least [`CHUNK_SIZE`] and evaluated on the store's worker
//! pool. Chunk results merge in chunk order under one rule: a strictly
//! smaller tentative distance always wins, and an *equal* distance replaces
//! the predecessor — so on ties the later-merged chunk's predecessor is the
//! one kept, deterministically.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use arbor_model::{EntityId, EntityKind, StoreError};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{neighbors, weight, ShortestPathOptions, TraversalOutput};
use crate::store::Store;

/// Neighbor count above which relaxation goes parallel.
const PARALLEL_THRESHOLD: usize = 50;
/// Minimum neighbors per parallel chunk.
const CHUNK_SIZE: usize = 25;
/// Upper bound on concurrent relaxation chunks.
const MAX_RELAX_WORKERS: usize = 8;

struct QueueEntry {
    distance: f64,
    node: EntityId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    /// Reversed, so the `BinaryHeap` pops the smallest distance first;
    /// equal distances pop in ascending id order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// One relaxation candidate: `(neighbor, selection weight, stored weight)`.
type Relaxation = (EntityId, f64, f64);

pub(crate) fn run(
    store: &Store,
    source: &str,
    target: &str,
    options: &ShortestPathOptions,
) -> Result<TraversalOutput, StoreError> {
    if !options.default_weight.is_finite() {
        return Err(StoreError::InvalidParams(
            "default_weight must be finite".to_owned(),
        ));
    }
    for endpoint in [source, target] {
        if store.get_node(endpoint).is_err() {
            return Err(StoreError::NotFound {
                kind: EntityKind::Node,
                id: endpoint.to_owned(),
            });
        }
    }

    let key = cache_key(store.name(), source, target, options);
    if options.use_cache {
        if let Some((nodes, total_weight)) = store.path_cache.get(&key) {
            return Ok(TraversalOutput::Path {
                nodes,
                total_weight,
            });
        }
    }

    let mut dist: FxHashMap<EntityId, f64> = FxHashMap::default();
    let mut prev: FxHashMap<EntityId, (EntityId, f64)> = FxHashMap::default();
    let mut settled: FxHashSet<EntityId> = FxHashSet::default();
    let mut heap: BinaryHeap<QueueEntry> = BinaryHeap::new();

    dist.insert(source.to_owned(), 0.0);
    heap.push(QueueEntry {
        distance: 0.0,
        node: source.to_owned(),
    });

    while let Some(QueueEntry { distance, node }) = heap.pop() {
        if !settled.insert(node.clone()) {
            continue;
        }
        if node == target {
            break;
        }
        let frontier = neighbors(store, &node, options.direction, options.edge_type.as_deref());
        let relaxations = if frontier.len() > PARALLEL_THRESHOLD {
            relax_parallel(store, &frontier, options)
        } else {
            relax_sequential(store, &frontier, options)
        };
        for (neighbor, selection_weight, stored_weight) in relaxations {
            if settled.contains(&neighbor) {
                continue;
            }
            let alt = distance + selection_weight;
            match dist.get(&neighbor) {
                Some(&best) if alt > best => {}
                Some(&best) if alt == best => {
                    // Tie: the later-merged candidate's predecessor wins.
                    prev.insert(neighbor, (node.clone(), stored_weight));
                }
                _ => {
                    dist.insert(neighbor.clone(), alt);
                    prev.insert(neighbor.clone(), (node.clone(), stored_weight));
                    heap.push(QueueEntry {
                        distance: alt,
                        node: neighbor,
                    });
                }
            }
        }
    }

    if !settled.contains(target) {
        return Err(StoreError::NoPathExists {
            source: source.to_owned(),
            target: target.to_owned(),
        });
    }

    let mut nodes: Vec<EntityId> = vec![target.to_owned()];
    let mut total_weight = 0.0;
    let mut cursor = target.to_owned();
    while cursor != source {
        let Some((predecessor, stored_weight)) = prev.get(&cursor) else {
            break;
        };
        total_weight += stored_weight;
        nodes.push(predecessor.clone());
        cursor = predecessor.clone();
    }
    nodes.reverse();

    if options.use_cache {
        store.path_cache.put(key, (nodes.clone(), total_weight));
    }
    Ok(TraversalOutput::Path {
        nodes,
        total_weight,
    })
}

fn relax_sequential(
    store: &Store,
    frontier: &[(EntityId, arbor_model::EdgeRecord)],
    options: &ShortestPathOptions,
) -> Vec<Relaxation> {
    frontier
        .iter()
        .filter_map(|(neighbor, edge)| candidate(store, neighbor, edge, options))
        .collect()
}

fn relax_parallel(
    store: &Store,
    frontier: &[(EntityId, arbor_model::EdgeRecord)],
    options: &ShortestPathOptions,
) -> Vec<Relaxation> {
    let chunk_size = frontier
        .len()
        .div_ceil(MAX_RELAX_WORKERS)
        .max(CHUNK_SIZE);
    store.pool.install(|| {
        frontier
            .par_chunks(chunk_size)
            .flat_map_iter(|chunk| {
                chunk
                    .iter()
                    .filter_map(|(neighbor, edge)| candidate(store, neighbor, edge, options))
            })
            .collect()
    })
}

/// A relaxation candidate, or `None` for a dangling neighbor.
fn candidate(
    store: &Store,
    neighbor: &str,
    edge: &arbor_model::EdgeRecord,
    options: &ShortestPathOptions,
) -> Option<Relaxation> {
    if store.get_node(neighbor).is_err() {
        return None;
    }
    let stored_weight = weight::stored(edge, &options.weight_property, options.default_weight);
    let selection_weight = weight::selection(stored_weight, options.prefer_lower_weights);
    Some((neighbor.to_owned(), selection_weight, stored_weight))
}

/// Cache key: digest of every parameter that shapes the result.
fn cache_key(
    store_name: &str,
    source: &str,
    target: &str,
    options: &ShortestPathOptions,
) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in [store_name, source, target, options.weight_property.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    hasher.update(&options.default_weight.to_le_bytes());
    hasher.update(&[
        u8::from(options.prefer_lower_weights),
        options.direction as u8,
    ]);
    if let Some(edge_type) = &options.edge_type {
        hasher.update(edge_type.as_bytes());
    }
    hasher.finalize().into()
}
