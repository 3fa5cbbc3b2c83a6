// SPDX-License-Identifier: Apache-2.0
//! Breadth-first traversal with a wall-clock budget.
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use arbor_model::{DataMap, NodeRecord, StoreError};
use rustc_hash::FxHashSet;

use super::{neighbors, BfsOptions, TraversalOutput};
use crate::store::Store;

/// How many same-depth neighbors are still worth sorting for deterministic
/// order; larger frontiers keep index order.
const ORDERED_NEIGHBOR_LIMIT: usize = 100;

/// Runs BFS from `start`.
///
/// Output is the reachable nodes in traversal order, start node first, each
/// visited at most once, bounded by `max_depth` hops and the wall-clock
/// budget. Same-depth neighbors of one parent are sorted ascending by id
/// (skipped above [`ORDERED_NEIGHBOR_LIMIT`]). On budget expiry the partial
/// prefix is returned with `truncated` set.
pub(crate) fn run(
    store: &Store,
    start: &str,
    options: &BfsOptions,
) -> Result<TraversalOutput, StoreError> {
    let budget = Duration::from_millis(
        options.timeout_ms.unwrap_or(store.config().bfs_timeout_ms),
    );
    let deadline = Instant::now() + budget;

    let start_record = match store.get_node(start) {
        Ok(record) => record,
        Err(_) => {
            // Tombstoned and missing starts are equally absent here.
            if options.best_effort && options.edge_type.is_some() {
                let stub = NodeRecord::new(DataMap::new()).with_id(start);
                return Ok(TraversalOutput::Bfs {
                    nodes: vec![stub],
                    truncated: false,
                });
            }
            return Err(StoreError::NotFound {
                kind: arbor_model::EntityKind::Node,
                id: start.to_owned(),
            });
        }
    };

    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(start.to_owned());
    let mut order: Vec<NodeRecord> = vec![start_record];
    let mut frontier: VecDeque<(String, usize)> = VecDeque::new();
    frontier.push_back((start.to_owned(), 0));
    let mut truncated = false;

    while let Some((node, depth)) = frontier.pop_front() {
        if depth >= options.max_depth {
            continue;
        }
        if Instant::now() >= deadline {
            truncated = true;
            break;
        }
        let mut next: Vec<String> = neighbors(
            store,
            &node,
            options.direction,
            options.edge_type.as_deref(),
        )
        .into_iter()
        .map(|(neighbor, _)| neighbor)
        .filter(|neighbor| !visited.contains(neighbor))
        .collect();
        if next.len() <= ORDERED_NEIGHBOR_LIMIT {
            next.sort();
        }
        for neighbor in next {
            if !visited.insert(neighbor.clone()) {
                continue;
            }
            // Dangling or tombstoned neighbors are skipped, not expanded.
            if let Ok(record) = store.get_node(&neighbor) {
                order.push(record);
                frontier.push_back((neighbor, depth + 1));
            }
        }
    }

    Ok(TraversalOutput::Bfs {
        nodes: order,
        truncated,
    })
}
