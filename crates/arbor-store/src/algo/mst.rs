// SPDX-License-Identifier: Apache-2.0
//! Kruskal spanning tree / spanning forest.
use arbor_model::{EdgeRecord, Filter, StoreError};
use rustc_hash::FxHashMap;

use super::dsu::DisjointSet;
use super::{weight, SpanningTreeOptions, TraversalOutput};
use crate::store::{effective_edge_type, Store};
use crate::tables::ListOptions;

/// Computes a minimum (or, with `prefer_lower_weights = false`, maximum)
/// spanning tree per connected component of the filtered subgraph.
///
/// Candidates sort by `(stored weight, edge id)` — ascending for the
/// minimum tree, weight-descending for the maximum tree — and union-find
/// accepts an edge when its endpoints are in different components. For a
/// disconnected graph the result is the spanning forest: the union of
/// per-component trees, `node_count − component_count` edges in total.
pub(crate) fn run(
    store: &Store,
    options: &SpanningTreeOptions,
) -> Result<TraversalOutput, StoreError> {
    let node_records = store.nodes(&Filter::new(), &ListOptions::default());
    let index: FxHashMap<String, usize> = node_records
        .into_iter()
        .enumerate()
        .map(|(i, record)| (record.id, i))
        .collect();

    let mut candidates: Vec<(f64, EdgeRecord)> = store
        .edges(&Filter::new(), &ListOptions::default())
        .into_iter()
        .filter(|edge| match options.edge_type.as_deref() {
            Some(wanted) => effective_edge_type(edge) == Some(wanted),
            None => true,
        })
        .filter(|edge| index.contains_key(&edge.source) && index.contains_key(&edge.target))
        .map(|edge| {
            let w = weight::stored(&edge, &options.weight_property, options.default_weight);
            (w, edge)
        })
        .collect();
    if options.prefer_lower_weights {
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
    } else {
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
    }

    let mut dsu = DisjointSet::new(index.len());
    let mut edges: Vec<EdgeRecord> = Vec::new();
    let mut total_weight = 0.0;
    for (w, edge) in candidates {
        let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) else {
            continue;
        };
        if dsu.union(s, t) {
            total_weight += w;
            edges.push(edge);
        }
    }
    Ok(TraversalOutput::SpanningTree {
        edges,
        total_weight,
    })
}
