// SPDX-License-Identifier: Apache-2.0
//! Iterative weighted PageRank.
use std::collections::BTreeMap;

use arbor_model::{EntityId, Filter, StoreError};
use rustc_hash::FxHashMap;

use super::{weight, PageRankOptions, TraversalOutput};
use crate::store::Store;
use crate::tables::ListOptions;

/// Runs PageRank over the store's live nodes and edges.
///
/// Per iteration, each node receives `(1-d)/N` plus `d` times the
/// weight-proportional share of each live predecessor's rank; nodes with no
/// outgoing edges contribute nothing (the random-jump term still applies),
/// and scores are renormalized to sum to 1 after every iteration. Initial
/// score is `1/N`. Dangling edges (an endpoint that does not resolve to a
/// live node) are ignored.
pub(crate) fn run(
    store: &Store,
    options: &PageRankOptions,
) -> Result<TraversalOutput, StoreError> {
    if options.iterations == 0 {
        return Err(StoreError::InvalidParams(
            "iterations must be at least 1".to_owned(),
        ));
    }
    if !(0.0..=1.0).contains(&options.damping) {
        return Err(StoreError::InvalidParams(
            "damping must lie in [0, 1]".to_owned(),
        ));
    }

    let node_records = store.nodes(&Filter::new(), &ListOptions::default());
    let count = node_records.len();
    if count == 0 {
        return Ok(TraversalOutput::Ranks(BTreeMap::new()));
    }
    let index: FxHashMap<EntityId, usize> = node_records
        .iter()
        .enumerate()
        .map(|(i, record)| (record.id.clone(), i))
        .collect();

    // Resolve the live edge list once: (source idx, target idx, weight).
    let mut links: Vec<(usize, usize, f64)> = Vec::new();
    let mut out_weight = vec![0.0_f64; count];
    for edge in store.edges(&Filter::new(), &ListOptions::default()) {
        let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) else {
            continue;
        };
        let w = weight::stored(&edge, &options.weight_property, options.default_weight);
        out_weight[s] += w;
        links.push((s, t, w));
    }

    let n = count as f64;
    let base = (1.0 - options.damping) / n;
    let mut ranks = vec![1.0 / n; count];
    for _ in 0..options.iterations {
        let mut next = vec![base; count];
        for &(s, t, w) in &links {
            if out_weight[s] > 0.0 {
                next[t] += options.damping * ranks[s] * w / out_weight[s];
            }
        }
        let sum: f64 = next.iter().sum();
        if sum > 0.0 {
            for score in &mut next {
                *score /= sum;
            }
        }
        ranks = next;
    }

    let scores: BTreeMap<EntityId, f64> = node_records
        .into_iter()
        .map(|record| {
            let score = index.get(&record.id).map_or(0.0, |&i| ranks[i]);
            (record.id, score)
        })
        .collect();
    Ok(TraversalOutput::Ranks(scores))
}
