// SPDX-License-Identifier: Apache-2.0
//! Connected components via union-find.
use std::collections::BTreeMap;

use arbor_model::{EntityId, Filter, StoreError};
use rustc_hash::FxHashMap;

use super::dsu::DisjointSet;
use super::{ComponentsOptions, TraversalOutput};
use crate::store::{effective_edge_type, Store};
use crate::tables::ListOptions;

/// Partitions the live nodes into connected components.
///
/// Every live edge passing the type filter unions its endpoints; unions are
/// undirected regardless of the requested direction, so every direction
/// yields the same partition. Isolated nodes form singleton components.
/// Output is stable for a given store state: members ascend within a
/// component and components are ordered by their smallest member.
pub(crate) fn run(
    store: &Store,
    options: &ComponentsOptions,
) -> Result<TraversalOutput, StoreError> {
    let node_records = store.nodes(&Filter::new(), &ListOptions::default());
    let ids: Vec<EntityId> = node_records.into_iter().map(|record| record.id).collect();
    let index: FxHashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut dsu = DisjointSet::new(ids.len());
    for edge in store.edges(&Filter::new(), &ListOptions::default()) {
        if let Some(wanted) = options.edge_type.as_deref() {
            if effective_edge_type(&edge) != Some(wanted) {
                continue;
            }
        }
        let (Some(&s), Some(&t)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) else {
            // Dangling edges join nothing.
            continue;
        };
        dsu.union(s, t);
    }

    // Group by representative; BTreeMap keyed on the smallest member keeps
    // the output order stable.
    let mut groups: FxHashMap<usize, Vec<EntityId>> = FxHashMap::default();
    for (i, id) in ids.iter().enumerate() {
        groups.entry(dsu.find(i)).or_default().push(id.clone());
    }
    let mut ordered: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();
    for (_, mut members) in groups {
        members.sort();
        ordered.insert(members[0].clone(), members);
    }
    Ok(TraversalOutput::Components(
        ordered.into_values().collect(),
    ))
}
