// SPDX-License-Identifier: Apache-2.0
//! Per-store primary tables and edge indices.
//!
//! `Tables` owns the six in-memory collections of one store: the three
//! primary maps (`graphs`, `nodes`, `edges`) and the four edge indices
//! (`by_source`, `by_target`, `by_type`, `by_source_type`). It is the only
//! code that touches the indices, and every mutation keeps them in lockstep
//! with the primaries:
//!
//! - a live edge `e` with source `s`, target `t`, type `k` is present as
//!   `by_source[s] ∋ (t, e.id)`, `by_target[t] ∋ (s, e.id)`, and — when `k`
//!   is set — `by_type[k] ∋ e.id`, `by_source_type[(s, k)] ∋ e.id`;
//! - tombstoned edges have no index entries at all.
//!
//! Adjacency values are ordered sets, so neighbor enumeration is
//! deterministic without a sort at query time. An index entry pointing at a
//! missing or tombstoned edge is engine corruption; removal paths carry
//! `debug_assert!` tripwires rather than error values.
//!
//! `Tables` does no locking; the store serializes writers and lets readers
//! share a guard around this structure.
use std::collections::BTreeSet;

use arbor_model::{
    EdgeRecord, EntityId, EntityKind, Filter, Filterable, GraphRecord, NodeRecord, StoreError,
};
use rustc_hash::FxHashMap;

/// Sort order for listings; records sort by id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending by id.
    #[default]
    Asc,
    /// Descending by id.
    Desc,
}

/// Pagination and ordering options for listings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListOptions {
    /// Sort direction (by id).
    pub sort: SortOrder,
    /// Records to skip after sorting.
    pub offset: usize,
    /// Maximum records to return; `None` = unbounded.
    pub limit: Option<usize>,
}

impl ListOptions {
    /// Ascending listing with an offset and limit.
    pub fn page(offset: usize, limit: usize) -> Self {
        Self {
            sort: SortOrder::Asc,
            offset,
            limit: Some(limit),
        }
    }
}

/// The six collections of one store.
pub(crate) struct Tables {
    pub(crate) graphs: FxHashMap<EntityId, GraphRecord>,
    pub(crate) nodes: FxHashMap<EntityId, NodeRecord>,
    pub(crate) edges: FxHashMap<EntityId, EdgeRecord>,
    /// source id → ordered set of `(target id, edge id)`.
    pub(crate) by_source: FxHashMap<EntityId, BTreeSet<(EntityId, EntityId)>>,
    /// target id → ordered set of `(source id, edge id)`.
    pub(crate) by_target: FxHashMap<EntityId, BTreeSet<(EntityId, EntityId)>>,
    /// edge type → ordered set of edge ids.
    pub(crate) by_type: FxHashMap<String, BTreeSet<EntityId>>,
    /// `(source id, edge type)` → ordered set of edge ids.
    pub(crate) by_source_type: FxHashMap<(EntityId, String), BTreeSet<EntityId>>,
    live_graphs: usize,
    live_nodes: usize,
    live_edges: usize,
}

impl Tables {
    pub(crate) fn new() -> Self {
        Self {
            graphs: FxHashMap::default(),
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            by_source: FxHashMap::default(),
            by_target: FxHashMap::default(),
            by_type: FxHashMap::default(),
            by_source_type: FxHashMap::default(),
            live_graphs: 0,
            live_nodes: 0,
            live_edges: 0,
        }
    }

    /// Releases every table, index, and counter.
    pub(crate) fn clear(&mut self) {
        self.graphs.clear();
        self.nodes.clear();
        self.edges.clear();
        self.by_source.clear();
        self.by_target.clear();
        self.by_type.clear();
        self.by_source_type.clear();
        self.live_graphs = 0;
        self.live_nodes = 0;
        self.live_edges = 0;
    }

    /// Live (non-tombstoned) graph count.
    pub(crate) fn graph_count(&self) -> usize {
        self.live_graphs
    }

    /// Live node count.
    pub(crate) fn node_count(&self) -> usize {
        self.live_nodes
    }

    /// Live edge count; feeds the adaptive query dispatcher.
    pub(crate) fn edge_count(&self) -> usize {
        self.live_edges
    }

    // ========================================================================
    // Graphs
    // ========================================================================

    pub(crate) fn insert_graph(&mut self, mut record: GraphRecord) -> Result<GraphRecord, StoreError> {
        if self.graphs.contains_key(&record.id) {
            return Err(StoreError::IdAlreadyExists {
                kind: EntityKind::Graph,
                id: record.id,
            });
        }
        record.metadata.stamp();
        self.live_graphs += 1;
        let stored = record.clone();
        self.graphs.insert(record.id.clone(), record);
        Ok(stored)
    }

    pub(crate) fn update_graph(&mut self, record: GraphRecord) -> Result<GraphRecord, StoreError> {
        let Some(existing) = self.graphs.get_mut(&record.id) else {
            return Err(not_found(EntityKind::Graph, record.id));
        };
        if existing.metadata.deleted {
            return Err(not_found(EntityKind::Graph, record.id));
        }
        existing.name = record.name;
        existing.data = record.data;
        existing.metadata.touch();
        Ok(existing.clone())
    }

    /// Tombstones a graph. Returns the record when this call performed the
    /// delete; `None` means the id was absent or already tombstoned.
    pub(crate) fn delete_graph(&mut self, id: &str) -> Option<GraphRecord> {
        let record = self.graphs.get_mut(id)?;
        if record.metadata.deleted {
            return None;
        }
        record.metadata.tombstone();
        self.live_graphs -= 1;
        Some(record.clone())
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    pub(crate) fn insert_node(&mut self, mut record: NodeRecord) -> Result<NodeRecord, StoreError> {
        if self.nodes.contains_key(&record.id) {
            return Err(StoreError::IdAlreadyExists {
                kind: EntityKind::Node,
                id: record.id,
            });
        }
        record.metadata.stamp();
        self.live_nodes += 1;
        let stored = record.clone();
        self.nodes.insert(record.id.clone(), record);
        Ok(stored)
    }

    pub(crate) fn update_node(&mut self, record: NodeRecord) -> Result<NodeRecord, StoreError> {
        let Some(existing) = self.nodes.get_mut(&record.id) else {
            return Err(not_found(EntityKind::Node, record.id));
        };
        if existing.metadata.deleted {
            return Err(not_found(EntityKind::Node, record.id));
        }
        existing.graph_id = record.graph_id;
        existing.node_type = record.node_type;
        existing.data = record.data;
        existing.metadata.touch();
        Ok(existing.clone())
    }

    /// Tombstones a node. See [`Tables::delete_graph`] for the return
    /// contract. Incident edges are left in place; traversals skip
    /// unresolvable endpoints.
    pub(crate) fn delete_node(&mut self, id: &str) -> Option<NodeRecord> {
        let record = self.nodes.get_mut(id)?;
        if record.metadata.deleted {
            return None;
        }
        record.metadata.tombstone();
        self.live_nodes -= 1;
        Some(record.clone())
    }

    // ========================================================================
    // Edges
    // ========================================================================

    pub(crate) fn insert_edge(&mut self, mut record: EdgeRecord) -> Result<EdgeRecord, StoreError> {
        if self.edges.contains_key(&record.id) {
            return Err(StoreError::IdAlreadyExists {
                kind: EntityKind::Edge,
                id: record.id,
            });
        }
        record.metadata.stamp();
        self.index_edge(&record);
        self.live_edges += 1;
        let stored = record.clone();
        self.edges.insert(record.id.clone(), record);
        Ok(stored)
    }

    /// Applies an update. When the caller rewired source/target/type, the
    /// stale index entries are removed before the new ones are inserted.
    pub(crate) fn update_edge(&mut self, record: EdgeRecord) -> Result<EdgeRecord, StoreError> {
        let Some(existing) = self.edges.get(&record.id).cloned() else {
            return Err(not_found(EntityKind::Edge, record.id));
        };
        if existing.metadata.deleted {
            return Err(not_found(EntityKind::Edge, record.id));
        }
        let rewired = existing.source != record.source
            || existing.target != record.target
            || existing.edge_type != record.edge_type;
        if rewired {
            self.deindex_edge(&existing);
        }
        let Some(slot) = self.edges.get_mut(&record.id) else {
            debug_assert!(false, "edge vanished during update: {}", record.id);
            return Err(not_found(EntityKind::Edge, record.id));
        };
        slot.source = record.source;
        slot.target = record.target;
        slot.edge_type = record.edge_type;
        slot.data = record.data;
        slot.metadata.touch();
        let updated = slot.clone();
        if rewired {
            self.index_edge(&updated);
        }
        Ok(updated)
    }

    /// Tombstones an edge and removes all four index entries.
    pub(crate) fn delete_edge(&mut self, id: &str) -> Option<EdgeRecord> {
        let record = self.edges.get_mut(id)?;
        if record.metadata.deleted {
            return None;
        }
        record.metadata.tombstone();
        let snapshot = record.clone();
        self.deindex_edge(&snapshot);
        self.live_edges -= 1;
        Some(snapshot)
    }

    fn index_edge(&mut self, edge: &EdgeRecord) {
        self.by_source
            .entry(edge.source.clone())
            .or_default()
            .insert((edge.target.clone(), edge.id.clone()));
        self.by_target
            .entry(edge.target.clone())
            .or_default()
            .insert((edge.source.clone(), edge.id.clone()));
        if let Some(edge_type) = &edge.edge_type {
            self.by_type
                .entry(edge_type.clone())
                .or_default()
                .insert(edge.id.clone());
            self.by_source_type
                .entry((edge.source.clone(), edge_type.clone()))
                .or_default()
                .insert(edge.id.clone());
        }
    }

    fn deindex_edge(&mut self, edge: &EdgeRecord) {
        let source_entry = (edge.target.clone(), edge.id.clone());
        let removed = self
            .by_source
            .get_mut(&edge.source)
            .is_some_and(|set| set.remove(&source_entry));
        debug_assert!(removed, "by_source missing entry for edge {}", edge.id);
        if self.by_source.get(&edge.source).is_some_and(BTreeSet::is_empty) {
            self.by_source.remove(&edge.source);
        }

        let target_entry = (edge.source.clone(), edge.id.clone());
        let removed = self
            .by_target
            .get_mut(&edge.target)
            .is_some_and(|set| set.remove(&target_entry));
        debug_assert!(removed, "by_target missing entry for edge {}", edge.id);
        if self.by_target.get(&edge.target).is_some_and(BTreeSet::is_empty) {
            self.by_target.remove(&edge.target);
        }

        if let Some(edge_type) = &edge.edge_type {
            let removed = self
                .by_type
                .get_mut(edge_type)
                .is_some_and(|set| set.remove(&edge.id));
            debug_assert!(removed, "by_type missing entry for edge {}", edge.id);
            if self.by_type.get(edge_type).is_some_and(BTreeSet::is_empty) {
                self.by_type.remove(edge_type);
            }

            let key = (edge.source.clone(), edge_type.clone());
            let removed = self
                .by_source_type
                .get_mut(&key)
                .is_some_and(|set| set.remove(&edge.id));
            debug_assert!(removed, "by_source_type missing entry for edge {}", edge.id);
            if self.by_source_type.get(&key).is_some_and(BTreeSet::is_empty) {
                self.by_source_type.remove(&key);
            }
        }
    }
}

/// Tombstone-aware filtered listing with sort and pagination.
///
/// Tombstones are excluded before the user filter runs; matching records are
/// sorted by id and only the requested page is cloned out.
pub(crate) fn page_records<R: Filterable + Clone>(
    map: &FxHashMap<EntityId, R>,
    filter: &Filter,
    opts: &ListOptions,
) -> Vec<R> {
    let mut hits: Vec<(&EntityId, &R)> = map
        .iter()
        .filter(|(_, record)| record.meta().is_live() && filter.matches(*record))
        .collect();
    match opts.sort {
        SortOrder::Asc => hits.sort_by(|a, b| a.0.cmp(b.0)),
        SortOrder::Desc => hits.sort_by(|a, b| b.0.cmp(a.0)),
    }
    hits.into_iter()
        .skip(opts.offset)
        .take(opts.limit.unwrap_or(usize::MAX))
        .map(|(_, record)| record.clone())
        .collect()
}

fn not_found(kind: EntityKind, id: EntityId) -> StoreError {
    StoreError::NotFound { kind, id }
}
