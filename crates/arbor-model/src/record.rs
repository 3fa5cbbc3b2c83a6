// SPDX-License-Identifier: Apache-2.0
//! The three stored record kinds: graphs, nodes, and edges.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ident::{generate_id, EntityId};
use crate::metadata::{EntityKind, Metadata};

/// String-keyed payload map attached to every record.
///
/// Values are tagged JSON values, so schemas can validate them and filters
/// can compare them without reflection.
pub type DataMap = serde_json::Map<String, Value>;

/// A logical container grouping nodes and edges (a "policy", a "codebase").
///
/// Graphs do not own their members; nodes reference a graph by id only, so
/// there are no cyclic object graphs to untangle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Unique id within the store's graph table.
    pub id: EntityId,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// Free-form payload.
    pub data: DataMap,
    /// Adapter-stamped bookkeeping.
    pub metadata: Metadata,
}

impl GraphRecord {
    /// A draft graph with a freshly minted id.
    pub fn new(data: DataMap) -> Self {
        Self {
            id: generate_id(),
            name: None,
            data,
            metadata: Metadata::draft(EntityKind::Graph),
        }
    }

    /// Replaces the generated id with a caller-chosen one.
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the graph name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Tags the draft with a user-declared subtype.
    pub fn tagged(mut self, type_tag: impl Into<String>) -> Self {
        self.metadata.type_tag = type_tag.into();
        self
    }
}

/// A vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique id within the store's node table.
    pub id: EntityId,
    /// Optional owning graph. Purely associative; not validated.
    pub graph_id: Option<EntityId>,
    /// Vertex type tag, consulted by edge binding constraints.
    pub node_type: Option<String>,
    /// Free-form payload.
    pub data: DataMap,
    /// Adapter-stamped bookkeeping.
    pub metadata: Metadata,
}

impl NodeRecord {
    /// A draft node with a freshly minted id.
    pub fn new(data: DataMap) -> Self {
        Self {
            id: generate_id(),
            graph_id: None,
            node_type: None,
            data,
            metadata: Metadata::draft(EntityKind::Node),
        }
    }

    /// Replaces the generated id with a caller-chosen one.
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }

    /// Associates the node with a graph.
    pub fn in_graph(mut self, graph_id: impl Into<EntityId>) -> Self {
        self.graph_id = Some(graph_id.into());
        self
    }

    /// Sets the vertex type tag.
    pub fn typed(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Tags the draft with a user-declared subtype.
    pub fn tagged(mut self, type_tag: impl Into<String>) -> Self {
        self.metadata.type_tag = type_tag.into();
        self
    }
}

/// A directed connection between two nodes.
///
/// Invariants
/// - `source`/`target` reference nodes by id only; the endpoints need not
///   exist yet (clients may construct edges ahead of nodes). Algorithms skip
///   neighbors that cannot be resolved.
/// - While the edge is live, the adapter maintains the four edge indices
///   (`by_source`, `by_target`, `by_type`, `by_source_type`) in lockstep
///   with this record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Unique id within the store's edge table.
    pub id: EntityId,
    /// Source node id.
    pub source: EntityId,
    /// Target node id.
    pub target: EntityId,
    /// Optional relationship label; indexed when present.
    pub edge_type: Option<String>,
    /// Free-form payload. `data["weight"]` is the conventional weight slot.
    pub data: DataMap,
    /// Adapter-stamped bookkeeping.
    pub metadata: Metadata,
}

impl EdgeRecord {
    /// A draft edge with a freshly minted id.
    pub fn new(source: impl Into<EntityId>, target: impl Into<EntityId>, data: DataMap) -> Self {
        Self {
            id: generate_id(),
            source: source.into(),
            target: target.into(),
            edge_type: None,
            data,
            metadata: Metadata::draft(EntityKind::Edge),
        }
    }

    /// Replaces the generated id with a caller-chosen one.
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the relationship label.
    pub fn typed(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    /// Tags the draft with a user-declared subtype.
    pub fn tagged(mut self, type_tag: impl Into<String>) -> Self {
        self.metadata.type_tag = type_tag.into();
        self
    }
}
