// SPDX-License-Identifier: Apache-2.0
//! Graph algorithms and the traversal dispatcher.
//!
//! Every algorithm takes the store handle explicitly and enumerates
//! neighbors through the adaptive query helpers — there is no hidden
//! context and no raw-table access from algorithm code. Tombstoned nodes
//! and edges are treated as absent throughout; dangling edges are skipped
//! at the point their endpoint fails to resolve.
use std::str::FromStr;

use arbor_model::{EdgeRecord, EntityId, NodeRecord, StoreError};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde_json::Value;

use crate::store::Store;

mod bfs;
mod components;
mod dijkstra;
mod dsu;
mod mst;
mod pagerank;
mod weight;

/// Which side of an edge a traversal follows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Follow edges from source to target.
    #[default]
    Outgoing,
    /// Follow edges from target to source.
    Incoming,
    /// Follow edges both ways (undirected view).
    Both,
}

/// Algorithm tags accepted by the traversal dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// Breadth-first traversal.
    Bfs,
    /// Weighted shortest path (Dijkstra).
    ShortestPath,
    /// Iterative PageRank.
    PageRank,
    /// Connected components via union-find.
    ConnectedComponents,
    /// Kruskal spanning tree / forest.
    MinimumSpanningTree,
}

impl FromStr for Algorithm {
    type Err = StoreError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "bfs" => Ok(Self::Bfs),
            "shortest_path" => Ok(Self::ShortestPath),
            "page_rank" | "pagerank" => Ok(Self::PageRank),
            "connected_components" => Ok(Self::ConnectedComponents),
            "minimum_spanning_tree" | "mst" => Ok(Self::MinimumSpanningTree),
            other => Err(StoreError::UnsupportedAlgorithm(other.to_owned())),
        }
    }
}

fn default_max_depth() -> usize {
    10
}

fn default_weight_property() -> String {
    "weight".to_owned()
}

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_iterations() -> usize {
    20
}

fn default_damping() -> f64 {
    0.85
}

fn default_both() -> Direction {
    Direction::Both
}

/// Options for breadth-first traversal.
#[derive(Clone, Debug, Deserialize)]
pub struct BfsOptions {
    /// Maximum hop count from the start node.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Edge direction to follow.
    #[serde(default)]
    pub direction: Direction,
    /// Restrict traversal to edges of this type.
    #[serde(default)]
    pub edge_type: Option<String>,
    /// When set *and* an `edge_type` was given, a missing start node yields
    /// a single stub record carrying the start id instead of an error. Off
    /// by default.
    #[serde(default)]
    pub best_effort: bool,
    /// Wall-clock budget override in milliseconds; `None` uses the store's
    /// configured budget.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for BfsOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            direction: Direction::Outgoing,
            edge_type: None,
            best_effort: false,
            timeout_ms: None,
        }
    }
}

/// Options for weighted shortest path.
#[derive(Clone, Debug, Deserialize)]
pub struct ShortestPathOptions {
    /// Payload key holding the edge weight.
    #[serde(default = "default_weight_property")]
    pub weight_property: String,
    /// Weight used when the property is missing or non-numeric.
    #[serde(default = "default_weight")]
    pub default_weight: f64,
    /// Minimize (true) or maximize (false) path weight. Maximization
    /// selects on reciprocal weights; see the module docs of `weight`.
    #[serde(default = "default_true")]
    pub prefer_lower_weights: bool,
    /// Edge direction to follow.
    #[serde(default)]
    pub direction: Direction,
    /// Restrict relaxation to edges of this type.
    #[serde(default)]
    pub edge_type: Option<String>,
    /// Consult and fill the path cache.
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

impl Default for ShortestPathOptions {
    fn default() -> Self {
        Self {
            weight_property: default_weight_property(),
            default_weight: default_weight(),
            prefer_lower_weights: true,
            direction: Direction::Outgoing,
            edge_type: None,
            use_cache: true,
        }
    }
}

/// Options for PageRank.
#[derive(Clone, Debug, Deserialize)]
pub struct PageRankOptions {
    /// Number of iterations.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Damping factor `d` in `(1-d)/N + d·Σ ...`.
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Payload key holding the edge weight.
    #[serde(default = "default_weight_property")]
    pub weight_property: String,
    /// Weight used when the property is missing or non-numeric.
    #[serde(default = "default_weight")]
    pub default_weight: f64,
}

impl Default for PageRankOptions {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            damping: default_damping(),
            weight_property: default_weight_property(),
            default_weight: default_weight(),
        }
    }
}

/// Options for connected components.
#[derive(Clone, Debug, Deserialize)]
pub struct ComponentsOptions {
    /// Restrict unions to edges of this type.
    #[serde(default)]
    pub edge_type: Option<String>,
    /// Accepted for interface symmetry; unions are inherently undirected,
    /// so every direction produces the same partition.
    #[serde(default = "default_both")]
    pub direction: Direction,
}

impl Default for ComponentsOptions {
    fn default() -> Self {
        Self {
            edge_type: None,
            direction: Direction::Both,
        }
    }
}

/// Options for the Kruskal spanning tree.
#[derive(Clone, Debug, Deserialize)]
pub struct SpanningTreeOptions {
    /// Payload key holding the edge weight.
    #[serde(default = "default_weight_property")]
    pub weight_property: String,
    /// Weight used when the property is missing or non-numeric.
    #[serde(default = "default_weight")]
    pub default_weight: f64,
    /// Minimum (true) or maximum (false) spanning tree.
    #[serde(default = "default_true")]
    pub prefer_lower_weights: bool,
    /// Restrict candidates to edges of this type.
    #[serde(default)]
    pub edge_type: Option<String>,
}

impl Default for SpanningTreeOptions {
    fn default() -> Self {
        Self {
            weight_property: default_weight_property(),
            default_weight: default_weight(),
            prefer_lower_weights: true,
            edge_type: None,
        }
    }
}

/// A typed traversal request.
#[derive(Clone, Debug)]
pub enum Traversal {
    /// Breadth-first traversal from a start node.
    Bfs {
        /// Start node id.
        start: EntityId,
        /// Traversal options.
        options: BfsOptions,
    },
    /// Weighted shortest path between two nodes.
    ShortestPath {
        /// Source node id.
        source: EntityId,
        /// Target node id.
        target: EntityId,
        /// Path options.
        options: ShortestPathOptions,
    },
    /// PageRank over the whole store.
    PageRank(PageRankOptions),
    /// Connected components over the whole store.
    ConnectedComponents(ComponentsOptions),
    /// Spanning tree / forest over the whole store.
    MinimumSpanningTree(SpanningTreeOptions),
}

impl Traversal {
    /// Parses a frontend-style request: an algorithm tag plus a JSON
    /// parameter map. Unknown tags are `UnsupportedAlgorithm`; malformed
    /// parameter shapes are `InvalidParams`.
    pub fn from_json(algorithm: &str, params: &Value) -> Result<Self, StoreError> {
        let algorithm = Algorithm::from_str(algorithm)?;
        if !params.is_object() {
            return Err(StoreError::InvalidParams(
                "parameters must be a JSON object".to_owned(),
            ));
        }
        let invalid = |err: serde_json::Error| StoreError::InvalidParams(err.to_string());
        match algorithm {
            Algorithm::Bfs => Ok(Self::Bfs {
                start: string_param(params, "start")?,
                options: serde_json::from_value(params.clone()).map_err(invalid)?,
            }),
            Algorithm::ShortestPath => Ok(Self::ShortestPath {
                source: string_param(params, "source")?,
                target: string_param(params, "target")?,
                options: serde_json::from_value(params.clone()).map_err(invalid)?,
            }),
            Algorithm::PageRank => Ok(Self::PageRank(
                serde_json::from_value(params.clone()).map_err(invalid)?,
            )),
            Algorithm::ConnectedComponents => Ok(Self::ConnectedComponents(
                serde_json::from_value(params.clone()).map_err(invalid)?,
            )),
            Algorithm::MinimumSpanningTree => Ok(Self::MinimumSpanningTree(
                serde_json::from_value(params.clone()).map_err(invalid)?,
            )),
        }
    }
}

fn string_param(params: &Value, key: &str) -> Result<String, StoreError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| StoreError::InvalidParams(format!("missing string parameter `{key}`")))
}

/// Result of a traversal.
#[derive(Clone, Debug, PartialEq)]
pub enum TraversalOutput {
    /// BFS: reachable nodes in traversal order, start node first.
    /// `truncated` is set when the wall-clock budget expired and the list
    /// is the partial prefix collected so far.
    Bfs {
        /// Ordered reachable nodes.
        nodes: Vec<NodeRecord>,
        /// Whether the budget expired before the frontier drained.
        truncated: bool,
    },
    /// Shortest path: node sequence from source to target inclusive, plus
    /// the sum of stored weights along the chosen edges.
    Path {
        /// Node ids along the path.
        nodes: Vec<EntityId>,
        /// Total stored weight.
        total_weight: f64,
    },
    /// PageRank: node id → score. Scores sum to 1.
    Ranks(std::collections::BTreeMap<EntityId, f64>),
    /// Connected components: each inner list is one component's node ids,
    /// ascending; components ordered by their smallest member.
    Components(Vec<Vec<EntityId>>),
    /// Spanning tree / forest edges plus their stored-weight sum.
    SpanningTree {
        /// Accepted edges.
        edges: Vec<EdgeRecord>,
        /// Total stored weight.
        total_weight: f64,
    },
}

impl Store {
    /// Dispatches a traversal request.
    pub fn traverse(&self, request: Traversal) -> Result<TraversalOutput, StoreError> {
        match request {
            Traversal::Bfs { start, options } => bfs::run(self, &start, &options),
            Traversal::ShortestPath {
                source,
                target,
                options,
            } => dijkstra::run(self, &source, &target, &options),
            Traversal::PageRank(options) => pagerank::run(self, &options),
            Traversal::ConnectedComponents(options) => components::run(self, &options),
            Traversal::MinimumSpanningTree(options) => mst::run(self, &options),
        }
    }
}

/// Neighbor enumeration shared by BFS and Dijkstra: `(neighbor id, edge)`
/// pairs in the requested direction, deduplicated for the undirected view.
pub(crate) fn neighbors(
    store: &Store,
    node: &str,
    direction: Direction,
    edge_type: Option<&str>,
) -> Vec<(EntityId, EdgeRecord)> {
    match direction {
        Direction::Outgoing => store.outgoing_edges_adaptive(node, edge_type),
        Direction::Incoming => incoming(store, node, edge_type),
        Direction::Both => {
            let mut seen: FxHashSet<(EntityId, EntityId)> = FxHashSet::default();
            let mut merged = Vec::new();
            for (neighbor, edge) in store
                .outgoing_edges_adaptive(node, edge_type)
                .into_iter()
                .chain(incoming(store, node, edge_type))
            {
                if seen.insert((neighbor.clone(), edge.id.clone())) {
                    merged.push((neighbor, edge));
                }
            }
            merged
        }
    }
}

fn incoming(store: &Store, node: &str, edge_type: Option<&str>) -> Vec<(EntityId, EdgeRecord)> {
    let hits = store.incoming_edges(node);
    match edge_type {
        None => hits,
        Some(t) => hits
            .into_iter()
            .filter(|(_, edge)| crate::store::effective_edge_type(edge) == Some(t))
            .collect(),
    }
}
