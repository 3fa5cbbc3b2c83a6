// SPDX-License-Identifier: Apache-2.0
#![allow(dead_code)]

use std::sync::Arc;

use arbor_store::{
    start, DataMap, EdgeRecord, NodeRecord, Store, StoreConfig,
};
use serde_json::{json, Value};

/// Boots a uniquely named store for one test. The registry is process-wide,
/// so every test must use its own name.
pub fn boot(name: &str) -> Arc<Store> {
    match start(StoreConfig::new(name)) {
        Ok(store) => store,
        Err(err) => panic!("failed to start store {name}: {err}"),
    }
}

/// Boots a store from a prepared configuration.
pub fn boot_with(config: StoreConfig) -> Arc<Store> {
    let name = config.name.clone();
    match start(config) {
        Ok(store) => store,
        Err(err) => panic!("failed to start store {name}: {err}"),
    }
}

/// Builds a payload map from key/value pairs.
pub fn data(pairs: &[(&str, Value)]) -> DataMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

/// Inserts a bare node with the given id.
pub fn put_node(store: &Store, id: &str) -> NodeRecord {
    match store.insert_node(NodeRecord::new(DataMap::new()).with_id(id)) {
        Ok(record) => record,
        Err(err) => panic!("insert node {id}: {err}"),
    }
}

/// Inserts a typed edge `source → target`.
pub fn put_edge(store: &Store, id: &str, source: &str, target: &str, edge_type: &str) -> EdgeRecord {
    let draft = EdgeRecord::new(source, target, DataMap::new())
        .with_id(id)
        .typed(edge_type);
    match store.insert_edge(draft) {
        Ok(record) => record,
        Err(err) => panic!("insert edge {id}: {err}"),
    }
}

/// Inserts an untyped, weighted edge `source → target`.
pub fn put_weighted_edge(
    store: &Store,
    id: &str,
    source: &str,
    target: &str,
    weight: f64,
) -> EdgeRecord {
    let draft = EdgeRecord::new(source, target, data(&[("weight", json!(weight))])).with_id(id);
    match store.insert_edge(draft) {
        Ok(record) => record,
        Err(err) => panic!("insert edge {id}: {err}"),
    }
}

/// The ids of a BFS result, in traversal order.
pub fn bfs_ids(output: &arbor_store::TraversalOutput) -> Vec<String> {
    match output {
        arbor_store::TraversalOutput::Bfs { nodes, .. } => {
            nodes.iter().map(|n| n.id.clone()).collect()
        }
        other => panic!("expected BFS output, got {other:?}"),
    }
}
