// SPDX-License-Identifier: Apache-2.0
//! Edge index maintenance observed through the query surface.

use arbor_store::{stop, DataMap, EdgeRecord, StoreError};
use serde_json::json;

mod common;
use common::{boot, data, put_edge, put_node};

fn seed_star(store: &arbor_store::Store) {
    for id in ["a", "b", "c"] {
        put_node(store, id);
    }
    put_edge(store, "e1", "a", "b", "k");
    put_edge(store, "e2", "a", "c", "k");
    put_edge(store, "e3", "a", "b", "m");
}

fn edge_ids(hits: &[(String, EdgeRecord)]) -> Vec<String> {
    hits.iter().map(|(_, e)| e.id.clone()).collect()
}

#[test]
fn typed_lookup_tracks_deletion() {
    let store = boot("idx-typed-deletion");
    seed_star(&store);

    let mut hits = edge_ids(&store.outgoing_edges_by_type("a", "k"));
    hits.sort();
    assert_eq!(hits, ["e1", "e2"]);

    assert_eq!(store.delete_edge("e1"), Ok(()));
    assert_eq!(edge_ids(&store.outgoing_edges_by_type("a", "k")), ["e2"]);

    // The other index sides forgot e1 too.
    let outgoing = edge_ids(&store.outgoing_edges("a"));
    assert!(!outgoing.contains(&"e1".to_owned()));
    assert_eq!(
        edge_ids(&store.outgoing_edges_by_type_optimized("a", "k")),
        ["e2"]
    );
    assert!(store
        .incoming_edges("b")
        .iter()
        .all(|(_, e)| e.id != "e1"));
    let _ = stop("idx-typed-deletion");
}

#[test]
fn all_lookup_strategies_agree() {
    let store = boot("idx-strategy-agreement");
    seed_star(&store);

    let baseline = edge_ids(&store.outgoing_edges_by_type("a", "k"));
    let optimized = edge_ids(&store.outgoing_edges_by_type_optimized("a", "k"));
    let parallel = edge_ids(&store.outgoing_edges_by_type_parallel("a", "k"));
    let adaptive = edge_ids(&store.outgoing_edges_adaptive("a", Some("k")));
    assert_eq!(baseline, optimized);
    assert_eq!(baseline, parallel);
    assert_eq!(baseline, adaptive);
    let _ = stop("idx-strategy-agreement");
}

#[test]
fn incoming_edges_mirror_outgoing() {
    let store = boot("idx-incoming");
    seed_star(&store);
    let into_b = store.incoming_edges("b");
    assert_eq!(edge_ids(&into_b), ["e1", "e3"]);
    assert!(into_b.iter().all(|(source, _)| source == "a"));
    let _ = stop("idx-incoming");
}

#[test]
fn edges_by_type_spans_sources() {
    let store = boot("idx-by-type");
    seed_star(&store);
    put_node(&store, "d");
    put_edge(&store, "e4", "b", "d", "k");
    let mut typed: Vec<String> = store.edges_by_type("k").iter().map(|e| e.id.clone()).collect();
    typed.sort();
    assert_eq!(typed, ["e1", "e2", "e4"]);
    assert!(store.edges_by_type("zzz").is_empty());
    let _ = stop("idx-by-type");
}

#[test]
fn rewiring_updates_move_the_edge_between_keys() {
    let store = boot("idx-rewire");
    seed_star(&store);

    // Retype e1 from k to m.
    let rewired = EdgeRecord::new("a", "b", DataMap::new()).with_id("e1").typed("m");
    let updated = store.update_edge(rewired);
    assert!(updated.as_ref().is_ok_and(|e| e.metadata.version == 2));

    assert_eq!(edge_ids(&store.outgoing_edges_by_type("a", "k")), ["e2"]);
    let mut m_edges = edge_ids(&store.outgoing_edges_by_type("a", "m"));
    m_edges.sort();
    assert_eq!(m_edges, ["e1", "e3"]);
    let _ = stop("idx-rewire");
}

#[test]
fn payload_typed_edges_are_found_through_the_fallback() {
    let store = boot("idx-fallback");
    put_node(&store, "a");
    put_node(&store, "b");
    // Typed only in the payload, so the composite index has no entry.
    let draft = EdgeRecord::new("a", "b", data(&[("type", json!("soft"))])).with_id("e1");
    assert!(store.insert_edge(draft).is_ok());

    assert_eq!(
        edge_ids(&store.outgoing_edges_by_type_optimized("a", "soft")),
        ["e1"]
    );
    assert_eq!(
        edge_ids(&store.outgoing_edges_by_type_parallel("a", "soft")),
        ["e1"]
    );
    // The pure intersection baseline only sees indexed types.
    assert!(store.outgoing_edges_by_type("a", "soft").is_empty());
    let _ = stop("idx-fallback");
}

#[test]
fn dangling_edges_are_indexed_but_harmless() {
    let store = boot("idx-dangling");
    put_node(&store, "a");
    // Target never inserted; the edge is indexed unconditionally.
    put_edge(&store, "e1", "a", "ghost", "k");
    let hits = store.outgoing_edges_by_type("a", "k");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, "ghost");
    let _ = stop("idx-dangling");
}

#[test]
fn edge_updates_reject_unknown_ids() {
    let store = boot("idx-update-unknown");
    let err = store.update_edge(EdgeRecord::new("a", "b", DataMap::new()).with_id("nope"));
    assert!(matches!(err, Err(StoreError::NotFound { .. })));
    let _ = stop("idx-update-unknown");
}
