// SPDX-License-Identifier: Apache-2.0
//! Concurrency contract: serialized writers, concurrent readers.

use std::sync::Arc;
use std::thread;

use arbor_store::{stop, DataMap, Filter, ListOptions, NodeRecord};
use serde_json::json;

mod common;
use common::{boot, data, put_node};

#[test]
fn disjoint_writers_all_commit() {
    let store = boot("conc-disjoint-writers");
    let mut handles = Vec::new();
    for worker in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let id = format!("w{worker}-n{i}");
                let inserted = store.insert_node(NodeRecord::new(DataMap::new()).with_id(id));
                assert!(inserted.is_ok());
            }
        }));
    }
    for handle in handles {
        assert!(handle.join().is_ok());
    }
    assert_eq!(store.node_count(), 200);
    let _ = stop("conc-disjoint-writers");
}

#[test]
fn contended_updates_on_one_id_serialize() {
    let store = boot("conc-contended-updates");
    put_node(&store, "hot");
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for _ in 0..5 {
                let updated = store.update_node(
                    NodeRecord::new(data(&[("touched", json!(true))])).with_id("hot"),
                );
                assert!(updated.is_ok());
            }
        }));
    }
    for handle in handles {
        assert!(handle.join().is_ok());
    }
    // Every update serialized: 1 insert + 40 updates.
    let record = store.get_node("hot");
    assert!(record.is_ok_and(|n| n.metadata.version == 41));
    let _ = stop("conc-contended-updates");
}

#[test]
fn readers_run_alongside_writers_without_torn_reads() {
    let store = boot("conc-readers");
    for i in 0..50 {
        put_node(&store, &format!("seed{i:02}"));
    }
    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..50 {
                let id = format!("new{i:02}");
                assert!(store
                    .insert_node(NodeRecord::new(DataMap::new()).with_id(id))
                    .is_ok());
            }
        })
    };
    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..100 {
                let listed = store.nodes(&Filter::new(), &ListOptions::default());
                // Listings observe committed state only: never fewer than
                // the seeds, never more than the final population.
                assert!(listed.len() >= 50);
                assert!(listed.len() <= 100);
            }
        })
    };
    assert!(writer.join().is_ok());
    assert!(reader.join().is_ok());
    assert_eq!(store.node_count(), 100);
    let _ = stop("conc-readers");
}
