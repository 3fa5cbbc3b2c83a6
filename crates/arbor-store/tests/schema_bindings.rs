// SPDX-License-Identifier: Apache-2.0
//! Subtype schemas at the store surface: field validation and edge binding
//! constraints.

use arbor_store::{
    stop, DataMap, EdgeRecord, FieldSpec, FieldType, NodeRecord, StoreConfig, StoreError,
    TypeSchema,
};
use serde_json::json;

mod common;
use common::{boot_with, data};

fn employment_config(name: &str) -> StoreConfig {
    StoreConfig::new(name)
        .with_schema(TypeSchema::node(
            "person",
            vec![FieldSpec::required("name", FieldType::String)],
        ))
        .with_schema(TypeSchema::node("company", Vec::new()))
        .with_schema(
            TypeSchema::edge(
                "employment",
                vec![FieldSpec::optional("since", FieldType::Integer)],
            )
            .from_types(vec!["person".to_owned()])
            .to_types(vec!["company".to_owned()]),
        )
}

#[test]
fn binding_constraints_check_resolvable_endpoints() {
    let store = boot_with(employment_config("schema-bindings"));
    let person = NodeRecord::new(data(&[("name", json!("Alice"))]))
        .with_id("alice")
        .typed("person")
        .tagged("person");
    let company = NodeRecord::new(DataMap::new())
        .with_id("acme")
        .typed("company")
        .tagged("company");
    assert!(store.insert_node(person).is_ok());
    assert!(store.insert_node(company).is_ok());

    let valid = EdgeRecord::new("alice", "acme", DataMap::new())
        .with_id("job1")
        .typed("works_at")
        .tagged("employment");
    assert!(store.insert_edge(valid).is_ok());

    // The source resolves to a company; the schema requires a person.
    let backwards = EdgeRecord::new("acme", "alice", DataMap::new())
        .with_id("job2")
        .tagged("employment");
    assert!(matches!(
        store.insert_edge(backwards),
        Err(StoreError::SchemaViolation { .. })
    ));
    let _ = stop("schema-bindings");
}

#[test]
fn dangling_endpoints_pass_binding_checks() {
    let store = boot_with(employment_config("schema-dangling"));
    // Neither endpoint exists yet; constraints are best-effort.
    let ahead_of_nodes = EdgeRecord::new("ghost1", "ghost2", DataMap::new())
        .with_id("early")
        .tagged("employment");
    assert!(store.insert_edge(ahead_of_nodes).is_ok());
    let _ = stop("schema-dangling");
}

#[test]
fn edge_field_schemas_validate_payloads() {
    let store = boot_with(employment_config("schema-edge-fields"));
    let bad_since = EdgeRecord::new("a", "b", data(&[("since", json!("march"))]))
        .with_id("e1")
        .tagged("employment");
    assert!(matches!(
        store.insert_edge(bad_since),
        Err(StoreError::SchemaViolation { .. })
    ));
    let good_since = EdgeRecord::new("a", "b", data(&[("since", json!(2021))]))
        .with_id("e1")
        .tagged("employment");
    assert!(store.insert_edge(good_since).is_ok());
    let _ = stop("schema-edge-fields");
}

#[test]
fn schemas_registered_after_boot_apply_to_later_writes() {
    let store = boot_with(StoreConfig::new("schema-late"));
    assert!(store
        .insert_node(NodeRecord::new(DataMap::new()).with_id("n1").tagged("strict"))
        .is_ok());
    store.register_schema(TypeSchema::node(
        "strict",
        vec![FieldSpec::required("label", FieldType::String)],
    ));
    assert!(matches!(
        store.insert_node(NodeRecord::new(DataMap::new()).with_id("n2").tagged("strict")),
        Err(StoreError::SchemaViolation { .. })
    ));
    let _ = stop("schema-late");
}

#[test]
fn traverse_requests_parse_from_frontend_json() {
    let store = boot_with(StoreConfig::new("schema-from-json"));
    common::put_node(&store, "a");
    common::put_node(&store, "b");
    common::put_edge(&store, "e1", "a", "b", "k");

    let request = arbor_store::Traversal::from_json(
        "bfs",
        &json!({ "start": "a", "max_depth": 3, "direction": "outgoing" }),
    );
    let request = request.unwrap_or_else(|err| panic!("parse: {err}"));
    let output = store.traverse(request);
    let output = output.unwrap_or_else(|err| panic!("traverse: {err}"));
    assert_eq!(common::bfs_ids(&output), ["a", "b"]);

    let unknown = arbor_store::Traversal::from_json("dfs", &json!({}));
    assert!(matches!(
        unknown,
        Err(StoreError::UnsupportedAlgorithm(tag)) if tag == "dfs"
    ));
    let _ = stop("schema-from-json");
}
