// SPDX-License-Identifier: Apache-2.0
//! Weighted shortest path: selection, weights, caching, failure modes.

use arbor_store::{
    stop, ShortestPathOptions, StoreError, Traversal, TraversalOutput,
};

mod common;
use common::{boot, put_node, put_weighted_edge};

fn shortest(
    store: &arbor_store::Store,
    source: &str,
    target: &str,
    options: ShortestPathOptions,
) -> Result<(Vec<String>, f64), StoreError> {
    store
        .traverse(Traversal::ShortestPath {
            source: source.to_owned(),
            target: target.to_owned(),
            options,
        })
        .map(|output| match output {
            TraversalOutput::Path {
                nodes,
                total_weight,
            } => (nodes, total_weight),
            other => panic!("unexpected output: {other:?}"),
        })
}

fn weighted_square(store: &arbor_store::Store) {
    // a→b:1, a→c:5, b→c:1, c→d:1, b→d:10
    for id in ["a", "b", "c", "d"] {
        put_node(store, id);
    }
    put_weighted_edge(store, "ab", "a", "b", 1.0);
    put_weighted_edge(store, "ac", "a", "c", 5.0);
    put_weighted_edge(store, "bc", "b", "c", 1.0);
    put_weighted_edge(store, "cd", "c", "d", 1.0);
    put_weighted_edge(store, "bd", "b", "d", 10.0);
}

#[test]
fn picks_the_cheapest_route() {
    let store = boot("path-cheapest");
    weighted_square(&store);
    let result = shortest(&store, "a", "d", ShortestPathOptions::default());
    assert_eq!(
        result,
        Ok((
            vec!["a".to_owned(), "b".to_owned(), "c".to_owned(), "d".to_owned()],
            3.0
        ))
    );
    let _ = stop("path-cheapest");
}

#[test]
fn missing_weights_use_the_default() {
    let store = boot("path-default-weight");
    for id in ["a", "b", "c"] {
        put_node(&store, id);
    }
    // No weight property at all: every hop costs default_weight.
    common::put_edge(&store, "ab", "a", "b", "k");
    common::put_edge(&store, "bc", "b", "c", "k");
    let result = shortest(&store, "a", "c", ShortestPathOptions::default());
    assert_eq!(
        result,
        Ok((vec!["a".to_owned(), "b".to_owned(), "c".to_owned()], 2.0))
    );

    let doubled = shortest(
        &store,
        "a",
        "c",
        ShortestPathOptions {
            default_weight: 2.0,
            use_cache: false,
            ..ShortestPathOptions::default()
        },
    );
    assert_eq!(
        doubled,
        Ok((vec!["a".to_owned(), "b".to_owned(), "c".to_owned()], 4.0))
    );
    let _ = stop("path-default-weight");
}

#[test]
fn source_equals_target_is_a_trivial_path() {
    let store = boot("path-trivial");
    put_node(&store, "a");
    let result = shortest(&store, "a", "a", ShortestPathOptions::default());
    assert_eq!(result, Ok((vec!["a".to_owned()], 0.0)));
    let _ = stop("path-trivial");
}

#[test]
fn unknown_endpoints_and_unreachable_targets_fail_distinctly() {
    let store = boot("path-failures");
    weighted_square(&store);
    put_node(&store, "island");

    let missing = shortest(&store, "a", "ghost", ShortestPathOptions::default());
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));

    let unreachable = shortest(&store, "a", "island", ShortestPathOptions::default());
    assert_eq!(
        unreachable,
        Err(StoreError::NoPathExists {
            source: "a".to_owned(),
            target: "island".to_owned()
        })
    );
    let _ = stop("path-failures");
}

#[test]
fn preferring_higher_weights_inverts_selection() {
    let store = boot("path-inversion");
    // Two disjoint routes a→d: light (1,1) via b and heavy (10,10) via c.
    for id in ["a", "b", "c", "d"] {
        put_node(&store, id);
    }
    put_weighted_edge(&store, "ab", "a", "b", 1.0);
    put_weighted_edge(&store, "bd", "b", "d", 1.0);
    put_weighted_edge(&store, "ac", "a", "c", 10.0);
    put_weighted_edge(&store, "cd", "c", "d", 10.0);

    let heavy = shortest(
        &store,
        "a",
        "d",
        ShortestPathOptions {
            prefer_lower_weights: false,
            use_cache: false,
            ..ShortestPathOptions::default()
        },
    );
    // Selection runs on reciprocals; the reported total sums stored weights.
    assert_eq!(
        heavy,
        Ok((vec!["a".to_owned(), "c".to_owned(), "d".to_owned()], 20.0))
    );
    let _ = stop("path-inversion");
}

#[test]
fn custom_weight_property_is_honored() {
    let store = boot("path-custom-property");
    for id in ["a", "b", "c"] {
        put_node(&store, id);
    }
    let cheap = arbor_store::EdgeRecord::new(
        "a",
        "b",
        common::data(&[("latency", serde_json::json!(3.0))]),
    )
    .with_id("ab");
    let cheaper = arbor_store::EdgeRecord::new(
        "b",
        "c",
        common::data(&[("latency", serde_json::json!(4.0))]),
    )
    .with_id("bc");
    assert!(store.insert_edge(cheap).is_ok());
    assert!(store.insert_edge(cheaper).is_ok());

    let result = shortest(
        &store,
        "a",
        "c",
        ShortestPathOptions {
            weight_property: "latency".to_owned(),
            ..ShortestPathOptions::default()
        },
    );
    assert_eq!(
        result,
        Ok((vec!["a".to_owned(), "b".to_owned(), "c".to_owned()], 7.0))
    );
    let _ = stop("path-custom-property");
}

#[test]
fn cached_paths_are_dropped_when_edges_change() {
    let store = boot("path-cache-invalidation");
    weighted_square(&store);
    let first = shortest(&store, "a", "d", ShortestPathOptions::default());
    assert!(first.as_ref().is_ok_and(|(_, w)| *w == 3.0));

    // A new cheap direct edge must not be masked by the cached result.
    put_weighted_edge(&store, "ad", "a", "d", 0.5);
    let second = shortest(&store, "a", "d", ShortestPathOptions::default());
    assert_eq!(second, Ok((vec!["a".to_owned(), "d".to_owned()], 0.5)));
    let _ = stop("path-cache-invalidation");
}

#[test]
fn large_frontiers_relax_in_parallel_to_the_same_answer() {
    let store = boot("path-parallel-frontier");
    put_node(&store, "hub");
    put_node(&store, "goal");
    // 120 spokes force the chunked parallel relaxation path.
    for i in 0..120 {
        let spoke = format!("s{i:03}");
        put_node(&store, &spoke);
        put_weighted_edge(&store, &format!("h{i:03}"), "hub", &spoke, 1.0 + f64::from(i));
    }
    // Only one spoke continues to the goal.
    put_weighted_edge(&store, "win", "s007", "goal", 1.0);
    let result = shortest(&store, "hub", "goal", ShortestPathOptions::default());
    assert_eq!(
        result,
        Ok((
            vec!["hub".to_owned(), "s007".to_owned(), "goal".to_owned()],
            9.0
        ))
    );
    let _ = stop("path-parallel-frontier");
}
