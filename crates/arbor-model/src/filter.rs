// SPDX-License-Identifier: Apache-2.0
//! Structured filter maps used by listings and event subscriptions.
//!
//! A filter maps a field key to a [`Predicate`]: a literal (equality match),
//! an arbitrary boolean test, or a nested filter. The reserved keys
//! `metadata` and `data` recurse into the record's metadata fields and
//! payload map respectively; every other key names a top-level record field
//! (`id`, `source`, `target`, `type`, ...). An empty filter matches every
//! record handed to it — tombstone exclusion happens at the table layer,
//! before filters run.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::metadata::Metadata;
use crate::record::{DataMap, EdgeRecord, GraphRecord, NodeRecord};

/// Boxed predicate function over a single field value.
pub type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// One filter entry: literal equality, a boolean test, or recursion.
#[derive(Clone)]
pub enum Predicate {
    /// Match when the field equals this value exactly.
    Literal(Value),
    /// Match when the test returns true for the field value. A missing
    /// field never matches.
    Test(PredicateFn),
    /// Recurse into a map-shaped field (`metadata`, `data`, or any payload
    /// value that is itself an object).
    Nested(Filter),
}

impl Predicate {
    /// Wraps a closure as a [`Predicate::Test`].
    pub fn test(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self::Test(Arc::new(f))
    }

    /// Applies the predicate to a field value (`None` = field absent).
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Literal(expected) => value == Some(expected),
            Self::Test(f) => value.is_some_and(|v| f(v)),
            Self::Nested(filter) => match value {
                Some(Value::Object(map)) => {
                    filter.matches_lookup(&|key| map.get(key).cloned())
                }
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::Test(_) => f.write_str("Test(<fn>)"),
            Self::Nested(inner) => f.debug_tuple("Nested").field(inner).finish(),
        }
    }
}

/// A structured filter: field key → predicate.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    entries: BTreeMap<String, Predicate>,
}

impl Filter {
    /// An empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a literal equality entry.
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .insert(key.into(), Predicate::Literal(value.into()));
        self
    }

    /// Adds a boolean test entry.
    pub fn test(
        mut self,
        key: impl Into<String>,
        f: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.entries.insert(key.into(), Predicate::test(f));
        self
    }

    /// Adds a nested filter under an arbitrary key.
    pub fn nested(mut self, key: impl Into<String>, filter: Filter) -> Self {
        self.entries.insert(key.into(), Predicate::Nested(filter));
        self
    }

    /// Recurses into the record's metadata (reserved key `metadata`).
    pub fn metadata(self, filter: Filter) -> Self {
        self.nested("metadata", filter)
    }

    /// Recurses into the record's payload map (reserved key `data`).
    pub fn data(self, filter: Filter) -> Self {
        self.nested("data", filter)
    }

    /// True when the filter has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Predicate)> {
        self.entries.iter()
    }

    /// Evaluates every entry against a record.
    pub fn matches<R: Filterable>(&self, record: &R) -> bool {
        self.entries.iter().all(|(key, pred)| match key.as_str() {
            "metadata" => Self::matches_reserved(pred, &|k| record.meta().field(k)),
            "data" => Self::matches_reserved(pred, &|k| record.data_map().get(k).cloned()),
            _ => pred.matches(record.field(key).as_ref()),
        })
    }

    /// Evaluates every entry against an arbitrary key lookup. Used for the
    /// reserved-key recursion and by the subscription bus, whose events have
    /// their own reserved keys.
    pub fn matches_lookup(&self, lookup: &dyn Fn(&str) -> Option<Value>) -> bool {
        self.entries
            .iter()
            .all(|(key, pred)| pred.matches(lookup(key).as_ref()))
    }

    fn matches_reserved(pred: &Predicate, lookup: &dyn Fn(&str) -> Option<Value>) -> bool {
        match pred {
            Predicate::Nested(filter) => filter.matches_lookup(lookup),
            // A literal object doubles as shorthand for a nested all-equal
            // filter; anything else is applied to nothing and fails.
            Predicate::Literal(Value::Object(map)) => map
                .iter()
                .all(|(k, expected)| lookup(k).as_ref() == Some(expected)),
            _ => false,
        }
    }
}

/// Field-view trait connecting records to the filter language.
pub trait Filterable {
    /// Top-level field lookup (`id`, `name`, `source`, `type`, ...).
    fn field(&self, key: &str) -> Option<Value>;
    /// The payload map, for the reserved `data` key.
    fn data_map(&self) -> &DataMap;
    /// The metadata, for the reserved `metadata` key.
    fn meta(&self) -> &Metadata;
}

impl Filterable for GraphRecord {
    fn field(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.clone())),
            "name" => Some(
                self.name
                    .as_ref()
                    .map_or(Value::Null, |n| Value::String(n.clone())),
            ),
            _ => None,
        }
    }

    fn data_map(&self) -> &DataMap {
        &self.data
    }

    fn meta(&self) -> &Metadata {
        &self.metadata
    }
}

impl Filterable for NodeRecord {
    fn field(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.clone())),
            "graph_id" => Some(
                self.graph_id
                    .as_ref()
                    .map_or(Value::Null, |g| Value::String(g.clone())),
            ),
            "type" => Some(
                self.node_type
                    .as_ref()
                    .map_or(Value::Null, |t| Value::String(t.clone())),
            ),
            _ => None,
        }
    }

    fn data_map(&self) -> &DataMap {
        &self.data
    }

    fn meta(&self) -> &Metadata {
        &self.metadata
    }
}

impl Filterable for EdgeRecord {
    fn field(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.clone())),
            "source" => Some(Value::String(self.source.clone())),
            "target" => Some(Value::String(self.target.clone())),
            "type" => Some(
                self.edge_type
                    .as_ref()
                    .map_or(Value::Null, |t| Value::String(t.clone())),
            ),
            _ => None,
        }
    }

    fn data_map(&self) -> &DataMap {
        &self.data
    }

    fn meta(&self) -> &Metadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, name: &str) -> NodeRecord {
        let mut data = DataMap::new();
        data.insert("name".to_owned(), json!(name));
        NodeRecord::new(data).with_id(id)
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&node("n1", "Alice")));
    }

    #[test]
    fn literal_field_match() {
        let filter = Filter::new().eq("id", "n1");
        assert!(filter.matches(&node("n1", "Alice")));
        assert!(!filter.matches(&node("n2", "Alice")));
    }

    #[test]
    fn data_recursion_matches_payload_entries() {
        let filter = Filter::new().data(Filter::new().eq("name", "Alice"));
        assert!(filter.matches(&node("n1", "Alice")));
        assert!(!filter.matches(&node("n1", "Bob")));
    }

    #[test]
    fn metadata_recursion_sees_bookkeeping_fields() {
        let mut record = node("n1", "Alice");
        record.metadata.stamp();
        let live = Filter::new().metadata(Filter::new().eq("deleted", false));
        assert!(live.matches(&record));
        record.metadata.tombstone();
        assert!(!live.matches(&record));
    }

    #[test]
    fn predicate_tests_run_against_field_values() {
        let filter = Filter::new().data(Filter::new().test("name", |v| {
            v.as_str().is_some_and(|s| s.starts_with('A'))
        }));
        assert!(filter.matches(&node("n1", "Alice")));
        assert!(!filter.matches(&node("n1", "Bob")));
    }

    #[test]
    fn missing_fields_never_match() {
        let filter = Filter::new().eq("nonexistent", 1);
        assert!(!filter.matches(&node("n1", "Alice")));
        let tested = Filter::new().data(Filter::new().test("absent", |_| true));
        assert!(!tested.matches(&node("n1", "Alice")));
    }

    #[test]
    fn edge_fields_include_endpoints_and_type() {
        let edge = EdgeRecord::new("a", "b", DataMap::new())
            .with_id("e1")
            .typed("k");
        assert!(Filter::new().eq("source", "a").matches(&edge));
        assert!(Filter::new().eq("type", "k").matches(&edge));
        assert!(!Filter::new().eq("target", "c").matches(&edge));
    }
}
