// SPDX-License-Identifier: Apache-2.0
//! The store: CRUD surface, write serialization, event production.
//!
//! One `Store` owns one set of [`Tables`] behind a `parking_lot::RwLock`.
//! Writers serialize on the write guard (arrival order is commit order) and
//! commit the primary row, the index entries, the cache invalidations, and
//! the event enqueue before the guard drops — readers never observe a
//! half-applied write, and subscribers observe events in commit order.
//! Readers share the read guard and run concurrently.
use std::sync::Arc;

use arbor_model::{
    BatchFailure, BatchOutcome, BindingEnd, EdgeRecord, EntityKind, Event, EventKind, Filter,
    GraphRecord, NodeRecord, StoreError, SubscribeOptions, SubscriptionId, Topic, TypeSchema,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use crate::bus::{EventCallback, Subscriber, SubscriptionBus};
use crate::cache::TtlCache;
use crate::config::StoreConfig;
use crate::tables::{page_records, ListOptions, Tables};

/// Eviction slice for the outgoing-edges cache (oldest 20%).
const EDGE_CACHE_EVICT_PERCENT: usize = 20;
/// Eviction slice for the shortest-path cache (oldest 25%).
const PATH_CACHE_EVICT_PERCENT: usize = 25;

/// A running store. Obtain one via [`crate::start`] and address it through
/// the registry; all data operations are methods on this handle.
pub struct Store {
    pub(crate) config: StoreConfig,
    pub(crate) tables: RwLock<Tables>,
    pub(crate) schemas: RwLock<FxHashMap<String, TypeSchema>>,
    pub(crate) edge_cache: TtlCache<(String, String), Vec<(String, EdgeRecord)>>,
    pub(crate) path_cache: TtlCache<[u8; 32], (Vec<String>, f64)>,
    pub(crate) bus: SubscriptionBus,
    pub(crate) pool: rayon::ThreadPool,
}

impl Store {
    /// Builds the store machinery for a configuration. Called by the
    /// registry's `start`; there is no other constructor.
    pub(crate) fn boot(config: StoreConfig) -> Result<Arc<Self>, StoreError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrency.max(1))
            .thread_name(|i| format!("arbor-worker-{i}"))
            .build()
            .map_err(|err| StoreError::InvalidParams(format!("worker pool: {err}")))?;
        let mut schemas = FxHashMap::default();
        for schema in &config.schemas {
            schemas.insert(schema.tag.clone(), schema.clone());
        }
        let store = Self {
            edge_cache: TtlCache::new(
                config.edge_cache.max_size,
                config.edge_cache.ttl_ms,
                EDGE_CACHE_EVICT_PERCENT,
            ),
            path_cache: TtlCache::new(
                config.path_cache.max_size,
                config.path_cache.ttl_ms,
                PATH_CACHE_EVICT_PERCENT,
            ),
            bus: SubscriptionBus::start(&config.name),
            tables: RwLock::new(Tables::new()),
            schemas: RwLock::new(schemas),
            pool,
            config,
        };
        Ok(Arc::new(store))
    }

    /// Releases tables, indices, caches, and subscriptions. Called by the
    /// registry's `stop`; outstanding handles observe an empty store.
    pub(crate) fn teardown(&self) {
        self.bus.shutdown();
        self.tables.write().clear();
        self.edge_cache.clear();
        self.path_cache.clear();
    }

    /// The store's name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The boot configuration, including the recorded `compressed` flag.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Schemas
    // ========================================================================

    /// Registers (or replaces) a subtype schema. Always succeeds.
    pub fn register_schema(&self, schema: TypeSchema) {
        self.schemas.write().insert(schema.tag.clone(), schema);
    }

    fn validate_fields(&self, type_tag: &str, data: &arbor_model::DataMap) -> Result<(), StoreError> {
        match self.schemas.read().get(type_tag) {
            Some(schema) => schema.validate(data),
            None => Ok(()),
        }
    }

    /// Edge binding constraints run against whatever endpoints resolve at
    /// write time; dangling endpoints pass (referential hygiene is
    /// best-effort by design).
    fn validate_bindings(&self, tables: &Tables, edge: &EdgeRecord) -> Result<(), StoreError> {
        let schemas = self.schemas.read();
        let Some(schema) = schemas.get(&edge.metadata.type_tag) else {
            return Ok(());
        };
        let node_type = |id: &str| -> Option<String> {
            tables
                .nodes
                .get(id)
                .filter(|n| n.metadata.is_live())
                .and_then(|n| n.node_type.clone())
        };
        schema.validate_binding(BindingEnd::Source, node_type(&edge.source).as_deref())?;
        schema.validate_binding(BindingEnd::Target, node_type(&edge.target).as_deref())?;
        Ok(())
    }

    // ========================================================================
    // Graphs
    // ========================================================================

    /// Inserts a graph record.
    pub fn insert_graph(&self, draft: GraphRecord) -> Result<GraphRecord, StoreError> {
        self.validate_fields(&draft.metadata.type_tag, &draft.data)?;
        let mut tables = self.tables.write();
        let stored = tables.insert_graph(draft)?;
        self.bus.dispatch(graph_event(EventKind::Create, &stored));
        drop(tables);
        debug!(store = %self.name(), graph = %stored.id, "graph inserted");
        Ok(stored)
    }

    /// Updates a graph record; bumps its version.
    pub fn update_graph(&self, draft: GraphRecord) -> Result<GraphRecord, StoreError> {
        self.validate_fields(&draft.metadata.type_tag, &draft.data)?;
        let mut tables = self.tables.write();
        let stored = tables.update_graph(draft)?;
        self.bus.dispatch(graph_event(EventKind::Update, &stored));
        drop(tables);
        Ok(stored)
    }

    /// Soft-deletes a graph. Idempotent.
    pub fn delete_graph(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if let Some(tombstone) = tables.delete_graph(id) {
            self.bus.dispatch(graph_event(EventKind::Delete, &tombstone));
        }
        drop(tables);
        Ok(())
    }

    /// Strict read of a graph record.
    pub fn get_graph(&self, id: &str) -> Result<GraphRecord, StoreError> {
        let tables = self.tables.read();
        strict_get(tables.graphs.get(id), EntityKind::Graph, id).cloned()
    }

    /// Lists live graphs matching a filter.
    pub fn graphs(&self, filter: &Filter, opts: &ListOptions) -> Vec<GraphRecord> {
        page_records(&self.tables.read().graphs, filter, opts)
    }

    /// Live graph count.
    pub fn graph_count(&self) -> usize {
        self.tables.read().graph_count()
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Inserts a node record.
    pub fn insert_node(&self, draft: NodeRecord) -> Result<NodeRecord, StoreError> {
        self.validate_fields(&draft.metadata.type_tag, &draft.data)?;
        let mut tables = self.tables.write();
        let stored = tables.insert_node(draft)?;
        self.bus.dispatch(node_event(EventKind::Create, &stored));
        drop(tables);
        debug!(store = %self.name(), node = %stored.id, "node inserted");
        Ok(stored)
    }

    /// Updates a node record; bumps its version.
    pub fn update_node(&self, draft: NodeRecord) -> Result<NodeRecord, StoreError> {
        self.validate_fields(&draft.metadata.type_tag, &draft.data)?;
        let mut tables = self.tables.write();
        let stored = tables.update_node(draft)?;
        self.bus.dispatch(node_event(EventKind::Update, &stored));
        drop(tables);
        Ok(stored)
    }

    /// Soft-deletes a node. Idempotent. Incident edges stay in place;
    /// traversals skip endpoints they cannot resolve.
    pub fn delete_node(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if let Some(tombstone) = tables.delete_node(id) {
            self.bus.dispatch(node_event(EventKind::Delete, &tombstone));
        }
        drop(tables);
        Ok(())
    }

    /// Strict read of a node record: `NotFound` for unknown ids, `Deleted`
    /// for tombstones.
    pub fn get_node(&self, id: &str) -> Result<NodeRecord, StoreError> {
        let tables = self.tables.read();
        strict_get(tables.nodes.get(id), EntityKind::Node, id).cloned()
    }

    /// Strict read that additionally requires the record's subtype tag.
    pub fn get_node_as(&self, id: &str, type_tag: &str) -> Result<NodeRecord, StoreError> {
        let record = self.get_node(id)?;
        check_tag(&record.metadata.type_tag, type_tag)?;
        Ok(record)
    }

    /// Lists live nodes matching a filter.
    pub fn nodes(&self, filter: &Filter, opts: &ListOptions) -> Vec<NodeRecord> {
        page_records(&self.tables.read().nodes, filter, opts)
    }

    /// Live node count.
    pub fn node_count(&self) -> usize {
        self.tables.read().node_count()
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Inserts an edge record and its four index entries.
    pub fn insert_edge(&self, draft: EdgeRecord) -> Result<EdgeRecord, StoreError> {
        self.validate_fields(&draft.metadata.type_tag, &draft.data)?;
        let mut tables = self.tables.write();
        self.validate_bindings(&tables, &draft)?;
        let stored = tables.insert_edge(draft)?;
        self.invalidate_edge_caches(&stored);
        self.bus.dispatch(edge_event(EventKind::Create, &stored));
        drop(tables);
        debug!(store = %self.name(), edge = %stored.id, "edge inserted");
        Ok(stored)
    }

    /// Updates an edge record; re-indexes when source/target/type changed.
    pub fn update_edge(&self, draft: EdgeRecord) -> Result<EdgeRecord, StoreError> {
        self.validate_fields(&draft.metadata.type_tag, &draft.data)?;
        let mut tables = self.tables.write();
        self.validate_bindings(&tables, &draft)?;
        let prior = tables.edges.get(&draft.id).cloned();
        let stored = tables.update_edge(draft)?;
        if let Some(prior) = prior {
            self.invalidate_edge_caches(&prior);
        }
        self.invalidate_edge_caches(&stored);
        self.bus.dispatch(edge_event(EventKind::Update, &stored));
        drop(tables);
        Ok(stored)
    }

    /// Soft-deletes an edge and removes its index entries. Idempotent.
    pub fn delete_edge(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if let Some(tombstone) = tables.delete_edge(id) {
            self.invalidate_edge_caches(&tombstone);
            self.bus.dispatch(edge_event(EventKind::Delete, &tombstone));
        }
        drop(tables);
        Ok(())
    }

    /// Strict read of an edge record.
    pub fn get_edge(&self, id: &str) -> Result<EdgeRecord, StoreError> {
        let tables = self.tables.read();
        strict_get(tables.edges.get(id), EntityKind::Edge, id).cloned()
    }

    /// Strict read that additionally requires the record's subtype tag.
    pub fn get_edge_as(&self, id: &str, type_tag: &str) -> Result<EdgeRecord, StoreError> {
        let record = self.get_edge(id)?;
        check_tag(&record.metadata.type_tag, type_tag)?;
        Ok(record)
    }

    /// Lists live edges matching a filter.
    pub fn edges(&self, filter: &Filter, opts: &ListOptions) -> Vec<EdgeRecord> {
        page_records(&self.tables.read().edges, filter, opts)
    }

    /// Live edge count; also steers the adaptive query dispatcher.
    pub fn edge_count(&self) -> usize {
        self.tables.read().edge_count()
    }

    /// Invalidates the outgoing-by-type cache entry an edge mutation
    /// touches, and drops every cached shortest path. Runs while the write
    /// guard is held, so the invalidation lands before the write completes.
    fn invalidate_edge_caches(&self, edge: &EdgeRecord) {
        if let Some(cache_type) = effective_edge_type(edge) {
            self.edge_cache
                .invalidate(&(edge.source.clone(), cache_type.to_owned()));
        }
        self.path_cache.clear();
    }

    // ========================================================================
    // Batches
    // ========================================================================

    /// Inserts a batch of nodes; partial failure is collected, not fatal.
    pub fn batch_insert_nodes(&self, drafts: Vec<NodeRecord>) -> BatchOutcome<NodeRecord> {
        collect_batch(drafts, |draft| self.insert_node(draft))
    }

    /// Inserts a batch of edges.
    pub fn batch_insert_edges(&self, drafts: Vec<EdgeRecord>) -> BatchOutcome<EdgeRecord> {
        collect_batch(drafts, |draft| self.insert_edge(draft))
    }

    /// Inserts a batch of graphs.
    pub fn batch_insert_graphs(&self, drafts: Vec<GraphRecord>) -> BatchOutcome<GraphRecord> {
        collect_batch(drafts, |draft| self.insert_graph(draft))
    }

    /// Updates a batch of nodes.
    pub fn batch_update_nodes(&self, drafts: Vec<NodeRecord>) -> BatchOutcome<NodeRecord> {
        collect_batch(drafts, |draft| self.update_node(draft))
    }

    /// Updates a batch of edges.
    pub fn batch_update_edges(&self, drafts: Vec<EdgeRecord>) -> BatchOutcome<EdgeRecord> {
        collect_batch(drafts, |draft| self.update_edge(draft))
    }

    /// Updates a batch of graphs.
    pub fn batch_update_graphs(&self, drafts: Vec<GraphRecord>) -> BatchOutcome<GraphRecord> {
        collect_batch(drafts, |draft| self.update_graph(draft))
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Registers a channel subscription; events matching the topic and
    /// options are delivered to the returned [`Subscriber`] in commit order.
    pub fn subscribe(&self, topic: Topic, options: SubscribeOptions) -> (SubscriptionId, Subscriber) {
        self.bus.subscribe(topic, options)
    }

    /// Registers a callback subscription.
    pub fn subscribe_with(
        &self,
        topic: Topic,
        options: SubscribeOptions,
        callback: EventCallback,
    ) -> SubscriptionId {
        self.bus.subscribe_with(topic, options, callback)
    }

    /// Removes a subscription.
    pub fn unsubscribe(&self, id: &str) -> Result<(), StoreError> {
        self.bus.unsubscribe(id)
    }

    /// Publishes a custom event through the same fanout path mutations use.
    pub fn publish(&self, event: Event) {
        self.bus.dispatch(event);
    }

    /// Introspection: `(id, rendered topic, created_at)` per subscription.
    pub fn subscriptions(&self) -> Vec<(SubscriptionId, String, i64)> {
        self.bus.subscriptions()
    }
}

fn collect_batch<R>(
    drafts: Vec<R>,
    mut apply: impl FnMut(R) -> Result<R, StoreError>,
) -> BatchOutcome<R>
where
    R: Clone,
{
    let mut outcome = BatchOutcome::default();
    for draft in drafts {
        let submitted = draft.clone();
        match apply(draft) {
            Ok(stored) => outcome.succeeded.push(stored),
            Err(error) => outcome.failed.push(BatchFailure {
                record: submitted,
                error,
            }),
        }
    }
    outcome
}

fn strict_get<'a, R>(
    slot: Option<&'a R>,
    kind: EntityKind,
    id: &str,
) -> Result<&'a R, StoreError>
where
    R: arbor_model::Filterable,
{
    match slot {
        None => Err(StoreError::NotFound {
            kind,
            id: id.to_owned(),
        }),
        Some(record) if record.meta().deleted => Err(StoreError::Deleted {
            kind,
            id: id.to_owned(),
        }),
        Some(record) => Ok(record),
    }
}

fn check_tag(found: &str, expected: &str) -> Result<(), StoreError> {
    if found == expected {
        Ok(())
    } else {
        Err(StoreError::TypeTagMismatch {
            expected: expected.to_owned(),
            found: found.to_owned(),
        })
    }
}

/// The type an edge contributes to the outgoing-by-type cache key: the
/// indexed `edge_type`, falling back to a `data["type"]` string for edges
/// typed only in their payload (the scan-fallback path serves those).
pub(crate) fn effective_edge_type(edge: &EdgeRecord) -> Option<&str> {
    edge.edge_type
        .as_deref()
        .or_else(|| edge.data.get("type").and_then(Value::as_str))
}

fn graph_event(kind: EventKind, record: &GraphRecord) -> Event {
    Event::mutation(
        kind,
        EntityKind::Graph,
        record.id.clone(),
        record.metadata.type_tag.clone(),
        Some(Value::Object(record.data.clone())),
    )
    .with_meta(
        "name",
        record.name.clone().map_or(Value::Null, Value::String),
    )
    .with_meta("version", record.metadata.version)
}

fn node_event(kind: EventKind, record: &NodeRecord) -> Event {
    Event::mutation(
        kind,
        EntityKind::Node,
        record.id.clone(),
        record.metadata.type_tag.clone(),
        Some(Value::Object(record.data.clone())),
    )
    .with_meta(
        "graph_id",
        record.graph_id.clone().map_or(Value::Null, Value::String),
    )
    .with_meta(
        "node_type",
        record.node_type.clone().map_or(Value::Null, Value::String),
    )
    .with_meta("version", record.metadata.version)
}

fn edge_event(kind: EventKind, record: &EdgeRecord) -> Event {
    Event::mutation(
        kind,
        EntityKind::Edge,
        record.id.clone(),
        record.metadata.type_tag.clone(),
        Some(Value::Object(record.data.clone())),
    )
    .with_meta("source", record.source.clone())
    .with_meta("target", record.target.clone())
    .with_meta(
        "edge_type",
        record.edge_type.clone().map_or(Value::Null, Value::String),
    )
    .with_meta("version", record.metadata.version)
}
