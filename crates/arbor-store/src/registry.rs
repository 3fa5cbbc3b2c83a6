// SPDX-License-Identifier: Apache-2.0
//! Process-wide store registry.
//!
//! The registry is the sole indirection between callers and store handles:
//! stores are addressed by name, and nothing outside the engine ever sees a
//! raw table. It is mutated only at store start/stop.
use std::sync::{Arc, OnceLock};

use arbor_model::StoreError;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::config::{AdapterKind, StoreConfig};
use crate::store::Store;

struct RegistryEntry {
    store: Arc<Store>,
    adapter: AdapterKind,
}

fn registry() -> &'static RwLock<FxHashMap<String, RegistryEntry>> {
    static REGISTRY: OnceLock<RwLock<FxHashMap<String, RegistryEntry>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(FxHashMap::default()))
}

/// Boots a store and registers it under its configured name.
pub fn start(config: StoreConfig) -> Result<Arc<Store>, StoreError> {
    let name = config.name.clone();
    let adapter = config.adapter;
    let mut entries = registry().write();
    if entries.contains_key(&name) {
        return Err(StoreError::StoreAlreadyRunning(name));
    }
    let store = Store::boot(config)?;
    entries.insert(
        name.clone(),
        RegistryEntry {
            store: Arc::clone(&store),
            adapter,
        },
    );
    info!(store = %name, %adapter, "store started");
    Ok(store)
}

/// Stops a registered store: unregisters it and releases its tables,
/// indices, caches, and subscriptions.
pub fn stop(name: &str) -> Result<(), StoreError> {
    let entry = registry()
        .write()
        .remove(name)
        .ok_or_else(|| StoreError::UnknownStore(name.to_owned()))?;
    entry.store.teardown();
    info!(store = %name, "store stopped");
    Ok(())
}

/// Looks up a running store by name.
pub fn store(name: &str) -> Result<Arc<Store>, StoreError> {
    registry()
        .read()
        .get(name)
        .map(|entry| Arc::clone(&entry.store))
        .ok_or_else(|| StoreError::UnknownStore(name.to_owned()))
}

/// Looks up a running store together with its adapter kind.
pub fn lookup(name: &str) -> Result<(Arc<Store>, AdapterKind), StoreError> {
    registry()
        .read()
        .get(name)
        .map(|entry| (Arc::clone(&entry.store), entry.adapter))
        .ok_or_else(|| StoreError::UnknownStore(name.to_owned()))
}

/// Names of every running store, sorted.
pub fn stores() -> Vec<String> {
    let mut names: Vec<String> = registry().read().keys().cloned().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_lookup_stop_round_trip() {
        let name = "registry-round-trip";
        let handle = start(StoreConfig::new(name));
        assert!(handle.is_ok());
        assert!(store(name).is_ok());
        assert!(stores().contains(&name.to_owned()));
        let looked_up = lookup(name);
        assert!(looked_up.is_ok_and(|(_, adapter)| adapter == AdapterKind::Memory));
        assert!(stop(name).is_ok());
        assert!(matches!(store(name), Err(StoreError::UnknownStore(_))));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let name = "registry-duplicate";
        let first = start(StoreConfig::new(name));
        assert!(first.is_ok());
        let second = start(StoreConfig::new(name));
        assert!(matches!(second, Err(StoreError::StoreAlreadyRunning(_))));
        assert!(stop(name).is_ok());
    }

    #[test]
    fn stopping_twice_reports_unknown_store() {
        let name = "registry-double-stop";
        assert!(start(StoreConfig::new(name)).is_ok());
        assert!(stop(name).is_ok());
        assert!(matches!(stop(name), Err(StoreError::UnknownStore(_))));
    }
}
