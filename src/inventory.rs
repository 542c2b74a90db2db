use crate::object::{ConfigMap, Replicable, Secret};
use crate::store::{KindStore, ObjectStore, StoreError};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-kind object index: namespace name to name-keyed objects.
pub type KindIndex<T> = BTreeMap<String, BTreeMap<String, T>>;

/// Point-in-time picture of every namespace and the replicable objects each
/// one contains. Built in full before any mutation; stale the moment the
/// engine starts writing, which the next cycle corrects.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    namespaces: Vec<String>,
    config_maps: KindIndex<ConfigMap>,
    secrets: KindIndex<Secret>,
}

impl Inventory {
    /// Lists all namespaces and all ConfigMaps and Secrets in each of them.
    ///
    /// Any list failure aborts the snapshot; no partial inventory is ever
    /// returned. Every namespace present at snapshot time has exactly one
    /// entry per kind, even when it holds no objects.
    pub fn snapshot<S: ObjectStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let namespaces = store.list_namespaces()?;
        let mut config_maps = KindIndex::new();
        let mut secrets = KindIndex::new();
        for namespace in &namespaces {
            debug!(namespace, "snapshotting namespace");
            let cms = <S as KindStore<ConfigMap>>::list(store, namespace)?;
            config_maps.insert(namespace.clone(), index_by_name(cms));
            let secs = <S as KindStore<Secret>>::list(store, namespace)?;
            secrets.insert(namespace.clone(), index_by_name(secs));
        }
        Ok(Self {
            namespaces,
            config_maps,
            secrets,
        })
    }

    /// Namespaces present at snapshot time, in listing order.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn config_maps(&self) -> &KindIndex<ConfigMap> {
        &self.config_maps
    }

    pub fn secrets(&self) -> &KindIndex<Secret> {
        &self.secrets
    }
}

fn index_by_name<T: Replicable>(objects: Vec<T>) -> BTreeMap<String, T> {
    objects
        .into_iter()
        .map(|object| (object.name().to_string(), object))
        .collect()
}
