#![allow(dead_code)]

use globsync::{
    AccessReview, ConfigMap, KindStore, ObjectKind, ObjectStore, Replicable, Secret, StoreError,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation the fake cluster should fail with an injected transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    ListNamespaces,
    List(ObjectKind),
    Create(ObjectKind),
    Update(ObjectKind),
    Delete(ObjectKind),
    AccessReview,
}

/// Mutation counters observed by the fake cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounters {
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl OpCounters {
    pub fn mutations(&self) -> usize {
        self.creates + self.updates + self.deletes
    }
}

#[derive(Debug, Default)]
struct State {
    namespaces: Vec<String>,
    config_maps: BTreeMap<String, BTreeMap<String, ConfigMap>>,
    secrets: BTreeMap<String, BTreeMap<String, Secret>>,
    denied: Vec<(String, String)>,
    fail: Option<FailurePoint>,
    counters: OpCounters,
}

/// In-memory object store standing in for a real cluster.
#[derive(Debug, Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<State>>,
}

impl FakeCluster {
    pub fn new(namespaces: &[&str]) -> Self {
        let state = State {
            namespaces: namespaces.iter().map(|ns| ns.to_string()).collect(),
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn put_config_map(&self, object: ConfigMap) {
        let mut state = self.lock();
        state
            .config_maps
            .entry(object.namespace().to_string())
            .or_default()
            .insert(object.name().to_string(), object);
    }

    pub fn put_secret(&self, object: Secret) {
        let mut state = self.lock();
        state
            .secrets
            .entry(object.namespace().to_string())
            .or_default()
            .insert(object.name().to_string(), object);
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.lock()
            .config_maps
            .get(namespace)
            .and_then(|objects| objects.get(name))
            .cloned()
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.lock()
            .secrets
            .get(namespace)
            .and_then(|objects| objects.get(name))
            .cloned()
    }

    pub fn deny(&self, verb: &str, resource: &str) {
        self.lock()
            .denied
            .push((verb.to_string(), resource.to_string()));
    }

    pub fn fail_on(&self, point: FailurePoint) {
        self.lock().fail = Some(point);
    }

    pub fn clear_failure(&self) {
        self.lock().fail = None;
    }

    pub fn counters(&self) -> OpCounters {
        self.lock().counters
    }

    fn injected(point: FailurePoint) -> StoreError {
        StoreError::Transport(format!("injected failure at {point:?}"))
    }
}

impl KindStore<ConfigMap> for FakeCluster {
    fn list(&self, namespace: &str) -> Result<Vec<ConfigMap>, StoreError> {
        let mut state = self.lock();
        if state.fail == Some(FailurePoint::List(ObjectKind::ConfigMap)) {
            return Err(Self::injected(FailurePoint::List(ObjectKind::ConfigMap)));
        }
        state.counters.lists += 1;
        Ok(state
            .config_maps
            .get(namespace)
            .map(|objects| objects.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, namespace: &str, name: &str) -> Result<ConfigMap, StoreError> {
        self.config_map(namespace, name)
            .ok_or_else(|| StoreError::NotFound {
                kind: ObjectKind::ConfigMap,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    fn create(&self, namespace: &str, object: &ConfigMap) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail == Some(FailurePoint::Create(ObjectKind::ConfigMap)) {
            return Err(Self::injected(FailurePoint::Create(ObjectKind::ConfigMap)));
        }
        let objects = state.config_maps.entry(namespace.to_string()).or_default();
        if objects.contains_key(object.name()) {
            return Err(StoreError::Conflict {
                kind: ObjectKind::ConfigMap,
                namespace: namespace.to_string(),
                name: object.name().to_string(),
            });
        }
        objects.insert(object.name().to_string(), object.clone());
        state.counters.creates += 1;
        Ok(())
    }

    fn update(&self, namespace: &str, object: &ConfigMap) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail == Some(FailurePoint::Update(ObjectKind::ConfigMap)) {
            return Err(Self::injected(FailurePoint::Update(ObjectKind::ConfigMap)));
        }
        let objects = state.config_maps.entry(namespace.to_string()).or_default();
        if !objects.contains_key(object.name()) {
            return Err(StoreError::NotFound {
                kind: ObjectKind::ConfigMap,
                namespace: namespace.to_string(),
                name: object.name().to_string(),
            });
        }
        objects.insert(object.name().to_string(), object.clone());
        state.counters.updates += 1;
        Ok(())
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail == Some(FailurePoint::Delete(ObjectKind::ConfigMap)) {
            return Err(Self::injected(FailurePoint::Delete(ObjectKind::ConfigMap)));
        }
        let removed = state
            .config_maps
            .get_mut(namespace)
            .and_then(|objects| objects.remove(name));
        if removed.is_none() {
            return Err(StoreError::NotFound {
                kind: ObjectKind::ConfigMap,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        state.counters.deletes += 1;
        Ok(())
    }
}

impl KindStore<Secret> for FakeCluster {
    fn list(&self, namespace: &str) -> Result<Vec<Secret>, StoreError> {
        let mut state = self.lock();
        if state.fail == Some(FailurePoint::List(ObjectKind::Secret)) {
            return Err(Self::injected(FailurePoint::List(ObjectKind::Secret)));
        }
        state.counters.lists += 1;
        Ok(state
            .secrets
            .get(namespace)
            .map(|objects| objects.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        self.secret(namespace, name)
            .ok_or_else(|| StoreError::NotFound {
                kind: ObjectKind::Secret,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    fn create(&self, namespace: &str, object: &Secret) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail == Some(FailurePoint::Create(ObjectKind::Secret)) {
            return Err(Self::injected(FailurePoint::Create(ObjectKind::Secret)));
        }
        let objects = state.secrets.entry(namespace.to_string()).or_default();
        if objects.contains_key(object.name()) {
            return Err(StoreError::Conflict {
                kind: ObjectKind::Secret,
                namespace: namespace.to_string(),
                name: object.name().to_string(),
            });
        }
        objects.insert(object.name().to_string(), object.clone());
        state.counters.creates += 1;
        Ok(())
    }

    fn update(&self, namespace: &str, object: &Secret) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail == Some(FailurePoint::Update(ObjectKind::Secret)) {
            return Err(Self::injected(FailurePoint::Update(ObjectKind::Secret)));
        }
        let objects = state.secrets.entry(namespace.to_string()).or_default();
        if !objects.contains_key(object.name()) {
            return Err(StoreError::NotFound {
                kind: ObjectKind::Secret,
                namespace: namespace.to_string(),
                name: object.name().to_string(),
            });
        }
        objects.insert(object.name().to_string(), object.clone());
        state.counters.updates += 1;
        Ok(())
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail == Some(FailurePoint::Delete(ObjectKind::Secret)) {
            return Err(Self::injected(FailurePoint::Delete(ObjectKind::Secret)));
        }
        let removed = state
            .secrets
            .get_mut(namespace)
            .and_then(|objects| objects.remove(name));
        if removed.is_none() {
            return Err(StoreError::NotFound {
                kind: ObjectKind::Secret,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        state.counters.deletes += 1;
        Ok(())
    }
}

impl ObjectStore for FakeCluster {
    fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        let state = self.lock();
        if state.fail == Some(FailurePoint::ListNamespaces) {
            return Err(Self::injected(FailurePoint::ListNamespaces));
        }
        Ok(state.namespaces.clone())
    }
}

impl AccessReview for FakeCluster {
    fn can_perform(&self, verb: &str, resource: &str) -> Result<bool, StoreError> {
        let state = self.lock();
        if state.fail == Some(FailurePoint::AccessReview) {
            return Err(Self::injected(FailurePoint::AccessReview));
        }
        let denied = state
            .denied
            .iter()
            .any(|(denied_verb, denied_resource)| denied_verb == verb && denied_resource == resource);
        Ok(!denied)
    }
}
