use crate::object::{ConfigMap, ObjectKind, Replicable, Secret};
use thiserror::Error;

/// Structured errors returned by the object store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: ObjectKind,
        namespace: String,
        name: String,
    },
    #[error("{kind} {namespace}/{name} already exists")]
    Conflict {
        kind: ObjectKind,
        namespace: String,
        name: String,
    },
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Store operations for one replicable kind.
pub trait KindStore<T: Replicable> {
    fn list(&self, namespace: &str) -> Result<Vec<T>, StoreError>;
    fn get(&self, namespace: &str, name: &str) -> Result<T, StoreError>;
    fn create(&self, namespace: &str, object: &T) -> Result<(), StoreError>;
    fn update(&self, namespace: &str, object: &T) -> Result<(), StoreError>;
    fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError>;
}

/// The full object-store surface the sync engine runs against.
pub trait ObjectStore: KindStore<ConfigMap> + KindStore<Secret> {
    fn list_namespaces(&self) -> Result<Vec<String>, StoreError>;
}
