//! globsync keeps annotation-tagged ConfigMaps and Secrets replicated
//! across every namespace in a cluster: `MakeGlobal=true` propagates an
//! object everywhere, `MakeGlobal=false` retracts the copies, and drifted
//! copies are overwritten on the next sync cycle.

pub mod access;
pub mod annotation;
pub mod app;
pub mod client;
pub mod engine;
pub mod inventory;
pub mod object;
pub mod runner;
pub mod store;

pub use access::{validate_access, AccessError, AccessReview, REQUIRED_ACCESS};
pub use annotation::{classify, AnnotationError, Directive};
pub use client::{ClusterConfig, ConfigError, KubeClient};
pub use engine::{
    classify_index, converge, run_cycle, ApplyAction, Classification, CycleError, CycleOutcome,
    KindOutcome, SkippedObject,
};
pub use inventory::{Inventory, KindIndex};
pub use object::{
    ByteString, ConfigMap, ObjectKind, ObjectMeta, Replicable, Secret, CREATED_BY_LABEL,
    CREATED_BY_VALUE, GLOBAL_ANNOTATION,
};
pub use runner::{Runner, RunnerConfig};
pub use store::{KindStore, ObjectStore, StoreError};
