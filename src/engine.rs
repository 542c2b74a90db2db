use crate::annotation::{classify, AnnotationError, Directive};
use crate::inventory::{Inventory, KindIndex};
use crate::object::{ObjectKind, Replicable};
use crate::store::{KindStore, ObjectStore, StoreError};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// One mutation the engine performs against a target namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    Create,
    Overwrite,
    Delete,
}

impl fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplyAction::Create => "create",
            ApplyAction::Overwrite => "overwrite",
            ApplyAction::Delete => "delete",
        })
    }
}

/// Errors that abort a sync cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("cluster snapshot failed: {0}")]
    Snapshot(#[from] StoreError),
    #[error("failed to {action} {kind} {namespace}/{name}: {cause}")]
    Apply {
        action: ApplyAction,
        kind: ObjectKind,
        namespace: String,
        name: String,
        cause: StoreError,
    },
}

/// An object excluded from the cycle because its annotation did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedObject {
    pub kind: ObjectKind,
    pub namespace: String,
    pub name: String,
    pub reason: AnnotationError,
}

/// Per-kind classification of one cycle's annotated sources.
#[derive(Debug, Clone)]
pub struct Classification<T> {
    pub propagate: Vec<T>,
    pub retract: Vec<T>,
    pub skipped: Vec<SkippedObject>,
}

impl<T> Default for Classification<T> {
    fn default() -> Self {
        Self {
            propagate: Vec::new(),
            retract: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Scans every namespace's objects and partitions the annotated ones.
///
/// A malformed annotation excludes that object from both sets, is logged,
/// and never blocks classification of its siblings.
pub fn classify_index<T: Replicable>(index: &KindIndex<T>) -> Classification<T> {
    let mut classification = Classification::default();
    for (namespace, objects) in index {
        for (name, object) in objects {
            match classify(Some(object)) {
                Ok(Directive::Absent) => {}
                Ok(Directive::Propagate) => {
                    info!(kind = %T::KIND, %namespace, %name, "found propagate annotation");
                    classification.propagate.push(object.clone());
                }
                Ok(Directive::Retract) => {
                    info!(kind = %T::KIND, %namespace, %name, "found retract annotation");
                    classification.retract.push(object.clone());
                }
                Err(reason) => {
                    warn!(kind = %T::KIND, %namespace, %name, error = %reason, "skipping object with malformed annotation");
                    classification.skipped.push(SkippedObject {
                        kind: T::KIND,
                        namespace: namespace.clone(),
                        name: name.clone(),
                        reason,
                    });
                }
            }
        }
    }
    classification
}

/// Mutation counters for one kind in one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindOutcome {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl KindOutcome {
    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Aggregated counters for a full cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub config_maps: KindOutcome,
    pub secrets: KindOutcome,
}

impl CycleOutcome {
    pub fn mutations(&self) -> usize {
        self.config_maps.mutations() + self.secrets.mutations()
    }
}

enum CopyAction {
    Create,
    Overwrite,
    Keep,
}

fn plan_copy<T: Replicable>(existing: Option<&T>, source: &T) -> CopyAction {
    match existing {
        None => CopyAction::Create,
        Some(target) if target.payload_matches(source) => CopyAction::Keep,
        Some(_) => CopyAction::Overwrite,
    }
}

/// Converges every target namespace for one kind.
///
/// Propagated sources are copied into each namespace that is missing them
/// and overwrite copies whose payload drifted; retracted sources have their
/// same-named counterparts deleted unconditionally. The origin namespace is
/// never touched by its own source, and the first write failure aborts the
/// remainder of the cycle.
pub fn converge<T, S>(
    store: &S,
    namespaces: &[String],
    index: &KindIndex<T>,
    classification: &Classification<T>,
) -> Result<KindOutcome, CycleError>
where
    T: Replicable,
    S: KindStore<T> + ?Sized,
{
    let mut outcome = KindOutcome {
        skipped: classification.skipped.len(),
        ..KindOutcome::default()
    };

    for namespace in namespaces {
        for source in &classification.propagate {
            if source.namespace() == namespace {
                continue;
            }
            let existing = index
                .get(namespace)
                .and_then(|objects| objects.get(source.name()));
            match plan_copy(existing, source) {
                CopyAction::Create => {
                    info!(kind = %T::KIND, %namespace, name = source.name(), origin = source.namespace(), "creating global object");
                    store
                        .create(namespace, &source.copy_for(namespace))
                        .map_err(|cause| apply_error::<T>(ApplyAction::Create, namespace, source.name(), cause))?;
                    outcome.created += 1;
                }
                CopyAction::Overwrite => {
                    info!(kind = %T::KIND, %namespace, name = source.name(), origin = source.namespace(), "overwriting drifted copy");
                    store
                        .update(namespace, &source.copy_for(namespace))
                        .map_err(|cause| apply_error::<T>(ApplyAction::Overwrite, namespace, source.name(), cause))?;
                    outcome.updated += 1;
                }
                CopyAction::Keep => {
                    outcome.unchanged += 1;
                }
            }
        }
    }

    for namespace in namespaces {
        for source in &classification.retract {
            if source.namespace() == namespace {
                continue;
            }
            let present = index
                .get(namespace)
                .is_some_and(|objects| objects.contains_key(source.name()));
            if !present {
                continue;
            }
            info!(kind = %T::KIND, %namespace, name = source.name(), origin = source.namespace(), "removing retracted global object");
            store
                .delete(namespace, source.name())
                .map_err(|cause| apply_error::<T>(ApplyAction::Delete, namespace, source.name(), cause))?;
            outcome.deleted += 1;
        }
    }

    Ok(outcome)
}

fn apply_error<T: Replicable>(
    action: ApplyAction,
    namespace: &str,
    name: &str,
    cause: StoreError,
) -> CycleError {
    CycleError::Apply {
        action,
        kind: T::KIND,
        namespace: namespace.to_string(),
        name: name.to_string(),
        cause,
    }
}

/// Runs one full sync cycle: snapshot, classify, converge both kinds.
///
/// The snapshot is taken in full before any mutation, so every decision in
/// the cycle is made against the same point-in-time picture of the cluster.
pub fn run_cycle<S: ObjectStore + ?Sized>(store: &S) -> Result<CycleOutcome, CycleError> {
    let inventory = Inventory::snapshot(store)?;

    let config_maps = classify_index(inventory.config_maps());
    let secrets = classify_index(inventory.secrets());

    let cm_outcome = converge(
        store,
        inventory.namespaces(),
        inventory.config_maps(),
        &config_maps,
    )?;
    let secret_outcome = converge(
        store,
        inventory.namespaces(),
        inventory.secrets(),
        &secrets,
    )?;

    Ok(CycleOutcome {
        config_maps: cm_outcome,
        secrets: secret_outcome,
    })
}
