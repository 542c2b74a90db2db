use crate::store::StoreError;
use thiserror::Error;
use tracing::debug;

/// Verb/resource pairs the engine must hold before the first cycle runs.
pub const REQUIRED_ACCESS: &[(&str, &str)] = &[
    ("list", "namespaces"),
    ("get", "configmaps"),
    ("list", "configmaps"),
    ("create", "configmaps"),
    ("update", "configmaps"),
    ("delete", "configmaps"),
    ("get", "secrets"),
    ("list", "secrets"),
    ("create", "secrets"),
    ("update", "secrets"),
    ("delete", "secrets"),
];

/// Asks the cluster whether the current identity may perform a verb on a
/// resource.
pub trait AccessReview {
    fn can_perform(&self, verb: &str, resource: &str) -> Result<bool, StoreError>;
}

/// Errors raised by the startup permission check.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("not allowed to {verb} {resource}")]
    Denied { verb: String, resource: String },
    #[error("access review failed: {0}")]
    Review(#[from] StoreError),
}

/// Walks the required verb/resource table and fails on the first denial.
pub fn validate_access<G: AccessReview + ?Sized>(gate: &G) -> Result<(), AccessError> {
    for &(verb, resource) in REQUIRED_ACCESS {
        let allowed = gate.can_perform(verb, resource)?;
        debug!(verb, resource, allowed, "access review");
        if !allowed {
            return Err(AccessError::Denied {
                verb: verb.to_string(),
                resource: resource.to_string(),
            });
        }
    }
    Ok(())
}
