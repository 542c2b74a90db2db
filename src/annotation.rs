use crate::object::{Replicable, GLOBAL_ANNOTATION};
use thiserror::Error;

/// Replication intent parsed from the `MakeGlobal` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// The annotation key is not present on the object.
    Absent,
    /// The annotation parses as boolean true: replicate everywhere.
    Propagate,
    /// The annotation parses as boolean false: remove the copies.
    Retract,
}

/// Errors surfaced while classifying one object's annotations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("no object passed")]
    InvalidInput,
    #[error("annotation MakeGlobal has non-boolean value {value:?}")]
    Malformed { value: String },
}

/// Classifies a single object's replication directive.
///
/// Absent and malformed are distinct outcomes: a missing key means the
/// object simply does not participate, while a key with a non-boolean value
/// is a hard error for that object (and only that object).
pub fn classify<T: Replicable>(object: Option<&T>) -> Result<Directive, AnnotationError> {
    let object = object.ok_or(AnnotationError::InvalidInput)?;
    match object.annotations().get(GLOBAL_ANNOTATION) {
        None => Ok(Directive::Absent),
        Some(value) => match parse_bool_text(value) {
            Some(true) => Ok(Directive::Propagate),
            Some(false) => Ok(Directive::Retract),
            None => Err(AnnotationError::Malformed {
                value: value.clone(),
            }),
        },
    }
}

// The accepted spellings mirror Go's strconv.ParseBool, which the original
// annotation consumers relied on.
fn parse_bool_text(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
