//! Source → GCIM mappers.
//!
//! A mapper is a plain function from one source document to a
//! [`MappedIntake`]. Mappers are registered by `(source, format)` in
//! [`crate::pipeline::registry::ParserRegistry`].

pub mod bundle;
pub mod epic_fhir;

pub use epic_fhir::map_epic_fhir_bundle;

use serde_json::Value;
use thiserror::Error;

use crate::models::{Gcim, Intent};

/// Signature every source mapper implements.
pub type MapFn = fn(&Value) -> Result<MappedIntake, MapperError>;

/// The payload could not be traversed as the expected document shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapperError {
    #[error("expected a JSON object at the document root, got {0}")]
    NotAnObject(&'static str),

    #[error("'entry' must be an array, got {0}")]
    EntriesNotArray(&'static str),

    #[error("entry {index} must be an object, got {found}")]
    EntryNotObject { index: usize, found: &'static str },

    #[error("entry {index} has a 'resource' that is not an object (got {found})")]
    ResourceNotObject { index: usize, found: &'static str },

    #[error("{resource_type} at entry {index}: cannot read '{field}' (got {found})")]
    UnreadableField {
        resource_type: &'static str,
        index: usize,
        field: &'static str,
        found: &'static str,
    },
}

/// Mapper output: the canonical intake plus the mapper's own intent guess.
///
/// The provisional intent is never serialized with the GCIM; the classifier
/// makes the final decision.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedIntake {
    pub gcim: Gcim,
    provisional_intent: Option<Intent>,
}

impl MappedIntake {
    pub fn new(gcim: Gcim, provisional_intent: Option<Intent>) -> Self {
        Self {
            gcim,
            provisional_intent,
        }
    }

    pub fn provisional_intent(&self) -> Option<Intent> {
        self.provisional_intent
    }

    pub fn into_gcim(self) -> Gcim {
        self.gcim
    }
}

/// Short JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
