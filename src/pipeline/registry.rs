//! Parser registry: `(source system, content format)` → mapper.
//!
//! Built once at startup and only read afterwards, so it is shared
//! without locking.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use super::mapping::{map_epic_fhir_bundle, MapFn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No parser for ({source_system}, {content_format})")]
    NoParserFound {
        source_system: String,
        content_format: String,
    },
}

/// Case-folded lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParserKey {
    source_system: String,
    content_format: String,
}

impl ParserKey {
    pub fn new(source_system: &str, content_format: &str) -> Self {
        Self {
            source_system: source_system.trim().to_lowercase(),
            content_format: content_format.trim().to_lowercase(),
        }
    }

    pub fn source_system(&self) -> &str {
        &self.source_system
    }

    pub fn content_format(&self) -> &str {
        &self.content_format
    }
}

impl fmt::Display for ParserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_system, self.content_format)
    }
}

#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<ParserKey, MapFn>,
}

impl ParserRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in mapper.
    pub fn with_default_parsers() -> Self {
        let mut registry = Self::new();
        registry.register("Epic", "FHIR", map_epic_fhir_bundle);
        registry
    }

    /// Add a mapper. A second registration for the same key replaces the first.
    pub fn register(&mut self, source_system: &str, content_format: &str, mapper: MapFn) {
        let key = ParserKey::new(source_system, content_format);
        if self.parsers.insert(key.clone(), mapper).is_some() {
            tracing::warn!(%key, "Parser registration replaced an existing mapper");
        }
    }

    /// Find the mapper for a source/format pair (case-insensitive).
    pub fn resolve(&self, source_system: &str, content_format: &str) -> Result<MapFn, DispatchError> {
        self.parsers
            .get(&ParserKey::new(source_system, content_format))
            .copied()
            .ok_or_else(|| DispatchError::NoParserFound {
                source_system: source_system.to_string(),
                content_format: content_format.to_string(),
            })
    }

    /// Registered keys, sorted.
    pub fn registered(&self) -> Vec<ParserKey> {
        let mut keys: Vec<_> = self.parsers.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("parsers", &self.registered())
            .finish()
    }
}
