//! Shared state for the intake API.

use std::sync::Arc;

use crate::pipeline::IntakeContext;

/// Cloned into every handler. The intake context is read-only, so no locks.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub intake: Arc<IntakeContext>,
}

impl ApiContext {
    pub fn new(intake: Arc<IntakeContext>) -> Self {
        Self { intake }
    }
}
