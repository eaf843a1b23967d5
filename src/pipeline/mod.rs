pub mod mapping;
pub mod registry;
pub mod validation;
pub mod classify;
pub mod intake; // map → validate → classify

pub use classify::classify_intent;
pub use intake::{IntakeContext, IntakeError, IntakeOutcome};
pub use registry::{DispatchError, ParserKey, ParserRegistry};
pub use validation::{validate_gcim, ValidationReport};
