use hrforms_core::{DocumentError, Field};

use crate::collaborator::CollaboratorError;
use crate::rule::Trigger;

/// Errors that abort a dispatch. Validation failures are not errors;
/// they come back as [`Diagnostic`](crate::rule::Diagnostic)s.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The event or an update addressed the document outside its schema.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A rule tried to write a field it does not declare.
    #[error("rule '{rule}' wrote undeclared field '{field}'")]
    UndeclaredWrite { rule: &'static str, field: Field },

    /// Nested dispatch went deeper than the configured limit, which means
    /// the registered rules form a cycle.
    #[error("cascade on {trigger} exceeded depth {limit}")]
    CascadeDepthExceeded { trigger: Trigger, limit: usize },

    /// A remote lookup failed. The engine does not retry.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// A contextual action was requested in a state that does not offer it.
    #[error("action unavailable: {reason}")]
    ActionUnavailable { reason: String },
}
