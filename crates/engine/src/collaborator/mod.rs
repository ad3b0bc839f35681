//! External services the engine consumes but does not implement.
//!
//! [`Collaborators`] is the single seam to the host: currency and exchange
//! lookups, employee hierarchy, claim existence and derived-document
//! creation. Two implementations ship:
//! - [`StaticCollaborators`]: fixture-backed, for tests and offline replay
//! - [`FrappeCollaborators`]: the host framework's RPC endpoint over HTTP

#[cfg(feature = "remote")]
pub mod frappe;
pub mod static_collaborators;

#[cfg(feature = "remote")]
pub use frappe::FrappeCollaborators;
pub use static_collaborators::StaticCollaborators;

use async_trait::async_trait;
use hrforms_core::DocType;
use serde::{Deserialize, Serialize};

use crate::rule::DerivedKind;

// ──────────────────────────────────────────────
// CollaboratorError
// ──────────────────────────────────────────────

/// Errors reported by a collaborator. "Not found" answers are not errors;
/// lookups that can come back empty return `Option`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// The call could not be completed.
    #[error("{service} call failed: {message}")]
    Transport { service: String, message: String },

    /// The service answered with something unusable.
    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse { service: String, message: String },

    /// The collaborator has no answer for a lookup that must produce one.
    #[error("{service} has no value for '{key}'")]
    Missing { service: String, key: String },

    /// Missing URL, credentials, etc.
    #[error("collaborator config error: {message}")]
    Config { message: String },
}

// ──────────────────────────────────────────────
// DocumentRef
// ──────────────────────────────────────────────

/// Reference to a document created by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub doctype: String,
    pub name: String,
}

// ──────────────────────────────────────────────
// Collaborators trait
// ──────────────────────────────────────────────

#[async_trait]
pub trait Collaborators: Send + Sync {
    /// Currency of the employee's active salary structure, if any.
    async fn salary_currency(&self, employee: &str) -> Result<Option<String>, CollaboratorError>;

    /// Default currency of `company`, or of the global default company when
    /// `company` is `None`.
    async fn company_default_currency(
        &self,
        company: Option<&str>,
    ) -> Result<String, CollaboratorError>;

    /// Raw rate response for converting `from` into `to`. The engine
    /// coerces it; non-numeric answers count as zero.
    async fn exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<serde_json::Value, CollaboratorError>;

    async fn employee_reports_to(
        &self,
        employee: &str,
    ) -> Result<Option<String>, CollaboratorError>;

    async fn employee_approver(&self, employee: &str)
        -> Result<Option<String>, CollaboratorError>;

    /// Whether a non-cancelled claim already references the authorization.
    async fn has_travel_claim(&self, authorization: &str) -> Result<bool, CollaboratorError>;

    async fn create_derived_document(
        &self,
        kind: DerivedKind,
        source_type: DocType,
        source_id: &str,
    ) -> Result<DocumentRef, CollaboratorError>;
}

/// Empty strings from a service mean "nothing there".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
