//! hrforms-engine: reactive field rules for HR travel forms.
//!
//! A [`FormSession`] owns one [`Document`](hrforms_core::Document). Edits
//! go in through [`FormSession::dispatch`]; the rules registered in a
//! [`RuleRegistry`] recompute dependent fields, report [`Diagnostic`]s,
//! emit [`HostEffect`]s for the host surface and ask [`Collaborators`] for
//! remote data through token-stamped lookups.
//!
//! ```ignore
//! let registry = Arc::new(standard_registry());
//! let mut session = FormSession::new(doc, registry, EngineConfig::default());
//! session.dispatch(FieldEvent::parent(Field::Employee, "EMP-0001"))?;
//! session.settle(&collaborators).await?;
//! ```

pub mod collaborator;
pub mod config;
pub mod derive;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod session;
pub mod validate;

#[cfg(feature = "remote")]
pub use collaborator::FrappeCollaborators;
pub use collaborator::{CollaboratorError, Collaborators, DocumentRef, StaticCollaborators};
pub use config::{EngineConfig, FrappeConfig};
pub use derive::{draft_adjustment, draft_claim, estimate_travel_cost, DsaPolicy};
pub use error::EngineError;
pub use lookup::{LookupReply, LookupRequest, PendingLookup, RequestKey, RequestToken};
pub use registry::RuleRegistry;
pub use rule::{
    DerivedKind, Diagnostic, FieldEvent, FieldUpdate, HostEffect, Rule, RuleInput, RuleOutcome,
    Severity, Trigger,
};
pub use rules::standard_registry;
pub use session::{DispatchReport, FormSession};
pub use validate::{fill_travel_dates, mark_last_day, validate_document};
