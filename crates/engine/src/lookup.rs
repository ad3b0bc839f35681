//! Lookup requests, replies and the tokens that keep replies fresh.
//!
//! A rule that needs remote data returns a [`LookupRequest`] under a slot
//! field. The session keys it by `(document, slot)` and stamps it with a
//! monotonically increasing [`RequestToken`]. A later request for the same
//! key supersedes the earlier one, and a reply carrying a superseded token
//! is discarded.

use std::fmt;

use hrforms_core::Field;

use crate::collaborator::{non_empty, CollaboratorError, Collaborators};

/// A question for a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    SalaryCurrency { employee: String },
    CompanyCurrency { company: Option<String> },
    ExchangeRate { from: String, to: String },
    ReportsTo { employee: String },
    Approver { employee: String },
    HasClaim { authorization: String },
}

/// A collaborator's answer, routed back to the rule that asked.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupReply {
    SalaryCurrency(Option<String>),
    CompanyCurrency(String),
    ExchangeRate {
        from: String,
        to: String,
        rate: serde_json::Value,
    },
    ReportsTo(Option<String>),
    Approver(Option<String>),
    HasClaim(bool),
}

impl LookupRequest {
    /// Ask the collaborator and wrap its answer.
    pub async fn resolve<C>(&self, collaborators: &C) -> Result<LookupReply, CollaboratorError>
    where
        C: Collaborators + ?Sized,
    {
        Ok(match self {
            LookupRequest::SalaryCurrency { employee } => {
                LookupReply::SalaryCurrency(non_empty(collaborators.salary_currency(employee).await?))
            }
            LookupRequest::CompanyCurrency { company } => LookupReply::CompanyCurrency(
                collaborators
                    .company_default_currency(company.as_deref())
                    .await?,
            ),
            LookupRequest::ExchangeRate { from, to } => LookupReply::ExchangeRate {
                from: from.clone(),
                to: to.clone(),
                rate: collaborators.exchange_rate(from, to).await?,
            },
            LookupRequest::ReportsTo { employee } => LookupReply::ReportsTo(non_empty(
                collaborators.employee_reports_to(employee).await?,
            )),
            LookupRequest::Approver { employee } => LookupReply::Approver(non_empty(
                collaborators.employee_approver(employee).await?,
            )),
            LookupRequest::HasClaim { authorization } => {
                LookupReply::HasClaim(collaborators.has_travel_claim(authorization).await?)
            }
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            LookupRequest::SalaryCurrency { employee } => {
                serde_json::json!({ "lookup": "salary_currency", "employee": employee })
            }
            LookupRequest::CompanyCurrency { company } => {
                serde_json::json!({ "lookup": "company_currency", "company": company })
            }
            LookupRequest::ExchangeRate { from, to } => {
                serde_json::json!({ "lookup": "exchange_rate", "from": from, "to": to })
            }
            LookupRequest::ReportsTo { employee } => {
                serde_json::json!({ "lookup": "reports_to", "employee": employee })
            }
            LookupRequest::Approver { employee } => {
                serde_json::json!({ "lookup": "approver", "employee": employee })
            }
            LookupRequest::HasClaim { authorization } => {
                serde_json::json!({ "lookup": "has_claim", "authorization": authorization })
            }
        }
    }
}

/// In-flight requests are tracked per document instance and slot field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub document: String,
    pub slot: Field,
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.document, self.slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// A request the host still has to answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLookup {
    pub key: RequestKey,
    pub token: RequestToken,
    pub request: LookupRequest,
}
