//! Fixture-backed collaborators.
//!
//! Answers come from in-memory maps, populated with the `with_*` builders
//! or deserialized from a JSON fixture file:
//!
//! ```json
//! {
//!   "salary_currency": { "EMP-0001": "USD" },
//!   "company_currency": { "Acme": "INR" },
//!   "default_company": "Acme",
//!   "exchange_rates": { "USD:INR": 83.5 },
//!   "reports_to": { "EMP-0001": "EMP-0007" },
//!   "approvers": { "EMP-0001": "boss@example.org" },
//!   "claimed_authorizations": ["TA-0002"]
//! }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use hrforms_core::DocType;
use serde::Deserialize;

use super::{CollaboratorError, Collaborators, DocumentRef};
use crate::rule::DerivedKind;

const SERVICE: &str = "fixtures";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StaticCollaborators {
    salary_currency: HashMap<String, String>,
    company_currency: HashMap<String, String>,
    default_company: Option<String>,
    /// Used when no default company is configured.
    default_currency: Option<String>,
    /// Keyed `FROM:TO`.
    exchange_rates: HashMap<String, serde_json::Value>,
    reports_to: HashMap<String, String>,
    approvers: HashMap<String, String>,
    claimed_authorizations: BTreeSet<String>,
    #[serde(skip)]
    created: Mutex<Vec<DocumentRef>>,
}

impl StaticCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON fixture.
    pub fn from_json_str(s: &str) -> Result<Self, CollaboratorError> {
        serde_json::from_str(s).map_err(|e| CollaboratorError::InvalidResponse {
            service: SERVICE.to_string(),
            message: e.to_string(),
        })
    }

    pub fn with_salary_currency(mut self, employee: &str, currency: &str) -> Self {
        self.salary_currency
            .insert(employee.to_string(), currency.to_string());
        self
    }

    pub fn with_company_currency(mut self, company: &str, currency: &str) -> Self {
        self.company_currency
            .insert(company.to_string(), currency.to_string());
        self
    }

    pub fn with_default_company(mut self, company: &str) -> Self {
        self.default_company = Some(company.to_string());
        self
    }

    pub fn with_default_currency(mut self, currency: &str) -> Self {
        self.default_currency = Some(currency.to_string());
        self
    }

    pub fn with_exchange_rate(mut self, from: &str, to: &str, rate: serde_json::Value) -> Self {
        self.exchange_rates.insert(rate_key(from, to), rate);
        self
    }

    pub fn with_reports_to(mut self, employee: &str, supervisor: &str) -> Self {
        self.reports_to
            .insert(employee.to_string(), supervisor.to_string());
        self
    }

    pub fn with_approver(mut self, employee: &str, approver: &str) -> Self {
        self.approvers
            .insert(employee.to_string(), approver.to_string());
        self
    }

    pub fn with_claim_for(mut self, authorization: &str) -> Self {
        self.claimed_authorizations
            .insert(authorization.to_string());
        self
    }

    /// Documents created through [`Collaborators::create_derived_document`].
    pub fn created(&self) -> Vec<DocumentRef> {
        self.created
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn missing(key: impl Into<String>) -> CollaboratorError {
        CollaboratorError::Missing {
            service: SERVICE.to_string(),
            key: key.into(),
        }
    }
}

fn rate_key(from: &str, to: &str) -> String {
    format!("{}:{}", from, to)
}

#[async_trait]
impl Collaborators for StaticCollaborators {
    async fn salary_currency(&self, employee: &str) -> Result<Option<String>, CollaboratorError> {
        Ok(self.salary_currency.get(employee).cloned())
    }

    async fn company_default_currency(
        &self,
        company: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        match company.or(self.default_company.as_deref()) {
            Some(company) => self
                .company_currency
                .get(company)
                .cloned()
                .ok_or_else(|| Self::missing(format!("company currency of {}", company))),
            None => self
                .default_currency
                .clone()
                .ok_or_else(|| Self::missing("default company")),
        }
    }

    async fn exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<serde_json::Value, CollaboratorError> {
        Ok(self
            .exchange_rates
            .get(&rate_key(from, to))
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn employee_reports_to(
        &self,
        employee: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        Ok(self.reports_to.get(employee).cloned())
    }

    async fn employee_approver(
        &self,
        employee: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        Ok(self.approvers.get(employee).cloned())
    }

    async fn has_travel_claim(&self, authorization: &str) -> Result<bool, CollaboratorError> {
        Ok(self.claimed_authorizations.contains(authorization))
    }

    async fn create_derived_document(
        &self,
        kind: DerivedKind,
        source_type: DocType,
        source_id: &str,
    ) -> Result<DocumentRef, CollaboratorError> {
        let mut created = self
            .created
            .lock()
            .map_err(|_| CollaboratorError::Transport {
                service: SERVICE.to_string(),
                message: format!("cannot record {} from {}", kind.doctype_name(), source_type),
            })?;
        let doc = DocumentRef {
            doctype: kind.doctype_name().to_string(),
            name: format!("{}-{}-{}", kind.as_str(), source_id, created.len() + 1),
        };
        created.push(doc.clone());
        Ok(doc)
    }
}
