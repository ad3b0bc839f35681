//! Collaborators backed by the host framework's RPC endpoint.
//!
//! Every call is a `POST {base_url}/api/method/{method}` with a JSON body;
//! the answer sits under the `message` key of the response. Uses `ureq`
//! (sync) inside `tokio::task::spawn_blocking`.
//!
//! Derived documents are created in two calls: the host's mapping method
//! drafts an unsaved document (or, for a Travel Advance, the draft is built
//! from the authorization header), then `frappe.client.insert` saves it.

use async_trait::async_trait;
use hrforms_core::DocType;
use serde_json::json;

use super::{CollaboratorError, Collaborators, DocumentRef};
use crate::config::FrappeConfig;
use crate::rule::DerivedKind;

const SERVICE: &str = "frappe";

const GET_VALUE: &str = "frappe.client.get_value";
const GET_SINGLE_VALUE: &str = "frappe.client.get_single_value";
const INSERT: &str = "frappe.client.insert";
const RUN_DOC_METHOD: &str = "run_doc_method";
const GET_EXCHANGE_RATE: &str = "erpnext.setup.utils.get_exchange_rate";
const GET_TRAVEL_CLAIM: &str = "hrms.hr.doctype.travel_claim.travel_claim.get_travel_claim";
const MAKE_TRAVEL_ADJUSTMENT: &str =
    "hrms.hr.doctype.travel_adjustment.travel_adjustment.make_travel_adjustment";

pub struct FrappeCollaborators {
    base_url: String,
    /// `key:secret` for the `Authorization: token ...` header.
    token: Option<String>,
}

impl FrappeCollaborators {
    pub fn new(config: &FrappeConfig) -> Result<Self, CollaboratorError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CollaboratorError::Config {
                message: "frappe.base_url is not set".to_string(),
            })?;
        Ok(FrappeCollaborators {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: config
                .credentials()
                .map(|(key, secret)| format!("{}:{}", key, secret)),
        })
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method)
    }

    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, CollaboratorError> {
        let url = self.method_url(method);
        let token = self.token.clone();
        tracing::debug!(%url, "frappe call");

        let result = tokio::task::spawn_blocking(move || {
            let agent = ureq::Agent::new_with_defaults();
            let mut request = agent.post(&url).header("Accept", "application/json");
            if let Some(ref token) = token {
                request = request.header("Authorization", &format!("token {}", token));
            }

            let response = request
                .send_json(body)
                .map_err(|e| CollaboratorError::Transport {
                    service: SERVICE.to_string(),
                    message: e.to_string(),
                })?;

            let value: serde_json::Value =
                response
                    .into_body()
                    .read_json()
                    .map_err(|e| CollaboratorError::InvalidResponse {
                        service: SERVICE.to_string(),
                        message: format!("failed to parse response as JSON: {}", e),
                    })?;

            Ok(message_of(value))
        })
        .await
        .map_err(|e| CollaboratorError::Transport {
            service: SERVICE.to_string(),
            message: format!("task join error: {}", e),
        })?;

        result
    }

    async fn get_value(
        &self,
        doctype: &str,
        filters: serde_json::Value,
        fieldname: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        let message = self
            .call(
                GET_VALUE,
                json!({ "doctype": doctype, "filters": filters, "fieldname": fieldname }),
            )
            .await?;
        Ok(message
            .get(fieldname)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }
}

/// Unwrap the `message` envelope; a missing envelope reads as null.
fn message_of(mut response: serde_json::Value) -> serde_json::Value {
    response
        .get_mut("message")
        .map(serde_json::Value::take)
        .unwrap_or(serde_json::Value::Null)
}

/// Host method that drafts a claim or adjustment from its source. Travel
/// Advances have none.
fn mapping_call(
    kind: DerivedKind,
    source_type: DocType,
    source_id: &str,
) -> Option<(&'static str, serde_json::Value)> {
    match kind {
        DerivedKind::Advance => None,
        DerivedKind::Claim => Some((
            GET_TRAVEL_CLAIM,
            json!({ "dt": source_type.as_str(), "dn": source_id }),
        )),
        DerivedKind::Adjustment => Some((MAKE_TRAVEL_ADJUSTMENT, json!({ "source_name": source_id }))),
    }
}

/// Unsaved Travel Advance for an authorization, from its header fields.
fn advance_doc(source_id: &str, header: &serde_json::Value) -> serde_json::Value {
    json!({
        "doctype": DerivedKind::Advance.doctype_name(),
        "travel_authorization": source_id,
        "employee": header.get("employee"),
        "company": header.get("company"),
    })
}

#[async_trait]
impl Collaborators for FrappeCollaborators {
    async fn salary_currency(&self, employee: &str) -> Result<Option<String>, CollaboratorError> {
        self.get_value(
            "Salary Structure Assignment",
            json!({ "employee": employee, "docstatus": 1 }),
            "currency",
        )
        .await
    }

    async fn company_default_currency(
        &self,
        company: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        let company = match company {
            Some(c) => c.to_string(),
            None => self
                .call(
                    GET_SINGLE_VALUE,
                    json!({ "doctype": "Global Defaults", "field": "default_company" }),
                )
                .await?
                .as_str()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| CollaboratorError::Missing {
                    service: SERVICE.to_string(),
                    key: "default company".to_string(),
                })?,
        };
        self.get_value("Company", json!({ "name": company }), "default_currency")
            .await?
            .ok_or_else(|| CollaboratorError::Missing {
                service: SERVICE.to_string(),
                key: format!("company currency of {}", company),
            })
    }

    async fn exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<serde_json::Value, CollaboratorError> {
        self.call(
            GET_EXCHANGE_RATE,
            json!({ "from_currency": from, "to_currency": to }),
        )
        .await
    }

    async fn employee_reports_to(
        &self,
        employee: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        self.get_value("Employee", json!({ "name": employee }), "reports_to")
            .await
    }

    async fn employee_approver(
        &self,
        employee: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        self.get_value("Employee", json!({ "name": employee }), "expense_approver")
            .await
    }

    async fn has_travel_claim(&self, authorization: &str) -> Result<bool, CollaboratorError> {
        let message = self
            .call(
                RUN_DOC_METHOD,
                json!({
                    "dt": DocType::TravelAuthorization.as_str(),
                    "dn": authorization,
                    "method": "has_travel_claim",
                }),
            )
            .await?;
        message
            .get("has_travel_claim")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| CollaboratorError::InvalidResponse {
                service: SERVICE.to_string(),
                message: format!("has_travel_claim answer missing for {}", authorization),
            })
    }

    async fn create_derived_document(
        &self,
        kind: DerivedKind,
        source_type: DocType,
        source_id: &str,
    ) -> Result<DocumentRef, CollaboratorError> {
        let draft = match mapping_call(kind, source_type, source_id) {
            Some((method, body)) => self.call(method, body).await?,
            None => {
                let header = self
                    .call(
                        GET_VALUE,
                        json!({
                            "doctype": source_type.as_str(),
                            "filters": { "name": source_id },
                            "fieldname": ["employee", "company"],
                        }),
                    )
                    .await?;
                advance_doc(source_id, &header)
            }
        };
        if !draft.is_object() {
            return Err(CollaboratorError::InvalidResponse {
                service: SERVICE.to_string(),
                message: format!("no {} drafted from {}", kind.doctype_name(), source_id),
            });
        }
        let message = self.call(INSERT, json!({ "doc": draft })).await?;
        let name = message
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CollaboratorError::InvalidResponse {
                service: SERVICE.to_string(),
                message: format!("{} created without a name", kind.doctype_name()),
            })?;
        Ok(DocumentRef {
            doctype: kind.doctype_name().to_string(),
            name: name.to_string(),
        })
    }
}
