//! The dispatcher: one [`FormSession`] per open form.
//!
//! The session owns the document. A user edit is applied, then the rules
//! bound to `(doctype, Change(field))` run in registration order. Each rule
//! update is applied immediately; when it changes the stored value the
//! rules for that field run before the next update, up to
//! `max_cascade_depth` levels deep.
//!
//! Remote lookups suspend a rule. The session records which rule asked,
//! for which target, under which token, and resumes it when a current
//! reply arrives through [`FormSession::deliver`] or
//! [`FormSession::settle`].

use std::collections::HashMap;
use std::sync::Arc;

use hrforms_core::{
    DocStatus, DocType, Document, DocumentError, Field, RowId, RowOrigin, Target, Value,
};
use tracing::{debug, warn};

use crate::collaborator::{Collaborators, DocumentRef};
use crate::config::EngineConfig;
use crate::derive::{estimate_travel_cost, DsaPolicy};
use crate::error::EngineError;
use crate::lookup::{LookupReply, LookupRequest, PendingLookup, RequestKey, RequestToken};
use crate::registry::RuleRegistry;
use crate::rule::{
    Diagnostic, DerivedKind, FieldEvent, FieldUpdate, HostEffect, Rule, RuleInput, RuleOutcome,
    Trigger,
};
use crate::rules::totals::claim_totals;
use crate::validate::{fill_travel_dates, mark_last_day, validate_document};

// ──────────────────────────────────────────────
// DispatchReport
// ──────────────────────────────────────────────

/// Everything that happened while handling one event or reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Applied updates, in application order. Includes no-op writes.
    pub updates: Vec<FieldUpdate>,
    pub diagnostics: Vec<Diagnostic>,
    pub effects: Vec<HostEffect>,
    /// Lookups issued and not yet answered.
    pub lookups: Vec<PendingLookup>,
    /// Replies discarded because a newer request superseded them.
    pub stale_replies: usize,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.updates.extend(other.updates);
        self.diagnostics.extend(other.diagnostics);
        self.effects.extend(other.effects);
        self.lookups.extend(other.lookups);
        self.stale_replies += other.stale_replies;
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "updates": self.updates.iter().map(FieldUpdate::to_json).collect::<Vec<_>>(),
            "diagnostics": self.diagnostics.iter().map(Diagnostic::to_json).collect::<Vec<_>>(),
            "effects": self.effects.iter().map(HostEffect::to_json).collect::<Vec<_>>(),
            "lookups": self.lookups.iter().map(|l| {
                let mut v = l.request.to_json();
                v["slot"] = serde_json::Value::String(l.key.slot.as_str().to_string());
                v["token"] = serde_json::json!(l.token.0);
                v
            }).collect::<Vec<_>>(),
            "stale_replies": self.stale_replies,
        })
    }
}

// ──────────────────────────────────────────────
// FormSession
// ──────────────────────────────────────────────

/// The rule that issued a lookup, and where it fired.
struct InFlight {
    token: RequestToken,
    rule: Arc<dyn Rule>,
    target: Target,
    trigger: Trigger,
}

pub struct FormSession {
    doc: Document,
    registry: Arc<RuleRegistry>,
    config: EngineConfig,
    in_flight: HashMap<RequestKey, InFlight>,
    pending: Vec<PendingLookup>,
    next_token: u64,
    dsa_policy: Option<DsaPolicy>,
}

impl FormSession {
    pub fn new(doc: Document, registry: Arc<RuleRegistry>, config: EngineConfig) -> Self {
        FormSession {
            doc,
            registry,
            config,
            in_flight: HashMap::new(),
            pending: Vec::new(),
            next_token: 1,
            dsa_policy: None,
        }
    }

    /// Allowance used to estimate a Travel Authorization's cost on save.
    pub fn with_dsa_policy(mut self, policy: DsaPolicy) -> Self {
        self.dsa_policy = Some(policy);
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Apply a user edit and run the rules bound to the field. Rules run
    /// even if the value is unchanged.
    pub fn dispatch(&mut self, event: FieldEvent) -> Result<DispatchReport, EngineError> {
        debug!(
            document = self.doc.name(),
            field = %event.field,
            "dispatch"
        );
        self.doc.set(event.target, event.field, event.value)?;
        let mut report = DispatchReport::default();
        self.run_rules(event.target, Trigger::Change(event.field), 0, &mut report)?;
        Ok(report)
    }

    /// Re-fire the rules for a field without changing its value.
    pub fn trigger(&mut self, target: Target, field: Field) -> Result<DispatchReport, EngineError> {
        self.doc.get(target, field)?;
        let mut report = DispatchReport::default();
        self.run_rules(target, Trigger::Change(field), 0, &mut report)?;
        Ok(report)
    }

    /// Run the refresh rules of the parent document.
    pub fn refresh(&mut self) -> Result<DispatchReport, EngineError> {
        let mut report = DispatchReport::default();
        self.run_rules(Target::Parent, Trigger::Refresh, 0, &mut report)?;
        Ok(report)
    }

    /// Add an empty row on behalf of the user.
    pub fn add_row(&mut self, table: Field) -> Result<RowId, EngineError> {
        if self.doc.is_row_add_disabled(table) {
            return Err(DocumentError::RowAddNotAllowed {
                doctype: self.doc.doctype(),
                field: table,
            }
            .into());
        }
        Ok(self.doc.add_row(table, RowOrigin::User)?)
    }

    /// Lookups waiting for a reply, oldest first.
    pub fn pending(&self) -> &[PendingLookup] {
        &self.pending
    }

    /// Whether `token` is the latest request issued for `key`.
    pub fn is_current(&self, key: &RequestKey, token: RequestToken) -> bool {
        self.in_flight
            .get(key)
            .map(|f| f.token == token)
            .unwrap_or(false)
    }

    /// Hand a reply back to the rule that asked for it. Superseded replies
    /// are dropped and counted.
    pub fn deliver(
        &mut self,
        key: &RequestKey,
        token: RequestToken,
        reply: LookupReply,
    ) -> Result<DispatchReport, EngineError> {
        let mut report = DispatchReport::default();
        if !self.is_current(key, token) {
            warn!(%key, token = token.0, "discarding stale reply");
            report.stale_replies = 1;
            return Ok(report);
        }
        let Some(flight) = self.in_flight.remove(key) else {
            return Ok(report);
        };
        self.pending.retain(|p| p.token != token);

        debug!(rule = flight.rule.name(), %key, "resume");
        let outcome = flight.rule.resume(
            &RuleInput {
                doc: &self.doc,
                target: flight.target,
                trigger: flight.trigger,
            },
            &reply,
        );
        self.apply(&flight.rule, flight.target, flight.trigger, outcome, 0, &mut report)?;
        Ok(report)
    }

    /// Resolve pending lookups through `collaborators` until none remain.
    ///
    /// A lookup stays queued until its collaborator call succeeds, so a
    /// failed `settle` can be retried.
    pub async fn settle<C>(&mut self, collaborators: &C) -> Result<DispatchReport, EngineError>
    where
        C: Collaborators + ?Sized,
    {
        let mut report = DispatchReport::default();
        while let Some(next) = self.pending.first().cloned() {
            if !self.is_current(&next.key, next.token) {
                self.pending.remove(0);
                continue;
            }
            debug!(key = %next.key, token = next.token.0, "resolving lookup");
            let reply = next.request.resolve(collaborators).await?;
            report.merge(self.deliver(&next.key, next.token, reply)?);
        }
        report.lookups.clear();
        Ok(report)
    }

    /// Create a document derived from this Travel Authorization.
    pub async fn create_derived<C>(
        &self,
        kind: DerivedKind,
        collaborators: &C,
    ) -> Result<DocumentRef, EngineError>
    where
        C: Collaborators + ?Sized,
    {
        if self.doc.doctype() != DocType::TravelAuthorization {
            return Err(EngineError::ActionUnavailable {
                reason: format!("{} cannot create a {}", self.doc.doctype(), kind.doctype_name()),
            });
        }
        if self.doc.docstatus() != DocStatus::Submitted {
            return Err(EngineError::ActionUnavailable {
                reason: format!("{} is not submitted", self.doc.name()),
            });
        }
        if collaborators.has_travel_claim(self.doc.name()).await? {
            return Err(EngineError::ActionUnavailable {
                reason: format!("{} already has a travel claim", self.doc.name()),
            });
        }
        let created = collaborators
            .create_derived_document(kind, self.doc.doctype(), self.doc.name())
            .await?;
        debug!(source = self.doc.name(), created = %created.name, "derived document created");
        Ok(created)
    }

    /// Normalize rows, status and totals, then report what blocks saving.
    ///
    /// With a DSA policy, a Travel Authorization's `estimated_amount` is
    /// recomputed before the advance is checked against it.
    pub fn prepare_save(&mut self) -> Result<Vec<Diagnostic>, EngineError> {
        fill_travel_dates(&mut self.doc)?;
        mark_last_day(&mut self.doc)?;
        if self.doc.doctype().kind_of(Field::Status).is_some() {
            let status = self.doc.docstatus().label();
            self.doc.set(Target::Parent, Field::Status, Value::text(status))?;
        }
        if let Some(policy) = &self.dsa_policy {
            if self.doc.doctype() == DocType::TravelAuthorization {
                let estimate = estimate_travel_cost(&self.doc, policy)?;
                self.doc
                    .set(Target::Parent, Field::EstimatedAmount, estimate.into())?;
            }
        }
        if self.doc.doctype() == DocType::TravelClaim {
            let (total, net) = claim_totals(&self.doc);
            self.doc.set(Target::Parent, Field::TotalAmount, total.into())?;
            self.doc.set(Target::Parent, Field::NetAmount, net.into())?;
        }
        Ok(validate_document(&self.doc))
    }

    // ── internals ───────────────────────────────────────────────────────

    fn run_rules(
        &mut self,
        target: Target,
        trigger: Trigger,
        depth: usize,
        report: &mut DispatchReport,
    ) -> Result<(), EngineError> {
        if depth > self.config.max_cascade_depth {
            return Err(EngineError::CascadeDepthExceeded {
                trigger,
                limit: self.config.max_cascade_depth,
            });
        }
        let doctype = self.doc.doctype_of(target)?;
        let registry = Arc::clone(&self.registry);
        for rule in registry.rules_for(doctype, trigger) {
            debug!(rule = rule.name(), %trigger, depth, "fire");
            let outcome = rule.fire(&RuleInput {
                doc: &self.doc,
                target,
                trigger,
            });
            self.apply(rule, target, trigger, outcome, depth, report)?;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        rule: &Arc<dyn Rule>,
        target: Target,
        trigger: Trigger,
        outcome: RuleOutcome,
        depth: usize,
        report: &mut DispatchReport,
    ) -> Result<(), EngineError> {
        if let Some(field) = outcome
            .updates
            .iter()
            .map(|u| u.field)
            .chain(outcome.cancels.iter().copied())
            .find(|f| !rule.writes().contains(f))
        {
            return Err(EngineError::UndeclaredWrite {
                rule: rule.name(),
                field,
            });
        }

        for slot in &outcome.cancels {
            self.cancel(*slot);
        }

        report.diagnostics.extend(outcome.diagnostics);

        for update in outcome.updates {
            let changed = self
                .doc
                .set(update.target, update.field, update.value.clone())?;
            let (update_target, update_field) = (update.target, update.field);
            report.updates.push(update);
            if changed {
                self.run_rules(update_target, Trigger::Change(update_field), depth + 1, report)?;
            }
        }

        for effect in outcome.effects {
            match &effect {
                HostEffect::Hidden { field, hidden } => self.doc.set_hidden(*field, *hidden),
                HostEffect::Description { field, text } => {
                    self.doc.set_description(*field, text.as_str())
                }
                HostEffect::RowAddDisabled { table } => self.doc.disable_row_add(*table),
                HostEffect::OfferActions { .. } => {}
            }
            report.effects.push(effect);
        }

        for (slot, request) in outcome.lookups {
            let pending = self.issue(rule, target, trigger, slot, request);
            report.lookups.push(pending);
        }
        Ok(())
    }

    fn cancel(&mut self, slot: Field) {
        let key = RequestKey {
            document: self.doc.name().to_string(),
            slot,
        };
        if let Some(previous) = self.in_flight.remove(&key) {
            debug!(%key, cancelled = previous.token.0, "request cancelled");
            self.pending.retain(|p| p.key != key);
        }
    }

    fn issue(
        &mut self,
        rule: &Arc<dyn Rule>,
        target: Target,
        trigger: Trigger,
        slot: Field,
        request: LookupRequest,
    ) -> PendingLookup {
        let token = RequestToken(self.next_token);
        self.next_token += 1;
        let key = RequestKey {
            document: self.doc.name().to_string(),
            slot,
        };
        let flight = InFlight {
            token,
            rule: Arc::clone(rule),
            target,
            trigger,
        };
        if let Some(previous) = self.in_flight.insert(key.clone(), flight) {
            debug!(%key, superseded = previous.token.0, token = token.0, "request superseded");
            self.pending.retain(|p| p.key != key);
        }
        let pending = PendingLookup {
            key,
            token,
            request,
        };
        self.pending.push(pending.clone());
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    /// Writes `distance` from `mileage_rate` and back, forever.
    struct PingPong {
        from: Field,
        to: Field,
    }

    impl Rule for PingPong {
        fn name(&self) -> &'static str {
            "ping_pong"
        }
        fn writes(&self) -> &'static [Field] {
            &[Field::MileageRate, Field::Distance]
        }
        fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
            let next = input.get(self.from).flt() + Decimal::ONE;
            RuleOutcome::none().set(input.target, self.to, next)
        }
    }

    struct Sneaky;

    impl Rule for Sneaky {
        fn name(&self) -> &'static str {
            "sneaky"
        }
        fn writes(&self) -> &'static [Field] {
            &[Field::Dsa]
        }
        fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
            RuleOutcome::none().set(input.target, Field::Amount, Decimal::ONE)
        }
    }

    fn claim_with_row() -> (Document, RowId) {
        let mut doc = Document::new(DocType::TravelClaim, "TC-1");
        let row = doc.add_row(Field::Items, RowOrigin::Derived).unwrap();
        (doc, row)
    }

    #[test]
    fn cascade_depth_is_bounded() {
        let mut reg = RuleRegistry::new();
        reg.on_change(
            DocType::TravelClaimItem,
            Field::MileageRate,
            Arc::new(PingPong {
                from: Field::MileageRate,
                to: Field::Distance,
            }),
        )
        .on_change(
            DocType::TravelClaimItem,
            Field::Distance,
            Arc::new(PingPong {
                from: Field::Distance,
                to: Field::MileageRate,
            }),
        );
        let (doc, row) = claim_with_row();
        let mut session = FormSession::new(doc, Arc::new(reg), EngineConfig::default());
        let err = session
            .dispatch(FieldEvent::row(row, Field::MileageRate, Decimal::ONE))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::CascadeDepthExceeded { limit: 8, .. }
        ));
    }

    #[test]
    fn undeclared_write_is_rejected() {
        let mut reg = RuleRegistry::new();
        reg.on_change(DocType::TravelClaimItem, Field::Distance, Arc::new(Sneaky));
        let (doc, row) = claim_with_row();
        let mut session = FormSession::new(doc, Arc::new(reg), EngineConfig::default());
        let err = session
            .dispatch(FieldEvent::row(row, Field::Distance, Decimal::TEN))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::UndeclaredWrite {
                rule: "sneaky",
                field: Field::Amount
            }
        );
        assert_eq!(
            session.document().value(Target::Row(row), Field::Amount),
            &Value::Null
        );
    }

    #[test]
    fn unbound_field_is_a_no_op() {
        let (doc, _) = claim_with_row();
        let mut session = FormSession::new(doc, Arc::new(RuleRegistry::new()), EngineConfig::default());
        let report = session
            .dispatch(FieldEvent::parent(Field::Company, "Acme"))
            .unwrap();
        assert_eq!(report, DispatchReport::default());
        assert_eq!(
            session.document().value(Target::Parent, Field::Company),
            &Value::text("Acme")
        );
    }

    #[test]
    fn unknown_field_is_a_document_error() {
        let (doc, _) = claim_with_row();
        let mut session = FormSession::new(doc, Arc::new(RuleRegistry::new()), EngineConfig::default());
        let err = session
            .dispatch(FieldEvent::parent(Field::Halt, true))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Document(DocumentError::UnknownField { .. })
        ));
    }

    #[test]
    fn unknown_key_reply_is_stale() {
        let (doc, _) = claim_with_row();
        let mut session = FormSession::new(doc, Arc::new(RuleRegistry::new()), EngineConfig::default());
        let key = RequestKey {
            document: "TC-1".to_string(),
            slot: Field::Currency,
        };
        let report = session
            .deliver(&key, RequestToken(7), LookupReply::SalaryCurrency(None))
            .unwrap();
        assert_eq!(report.stale_replies, 1);
    }
}
