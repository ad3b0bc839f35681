//! Rules that run when the host re-renders a form.

use hrforms_core::{DocStatus, Field};

use crate::lookup::{LookupReply, LookupRequest};
use crate::rule::{DerivedKind, HostEffect, Rule, RuleInput, RuleOutcome};

/// Claim rows come from the authorization; users cannot add them.
pub struct ClaimGridLockRule;

impl Rule for ClaimGridLockRule {
    fn name(&self) -> &'static str {
        "claim_grid_lock"
    }

    fn writes(&self) -> &'static [Field] {
        &[]
    }

    fn fire(&self, _input: &RuleInput<'_>) -> RuleOutcome {
        RuleOutcome::none().effect(HostEffect::RowAddDisabled {
            table: Field::Items,
        })
    }
}

/// A submitted authorization without a claim offers the derived documents.
pub struct DerivedActionsRule;

impl Rule for DerivedActionsRule {
    fn name(&self) -> &'static str {
        "derived_actions"
    }

    fn writes(&self) -> &'static [Field] {
        &[]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        if input.doc.docstatus() != DocStatus::Submitted {
            return RuleOutcome::none();
        }
        RuleOutcome::none().lookup(
            Field::Status,
            LookupRequest::HasClaim {
                authorization: input.doc.name().to_string(),
            },
        )
    }

    fn resume(&self, _input: &RuleInput<'_>, reply: &LookupReply) -> RuleOutcome {
        match reply {
            LookupReply::HasClaim(false) => RuleOutcome::none().effect(HostEffect::OfferActions {
                kinds: DerivedKind::ALL.to_vec(),
            }),
            _ => RuleOutcome::none(),
        }
    }
}
