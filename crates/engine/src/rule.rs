//! The rule contract: what a rule sees, what it may return.
//!
//! Rules are pure. They read the document through a [`RuleInput`] and
//! describe what should happen in a [`RuleOutcome`]; the session applies
//! updates, records diagnostics and effects, and issues lookups.

use std::fmt;

use hrforms_core::{Document, Field, Target, Value};

use crate::lookup::{LookupReply, LookupRequest};

// ──────────────────────────────────────────────
// Triggers and events
// ──────────────────────────────────────────────

/// What a rule is bound to, alongside a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// A field's value changed.
    Change(Field),
    /// The host re-rendered the form.
    Refresh,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Change(field) => write!(f, "change of '{}'", field),
            Trigger::Refresh => f.write_str("refresh"),
        }
    }
}

/// A user edit.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEvent {
    pub target: Target,
    pub field: Field,
    pub value: Value,
}

impl FieldEvent {
    pub fn parent(field: Field, value: impl Into<Value>) -> Self {
        FieldEvent {
            target: Target::Parent,
            field,
            value: value.into(),
        }
    }

    pub fn row(row: hrforms_core::RowId, field: Field, value: impl Into<Value>) -> Self {
        FieldEvent {
            target: Target::Row(row),
            field,
            value: value.into(),
        }
    }
}

// ──────────────────────────────────────────────
// Rule input
// ──────────────────────────────────────────────

/// Read-only view handed to a rule.
pub struct RuleInput<'a> {
    pub doc: &'a Document,
    /// The parent or the row the trigger fired on.
    pub target: Target,
    pub trigger: Trigger,
}

impl<'a> RuleInput<'a> {
    /// A field on the trigger's target.
    pub fn get(&self, field: Field) -> &'a Value {
        self.doc.value(self.target, field)
    }

    /// A field on the parent document.
    pub fn parent(&self, field: Field) -> &'a Value {
        self.doc.value(Target::Parent, field)
    }
}

// ──────────────────────────────────────────────
// Outcomes
// ──────────────────────────────────────────────

/// One field write requested by a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub target: Target,
    pub field: Field,
    pub value: Value,
}

impl FieldUpdate {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "target": target_json(self.target),
            "field": self.field.as_str(),
            "value": self.value.to_json(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks save.
    Error,
    Warning,
}

/// A validation message for the host to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub target: Target,
    pub field: Option<Field>,
}

impl Diagnostic {
    pub fn error(target: Target, field: Option<Field>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            target,
            field,
        }
    }

    pub fn warning(target: Target, field: Option<Field>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            target,
            field,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "severity": match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            },
            "message": self.message,
            "target": target_json(self.target),
            "field": self.field.map(Field::as_str),
        })
    }
}

/// Kinds of document that can be derived from a Travel Authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedKind {
    Advance,
    Claim,
    Adjustment,
}

impl DerivedKind {
    pub const ALL: [DerivedKind; 3] = [
        DerivedKind::Advance,
        DerivedKind::Claim,
        DerivedKind::Adjustment,
    ];

    /// Host framework name of the document type this creates.
    pub fn doctype_name(self) -> &'static str {
        match self {
            DerivedKind::Advance => "Travel Advance",
            DerivedKind::Claim => "Travel Claim",
            DerivedKind::Adjustment => "Travel Adjustment",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DerivedKind::Advance => "advance",
            DerivedKind::Claim => "claim",
            DerivedKind::Adjustment => "adjustment",
        }
    }
}

/// Presentation instructions passed through to the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEffect {
    Hidden { field: Field, hidden: bool },
    Description { field: Field, text: String },
    RowAddDisabled { table: Field },
    OfferActions { kinds: Vec<DerivedKind> },
}

impl HostEffect {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            HostEffect::Hidden { field, hidden } => serde_json::json!({
                "effect": "hidden", "field": field.as_str(), "hidden": hidden,
            }),
            HostEffect::Description { field, text } => serde_json::json!({
                "effect": "description", "field": field.as_str(), "text": text,
            }),
            HostEffect::RowAddDisabled { table } => serde_json::json!({
                "effect": "row_add_disabled", "table": table.as_str(),
            }),
            HostEffect::OfferActions { kinds } => serde_json::json!({
                "effect": "offer_actions",
                "kinds": kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            }),
        }
    }
}

/// Everything a single rule invocation asks for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub updates: Vec<FieldUpdate>,
    pub diagnostics: Vec<Diagnostic>,
    pub effects: Vec<HostEffect>,
    /// Remote lookups, each under the slot field it will eventually write.
    pub lookups: Vec<(Field, LookupRequest)>,
    /// Slots whose outstanding lookup no longer applies.
    pub cancels: Vec<Field>,
}

impl RuleOutcome {
    pub fn none() -> Self {
        RuleOutcome::default()
    }

    pub fn set(mut self, target: Target, field: Field, value: impl Into<Value>) -> Self {
        self.updates.push(FieldUpdate {
            target,
            field,
            value: value.into(),
        });
        self
    }

    pub fn diagnose(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    pub fn effect(mut self, effect: HostEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn lookup(mut self, slot: Field, request: LookupRequest) -> Self {
        self.lookups.push((slot, request));
        self
    }

    /// Drop any in-flight lookup for `slot`; a late reply is discarded.
    pub fn cancel(mut self, slot: Field) -> Self {
        self.cancels.push(slot);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
            && self.diagnostics.is_empty()
            && self.effects.is_empty()
            && self.lookups.is_empty()
            && self.cancels.is_empty()
    }
}

// ──────────────────────────────────────────────
// Rule trait
// ──────────────────────────────────────────────

/// A reactive computation bound to a field-change or lifecycle trigger.
pub trait Rule: Send + Sync {
    /// Stable identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Fields this rule may write. Any other write aborts the dispatch.
    fn writes(&self) -> &'static [Field];

    /// React to the trigger.
    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome;

    /// Continue after a lookup this rule issued has been answered.
    fn resume(&self, _input: &RuleInput<'_>, _reply: &LookupReply) -> RuleOutcome {
        RuleOutcome::none()
    }
}

pub(crate) fn target_json(target: Target) -> serde_json::Value {
    match target {
        Target::Parent => serde_json::Value::String("parent".to_string()),
        Target::Row(id) => serde_json::json!({ "row": id.0 }),
    }
}
