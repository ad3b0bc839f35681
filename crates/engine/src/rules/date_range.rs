//! Itinerary row date ordering.
//!
//! Bound to Travel Authorization Item and Travel Adjustment Item rows.

use hrforms_core::Field;

use crate::rule::{Diagnostic, Rule, RuleInput, RuleOutcome};

pub const TO_DATE_BEFORE_FROM_DATE: &str = "To Date cannot be earlier than From Date";

/// On `from_date` change, a travel (non-halt) row ends the day it starts.
pub struct FromDateAutoFillRule;

impl Rule for FromDateAutoFillRule {
    fn name(&self) -> &'static str {
        "from_date_auto_fill"
    }

    fn writes(&self) -> &'static [Field] {
        &[Field::ToDate]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        if input.get(Field::Halt).as_flag() {
            return RuleOutcome::none();
        }
        match input.get(Field::FromDate).as_date() {
            Some(from) if input.get(Field::ToDate).as_date() != Some(from) => {
                RuleOutcome::none().set(input.target, Field::ToDate, from)
            }
            _ => RuleOutcome::none(),
        }
    }
}

/// On `to_date` change, a date before `from_date` is reported and reset.
pub struct ToDateClampRule;

impl Rule for ToDateClampRule {
    fn name(&self) -> &'static str {
        "to_date_clamp"
    }

    fn writes(&self) -> &'static [Field] {
        &[Field::ToDate]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let from = input.get(Field::FromDate).as_date();
        let to = input.get(Field::ToDate).as_date();
        match (from, to) {
            (Some(from), Some(to)) if to < from => RuleOutcome::none()
                .diagnose(Diagnostic::error(
                    input.target,
                    Some(Field::ToDate),
                    TO_DATE_BEFORE_FROM_DATE,
                ))
                .set(input.target, Field::ToDate, from),
            _ => RuleOutcome::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrforms_core::{parse_date, DocType, Document, RowOrigin, Target, Value};

    use crate::rule::Trigger;

    fn row_doc(values: Vec<(Field, Value)>) -> (Document, Target) {
        let mut doc = Document::new(DocType::TravelAuthorization, "TA-1");
        let row = doc
            .add_row_with(Field::Items, RowOrigin::User, values)
            .unwrap();
        (doc, Target::Row(row))
    }

    fn date(s: &str) -> Value {
        Value::Date(parse_date(s).unwrap())
    }

    #[test]
    fn matching_to_date_is_left_alone() {
        let (doc, target) = row_doc(vec![
            (Field::FromDate, date("2024-03-01")),
            (Field::ToDate, date("2024-03-01")),
        ]);
        let outcome = FromDateAutoFillRule.fire(&RuleInput {
            doc: &doc,
            target,
            trigger: Trigger::Change(Field::FromDate),
        });
        assert!(outcome.is_empty());
    }

    #[test]
    fn cleared_from_date_is_a_no_op() {
        let (doc, target) = row_doc(vec![(Field::ToDate, date("2024-03-01"))]);
        let outcome = ToDateClampRule.fire(&RuleInput {
            doc: &doc,
            target,
            trigger: Trigger::Change(Field::ToDate),
        });
        assert!(outcome.is_empty());
    }

    #[test]
    fn clamp_reports_and_corrects() {
        let (doc, target) = row_doc(vec![
            (Field::FromDate, date("2024-03-05")),
            (Field::ToDate, date("2024-03-01")),
        ]);
        let outcome = ToDateClampRule.fire(&RuleInput {
            doc: &doc,
            target,
            trigger: Trigger::Change(Field::ToDate),
        });
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].is_error());
        assert_eq!(outcome.updates[0].value, date("2024-03-05"));
    }
}
