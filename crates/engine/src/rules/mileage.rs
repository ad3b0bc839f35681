//! Mileage on claim rows.

use hrforms_core::Field;
use rust_decimal::Decimal;
use tracing::warn;

use crate::rule::{Rule, RuleInput, RuleOutcome};

/// `mileage_amount = mileage_rate * distance`, then the mileage is added
/// to the row's current `amount`. Firing twice adds it twice.
pub struct MileageRule;

impl Rule for MileageRule {
    fn name(&self) -> &'static str {
        "mileage"
    }

    fn writes(&self) -> &'static [Field] {
        &[Field::MileageAmount, Field::Amount]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let rate = input.get(Field::MileageRate).flt();
        let distance = input.get(Field::Distance).flt();
        let mileage = rate.checked_mul(distance).unwrap_or_else(|| {
            warn!(%rate, %distance, "mileage overflow, using zero");
            Decimal::ZERO
        });
        let current = input.get(Field::Amount).flt();
        let amount = mileage.checked_add(current).unwrap_or_else(|| {
            warn!(%mileage, %current, "amount overflow, using zero");
            Decimal::ZERO
        });
        RuleOutcome::none()
            .set(input.target, Field::MileageAmount, mileage)
            .set(input.target, Field::Amount, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrforms_core::{DocType, Document, RowOrigin, Target, Value};

    use crate::rule::Trigger;

    #[test]
    fn garbage_distance_counts_as_zero() {
        let mut doc = Document::new(DocType::TravelClaim, "TC-1");
        let row = doc.add_row(Field::Items, RowOrigin::Derived).unwrap();
        let target = Target::Row(row);
        doc.set(target, Field::MileageRate, Value::Decimal(Decimal::TWO))
            .unwrap();
        doc.set(target, Field::Distance, Value::text("far")).unwrap();
        let outcome = MileageRule.fire(&RuleInput {
            doc: &doc,
            target,
            trigger: Trigger::Change(Field::Distance),
        });
        assert_eq!(outcome.updates[0].value, Value::Decimal(Decimal::ZERO));
        assert_eq!(outcome.updates[1].value, Value::Decimal(Decimal::ZERO));
    }

    #[test]
    fn overflow_is_zero() {
        let mut doc = Document::new(DocType::TravelClaim, "TC-1");
        let row = doc.add_row(Field::Items, RowOrigin::Derived).unwrap();
        let target = Target::Row(row);
        doc.set(target, Field::MileageRate, Value::Decimal(Decimal::MAX))
            .unwrap();
        doc.set(target, Field::Distance, Value::Decimal(Decimal::TEN))
            .unwrap();
        let outcome = MileageRule.fire(&RuleInput {
            doc: &doc,
            target,
            trigger: Trigger::Change(Field::Distance),
        });
        assert_eq!(outcome.updates[0].value, Value::Decimal(Decimal::ZERO));
    }
}
