//! Claim header totals.

use hrforms_core::{Document, Field, Target};
use rust_decimal::Decimal;

use crate::rule::{Rule, RuleInput, RuleOutcome};

/// `(total_amount, net_amount)` of a claim: row amounts plus
/// miscellaneous, then minus the advance already paid.
pub fn claim_totals(doc: &Document) -> (Decimal, Decimal) {
    let rows_total = doc
        .rows(Field::Items)
        .unwrap_or(&[])
        .iter()
        .map(|row| row.get(Field::Amount).flt())
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let total =
        rows_total.saturating_add(doc.value(Target::Parent, Field::MiscellaneousAmount).flt());
    let net = total.saturating_sub(doc.value(Target::Parent, Field::AdvanceAmount).flt());
    (total, net)
}

pub struct ClaimTotalsRule;

impl Rule for ClaimTotalsRule {
    fn name(&self) -> &'static str {
        "claim_totals"
    }

    fn writes(&self) -> &'static [Field] {
        &[Field::TotalAmount, Field::NetAmount]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let (total, net) = claim_totals(input.doc);
        RuleOutcome::none()
            .set(Target::Parent, Field::TotalAmount, total)
            .set(Target::Parent, Field::NetAmount, net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrforms_core::{DocType, RowOrigin, Value};

    #[test]
    fn totals_include_misc_and_advance() {
        let mut doc = Document::new(DocType::TravelClaim, "TC-1");
        for amount in [Decimal::new(1500, 2), Decimal::new(500, 2)] {
            doc.add_row_with(
                Field::Items,
                RowOrigin::Derived,
                [(Field::Amount, Value::Decimal(amount))],
            )
            .unwrap();
        }
        doc.set(Target::Parent, Field::MiscellaneousAmount, Value::text("5"))
            .unwrap();
        doc.set(Target::Parent, Field::AdvanceAmount, Value::Decimal(Decimal::TEN))
            .unwrap();
        assert_eq!(claim_totals(&doc), (Decimal::new(25, 0), Decimal::new(15, 0)));
    }

    #[test]
    fn empty_claim_is_zero() {
        let doc = Document::new(DocType::TravelClaim, "TC-1");
        assert_eq!(claim_totals(&doc), (Decimal::ZERO, Decimal::ZERO));
    }
}
