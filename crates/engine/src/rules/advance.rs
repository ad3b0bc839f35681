//! Advance requested on a Travel Authorization.

use hrforms_core::{Field, Value};

use crate::rule::{Diagnostic, Rule, RuleInput, RuleOutcome};

pub const ADVANCE_EXCEEDS_ESTIMATE: &str = "Advance amount cannot exceed the estimated amount";

/// Reports an advance larger than the estimated trip cost.
pub struct AdvanceLimitRule;

impl AdvanceLimitRule {
    pub fn check(advance: &Value, estimated: &Value) -> bool {
        advance.flt() <= estimated.flt()
    }
}

impl Rule for AdvanceLimitRule {
    fn name(&self) -> &'static str {
        "advance_limit"
    }

    fn writes(&self) -> &'static [Field] {
        &[]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        if Self::check(input.get(Field::AdvanceAmount), input.get(Field::EstimatedAmount)) {
            return RuleOutcome::none();
        }
        RuleOutcome::none().diagnose(Diagnostic::error(
            input.target,
            Some(Field::AdvanceAmount),
            ADVANCE_EXCEEDS_ESTIMATE,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn limit() {
        let ten = Value::Decimal(Decimal::TEN);
        assert!(AdvanceLimitRule::check(&ten, &ten));
        assert!(AdvanceLimitRule::check(&Value::Null, &Value::Null));
        assert!(!AdvanceLimitRule::check(&ten, &Value::Null));
    }
}
