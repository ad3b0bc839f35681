//! Document currency follows the employee's salary structure.

use hrforms_core::{Field, Value};

use crate::lookup::{LookupReply, LookupRequest};
use crate::rule::{Rule, RuleInput, RuleOutcome};

/// On `employee` change, set `currency` from the employee's salary
/// structure, falling back to the company's default currency.
pub struct CurrencySyncRule;

impl Rule for CurrencySyncRule {
    fn name(&self) -> &'static str {
        "currency_sync"
    }

    fn writes(&self) -> &'static [Field] {
        &[Field::Currency]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        match input.get(Field::Employee).as_text() {
            Some(employee) => RuleOutcome::none().lookup(
                Field::Currency,
                LookupRequest::SalaryCurrency {
                    employee: employee.to_string(),
                },
            ),
            None => RuleOutcome::none().cancel(Field::Currency),
        }
    }

    fn resume(&self, input: &RuleInput<'_>, reply: &LookupReply) -> RuleOutcome {
        match reply {
            LookupReply::SalaryCurrency(Some(currency)) | LookupReply::CompanyCurrency(currency) => {
                RuleOutcome::none().set(input.target, Field::Currency, Value::text(currency.as_str()))
            }
            LookupReply::SalaryCurrency(None) => RuleOutcome::none().lookup(
                Field::Currency,
                LookupRequest::CompanyCurrency {
                    company: input.parent(Field::Company).as_text().map(str::to_string),
                },
            ),
            _ => RuleOutcome::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrforms_core::{DocType, Document, Target};

    use crate::rule::Trigger;

    fn input(doc: &Document) -> RuleInput<'_> {
        RuleInput {
            doc,
            target: Target::Parent,
            trigger: Trigger::Change(Field::Employee),
        }
    }

    #[test]
    fn empty_employee_cancels_currency_lookup() {
        let doc = Document::new(DocType::TravelClaim, "TC-1");
        let outcome = CurrencySyncRule.fire(&input(&doc));
        assert!(outcome.lookups.is_empty());
        assert!(outcome.updates.is_empty());
        assert_eq!(outcome.cancels, vec![Field::Currency]);
    }

    #[test]
    fn missing_salary_currency_asks_company() {
        let mut doc = Document::new(DocType::TravelClaim, "TC-1");
        doc.set(Target::Parent, Field::Company, Value::text("Acme"))
            .unwrap();
        let outcome = CurrencySyncRule.resume(&input(&doc), &LookupReply::SalaryCurrency(None));
        assert_eq!(
            outcome.lookups,
            vec![(
                Field::Currency,
                LookupRequest::CompanyCurrency {
                    company: Some("Acme".to_string())
                }
            )]
        );
    }
}
