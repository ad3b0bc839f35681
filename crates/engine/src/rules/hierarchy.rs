//! Supervisor and approver follow the employee.

use hrforms_core::{Field, Value};

use crate::lookup::{LookupReply, LookupRequest};
use crate::rule::{Rule, RuleInput, RuleOutcome};

pub struct EmployeeHierarchyRule;

fn link(value: &Option<String>) -> Value {
    value
        .as_deref()
        .map(Value::from)
        .unwrap_or(Value::Null)
}

impl Rule for EmployeeHierarchyRule {
    fn name(&self) -> &'static str {
        "employee_hierarchy"
    }

    fn writes(&self) -> &'static [Field] {
        &[Field::Supervisor, Field::Approver]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let Some(employee) = input.get(Field::Employee).as_text() else {
            return RuleOutcome::none()
                .cancel(Field::Supervisor)
                .cancel(Field::Approver)
                .set(input.target, Field::Supervisor, Value::Null)
                .set(input.target, Field::Approver, Value::Null);
        };
        RuleOutcome::none()
            .lookup(
                Field::Supervisor,
                LookupRequest::ReportsTo {
                    employee: employee.to_string(),
                },
            )
            .lookup(
                Field::Approver,
                LookupRequest::Approver {
                    employee: employee.to_string(),
                },
            )
    }

    fn resume(&self, input: &RuleInput<'_>, reply: &LookupReply) -> RuleOutcome {
        match reply {
            LookupReply::ReportsTo(supervisor) => {
                RuleOutcome::none().set(input.target, Field::Supervisor, link(supervisor))
            }
            LookupReply::Approver(approver) => {
                RuleOutcome::none().set(input.target, Field::Approver, link(approver))
            }
            _ => RuleOutcome::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrforms_core::{DocType, Document, Target};

    use crate::rule::Trigger;

    #[test]
    fn cleared_employee_clears_links() {
        let doc = Document::new(DocType::TravelAuthorization, "TA-1");
        let outcome = EmployeeHierarchyRule.fire(&RuleInput {
            doc: &doc,
            target: Target::Parent,
            trigger: Trigger::Change(Field::Employee),
        });
        assert!(outcome.lookups.is_empty());
        assert_eq!(outcome.updates.len(), 2);
        assert!(outcome.updates.iter().all(|u| u.value == Value::Null));
        assert_eq!(outcome.cancels, vec![Field::Supervisor, Field::Approver]);
    }

    #[test]
    fn missing_supervisor_is_null() {
        assert_eq!(link(&None), Value::Null);
        assert_eq!(link(&Some("EMP-7".to_string())), Value::text("EMP-7"));
    }
}
