//! Ordered rule lists keyed by (document type, trigger).

use std::collections::HashMap;
use std::sync::Arc;

use hrforms_core::{DocType, Field};

use crate::rule::{Rule, Trigger};

/// Registry of rules. Rules for the same key run in registration order.
#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<(DocType, Trigger), Vec<Arc<dyn Rule>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, doctype: DocType, trigger: Trigger, rule: Arc<dyn Rule>) {
        self.rules.entry((doctype, trigger)).or_default().push(rule);
    }

    pub fn on_change(&mut self, doctype: DocType, field: Field, rule: Arc<dyn Rule>) -> &mut Self {
        self.register(doctype, Trigger::Change(field), rule);
        self
    }

    pub fn on_refresh(&mut self, doctype: DocType, rule: Arc<dyn Rule>) -> &mut Self {
        self.register(doctype, Trigger::Refresh, rule);
        self
    }

    /// Rules bound to the key, in order. Unbound keys yield an empty slice.
    pub fn rules_for(&self, doctype: DocType, trigger: Trigger) -> &[Arc<dyn Rule>] {
        self.rules
            .get(&(doctype, trigger))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RuleInput, RuleOutcome};

    struct Named(&'static str);

    impl Rule for Named {
        fn name(&self) -> &'static str {
            self.0
        }
        fn writes(&self) -> &'static [Field] {
            &[]
        }
        fn fire(&self, _input: &RuleInput<'_>) -> RuleOutcome {
            RuleOutcome::none()
        }
    }

    #[test]
    fn keeps_registration_order() {
        let mut reg = RuleRegistry::new();
        reg.on_change(DocType::TravelClaim, Field::Currency, Arc::new(Named("a")))
            .on_change(DocType::TravelClaim, Field::Currency, Arc::new(Named("b")));
        let names: Vec<_> = reg
            .rules_for(DocType::TravelClaim, Trigger::Change(Field::Currency))
            .iter()
            .map(|r| r.name())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn unknown_key_is_empty() {
        let reg = RuleRegistry::new();
        assert!(reg
            .rules_for(DocType::TravelAdjustment, Trigger::Refresh)
            .is_empty());
        assert!(reg.is_empty());
    }
}
