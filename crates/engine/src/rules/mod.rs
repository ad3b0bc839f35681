//! The travel form rule set.
//!
//! | doc type | trigger | rules |
//! |---|---|---|
//! | Travel Authorization, Travel Claim | `employee` | currency sync, hierarchy |
//! | Travel Authorization, Travel Claim | `currency` | exchange rate |
//! | Travel Claim Item | `mileage_rate`, `distance` | mileage |
//! | Travel Claim Item | `amount` | claim totals |
//! | Travel Claim | `miscellaneous_amount`, `advance_amount` | claim totals |
//! | Travel Authorization Item, Travel Adjustment Item | `from_date` | to-date auto-fill |
//! | Travel Authorization Item, Travel Adjustment Item | `to_date` | to-date clamp |
//! | Travel Authorization | `advance_amount`, `estimated_amount` | advance limit |
//! | Travel Claim | refresh | grid lock |
//! | Travel Authorization | refresh | derived actions |

pub mod advance;
pub mod currency;
pub mod date_range;
pub mod exchange_rate;
pub mod hierarchy;
pub mod mileage;
pub mod refresh;
pub mod totals;

use std::sync::Arc;

use hrforms_core::{DocType, Field};

use crate::registry::RuleRegistry;

pub use advance::AdvanceLimitRule;
pub use currency::CurrencySyncRule;
pub use date_range::{FromDateAutoFillRule, ToDateClampRule};
pub use exchange_rate::ExchangeRateRule;
pub use hierarchy::EmployeeHierarchyRule;
pub use mileage::MileageRule;
pub use refresh::{ClaimGridLockRule, DerivedActionsRule};
pub use totals::ClaimTotalsRule;

/// Registry with every travel form rule wired in.
pub fn standard_registry() -> RuleRegistry {
    let mut reg = RuleRegistry::new();

    for doctype in [DocType::TravelAuthorization, DocType::TravelClaim] {
        reg.on_change(doctype, Field::Employee, Arc::new(CurrencySyncRule))
            .on_change(doctype, Field::Employee, Arc::new(EmployeeHierarchyRule))
            .on_change(doctype, Field::Currency, Arc::new(ExchangeRateRule));
    }

    reg.on_change(DocType::TravelClaimItem, Field::MileageRate, Arc::new(MileageRule))
        .on_change(DocType::TravelClaimItem, Field::Distance, Arc::new(MileageRule))
        .on_change(DocType::TravelClaimItem, Field::Amount, Arc::new(ClaimTotalsRule))
        .on_change(DocType::TravelClaim, Field::MiscellaneousAmount, Arc::new(ClaimTotalsRule))
        .on_change(DocType::TravelClaim, Field::AdvanceAmount, Arc::new(ClaimTotalsRule));

    for doctype in [DocType::TravelAuthorizationItem, DocType::TravelAdjustmentItem] {
        reg.on_change(doctype, Field::FromDate, Arc::new(FromDateAutoFillRule))
            .on_change(doctype, Field::ToDate, Arc::new(ToDateClampRule));
    }

    reg.on_change(DocType::TravelAuthorization, Field::AdvanceAmount, Arc::new(AdvanceLimitRule))
        .on_change(DocType::TravelAuthorization, Field::EstimatedAmount, Arc::new(AdvanceLimitRule));

    reg.on_refresh(DocType::TravelClaim, Arc::new(ClaimGridLockRule))
        .on_refresh(DocType::TravelAuthorization, Arc::new(DerivedActionsRule));

    reg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Trigger;

    #[test]
    fn employee_rules_run_currency_first() {
        let reg = standard_registry();
        let names: Vec<_> = reg
            .rules_for(DocType::TravelClaim, Trigger::Change(Field::Employee))
            .iter()
            .map(|r| r.name())
            .collect();
        assert_eq!(names, vec!["currency_sync", "employee_hierarchy"]);
    }

    #[test]
    fn adjustment_parent_has_no_change_rules() {
        let reg = standard_registry();
        for (field, _) in DocType::TravelAdjustment.schema() {
            assert!(reg
                .rules_for(DocType::TravelAdjustment, Trigger::Change(*field))
                .is_empty());
        }
    }
}
