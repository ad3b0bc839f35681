//! Document types, enumerated field identifiers and per-type schemas.
//!
//! Every field a rule can read or write is a [`Field`] variant. A
//! [`DocType`] schema lists which fields exist on that type and how their
//! values are interpreted, so a misspelled or misplaced field is caught
//! when the document is touched rather than silently read as empty.

use std::fmt;

// ──────────────────────────────────────────────
// DocType
// ──────────────────────────────────────────────

/// A structured record type known to the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocType {
    TravelAuthorization,
    TravelAuthorizationItem,
    TravelClaim,
    TravelClaimItem,
    TravelAdjustment,
    TravelAdjustmentItem,
}

impl DocType {
    pub const ALL: [DocType; 6] = [
        DocType::TravelAuthorization,
        DocType::TravelAuthorizationItem,
        DocType::TravelClaim,
        DocType::TravelClaimItem,
        DocType::TravelAdjustment,
        DocType::TravelAdjustmentItem,
    ];

    /// The host framework's name for this type, e.g. `"Travel Claim"`.
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::TravelAuthorization => "Travel Authorization",
            DocType::TravelAuthorizationItem => "Travel Authorization Item",
            DocType::TravelClaim => "Travel Claim",
            DocType::TravelClaimItem => "Travel Claim Item",
            DocType::TravelAdjustment => "Travel Adjustment",
            DocType::TravelAdjustmentItem => "Travel Adjustment Item",
        }
    }

    pub fn from_name(name: &str) -> Option<DocType> {
        DocType::ALL.into_iter().find(|d| d.as_str() == name)
    }

    /// Whether this type only ever appears as a child row.
    pub fn is_child(self) -> bool {
        matches!(
            self,
            DocType::TravelAuthorizationItem
                | DocType::TravelClaimItem
                | DocType::TravelAdjustmentItem
        )
    }

    /// The declared fields of this type, in form order.
    pub fn schema(self) -> &'static [(Field, FieldKind)] {
        use Field::*;
        use FieldKind::*;
        match self {
            DocType::TravelAuthorization => &[
                (Employee, Link),
                (EmployeeName, Data),
                (Company, Link),
                (Status, Data),
                (PostingDate, FieldKind::Date),
                (TravelType, Link),
                (Supervisor, Link),
                (Approver, Link),
                (Field::Currency, Link),
                (ExchangeRate, Float),
                (AdvanceAmount, FieldKind::Currency),
                (EstimatedAmount, FieldKind::Currency),
                (
                    Items,
                    Table {
                        child: DocType::TravelAuthorizationItem,
                        allow_user_rows: true,
                    },
                ),
            ],
            DocType::TravelAuthorizationItem => &[
                (FromDate, FieldKind::Date),
                (ToDate, FieldKind::Date),
                (Halt, Check),
                (HaltAt, Data),
                (TravelFrom, Data),
                (TravelTo, Data),
                (Country, Link),
                (IsLastDay, Check),
            ],
            DocType::TravelClaim => &[
                (Employee, Link),
                (EmployeeName, Data),
                (Company, Link),
                (PostingDate, FieldKind::Date),
                (TravelType, Link),
                (TravelAuthorization, Link),
                (Supervisor, Link),
                (Approver, Link),
                (Field::Currency, Link),
                (ExchangeRate, Float),
                (AdvanceAmount, FieldKind::Currency),
                (MiscellaneousAmount, FieldKind::Currency),
                (TotalAmount, FieldKind::Currency),
                (NetAmount, FieldKind::Currency),
                (
                    Items,
                    Table {
                        child: DocType::TravelClaimItem,
                        allow_user_rows: false,
                    },
                ),
            ],
            DocType::TravelClaimItem => &[
                (FromDate, FieldKind::Date),
                (ToDate, FieldKind::Date),
                (TravelFrom, Data),
                (TravelTo, Data),
                (Country, Link),
                (IsLastDay, Check),
                (NoOfDays, Int),
                (DsaPercent, Float),
                (Dsa, FieldKind::Currency),
                (MileageRate, FieldKind::Currency),
                (Distance, Float),
                (MileageAmount, FieldKind::Currency),
                (Amount, FieldKind::Currency),
            ],
            DocType::TravelAdjustment => &[
                (Employee, Link),
                (EmployeeName, Data),
                (Company, Link),
                (TravelAuthorization, Link),
                (
                    Items,
                    Table {
                        child: DocType::TravelAdjustmentItem,
                        allow_user_rows: true,
                    },
                ),
                (
                    Itinerary,
                    Table {
                        child: DocType::TravelAdjustmentItem,
                        allow_user_rows: false,
                    },
                ),
            ],
            DocType::TravelAdjustmentItem => &[
                (FromDate, FieldKind::Date),
                (ToDate, FieldKind::Date),
                (Halt, Check),
                (HaltAt, Data),
                (TravelFrom, Data),
                (TravelTo, Data),
                (IsLastDay, Check),
            ],
        }
    }

    /// Kind of `field` on this type, or `None` if the type lacks it.
    pub fn kind_of(self, field: Field) -> Option<FieldKind> {
        self.schema()
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, k)| *k)
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// FieldKind
// ──────────────────────────────────────────────

/// How a field's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Reference to another record, stored as its name.
    Link,
    Data,
    Currency,
    Float,
    Int,
    Date,
    Check,
    /// Child table. `allow_user_rows` is false for grids whose rows are
    /// always derived programmatically.
    Table { child: DocType, allow_user_rows: bool },
}

// ──────────────────────────────────────────────
// Field
// ──────────────────────────────────────────────

macro_rules! fields {
    ($($variant:ident => $name:literal,)+) => {
        /// Enumerated field identifier shared across all document types.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Field {
            $($variant,)+
        }

        impl Field {
            pub const ALL: &'static [Field] = &[$(Field::$variant,)+];

            /// Wire name of the field, e.g. `"exchange_rate"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Field::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Field> {
                match name {
                    $($name => Some(Field::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

fields! {
    Employee => "employee",
    EmployeeName => "employee_name",
    Company => "company",
    Status => "status",
    PostingDate => "posting_date",
    TravelType => "travel_type",
    TravelAuthorization => "travel_authorization",
    Supervisor => "supervisor",
    Approver => "approver",
    Currency => "currency",
    ExchangeRate => "exchange_rate",
    AdvanceAmount => "advance_amount",
    EstimatedAmount => "estimated_amount",
    MiscellaneousAmount => "miscellaneous_amount",
    TotalAmount => "total_amount",
    NetAmount => "net_amount",
    Items => "items",
    Itinerary => "itinerary",
    FromDate => "from_date",
    ToDate => "to_date",
    Halt => "halt",
    HaltAt => "halt_at",
    TravelFrom => "travel_from",
    TravelTo => "travel_to",
    Country => "country",
    IsLastDay => "is_last_day",
    NoOfDays => "no_of_days",
    DsaPercent => "dsa_percent",
    Dsa => "dsa",
    MileageRate => "mileage_rate",
    Distance => "distance",
    MileageAmount => "mileage_amount",
    Amount => "amount",
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// DocStatus
// ──────────────────────────────────────────────

/// Lifecycle state of a document in the host framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocStatus {
    #[default]
    Draft,
    Submitted,
    Cancelled,
}

impl DocStatus {
    pub fn from_code(code: i64) -> Option<DocStatus> {
        match code {
            0 => Some(DocStatus::Draft),
            1 => Some(DocStatus::Submitted),
            2 => Some(DocStatus::Cancelled),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            DocStatus::Draft => 0,
            DocStatus::Submitted => 1,
            DocStatus::Cancelled => 2,
        }
    }

    /// Text written to a document's `status` field.
    pub fn label(self) -> &'static str {
        match self {
            DocStatus::Draft => "Draft",
            DocStatus::Submitted => "Submitted",
            DocStatus::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctype_names_round_trip() {
        for dt in DocType::ALL {
            assert_eq!(DocType::from_name(dt.as_str()), Some(dt));
        }
        assert_eq!(DocType::from_name("Expense Claim"), None);
    }

    #[test]
    fn field_names_are_unique() {
        let mut names: Vec<_> = Field::ALL.iter().map(|f| f.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Field::ALL.len());
        assert_eq!(Field::from_name("mileage_rate"), Some(Field::MileageRate));
    }

    #[test]
    fn claim_items_grid_is_locked() {
        assert_eq!(
            DocType::TravelClaim.kind_of(Field::Items),
            Some(FieldKind::Table {
                child: DocType::TravelClaimItem,
                allow_user_rows: false,
            })
        );
        assert!(matches!(
            DocType::TravelAuthorization.kind_of(Field::Items),
            Some(FieldKind::Table {
                allow_user_rows: true,
                ..
            })
        ));
    }

    #[test]
    fn child_types_have_no_tables() {
        for dt in DocType::ALL.into_iter().filter(|d| d.is_child()) {
            assert!(dt
                .schema()
                .iter()
                .all(|(_, k)| !matches!(k, FieldKind::Table { .. })));
        }
    }

    #[test]
    fn docstatus_codes_and_labels() {
        assert_eq!(DocStatus::from_code(1), Some(DocStatus::Submitted));
        assert_eq!(DocStatus::from_code(7), None);
        assert_eq!(DocStatus::Cancelled.label(), "Cancelled");
        assert_eq!(DocStatus::default().label(), "Draft");
    }

    #[test]
    fn mileage_fields_only_on_claim_items() {
        assert!(DocType::TravelClaimItem.kind_of(Field::Distance).is_some());
        assert!(DocType::TravelAuthorizationItem
            .kind_of(Field::Distance)
            .is_none());
    }
}
