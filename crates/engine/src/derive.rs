//! Drafting claims and adjustments from a Travel Authorization.
//!
//! Drafts are built locally so a host (or the CLI) can show them before
//! asking the backend to create the real document.

use hrforms_core::{ChildRow, DocStatus, DocType, Document, Field, RowOrigin, Target, Value};
use rust_decimal::Decimal;
use time::Date;

use crate::error::EngineError;

/// Row fields an adjustment copies from its authorization.
const ITINERARY_FIELDS: [Field; 7] = [
    Field::FromDate,
    Field::ToDate,
    Field::Halt,
    Field::HaltAt,
    Field::TravelFrom,
    Field::TravelTo,
    Field::IsLastDay,
];

/// Daily subsistence allowance settings for a claim draft.
#[derive(Debug, Clone, PartialEq)]
pub struct DsaPolicy {
    /// Full-day allowance for the employee's grade.
    pub dsa: Decimal,
    /// Percentage paid on the return day. Defaults to 100.
    pub return_day_percent: Option<Decimal>,
}

impl DsaPolicy {
    pub fn new(dsa: Decimal) -> Self {
        DsaPolicy {
            dsa,
            return_day_percent: None,
        }
    }

    fn return_percent(&self) -> Decimal {
        match self.return_day_percent {
            Some(p) if !p.is_zero() => p,
            _ => Decimal::ONE_HUNDRED,
        }
    }
}

fn copy_header(from: &Document, to: &mut Document, fields: &[Field]) -> Result<(), EngineError> {
    for field in fields {
        let value = from.value(Target::Parent, *field);
        if value.is_set() {
            to.set(Target::Parent, *field, value.clone())?;
        }
    }
    Ok(())
}

fn too_large(what: &str, name: &str) -> EngineError {
    EngineError::ActionUnavailable {
        reason: format!("{} for {} is too large to compute", what, name),
    }
}

fn travel_dates(row: &ChildRow, pos: usize, name: &str) -> Result<(Date, Date), EngineError> {
    match (
        row.get(Field::FromDate).as_date(),
        row.get(Field::ToDate).as_date(),
    ) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(EngineError::ActionUnavailable {
            reason: format!("Row#{} of {} has no travel dates", pos + 1, name),
        }),
    }
}

fn require_authorization(doc: &Document) -> Result<(), EngineError> {
    if doc.doctype() != DocType::TravelAuthorization {
        return Err(EngineError::ActionUnavailable {
            reason: format!("{} is a {}, not a Travel Authorization", doc.name(), doc.doctype()),
        });
    }
    Ok(())
}

/// Draft a Travel Claim paying DSA for every day of the itinerary.
///
/// Each row pays `no_of_days * dsa`. The return day pays the policy's
/// return-day percentage; other days on international trips are converted
/// with the authorization's exchange rate.
pub fn draft_claim(
    authorization: &Document,
    policy: &DsaPolicy,
    posting_date: Date,
) -> Result<Document, EngineError> {
    require_authorization(authorization)?;
    if policy.dsa.is_zero() {
        return Err(EngineError::ActionUnavailable {
            reason: "Daily Subsistence Allowance (DSA) is not set".to_string(),
        });
    }

    let mut claim = Document::new(
        DocType::TravelClaim,
        format!("new-travel-claim-{}", authorization.name()),
    );
    claim.set(Target::Parent, Field::PostingDate, Value::Date(posting_date))?;
    copy_header(
        authorization,
        &mut claim,
        &[
            Field::Employee,
            Field::EmployeeName,
            Field::Company,
            Field::TravelType,
            Field::AdvanceAmount,
            Field::Currency,
            Field::ExchangeRate,
        ],
    )?;
    claim.set(
        Target::Parent,
        Field::TravelAuthorization,
        Value::text(authorization.name()),
    )?;

    let international =
        authorization.value(Target::Parent, Field::TravelType).as_text() == Some("International");
    let exchange_rate = authorization.value(Target::Parent, Field::ExchangeRate).flt();

    for (pos, row) in authorization.rows(Field::Items)?.iter().enumerate() {
        let (from, to) = travel_dates(row, pos, authorization.name())?;
        let no_of_days = (to - from).whole_days() + 1;

        let (dsa_percent, dsa) = if row.get(Field::IsLastDay).as_flag() {
            let percent = policy.return_percent();
            let dsa = policy
                .dsa
                .checked_mul(percent)
                .and_then(|d| d.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(|| too_large("Return day DSA", authorization.name()))?;
            (percent, dsa)
        } else if international {
            let dsa = policy
                .dsa
                .checked_mul(exchange_rate)
                .ok_or_else(|| too_large("Converted DSA", authorization.name()))?;
            (Decimal::ONE_HUNDRED, dsa)
        } else {
            (Decimal::ONE_HUNDRED, policy.dsa)
        };
        let amount = Decimal::from(no_of_days)
            .checked_mul(dsa)
            .ok_or_else(|| too_large("Claim amount", authorization.name()))?;

        let mut values: Vec<(Field, Value)> = [
            Field::FromDate,
            Field::ToDate,
            Field::TravelFrom,
            Field::TravelTo,
            Field::Country,
            Field::IsLastDay,
        ]
        .into_iter()
        .map(|f| (f, row.get(f).clone()))
        .collect();
        values.extend([
            (Field::NoOfDays, Value::Int(no_of_days)),
            (Field::DsaPercent, Value::Decimal(dsa_percent)),
            (Field::Dsa, Value::Decimal(dsa)),
            (Field::Amount, Value::Decimal(amount)),
        ]);
        claim.add_row_with(Field::Items, RowOrigin::Derived, values)?;
    }
    Ok(claim)
}

/// Estimated cost of an authorized trip, the ceiling for its advance.
///
/// Every row except the return day pays `no_of_days` full allowances; the
/// return day adds `return_day_percent` of one allowance. An unset
/// percentage adds nothing. International trips convert the allowance with
/// the authorization's exchange rate first.
pub fn estimate_travel_cost(
    authorization: &Document,
    policy: &DsaPolicy,
) -> Result<Decimal, EngineError> {
    require_authorization(authorization)?;
    let name = authorization.name();

    let mut days: i64 = 0;
    for (pos, row) in authorization.rows(Field::Items)?.iter().enumerate() {
        if row.get(Field::IsLastDay).as_flag() {
            continue;
        }
        let (from, to) = travel_dates(row, pos, name)?;
        days += (to - from).whole_days() + 1;
    }

    let dsa = if authorization.value(Target::Parent, Field::TravelType).as_text()
        == Some("International")
    {
        let rate = authorization.value(Target::Parent, Field::ExchangeRate).flt();
        policy
            .dsa
            .checked_mul(rate)
            .ok_or_else(|| too_large("Converted DSA", name))?
    } else {
        policy.dsa
    };
    let return_percent = policy.return_day_percent.unwrap_or(Decimal::ZERO);

    dsa.checked_mul(Decimal::from(days))
        .zip(
            dsa.checked_mul(return_percent)
                .and_then(|d| d.checked_div(Decimal::ONE_HUNDRED)),
        )
        .and_then(|(full, last)| full.checked_add(last))
        .ok_or_else(|| too_large("Estimated amount", name))
}

/// Draft a Travel Adjustment. The itinerary is copied twice: into the
/// editable `items` table and the read-only `itinerary` record.
pub fn draft_adjustment(authorization: &Document) -> Result<Document, EngineError> {
    require_authorization(authorization)?;
    if authorization.docstatus() != DocStatus::Submitted {
        return Err(EngineError::ActionUnavailable {
            reason: format!("{} is not submitted", authorization.name()),
        });
    }

    let mut adjustment = Document::new(
        DocType::TravelAdjustment,
        format!("new-travel-adjustment-{}", authorization.name()),
    );
    copy_header(
        authorization,
        &mut adjustment,
        &[Field::Employee, Field::EmployeeName, Field::Company],
    )?;
    adjustment.set(
        Target::Parent,
        Field::TravelAuthorization,
        Value::text(authorization.name()),
    )?;

    for row in authorization.rows(Field::Items)? {
        let values: Vec<(Field, Value)> = ITINERARY_FIELDS
            .into_iter()
            .map(|f| (f, row.get(f).clone()))
            .collect();
        adjustment.add_row_with(Field::Items, RowOrigin::Derived, values.clone())?;
        adjustment.add_row_with(Field::Itinerary, RowOrigin::Derived, values)?;
    }
    Ok(adjustment)
}
