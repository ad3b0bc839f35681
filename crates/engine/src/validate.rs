//! Save-time normalization and validation of itinerary rows and amounts.

use hrforms_core::{DocType, Document, DocumentError, Field, Target, Value};

use crate::rule::Diagnostic;
use crate::rules::advance::{AdvanceLimitRule, ADVANCE_EXCEEDS_ESTIMATE};

pub const EXCHANGE_RATE_ZERO: &str = "Exchange Rate cannot be zero.";

/// Non-halt authorization rows end the day they start.
pub fn fill_travel_dates(doc: &mut Document) -> Result<(), DocumentError> {
    if doc.doctype() != DocType::TravelAuthorization {
        return Ok(());
    }
    let fills: Vec<_> = doc
        .rows(Field::Items)?
        .iter()
        .filter(|row| !row.get(Field::Halt).as_flag())
        .filter_map(|row| row.get(Field::FromDate).as_date().map(|d| (row.id(), d)))
        .collect();
    for (id, from) in fills {
        doc.set(Target::Row(id), Field::ToDate, Value::Date(from))?;
    }
    Ok(())
}

/// Flag the final itinerary row with `is_last_day`. Authorizations only
/// flag when there is more than one row.
pub fn mark_last_day(doc: &mut Document) -> Result<(), DocumentError> {
    let min_rows = match doc.doctype() {
        DocType::TravelAuthorization => 2,
        DocType::TravelAdjustment => 1,
        _ => return Ok(()),
    };
    let ids: Vec<_> = doc.rows(Field::Items)?.iter().map(|r| r.id()).collect();
    if ids.len() < min_rows {
        return Ok(());
    }
    let last = ids.len() - 1;
    for (pos, id) in ids.into_iter().enumerate() {
        doc.set(Target::Row(id), Field::IsLastDay, Value::Bool(pos == last))?;
    }
    Ok(())
}

/// Everything that blocks saving `doc`. An empty result means it may be
/// saved.
pub fn validate_document(doc: &Document) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    match doc.doctype() {
        DocType::TravelAuthorization => {
            check_rows(doc, &mut out);
            check_overlap(doc, &mut out);
            check_exchange_rate(doc, &mut out);
            if !AdvanceLimitRule::check(
                doc.value(Target::Parent, Field::AdvanceAmount),
                doc.value(Target::Parent, Field::EstimatedAmount),
            ) {
                out.push(Diagnostic::error(
                    Target::Parent,
                    Some(Field::AdvanceAmount),
                    ADVANCE_EXCEEDS_ESTIMATE,
                ));
            }
        }
        DocType::TravelAdjustment => check_overlap(doc, &mut out),
        _ => {}
    }
    out
}

fn check_rows(doc: &Document, out: &mut Vec<Diagnostic>) {
    for (pos, row) in doc.rows(Field::Items).unwrap_or(&[]).iter().enumerate() {
        let idx = pos + 1;
        let target = Target::Row(row.id());
        if row.get(Field::Halt).as_flag() {
            if !row.get(Field::HaltAt).is_set() {
                out.push(Diagnostic::error(
                    target,
                    Some(Field::HaltAt),
                    format!("Row#{}: Halt at is mandatory.", idx),
                ));
            }
            match (row.get(Field::FromDate).as_date(), row.get(Field::ToDate).as_date()) {
                (_, None) => out.push(Diagnostic::error(
                    target,
                    Some(Field::ToDate),
                    format!("Row#{}: Till Date is mandatory.", idx),
                )),
                (Some(from), Some(to)) if to < from => out.push(Diagnostic::error(
                    target,
                    Some(Field::ToDate),
                    format!("Row#{}: Till Date cannot be earlier than From Date.", idx),
                )),
                _ => {}
            }
        } else if !(row.get(Field::TravelFrom).is_set() && row.get(Field::TravelTo).is_set()) {
            out.push(Diagnostic::error(
                target,
                Some(Field::TravelFrom),
                format!("Row#{}: Travel From and Travel To are mandatory.", idx),
            ));
        }
    }
}

fn check_overlap(doc: &Document, out: &mut Vec<Diagnostic>) {
    let spans: Vec<_> = doc
        .rows(Field::Items)
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .filter_map(|(pos, row)| {
            let from = row.get(Field::FromDate).as_date()?;
            let to = row.get(Field::ToDate).as_date()?;
            Some((pos + 1, row.id(), from, to))
        })
        .collect();
    for (i, (idx, id, from, to)) in spans.iter().enumerate() {
        for (other_idx, _, other_from, other_to) in &spans[i + 1..] {
            if from <= other_to && to >= other_from {
                out.push(Diagnostic::error(
                    Target::Row(*id),
                    Some(Field::FromDate),
                    format!(
                        "Row#{}: Dates are overlapping with dates in Row#{}",
                        idx, other_idx
                    ),
                ));
            }
        }
    }
}

fn check_exchange_rate(doc: &Document, out: &mut Vec<Diagnostic>) {
    let domestic = doc.value(Target::Parent, Field::TravelType).as_text() == Some("Domestic");
    if !domestic && doc.value(Target::Parent, Field::ExchangeRate).flt().is_zero() {
        out.push(Diagnostic::error(
            Target::Parent,
            Some(Field::ExchangeRate),
            EXCHANGE_RATE_ZERO,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrforms_core::{parse_date, RowOrigin};
    use rust_decimal::Decimal;

    fn date(s: &str) -> Value {
        Value::Date(parse_date(s).unwrap())
    }

    fn domestic_authorization() -> Document {
        let mut doc = Document::new(DocType::TravelAuthorization, "TA-1");
        doc.set(Target::Parent, Field::TravelType, Value::text("Domestic"))
            .unwrap();
        doc
    }

    fn travel_row(doc: &mut Document, from: &str, to: &str) {
        doc.add_row_with(
            Field::Items,
            RowOrigin::User,
            [
                (Field::FromDate, date(from)),
                (Field::ToDate, date(to)),
                (Field::TravelFrom, Value::text("Thimphu")),
                (Field::TravelTo, Value::text("Paro")),
            ],
        )
        .unwrap();
    }

    #[test]
    fn clean_authorization_passes() {
        let mut doc = domestic_authorization();
        travel_row(&mut doc, "2024-03-01", "2024-03-01");
        travel_row(&mut doc, "2024-03-02", "2024-03-02");
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn overlapping_rows_name_both_positions() {
        let mut doc = domestic_authorization();
        travel_row(&mut doc, "2024-03-01", "2024-03-03");
        travel_row(&mut doc, "2024-03-03", "2024-03-04");
        let diags = validate_document(&doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "Row#1: Dates are overlapping with dates in Row#2"
        );
    }

    #[test]
    fn halt_row_needs_place_and_till_date() {
        let mut doc = domestic_authorization();
        doc.add_row_with(
            Field::Items,
            RowOrigin::User,
            [(Field::Halt, Value::Bool(true)), (Field::FromDate, date("2024-03-01"))],
        )
        .unwrap();
        let messages: Vec<_> = validate_document(&doc)
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Row#1: Halt at is mandatory.".to_string(),
                "Row#1: Till Date is mandatory.".to_string(),
            ]
        );
    }

    #[test]
    fn travel_row_needs_endpoints() {
        let mut doc = domestic_authorization();
        doc.add_row_with(Field::Items, RowOrigin::User, [(Field::FromDate, date("2024-03-01"))])
            .unwrap();
        let diags = validate_document(&doc);
        assert_eq!(diags[0].message, "Row#1: Travel From and Travel To are mandatory.");
    }

    #[test]
    fn international_needs_exchange_rate() {
        let mut doc = Document::new(DocType::TravelAuthorization, "TA-1");
        doc.set(Target::Parent, Field::TravelType, Value::text("International"))
            .unwrap();
        let diags = validate_document(&doc);
        assert_eq!(diags[0].message, EXCHANGE_RATE_ZERO);

        doc.set(Target::Parent, Field::ExchangeRate, Value::Decimal(Decimal::ONE))
            .unwrap();
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn single_authorization_row_is_not_flagged() {
        let mut doc = domestic_authorization();
        travel_row(&mut doc, "2024-03-01", "2024-03-01");
        mark_last_day(&mut doc).unwrap();
        assert_eq!(doc.rows(Field::Items).unwrap()[0].get(Field::IsLastDay), &Value::Null);
    }

    #[test]
    fn adjustment_flags_last_row() {
        let mut doc = Document::new(DocType::TravelAdjustment, "TADJ-1");
        travel_row(&mut doc, "2024-03-01", "2024-03-01");
        travel_row(&mut doc, "2024-03-02", "2024-03-02");
        mark_last_day(&mut doc).unwrap();
        let flags: Vec<_> = doc
            .rows(Field::Items)
            .unwrap()
            .iter()
            .map(|r| r.get(Field::IsLastDay).as_flag())
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn travel_rows_end_on_start_day() {
        let mut doc = domestic_authorization();
        travel_row(&mut doc, "2024-03-01", "2024-03-04");
        fill_travel_dates(&mut doc).unwrap();
        assert_eq!(
            doc.rows(Field::Items).unwrap()[0].get(Field::ToDate),
            &date("2024-03-01")
        );
    }
}
