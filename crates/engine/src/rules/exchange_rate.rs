//! Exchange rate between the document currency and the company currency.

use hrforms_core::{flt_json, Field};
use rust_decimal::Decimal;

use crate::lookup::{LookupReply, LookupRequest};
use crate::rule::{Diagnostic, HostEffect, Rule, RuleInput, RuleOutcome};

/// On `currency` change, resolve the company currency. Equal currencies
/// pin the rate to 1 and hide the field; otherwise the rate is fetched and
/// the field shown with a `1 FROM = [?] TO` hint.
pub struct ExchangeRateRule;

impl ExchangeRateRule {
    pub fn description(from: &str, to: &str) -> String {
        format!("1 {} = [?] {}", from, to)
    }

    /// Warning text when the rate service had no usable number.
    pub fn unavailable(from: &str, to: &str) -> String {
        format!("No exchange rate found for {} to {}; using 0", from, to)
    }
}

/// Whether a rate reply is a number, or text that parses as one.
fn is_numeric(rate: &serde_json::Value) -> bool {
    match rate {
        serde_json::Value::Number(_) => true,
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().is_ok(),
        _ => false,
    }
}

impl Rule for ExchangeRateRule {
    fn name(&self) -> &'static str {
        "exchange_rate"
    }

    fn writes(&self) -> &'static [Field] {
        &[Field::ExchangeRate]
    }

    fn fire(&self, input: &RuleInput<'_>) -> RuleOutcome {
        if input.get(Field::Currency).as_text().is_none() {
            return RuleOutcome::none().cancel(Field::ExchangeRate);
        }
        RuleOutcome::none().lookup(
            Field::ExchangeRate,
            LookupRequest::CompanyCurrency {
                company: input.parent(Field::Company).as_text().map(str::to_string),
            },
        )
    }

    fn resume(&self, input: &RuleInput<'_>, reply: &LookupReply) -> RuleOutcome {
        match reply {
            LookupReply::CompanyCurrency(company_currency) => {
                let Some(currency) = input.get(Field::Currency).as_text() else {
                    return RuleOutcome::none();
                };
                if currency == company_currency.as_str() {
                    RuleOutcome::none()
                        .set(input.target, Field::ExchangeRate, Decimal::ONE)
                        .effect(HostEffect::Hidden {
                            field: Field::ExchangeRate,
                            hidden: true,
                        })
                        .effect(HostEffect::Description {
                            field: Field::ExchangeRate,
                            text: String::new(),
                        })
                } else {
                    RuleOutcome::none().lookup(
                        Field::ExchangeRate,
                        LookupRequest::ExchangeRate {
                            from: currency.to_string(),
                            to: company_currency.clone(),
                        },
                    )
                }
            }
            LookupReply::ExchangeRate { from, to, rate } => {
                let outcome = RuleOutcome::none()
                    .set(input.target, Field::ExchangeRate, flt_json(rate))
                    .effect(HostEffect::Hidden {
                        field: Field::ExchangeRate,
                        hidden: false,
                    })
                    .effect(HostEffect::Description {
                        field: Field::ExchangeRate,
                        text: Self::description(from, to),
                    });
                if is_numeric(rate) {
                    outcome
                } else {
                    outcome.diagnose(Diagnostic::warning(
                        input.target,
                        Some(Field::ExchangeRate),
                        Self::unavailable(from, to),
                    ))
                }
            }
            _ => RuleOutcome::none(),
        }
    }
}
