//! Per-step field validation — pure, synchronous, schema-driven.
//!
//! Each data-bearing step declares its field rules as data; `validate` runs
//! them before any network call and returns field-keyed messages. The
//! controller never bypasses this, and never clears entered values on
//! failure.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::api::types::{BehavioralData, Demographics, KycUpload, PersonalInfo};
use crate::error::ValidationErrors;

use super::payload::StepPayload;

/// Indian mobile number: ten digits starting 6–9.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("phone regex"));

/// Document references must be fetchable URLs.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("url regex"));

/// One declarative constraint on a named field.
enum Check<'a> {
    /// Non-empty after trimming.
    Required(&'a str),
    /// Integer within an inclusive range.
    IntRange(i64, i64, i64),
    /// Float within an inclusive range (percent-style fields).
    FloatRange(f64, f64, f64),
    /// Decimal amount must not be negative.
    NonNegativeAmount(Decimal),
    /// Value must match the pattern; the message is used verbatim.
    Matches(&'a str, &'static Regex, &'static str),
    /// Like `Matches`, but absent values pass.
    OptionalMatches(Option<&'a str>, &'static Regex, &'static str),
}

struct Rule<'a> {
    field: &'static str,
    check: Check<'a>,
}

fn apply(rules: &[Rule<'_>], errors: &mut ValidationErrors) {
    for rule in rules {
        match &rule.check {
            Check::Required(value) => {
                if value.trim().is_empty() {
                    errors.push(rule.field, format!("{} is required", label(rule.field)));
                }
            }
            Check::IntRange(value, min, max) => {
                if value < min || value > max {
                    errors.push(
                        rule.field,
                        format!("{} must be between {min} and {max}", label(rule.field)),
                    );
                }
            }
            Check::FloatRange(value, min, max) => {
                if !value.is_finite() || value < min || value > max {
                    errors.push(
                        rule.field,
                        format!("{} must be between {min} and {max}", label(rule.field)),
                    );
                }
            }
            Check::NonNegativeAmount(value) => {
                if value.is_sign_negative() {
                    errors.push(
                        rule.field,
                        format!("{} must not be negative", label(rule.field)),
                    );
                }
            }
            Check::Matches(value, regex, message) => {
                if !regex.is_match(value) {
                    errors.push(rule.field, *message);
                }
            }
            Check::OptionalMatches(value, regex, message) => {
                if let Some(value) = value
                    && !regex.is_match(value)
                {
                    errors.push(rule.field, *message);
                }
            }
        }
    }
}

/// Turn a snake_case field name into a display label.
fn label(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for (i, part) in field.split('_').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = part.chars();
        if i == 0 && let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        } else {
            out.push_str(part);
        }
    }
    out
}

/// Validate a step payload. Pure and synchronous; runs before any network
/// call.
pub fn validate(payload: &StepPayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    match payload {
        StepPayload::PersonalInfo(info) => personal_info_rules(info, &mut errors),
        StepPayload::KycUpload(upload) => kyc_rules(upload, &mut errors),
        StepPayload::Questionnaire(request) => {
            if request.answers.is_empty() {
                errors.push("answers", "At least one answer is required");
            }
            for (question, score) in &request.answers {
                if !(1..=5).contains(score) {
                    errors.push(question, format!("{} must score 1 to 5", label(question)));
                }
            }
        }
        StepPayload::Demographics(demo) => demographics_rules(demo, &mut errors),
        StepPayload::Behavioral(data) => behavioral_rules(data, &mut errors),
    }
    errors.into_result()
}

fn personal_info_rules(info: &PersonalInfo, errors: &mut ValidationErrors) {
    let rules = [
        Rule {
            field: "first_name",
            check: Check::Required(&info.first_name),
        },
        Rule {
            field: "last_name",
            check: Check::Required(&info.last_name),
        },
        Rule {
            field: "phone",
            check: Check::OptionalMatches(
                info.phone.as_deref(),
                &PHONE_RE,
                "Phone must be a ten-digit mobile number",
            ),
        },
    ];
    apply(&rules, errors);
}

fn kyc_rules(upload: &KycUpload, errors: &mut ValidationErrors) {
    let rules = [
        Rule {
            field: "document_url",
            check: Check::Required(&upload.document_url),
        },
        Rule {
            field: "document_url",
            check: Check::Matches(
                &upload.document_url,
                &URL_RE,
                "Document reference must be an http(s) URL",
            ),
        },
    ];
    apply(&rules, errors);
}

fn demographics_rules(demo: &Demographics, errors: &mut ValidationErrors) {
    let rules = [
        Rule {
            field: "region",
            check: Check::Required(&demo.region),
        },
        Rule {
            field: "age",
            check: Check::IntRange(demo.age as i64, 18, 100),
        },
        Rule {
            field: "income",
            check: Check::NonNegativeAmount(demo.income),
        },
        Rule {
            field: "occupation",
            check: Check::Required(&demo.occupation),
        },
        Rule {
            field: "language_preference",
            check: Check::Required(&demo.language_preference),
        },
        Rule {
            field: "festival_spending",
            check: Check::NonNegativeAmount(demo.festival_spending),
        },
        Rule {
            field: "gold_investment_ratio",
            check: Check::FloatRange(demo.gold_investment_ratio, 0.0, 100.0),
        },
        Rule {
            field: "real_estate_allocation",
            check: Check::FloatRange(demo.real_estate_allocation, 0.0, 100.0),
        },
    ];
    apply(&rules, errors);
}

fn behavioral_rules(data: &BehavioralData, errors: &mut ValidationErrors) {
    let rules = [
        Rule {
            field: "portfolio_turnover_rate",
            check: Check::FloatRange(data.portfolio_turnover_rate, 0.0, 1.0),
        },
        Rule {
            field: "investment_experience_years",
            check: Check::IntRange(data.investment_experience_years as i64, 0, 80),
        },
        Rule {
            field: "risk_tolerance_self_assessment",
            check: Check::IntRange(data.risk_tolerance_self_assessment as i64, 1, 10),
        },
    ];
    apply(&rules, errors);
}
