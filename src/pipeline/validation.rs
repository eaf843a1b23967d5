// Domain validation for canonical intakes.
// Every rule runs; each violation adds its message in rule order. Nothing here
// mutates the intake.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Serialize;

use crate::models::Gcim;

/// ICD-10: letter (not I or O), two alphanumerics, optional `.` + 1–4 alphanumerics.
static ICD10_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-HJ-NP-Z][0-9A-Z]{2}(?:\.[0-9A-Z]{1,4})?$").unwrap()
});

/// CPT: exactly five digits.
static CPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{5}$").unwrap());

pub const PATIENT_ID_REQUIRED: &str = "patient.id is required";
pub const CODE_REQUIRED: &str = "at least one ICD or CPT code is required";
pub const VISIT_DATE_IN_FUTURE: &str = "visit.date cannot be in the future";

/// Outcome of validating one intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate against today's local date.
pub fn validate_gcim(gcim: &Gcim) -> ValidationReport {
    validate_gcim_on(gcim, Local::now().date_naive())
}

/// Validate with an explicit "today" for the visit-date rule.
pub fn validate_gcim_on(gcim: &Gcim, today: NaiveDate) -> ValidationReport {
    let mut errors = Vec::new();

    check_patient_id(gcim, &mut errors);
    check_codes_present(gcim, &mut errors);
    check_icd_codes(gcim, &mut errors);
    check_cpt_codes(gcim, &mut errors);
    check_visit_date(gcim, today, &mut errors);

    ValidationReport::from_errors(errors)
}

pub fn is_valid_icd10(code: &str) -> bool {
    ICD10_PATTERN.is_match(code)
}

pub fn is_valid_cpt(code: &str) -> bool {
    CPT_PATTERN.is_match(code)
}

fn check_patient_id(gcim: &Gcim, errors: &mut Vec<String>) {
    let has_id = gcim
        .patient
        .id
        .as_deref()
        .is_some_and(|id| !id.is_empty());
    if !has_id {
        errors.push(PATIENT_ID_REQUIRED.to_string());
    }
}

fn check_codes_present(gcim: &Gcim, errors: &mut Vec<String>) {
    if gcim.icd_codes().is_empty() && gcim.cpt_codes().is_empty() {
        errors.push(CODE_REQUIRED.to_string());
    }
}

fn check_icd_codes(gcim: &Gcim, errors: &mut Vec<String>) {
    for code in present_codes(gcim.icd_codes()) {
        if !is_valid_icd10(code) {
            errors.push(format!("invalid ICD-10 code: {code}"));
        }
    }
}

fn check_cpt_codes(gcim: &Gcim, errors: &mut Vec<String>) {
    for code in present_codes(gcim.cpt_codes()) {
        if !is_valid_cpt(code) {
            errors.push(format!("invalid CPT code: {code}"));
        }
    }
}

fn check_visit_date(gcim: &Gcim, today: NaiveDate, errors: &mut Vec<String>) {
    let visit_date = gcim.visit.as_ref().and_then(|v| v.date);
    if visit_date.is_some_and(|date| date > today) {
        errors.push(VISIT_DATE_IN_FUTURE.to_string());
    }
}

/// Codes that were actually supplied (nulls and empty strings are skipped).
fn present_codes(codes: &[Option<String>]) -> impl Iterator<Item = &str> {
    codes
        .iter()
        .filter_map(|c| c.as_deref())
        .filter(|c| !c.is_empty())
}
