use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Gcim, Intent, SOURCE_TYPE_PAYER};

/// "prior auth", "prior authorization", "preauthorization", "pre-auth", "pre auth".
static PREAUTH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:prior|pre)[- ]?auth(?:orization|orisation)?\b").unwrap()
});

/// "referral", "refer to".
static REFERRAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:referral|refer\s+to)\b").unwrap());

/// Classify the business intent of an intake. First matching rule wins:
/// CPT codes → claim, then note keywords (preauth, referral), then
/// payer-originated diagnoses → adjudication.
pub fn classify_intent(gcim: &Gcim) -> Option<Intent> {
    if !gcim.cpt_codes().is_empty() {
        return Some(Intent::Claim);
    }

    let notes = gcim.notes().unwrap_or("");

    if has_preauth_pattern(notes) {
        return Some(Intent::Preauth);
    }

    if has_referral_pattern(notes) {
        return Some(Intent::Referral);
    }

    if is_payer_sourced(gcim) && !gcim.icd_codes().is_empty() {
        return Some(Intent::Adjudication);
    }

    None
}

/// Classify and record the result on the intake.
pub fn finalize_intent(gcim: Gcim) -> Gcim {
    let intent = classify_intent(&gcim);
    gcim.finalize_intent(intent)
}

fn has_preauth_pattern(text: &str) -> bool {
    PREAUTH_PATTERN.is_match(text)
}

fn has_referral_pattern(text: &str) -> bool {
    REFERRAL_PATTERN.is_match(text)
}

fn is_payer_sourced(gcim: &Gcim) -> bool {
    gcim.meta
        .as_ref()
        .and_then(|m| m.source_type.as_deref())
        == Some(SOURCE_TYPE_PAYER)
}
