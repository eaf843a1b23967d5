//! Epic FHIR Bundle → GCIM.
//!
//! Reads Patient, Encounter, Condition, Procedure and Coverage resources.
//! Singular resources use the first match in the bundle; Conditions and
//! Procedures contribute one code each, in bundle order.
//!
//! `code.coding[0]` and `Encounter.type[0]` are indexed strictly: a missing
//! key reads as absent, but an empty list or a value of the wrong shape
//! rejects the bundle.

use serde_json::Value;

use super::bundle::{human_name, reference_id, Bundle, Node};
use super::{MappedIntake, MapperError};
use crate::models::{
    Clinical, Gcim, Insurance, Intent, Meta, Patient, Provider, Visit, SOURCE_TYPE_PROVIDER,
};

/// `meta.source_ehr` stamped on every intake from this mapper.
pub const EPIC_SOURCE_EHR: &str = "Epic";

/// Separator between Condition texts in `clinical.notes`.
const NOTES_SEPARATOR: &str = "; ";

/// Map an Epic FHIR Bundle into a GCIM.
pub fn map_epic_fhir_bundle(document: &Value) -> Result<MappedIntake, MapperError> {
    let bundle = Bundle::index(document)?;

    let visit = map_visit(&bundle)?;
    let clinical = map_clinical(&bundle)?;
    let provisional_intent = if clinical.cpt_codes.is_empty() {
        None
    } else {
        Some(Intent::Claim)
    };

    tracing::debug!(
        resources = bundle.len(),
        icd_codes = clinical.icd_codes.len(),
        cpt_codes = clinical.cpt_codes.len(),
        "Mapped Epic FHIR bundle"
    );

    let gcim = Gcim::new(map_patient(&bundle))
        .with_provider(map_provider(&bundle))
        .with_visit(visit)
        .with_clinical(clinical)
        .with_insurance(map_insurance(&bundle))
        .with_meta(Meta::new(EPIC_SOURCE_EHR, SOURCE_TYPE_PROVIDER));

    Ok(MappedIntake::new(gcim, provisional_intent))
}

fn map_patient(bundle: &Bundle<'_>) -> Patient {
    let patient = bundle.first("Patient");
    Patient {
        id: patient.get("id").text(),
        name: human_name(patient.get("name")),
        dob: patient.get("birthDate").date(),
        gender: patient.get("gender").text(),
    }
}

fn map_provider(bundle: &Bundle<'_>) -> Provider {
    let npi = bundle
        .first("Encounter")
        .get("participant")
        .first()
        .get("individual")
        .get("reference")
        .as_str()
        .and_then(reference_id);

    Provider {
        npi,
        name: None,
        location: None,
    }
}

fn map_visit(bundle: &Bundle<'_>) -> Result<Visit, MapperError> {
    let Some((index, encounter)) = bundle.first_entry("Encounter") else {
        return Ok(Visit::default());
    };

    let encounter_type = encounter
        .first_of("type")
        .map_err(|found| unreadable("Encounter", index, "type[0]", found))?
        .get("text")
        .text();

    Ok(Visit {
        date: encounter.get("period").get("start").date(),
        encounter_type,
        reason: encounter.get("reasonCode").first().get("text").text(),
    })
}

fn map_clinical(bundle: &Bundle<'_>) -> Result<Clinical, MapperError> {
    let icd_codes = bundle
        .entries("Condition")
        .map(|(index, condition)| primary_code("Condition", index, condition))
        .collect::<Result<Vec<_>, _>>()?;
    let cpt_codes = bundle
        .entries("Procedure")
        .map(|(index, procedure)| primary_code("Procedure", index, procedure))
        .collect::<Result<Vec<_>, _>>()?;

    let notes = bundle
        .all("Condition")
        .filter_map(|condition| condition.get("code").get("text").as_str())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(NOTES_SEPARATOR);

    Ok(Clinical {
        icd_codes,
        cpt_codes,
        notes: (!notes.is_empty()).then_some(notes),
    })
}

fn map_insurance(bundle: &Bundle<'_>) -> Insurance {
    let coverage = bundle.first("Coverage");
    let period = coverage.get("period");
    Insurance {
        policy_number: coverage.get("subscriberId").text(),
        group_number: coverage.get("grouping").get("group").text(),
        coverage_start: period.get("start").date(),
        coverage_end: period.get("end").date(),
    }
}

/// `code.coding[0].code` of a Condition or Procedure.
fn primary_code(
    resource_type: &'static str,
    index: usize,
    resource: Node<'_>,
) -> Result<Option<String>, MapperError> {
    let coding = resource
        .member("code")
        .and_then(|code| code.first_of("coding"))
        .map_err(|found| unreadable(resource_type, index, "code.coding[0]", found))?;
    Ok(coding.get("code").text())
}

fn unreadable(
    resource_type: &'static str,
    index: usize,
    field: &'static str,
    found: &'static str,
) -> MapperError {
    MapperError::UnreadableField {
        resource_type,
        index,
        field,
        found,
    }
}
