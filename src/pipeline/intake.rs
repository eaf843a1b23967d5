//! Intake orchestration: resolve mapper → map → validate → classify.
//!
//! One [`IntakeContext`] is built at startup and shared by every request.

use chrono::{Local, NaiveDate};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::classify::finalize_intent;
use super::mapping::MapperError;
use super::registry::{DispatchError, ParserRegistry};
use super::validation::{validate_gcim_on, ValidationReport};
use crate::models::{Gcim, Intent};

/// The payload never reached validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Parser error: {0}")]
    Mapper(#[from] MapperError),
}

/// Result of a payload that mapped successfully.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeOutcome {
    /// Valid and classified.
    Accepted(Gcim),
    /// Mapped but failed validation; carries every violation.
    Rejected(ValidationReport),
}

#[derive(Debug, Clone)]
pub struct IntakeContext {
    registry: ParserRegistry,
}

impl IntakeContext {
    pub fn new(registry: ParserRegistry) -> Self {
        Self { registry }
    }

    pub fn with_default_parsers() -> Self {
        Self::new(ParserRegistry::with_default_parsers())
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Run one payload through the pipeline, checking visit dates against
    /// today's local date.
    pub fn run(
        &self,
        payload: &Value,
        source_system: &str,
        content_format: &str,
    ) -> Result<IntakeOutcome, IntakeError> {
        self.run_on(payload, source_system, content_format, Local::now().date_naive())
    }

    pub fn run_on(
        &self,
        payload: &Value,
        source_system: &str,
        content_format: &str,
        today: NaiveDate,
    ) -> Result<IntakeOutcome, IntakeError> {
        let request_id = Uuid::new_v4();
        let _span = tracing::info_span!(
            "intake",
            %request_id,
            source_ehr = source_system,
            content_type = content_format
        )
        .entered();

        let mapper = self.registry.resolve(source_system, content_format).map_err(|e| {
            tracing::warn!(error = %e, "No mapper registered");
            e
        })?;

        let mapped = mapper(payload).map_err(|e| {
            tracing::warn!(error = %e, "Mapper rejected payload");
            e
        })?;
        tracing::debug!(
            provisional_intent = mapped.provisional_intent().as_ref().map_or("none", Intent::as_str),
            "Mapped payload"
        );
        let gcim = mapped.into_gcim();

        let report = validate_gcim_on(&gcim, today);
        if !report.is_valid {
            tracing::info!(
                error_count = report.errors.len(),
                "Intake failed validation"
            );
            return Ok(IntakeOutcome::Rejected(report));
        }

        let gcim = finalize_intent(gcim);
        tracing::debug!(
            intent = gcim.intent().as_ref().map_or("none", Intent::as_str),
            "Classified intake"
        );
        tracing::info!("Intake accepted");
        Ok(IntakeOutcome::Accepted(gcim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Clinical, Meta, Patient};
    use crate::pipeline::mapping::MappedIntake;
    use crate::pipeline::validation::{CODE_REQUIRED, PATIENT_ID_REQUIRED};
    use serde_json::json;

    const SAMPLE_BUNDLE: &str = include_str!("mapping/fixtures/epic_sample_bundle.json");

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn payer_mapper(_: &Value) -> Result<MappedIntake, MapperError> {
        let gcim = Gcim::new(Patient::with_id("m-1"))
            .with_clinical(Clinical::from_codes(["E11.9"], []))
            .with_meta(Meta::new("PayerSys", "payer"));
        Ok(MappedIntake::new(gcim, None))
    }

    #[test]
    fn sample_bundle_accepted_as_claim() {
        let ctx = IntakeContext::with_default_parsers();
        let payload: Value = serde_json::from_str(SAMPLE_BUNDLE).unwrap();
        let outcome = ctx.run_on(&payload, "Epic", "FHIR", today()).unwrap();

        let gcim = match outcome {
            IntakeOutcome::Accepted(gcim) => gcim,
            other => panic!("expected acceptance, got {other:?}"),
        };
        assert_eq!(gcim.intent(), Some(Intent::Claim));
        assert_eq!(gcim.patient.id.as_deref(), Some("eAB3mDIBBcyUKviyzrxsnAw3"));
    }

    #[test]
    fn sample_bundle_accepted_against_local_today() {
        let ctx = IntakeContext::with_default_parsers();
        let payload: Value = serde_json::from_str(SAMPLE_BUNDLE).unwrap();
        assert!(matches!(
            ctx.run(&payload, "epic", "fhir").unwrap(),
            IntakeOutcome::Accepted(_)
        ));
    }

    #[test]
    fn unknown_source_is_dispatch_error() {
        let ctx = IntakeContext::with_default_parsers();
        let err = ctx.run(&json!({}), "Unknown", "XYZ").unwrap_err();
        assert!(matches!(err, IntakeError::Dispatch(_)));
        assert_eq!(err.to_string(), "No parser for (Unknown, XYZ)");
    }

    #[test]
    fn malformed_bundle_is_mapper_error() {
        let ctx = IntakeContext::with_default_parsers();
        let err = ctx.run(&json!({"entry": 5}), "Epic", "FHIR").unwrap_err();
        assert_eq!(err, IntakeError::Mapper(MapperError::EntriesNotArray("number")));
        assert!(err.to_string().starts_with("Parser error: "));
    }

    #[test]
    fn procedure_with_empty_coding_is_mapper_error() {
        let ctx = IntakeContext::with_default_parsers();
        let payload = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": {"resourceType": "Procedure", "code": {"coding": []}}}
        ]});
        let err = ctx.run_on(&payload, "Epic", "FHIR", today()).unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Mapper(MapperError::UnreadableField { resource_type: "Procedure", .. })
        ));
    }

    #[test]
    fn scalar_code_and_empty_encounter_type_are_mapper_errors() {
        let ctx = IntakeContext::with_default_parsers();
        let payload = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": {"resourceType": "Condition", "code": "A00"}},
            {"resource": {"resourceType": "Encounter", "type": []}}
        ]});
        let err = ctx.run_on(&payload, "Epic", "FHIR", today()).unwrap_err();
        assert!(err.to_string().starts_with("Parser error: "), "{err}");

        let payload = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": {"resourceType": "Condition", "code": "A00"}}
        ]});
        assert!(matches!(
            ctx.run_on(&payload, "Epic", "FHIR", today()),
            Err(IntakeError::Mapper(MapperError::UnreadableField { resource_type: "Condition", index: 1, .. }))
        ));
    }

    #[test]
    fn empty_bundle_rejected_with_all_violations() {
        let ctx = IntakeContext::with_default_parsers();
        let outcome = ctx.run_on(&json!({"entry": []}), "Epic", "FHIR", today()).unwrap();
        assert_eq!(
            outcome,
            IntakeOutcome::Rejected(ValidationReport {
                is_valid: false,
                errors: vec![PATIENT_ID_REQUIRED.to_string(), CODE_REQUIRED.to_string()],
            })
        );
    }

    #[test]
    fn future_visit_rejected() {
        let ctx = IntakeContext::with_default_parsers();
        let payload = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": {"resourceType": "Encounter", "period": {"start": "2024-06-16"}}},
            {"resource": {"resourceType": "Procedure", "code": {"coding": [{"code": "99213"}]}}}
        ]});
        let outcome = ctx.run_on(&payload, "Epic", "FHIR", today()).unwrap();
        let IntakeOutcome::Rejected(report) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(report.errors, vec!["visit.date cannot be in the future"]);
    }

    #[test]
    fn notes_drive_intent_without_procedures() {
        let ctx = IntakeContext::with_default_parsers();
        let payload = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": {"resourceType": "Condition",
                "code": {"coding": [{"code": "M54.5"}], "text": "Low back pain, prior auth for MRI"}}}
        ]});
        let IntakeOutcome::Accepted(gcim) = ctx.run_on(&payload, "Epic", "FHIR", today()).unwrap()
        else {
            panic!("expected acceptance");
        };
        assert_eq!(gcim.intent(), Some(Intent::Preauth));
    }

    #[test]
    fn provider_diagnosis_only_has_no_intent() {
        let ctx = IntakeContext::with_default_parsers();
        let payload = json!({"entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": {"resourceType": "Condition", "code": {"coding": [{"code": "J45.909"}]}}}
        ]});
        let IntakeOutcome::Accepted(gcim) = ctx.run_on(&payload, "Epic", "FHIR", today()).unwrap()
        else {
            panic!("expected acceptance");
        };
        assert_eq!(gcim.intent(), None);
    }

    #[test]
    fn custom_registry_dispatches_payer_mapper() {
        let mut registry = ParserRegistry::new();
        registry.register("PayerSys", "JSON", payer_mapper);
        let ctx = IntakeContext::new(registry);

        let IntakeOutcome::Accepted(gcim) = ctx.run_on(&Value::Null, "payersys", "json", today()).unwrap()
        else {
            panic!("expected acceptance");
        };
        assert_eq!(gcim.intent(), Some(Intent::Adjudication));
        assert!(ctx.run(&Value::Null, "Epic", "FHIR").is_err());
    }
}
