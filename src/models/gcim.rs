//! GCIM: the canonical intake model every source payload is mapped into.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Intent;

/// Root of a canonical intake.
///
/// Everything except `intent` is fixed at construction. The intent is only
/// written through [`Gcim::finalize_intent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gcim {
    pub patient: Patient,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub payer: Option<Payer>,
    #[serde(default)]
    pub visit: Option<Visit>,
    #[serde(default)]
    pub clinical: Option<Clinical>,
    #[serde(default)]
    pub insurance: Option<Insurance>,
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    intent: Option<Intent>,
}

impl Gcim {
    pub fn new(patient: Patient) -> Self {
        Self {
            patient,
            provider: None,
            payer: None,
            visit: None,
            clinical: None,
            insurance: None,
            meta: None,
            intent: None,
        }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_payer(mut self, payer: Payer) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn with_visit(mut self, visit: Visit) -> Self {
        self.visit = Some(visit);
        self
    }

    pub fn with_clinical(mut self, clinical: Clinical) -> Self {
        self.clinical = Some(clinical);
        self
    }

    pub fn with_insurance(mut self, insurance: Insurance) -> Self {
        self.insurance = Some(insurance);
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Classified business intent, if any.
    pub fn intent(&self) -> Option<Intent> {
        self.intent
    }

    /// Record the classifier's decision. This is the only write to `intent`.
    pub fn finalize_intent(mut self, intent: Option<Intent>) -> Self {
        self.intent = intent;
        self
    }

    /// ICD codes, or an empty slice when there is no clinical block.
    pub fn icd_codes(&self) -> &[Option<String>] {
        self.clinical
            .as_ref()
            .map(|c| c.icd_codes.as_slice())
            .unwrap_or(&[])
    }

    /// CPT codes, or an empty slice when there is no clinical block.
    pub fn cpt_codes(&self) -> &[Option<String>] {
        self.clinical
            .as_ref()
            .map(|c| c.cpt_codes.as_slice())
            .unwrap_or(&[])
    }

    pub fn notes(&self) -> Option<&str> {
        self.clinical.as_ref().and_then(|c| c.notes.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Required for a valid intake; checked by the validator, not here.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl Patient {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(default)]
    pub npi: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    #[serde(default)]
    pub payer_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub eligibility_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub encounter_type: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Coded clinical facts. A code is `None` when the source entry carried no code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clinical {
    #[serde(default)]
    pub icd_codes: Vec<Option<String>>,
    #[serde(default)]
    pub cpt_codes: Vec<Option<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Clinical {
    /// Build from plain code strings.
    pub fn from_codes<I, C, S>(icd: I, cpt: C) -> Self
    where
        I: IntoIterator<Item = S>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            icd_codes: icd.into_iter().map(|c| Some(c.into())).collect(),
            cpt_codes: cpt.into_iter().map(|c| Some(c.into())).collect(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurance {
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub group_number: Option<String>,
    #[serde(default)]
    pub coverage_start: Option<NaiveDate>,
    #[serde(default)]
    pub coverage_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub source_ehr: Option<String>,
    /// `"provider"`, `"payer"`, or another integration-defined label.
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default = "chrono::Utc::now")]
    pub ingested_at: DateTime<Utc>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl Meta {
    /// Stamp a new intake with the current time.
    pub fn new(source_ehr: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            source_ehr: Some(source_ehr.into()),
            source_type: Some(source_type.into()),
            ingested_at: Utc::now(),
            confidence_score: None,
        }
    }
}
