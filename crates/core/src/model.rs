//! Input and output data model of the summarisation contract.
//!
//! These are plain carriers. Shape checking of untrusted input happens in
//! [`crate::validation`]; the serde derives here exist for the validated path and for output.

use serde::{Deserialize, Serialize};
use summary_types::{Audience, FocusArea, Priority, ProblemStatus, SummaryLength, TimeFrame, UrgencyLevel};

// ============================================================================
// Input
// ============================================================================

/// A point-in-time copy of a patient's electronic health record.
///
/// Every field is required on the wire but any of them may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EhrSnapshot {
    pub demographics: String,
    pub chief_complaint: String,
    pub past_medical_history: String,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
    pub vital_signs: String,
    pub lab_results: Vec<String>,
    pub imaging_reports: Vec<String>,
}

/// Caller-selected knobs for a summary. Unsupplied fields take their documented default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct CustomizationParameters {
    pub length: SummaryLength,
    pub time_frame: TimeFrame,
    pub focus_area: FocusArea,
    pub audience: Audience,
    pub urgency_level: UrgencyLevel,
}

/// Request body of `POST /summarize`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SummarizeRequest {
    pub ehr_data: EhrSnapshot,
    #[serde(default)]
    pub customization: CustomizationParameters,
}

// ============================================================================
// Output
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PatientOverview {
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MedicalProblem {
    pub problem: String,
    pub status: ProblemStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Medication {
    pub name: String,
    pub details: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Allergy {
    pub name: String,
    pub reaction: String,
}

/// Current medications and allergies. Neither list is ever time-filtered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MedicationsAndAllergies {
    pub medications: Vec<Medication>,
    pub allergies: Vec<Allergy>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClinicalFinding {
    pub finding: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActionableItem {
    pub item: String,
    pub priority: Priority,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PendingItem {
    pub item: String,
}

/// The fixed-schema output. All six sections are always present; lists may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StructuredSummary {
    pub patient_overview: PatientOverview,
    pub active_medical_problems: Vec<MedicalProblem>,
    pub current_medications_and_allergies: MedicationsAndAllergies,
    pub recent_clinical_findings: Vec<ClinicalFinding>,
    pub actionable_items: Vec<ActionableItem>,
    pub pending_items: Vec<PendingItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary_serialises_every_section() {
        let json = serde_json::to_value(StructuredSummary::default()).expect("serialize");
        let object = json.as_object().expect("object");

        for key in [
            "patient_overview",
            "active_medical_problems",
            "current_medications_and_allergies",
            "recent_clinical_findings",
            "actionable_items",
            "pending_items",
        ] {
            assert!(object.contains_key(key), "missing section {key}");
        }
        assert_eq!(json["current_medications_and_allergies"]["medications"], serde_json::json!([]));
        assert_eq!(json["current_medications_and_allergies"]["allergies"], serde_json::json!([]));
        assert_eq!(json["patient_overview"]["summary"], "");
    }

    #[test]
    fn test_customization_fills_missing_fields_with_defaults() {
        let params: CustomizationParameters =
            serde_json::from_str(r#"{"audience":"Nurse"}"#).expect("deserialize");
        assert_eq!(params.audience, Audience::Nurse);
        assert_eq!(params.time_frame, TimeFrame::Last30Days);
        assert_eq!(params.length, SummaryLength::Standard);
    }
}
