//! Input Validator.
//!
//! Checks a raw JSON request against the data model and constructs the typed snapshot and
//! customization pair. Validation walks the whole document and reports every field-level problem
//! at once instead of stopping at the first; the order of reported errors follows the data model
//! (snapshot fields first, then customization fields).
//!
//! Rules:
//! - `ehr_data` and each of its eight fields are required; `null` counts as missing
//! - text fields must be JSON strings, list fields must be arrays of strings
//! - `customization` is optional and so is each of its fields; `null` means "not supplied"
//! - a supplied customization value must match its enumeration exactly
//! - unknown keys are ignored

use crate::error::{FieldError, ValidationErrors};
use crate::model::{CustomizationParameters, EhrSnapshot};
use serde_json::{Map, Value};
use std::str::FromStr;
use summary_types::{Audience, EnumParseError, FocusArea, SummaryLength, TimeFrame, UrgencyLevel};

const EHR_DATA: &str = "ehr_data";
const CUSTOMIZATION: &str = "customization";

/// Validates a raw request document.
///
/// # Errors
///
/// Returns [`ValidationErrors`] listing every missing, wrong-typed or out-of-range field. No
/// partially constructed value is returned alongside errors.
pub fn validate(raw: &Value) -> Result<(EhrSnapshot, CustomizationParameters), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let Some(root) = raw.as_object() else {
        errors.push(FieldError::type_mismatch("<root>", raw));
        return Err(errors);
    };

    let snapshot = match root.get(EHR_DATA) {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing(EHR_DATA));
            None
        }
        Some(Value::Object(ehr)) => validate_snapshot(ehr, &mut errors),
        Some(other) => {
            errors.push(FieldError::type_mismatch(EHR_DATA, other));
            None
        }
    };

    let params = match root.get(CUSTOMIZATION) {
        None | Some(Value::Null) => CustomizationParameters::default(),
        Some(Value::Object(custom)) => validate_customization(custom, &mut errors),
        Some(other) => {
            errors.push(FieldError::type_mismatch(CUSTOMIZATION, other));
            CustomizationParameters::default()
        }
    };

    match snapshot {
        Some(snapshot) if errors.is_empty() => Ok((snapshot, params)),
        _ => Err(errors),
    }
}

/// Parses `input` as JSON and validates it.
///
/// Text that is not JSON at all is reported as a type mismatch at the document root.
pub fn validate_json(input: &str) -> Result<(EhrSnapshot, CustomizationParameters), ValidationErrors> {
    match serde_json::from_str::<Value>(input) {
        Ok(raw) => validate(&raw),
        Err(e) => {
            let mut errors = ValidationErrors::default();
            errors.push(FieldError::type_mismatch("<root>", &Value::String(e.to_string())));
            Err(errors)
        }
    }
}

fn validate_snapshot(ehr: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<EhrSnapshot> {
    let demographics = text_field(ehr, "demographics", errors);
    let chief_complaint = text_field(ehr, "chief_complaint", errors);
    let past_medical_history = text_field(ehr, "past_medical_history", errors);
    let medications = list_field(ehr, "medications", errors);
    let allergies = list_field(ehr, "allergies", errors);
    let vital_signs = text_field(ehr, "vital_signs", errors);
    let lab_results = list_field(ehr, "lab_results", errors);
    let imaging_reports = list_field(ehr, "imaging_reports", errors);

    Some(EhrSnapshot {
        demographics: demographics?,
        chief_complaint: chief_complaint?,
        past_medical_history: past_medical_history?,
        medications: medications?,
        allergies: allergies?,
        vital_signs: vital_signs?,
        lab_results: lab_results?,
        imaging_reports: imaging_reports?,
    })
}

fn text_field(ehr: &Map<String, Value>, name: &str, errors: &mut ValidationErrors) -> Option<String> {
    let path = format!("{EHR_DATA}.{name}");
    match ehr.get(name) {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing(path));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::type_mismatch(path, other));
            None
        }
    }
}

fn list_field(
    ehr: &Map<String, Value>,
    name: &str,
    errors: &mut ValidationErrors,
) -> Option<Vec<String>> {
    let path = format!("{EHR_DATA}.{name}");
    match ehr.get(name) {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing(path));
            None
        }
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    other => {
                        errors.push(FieldError::type_mismatch(format!("{path}[{i}]"), other));
                        ok = false;
                    }
                }
            }
            ok.then_some(out)
        }
        Some(other) => {
            errors.push(FieldError::type_mismatch(path, other));
            None
        }
    }
}

fn validate_customization(
    custom: &Map<String, Value>,
    errors: &mut ValidationErrors,
) -> CustomizationParameters {
    CustomizationParameters {
        length: enum_field::<SummaryLength>(custom, errors),
        time_frame: enum_field::<TimeFrame>(custom, errors),
        focus_area: enum_field::<FocusArea>(custom, errors),
        audience: enum_field::<Audience>(custom, errors),
        urgency_level: enum_field::<UrgencyLevel>(custom, errors),
    }
}

/// Closed enumerations the validator knows how to read from the customization object.
trait CustomizationField: FromStr<Err = EnumParseError> + Default {
    const NAME: &'static str;
}

impl CustomizationField for SummaryLength {
    const NAME: &'static str = SummaryLength::FIELD;
}
impl CustomizationField for TimeFrame {
    const NAME: &'static str = TimeFrame::FIELD;
}
impl CustomizationField for FocusArea {
    const NAME: &'static str = FocusArea::FIELD;
}
impl CustomizationField for Audience {
    const NAME: &'static str = Audience::FIELD;
}
impl CustomizationField for UrgencyLevel {
    const NAME: &'static str = UrgencyLevel::FIELD;
}

fn enum_field<T: CustomizationField>(custom: &Map<String, Value>, errors: &mut ValidationErrors) -> T {
    let path = format!("{CUSTOMIZATION}.{}", T::NAME);
    match custom.get(T::NAME) {
        None | Some(Value::Null) => T::default(),
        Some(Value::String(s)) => match s.parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                errors.push(FieldError::invalid_enum(path, e.value));
                T::default()
            }
        },
        Some(other) => {
            errors.push(FieldError::type_mismatch(path, other));
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrorKind;
    use serde_json::json;

    fn valid_request() -> Value {
        json!({
            "ehr_data": {
                "demographics": "65-year-old male",
                "chief_complaint": "Routine follow-up",
                "past_medical_history": "Hypertension, Type 2 Diabetes",
                "medications": ["Lisinopril 10mg daily", "Metformin 500mg twice daily"],
                "allergies": ["Penicillin: Hives"],
                "vital_signs": "BP 130/80",
                "lab_results": ["A1c 7.2% (3 months ago)"],
                "imaging_reports": []
            },
            "customization": {
                "length": "Brief",
                "time_frame": "Complete history"
            }
        })
    }

    #[test]
    fn test_validate_accepts_well_formed_request_and_applies_defaults() {
        let (snapshot, params) = validate(&valid_request()).expect("valid request");
        assert_eq!(snapshot.medications.len(), 2);
        assert!(snapshot.imaging_reports.is_empty());
        assert_eq!(params.length, SummaryLength::Brief);
        assert_eq!(params.time_frame, TimeFrame::CompleteHistory);
        assert_eq!(params.focus_area, FocusArea::General);
        assert_eq!(params.audience, Audience::Physician);
        assert_eq!(params.urgency_level, UrgencyLevel::Standard);
    }

    #[test]
    fn test_validate_allows_missing_customization() {
        let mut raw = valid_request();
        raw.as_object_mut().expect("object").remove("customization");
        let (_, params) = validate(&raw).expect("valid request");
        assert_eq!(params, CustomizationParameters::default());
    }

    #[test]
    fn test_validate_reports_missing_medications() {
        let mut raw = valid_request();
        raw["ehr_data"].as_object_mut().expect("object").remove("medications");

        let errors = validate(&raw).expect_err("medications is required");
        assert_eq!(errors.errors().len(), 1);
        let err = errors.find("ehr_data.medications").expect("error for medications");
        assert_eq!(err.kind, FieldErrorKind::MissingField);
        assert!(err.value.is_none());
    }

    #[test]
    fn test_validate_reports_type_mismatch_for_text_and_list_fields() {
        let mut raw = valid_request();
        raw["ehr_data"]["vital_signs"] = json!(["BP 130/80"]);
        raw["ehr_data"]["allergies"] = json!("Penicillin");

        let errors = validate(&raw).expect_err("wrong shapes");
        let kinds: Vec<_> = errors.errors().iter().map(|e| (e.field.as_str(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("ehr_data.allergies", FieldErrorKind::TypeMismatch),
                ("ehr_data.vital_signs", FieldErrorKind::TypeMismatch),
            ]
        );
    }

    #[test]
    fn test_validate_names_the_offending_list_element() {
        let mut raw = valid_request();
        raw["ehr_data"]["lab_results"] = json!(["A1c 7.2%", 42]);

        let errors = validate(&raw).expect_err("non-string element");
        let err = errors.find("ehr_data.lab_results[1]").expect("element error");
        assert_eq!(err.kind, FieldErrorKind::TypeMismatch);
        assert_eq!(err.value, Some(json!(42)));
    }

    #[test]
    fn test_validate_rejects_every_out_of_range_enum_value() {
        let fields = ["length", "time_frame", "focus_area", "audience", "urgency_level"];
        for field in fields {
            let mut raw = valid_request();
            raw["customization"][field] = json!("Bogus");

            let errors = validate(&raw).expect_err("out-of-range value");
            let err = errors
                .find(&format!("customization.{field}"))
                .expect("error names the field");
            assert_eq!(err.kind, FieldErrorKind::InvalidEnumValue);
            assert_eq!(err.value, Some(json!("Bogus")));
        }
    }

    #[test]
    fn test_validate_does_not_coerce_case() {
        let mut raw = valid_request();
        raw["customization"]["urgency_level"] = json!("critical only");
        let errors = validate(&raw).expect_err("case-sensitive");
        assert_eq!(errors.errors()[0].kind, FieldErrorKind::InvalidEnumValue);
    }

    #[test]
    fn test_validate_reports_non_string_enum_as_type_mismatch() {
        let mut raw = valid_request();
        raw["customization"]["length"] = json!(3);
        let errors = validate(&raw).expect_err("wrong type");
        let err = errors.find("customization.length").expect("error");
        assert_eq!(err.kind, FieldErrorKind::TypeMismatch);
    }

    #[test]
    fn test_validate_collects_errors_across_sections() {
        let raw = json!({
            "ehr_data": { "demographics": "adult" },
            "customization": { "audience": "Family" }
        });
        let errors = validate(&raw).expect_err("many errors");
        assert_eq!(errors.errors().len(), 8);
        assert_eq!(errors.errors()[0].field, "ehr_data.chief_complaint");
        assert_eq!(errors.errors()[7].field, "customization.audience");
    }

    #[test]
    fn test_validate_reports_missing_ehr_data() {
        let errors = validate(&json!({ "customization": {} })).expect_err("no ehr_data");
        let err = errors.find("ehr_data").expect("error");
        assert_eq!(err.kind, FieldErrorKind::MissingField);
    }

    #[test]
    fn test_validate_json_rejects_malformed_text() {
        let errors = validate_json("{not json").expect_err("malformed");
        assert_eq!(errors.errors()[0].field, "<root>");
    }
}
