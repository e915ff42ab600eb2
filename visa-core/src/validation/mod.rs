//! Form step validation
//!
//! One engine, ten step descriptors. See [`engine`] for processing order.

pub mod engine;
pub mod errors;
pub mod forms;
pub mod schema;
pub mod steps;
pub mod upload;

pub use engine::{parse_date, require_valid, validate, validate_step, SaveMode, ValidatedStep, DATE_FORMAT};
pub use errors::{element_path, ValidationErrors, ROOT_PATH};
pub use forms::*;
pub use schema::{is_filled, FieldKind, FieldSpec, Predicate, RecordSchema, Rule};
pub use steps::{StepRegistry, StepSchema, WizardStep};
pub use upload::{content_type_for, validate_upload, UploadKind, DOCUMENT_MAX_BYTES, PHOTO_MAX_BYTES};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    /// Smallest payload that passes "save and continue" for each step
    fn minimal(step: WizardStep) -> Value {
        match step {
            WizardStep::BasicInfo => json!({
                "surname": "ZHANG", "given_name": "SAN", "gender": "MALE",
                "marital_status": "SINGLE", "date_of_birth": "1990-01-01",
                "birth_city": "Beijing", "birth_country": "China"
            }),
            WizardStep::PersonalInfo2 => json!({
                "nationality": "China", "passport_number": "E12345678",
                "passport_issue_country": "China",
                "passport_issue_date": "2020-01-01", "passport_expiry_date": "2030-01-01"
            }),
            WizardStep::AddressPhone => json!({
                "home_address_street": "1 Road", "home_address_city": "Beijing",
                "home_address_country": "China", "is_mailing_address_same_as_home": true,
                "primary_phone": "13800000000", "email": "a@example.com"
            }),
            WizardStep::WorkInfo => json!({ "primary_occupation": "STUDENT" }),
            WizardStep::FamilyInfo => json!({
                "father_surname": "ZHANG", "father_given_name": "YI",
                "mother_surname": "LI", "mother_given_name": "ER",
                "has_immediate_relatives_in_us": false
            }),
            WizardStep::TravelInfo => json!({
                "purpose_of_trip": "TOURISM", "has_specific_travel_plans": true,
                "arrival_date": "2025-05-01", "departure_date": "2025-05-10",
                "trip_payer": "SELF"
            }),
            WizardStep::TravelCompanions => json!({ "traveling_with_others": false }),
            WizardStep::PreviousUsTravel => json!({ "has_been_to_us": false, "has_been_refused": false }),
            WizardStep::UsContact => json!({
                "contact_type": "HOTEL", "organization_name": "Hilton",
                "contact_address_city": "New York", "contact_phone": "2125550000"
            }),
            WizardStep::Upload => json!({
                "photo_file_id": "f1", "passport_file_id": "f2", "consent_accuracy": true
            }),
        }
    }

    /// Every optional text field filled, every required field left empty
    fn optional_only(step: WizardStep) -> Value {
        let data: Map<String, Value> = step
            .schema()
            .fields
            .iter()
            .filter(|f| !f.required && !f.accepted && f.kind == FieldKind::Text)
            .map(|f| (f.name.to_string(), json!("x")))
            .collect();
        Value::Object(data)
    }

    #[test]
    fn test_minimal_payloads_pass_every_step() {
        for step in WizardStep::ALL {
            let result = validate_step(step, &minimal(step), SaveMode::Continue);
            assert!(result.is_ok(), "{}: {:?}", step, result.err());
        }
    }

    #[test]
    fn test_draft_bypasses_required_on_every_step() {
        for step in WizardStep::ALL {
            let input = optional_only(step);
            assert!(validate_step(step, &input, SaveMode::Draft).is_ok(), "{} draft", step);
            let errors = validate_step(step, &input, SaveMode::Continue).unwrap_err();
            assert!(
                step.schema().required_fields().all(|f| errors.contains(f.name)),
                "{}: {}",
                step,
                errors
            );
        }
    }

    #[test]
    fn test_conditional_requirements() {
        let mut input = minimal(WizardStep::BasicInfo);
        input["has_used_other_names"] = json!(true);
        let errors = validate_step(WizardStep::BasicInfo, &input, SaveMode::Continue).unwrap_err();
        assert!(errors.contains("other_surnames"));
        assert!(errors.contains("other_given_names"));

        let mut input = minimal(WizardStep::AddressPhone);
        input["is_mailing_address_same_as_home"] = json!(false);
        let errors = validate_step(WizardStep::AddressPhone, &input, SaveMode::Continue).unwrap_err();
        assert!(errors.contains("mailing_address_street"));

        // Rule does not fire in draft mode
        assert!(validate_step(WizardStep::AddressPhone, &input, SaveMode::Draft).is_ok());
    }

    #[test]
    fn test_companion_errors_are_per_index() {
        let input = json!({
            "traveling_with_others": true,
            "companions": [
                { "surname": "LI", "given_name": "SI", "relationship": "FRIEND" },
                { "surname": "WANG" }
            ]
        });
        let errors = validate_step(WizardStep::TravelCompanions, &input, SaveMode::Continue).unwrap_err();
        assert!(errors.contains("companions[1].given_name"));
        assert!(errors.contains("companions[1].relationship"));
        assert!(!errors.contains("companions[1].surname"));
        assert!(!errors.paths().any(|p| p.starts_with("companions[0]")));
    }

    #[test]
    fn test_departure_must_follow_arrival() {
        let mut input = minimal(WizardStep::TravelInfo);
        input["departure_date"] = json!("2025-04-30");
        let errors = validate_step(WizardStep::TravelInfo, &input, SaveMode::Continue).unwrap_err();
        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["departure_date"]);
    }

    #[test]
    fn test_upload_consent_required() {
        let mut input = minimal(WizardStep::Upload);
        input["consent_accuracy"] = json!(false);
        let errors = validate_step(WizardStep::Upload, &input, SaveMode::Continue).unwrap_err();
        assert!(errors.contains("consent_accuracy"));
    }
}
