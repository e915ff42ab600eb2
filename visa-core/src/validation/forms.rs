//! Typed step records
//!
//! Produced from a [`ValidatedStep`](super::ValidatedStep) via
//! `into_typed`. Dates stay as `YYYY-MM-DD` strings; unanswered yes/no
//! questions are `None`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::steps::WizardStep;
use crate::error::VisaResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicInfo {
    pub surname: String,
    pub given_name: String,
    pub full_name_native: String,
    pub has_used_other_names: bool,
    pub other_surnames: String,
    pub other_given_names: String,
    pub has_telecode: bool,
    pub telecode_surname: String,
    pub telecode_given_name: String,
    pub gender: String,
    pub marital_status: String,
    pub date_of_birth: String,
    pub birth_city: String,
    pub birth_state: String,
    pub birth_country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo2 {
    pub nationality: String,
    pub has_other_nationality: bool,
    pub other_nationality: String,
    pub is_permanent_resident_other: bool,
    pub permanent_resident_country: String,
    pub national_id_number: String,
    pub us_ssn: String,
    pub us_taxpayer_id: String,
    pub passport_number: String,
    pub passport_issue_country: String,
    pub passport_issue_date: String,
    pub passport_expiry_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialMediaAccount {
    pub platform: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressPhone {
    pub home_address_street: String,
    pub home_address_city: String,
    pub home_address_state: String,
    pub home_address_postal_code: String,
    pub home_address_country: String,
    pub is_mailing_address_same_as_home: Option<bool>,
    pub mailing_address_street: String,
    pub mailing_address_city: String,
    pub mailing_address_country: String,
    pub primary_phone: String,
    pub secondary_phone: String,
    pub work_phone: String,
    pub email: String,
    pub social_media: Vec<SocialMediaAccount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviousEmployment {
    pub employer_name: String,
    pub job_title: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkInfo {
    pub primary_occupation: String,
    pub occupation_explanation: String,
    pub employer_name: String,
    pub employer_address: String,
    pub employer_phone: String,
    pub job_title: String,
    pub start_date: String,
    pub monthly_income: Option<f64>,
    pub job_duties: String,
    pub previous_employment: Vec<PreviousEmployment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relative {
    pub name: String,
    pub relationship: String,
    pub us_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyInfo {
    pub father_surname: String,
    pub father_given_name: String,
    pub father_date_of_birth: String,
    pub is_father_in_us: bool,
    pub mother_surname: String,
    pub mother_given_name: String,
    pub mother_date_of_birth: String,
    pub is_mother_in_us: bool,
    pub spouse_full_name: String,
    pub spouse_date_of_birth: String,
    pub has_immediate_relatives_in_us: Option<bool>,
    pub relatives: Vec<Relative>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelInfo {
    pub purpose_of_trip: String,
    pub has_specific_travel_plans: Option<bool>,
    pub arrival_date: String,
    pub departure_date: String,
    pub arrival_city: String,
    pub intended_arrival_date: String,
    pub intended_length_of_stay: Option<f64>,
    pub length_of_stay_unit: String,
    pub us_address_street: String,
    pub us_address_city: String,
    pub us_address_state: String,
    pub trip_payer: String,
    pub payer_name: String,
    pub payer_relationship: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Companion {
    pub surname: String,
    pub given_name: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelCompanions {
    pub traveling_with_others: Option<bool>,
    pub traveling_as_group: bool,
    pub group_name: String,
    pub companions: Vec<Companion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviousVisit {
    pub arrival_date: String,
    pub length_of_stay: Option<f64>,
    pub length_of_stay_unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviousUsTravel {
    pub has_been_to_us: Option<bool>,
    pub previous_visits: Vec<PreviousVisit>,
    pub has_us_driver_license: bool,
    pub driver_license_number: String,
    pub driver_license_state: String,
    pub has_been_issued_visa: bool,
    pub last_visa_issue_date: String,
    pub last_visa_number: String,
    pub has_been_refused: Option<bool>,
    pub refusal_explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsContact {
    pub contact_type: String,
    pub contact_surname: String,
    pub contact_given_name: String,
    pub relationship: String,
    pub organization_name: String,
    pub contact_address_street: String,
    pub contact_address_city: String,
    pub contact_address_state: String,
    pub contact_phone: String,
    pub contact_email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportingDocument {
    pub file_id: String,
    pub document_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadStep {
    pub photo_file_id: String,
    pub passport_file_id: String,
    pub supporting_documents: Vec<SupportingDocument>,
    pub additional_notes: String,
    pub consent_accuracy: bool,
}

/// All step buckets of one case, each independently saved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ds160Form {
    pub basic_info: Option<BasicInfo>,
    pub personal_info_2: Option<PersonalInfo2>,
    pub address_phone: Option<AddressPhone>,
    pub work_info: Option<WorkInfo>,
    pub family_info: Option<FamilyInfo>,
    pub travel_info: Option<TravelInfo>,
    pub travel_companions: Option<TravelCompanions>,
    pub previous_us_travel: Option<PreviousUsTravel>,
    pub us_contact: Option<UsContact>,
    pub upload: Option<UploadStep>,
}

impl Ds160Form {
    /// Store a step bucket, replacing any previous value
    pub fn merge(&mut self, step: WizardStep, data: Map<String, Value>) -> VisaResult<()> {
        let value = Value::Object(data);
        match step {
            WizardStep::BasicInfo => self.basic_info = Some(serde_json::from_value(value)?),
            WizardStep::PersonalInfo2 => self.personal_info_2 = Some(serde_json::from_value(value)?),
            WizardStep::AddressPhone => self.address_phone = Some(serde_json::from_value(value)?),
            WizardStep::WorkInfo => self.work_info = Some(serde_json::from_value(value)?),
            WizardStep::FamilyInfo => self.family_info = Some(serde_json::from_value(value)?),
            WizardStep::TravelInfo => self.travel_info = Some(serde_json::from_value(value)?),
            WizardStep::TravelCompanions => self.travel_companions = Some(serde_json::from_value(value)?),
            WizardStep::PreviousUsTravel => self.previous_us_travel = Some(serde_json::from_value(value)?),
            WizardStep::UsContact => self.us_contact = Some(serde_json::from_value(value)?),
            WizardStep::Upload => self.upload = Some(serde_json::from_value(value)?),
        }
        Ok(())
    }

    /// Steps that have a bucket
    pub fn saved_steps(&self) -> Vec<WizardStep> {
        let present = [
            self.basic_info.is_some(),
            self.personal_info_2.is_some(),
            self.address_phone.is_some(),
            self.work_info.is_some(),
            self.family_info.is_some(),
            self.travel_info.is_some(),
            self.travel_companions.is_some(),
            self.previous_us_travel.is_some(),
            self.us_contact.is_some(),
            self.upload.is_some(),
        ];
        WizardStep::ALL
            .iter()
            .zip(present)
            .filter_map(|(step, has)| has.then_some(*step))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.saved_steps().len() == WizardStep::ALL.len()
    }
}
