//! Wizard step registry
//!
//! The ten intake steps, their order and labels, and the schema
//! descriptor each one is validated against.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::schema::{FieldSpec, Predicate, RecordSchema, Rule};
use crate::error::{VisaError, VisaResult};

/// One step of the intake wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WizardStep {
    #[serde(rename = "basic-info")]
    BasicInfo,
    #[serde(rename = "personal-info-2")]
    PersonalInfo2,
    #[serde(rename = "address-phone")]
    AddressPhone,
    #[serde(rename = "work-info")]
    WorkInfo,
    #[serde(rename = "family-info")]
    FamilyInfo,
    #[serde(rename = "travel-info")]
    TravelInfo,
    #[serde(rename = "travel-companions")]
    TravelCompanions,
    #[serde(rename = "previous-us-travel")]
    PreviousUsTravel,
    #[serde(rename = "us-contact")]
    UsContact,
    #[serde(rename = "upload")]
    Upload,
}

impl WizardStep {
    /// All steps in wizard order
    pub const ALL: [WizardStep; 10] = [
        WizardStep::BasicInfo,
        WizardStep::PersonalInfo2,
        WizardStep::AddressPhone,
        WizardStep::WorkInfo,
        WizardStep::FamilyInfo,
        WizardStep::TravelInfo,
        WizardStep::TravelCompanions,
        WizardStep::PreviousUsTravel,
        WizardStep::UsContact,
        WizardStep::Upload,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::BasicInfo => "basic-info",
            Self::PersonalInfo2 => "personal-info-2",
            Self::AddressPhone => "address-phone",
            Self::WorkInfo => "work-info",
            Self::FamilyInfo => "family-info",
            Self::TravelInfo => "travel-info",
            Self::TravelCompanions => "travel-companions",
            Self::PreviousUsTravel => "previous-us-travel",
            Self::UsContact => "us-contact",
            Self::Upload => "upload",
        }
    }

    /// 中文标题
    pub fn label(&self) -> &'static str {
        match self {
            Self::BasicInfo => "基本信息",
            Self::PersonalInfo2 => "个人信息（二）",
            Self::AddressPhone => "地址与电话",
            Self::WorkInfo => "工作信息",
            Self::FamilyInfo => "家庭信息",
            Self::TravelInfo => "旅行信息",
            Self::TravelCompanions => "同行人员",
            Self::PreviousUsTravel => "以往赴美记录",
            Self::UsContact => "美国联系人",
            Self::Upload => "上传材料",
        }
    }

    /// Zero-based position in the wizard
    pub fn order(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<WizardStep> {
        Self::ALL.get(self.order() + 1).copied()
    }

    pub fn prev(&self) -> Option<WizardStep> {
        self.order().checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    pub fn parse(s: &str) -> VisaResult<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.slug() == wanted)
            .ok_or_else(|| VisaError::UnknownStep { slug: s.to_string() })
    }

    /// Schema descriptor of this step
    pub fn schema(&self) -> &'static StepSchema {
        &SCHEMAS[self.order()]
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for WizardStep {
    type Err = VisaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Fields and cross-field rules of one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchema {
    pub step: WizardStep,
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<Rule>,
}

impl StepSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required || f.accepted)
    }
}

/// Order, labels and paths driving wizard navigation and progress
pub struct StepRegistry;

impl StepRegistry {
    pub fn steps() -> &'static [WizardStep] {
        &WizardStep::ALL
    }

    pub fn first() -> WizardStep {
        WizardStep::BasicInfo
    }

    /// Client-facing page path of a step
    pub fn path(token: &str, step: WizardStep) -> String {
        format!("/fill/{}/{}", token, step.slug())
    }

    /// Completion percentage, 0-100
    pub fn progress(completed: &[WizardStep]) -> u8 {
        let done: BTreeSet<_> = completed.iter().collect();
        ((done.len() * 100) / WizardStep::ALL.len()) as u8
    }

    /// First step not yet completed
    pub fn resume_at(completed: &[WizardStep]) -> Option<WizardStep> {
        WizardStep::ALL.iter().copied().find(|s| !completed.contains(s))
    }
}

const REQUIRED_WHEN_YES: &str = "请填写此项";
const ALL_OR_NONE: &str = "请完整填写该条目";

pub const GENDERS: &[&str] = &["MALE", "FEMALE"];
pub const MARITAL_STATUSES: &[&str] = &["SINGLE", "MARRIED", "DIVORCED", "WIDOWED", "SEPARATED", "OTHER"];
pub const OCCUPATIONS: &[&str] = &[
    "EMPLOYED",
    "SELF_EMPLOYED",
    "STUDENT",
    "RETIRED",
    "HOMEMAKER",
    "UNEMPLOYED",
    "OTHER",
];
pub const TRIP_PURPOSES: &[&str] = &["BUSINESS", "TOURISM", "BUSINESS_TOURISM", "STUDY", "EXCHANGE", "WORK", "OTHER"];
pub const STAY_UNITS: &[&str] = &["DAYS", "WEEKS", "MONTHS", "YEARS"];
pub const TRIP_PAYERS: &[&str] = &["SELF", "OTHER_PERSON", "EMPLOYER", "ORGANIZATION"];
pub const CONTACT_TYPES: &[&str] = &["PERSON", "ORGANIZATION", "HOTEL"];
pub const SOCIAL_PLATFORMS: &[&str] = &["WECHAT", "WEIBO", "FACEBOOK", "INSTAGRAM", "LINKEDIN", "TWITTER", "OTHER"];

static SCHEMAS: Lazy<Vec<StepSchema>> = Lazy::new(|| {
    vec![
        basic_info(),
        personal_info_2(),
        address_phone(),
        work_info(),
        family_info(),
        travel_info(),
        travel_companions(),
        previous_us_travel(),
        us_contact(),
        upload(),
    ]
});

fn basic_info() -> StepSchema {
    StepSchema {
        step: WizardStep::BasicInfo,
        fields: vec![
            FieldSpec::text("surname").required().max(50),
            FieldSpec::text("given_name").required().max(50),
            FieldSpec::text("full_name_native").max(100),
            FieldSpec::flag("has_used_other_names"),
            FieldSpec::text("other_surnames"),
            FieldSpec::text("other_given_names"),
            FieldSpec::flag("has_telecode"),
            FieldSpec::text("telecode_surname"),
            FieldSpec::text("telecode_given_name"),
            FieldSpec::choice("gender", GENDERS).required(),
            FieldSpec::choice("marital_status", MARITAL_STATUSES).required(),
            FieldSpec::date("date_of_birth").required(),
            FieldSpec::text("birth_city").required(),
            FieldSpec::text("birth_state"),
            FieldSpec::text("birth_country").required(),
        ],
        rules: vec![
            Rule::require_when(
                Predicate::IsTrue("has_used_other_names"),
                &["other_surnames", "other_given_names"],
                "请填写曾用名",
            ),
            Rule::require_when(
                Predicate::IsTrue("has_telecode"),
                &["telecode_surname", "telecode_given_name"],
                "请填写电报码",
            ),
        ],
    }
}

fn personal_info_2() -> StepSchema {
    StepSchema {
        step: WizardStep::PersonalInfo2,
        fields: vec![
            FieldSpec::text("nationality").required(),
            FieldSpec::flag("has_other_nationality"),
            FieldSpec::text("other_nationality"),
            FieldSpec::flag("is_permanent_resident_other"),
            FieldSpec::text("permanent_resident_country"),
            FieldSpec::text("national_id_number").max(30),
            FieldSpec::text("us_ssn"),
            FieldSpec::text("us_taxpayer_id"),
            FieldSpec::text("passport_number").required().max(20),
            FieldSpec::text("passport_issue_country").required(),
            FieldSpec::date("passport_issue_date").required(),
            FieldSpec::date("passport_expiry_date").required(),
        ],
        rules: vec![
            Rule::require_when(
                Predicate::IsTrue("has_other_nationality"),
                &["other_nationality"],
                REQUIRED_WHEN_YES,
            ),
            Rule::require_when(
                Predicate::IsTrue("is_permanent_resident_other"),
                &["permanent_resident_country"],
                REQUIRED_WHEN_YES,
            ),
            Rule::date_after(
                "passport_expiry_date",
                "passport_issue_date",
                "护照有效期必须晚于签发日期",
            ),
        ],
    }
}

fn address_phone() -> StepSchema {
    StepSchema {
        step: WizardStep::AddressPhone,
        fields: vec![
            FieldSpec::text("home_address_street").required(),
            FieldSpec::text("home_address_city").required(),
            FieldSpec::text("home_address_state"),
            FieldSpec::text("home_address_postal_code").max(20),
            FieldSpec::text("home_address_country").required(),
            FieldSpec::flag("is_mailing_address_same_as_home").required(),
            FieldSpec::text("mailing_address_street"),
            FieldSpec::text("mailing_address_city"),
            FieldSpec::text("mailing_address_country"),
            FieldSpec::text("primary_phone").required().max(30),
            FieldSpec::text("secondary_phone").max(30),
            FieldSpec::text("work_phone").max(30),
            FieldSpec::email("email").required(),
            FieldSpec::records(
                "social_media",
                RecordSchema {
                    fields: vec![
                        FieldSpec::choice("platform", SOCIAL_PLATFORMS),
                        FieldSpec::text("identifier"),
                    ],
                    rules: vec![Rule::all_or_none(&["platform", "identifier"], ALL_OR_NONE)],
                },
            ),
        ],
        rules: vec![Rule::require_when(
            Predicate::IsFalse("is_mailing_address_same_as_home"),
            &["mailing_address_street", "mailing_address_city", "mailing_address_country"],
            "请填写邮寄地址",
        )],
    }
}

fn work_info() -> StepSchema {
    StepSchema {
        step: WizardStep::WorkInfo,
        fields: vec![
            FieldSpec::choice("primary_occupation", OCCUPATIONS).required(),
            FieldSpec::text("occupation_explanation"),
            FieldSpec::text("employer_name"),
            FieldSpec::text("employer_address"),
            FieldSpec::text("employer_phone"),
            FieldSpec::text("job_title"),
            FieldSpec::date("start_date"),
            FieldSpec::number("monthly_income").range(Some(0.0), None),
            FieldSpec::text("job_duties").max(500),
            FieldSpec::records(
                "previous_employment",
                RecordSchema {
                    fields: vec![
                        FieldSpec::text("employer_name"),
                        FieldSpec::text("job_title"),
                        FieldSpec::date("start_date"),
                        FieldSpec::date("end_date"),
                    ],
                    rules: vec![
                        Rule::all_or_none(&["employer_name", "job_title"], ALL_OR_NONE),
                        Rule::date_after("end_date", "start_date", "结束日期必须晚于开始日期"),
                    ],
                },
            ),
        ],
        rules: vec![
            Rule::require_when(
                Predicate::OneOf("primary_occupation", &["EMPLOYED", "SELF_EMPLOYED"]),
                &["employer_name", "employer_address", "job_title"],
                "请填写工作单位信息",
            ),
            Rule::require_when(
                Predicate::Equals("primary_occupation", "OTHER"),
                &["occupation_explanation"],
                REQUIRED_WHEN_YES,
            ),
        ],
    }
}

fn family_info() -> StepSchema {
    StepSchema {
        step: WizardStep::FamilyInfo,
        fields: vec![
            FieldSpec::text("father_surname").required(),
            FieldSpec::text("father_given_name").required(),
            FieldSpec::date("father_date_of_birth"),
            FieldSpec::flag("is_father_in_us"),
            FieldSpec::text("mother_surname").required(),
            FieldSpec::text("mother_given_name").required(),
            FieldSpec::date("mother_date_of_birth"),
            FieldSpec::flag("is_mother_in_us"),
            FieldSpec::text("spouse_full_name"),
            FieldSpec::date("spouse_date_of_birth"),
            FieldSpec::flag("has_immediate_relatives_in_us").required(),
            FieldSpec::records(
                "relatives",
                RecordSchema {
                    fields: vec![
                        FieldSpec::text("name"),
                        FieldSpec::text("relationship"),
                        FieldSpec::text("us_status"),
                    ],
                    rules: vec![Rule::all_or_none(&["name", "relationship", "us_status"], ALL_OR_NONE)],
                },
            ),
        ],
        rules: vec![Rule::require_when(
            Predicate::IsTrue("has_immediate_relatives_in_us"),
            &["relatives"],
            "请添加在美亲属",
        )],
    }
}

fn travel_info() -> StepSchema {
    StepSchema {
        step: WizardStep::TravelInfo,
        fields: vec![
            FieldSpec::choice("purpose_of_trip", TRIP_PURPOSES).required(),
            FieldSpec::flag("has_specific_travel_plans").required(),
            FieldSpec::date("arrival_date"),
            FieldSpec::date("departure_date"),
            FieldSpec::text("arrival_city"),
            FieldSpec::date("intended_arrival_date"),
            FieldSpec::number("intended_length_of_stay").range(Some(1.0), None),
            FieldSpec::choice("length_of_stay_unit", STAY_UNITS),
            FieldSpec::text("us_address_street"),
            FieldSpec::text("us_address_city"),
            FieldSpec::text("us_address_state"),
            FieldSpec::choice("trip_payer", TRIP_PAYERS).required(),
            FieldSpec::text("payer_name"),
            FieldSpec::text("payer_relationship"),
        ],
        rules: vec![
            Rule::require_when(
                Predicate::IsTrue("has_specific_travel_plans"),
                &["arrival_date", "departure_date"],
                "请填写行程日期",
            ),
            Rule::require_when(
                Predicate::IsFalse("has_specific_travel_plans"),
                &["intended_arrival_date", "intended_length_of_stay", "length_of_stay_unit"],
                "请填写预计行程",
            ),
            Rule::date_after("departure_date", "arrival_date", "离开日期必须晚于抵达日期"),
            Rule::require_when(
                Predicate::NotEquals("trip_payer", "SELF"),
                &["payer_name", "payer_relationship"],
                "请填写付款人信息",
            ),
        ],
    }
}

fn travel_companions() -> StepSchema {
    StepSchema {
        step: WizardStep::TravelCompanions,
        fields: vec![
            FieldSpec::flag("traveling_with_others").required(),
            FieldSpec::flag("traveling_as_group"),
            FieldSpec::text("group_name"),
            FieldSpec::records(
                "companions",
                RecordSchema {
                    fields: vec![
                        FieldSpec::text("surname"),
                        FieldSpec::text("given_name"),
                        FieldSpec::text("relationship"),
                    ],
                    rules: vec![Rule::all_or_none(&["surname", "given_name", "relationship"], ALL_OR_NONE)],
                },
            ),
        ],
        rules: vec![
            Rule::require_when(
                Predicate::All(vec![
                    Predicate::IsTrue("traveling_with_others"),
                    Predicate::IsTrue("traveling_as_group"),
                ]),
                &["group_name"],
                "请填写团队名称",
            ),
            Rule::require_when(
                Predicate::All(vec![
                    Predicate::IsTrue("traveling_with_others"),
                    Predicate::IsFalse("traveling_as_group"),
                ]),
                &["companions"],
                "请添加同行人员",
            ),
        ],
    }
}

fn previous_us_travel() -> StepSchema {
    StepSchema {
        step: WizardStep::PreviousUsTravel,
        fields: vec![
            FieldSpec::flag("has_been_to_us").required(),
            FieldSpec::records(
                "previous_visits",
                RecordSchema {
                    fields: vec![
                        FieldSpec::date("arrival_date"),
                        FieldSpec::number("length_of_stay").range(Some(1.0), None),
                        FieldSpec::choice("length_of_stay_unit", STAY_UNITS),
                    ],
                    rules: vec![Rule::all_or_none(
                        &["arrival_date", "length_of_stay", "length_of_stay_unit"],
                        ALL_OR_NONE,
                    )],
                },
            ),
            FieldSpec::flag("has_us_driver_license"),
            FieldSpec::text("driver_license_number"),
            FieldSpec::text("driver_license_state"),
            FieldSpec::flag("has_been_issued_visa"),
            FieldSpec::date("last_visa_issue_date"),
            FieldSpec::text("last_visa_number"),
            FieldSpec::flag("has_been_refused").required(),
            FieldSpec::text("refusal_explanation").max(1000),
        ],
        rules: vec![
            Rule::require_when(Predicate::IsTrue("has_been_to_us"), &["previous_visits"], "请添加赴美记录"),
            Rule::require_when(
                Predicate::IsTrue("has_us_driver_license"),
                &["driver_license_number", "driver_license_state"],
                REQUIRED_WHEN_YES,
            ),
            Rule::require_when(
                Predicate::IsTrue("has_been_issued_visa"),
                &["last_visa_issue_date"],
                REQUIRED_WHEN_YES,
            ),
            Rule::require_when(
                Predicate::IsTrue("has_been_refused"),
                &["refusal_explanation"],
                "请说明拒签情况",
            ),
        ],
    }
}

fn us_contact() -> StepSchema {
    StepSchema {
        step: WizardStep::UsContact,
        fields: vec![
            FieldSpec::choice("contact_type", CONTACT_TYPES).required(),
            FieldSpec::text("contact_surname"),
            FieldSpec::text("contact_given_name"),
            FieldSpec::text("relationship"),
            FieldSpec::text("organization_name"),
            FieldSpec::text("contact_address_street"),
            FieldSpec::text("contact_address_city").required(),
            FieldSpec::text("contact_address_state"),
            FieldSpec::text("contact_phone").required().max(30),
            FieldSpec::email("contact_email"),
        ],
        rules: vec![
            Rule::require_when(
                Predicate::Equals("contact_type", "PERSON"),
                &["contact_surname", "contact_given_name", "relationship"],
                "请填写联系人姓名及关系",
            ),
            Rule::require_when(
                Predicate::NotEquals("contact_type", "PERSON"),
                &["organization_name"],
                "请填写机构名称",
            ),
        ],
    }
}

fn upload() -> StepSchema {
    StepSchema {
        step: WizardStep::Upload,
        fields: vec![
            FieldSpec::text("photo_file_id").required(),
            FieldSpec::text("passport_file_id").required(),
            FieldSpec::records(
                "supporting_documents",
                RecordSchema {
                    fields: vec![FieldSpec::text("file_id"), FieldSpec::text("document_type")],
                    rules: vec![Rule::all_or_none(&["file_id", "document_type"], ALL_OR_NONE)],
                },
            ),
            FieldSpec::text("additional_notes").max(1000),
            FieldSpec::flag("consent_accuracy").accepted(),
        ],
        rules: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_navigation() {
        assert_eq!(WizardStep::BasicInfo.order(), 0);
        assert_eq!(WizardStep::Upload.order(), 9);
        assert_eq!(WizardStep::BasicInfo.prev(), None);
        assert_eq!(WizardStep::BasicInfo.next(), Some(WizardStep::PersonalInfo2));
        assert_eq!(WizardStep::Upload.next(), None);
        assert!(WizardStep::Upload.is_last());
        assert_eq!(WizardStep::UsContact.prev(), Some(WizardStep::PreviousUsTravel));
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!(WizardStep::parse("personal-info-2").unwrap(), WizardStep::PersonalInfo2);
        assert_eq!(WizardStep::parse("US_CONTACT").unwrap(), WizardStep::UsContact);
        assert!(WizardStep::parse("payment").is_err());
        for step in WizardStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step.slug()));
        }
    }

    #[test]
    fn test_schemas_line_up_with_steps() {
        for step in WizardStep::ALL {
            let schema = step.schema();
            assert_eq!(schema.step, step);
            assert!(schema.required_fields().next().is_some(), "{} has no required field", step);
        }
    }

    #[test]
    fn test_progress() {
        assert_eq!(StepRegistry::progress(&[]), 0);
        assert_eq!(
            StepRegistry::progress(&[WizardStep::BasicInfo, WizardStep::BasicInfo, WizardStep::WorkInfo]),
            20
        );
        assert_eq!(StepRegistry::progress(&WizardStep::ALL), 100);
        assert_eq!(StepRegistry::resume_at(&[WizardStep::BasicInfo]), Some(WizardStep::PersonalInfo2));
        assert_eq!(StepRegistry::resume_at(&WizardStep::ALL), None);
        assert_eq!(StepRegistry::path("tok", WizardStep::Upload), "/fill/tok/upload");
    }
}
