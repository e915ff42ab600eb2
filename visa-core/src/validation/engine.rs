//! Step validation engine
//!
//! Validation is synchronous and pure. Processing order for one object:
//!
//! 1. normalization: defaults for missing fields, trimming, numeric coercion
//! 2. type checks (both modes)
//! 3. required checks (`SaveMode::Continue` only)
//! 4. cross-field rules (`SaveMode::Continue` only, and only once 1-3 passed)
//!
//! Array elements go through the same steps independently, with their
//! errors addressed as `records[index].field`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use super::errors::{element_path, ValidationErrors, ROOT_PATH};
use super::schema::{is_filled, FieldKind, FieldSpec, Rule};
use super::steps::{StepSchema, WizardStep};
use crate::error::{VisaError, VisaResult};

/// Date format used by all date fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$";

static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Whether `s` looks like an email address; nothing matches if the pattern failed to build
fn is_email(s: &str) -> bool {
    EMAIL_RE.as_ref().map_or(false, |re| re.is_match(s))
}

/// Messages shown next to inputs
pub mod messages {
    pub const REQUIRED: &str = "此字段为必填项";
    pub const MUST_ACCEPT: &str = "请勾选此项";
    pub const NOT_TEXT: &str = "应为文本";
    pub const TOO_LONG: &str = "内容过长";
    pub const BAD_EMAIL: &str = "邮箱格式不正确";
    pub const BAD_OPTION: &str = "无效的选项";
    pub const BAD_DATE: &str = "日期格式应为 YYYY-MM-DD";
    pub const NOT_BOOL: &str = "应为是/否";
    pub const NOT_NUMBER: &str = "请输入有效数字";
    pub const OUT_OF_RANGE: &str = "数值超出范围";
    pub const NOT_LIST: &str = "应为列表";
    pub const NOT_RECORD: &str = "条目格式无效";
    pub const NOT_OBJECT: &str = "表单数据格式无效";
}

/// Which save path is being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Save draft: structural and type checks only
    #[default]
    Draft,
    /// Save and continue: required fields and cross-field rules too
    Continue,
}

impl SaveMode {
    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

/// A step payload that passed validation, normalized and ready to persist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedStep {
    pub step: WizardStep,
    pub mode: SaveMode,
    pub data: Map<String, Value>,
}

impl ValidatedStep {
    /// Deserialize into the typed record of the step
    pub fn into_typed<T: DeserializeOwned>(self) -> VisaResult<T> {
        Ok(serde_json::from_value(Value::Object(self.data))?)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Validate `input` against `schema`
pub fn validate(schema: &StepSchema, input: &Value, mode: SaveMode) -> Result<ValidatedStep, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let empty = Map::new();
    let obj = match input {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            errors.add(ROOT_PATH, messages::NOT_OBJECT);
            return Err(errors);
        }
    };

    let data = check_object(&schema.fields, &schema.rules, obj, mode, None, &mut errors);

    debug!(
        step = schema.step.slug(),
        mode = ?mode,
        errors = errors.len(),
        "Step validated"
    );

    errors.into_result().map(|_| ValidatedStep {
        step: schema.step,
        mode,
        data,
    })
}

/// Validate a step by its registry entry
pub fn validate_step(step: WizardStep, input: &Value, mode: SaveMode) -> Result<ValidatedStep, ValidationErrors> {
    validate(step.schema(), input, mode)
}

/// Same as [`validate_step`], with the error map wrapped in a [`VisaError`]
pub fn require_valid(step: WizardStep, input: &Value, mode: SaveMode) -> VisaResult<ValidatedStep> {
    validate_step(step, input, mode).map_err(|errors| {
        if errors.contains(ROOT_PATH) {
            VisaError::PayloadNotObject
        } else {
            VisaError::StepInvalid {
                step: step.slug().to_string(),
                errors,
            }
        }
    })
}

type Prefix<'a> = Option<(&'a str, usize)>;

fn path_of(prefix: Prefix<'_>, field: &str) -> String {
    match prefix {
        Some((array, index)) => element_path(array, index, field),
        None => field.to_string(),
    }
}

fn check_object(
    fields: &[FieldSpec],
    rules: &[Rule],
    input: &Map<String, Value>,
    mode: SaveMode,
    prefix: Prefix<'_>,
    errors: &mut ValidationErrors,
) -> Map<String, Value> {
    let before = errors.len();
    let mut out = Map::new();

    for spec in fields {
        let path = path_of(prefix, spec.name);
        let value = normalize(spec, input.get(spec.name), &path, mode, errors);
        if mode == SaveMode::Continue {
            check_required(spec, &value, &path, errors);
        }
        out.insert(spec.name.to_string(), value);
    }

    if mode == SaveMode::Continue && errors.len() == before {
        for rule in rules {
            apply_rule(rule, &out, prefix, errors);
        }
    }
    out
}

fn check_required(spec: &FieldSpec, value: &Value, path: &str, errors: &mut ValidationErrors) {
    if spec.accepted && value.as_bool() != Some(true) {
        errors.add(path, messages::MUST_ACCEPT);
        return;
    }
    if !spec.required {
        return;
    }
    let answered = match spec.kind {
        FieldKind::Bool => !value.is_null(),
        _ => is_filled(Some(value)),
    };
    if !answered {
        errors.add(path, messages::REQUIRED);
    }
}

fn apply_rule(rule: &Rule, obj: &Map<String, Value>, prefix: Prefix<'_>, errors: &mut ValidationErrors) {
    match rule {
        Rule::RequireWhen { when, fields, message } => {
            if when.holds(obj) {
                for field in fields.iter() {
                    if !is_filled(obj.get(*field)) {
                        errors.add(path_of(prefix, field), *message);
                    }
                }
            }
        }
        Rule::DateAfter { later, earlier, message } => {
            let date = |f: &str| obj.get(f).and_then(Value::as_str).and_then(parse_date);
            if let (Some(l), Some(e)) = (date(*later), date(*earlier)) {
                if l <= e {
                    errors.add(path_of(prefix, later), *message);
                }
            }
        }
    }
}

fn normalize(spec: &FieldSpec, raw: Option<&Value>, path: &str, mode: SaveMode, errors: &mut ValidationErrors) -> Value {
    let raw = match raw {
        None | Some(Value::Null) => return spec.default_value(),
        Some(v) => v,
    };

    match &spec.kind {
        FieldKind::Text => normalize_text(spec, raw, path, errors),
        FieldKind::Email => {
            let value = normalize_text(spec, raw, path, errors);
            if let Some(s) = value.as_str() {
                if !s.is_empty() && !is_email(s) {
                    errors.add(path, messages::BAD_EMAIL);
                }
            }
            value
        }
        FieldKind::Enum(options) => {
            let value = normalize_text(spec, raw, path, errors);
            if let Some(s) = value.as_str() {
                if !s.is_empty() && !options.contains(&s) {
                    errors.add(path, messages::BAD_OPTION);
                }
            }
            value
        }
        FieldKind::Date => {
            let value = normalize_text(spec, raw, path, errors);
            if let Some(s) = value.as_str() {
                if !s.is_empty() && parse_date(s).is_none() {
                    errors.add(path, messages::BAD_DATE);
                }
            }
            value
        }
        FieldKind::Bool => match raw {
            Value::Bool(b) => Value::Bool(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "" => spec.default_value(),
                "true" | "on" | "yes" | "1" => Value::Bool(true),
                "false" | "off" | "no" | "0" => Value::Bool(false),
                _ => {
                    errors.add(path, messages::NOT_BOOL);
                    spec.default_value()
                }
            },
            _ => {
                errors.add(path, messages::NOT_BOOL);
                spec.default_value()
            }
        },
        FieldKind::Number { min, max } => {
            let number = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) if s.trim().is_empty() => return Value::Null,
                Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
                _ => None,
            };
            let Some(n) = number else {
                errors.add(path, messages::NOT_NUMBER);
                return Value::Null;
            };
            if min.map(|lo| n < lo).unwrap_or(false) || max.map(|hi| n > hi).unwrap_or(false) {
                errors.add(path, messages::OUT_OF_RANGE);
            }
            number_value(n)
        }
        FieldKind::Records(schema) => {
            let Value::Array(items) = raw else {
                errors.add(path, messages::NOT_LIST);
                return Value::Array(Vec::new());
            };
            let elements = items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(obj) => Value::Object(check_object(
                        &schema.fields,
                        &schema.rules,
                        obj,
                        mode,
                        Some((spec.name, index)),
                        errors,
                    )),
                    _ => {
                        errors.add(format!("{}[{}]", spec.name, index), messages::NOT_RECORD);
                        item.clone()
                    }
                })
                .collect();
            Value::Array(elements)
        }
    }
}

fn normalize_text(spec: &FieldSpec, raw: &Value, path: &str, errors: &mut ValidationErrors) -> Value {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            errors.add(path, messages::NOT_TEXT);
            return Value::String(String::new());
        }
    };
    if let Some(limit) = spec.max_len {
        if text.chars().count() > limit {
            errors.add(path, messages::TOO_LONG);
        }
    }
    Value::String(text)
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::schema::{Predicate, RecordSchema};
    use serde_json::json;

    #[test]
    fn test_email_pattern() {
        assert!(Regex::new(EMAIL_PATTERN).is_ok());
        assert!(is_email("zhang.wei+visa@example.com.cn"));
        assert!(!is_email("zhang.wei@example"));
        assert!(!is_email("not an email"));
    }

    fn schema() -> StepSchema {
        StepSchema {
            step: WizardStep::TravelInfo,
            fields: vec![
                FieldSpec::text("name").required().max(5),
                FieldSpec::email("email"),
                FieldSpec::choice("kind", &["A", "B"]),
                FieldSpec::flag("has_extra"),
                FieldSpec::text("extra"),
                FieldSpec::number("count").range(Some(1.0), Some(10.0)),
                FieldSpec::date("start"),
                FieldSpec::date("end"),
                FieldSpec::records(
                    "items",
                    RecordSchema {
                        fields: vec![FieldSpec::text("x"), FieldSpec::text("y")],
                        rules: vec![Rule::all_or_none(&["x", "y"], "both")],
                    },
                ),
            ],
            rules: vec![
                Rule::require_when(Predicate::IsTrue("has_extra"), &["extra"], "extra needed"),
                Rule::date_after("end", "start", "end after start"),
            ],
        }
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let step = validate(&schema(), &json!({}), SaveMode::Draft).unwrap();
        assert_eq!(step.data["name"], json!(""));
        assert_eq!(step.data["has_extra"], json!(false));
        assert_eq!(step.data["count"], Value::Null);
        assert_eq!(step.data["items"], json!([]));
    }

    #[test]
    fn test_numeric_coercion() {
        let step = validate(&schema(), &json!({ "count": " 7 " }), SaveMode::Draft).unwrap();
        assert_eq!(step.data["count"], json!(7));

        let errors = validate(&schema(), &json!({ "count": "seven" }), SaveMode::Draft).unwrap_err();
        assert_eq!(errors.first("count"), Some(messages::NOT_NUMBER));

        let errors = validate(&schema(), &json!({ "count": 11 }), SaveMode::Draft).unwrap_err();
        assert_eq!(errors.first("count"), Some(messages::OUT_OF_RANGE));
    }

    #[test]
    fn test_type_checks_apply_to_drafts() {
        let errors = validate(
            &schema(),
            &json!({ "email": "nope", "kind": "C", "start": "2024/01/01", "name": "toolong" }),
            SaveMode::Draft,
        )
        .unwrap_err();
        assert!(errors.contains("email"));
        assert!(errors.contains("kind"));
        assert!(errors.contains("start"));
        assert!(errors.contains("name"));
    }

    #[test]
    fn test_rules_skipped_until_fields_pass() {
        // name missing: required error only, the extra rule is not evaluated yet
        let errors = validate(&schema(), &json!({ "has_extra": true }), SaveMode::Continue).unwrap_err();
        assert!(errors.contains("name"));
        assert!(!errors.contains("extra"));

        let errors = validate(&schema(), &json!({ "name": "ok", "has_extra": true }), SaveMode::Continue)
            .unwrap_err();
        assert_eq!(errors.first("extra"), Some("extra needed"));
    }

    #[test]
    fn test_date_order() {
        let input = json!({ "name": "ok", "start": "2024-05-01", "end": "2024-05-01" });
        let errors = validate(&schema(), &input, SaveMode::Continue).unwrap_err();
        assert_eq!(errors.first("end"), Some("end after start"));

        let input = json!({ "name": "ok", "start": "2024-05-01", "end": "2024-05-02" });
        assert!(validate(&schema(), &input, SaveMode::Continue).is_ok());

        // Only one date present: nothing to compare
        let input = json!({ "name": "ok", "end": "2024-05-02" });
        assert!(validate(&schema(), &input, SaveMode::Continue).is_ok());
    }

    #[test]
    fn test_record_rules_per_index() {
        let input = json!({
            "name": "ok",
            "items": [{ "x": "1", "y": "2" }, { "x": "1" }, "bad"]
        });
        let errors = validate(&schema(), &input, SaveMode::Continue).unwrap_err();
        assert!(errors.contains("items[2]"));
        // element 1 passed its field checks, so its rule ran
        assert_eq!(errors.first("items[1].y"), Some("both"));
        assert!(!errors.paths().any(|p| p.starts_with("items[0]")));
    }

    #[test]
    fn test_non_object_payload() {
        let errors = validate(&schema(), &json!([1, 2]), SaveMode::Draft).unwrap_err();
        assert_eq!(errors.first(ROOT_PATH), Some(messages::NOT_OBJECT));
    }

    #[test]
    fn test_unknown_fields_dropped() {
        let step = validate(&schema(), &json!({ "name": "ok", "rogue": 1 }), SaveMode::Continue).unwrap();
        assert!(!step.data.contains_key("rogue"));
    }
}
