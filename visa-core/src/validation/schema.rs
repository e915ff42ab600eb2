//! Step schema descriptors
//!
//! A step is described once as data: its fields (name, kind, required)
//! and its cross-field rules. The engine interprets the descriptor; no
//! step carries validation code of its own.

use serde_json::{Map, Value};

/// Declared type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// Text that must look like an email address when present
    Email,
    /// One of a fixed set of codes
    Enum(&'static [&'static str]),
    /// Checkbox or yes/no question
    Bool,
    /// `YYYY-MM-DD`
    Date,
    /// Number, coerced from string input
    Number { min: Option<f64>, max: Option<f64> },
    /// Array of sub-records validated element by element
    Records(RecordSchema),
}

/// Schema of one element of a `Records` field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSchema {
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<Rule>,
}

/// One declared field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Text-like: non-empty. Bool: answered. Number: present. Records: non-empty.
    pub required: bool,
    /// Bool only: must be checked
    pub accepted: bool,
    pub max_len: Option<usize>,
}

impl FieldSpec {
    fn of(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            accepted: false,
            max_len: None,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::of(name, FieldKind::Text)
    }

    pub fn email(name: &'static str) -> Self {
        Self::of(name, FieldKind::Email)
    }

    pub fn choice(name: &'static str, options: &'static [&'static str]) -> Self {
        Self::of(name, FieldKind::Enum(options))
    }

    pub fn flag(name: &'static str) -> Self {
        Self::of(name, FieldKind::Bool)
    }

    pub fn date(name: &'static str) -> Self {
        Self::of(name, FieldKind::Date)
    }

    pub fn number(name: &'static str) -> Self {
        Self::of(name, FieldKind::Number { min: None, max: None })
    }

    pub fn records(name: &'static str, schema: RecordSchema) -> Self {
        Self::of(name, FieldKind::Records(schema))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Checkbox that must be ticked to continue
    pub fn accepted(mut self) -> Self {
        self.accepted = true;
        self
    }

    pub fn max(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    pub fn range(mut self, lo: Option<f64>, hi: Option<f64>) -> Self {
        if let FieldKind::Number { min, max } = &mut self.kind {
            *min = lo;
            *max = hi;
        }
        self
    }

    /// Value a missing optional field takes after normalization
    pub fn default_value(&self) -> Value {
        match &self.kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Enum(_) | FieldKind::Date => {
                Value::String(String::new())
            }
            // An unanswered required yes/no question stays null so it can be detected.
            FieldKind::Bool if self.required => Value::Null,
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Number { .. } => Value::Null,
            FieldKind::Records(_) => Value::Array(Vec::new()),
        }
    }
}

/// Condition over the (normalized) fields of an object
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IsTrue(&'static str),
    /// Explicitly false; an unanswered question is neither true nor false
    IsFalse(&'static str),
    Equals(&'static str, &'static str),
    /// Filled and different from the value
    NotEquals(&'static str, &'static str),
    OneOf(&'static str, &'static [&'static str]),
    AnyFilled(&'static [&'static str]),
    NoneFilled(&'static [&'static str]),
    All(Vec<Predicate>),
}

impl Predicate {
    /// Evaluate against a normalized object
    pub fn holds(&self, obj: &Map<String, Value>) -> bool {
        match self {
            Self::IsTrue(f) => obj.get(*f).and_then(Value::as_bool) == Some(true),
            Self::IsFalse(f) => obj.get(*f).and_then(Value::as_bool) == Some(false),
            Self::Equals(f, v) => text(obj, f) == *v,
            Self::NotEquals(f, v) => {
                let current = text(obj, f);
                !current.is_empty() && current != *v
            }
            Self::OneOf(f, values) => {
                let current = text(obj, f);
                values.iter().any(|v| *v == current)
            }
            Self::AnyFilled(fields) => fields.iter().any(|f| is_filled(obj.get(*f))),
            Self::NoneFilled(fields) => !fields.iter().any(|f| is_filled(obj.get(*f))),
            Self::All(preds) => preds.iter().all(|p| p.holds(obj)),
        }
    }
}

fn text<'a>(obj: &'a Map<String, Value>, field: &str) -> &'a str {
    obj.get(field).and_then(Value::as_str).unwrap_or("").trim()
}

/// Whether a normalized value counts as filled in
pub fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Number(_)) => true,
    }
}

/// Cross-field rule, evaluated after per-field checks pass
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// When `when` holds, every field in `fields` must be filled
    RequireWhen {
        when: Predicate,
        fields: &'static [&'static str],
        message: &'static str,
    },
    /// When both dates are present, `later` must be strictly after `earlier`
    DateAfter {
        later: &'static str,
        earlier: &'static str,
        message: &'static str,
    },
}

impl Rule {
    pub fn require_when(when: Predicate, fields: &'static [&'static str], message: &'static str) -> Self {
        Self::RequireWhen { when, fields, message }
    }

    /// Filling any of `fields` makes all of them required
    pub fn all_or_none(fields: &'static [&'static str], message: &'static str) -> Self {
        Self::RequireWhen {
            when: Predicate::AnyFilled(fields),
            fields,
            message,
        }
    }

    pub fn date_after(later: &'static str, earlier: &'static str, message: &'static str) -> Self {
        Self::DateAfter {
            later,
            earlier,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_predicates() {
        let o = obj(json!({
            "a": true,
            "b": false,
            "c": null,
            "kind": "EMPLOYED",
            "name": "  ",
            "list": [1]
        }));
        assert!(Predicate::IsTrue("a").holds(&o));
        assert!(Predicate::IsFalse("b").holds(&o));
        assert!(!Predicate::IsFalse("c").holds(&o));
        assert!(!Predicate::IsTrue("c").holds(&o));
        assert!(Predicate::OneOf("kind", &["EMPLOYED", "SELF_EMPLOYED"]).holds(&o));
        assert!(Predicate::NotEquals("kind", "SELF").holds(&o));
        assert!(!Predicate::NotEquals("name", "SELF").holds(&o));
        assert!(Predicate::NoneFilled(&["name", "missing"]).holds(&o));
        assert!(Predicate::AnyFilled(&["name", "list"]).holds(&o));
        assert!(Predicate::All(vec![Predicate::IsTrue("a"), Predicate::IsFalse("b")]).holds(&o));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(FieldSpec::text("x").default_value(), json!(""));
        assert_eq!(FieldSpec::flag("x").default_value(), json!(false));
        assert_eq!(FieldSpec::flag("x").required().default_value(), Value::Null);
        assert_eq!(FieldSpec::number("x").default_value(), Value::Null);
        assert_eq!(
            FieldSpec::records("x", RecordSchema::default()).default_value(),
            json!([])
        );
    }
}
