//! `detail` payload of non-2xx responses
//!
//! The backend reports errors as `{"detail": "..."}` or, for request
//! validation failures, `{"detail": [{"loc": [...], "msg": "..."}]}`.

use serde::{Deserialize, Serialize};
use visa_core::ValidationErrors;

/// Location segments the backend prefixes onto field paths
const LOC_SOURCES: &[&str] = &["body", "query", "path", "header"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocSegment {
    Index(u64),
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailEntry {
    #[serde(default)]
    pub loc: Vec<LocSegment>,
    pub msg: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl DetailEntry {
    /// Field path in `records[i].field` notation, without the source prefix
    pub fn path(&self) -> String {
        let mut segments = self.loc.iter().peekable();
        if let Some(LocSegment::Key(first)) = segments.peek() {
            if LOC_SOURCES.contains(&first.as_str()) && self.loc.len() > 1 {
                segments.next();
            }
        }

        let mut path = String::new();
        for segment in segments {
            match segment {
                LocSegment::Index(i) => path.push_str(&format!("[{}]", i)),
                LocSegment::Key(key) => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(key);
                }
            }
        }
        if path.is_empty() {
            visa_core::validation::ROOT_PATH.to_string()
        } else {
            path
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiDetail {
    Message(String),
    Entries(Vec<DetailEntry>),
    Other(serde_json::Value),
}

impl ApiDetail {
    /// Extract `detail` from a response body
    pub fn from_body(body: &[u8]) -> Option<Self> {
        #[derive(Deserialize)]
        struct Envelope {
            detail: Option<ApiDetail>,
        }
        serde_json::from_slice::<Envelope>(body).ok().and_then(|e| e.detail)
    }

    /// One display line
    pub fn flatten(&self) -> String {
        match self {
            Self::Message(m) => m.clone(),
            Self::Entries(entries) => entries.iter().map(|e| e.msg.as_str()).collect::<Vec<_>>().join("; "),
            Self::Other(v) => v.to_string(),
        }
    }

    /// Map entries onto form field paths
    pub fn field_errors(&self) -> ValidationErrors {
        match self {
            Self::Entries(entries) => entries.iter().map(|e| (e.path(), e.msg.clone())).collect(),
            _ => ValidationErrors::new(),
        }
    }
}
