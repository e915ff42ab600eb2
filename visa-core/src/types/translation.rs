//! Translation Comparison Types

use serde::{Deserialize, Serialize};

use super::common::*;
use super::diagnosis::JobState;

/// One translated form field shown side by side with its source value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationField {
    pub id: TranslationFieldId,
    pub field_name: String,
    #[serde(default)]
    pub label: String,
    pub source_value: String,
    pub translated_value: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Edited by a consultant after machine translation
    #[serde(default)]
    pub edited: bool,
}

impl TranslationField {
    /// Machine confidence below this is flagged for manual review
    pub const LOW_CONFIDENCE: f32 = 0.8;

    pub fn needs_review(&self) -> bool {
        !self.edited && self.confidence.map(|c| c < Self::LOW_CONFIDENCE).unwrap_or(false)
    }
}

/// Source/translation comparison for one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationComparison {
    pub case_id: CaseId,
    pub status: JobState,
    #[serde(default)]
    pub fields: Vec<TranslationField>,
}

impl TranslationComparison {
    pub fn field(&self, id: &TranslationFieldId) -> Option<&TranslationField> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn field_mut(&mut self, id: &TranslationFieldId) -> Option<&mut TranslationField> {
        self.fields.iter_mut().find(|f| &f.id == id)
    }

    /// Fields flagged for manual review
    pub fn review_queue(&self) -> Vec<&TranslationField> {
        self.fields.iter().filter(|f| f.needs_review()).collect()
    }
}

/// Field edit request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationFieldUpdate {
    pub translated_value: String,
}
