//! In-memory form state, decoupled from whatever surface collects it.
//!
//! A UI layer (or the interactive `fill` loop) writes values in as the
//! user answers; the submission side takes snapshots. Nothing here
//! touches the network or the disk.

use std::collections::BTreeMap;

use survey_protocol::SurveyField;
use survey_protocol::SurveyRecord;

/// A single answer: free text, or a multi-select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// True when the value carries nothing meaningful.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Wire rendering. Lists flatten to a comma-separated string.
    pub fn to_wire(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

/// The answers gathered on the page the respondent is currently looking
/// at, plus which page that is.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    page: String,
    values: BTreeMap<SurveyField, FieldValue>,
}

impl FormState {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            values: BTreeMap::new(),
        }
    }

    /// The page these answers belong to, e.g. `"page3"`.
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Point the form at a new page. Values carry over until cleared;
    /// callers that want a fresh page start from a new `FormState`.
    pub fn set_page(&mut self, page: impl Into<String>) {
        self.page = page.into();
    }

    pub fn set_text(&mut self, field: SurveyField, value: impl Into<String>) {
        self.values.insert(field, FieldValue::Text(value.into()));
    }

    pub fn set_list(&mut self, field: SurveyField, items: Vec<String>) {
        self.values.insert(field, FieldValue::List(items));
    }

    pub fn clear(&mut self, field: SurveyField) {
        self.values.remove(&field);
    }

    pub fn value(&self, field: SurveyField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// Whether anything worth submitting has been entered.
    pub fn has_data(&self) -> bool {
        self.values.values().any(|value| !value.is_blank())
    }

    /// Snapshot the current answers as a partial record. Blank values
    /// render as empty strings and drop out during merging.
    pub fn snapshot(&self) -> SurveyRecord {
        let mut record = SurveyRecord::default();
        for (field, value) in &self.values {
            record.set_value(*field, value.to_wire());
        }
        record.set_value(SurveyField::CurrentPage, self.page.clone());
        record
    }
}
