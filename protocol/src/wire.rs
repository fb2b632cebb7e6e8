//! Wire shapes spoken between the submission client and the collector.

use serde::Deserialize;
use serde::Serialize;

use crate::fields::SurveyField;
use crate::record::SurveyRecord;

// ─────────────────────────────────────────────────────────────────────────────
// Submissions
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminator carried by the simplified submission shapes. A submission
/// without one is the full incremental shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Page1,
    Page7,
    Plan,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Page1 => "page1",
            DataType::Page7 => "page7",
            DataType::Plan => "plan",
        }
    }

    pub fn parse(value: &str) -> Option<DataType> {
        match value {
            "page1" => Some(DataType::Page1),
            "page7" => Some(DataType::Page7),
            "plan" => Some(DataType::Plan),
            _ => None,
        }
    }
}

/// One submission: a (possibly partial) record plus the optional shape
/// discriminator. The collector treats every shape as a partial record;
/// `dataType` never becomes a stored column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "dataType", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(flatten)]
    pub record: SurveyRecord,
}

impl Submission {
    /// The full incremental shape: every canonical field serialized, empty
    /// string for anything unset.
    pub fn full(record: SurveyRecord) -> Submission {
        Submission {
            data_type: None,
            record,
        }
    }

    /// One of the simplified shapes: only the fields it sets are serialized.
    pub fn simplified(data_type: DataType, record: SurveyRecord) -> Submission {
        Submission {
            data_type: Some(data_type),
            record,
        }
    }

    /// Key/value pairs in wire order, ready for form encoding.
    pub fn to_form_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = Vec::new();
        if let Some(data_type) = self.data_type {
            pairs.push(("dataType", data_type.as_str().to_string()));
            for field in SurveyField::ALL {
                if self.record.has_value(field) {
                    pairs.push((field.wire_key(), self.record.value(field).to_string()));
                }
            }
        } else {
            for field in SurveyField::ALL {
                pairs.push((field.wire_key(), self.record.value(field).to_string()));
            }
        }
        pairs
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn to_form_body(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.to_form_pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }

    /// Parse a form-encoded body. Unknown keys are ignored; the `plan` short
    /// key maps to `selectedPlan`.
    pub fn from_form_body(body: &str) -> Submission {
        Submission::from_pairs(url::form_urlencoded::parse(body.as_bytes()).into_owned())
    }

    /// Assemble a submission from decoded key/value pairs.
    pub fn from_pairs<I>(pairs: I) -> Submission
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut submission = Submission::default();
        for (key, value) in pairs {
            match key.as_str() {
                "dataType" => submission.data_type = DataType::parse(&value),
                "plan" => {
                    submission.record.set_value(SurveyField::SelectedPlan, value);
                }
                _ => {
                    if let Some(field) = SurveyField::from_wire_key(&key) {
                        submission.record.set_value(field, value);
                    }
                }
            }
        }
        submission
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// What the upsert did to the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitAction {
    Updated,
    Created,
}

/// Response payload of a `POST` to the collection endpoint.
///
/// `row` is the sheet position including the header row, so the first data
/// row reports as 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum SubmitResponse {
    Success { action: SubmitAction, row: usize },
    Error { error: String },
}

/// Response payload of a `GET` health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub instructions: String,
}

impl HealthResponse {
    pub fn ready() -> HealthResponse {
        HealthResponse {
            status: "success".to_string(),
            message: "Survey collector is running. Ready to receive POST requests.".to_string(),
            instructions:
                "POST survey submissions to this URL as form-encoded or JSON bodies. \
                 A GET returns this status payload."
                    .to_string(),
        }
    }
}
