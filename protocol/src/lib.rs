//! Shared survey data model: the canonical field set, the wire shapes spoken
//! between the submission client and the collector, and the delimited-text
//! codec used by the sheet store and the fallback export.

pub mod csv;
pub mod fields;
pub mod record;
pub mod wire;

pub use fields::EXPORT_FIELDS;
pub use fields::SurveyField;
pub use record::SurveyRecord;
pub use wire::DataType;
pub use wire::HealthResponse;
pub use wire::Submission;
pub use wire::SubmitAction;
pub use wire::SubmitResponse;
