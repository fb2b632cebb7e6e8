//! Submission policy: what merges into the buffer, what goes on the
//! wire, and where a row lands when it cannot be delivered.

use std::sync::Arc;

use chrono::SecondsFormat;
use chrono::Utc;
use survey_protocol::DataType;
use survey_protocol::Submission;
use survey_protocol::SubmitAction;
use survey_protocol::SubmitResponse;
use survey_protocol::SurveyField;
use survey_protocol::SurveyRecord;

use crate::buffer::LocalBuffer;
use crate::buffer::PersistError;
use crate::config::ClientConfig;
use crate::export::ExportReceipt;
use crate::export::FallbackExporter;
use crate::form::FormState;
use crate::transport::Delivery;
use crate::transport::HttpTransport;
use crate::transport::Transport;
use crate::validate::validate_email;

/// Subdirectory of the survey home receiving fallback exports.
pub const EXPORT_DIR: &str = "exports";

/// Fields the service-preference shape carries.
const PAGE1_FIELDS: [SurveyField; 6] = [
    SurveyField::Services,
    SurveyField::Duration,
    SurveyField::WorkTime,
    SurveyField::GenderPreference,
    SurveyField::HoursPerWeek,
    SurveyField::FoodArrangement,
];

/// Fields the contact shape carries.
const PAGE7_FIELDS: [SurveyField; 4] = [
    SurveyField::ZipCode,
    SurveyField::Address,
    SurveyField::FirstName,
    SurveyField::Email,
];

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// Validation refused the submission; the message is user-facing.
    #[error("{0}")]
    InvalidEmail(String),
}

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The collector acknowledged the row.
    Delivered { action: SubmitAction, row: usize },
    /// Handed to the fire-and-forget transport; no response expected.
    HandedOff,
    /// Not sent, or refused by the collector; the row went to the
    /// local export instead.
    ExportedLocally {
        receipt: ExportReceipt,
        reason: String,
    },
    /// Fire-and-forget with no endpoint configured. Dropped silently;
    /// the buffer still holds whatever was merged.
    Skipped,
}

/// Drives every submission path over one buffer and one transport.
///
/// `transport: None` is the disabled state an unset or placeholder
/// endpoint resolves to. Submissions then degrade to export-only
/// without treating the situation as an error.
pub struct SubmissionClient {
    buffer: LocalBuffer,
    exporter: FallbackExporter,
    transport: Option<Arc<dyn Transport>>,
}

impl SubmissionClient {
    pub fn new(
        config: &ClientConfig,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self, PersistError> {
        let buffer = LocalBuffer::open(config.survey_home.clone())?;
        let exporter = FallbackExporter::new(buffer.clone(), config.survey_home.join(EXPORT_DIR));
        Ok(Self {
            buffer,
            exporter,
            transport,
        })
    }

    /// Build a client whose transport follows the configured endpoint.
    pub fn from_config(config: &ClientConfig) -> Result<Self, PersistError> {
        let transport = config
            .endpoint()
            .map(|endpoint| Arc::new(HttpTransport::new(endpoint)) as Arc<dyn Transport>);
        Self::new(config, transport)
    }

    pub fn session_id(&self) -> Result<String, PersistError> {
        self.buffer.session_id()
    }

    pub fn buffered_record(&self) -> Result<SurveyRecord, PersistError> {
        self.buffer.load_record()
    }

    /// Merge the latest page snapshot into the buffer and submit the
    /// full record.
    pub async fn submit_form(
        &self,
        form: &FormState,
        delivery: Delivery,
    ) -> Result<SubmitOutcome, SubmitError> {
        self.submit_partial(form.snapshot(), delivery).await
    }

    /// Merge `partial` into the buffered record, persist, then send the
    /// whole record. The buffer write lands before any network I/O, so
    /// a transport failure never loses data.
    pub async fn submit_partial(
        &self,
        partial: SurveyRecord,
        delivery: Delivery,
    ) -> Result<SubmitOutcome, SubmitError> {
        let record = self.roll_forward(&partial)?;
        let outcome = self.send(Submission::full(record), delivery).await?;
        Ok(outcome)
    }

    /// Submit only the service-preference answers, keyed `page1`. The
    /// shape is standalone; nothing merges into the buffer.
    pub async fn submit_page1(&self, form: &FormState) -> Result<SubmitOutcome, SubmitError> {
        let partial = project(&form.snapshot(), &PAGE1_FIELDS);
        let outcome = self
            .send(
                Submission::simplified(DataType::Page1, partial),
                Delivery::normal(),
            )
            .await?;
        Ok(outcome)
    }

    /// Submit the contact block. Refused outright when the email does
    /// not validate; nothing is sent or exported in that case.
    pub async fn submit_page7(&self, form: &FormState) -> Result<SubmitOutcome, SubmitError> {
        let partial = project(&form.snapshot(), &PAGE7_FIELDS);
        let verdict = validate_email(partial.value(SurveyField::Email));
        if !verdict.valid {
            return Err(SubmitError::InvalidEmail(verdict.message));
        }
        let outcome = self
            .send(
                Submission::simplified(DataType::Page7, partial),
                Delivery::normal(),
            )
            .await?;
        Ok(outcome)
    }

    /// Record the chosen plan, normalizing the bare tier names. Sent
    /// fire-and-forget so navigation never waits on it.
    pub async fn submit_plan(&self, plan: &str) -> Result<SubmitOutcome, SubmitError> {
        let mut partial = SurveyRecord::default();
        partial.set_value(SurveyField::SelectedPlan, normalize_plan(plan));
        let outcome = self
            .send(
                Submission::simplified(DataType::Plan, partial),
                Delivery::fire_and_forget(),
            )
            .await?;
        Ok(outcome)
    }

    /// Read-modify-write of the buffered record. `timestamp` is stamped
    /// exactly once, on the first submission of the session; every
    /// submission refreshes `lastUpdated`.
    fn roll_forward(&self, partial: &SurveyRecord) -> Result<SurveyRecord, PersistError> {
        let mut record = self.buffer.load_record()?;
        record.merge_non_empty(partial);

        if !record.has_value(SurveyField::SessionId) {
            record.set_value(SurveyField::SessionId, self.buffer.session_id()?);
        }
        let now = now_stamp();
        if !record.has_value(SurveyField::Timestamp) {
            record.set_value(SurveyField::Timestamp, now.clone());
        }
        record.set_value(SurveyField::LastUpdated, now);

        self.buffer.save_record(&record)?;
        Ok(record)
    }

    async fn send(
        &self,
        submission: Submission,
        delivery: Delivery,
    ) -> Result<SubmitOutcome, PersistError> {
        let Some(transport) = &self.transport else {
            if delivery.survives_unload {
                tracing::debug!("endpoint disabled; dropping fire-and-forget submission");
                return Ok(SubmitOutcome::Skipped);
            }
            tracing::info!("endpoint disabled; exporting locally");
            let receipt = self.exporter.export(&submission.record)?;
            return Ok(SubmitOutcome::ExportedLocally {
                receipt,
                reason: "endpoint not configured".to_string(),
            });
        };

        match transport.deliver(&submission, delivery).await {
            Ok(Some(SubmitResponse::Success { action, row })) => {
                tracing::debug!("submission acknowledged: {action:?} row {row}");
                Ok(SubmitOutcome::Delivered { action, row })
            }
            Ok(Some(SubmitResponse::Error { error })) => {
                tracing::warn!("collector rejected submission: {error}");
                let receipt = self.exporter.export(&submission.record)?;
                Ok(SubmitOutcome::ExportedLocally {
                    receipt,
                    reason: error,
                })
            }
            Ok(None) => Ok(SubmitOutcome::HandedOff),
            Err(err) => {
                if delivery.survives_unload {
                    tracing::debug!("fire-and-forget submission failed: {err}");
                    return Ok(SubmitOutcome::Skipped);
                }
                tracing::warn!("submission failed, exporting locally: {err}");
                let receipt = self.exporter.export(&submission.record)?;
                Ok(SubmitOutcome::ExportedLocally {
                    receipt,
                    reason: err.to_string(),
                })
            }
        }
    }
}

fn project(snapshot: &SurveyRecord, fields: &[SurveyField]) -> SurveyRecord {
    let mut partial = SurveyRecord::default();
    for &field in fields {
        if snapshot.has_value(field) {
            partial.set_value(field, snapshot.value(field));
        }
    }
    partial
}

fn normalize_plan(plan: &str) -> String {
    match plan {
        "Basic" => "Basic Plan".to_string(),
        "Premium" => "Premium Plan".to_string(),
        other => other.to_string(),
    }
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DEBOUNCE_MS;
    use crate::config::DEFAULT_HEARTBEAT_SECS;
    use crate::transport::testing::RecordingTransport;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> ClientConfig {
        ClientConfig {
            survey_home: dir.path().join("survey"),
            endpoint: Some("http://127.0.0.1:1/collect".to_string()),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        }
    }

    fn client_with(
        dir: &TempDir,
        transport: Option<Arc<dyn Transport>>,
    ) -> SubmissionClient {
        SubmissionClient::new(&test_config(dir), transport).unwrap()
    }

    #[tokio::test]
    async fn merges_stamps_and_persists_before_sending() {
        let dir = TempDir::new().unwrap();
        let transport = RecordingTransport::new();
        let client = client_with(&dir, Some(transport.clone()));

        let mut form = FormState::new("page2");
        form.set_text(SurveyField::Duration, "3 months");

        let outcome = client
            .submit_form(&form, Delivery::normal())
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));

        let record = client.buffered_record().unwrap();
        assert_eq!(record.value(SurveyField::Duration), "3 months");
        assert_eq!(record.value(SurveyField::CurrentPage), "page2");
        assert!(record.has_value(SurveyField::SessionId));
        assert!(record.has_value(SurveyField::Timestamp));
        assert!(record.has_value(SurveyField::LastUpdated));

        let deliveries = transport.deliveries();
        assert_eq!(deliveries.len(), 1);
        let (submission, delivery) = &deliveries[0];
        assert_eq!(submission.data_type, None);
        assert_eq!(submission.record, record);
        assert!(!delivery.survives_unload);
    }

    #[tokio::test]
    async fn timestamp_is_stamped_once_last_updated_every_time() {
        let dir = TempDir::new().unwrap();
        let client = client_with(&dir, Some(RecordingTransport::new()));

        let original = "2025-01-01T00:00:00.000Z";
        let buffer = LocalBuffer::open(dir.path().join("survey")).unwrap();
        let mut seeded = SurveyRecord::default();
        seeded.set_value(SurveyField::Timestamp, original);
        buffer.save_record(&seeded).unwrap();

        let mut form = FormState::new("page3");
        form.set_text(SurveyField::WorkTime, "Mornings");
        client
            .submit_form(&form, Delivery::normal())
            .await
            .unwrap();

        let record = client.buffered_record().unwrap();
        assert_eq!(record.value(SurveyField::Timestamp), original);
        assert_ne!(record.value(SurveyField::LastUpdated), original);
    }

    #[tokio::test]
    async fn transport_failure_exports_and_keeps_the_buffer() {
        let dir = TempDir::new().unwrap();
        let transport = RecordingTransport::new();
        transport.fail_next();
        let client = client_with(&dir, Some(transport.clone()));

        let mut form = FormState::new("page4");
        form.set_text(SurveyField::HouseholdMembers, "3");

        let outcome = client
            .submit_form(&form, Delivery::normal())
            .await
            .unwrap();
        match outcome {
            SubmitOutcome::ExportedLocally { receipt, reason } => {
                assert_eq!(receipt.rows, 1);
                assert!(receipt.path.exists());
                assert!(reason.contains("connection refused"));
            }
            other => panic!("expected local export, got {other:?}"),
        }

        // Buffer write happened before the failed send.
        let record = client.buffered_record().unwrap();
        assert_eq!(record.value(SurveyField::HouseholdMembers), "3");
        assert_eq!(transport.delivery_count(), 0);
    }

    #[tokio::test]
    async fn disabled_endpoint_degrades_to_export_only() {
        let dir = TempDir::new().unwrap();
        let client = client_with(&dir, None);

        let mut form = FormState::new("page2");
        form.set_text(SurveyField::Duration, "6 months");

        let outcome = client
            .submit_form(&form, Delivery::normal())
            .await
            .unwrap();
        match outcome {
            SubmitOutcome::ExportedLocally { reason, .. } => {
                assert_eq!(reason, "endpoint not configured");
            }
            other => panic!("expected local export, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disabled_endpoint_drops_fire_and_forget_silently() {
        let dir = TempDir::new().unwrap();
        let client = client_with(&dir, None);

        let outcome = client.submit_plan("Basic").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Skipped);

        let buffer = LocalBuffer::open(dir.path().join("survey")).unwrap();
        assert_eq!(buffer.load_export().unwrap(), None);
    }

    #[tokio::test]
    async fn page7_is_refused_without_a_valid_email() {
        let dir = TempDir::new().unwrap();
        let transport = RecordingTransport::new();
        let client = client_with(&dir, Some(transport.clone()));

        let mut form = FormState::new("page7");
        form.set_text(SurveyField::Email, "not-an-email");

        let err = client.submit_page7(&form).await.unwrap_err();
        assert!(matches!(err, SubmitError::InvalidEmail(_)));
        assert_eq!(transport.delivery_count(), 0);
    }

    #[tokio::test]
    async fn page7_sends_only_the_contact_fields() {
        let dir = TempDir::new().unwrap();
        let transport = RecordingTransport::new();
        let client = client_with(&dir, Some(transport.clone()));

        let mut form = FormState::new("page7");
        form.set_text(SurveyField::Email, "taylor@gmail.com");
        form.set_text(SurveyField::ZipCode, "94110");
        form.set_text(SurveyField::Services, "should not leak");

        let outcome = client.submit_page7(&form).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered { .. }));

        let (submission, _) = &transport.deliveries()[0];
        assert_eq!(submission.data_type, Some(DataType::Page7));
        assert_eq!(
            submission.record.value(SurveyField::Email),
            "taylor@gmail.com"
        );
        assert_eq!(submission.record.value(SurveyField::ZipCode), "94110");
        assert!(!submission.record.has_value(SurveyField::Services));
    }

    #[tokio::test]
    async fn page1_sends_the_service_preference_shape() {
        let dir = TempDir::new().unwrap();
        let transport = RecordingTransport::new();
        let client = client_with(&dir, Some(transport.clone()));

        let mut form = FormState::new("page1");
        form.set_list(
            SurveyField::Services,
            vec!["Cooking".to_string(), "Errands".to_string()],
        );
        form.set_text(SurveyField::HoursPerWeek, "10-20");
        form.set_text(SurveyField::Email, "early@gmail.com");

        client.submit_page1(&form).await.unwrap();

        let (submission, _) = &transport.deliveries()[0];
        assert_eq!(submission.data_type, Some(DataType::Page1));
        assert_eq!(
            submission.record.value(SurveyField::Services),
            "Cooking, Errands"
        );
        assert_eq!(submission.record.value(SurveyField::HoursPerWeek), "10-20");
        assert!(!submission.record.has_value(SurveyField::Email));
    }

    #[tokio::test]
    async fn plan_names_are_normalized_and_sent_fire_and_forget() {
        let dir = TempDir::new().unwrap();
        let transport = RecordingTransport::new();
        let client = client_with(&dir, Some(transport.clone()));

        let outcome = client.submit_plan("Basic").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::HandedOff);

        let (submission, delivery) = &transport.deliveries()[0];
        assert_eq!(submission.data_type, Some(DataType::Plan));
        assert_eq!(
            submission.record.value(SurveyField::SelectedPlan),
            "Basic Plan"
        );
        assert!(delivery.survives_unload);

        client.submit_plan("Family Care").await.unwrap();
        let (submission, _) = &transport.deliveries()[1];
        assert_eq!(
            submission.record.value(SurveyField::SelectedPlan),
            "Family Care"
        );
    }
}
