//! The upsert behind one `POST`.

use survey_protocol::Submission;
use survey_protocol::SubmitAction;
use survey_protocol::SubmitResponse;

use crate::matcher;
use crate::merge;
use crate::store::SheetStore;
use crate::store::StoreError;

/// Applies submissions to the sheet.
///
/// Every failure folds into the structured error payload; a request can
/// never take the endpoint down.
pub struct CollectorService {
    store: SheetStore,
}

impl CollectorService {
    pub fn new(store: SheetStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SheetStore {
        &self.store
    }

    /// Upsert one submission and report what happened. The `dataType`
    /// discriminator changes nothing here: every shape is a partial
    /// record.
    pub fn handle(&self, submission: &Submission) -> SubmitResponse {
        match self.upsert(submission) {
            Ok((action, row)) => {
                tracing::debug!("submission {action:?} at row {row}");
                SubmitResponse::Success { action, row }
            }
            Err(err) => {
                tracing::warn!("submission processing failed: {err}");
                SubmitResponse::Error {
                    error: err.to_string(),
                }
            }
        }
    }

    fn upsert(&self, submission: &Submission) -> Result<(SubmitAction, usize), StoreError> {
        let incoming = &submission.record;
        let rows = self.store.rows()?;

        if let Some(identifier) = matcher::identify(incoming)
            && let Some(found) = matcher::find_match(&rows, &identifier)
        {
            let merged = merge::merge_into(&found.record, incoming);
            self.store.update(found.position, &merged)?;
            return Ok((SubmitAction::Updated, found.position));
        }

        let created = merge::create_row(incoming);
        let position = self.store.append(&created)?;
        Ok((SubmitAction::Created, position))
    }
}
