//! Merge-or-create for one incoming submission.

use chrono::SecondsFormat;
use chrono::Utc;
use survey_protocol::SurveyField;
use survey_protocol::SurveyRecord;

/// Fold `incoming` over `existing`. A stored value survives unless the
/// incoming one is non-empty after trimming, and a stored `timestamp`
/// is never replaced.
pub fn merge_into(existing: &SurveyRecord, incoming: &SurveyRecord) -> SurveyRecord {
    let mut merged = existing.clone();
    merged.merge_non_empty(incoming);
    merged
}

/// A brand-new row, taken whole from the submission with `timestamp`
/// defaulted to now when the client did not stamp one.
pub fn create_row(incoming: &SurveyRecord) -> SurveyRecord {
    let mut record = incoming.clone();
    if !record.has_value(SurveyField::Timestamp) {
        record.set_value(
            SurveyField::Timestamp,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_incoming_values_replace_stored_ones() {
        let mut existing = SurveyRecord::default();
        existing.set_value(SurveyField::Duration, "3 months");
        existing.set_value(SurveyField::ZipCode, "94110");

        let mut incoming = SurveyRecord::default();
        incoming.set_value(SurveyField::Duration, "6 months");
        incoming.set_value(SurveyField::ZipCode, "   ");
        incoming.set_value(SurveyField::FirstName, "Taylor");

        let merged = merge_into(&existing, &incoming);
        assert_eq!(merged.value(SurveyField::Duration), "6 months");
        assert_eq!(merged.value(SurveyField::ZipCode), "94110");
        assert_eq!(merged.value(SurveyField::FirstName), "Taylor");
    }

    #[test]
    fn stored_timestamp_outlives_any_resubmission() {
        let mut existing = SurveyRecord::default();
        existing.set_value(SurveyField::Timestamp, "2025-01-01T00:00:00.000Z");

        let mut incoming = SurveyRecord::default();
        incoming.set_value(SurveyField::Timestamp, "2025-06-01T00:00:00.000Z");

        let merged = merge_into(&existing, &incoming);
        assert_eq!(
            merged.value(SurveyField::Timestamp),
            "2025-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn created_rows_get_a_timestamp_when_missing() {
        let mut incoming = SurveyRecord::default();
        incoming.set_value(SurveyField::Email, "a@gmail.com");

        let created = create_row(&incoming);
        assert!(created.has_value(SurveyField::Timestamp));
        assert!(created.value(SurveyField::Timestamp).ends_with('Z'));
    }

    #[test]
    fn created_rows_keep_a_client_supplied_timestamp() {
        let mut incoming = SurveyRecord::default();
        incoming.set_value(SurveyField::Timestamp, "2025-01-01T00:00:00.000Z");

        let created = create_row(&incoming);
        assert_eq!(
            created.value(SurveyField::Timestamp),
            "2025-01-01T00:00:00.000Z"
        );
    }
}
