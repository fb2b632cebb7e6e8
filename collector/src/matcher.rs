//! Row matching for the upsert.

use survey_protocol::SurveyField;
use survey_protocol::SurveyRecord;

use crate::store::StoredRow;

/// The soft identifier a submission is keyed on. Nothing enforces
/// uniqueness; duplicates resolve to the first row in storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Email(String),
    Session(String),
}

/// Email wins over session id. A record carrying neither cannot match
/// anything and always creates a new row.
pub fn identify(record: &SurveyRecord) -> Option<Identifier> {
    let email = record.value(SurveyField::Email).trim();
    if !email.is_empty() {
        return Some(Identifier::Email(email.to_string()));
    }
    let session = record.value(SurveyField::SessionId).trim();
    if !session.is_empty() {
        return Some(Identifier::Session(session.to_string()));
    }
    None
}

/// First stored row matching the identifier. Emails compare
/// case-insensitively; session ids compare exactly.
pub fn find_match<'a>(rows: &'a [StoredRow], identifier: &Identifier) -> Option<&'a StoredRow> {
    match identifier {
        Identifier::Email(email) => rows.iter().find(|row| {
            row.record
                .value(SurveyField::Email)
                .trim()
                .eq_ignore_ascii_case(email)
        }),
        Identifier::Session(session) => rows
            .iter()
            .find(|row| row.record.value(SurveyField::SessionId).trim() == session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(position: usize, session: &str, email: &str) -> StoredRow {
        let mut record = SurveyRecord::default();
        record.set_value(SurveyField::SessionId, session);
        record.set_value(SurveyField::Email, email);
        StoredRow { position, record }
    }

    #[test]
    fn email_outranks_session_id() {
        let mut record = SurveyRecord::default();
        record.set_value(SurveyField::SessionId, "session_1_a");
        record.set_value(SurveyField::Email, "a@gmail.com");

        assert_eq!(
            identify(&record),
            Some(Identifier::Email("a@gmail.com".to_string()))
        );
    }

    #[test]
    fn session_id_is_the_fallback_key() {
        let mut record = SurveyRecord::default();
        record.set_value(SurveyField::SessionId, "session_1_a");
        record.set_value(SurveyField::Email, "   ");

        assert_eq!(
            identify(&record),
            Some(Identifier::Session("session_1_a".to_string()))
        );
    }

    #[test]
    fn no_identifier_means_no_match_possible() {
        assert_eq!(identify(&SurveyRecord::default()), None);
    }

    #[test]
    fn email_matching_ignores_case_and_takes_the_first_row() {
        let rows = vec![
            stored(2, "session_1_a", "other@gmail.com"),
            stored(3, "session_2_b", "Taylor@GMAIL.com"),
            stored(4, "session_3_c", "taylor@gmail.com"),
        ];

        let identifier = Identifier::Email("taylor@gmail.com".to_string());
        let found = find_match(&rows, &identifier).unwrap();
        assert_eq!(found.position, 3);
    }

    #[test]
    fn session_matching_is_exact() {
        let rows = vec![
            stored(2, "session_1_a", ""),
            stored(3, "session_2_b", ""),
        ];

        let hit = Identifier::Session("session_2_b".to_string());
        assert_eq!(find_match(&rows, &hit).unwrap().position, 3);

        let miss = Identifier::Session("SESSION_2_B".to_string());
        assert_eq!(find_match(&rows, &miss), None);
    }
}
