//! CSV-file-backed sheet.
//!
//! One file, one header row, one row per survey record, every canonical
//! column stored. Row positions count the header the way a spreadsheet
//! does: the first data row sits at position 2.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use survey_protocol::SurveyField;
use survey_protocol::SurveyRecord;
use survey_protocol::csv;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no row at sheet position {position}")]
    NoSuchRow { position: usize },
}

/// A stored record together with its sheet position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub position: usize,
    pub record: SurveyRecord,
}

/// The persisted sheet.
#[derive(Debug, Clone)]
pub struct SheetStore {
    path: PathBuf,
}

impl SheetStore {
    /// Open a store at `path`, creating parent directories. The file
    /// itself appears on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored row in storage order. A missing file is an empty
    /// sheet.
    pub fn rows(&self) -> Result<Vec<StoredRow>, StoreError> {
        let records = self.load_records()?;
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(index, record)| StoredRow {
                position: index + 2,
                record,
            })
            .collect())
    }

    /// Append a record, writing the header first if the sheet is new.
    /// Returns the new row's sheet position.
    pub fn append(&self, record: &SurveyRecord) -> Result<usize, StoreError> {
        let mut records = self.load_records()?;
        records.push(record.clone());
        self.write_all(&records)?;
        Ok(records.len() + 1)
    }

    /// Replace the row at `position` wholesale.
    pub fn update(&self, position: usize, record: &SurveyRecord) -> Result<(), StoreError> {
        let mut records = self.load_records()?;
        let slot = position
            .checked_sub(2)
            .and_then(|index| records.get_mut(index))
            .ok_or(StoreError::NoSuchRow { position })?;
        *slot = record.clone();
        self.write_all(&records)
    }

    fn load_records(&self) -> Result<Vec<SurveyRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let rows = csv::parse(&text);
        // Row 0 is the header.
        Ok(rows.into_iter().skip(1).map(record_from_columns).collect())
    }

    fn write_all(&self, records: &[SurveyRecord]) -> Result<(), StoreError> {
        let mut content = csv::store_header();
        content.push('\n');
        for record in records {
            content.push_str(&csv::store_row(record));
            content.push('\n');
        }
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content.as_bytes())?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn record_from_columns(columns: Vec<String>) -> SurveyRecord {
    let mut record = SurveyRecord::default();
    for (field, column) in SurveyField::ALL.into_iter().zip(columns) {
        record.set_value(field, column);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SheetStore {
        SheetStore::open(dir.path().join("data").join("sheet.csv")).unwrap()
    }

    fn record(session: &str, email: &str) -> SurveyRecord {
        let mut record = SurveyRecord::default();
        record.set_value(SurveyField::SessionId, session);
        record.set_value(SurveyField::Email, email);
        record
    }

    #[test]
    fn a_missing_file_is_an_empty_sheet() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.rows().unwrap(), Vec::new());
    }

    #[test]
    fn first_append_lands_at_position_two() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let position = store.append(&record("session_1_a", "a@gmail.com")).unwrap();
        assert_eq!(position, 2);
        let position = store.append(&record("session_2_b", "b@gmail.com")).unwrap();
        assert_eq!(position, 3);

        let content = fs::read_to_string(store.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(csv::store_header().as_str()));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn rows_round_trip_with_positions() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut first = record("session_1_a", "a@gmail.com");
        first.set_value(SurveyField::Services, "Cooking, Cleaning");
        store.append(&first).unwrap();
        store.append(&record("session_2_b", "b@gmail.com")).unwrap();

        let rows = store.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].position, 2);
        assert_eq!(rows[0].record, first);
        assert_eq!(rows[1].position, 3);
        assert_eq!(rows[1].record.value(SurveyField::Email), "b@gmail.com");
    }

    #[test]
    fn update_replaces_one_row_in_place() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.append(&record("session_1_a", "a@gmail.com")).unwrap();
        store.append(&record("session_2_b", "b@gmail.com")).unwrap();

        let mut changed = record("session_1_a", "a@gmail.com");
        changed.set_value(SurveyField::ZipCode, "94110");
        store.update(2, &changed).unwrap();

        let rows = store.rows().unwrap();
        assert_eq!(rows[0].record.value(SurveyField::ZipCode), "94110");
        assert_eq!(rows[1].record.value(SurveyField::Email), "b@gmail.com");
    }

    #[test]
    fn update_rejects_unknown_positions() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&record("session_1_a", "a@gmail.com")).unwrap();

        let err = store.update(5, &record("x", "x@gmail.com")).unwrap_err();
        assert!(matches!(err, StoreError::NoSuchRow { position: 5 }));

        // Positions 0 and 1 are the header's territory.
        let err = store.update(1, &record("x", "x@gmail.com")).unwrap_err();
        assert!(matches!(err, StoreError::NoSuchRow { position: 1 }));
    }
}
