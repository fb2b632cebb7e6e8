//! Local CSV export for submissions the endpoint could not take.

use std::fs;
use std::path::PathBuf;

use survey_protocol::SurveyRecord;
use survey_protocol::csv;

use crate::buffer::LocalBuffer;
use crate::buffer::PersistError;

/// Where a fallback export landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    /// The dated file holding every exported row so far.
    pub path: PathBuf,
    /// Data rows in that file, header excluded.
    pub rows: usize,
}

/// Writes submissions to a local CSV when delivery fails.
///
/// Exports are cumulative. The buffer keeps every row exported so far,
/// and each export rewrites the dated file with the full set, so the
/// latest file is always a complete account of what never reached the
/// collector.
pub struct FallbackExporter {
    buffer: LocalBuffer,
    out_dir: PathBuf,
}

impl FallbackExporter {
    pub fn new(buffer: LocalBuffer, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            buffer,
            out_dir: out_dir.into(),
        }
    }

    /// Append `record` to the cumulative export and write the dated file.
    pub fn export(&self, record: &SurveyRecord) -> Result<ExportReceipt, PersistError> {
        let mut content = match self.buffer.load_export()? {
            Some(existing) => existing,
            None => {
                let mut header = csv::export_header();
                header.push('\n');
                header
            }
        };
        content.push_str(&csv::export_row(record));
        content.push('\n');
        self.buffer.save_export(&content)?;

        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(dated_file_name());
        fs::write(&path, &content)?;

        let rows = csv::parse(&content).len().saturating_sub(1);
        Ok(ExportReceipt { path, rows })
    }
}

fn dated_file_name() -> String {
    let date = chrono::Utc::now().format("%Y-%m-%d");
    format!("survey-data-{date}.csv")
}
