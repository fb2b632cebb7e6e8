//! Locally persisted submission state.
//!
//! Everything the client must not lose on exit lives in one directory:
//!
//! ```text
//! <survey home>/
//!   record.json   accumulated answers for the current session
//!   session       stable session identifier
//!   export.csv    cumulative fallback export buffer
//! ```
//!
//! Writes go through a temp-file-and-rename so a crash mid-write never
//! leaves a truncated file behind.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use survey_protocol::SurveyRecord;

const RECORD_FILE: &str = "record.json";
const SESSION_FILE: &str = "session";
const EXPORT_FILE: &str = "export.csv";

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Errors from reading or writing buffered state.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// On-disk buffer backing a single survey session.
#[derive(Debug, Clone)]
pub struct LocalBuffer {
    dir: PathBuf,
}

impl LocalBuffer {
    /// Open the buffer rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ─────────────────────────────────────────────────────────────────
    // Record
    // ─────────────────────────────────────────────────────────────────

    /// Load the accumulated record. An absent file is an empty record,
    /// not an error.
    pub fn load_record(&self) -> Result<SurveyRecord, PersistError> {
        let path = self.dir.join(RECORD_FILE);
        if !path.exists() {
            return Ok(SurveyRecord::default());
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Persist the record, replacing whatever was there.
    pub fn save_record(&self, record: &SurveyRecord) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(record)?;
        self.atomic_write(&self.dir.join(RECORD_FILE), json.as_bytes())
    }

    // ─────────────────────────────────────────────────────────────────
    // Session identity
    // ─────────────────────────────────────────────────────────────────

    /// The session identifier, minting and persisting one on first use.
    /// Subsequent calls (and subsequent processes) see the same id.
    pub fn session_id(&self) -> Result<String, PersistError> {
        let path = self.dir.join(SESSION_FILE);
        if path.exists() {
            let stored = fs::read_to_string(&path)?;
            let stored = stored.trim();
            if !stored.is_empty() {
                return Ok(stored.to_string());
            }
        }
        let id = generate_session_id();
        self.atomic_write(&path, id.as_bytes())?;
        Ok(id)
    }

    // ─────────────────────────────────────────────────────────────────
    // Export buffer
    // ─────────────────────────────────────────────────────────────────

    /// Cumulative export text, or `None` before the first fallback export.
    pub fn load_export(&self) -> Result<Option<String>, PersistError> {
        let path = self.dir.join(EXPORT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    /// Replace the cumulative export text.
    pub fn save_export(&self, text: &str) -> Result<(), PersistError> {
        self.atomic_write(&self.dir.join(EXPORT_FILE), text.as_bytes())
    }

    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<(), PersistError> {
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// `session_<unix millis>_<9 base36 chars>`: unique enough to key a
/// sheet row on, with no stronger guarantee intended.
fn generate_session_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut bits: u64 = rand::random();
    let mut suffix = String::with_capacity(SESSION_SUFFIX_LEN);
    for _ in 0..SESSION_SUFFIX_LEN {
        let idx = (bits % 36) as usize;
        suffix.push(BASE36[idx] as char);
        bits /= 36;
    }
    format!("session_{millis}_{suffix}")
}
