use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use archiver_core::{ArchiveError, MetadataRecord};

/// Per-day JSON metadata store: `<cache_dir>/YYYY-MM-DD.json`, each file a
/// JSON array that only ever grows.
///
/// Appends from this process are serialized; separate processes writing the
/// same directory are not coordinated.
pub struct MetadataStore {
    cache_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the metadata file for `date`.
    pub fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.cache_dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Append `record` to the day file. Failures are logged, never returned.
    pub async fn append(&self, date: NaiveDate, record: &MetadataRecord) {
        if let Err(e) = self.try_append(date, record).await {
            error!(
                file = %self.day_file(date).display(),
                message_id = record.message_id,
                error = %e,
                "Failed to save metadata"
            );
        }
    }

    async fn try_append(&self, date: NaiveDate, record: &MetadataRecord) -> Result<(), ArchiveError> {
        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.cache_dir).await?;
        let path = self.day_file(date);

        let mut entries = read_entries(&path).await;
        entries.push(serde_json::to_value(record)?);

        // Write to a temp file, then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&entries)?).await?;
        fs::rename(&tmp, &path).await?;

        debug!(file = %path.display(), records = entries.len(), "Metadata appended");
        Ok(())
    }

    /// Read back every record stored for `date`. A missing file is empty.
    pub async fn load(&self, date: NaiveDate) -> Result<Vec<MetadataRecord>, ArchiveError> {
        let path = self.day_file(date);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let value: Value = serde_json::from_str(&raw)?;
        if !value.is_array() {
            return Err(ArchiveError::Metadata(format!(
                "{} does not contain a JSON array",
                path.display()
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Existing entries of a day file. Missing, unreadable or corrupt files are
/// treated as empty; unknown fields of existing entries are kept as is.
async fn read_entries(path: &Path) -> Vec<Value> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Failed to read metadata file");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            warn!(file = %path.display(), "Metadata file is not a JSON array; starting over");
            Vec::new()
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Failed to read metadata file");
            Vec::new()
        }
    }
}
