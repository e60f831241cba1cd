//! Media downloader: size gate, collision-free naming and atomic placement.
//!
//! The final name is claimed up front by an empty placeholder created with
//! `create_new`, so concurrent downloads can never pick the same name. Bytes
//! go to a `.part` sibling that replaces the placeholder once complete; on
//! failure both are removed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use archiver_core::{ArchiveError, Media, MessagingClient};
use tokio::fs;
use tracing::{debug, warn};

use crate::size::format_file_size;

const PART_SUFFIX: &str = ".part";

/// Result of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved { path: PathBuf, size: u64 },
    Failed { reason: String },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Saved { .. })
    }

    /// Name of the saved file, if any.
    pub fn file_name(&self) -> Option<String> {
        match self {
            DownloadOutcome::Saved { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            DownloadOutcome::Failed { .. } => None,
        }
    }

    /// Human-readable summary, suitable for chat replies and metadata errors.
    pub fn message(&self) -> String {
        match self {
            DownloadOutcome::Saved { size, .. } => format!(
                "Downloaded {} ({})",
                self.file_name().unwrap_or_default(),
                format_file_size(*size)
            ),
            DownloadOutcome::Failed { reason } => reason.clone(),
        }
    }
}

/// Downloads media through a [`MessagingClient`].
#[derive(Clone)]
pub struct MediaDownloader {
    client: Arc<dyn MessagingClient>,
}

impl MediaDownloader {
    pub fn new(client: Arc<dyn MessagingClient>) -> Self {
        Self { client }
    }

    /// Download `media` to `destination`, or to the first free `stem_N.ext`
    /// sibling if it is taken. Never returns an error; failures are outcomes.
    pub async fn download(&self, media: &Media, destination: &Path, max_size: u64) -> DownloadOutcome {
        match self.try_download(media, destination, max_size).await {
            Ok(outcome) => outcome,
            Err(e) => DownloadOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    async fn try_download(
        &self,
        media: &Media,
        destination: &Path,
        max_size: u64,
    ) -> Result<DownloadOutcome, ArchiveError> {
        let size = media.size();
        if size > max_size {
            return Err(ArchiveError::SizeLimitExceeded {
                size: format_file_size(size),
                limit: format_file_size(max_size),
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ArchiveError::TransferFailed(e.to_string()))?;
        }

        let (final_path, part_path) = reserve_destination(destination)
            .await
            .map_err(|e| ArchiveError::TransferFailed(e.to_string()))?;

        debug!(
            client = self.client.name(),
            size = %format_file_size(size),
            file = %final_path.display(),
            "Downloading media"
        );

        if let Err(e) = self.client.download(media, &part_path).await {
            discard(&part_path).await;
            discard(&final_path).await;
            return Err(ArchiveError::TransferFailed(format!("{e:#}")));
        }

        // The placeholder at `final_path` is ours, so replacing it is safe.
        if let Err(e) = fs::rename(&part_path, &final_path).await {
            discard(&part_path).await;
            discard(&final_path).await;
            return Err(ArchiveError::TransferFailed(e.to_string()));
        }

        // Prefer the real size: photo and voice metadata are often estimates.
        let size = match fs::metadata(&final_path).await {
            Ok(meta) => meta.len(),
            Err(_) => size,
        };

        Ok(DownloadOutcome::Saved {
            path: final_path,
            size,
        })
    }
}

/// Claim the first free candidate by exclusively creating both the final
/// file (as an empty placeholder) and its `.part` sibling. Returns
/// `(final, part)`.
async fn reserve_destination(destination: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
    let mut counter = 0u32;
    loop {
        let candidate = numbered_path(destination, counter);
        counter += 1;

        if !create_exclusive(&candidate).await? {
            continue;
        }

        let part = part_path(&candidate);
        match create_exclusive(&part).await {
            Ok(true) => return Ok((candidate, part)),
            Ok(false) => discard(&candidate).await,
            Err(e) => {
                discard(&candidate).await;
                return Err(e);
            }
        }
    }
}

/// `Ok(false)` when `path` already exists.
async fn create_exclusive(path: &Path) -> std::io::Result<bool> {
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

/// `dir/stem.ext` for 0, `dir/stem_N.ext` otherwise.
pub fn numbered_path(path: &Path, n: u32) -> PathBuf {
    if n == 0 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{n}"),
    };
    path.with_file_name(name)
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(file = %path.display(), error = %e, "Failed to remove partial download");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeClient {
        payload: Vec<u8>,
        fail: bool,
        calls: AtomicUsize,
        /// Final paths that were already claimed when the transfer started.
        claimed: std::sync::Mutex<Vec<bool>>,
    }

    impl FakeClient {
        fn serving(payload: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                payload: payload.to_vec(),
                fail: false,
                calls: AtomicUsize::new(0),
                claimed: Default::default(),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                payload: b"partial".to_vec(),
                fail: true,
                calls: AtomicUsize::new(0),
                claimed: Default::default(),
            })
        }
    }

    #[async_trait]
    impl MessagingClient for FakeClient {
        fn name(&self) -> &str {
            "fake"
        }

        async fn send_message(&self, _chat_id: i64, _text: &str, _reply_to: Option<i32>) -> anyhow::Result<()> {
            Ok(())
        }

        async fn download(&self, _media: &Media, destination: &Path) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let final_path = destination.with_extension("");
            self.claimed.lock().unwrap().push(final_path.exists());
            tokio::task::yield_now().await;
            tokio::fs::write(destination, &self.payload).await?;
            if self.fail {
                anyhow::bail!("connection reset by peer");
            }
            Ok(())
        }
    }

    fn photo(size: u64) -> Media {
        Media::Photo {
            file_id: "photo".into(),
            sizes: vec![size],
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn saves_to_requested_path() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::serving(b"jpegdata");
        let downloader = MediaDownloader::new(client.clone());

        let dest = dir.path().join("trip.jpg");
        let outcome = downloader.download(&photo(8), &dest, 1024).await;

        assert_eq!(outcome, DownloadOutcome::Saved { path: dest.clone(), size: 8 });
        assert_eq!(outcome.message(), "Downloaded trip.jpg (8 B)");
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpegdata");
        assert_eq!(entries(dir.path()), vec!["trip.jpg"]);
    }

    #[tokio::test]
    async fn never_overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("trip.jpg"), b"old").unwrap();
        std::fs::write(dir.path().join("trip_1.jpg"), b"older").unwrap();
        let downloader = MediaDownloader::new(FakeClient::serving(b"new"));

        let outcome = downloader.download(&photo(3), &dir.path().join("trip.jpg"), 1024).await;

        assert_eq!(outcome.file_name().as_deref(), Some("trip_2.jpg"));
        assert_eq!(std::fs::read(dir.path().join("trip.jpg")).unwrap(), b"old");
        assert_eq!(std::fs::read(dir.path().join("trip_1.jpg")).unwrap(), b"older");
        assert_eq!(std::fs::read(dir.path().join("trip_2.jpg")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn oversized_media_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::serving(b"x");
        let downloader = MediaDownloader::new(client.clone());

        let outcome = downloader
            .download(&photo(3 * 1024 * 1024), &dir.path().join("big.jpg"), 1024 * 1024)
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "File size (3.0 MB) exceeds limit (1.0 MB)");
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn failed_transfer_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = MediaDownloader::new(FakeClient::failing());

        let outcome = downloader.download(&photo(7), &dir.path().join("clip.mp4"), 1024).await;

        assert!(!outcome.is_success());
        assert!(outcome.message().starts_with("Download failed:"));
        assert!(outcome.message().contains("connection reset by peer"));
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = MediaDownloader::new(FakeClient::serving(b"abc"));
        let dest = dir.path().join("nested").join("deeper").join("a.bin");

        let outcome = downloader.download(&photo(3), &dest, 1024).await;

        assert!(outcome.is_success());
        assert!(dest.exists());
    }

    #[test]
    fn numbered_paths() {
        let base = Path::new("/data/trip.jpg");
        assert_eq!(numbered_path(base, 0), PathBuf::from("/data/trip.jpg"));
        assert_eq!(numbered_path(base, 3), PathBuf::from("/data/trip_3.jpg"));
        assert_eq!(numbered_path(Path::new("/data/noext"), 1), PathBuf::from("/data/noext_1"));
    }

    #[tokio::test]
    async fn final_name_is_claimed_during_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let client = FakeClient::serving(b"data");
        let downloader = MediaDownloader::new(client.clone());

        downloader.download(&photo(4), &dir.path().join("trip.jpg"), 1024).await;

        assert_eq!(*client.claimed.lock().unwrap(), vec![true]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_downloads_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = MediaDownloader::new(FakeClient::serving(b"same"));
        let dest = dir.path().join("trip.jpg");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let downloader = downloader.clone();
                let dest = dest.clone();
                tokio::spawn(async move { downloader.download(&photo(4), &dest, 1024).await })
            })
            .collect();
        let mut names = Vec::new();
        for handle in handles {
            names.push(handle.await.unwrap().file_name().unwrap());
        }
        names.sort();
        names.dedup();

        assert_eq!(names.len(), 8);
        assert_eq!(entries(dir.path()).len(), 8);
    }

    #[tokio::test]
    async fn stale_part_file_is_skipped_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("trip.jpg.part"), b"stale").unwrap();
        let downloader = MediaDownloader::new(FakeClient::serving(b"new"));

        let outcome = downloader.download(&photo(3), &dir.path().join("trip.jpg"), 1024).await;

        assert_eq!(outcome.file_name().as_deref(), Some("trip_1.jpg"));
        assert_eq!(entries(dir.path()), vec!["trip.jpg.part", "trip_1.jpg"]);
    }
}
