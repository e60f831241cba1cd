//! Batch processor: archives one debounced group of messages.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use archiver_core::{ChatMessage, GroupKey, MessagingClient, MetadataRecord};
use archiver_logging::{ArchiveEvent, EventLogger};
use archiver_media::{
    format_file_size, media_extension, sanitize_filename, DownloadOutcome, MediaDownloader,
};
use archiver_scheduler::BatchHandler;

use crate::store::MetadataStore;

/// Tally of one processed batch. `outcomes[i]` belongs to the i-th media
/// message of the batch, in arrival order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(i32, DownloadOutcome)>,
}

impl BatchReport {
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.saved()
    }
}

pub struct BatchProcessor {
    client: Arc<dyn MessagingClient>,
    downloader: MediaDownloader,
    store: Arc<MetadataStore>,
    save_dir: PathBuf,
    max_file_size: u64,
}

impl BatchProcessor {
    pub fn new(
        client: Arc<dyn MessagingClient>,
        store: Arc<MetadataStore>,
        save_dir: impl Into<PathBuf>,
        max_file_size: u64,
    ) -> Self {
        Self {
            downloader: MediaDownloader::new(client.clone()),
            client,
            store,
            save_dir: save_dir.into(),
            max_file_size,
        }
    }

    /// Archive every media message of `batch`. Messages without media are ignored.
    pub async fn process(&self, key: &GroupKey, batch: Vec<ChatMessage>) -> BatchReport {
        let total = batch.len();
        let seed = batch.iter().find_map(ChatMessage::naming_text).map(str::to_string);
        let media_messages: Vec<ChatMessage> = batch.into_iter().filter(ChatMessage::has_media).collect();
        let Some(first) = media_messages.first() else {
            return BatchReport::default();
        };
        let (chat_id, reply_to) = (first.chat_id, first.id);

        info!(group = %key, items = media_messages.len(), "Archiving batch");
        EventLogger::log_event(
            chat_id,
            ArchiveEvent::BatchReceived {
                group: key.to_string(),
                messages: total,
                media_items: media_messages.len(),
            },
        );

        self.notify(chat_id, &progress_text(media_messages.len()), reply_to).await;

        let destinations = plan_destinations(&self.save_dir, seed.as_deref(), &media_messages);
        let outcomes = self.download_all(&media_messages, destinations).await;

        for (message, outcome) in media_messages.iter().zip(&outcomes) {
            self.record(message, outcome).await;
        }

        let report = BatchReport {
            outcomes: media_messages.iter().map(|m| m.id).zip(outcomes).collect(),
        };
        EventLogger::log_event(
            chat_id,
            ArchiveEvent::BatchCompleted {
                group: key.to_string(),
                saved: report.saved(),
                failed: report.failed(),
            },
        );

        self.notify(chat_id, &completion_text(&report), reply_to).await;
        report
    }

    /// Run all downloads concurrently, each in its own task so a panic in one
    /// transfer is reported as that item's failure.
    async fn download_all(&self, messages: &[ChatMessage], destinations: Vec<PathBuf>) -> Vec<DownloadOutcome> {
        let handles = messages.iter().zip(destinations).map(|(message, destination)| {
            let downloader = self.downloader.clone();
            let media = message.media.clone();
            let max_size = self.max_file_size;
            tokio::spawn(async move {
                match media {
                    Some(media) => downloader.download(&media, &destination, max_size).await,
                    None => DownloadOutcome::Failed {
                        reason: "No media in message".into(),
                    },
                }
            })
        });

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| DownloadOutcome::Failed {
                    reason: format!("Download failed: {e}"),
                })
            })
            .collect()
    }

    async fn record(&self, message: &ChatMessage, outcome: &DownloadOutcome) {
        let (saved_files, errors) = match outcome {
            DownloadOutcome::Saved { size, .. } => {
                let name = outcome.file_name().unwrap_or_default();
                info!(message_id = message.id, "✓ {}", outcome.message());
                EventLogger::log_event(
                    message.chat_id,
                    ArchiveEvent::ItemSaved {
                        message_id: message.id,
                        file: name.clone(),
                        size: format_file_size(*size),
                    },
                );
                (vec![name], Vec::new())
            }
            DownloadOutcome::Failed { reason } => {
                warn!(message_id = message.id, "✗ {reason}");
                EventLogger::log_event(
                    message.chat_id,
                    ArchiveEvent::ItemFailed {
                        message_id: message.id,
                        reason: reason.clone(),
                    },
                );
                (Vec::new(), vec![reason.clone()])
            }
        };

        let record = MetadataRecord::for_message(message, saved_files, errors);
        self.store.append(message.date.date_naive(), &record).await;
    }

    async fn notify(&self, chat_id: i64, text: &str, reply_to: i32) {
        if let Err(e) = self.client.send_message(chat_id, text, Some(reply_to)).await {
            warn!(chat_id, error = %format!("{e:#}"), "Failed to send notification");
        }
    }
}

#[async_trait]
impl BatchHandler for BatchProcessor {
    async fn handle_batch(&self, key: GroupKey, batch: Vec<ChatMessage>) -> Result<()> {
        self.process(&key, batch).await;
        Ok(())
    }
}

/// Destination of every media message. With a seed, all items share its
/// sanitized form, numbered `_1.._N` when there is more than one; without
/// one, each item is named `msg_<id>`.
pub fn plan_destinations(save_dir: &Path, seed: Option<&str>, media_messages: &[ChatMessage]) -> Vec<PathBuf> {
    let base = seed
        .map(|text| sanitize_filename(text, ""))
        .filter(|name| !name.is_empty());
    let numbered = media_messages.len() > 1;

    media_messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            let stem = match &base {
                Some(base) if numbered => format!("{base}_{}", i + 1),
                Some(base) => base.clone(),
                None => format!("msg_{}", message.id),
            };
            let extension = message
                .media
                .as_ref()
                .map(media_extension)
                .unwrap_or_default();
            save_dir.join(format!("{stem}{extension}"))
        })
        .collect()
}

fn progress_text(items: usize) -> String {
    if items == 1 {
        "📥 Message received, archiving...".to_string()
    } else {
        format!("📥 Received {items} files, archiving...")
    }
}

fn completion_text(report: &BatchReport) -> String {
    let total = report.outcomes.len();
    if let [(_, outcome)] = report.outcomes.as_slice() {
        let mark = if outcome.is_success() { "✅" } else { "❌" };
        return format!("{mark} {}", outcome.message());
    }
    match (report.saved(), report.failed()) {
        (saved, 0) => format!("✅ Archived {saved}/{total} files"),
        (0, _) => format!("❌ Failed to archive {total} files"),
        (saved, failed) => format!("⚠️ Archived {saved}/{total} files, {failed} failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archiver_core::Media;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeClient {
        sent: Mutex<Vec<(i64, String, Option<i32>)>>,
        failing_files: Vec<String>,
        offline: bool,
    }

    #[async_trait]
    impl MessagingClient for FakeClient {
        fn name(&self) -> &str {
            "fake"
        }

        async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()> {
            if self.offline {
                anyhow::bail!("network unreachable");
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string(), reply_to));
            Ok(())
        }

        async fn download(&self, media: &Media, destination: &Path) -> Result<()> {
            if self.failing_files.iter().any(|f| f == media.file_id()) {
                anyhow::bail!("file is temporarily unavailable");
            }
            tokio::fs::write(destination, media.file_id()).await?;
            Ok(())
        }
    }

    fn photo_message(id: i32, caption: Option<&str>) -> ChatMessage {
        let mut msg = ChatMessage::new(id, -500, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
        msg.media_group_id = Some("album".into());
        msg.caption = caption.map(str::to_string);
        msg.media = Some(Media::Photo {
            file_id: format!("file-{id}"),
            sizes: vec![100],
        });
        msg
    }

    struct Harness {
        _dir: tempfile::TempDir,
        save_dir: PathBuf,
        client: Arc<FakeClient>,
        store: Arc<MetadataStore>,
        processor: BatchProcessor,
    }

    fn harness(client: FakeClient) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let save_dir = dir.path().to_path_buf();
        let client = Arc::new(client);
        let store = Arc::new(MetadataStore::new(save_dir.join(".cache")));
        let processor = BatchProcessor::new(client.clone(), store.clone(), &save_dir, 1024);
        Harness {
            _dir: dir,
            save_dir,
            client,
            store,
            processor,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn seeded_names_are_numbered_and_distinct() {
        let batch = vec![photo_message(1, Some("Beach day")), photo_message(2, None), photo_message(3, None)];
        let paths = plan_destinations(Path::new("/a"), Some("Beach day"), &batch);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/a/Beach_day_1.jpg"),
                PathBuf::from("/a/Beach_day_2.jpg"),
                PathBuf::from("/a/Beach_day_3.jpg"),
            ]
        );
    }

    #[test]
    fn single_item_without_text_uses_message_id() {
        let batch = vec![photo_message(555, None)];
        let paths = plan_destinations(Path::new("/a"), None, &batch);
        assert_eq!(paths, vec![PathBuf::from("/a/msg_555.jpg")]);
    }

    #[test]
    fn unusable_seed_falls_back_per_message() {
        let batch = vec![photo_message(1, None), photo_message(2, None)];
        let paths = plan_destinations(Path::new("/a"), Some("???"), &batch);
        assert_eq!(paths, vec![PathBuf::from("/a/msg_1.jpg"), PathBuf::from("/a/msg_2.jpg")]);
    }

    #[tokio::test]
    async fn album_is_archived_with_shared_name() {
        let h = harness(FakeClient::default());
        let batch = vec![photo_message(1, None), photo_message(2, Some("Горы 2024")), photo_message(3, None)];
        let key = batch[0].group_key();

        let report = h.processor.process(&key, batch).await;

        assert_eq!(report.saved(), 3);
        for i in 1..=3 {
            assert!(h.save_dir.join(format!("Горы_2024_{i}.jpg")).exists());
        }

        let records = h.store.load(day()).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message_id, 1);
        assert_eq!(records[0].saved_files, vec!["Горы_2024_1.jpg"]);
        assert_eq!(records[2].saved_files, vec!["Горы_2024_3.jpg"]);
        assert!(records.iter().all(|r| r.errors.is_empty()));

        let sent = h.client.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], (-500, "📥 Received 3 files, archiving...".to_string(), Some(1)));
        assert_eq!(sent[1].1, "✅ Archived 3/3 files");
    }

    #[tokio::test]
    async fn one_failure_does_not_disturb_siblings() {
        let h = harness(FakeClient {
            failing_files: vec!["file-2".into()],
            ..Default::default()
        });
        let batch = vec![photo_message(1, Some("set")), photo_message(2, None), photo_message(3, None)];
        let key = batch[0].group_key();

        let report = h.processor.process(&key, batch).await;

        let ids: Vec<i32> = report.outcomes.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(report.outcomes[0].1.is_success());
        assert!(!report.outcomes[1].1.is_success());
        assert!(report.outcomes[2].1.is_success());
        assert!(!h.save_dir.join("set_2.jpg").exists());

        let records = h.store.load(day()).await.unwrap();
        assert_eq!(records[1].message_id, 2);
        assert!(records[1].saved_files.is_empty());
        assert_eq!(records[1].errors.len(), 1);
        assert!(records[1].errors[0].contains("temporarily unavailable"));
        assert_eq!(records[2].saved_files, vec!["set_3.jpg"]);

        let sent = h.client.sent.lock().unwrap();
        assert_eq!(sent.last().unwrap().1, "⚠️ Archived 2/3 files, 1 failed");
    }

    #[tokio::test]
    async fn messages_without_media_are_skipped() {
        let h = harness(FakeClient::default());
        let mut text_only = ChatMessage::new(8, -500, Utc::now());
        text_only.text = Some("just words".into());
        let key = text_only.group_key();

        let report = h.processor.process(&key, vec![text_only]).await;

        assert!(report.outcomes.is_empty());
        assert!(h.client.sent.lock().unwrap().is_empty());
        assert!(!h.save_dir.join(".cache").exists());
    }

    #[tokio::test]
    async fn text_only_member_still_seeds_names() {
        let h = harness(FakeClient::default());
        let mut note = ChatMessage::new(10, -500, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
        note.text = Some("receipts".into());
        let batch = vec![note, photo_message(11, None)];
        let key = batch[1].group_key();

        let report = h.processor.process(&key, batch).await;

        assert_eq!(report.outcomes.len(), 1);
        assert!(h.save_dir.join("receipts.jpg").exists());
        let sent = h.client.sent.lock().unwrap();
        assert_eq!(sent.last().unwrap().1, "✅ Downloaded receipts.jpg (7 B)");
    }

    #[tokio::test]
    async fn oversized_item_is_recorded_as_error() {
        let h = harness(FakeClient::default());
        let mut big = photo_message(20, None);
        big.media = Some(Media::Document {
            file_id: "big".into(),
            size: 4096,
            mime_type: Some("video/mp4".into()),
            file_name: None,
        });
        let key = big.group_key();

        let report = h.processor.process(&key, vec![big]).await;

        assert_eq!(report.failed(), 1);
        assert!(!h.save_dir.join("msg_20.mp4").exists());
        let records = h.store.load(day()).await.unwrap();
        assert_eq!(records[0].errors, vec!["File size (4.0 KB) exceeds limit (1.0 KB)"]);
        assert_eq!(records[0].media_types, vec![archiver_core::MediaKind::Video]);
    }

    #[tokio::test]
    async fn notification_failures_do_not_stop_archiving() {
        let h = harness(FakeClient {
            offline: true,
            ..Default::default()
        });
        let msg = photo_message(30, Some("offline"));
        let key = msg.group_key();

        let report = h.processor.process(&key, vec![msg]).await;

        assert_eq!(report.saved(), 1);
        assert!(h.save_dir.join("offline.jpg").exists());
        assert_eq!(h.store.load(day()).await.unwrap().len(), 1);
    }
}
