use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// Media attached to a message, decided once when the message is ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Media {
    /// A compressed photo. `file_id` points at the largest rendition,
    /// `sizes` lists the byte size of every rendition the server offered.
    Photo { file_id: String, sizes: Vec<u64> },
    /// Any file-like attachment (documents, videos, audio, voice notes, animations).
    Document {
        file_id: String,
        size: u64,
        mime_type: Option<String>,
        file_name: Option<String>,
    },
}

impl Media {
    pub fn file_id(&self) -> &str {
        match self {
            Media::Photo { file_id, .. } | Media::Document { file_id, .. } => file_id,
        }
    }

    /// Best size estimate in bytes; photos report their largest rendition.
    pub fn size(&self) -> u64 {
        match self {
            Media::Photo { sizes, .. } => sizes.iter().copied().max().unwrap_or(0),
            Media::Document { size, .. } => *size,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Media::Photo { .. } => MediaKind::Photo,
            Media::Document { mime_type, .. } => {
                let mime = mime_type.as_deref().unwrap_or("");
                if mime.starts_with("video/") {
                    MediaKind::Video
                } else if mime.starts_with("audio/") {
                    MediaKind::Audio
                } else if mime.starts_with("image/") {
                    MediaKind::Image
                } else {
                    MediaKind::Document
                }
            }
        }
    }
}

/// Tag recorded in `media_types` of a metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    Image,
    Document,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
            MediaKind::Document => "document",
        };
        f.write_str(tag)
    }
}

/// Author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Sender block of a metadata record. Every field is null for anonymous or
/// channel posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderInfo {
    pub id: Option<u64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<Option<&Sender>> for SenderInfo {
    fn from(sender: Option<&Sender>) -> Self {
        match sender {
            Some(s) => Self {
                id: Some(s.id),
                username: s.username.clone(),
                first_name: s.first_name.clone(),
                last_name: s.last_name.clone(),
            },
            None => Self::default(),
        }
    }
}

/// One archived message, as stored in the per-day metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub message_id: i32,
    pub chat_id: i64,
    /// RFC 3339 timestamp of the message.
    pub date: String,
    #[serde(rename = "from")]
    pub sender: SenderInfo,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub media_types: Vec<MediaKind>,
    pub saved_files: Vec<String>,
    pub errors: Vec<String>,
}

impl MetadataRecord {
    pub fn for_message(message: &ChatMessage, saved_files: Vec<String>, errors: Vec<String>) -> Self {
        Self {
            message_id: message.id,
            chat_id: message.chat_id,
            date: message.date.to_rfc3339(),
            sender: SenderInfo::from(message.sender.as_ref()),
            text: message.text.clone(),
            caption: message.caption.clone(),
            media_types: message.media.iter().map(Media::kind).collect(),
            saved_files,
            errors,
        }
    }
}
