//! Telegram media extraction
//!
//! Maps the attachment of an incoming Telegram message onto [`Media`].
//! Videos, audio, voice notes and animations become documents carrying
//! their MIME type and file name hints.

use archiver_core::Media;
use teloxide::types::{FileMeta, Message};

/// Media attached to `msg`, if any archivable kind is present.
pub fn media_of(msg: &Message) -> Option<Media> {
    if let Some(sizes) = msg.photo() {
        let largest = sizes.iter().max_by_key(|p| (p.file.size, p.width * p.height))?;
        return Some(Media::Photo {
            file_id: largest.file.id.0.clone(),
            sizes: sizes.iter().map(|p| u64::from(p.file.size)).collect(),
        });
    }

    if let Some(doc) = msg.document() {
        return Some(document(
            &doc.file,
            doc.mime_type.as_ref().map(ToString::to_string),
            doc.file_name.clone(),
        ));
    }
    if let Some(video) = msg.video() {
        return Some(document(
            &video.file,
            video.mime_type.as_ref().map(ToString::to_string),
            video.file_name.clone(),
        ));
    }
    if let Some(audio) = msg.audio() {
        return Some(document(
            &audio.file,
            audio.mime_type.as_ref().map(ToString::to_string),
            audio.file_name.clone(),
        ));
    }
    if let Some(voice) = msg.voice() {
        let mime = voice
            .mime_type
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "audio/ogg".to_string());
        return Some(document(&voice.file, Some(mime), None));
    }
    if let Some(animation) = msg.animation() {
        return Some(document(
            &animation.file,
            animation.mime_type.as_ref().map(ToString::to_string),
            animation.file_name.clone(),
        ));
    }
    if let Some(note) = msg.video_note() {
        return Some(document(&note.file, Some("video/mp4".to_string()), None));
    }

    None
}

fn document(file: &FileMeta, mime_type: Option<String>, file_name: Option<String>) -> Media {
    Media::Document {
        file_id: file.id.0.clone(),
        size: u64::from(file.size),
        mime_type,
        file_name,
    }
}
