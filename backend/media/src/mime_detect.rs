//! File extension inference for archived media.
//!
//! Used to name downloaded files when the sender supplied no usable file name.

use archiver_core::Media;

/// Extension used when nothing better is known.
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Longest extension taken from a sender-supplied file name.
const MAX_EXTENSION_CHARS: usize = 10;

/// Map a MIME type to a file extension (with leading dot).
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();

    let ext = match essence.as_str() {
        // Images
        "image/jpeg"         => ".jpg",
        "image/png"          => ".png",
        "image/gif"          => ".gif",
        "image/webp"         => ".webp",
        "image/svg+xml"      => ".svg",
        "image/avif"         => ".avif",
        "image/bmp"          => ".bmp",
        "image/heic"         => ".heic",
        "image/tiff"         => ".tiff",

        // Audio
        "audio/mpeg"         => ".mp3",
        "audio/ogg"          => ".ogg",
        "audio/wav" | "audio/x-wav" => ".wav",
        "audio/flac"         => ".flac",
        "audio/mp4" | "audio/x-m4a" => ".m4a",
        "audio/opus"         => ".opus",
        "audio/aac"          => ".aac",

        // Video
        "video/mp4"          => ".mp4",
        "video/webm"         => ".webm",
        "video/x-matroska"   => ".mkv",
        "video/quicktime"    => ".mov",
        "video/x-msvideo"    => ".avi",
        "video/ogg"          => ".ogv",

        // Documents
        "application/pdf"    => ".pdf",
        "application/zip"    => ".zip",
        "text/plain"         => ".txt",
        "text/markdown"      => ".md",
        "text/html"          => ".html",
        "application/json"   => ".json",
        "text/csv"           => ".csv",

        _ => return None,
    };
    Some(ext)
}

/// Extension of a sender-supplied file name, if it has a plausible one.
fn extension_from_file_name(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let plausible = !ext.is_empty()
        && ext.chars().count() <= MAX_EXTENSION_CHARS
        && ext.chars().all(|c| c.is_alphanumeric());
    plausible.then(|| format!(".{ext}"))
}

/// Extension for a media payload: explicit file name first, then MIME table,
/// then [`FALLBACK_EXTENSION`]. Photos are always JPEG.
pub fn media_extension(media: &Media) -> String {
    match media {
        Media::Photo { .. } => ".jpg".to_string(),
        Media::Document {
            mime_type,
            file_name,
            ..
        } => file_name
            .as_deref()
            .and_then(extension_from_file_name)
            .or_else(|| {
                mime_type
                    .as_deref()
                    .and_then(extension_for_mime)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(mime: Option<&str>, name: Option<&str>) -> Media {
        Media::Document {
            file_id: "f".into(),
            size: 1,
            mime_type: mime.map(str::to_string),
            file_name: name.map(str::to_string),
        }
    }

    #[test]
    fn photo_is_jpeg() {
        let photo = Media::Photo { file_id: "p".into(), sizes: vec![] };
        assert_eq!(media_extension(&photo), ".jpg");
    }

    #[test]
    fn file_name_extension_wins() {
        assert_eq!(media_extension(&document(Some("video/mp4"), Some("clip.final.MOV"))), ".MOV");
    }

    #[test]
    fn mime_table_when_no_name() {
        assert_eq!(media_extension(&document(Some("audio/mpeg"), None)), ".mp3");
        assert_eq!(media_extension(&document(Some("audio/ogg; codecs=opus"), Some("voice"))), ".ogg");
    }

    #[test]
    fn unknown_falls_back_to_bin() {
        assert_eq!(media_extension(&document(Some("application/x-weird"), None)), ".bin");
        assert_eq!(media_extension(&document(None, Some("trailing."))), ".bin");
        assert_eq!(media_extension(&document(None, Some("odd.ex/t"))), ".bin");
    }
}
