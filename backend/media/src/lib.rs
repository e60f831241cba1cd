//! Media handling for the archiver: naming, type detection and downloads.

pub mod downloader;
pub mod mime_detect;
pub mod sanitize;
pub mod size;

pub use downloader::{DownloadOutcome, MediaDownloader};
pub use mime_detect::{extension_for_mime, media_extension};
pub use sanitize::{sanitize_filename, sanitize_filename_with, MAX_FILENAME_CHARS};
pub use size::format_file_size;
