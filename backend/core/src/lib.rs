pub mod error;
pub mod message;
pub mod traits;
pub mod types;

pub use error::ArchiveError;
pub use message::{ChatMessage, GroupKey, GroupTag};
pub use traits::MessagingClient;
pub use types::{Media, MediaKind, MetadataRecord, Sender, SenderInfo};
