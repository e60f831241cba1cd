use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Media, Sender};

/// An inbound chat message as seen by the archiver.
///
/// Adapters convert their client library's message type into this shape once,
/// at ingestion, so nothing downstream has to probe the original payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i32,
    pub chat_id: i64,
    /// Album identifier shared by messages sent together.
    pub media_group_id: Option<String>,
    pub date: DateTime<Utc>,
    pub sender: Option<Sender>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub media: Option<Media>,
}

impl ChatMessage {
    pub fn new(id: i32, chat_id: i64, date: DateTime<Utc>) -> Self {
        Self {
            id,
            chat_id,
            media_group_id: None,
            date,
            sender: None,
            text: None,
            caption: None,
            media: None,
        }
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Text usable as a naming seed: the message text, falling back to the caption.
    /// Whitespace-only values count as empty.
    pub fn naming_text(&self) -> Option<&str> {
        [self.text.as_deref(), self.caption.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
    }

    /// Buffer key of this message: its album if it has one, otherwise itself.
    pub fn group_key(&self) -> GroupKey {
        let tag = match &self.media_group_id {
            Some(group) => GroupTag::MediaGroup(group.clone()),
            None => GroupTag::Message(self.id),
        };
        GroupKey {
            chat_id: self.chat_id,
            tag,
        }
    }
}

/// Identifies a batch of messages that are archived together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub chat_id: i64,
    pub tag: GroupTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum GroupTag {
    MediaGroup(String),
    Message(i32),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            GroupTag::MediaGroup(group) => write!(f, "{}/album-{}", self.chat_id, group),
            GroupTag::Message(id) => write!(f, "{}/msg-{}", self.chat_id, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i32) -> ChatMessage {
        ChatMessage::new(id, -100, Utc::now())
    }

    #[test]
    fn ungrouped_message_keys_on_its_own_id() {
        let key = message(555).group_key();
        assert_eq!(key.chat_id, -100);
        assert_eq!(key.tag, GroupTag::Message(555));
        assert_eq!(key.to_string(), "-100/msg-555");
    }

    #[test]
    fn album_members_share_a_key() {
        let mut a = message(1);
        let mut b = message(2);
        a.media_group_id = Some("1379".into());
        b.media_group_id = Some("1379".into());
        assert_eq!(a.group_key(), b.group_key());
    }

    #[test]
    fn naming_text_prefers_text_then_caption() {
        let mut msg = message(7);
        assert_eq!(msg.naming_text(), None);

        msg.caption = Some("holiday".into());
        assert_eq!(msg.naming_text(), Some("holiday"));

        msg.text = Some("   ".into());
        assert_eq!(msg.naming_text(), Some("holiday"));

        msg.text = Some("trip notes".into());
        assert_eq!(msg.naming_text(), Some("trip notes"));
    }
}
