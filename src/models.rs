use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ===== Message Models =====

/// Kind of mailing-list message, as tagged by the upstream parser or derived
/// from the subject line (see [`crate::threading::subject::classify_subject`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Patch,
    PatchCover,
    Reply,
    Review,
    Ack,
    Other,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Patch => "patch",
            MessageKind::PatchCover => "patch_cover",
            MessageKind::Reply => "reply",
            MessageKind::Review => "review",
            MessageKind::Ack => "ack",
            MessageKind::Other => "other",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a patch within its series, e.g. `[PATCH v2 3/5] subject`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchDescriptor {
    pub version: u32,
    pub ordinal: u32,
    pub total: u32,
    #[serde(default)]
    pub series_name: String,
}

/// A parsed mailing-list message.
///
/// Records are never mutated once built. Parent/child edges and reply depth
/// are tracked separately in a [`crate::threading::LinkTable`] so that root
/// identification can rewrite edges without touching the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: String,
    pub subject: String,
    pub sender: String,
    pub date: DateTime<Utc>,
    pub message_type: MessageKind,
    pub patch: Option<PatchDescriptor>,
    /// Message-ID this message replies to, as declared by its headers
    pub parent_id: Option<String>,
}

impl MessageRecord {
    pub fn new(
        message_id: impl Into<String>,
        subject: impl Into<String>,
        sender: impl Into<String>,
        date: DateTime<Utc>,
        message_type: MessageKind,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            subject: subject.into(),
            sender: sender.into(),
            date,
            message_type,
            patch: None,
            parent_id: None,
        }
    }

    pub fn with_patch(mut self, patch: PatchDescriptor) -> Self {
        self.patch = Some(patch);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// True for the first real patch (ordinal 1) of a series.
    pub fn is_first_patch(&self) -> bool {
        self.message_type == MessageKind::Patch
            && self.patch.as_ref().is_some_and(|patch| patch.ordinal == 1)
    }
}

// ===== Chunk Models =====

/// Semantic role of a content chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkRole {
    Header,
    Summary,
    CodeCritical,
    CodeDetail,
    Discussion,
    Metadata,
}

/// A bounded fragment of one message's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChunk {
    pub chunk_id: String,
    pub message_id: String,
    pub role: ChunkRole,
    pub content: String,
    /// Higher values are more important to the summarizer (1-5)
    pub priority: u8,
    pub token_count: usize,
}
