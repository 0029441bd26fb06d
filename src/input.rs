//! Loading message records from JSON
//!
//! Accepts an array of records as produced by an upstream mail parser. The
//! `message_type` and `patch` fields may be omitted, in which case they are
//! derived from the subject line.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::InputError;
use crate::models::{MessageKind, MessageRecord, PatchDescriptor};
use crate::threading::classify_subject;

#[derive(Debug, Deserialize)]
pub struct RecordInput {
    pub message_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub message_type: Option<MessageKind>,
    #[serde(default)]
    pub patch: Option<PatchDescriptor>,
    #[serde(default, alias = "in_reply_to")]
    pub parent_id: Option<String>,
}

/// Strip angle brackets and surrounding whitespace from a Message-ID.
fn normalize_message_id(id: &str) -> Option<String> {
    let cleaned = id.trim().trim_matches(&['<', '>'][..]).trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

impl RecordInput {
    pub fn into_record(self) -> Result<MessageRecord, InputError> {
        let message_id =
            normalize_message_id(&self.message_id).ok_or_else(|| InputError::MissingMessageId {
                subject: self.subject.clone(),
            })?;

        let (message_type, patch) = match self.message_type {
            Some(kind) => (kind, self.patch),
            None => {
                let (kind, derived) = classify_subject(&self.subject);
                (kind, self.patch.or(derived))
            }
        };

        Ok(MessageRecord {
            message_id,
            subject: self.subject,
            sender: self.sender,
            date: self.date,
            message_type,
            patch,
            parent_id: self.parent_id.as_deref().and_then(normalize_message_id),
        })
    }
}

pub fn parse_records(json: &str) -> Result<Vec<MessageRecord>, InputError> {
    let inputs: Vec<RecordInput> = serde_json::from_str(json)?;
    inputs.into_iter().map(RecordInput::into_record).collect()
}

pub fn load_records(path: &Path) -> Result<Vec<MessageRecord>, InputError> {
    let json = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_records(&json)?;
    log::info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}
