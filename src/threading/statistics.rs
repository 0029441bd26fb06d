//! Per-thread statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{MessageKind, MessageRecord};

use super::forest::ThreadNode;

/// Review state of a thread, derived from its members.
///
/// Priority is ack > under review > new: one ack anywhere in the thread
/// marks it acked even if reviews are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Acked,
    UnderReview,
    New,
}

/// Series metadata taken from a thread root that is a patch or cover letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSummary {
    pub version: u32,
    pub total_patches: u32,
    pub completion_status: CompletionStatus,
}

/// Statistics for one assembled thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadStatistics {
    pub total_messages: usize,
    pub patches: usize,
    pub cover_letters: usize,
    pub replies: usize,
    pub reviews: usize,
    pub acks: usize,
    pub others: usize,
    /// Deepest reply level below the root
    pub max_depth: u32,
    /// Distinct senders, sorted
    pub contributors: Vec<String>,
    pub first_date: DateTime<Utc>,
    pub last_date: DateTime<Utc>,
    pub completion_status: CompletionStatus,
    pub patch_series: Option<SeriesSummary>,
}

impl ThreadStatistics {
    pub fn compute(root: &MessageRecord, nodes: &BTreeMap<String, ThreadNode>) -> Self {
        let mut type_counts: BTreeMap<MessageKind, usize> = BTreeMap::new();
        let mut contributors = BTreeSet::new();
        let mut first_date = root.date;
        let mut last_date = root.date;
        let mut max_depth = 0;

        for node in nodes.values() {
            *type_counts.entry(node.record.message_type).or_default() += 1;
            contributors.insert(node.record.sender.clone());
            first_date = first_date.min(node.record.date);
            last_date = last_date.max(node.record.date);
            max_depth = max_depth.max(node.depth);
        }

        let count = |kind: MessageKind| type_counts.get(&kind).copied().unwrap_or(0);

        let completion_status = if count(MessageKind::Ack) > 0 {
            CompletionStatus::Acked
        } else if count(MessageKind::Review) > 0 {
            CompletionStatus::UnderReview
        } else {
            CompletionStatus::New
        };

        let patch_series = root.patch.as_ref().map(|patch| SeriesSummary {
            version: patch.version,
            total_patches: patch.total,
            completion_status,
        });

        ThreadStatistics {
            total_messages: nodes.len(),
            patches: count(MessageKind::Patch),
            cover_letters: count(MessageKind::PatchCover),
            replies: count(MessageKind::Reply),
            reviews: count(MessageKind::Review),
            acks: count(MessageKind::Ack),
            others: count(MessageKind::Other),
            max_depth,
            contributors: contributors.into_iter().collect(),
            first_date,
            last_date,
            completion_status,
            patch_series,
        }
    }
}
