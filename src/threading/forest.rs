//! Thread forest: the output of one threading run.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::MessageRecord;

use super::algorithm::{
    assemble_threads, identify_roots, index_records, link_relationships,
};
use super::statistics::ThreadStatistics;

/// One message inside an assembled thread, with its final edges.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadNode {
    pub record: Arc<MessageRecord>,
    /// None for the thread root
    pub parent_id: Option<String>,
    pub children: Vec<String>,
    /// Reply depth below the root (root is 0)
    pub depth: u32,
}

/// A root message and every message reachable from it.
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    pub thread_id: String,
    pub subject: String,
    pub root: Arc<MessageRecord>,
    pub nodes: BTreeMap<String, ThreadNode>,
    pub statistics: ThreadStatistics,
}

impl Thread {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.nodes.contains_key(message_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &MessageRecord> {
        self.nodes.values().map(|node| node.record.as_ref())
    }
}

/// A thread dropped from the forest because its structure was corrupt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedThread {
    pub root_id: String,
    pub reason: String,
}

/// Completeness information for the report layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForestAudit {
    /// Messages that ended up in no thread, sorted
    pub unthreaded_messages: Vec<String>,
    pub excluded_threads: Vec<ExcludedThread>,
    /// Ids seen more than once in the input (later copies dropped)
    pub duplicate_messages: Vec<String>,
    /// Patch series regrouped into synthetic threads
    pub series_groups: usize,
}

/// All threads of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Forest {
    pub threads: Vec<Thread>,
    pub total_messages: usize,
    /// Earliest and latest message date across indexed records (duplicates excluded)
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub audit: ForestAudit,
}

impl Forest {
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// The thread whose node map contains `message_id`.
    pub fn thread_of(&self, message_id: &str) -> Option<&Thread> {
        self.threads.iter().find(|thread| thread.contains(message_id))
    }

    /// Every threaded record, thread by thread.
    pub fn records(&self) -> impl Iterator<Item = &MessageRecord> {
        self.threads.iter().flat_map(Thread::records)
    }
}

/// Build the thread forest for a collection of message records
///
/// ## Steps
///
/// 1. Index records by Message-ID (duplicates dropped)
/// 2. Link parent/child edges from reply references
/// 3. Identify roots (patch series grouping, then heuristics)
/// 4. Assemble each root's thread and compute statistics
///
/// Nothing here is fatal: corrupt threads are excluded and listed in
/// [`Forest::audit`], as are messages that no thread reached. An empty input
/// yields an empty forest.
pub fn build_forest(records: Vec<MessageRecord>) -> Forest {
    let (index, duplicate_messages) = index_records(records);

    let date_range = index
        .values()
        .map(|record| record.date)
        .fold(None, |range: Option<(DateTime<Utc>, DateTime<Utc>)>, date| {
            Some(match range {
                Some((first, last)) => (first.min(date), last.max(date)),
                None => (date, date),
            })
        });

    let mut table = link_relationships(&index);
    let selection = identify_roots(&index, &mut table);
    let assembled = assemble_threads(&selection.roots, &index, &table);

    let threaded: HashSet<&str> = assembled
        .threads
        .iter()
        .flat_map(|thread| thread.nodes.keys().map(String::as_str))
        .collect();
    let unthreaded_messages: Vec<String> = index
        .keys()
        .filter(|msg_id| !threaded.contains(msg_id.as_str()))
        .cloned()
        .collect();

    log::info!(
        "built {} threads from {} messages ({} unthreaded, {} excluded threads, {} series regrouped)",
        assembled.threads.len(),
        index.len(),
        unthreaded_messages.len(),
        assembled.excluded.len(),
        selection.series_groups
    );

    Forest {
        threads: assembled.threads,
        total_messages: index.len(),
        date_range,
        audit: ForestAudit {
            unthreaded_messages,
            excluded_threads: assembled.excluded,
            duplicate_messages,
            series_groups: selection.series_groups,
        },
    }
}
