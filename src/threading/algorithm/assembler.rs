//! Thread assembly from identified roots
//!
//! Each root is expanded into a flat node map with an iterative depth-first
//! traversal. A visited set guards the traversal: reaching a message twice
//! means the edge table is corrupt for that thread, which is reported as an
//! integrity fault and excludes that one thread.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;

use super::super::error::IntegrityError;
use super::super::forest::{ExcludedThread, Thread, ThreadNode};
use super::super::link_table::LinkTable;
use super::super::statistics::ThreadStatistics;
use super::RecordIndex;

/// Threads assembled from a root set, plus the roots that had to be dropped.
#[derive(Debug, Default)]
pub struct AssembledThreads {
    pub threads: Vec<Thread>,
    pub excluded: Vec<ExcludedThread>,
}

/// Collect all messages of a thread with their depth values
///
/// Uses an explicit stack of `(message_id, depth)` entries instead of
/// recursion, so deep threads cannot overflow the call stack. Children are
/// pushed in reverse to keep the left-to-right DFS order.
///
/// ## Errors
///
/// [`IntegrityError::CycleDetected`] when a message is reached a second time.
pub fn collect_thread_members(
    root_message_id: &str,
    table: &LinkTable,
) -> Result<Vec<(String, u32)>, IntegrityError> {
    let mut traversal_stack = vec![(root_message_id.to_string(), 0u32)];
    let mut visited: HashSet<String> = HashSet::new();
    let mut members = Vec::new();

    while let Some((current_message_id, current_depth)) = traversal_stack.pop() {
        if !visited.insert(current_message_id.clone()) {
            return Err(IntegrityError::CycleDetected {
                root_id: root_message_id.to_string(),
                message_id: current_message_id,
            });
        }

        for child_message_id in table.children_of(&current_message_id).iter().rev() {
            traversal_stack.push((child_message_id.clone(), current_depth + 1));
        }

        members.push((current_message_id, current_depth));
    }

    Ok(members)
}

/// Assemble complete threads from the root set
///
/// Roots are processed in parallel; the result is sorted by root date, then
/// root Message-ID, so it does not depend on scheduling.
pub fn assemble_threads(
    root_message_ids: &[String],
    index: &RecordIndex,
    table: &LinkTable,
) -> AssembledThreads {
    let results: Vec<(String, Result<Thread, IntegrityError>)> = root_message_ids
        .par_iter()
        .map(|root_id| {
            (
                root_id.clone(),
                assemble_single_thread(root_id, index, table),
            )
        })
        .collect();

    let mut assembled = AssembledThreads::default();
    for (root_id, result) in results {
        match result {
            Ok(thread) => assembled.threads.push(thread),
            Err(err) => {
                log::error!("excluding thread rooted at {}: {}", root_id, err);
                assembled.excluded.push(ExcludedThread {
                    root_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    assembled.threads.sort_by(|a, b| {
        a.root
            .date
            .cmp(&b.root.date)
            .then_with(|| a.root.message_id.cmp(&b.root.message_id))
    });
    assembled
        .excluded
        .sort_by(|a, b| a.root_id.cmp(&b.root_id));

    assembled
}

fn assemble_single_thread(
    root_message_id: &str,
    index: &RecordIndex,
    table: &LinkTable,
) -> Result<Thread, IntegrityError> {
    let root = index
        .get(root_message_id)
        .cloned()
        .ok_or_else(|| IntegrityError::UnknownRoot {
            root_id: root_message_id.to_string(),
        })?;

    let members = collect_thread_members(root_message_id, table)?;

    let mut nodes = BTreeMap::new();
    for (message_id, depth) in members {
        let Some(record) = index.get(&message_id) else {
            continue;
        };
        let parent_id = if message_id == root_message_id {
            None
        } else {
            table.parent_of(&message_id).map(str::to_string)
        };
        nodes.insert(
            message_id.clone(),
            ThreadNode {
                record: Arc::clone(record),
                parent_id,
                children: table.children_of(&message_id).to_vec(),
                depth,
            },
        );
    }

    let statistics = ThreadStatistics::compute(&root, &nodes);

    Ok(Thread {
        thread_id: thread_id_for(&root.message_id, &root.date),
        subject: root.subject.clone(),
        root,
        nodes,
        statistics,
    })
}

/// `thread_<YYYYMMDD>_<first 8 alphanumerics of the root Message-ID>`
fn thread_id_for(root_message_id: &str, date: &chrono::DateTime<chrono::Utc>) -> String {
    let short_id: String = root_message_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect();
    format!("thread_{}_{}", date.format("%Y%m%d"), short_id)
}
