//! Thread root identification
//!
//! Two policies, applied in order:
//!
//! 1. **Patch series grouping**: every multi-member series becomes one thread
//!    rooted at its earliest member, with all other members attached directly
//!    beneath it. This wins over the reply headers when the two disagree.
//! 2. **Heuristics**: remaining parentless records become roots when they look
//!    like the start of a conversation (see [`is_likely_root`]).

use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{MessageKind, MessageRecord};

use super::super::link_table::LinkTable;
use super::super::patch_series::group_patch_series;
use super::super::subject::has_reply_prefix;
use super::RecordIndex;

/// Outcome of root identification.
#[derive(Debug, Clone, Default)]
pub struct RootSelection {
    /// Root Message-IDs, one per emergent thread
    pub roots: Vec<String>,

    /// Number of patch series that were regrouped into synthetic threads
    pub series_groups: usize,

    /// Message-IDs absorbed into a regrouped series (roots included)
    pub absorbed: HashSet<String>,
}

/// Identify thread roots, rewriting edges in `table` for patch series
///
/// ## Series Rewriting
///
/// For each multi-member series the earliest member becomes the root: it is
/// detached from any parent the linker gave it, and every other member is
/// re-attached directly under it. A series whose members already all reply to
/// the same message (typically their cover letter) is cohesive as it stands
/// and is left alone; it is threaded through that parent instead.
///
/// Depths in `table` are recomputed after rewriting.
pub fn identify_roots(index: &RecordIndex, table: &mut LinkTable) -> RootSelection {
    let mut selection = RootSelection::default();

    for (series, members) in group_patch_series(index) {
        if shares_common_parent(&members, table) {
            log::debug!("series {} already threaded under a common parent", series);
            continue;
        }

        let Some((root, rest)) = members.split_first() else {
            continue;
        };

        table.detach(&root.message_id);
        for member in rest {
            table.link(&member.message_id, &root.message_id);
        }

        log::debug!(
            "series {} regrouped under {} ({} members)",
            series,
            root.message_id,
            members.len()
        );

        selection.series_groups += 1;
        selection.roots.push(root.message_id.clone());
        selection
            .absorbed
            .extend(members.iter().map(|member| member.message_id.clone()));
    }

    table.recompute_depths();

    for msg_id in table.parentless_ids() {
        if selection.absorbed.contains(msg_id) {
            continue;
        }
        let Some(record) = index.get(msg_id) else {
            continue;
        };
        if is_likely_root(record, table) {
            selection.roots.push(msg_id.to_string());
        }
    }

    selection
}

/// Decide whether a parentless record starts a thread
///
/// Any of the following is enough:
/// - it is a cover letter
/// - it is the first patch of its series
/// - its subject has no reply prefix
/// - it already has replies of its own
pub fn is_likely_root(record: &MessageRecord, table: &LinkTable) -> bool {
    record.message_type == MessageKind::PatchCover
        || record.is_first_patch()
        || !has_reply_prefix(&record.subject)
        || !table.children_of(&record.message_id).is_empty()
}

fn shares_common_parent(members: &[Arc<MessageRecord>], table: &LinkTable) -> bool {
    let mut parents = members
        .iter()
        .map(|member| table.parent_of(&member.message_id));

    let Some(Some(first_parent)) = parents.next() else {
        return false;
    };

    let in_series = members
        .iter()
        .any(|member| member.message_id == first_parent);

    !in_series && parents.all(|parent| parent == Some(first_parent))
}
