//! Relationship linking from declared reply references

use super::super::link_table::LinkTable;
use super::RecordIndex;

/// Build parent-child relationships from each record's parent reference
///
/// A record is registered as a child of its declared parent when that parent
/// is part of the same collection. Unresolved references (messages we don't
/// have) and self references leave the record parentless.
///
/// Reply depths are recomputed once all edges are in place, so every child
/// ends up exactly one level below its parent regardless of input order.
pub fn link_relationships(index: &RecordIndex) -> LinkTable {
    let mut table = LinkTable::with_ids(index.keys().cloned());
    let mut linked = 0usize;
    let mut unresolved = 0usize;

    for (msg_id, record) in index {
        let Some(parent_id) = record.parent_id.as_deref() else {
            continue;
        };

        if !index.contains_key(parent_id) {
            unresolved += 1;
            continue;
        }

        if table.link(msg_id, parent_id) {
            linked += 1;
        }
    }

    table.recompute_depths();

    log::debug!(
        "linked {} of {} records ({} unresolved parent references)",
        linked,
        index.len(),
        unresolved
    );

    table
}
