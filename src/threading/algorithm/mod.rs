//! Email threading algorithm implementation
//!
//! Threads are built in three passes over an explicit [`LinkTable`]:
//!
//! 1. **Link** (`linker`): parent/child edges from declared reply references
//! 2. **Find Roots** (`roots`): patch series grouping, then subject/type heuristics
//! 3. **Assemble** (`assembler`): iterative traversal per root into thread node maps
//!
//! Use [`crate::threading::build_forest`] to run all passes.
//!
//! [`LinkTable`]: super::LinkTable

mod assembler;
mod linker;
mod roots;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::MessageRecord;

pub use assembler::{assemble_threads, collect_thread_members, AssembledThreads};
pub use linker::link_relationships;
pub use roots::{identify_roots, is_likely_root, RootSelection};

/// Records of one run keyed by Message-ID.
///
/// Ordered so every pass iterates records deterministically, whatever the
/// input order was.
pub type RecordIndex = BTreeMap<String, Arc<MessageRecord>>;

/// Index records by Message-ID
///
/// The first record seen for an id wins; the ids of later duplicates are
/// returned so callers can report them.
pub fn index_records(records: Vec<MessageRecord>) -> (RecordIndex, Vec<String>) {
    let mut index = RecordIndex::new();
    let mut duplicates = Vec::new();

    for record in records {
        if index.contains_key(&record.message_id) {
            log::warn!("dropping duplicate message record {}", record.message_id);
            duplicates.push(record.message_id);
            continue;
        }
        index.insert(record.message_id.clone(), Arc::new(record));
    }

    (index, duplicates)
}
