//! Email threading module
//!
//! Reconstructs conversation threads from a flat collection of message
//! records whose reply metadata is often missing or inconsistent.
//!
//! ## Threading Strategy
//!
//! 1. **Reply References**: the declared parent of each record links it into
//!    the tree when that parent is part of the collection
//! 2. **Patch Series**: members of a `[PATCH n/m]` series are regrouped under
//!    their earliest member, overriding the reply chain when the two disagree
//! 3. **Subject Heuristics**: remaining parentless messages start a thread when
//!    they look like one (cover letter, first patch, no `Re:` prefix, or
//!    already answered)
//!
//! ## Module Structure
//!
//! - `link_table`: replaceable parent/child edge table
//! - `algorithm`: linker, root identifier and thread assembler
//! - `patch_series`: patch descriptor extraction and series grouping
//! - `subject`: reply prefix detection and subject classification
//! - `statistics`: per-thread statistics
//! - `forest`: output types and the [`build_forest`] entry point

pub mod algorithm;
pub mod error;
pub mod forest;
pub mod link_table;
pub mod patch_series;
pub mod statistics;
pub mod subject;

// Re-export main types and functions
pub use error::IntegrityError;
pub use forest::{build_forest, ExcludedThread, Forest, ForestAudit, Thread, ThreadNode};
pub use link_table::{LinkEntry, LinkTable};
pub use statistics::{CompletionStatus, SeriesSummary, ThreadStatistics};
pub use subject::classify_subject;
