//! Thread reconstruction and token-bounded chunking for mailing-list archives.
//!
//! [`threading::build_forest`] groups parsed message records into threads;
//! [`chunking::Chunker`] splits the content of each message into chunks that
//! fit a summarizer's token budget.

pub mod chunking;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod threading;

use std::sync::Once;

use env_logger::Env;

pub use chunking::{Chunker, ChunkingOutcome, ContentSource, DirectoryContentSource, Tokenizer};
pub use config::DigestConfig;
pub use error::InputError;
pub use models::{ChunkRole, ContentChunk, MessageKind, MessageRecord, PatchDescriptor};
pub use threading::{build_forest, Forest, Thread};

static LOGGER: Once = Once::new();

/// Install the `env_logger` backend once; `RUST_LOG` overrides the `info` default.
pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
    });
}

/// Record builders shared by unit and integration tests.
#[doc(hidden)]
pub mod test_support {
    use chrono::{DateTime, Utc};

    use crate::models::{MessageKind, MessageRecord, PatchDescriptor};

    /// Noon UTC on 2025-07-`n`.
    pub fn day(n: u32) -> DateTime<Utc> {
        let base = 1_751_371_200; // 2025-07-01T12:00:00Z
        DateTime::from_timestamp(base + i64::from(n.saturating_sub(1)) * 86_400, 0)
            .unwrap_or_default()
    }

    pub fn message(id: &str, subject: &str, kind: MessageKind, date: DateTime<Utc>) -> MessageRecord {
        MessageRecord::new(id, subject, "dev@example.org", date, kind)
    }

    pub fn reply_to(id: &str, parent: &str, date: DateTime<Utc>) -> MessageRecord {
        message(id, "Re: discussion", MessageKind::Reply, date).with_parent(parent)
    }

    pub fn patch_record(
        id: &str,
        version: u32,
        ordinal: u32,
        total: u32,
        date: DateTime<Utc>,
    ) -> MessageRecord {
        message(
            id,
            &format!("[PATCH v{version} {ordinal}/{total}] change"),
            MessageKind::Patch,
            date,
        )
        .with_patch(PatchDescriptor {
            version,
            ordinal,
            total,
            series_name: "change".to_string(),
        })
    }
}
