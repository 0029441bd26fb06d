//! Chunking pipeline
//!
//! Runs need-assessment, segmentation and budget enforcement for each message
//! on a bounded worker pool. Messages are independent of each other; a message
//! whose content cannot be fetched is reported as skipped and the rest of the
//! batch proceeds.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::DigestConfig;
use crate::models::{ChunkRole, ContentChunk, MessageRecord};
use crate::threading::Forest;

use super::assess::Assessment;
use super::enforcer::SizeEnforcer;
use super::error::{ChunkingError, ContentError};
use super::segmenter::{HEADER_PRIORITY, Segmenter};
use super::source::ContentSource;
use super::tokenizer::Tokenizer;

/// A message that produced no chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMessage {
    pub message_id: String,
    pub reason: String,
}

/// Chunk lists for a batch of messages, keyed by message id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkingOutcome {
    pub chunks: BTreeMap<String, Vec<ContentChunk>>,
    pub skipped: Vec<SkippedMessage>,
}

impl ChunkingOutcome {
    pub fn get(&self, message_id: &str) -> Option<&[ContentChunk]> {
        self.chunks.get(message_id).map(Vec::as_slice)
    }

    pub fn total_chunks(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    /// SHA-256 over every chunk id and content, in message id order.
    ///
    /// Equal fingerprints mean two runs produced identical chunk lists.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (message_id, chunks) in &self.chunks {
            hasher.update(message_id.as_bytes());
            hasher.update([0u8]);
            for chunk in chunks {
                hasher.update(chunk.chunk_id.as_bytes());
                hasher.update([0u8]);
                hasher.update(chunk.content.as_bytes());
                hasher.update([0u8]);
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

pub struct Chunker {
    config: DigestConfig,
    tokenizer: Arc<dyn Tokenizer>,
    pool: ThreadPool,
}

impl Chunker {
    pub fn new(config: DigestConfig, tokenizer: Arc<dyn Tokenizer>) -> Result<Self, ChunkingError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.max(1))
            .thread_name(|i| format!("chunker-{i}"))
            .build()?;

        log::debug!(
            "chunker ready: {} workers, {} token budget",
            config.worker_threads.max(1),
            config.max_tokens
        );

        Ok(Self {
            config,
            tokenizer,
            pool,
        })
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Chunk list for one message's content.
    ///
    /// Content within every limit comes back whole as a single header-role
    /// chunk; anything else is segmented by structure, then bounded by the
    /// token budget.
    pub fn chunk_message(&self, record: &MessageRecord, content: &str) -> Vec<ContentChunk> {
        let tokenizer = self.tokenizer.as_ref();
        let assessment = Assessment::measure(content, tokenizer);

        if !assessment.needs_segmentation(&self.config) {
            return vec![whole_chunk(record, content, assessment.token_count)];
        }

        log::debug!(
            "segmenting {}: {} tokens, {} diff bytes, quote depth {}",
            record.message_id,
            assessment.token_count,
            assessment.diff_bytes,
            assessment.max_quote_depth
        );

        let mut chunks = Segmenter::new(&self.config, tokenizer).segment(record, content);
        if chunks.is_empty() {
            chunks.push(whole_chunk(record, content, assessment.token_count));
        }

        SizeEnforcer::new(self.config.max_tokens, tokenizer).enforce(chunks)
    }

    /// Chunk every record, fetching content from `source`.
    pub fn chunk_records<'r, I>(&self, records: I, source: &dyn ContentSource) -> ChunkingOutcome
    where
        I: IntoIterator<Item = &'r MessageRecord>,
    {
        let records: Vec<&MessageRecord> = records.into_iter().collect();
        let chunks: DashMap<String, Vec<ContentChunk>> = DashMap::new();
        let skipped: DashMap<String, String> = DashMap::new();

        self.pool.install(|| {
            records.par_iter().for_each(|record| {
                match source.fetch(&record.message_id) {
                    Ok(content) => {
                        chunks.insert(
                            record.message_id.clone(),
                            self.chunk_message(record, &content),
                        );
                    }
                    Err(err) => {
                        log::warn!("skipping {}: {}", record.message_id, err);
                        skipped.insert(record.message_id.clone(), skip_reason(&err));
                    }
                }
            });
        });

        let outcome = ChunkingOutcome {
            chunks: chunks.into_iter().collect(),
            skipped: skipped
                .into_iter()
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .map(|(message_id, reason)| SkippedMessage { message_id, reason })
                .collect(),
        };

        log::info!(
            "chunked {} messages into {} chunks ({} skipped)",
            outcome.chunks.len(),
            outcome.total_chunks(),
            outcome.skipped.len()
        );

        outcome
    }

    /// Chunk every message in every thread of `forest`.
    pub fn chunk_forest(&self, forest: &Forest, source: &dyn ContentSource) -> ChunkingOutcome {
        self.chunk_records(forest.records(), source)
    }
}

fn whole_chunk(record: &MessageRecord, content: &str, token_count: usize) -> ContentChunk {
    ContentChunk {
        chunk_id: format!("{}_0", record.message_id),
        message_id: record.message_id.clone(),
        role: ChunkRole::Header,
        content: content.to_string(),
        priority: HEADER_PRIORITY,
        token_count,
    }
}

fn skip_reason(err: &ContentError) -> String {
    match err {
        ContentError::Missing { .. } => "content missing".to_string(),
        ContentError::Io { source, .. } => format!("read failed: {source}"),
    }
}
