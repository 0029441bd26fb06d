use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a content source for a single message.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no content available for message {message_id}")]
    Missing { message_id: String },
    #[error("failed to read content for message {message_id} from {path}: {source}")]
    Io {
        message_id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading a tokenizer.
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("failed to load BPE ranks: {0}")]
    Load(String),
}

/// Errors raised while setting up the chunking pipeline.
#[derive(Debug, Error)]
pub enum ChunkingError {
    #[error("failed to build chunking worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
