use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading message records supplied by the upstream parser.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read records from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid records JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record is missing a Message-ID (subject `{subject}`)")]
    MissingMessageId { subject: String },
}
