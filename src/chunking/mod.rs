//! Content chunking module
//!
//! Turns the raw text of each message into an ordered list of typed chunks,
//! each within a token budget, so a downstream summarizer can consume a
//! thread piece by piece.
//!
//! ## Pipeline
//!
//! 1. **Assessment**: small messages without large diffs or deep quoting pass
//!    through as a single chunk
//! 2. **Segmentation**: everything else is split by structure according to
//!    its message kind
//! 3. **Enforcement**: segments over the token budget are split on line
//!    boundaries
//!
//! Token counts throughout come from one [`Tokenizer`].

pub mod assess;
pub mod enforcer;
pub mod error;
pub mod pipeline;
pub mod segmenter;
pub mod source;
pub mod tokenizer;

pub use assess::Assessment;
pub use enforcer::SizeEnforcer;
pub use error::{ChunkingError, ContentError, TokenizerError};
pub use pipeline::{Chunker, ChunkingOutcome, SkippedMessage};
pub use segmenter::Segmenter;
pub use source::{ContentSource, DirectoryContentSource};
pub use tokenizer::{ApproxTokenizer, Cl100kTokenizer, Tokenizer};
