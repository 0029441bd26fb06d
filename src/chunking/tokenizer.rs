//! Token counting
//!
//! Every token count in a chunk list comes from one [`Tokenizer`], and its
//! unit must match whatever the downstream model budget is expressed in.

use tiktoken_rs::CoreBPE;

use super::error::TokenizerError;

/// Canonical token counting function shared by all chunking stages.
pub trait Tokenizer: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// `cl100k_base` BPE, the encoding used by the summarizer models.
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    pub fn new() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|err| TokenizerError::Load(err.to_string()))?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Offline estimate: one token per started four characters of each word.
///
/// Counts are additive across lines, so packing decisions made line by line
/// always hold for the joined text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokenizer;

impl Tokenizer for ApproxTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace()
            .map(|word| word.chars().count().div_ceil(4))
            .sum()
    }
}
