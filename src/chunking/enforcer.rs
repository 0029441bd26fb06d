//! Token budget enforcement
//!
//! Splits chunks that exceed the budget into line-aligned sub-chunks. The
//! first pass packs lines using per-line estimates; any resulting piece that
//! still measures over budget is repacked by measuring each candidate text
//! exactly. A single line longer than the budget is never cut and is kept as
//! its own over-length sub-chunk.

use crate::models::ContentChunk;

use super::tokenizer::Tokenizer;

pub struct SizeEnforcer<'a> {
    max_tokens: usize,
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> SizeEnforcer<'a> {
    pub fn new(max_tokens: usize, tokenizer: &'a dyn Tokenizer) -> Self {
        SizeEnforcer {
            max_tokens,
            tokenizer,
        }
    }

    /// Bound every chunk by the budget, preserving order.
    pub fn enforce(&self, chunks: Vec<ContentChunk>) -> Vec<ContentChunk> {
        chunks
            .into_iter()
            .flat_map(|chunk| {
                if chunk.token_count <= self.max_tokens {
                    vec![chunk]
                } else {
                    self.split_oversized(chunk)
                }
            })
            .collect()
    }

    fn split_oversized(&self, chunk: ContentChunk) -> Vec<ContentChunk> {
        let lines: Vec<&str> = chunk.content.split('\n').collect();

        let mut pieces: Vec<String> = Vec::new();
        for piece in self.pack_estimated(&lines) {
            let text = piece.join("\n");
            if piece.len() > 1 && self.tokenizer.count_tokens(&text) > self.max_tokens {
                pieces.extend(
                    self.pack_exact(&piece)
                        .into_iter()
                        .map(|lines| lines.join("\n")),
                );
            } else {
                pieces.push(text);
            }
        }

        log::debug!(
            "split {} ({} tokens) into {} sub-chunks",
            chunk.chunk_id,
            chunk.token_count,
            pieces.len()
        );

        pieces
            .into_iter()
            .enumerate()
            .map(|(n, content)| {
                let token_count = self.tokenizer.count_tokens(&content);
                let chunk_id = format!("{}_sub_{}", chunk.chunk_id, n);
                if token_count > self.max_tokens {
                    log::warn!(
                        "{chunk_id} holds a single line of {token_count} tokens, over the {} token budget",
                        self.max_tokens
                    );
                }
                ContentChunk {
                    chunk_id,
                    message_id: chunk.message_id.clone(),
                    role: chunk.role,
                    content,
                    priority: chunk.priority,
                    token_count,
                }
            })
            .collect()
    }

    /// Greedy packing on per-line estimates.
    fn pack_estimated<'l>(&self, lines: &[&'l str]) -> Vec<Vec<&'l str>> {
        let mut pieces = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0;

        for &line in lines {
            let line_tokens = self.tokenizer.count_tokens(&format!("{line}\n"));
            if !current.is_empty() && current_tokens + line_tokens > self.max_tokens {
                pieces.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            current.push(line);
            current_tokens += line_tokens;
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
    }

    /// Greedy packing that measures each candidate piece as a whole.
    fn pack_exact<'l>(&self, lines: &[&'l str]) -> Vec<Vec<&'l str>> {
        let mut pieces = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for &line in lines {
            if !current.is_empty() {
                let candidate = format!("{}\n{}", current.join("\n"), line);
                if self.tokenizer.count_tokens(&candidate) > self.max_tokens {
                    pieces.push(std::mem::take(&mut current));
                }
            }
            current.push(line);
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
    }
}
