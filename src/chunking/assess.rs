//! Content need-assessment
//!
//! Decides whether a message is small and simple enough to be handed to the
//! summarizer as a single chunk.

use crate::config::DigestConfig;

use super::tokenizer::Tokenizer;

const DIFF_MARKER: &str = "diff --git ";

/// Quote nesting depth of one line: the length of its leading `>` run.
///
/// Markers separated by whitespace (`> > text`) count once.
pub fn quote_depth(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b'>').count()
}

pub fn max_quote_depth(content: &str) -> usize {
    content.lines().map(quote_depth).max().unwrap_or(0)
}

/// Slices of `content` holding one diff each
///
/// A diff starts at a line beginning with `diff --git ` and runs up to the
/// next such line or the end of the content.
pub fn diff_blocks(content: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.starts_with(DIFF_MARKER) {
            starts.push(offset);
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(content.len());
            &content[start..end]
        })
        .collect()
}

/// Byte offset of the first diff in `content`, if any.
pub fn first_diff_offset(content: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.starts_with(DIFF_MARKER) {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Aggregate byte size of all diffs in `content`.
pub fn diff_size(content: &str) -> usize {
    diff_blocks(content).iter().map(|block| block.len()).sum()
}

/// Measurements behind the segmentation decision for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub token_count: usize,
    pub diff_bytes: usize,
    pub max_quote_depth: usize,
}

impl Assessment {
    pub fn measure(content: &str, tokenizer: &dyn Tokenizer) -> Self {
        Assessment {
            token_count: tokenizer.count_tokens(content),
            diff_bytes: diff_size(content),
            max_quote_depth: max_quote_depth(content),
        }
    }

    /// True when any limit is exceeded.
    pub fn needs_segmentation(&self, config: &DigestConfig) -> bool {
        self.token_count > config.max_tokens
            || self.diff_bytes > config.max_diff_bytes
            || self.max_quote_depth > config.max_quote_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::tokenizer::ApproxTokenizer;

    #[test]
    fn quote_depth_counts_markers() {
        assert_eq!(quote_depth("plain"), 0);
        assert_eq!(quote_depth(">"), 1);
        assert_eq!(quote_depth(">> nested"), 2);
        assert_eq!(quote_depth(">>> deep"), 3);
        assert_eq!(quote_depth("> > > spaced"), 1);
        assert_eq!(quote_depth(" > indented"), 0);
        assert_eq!(quote_depth("> a > b"), 1);
    }

    #[test]
    fn diff_blocks_split_on_markers() {
        let content = "intro\ndiff --git a/x b/x\n+1\ndiff --git a/y b/y\n-2\n";
        let blocks = diff_blocks(content);
        assert_eq!(
            blocks,
            vec!["diff --git a/x b/x\n+1\n", "diff --git a/y b/y\n-2\n"]
        );
        assert_eq!(diff_size(content), content.len() - "intro\n".len());
        assert_eq!(first_diff_offset(content), Some(6));
    }

    #[test]
    fn marker_must_start_the_line() {
        let content = "see the diff --git output below\n";
        assert!(diff_blocks(content).is_empty());
        assert_eq!(first_diff_offset(content), None);
    }

    #[test]
    fn small_simple_message_needs_no_segmentation() {
        let config = DigestConfig::standard();
        let assessment = Assessment::measure("Looks good to me.\n\n>>> quoted", &ApproxTokenizer);
        assert_eq!(assessment.max_quote_depth, 3);
        assert!(!assessment.needs_segmentation(&config));
    }

    #[test]
    fn each_limit_triggers_segmentation() {
        let config = DigestConfig::standard();

        let deep_quote = Assessment::measure(">>>> too deep", &ApproxTokenizer);
        assert!(deep_quote.needs_segmentation(&config));

        let spaced = Assessment::measure("> > > > spaced markers", &ApproxTokenizer);
        assert_eq!(spaced.max_quote_depth, 1);
        assert!(!spaced.needs_segmentation(&config));

        let big_diff = format!("diff --git a/f b/f\n{}", "+abc\n".repeat(2100));
        let diff = Assessment::measure(&big_diff, &ApproxTokenizer);
        assert!(diff.diff_bytes > 10240);
        assert!(diff.needs_segmentation(&config));

        let long = "word ".repeat(8001);
        assert!(Assessment::measure(&long, &ApproxTokenizer).needs_segmentation(&config));
    }
}
