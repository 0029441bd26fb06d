//! Structural segmentation of message content
//!
//! Splits a message that failed need-assessment into typed chunks. The header
//! comes first, then the body is split with one strategy per message kind:
//!
//! - **Patches and cover letters**: commit message summary, then one chunk per diff
//! - **Reviews**: leading summary, then one chunk per quoted passage and its answer
//! - **Everything else**: one chunk per run of lines at the same quote depth
//!
//! Chunks keep source order. Sizes are not bounded here; that is the job of
//! [`super::enforcer::SizeEnforcer`].

use std::sync::OnceLock;

use regex::RegexSet;

use crate::config::DigestConfig;
use crate::models::{ChunkRole, ContentChunk, MessageKind, MessageRecord};

use super::assess::{diff_blocks, first_diff_offset, quote_depth};
use super::tokenizer::Tokenizer;

pub const HEADER_PRIORITY: u8 = 5;
pub const SUMMARY_PRIORITY: u8 = 4;
pub const CODE_CRITICAL_PRIORITY: u8 = 4;
pub const DISCUSSION_PRIORITY: u8 = 3;
pub const CODE_DETAIL_PRIORITY: u8 = 2;

static CRITICAL_PATHS: OnceLock<RegexSet> = OnceLock::new();

/// Paths whose changes the summarizer must always see: KVM/arm64 trees,
/// headers and build configuration.
fn get_critical_paths() -> &'static RegexSet {
    CRITICAL_PATHS.get_or_init(|| {
        RegexSet::new([
            r"(?i)arch/arm64/kvm",
            r"(?i)virt/kvm/arm",
            r"(?i)include/.*kvm",
            r"(?i)\.h$",
            r"(?i)(^|/)Kconfig",
            r"(?i)(^|/)Makefile",
        ])
        .expect("Invalid critical path patterns")
    })
}

/// Content split at the header/body boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSplit<'a> {
    pub header: Option<&'a str>,
    pub body: &'a str,
}

/// Split the mail header block from the body
///
/// The header runs from the start of the content through the first blank
/// line (`\n\n` or `\r\n\r\n`) following a `From:` line. Without such a
/// boundary the whole content is body.
pub fn split_header(content: &str) -> HeaderSplit<'_> {
    let mut offset = 0;
    let mut from_line = None;
    for line in content.split_inclusive('\n') {
        if line.starts_with("From:") {
            from_line = Some(offset);
            break;
        }
        offset += line.len();
    }

    let boundary = from_line.and_then(|start| {
        let rest = &content[start..];
        let lf = rest.find("\n\n").map(|relative| relative + 2);
        let crlf = rest.find("\r\n\r\n").map(|relative| relative + 4);
        [lf, crlf]
            .into_iter()
            .flatten()
            .min()
            .map(|relative| start + relative)
    });

    match boundary {
        Some(end) => HeaderSplit {
            header: Some(&content[..end]),
            body: &content[end..],
        },
        None => HeaderSplit {
            header: None,
            body: content,
        },
    }
}

/// Paths named by a diff's `diff --git`, `---` and `+++` lines.
pub fn diff_paths(block: &str) -> Vec<&str> {
    let mut paths = Vec::new();
    for line in block.lines() {
        if line.starts_with("@@") {
            break;
        }
        if let Some(rest) = line.strip_prefix("diff --git ") {
            paths.extend(rest.split_whitespace().map(strip_diff_prefix));
        } else if let Some(rest) = line
            .strip_prefix("--- ")
            .or_else(|| line.strip_prefix("+++ "))
        {
            let path = rest.split('\t').next().unwrap_or(rest).trim();
            if path != "/dev/null" {
                paths.push(strip_diff_prefix(path));
            }
        }
    }
    paths
}

fn strip_diff_prefix(path: &str) -> &str {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}

pub fn is_critical_diff(block: &str) -> bool {
    let patterns = get_critical_paths();
    diff_paths(block).iter().any(|path| patterns.is_match(path))
}

/// Byte offset of the first `---` separator line in `body`.
fn separator_offset(body: &str) -> Option<usize> {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Type-dispatched segmentation of one message.
pub struct Segmenter<'a> {
    config: &'a DigestConfig,
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> Segmenter<'a> {
    pub fn new(config: &'a DigestConfig, tokenizer: &'a dyn Tokenizer) -> Self {
        Segmenter { config, tokenizer }
    }

    pub fn segment(&self, record: &MessageRecord, content: &str) -> Vec<ContentChunk> {
        let split = split_header(content);
        let mut chunks = Vec::new();

        match split.header {
            Some(header) => chunks.push(self.header_chunk(record, header)),
            None => log::debug!("no header boundary in {}, header chunk omitted", record.message_id),
        }

        let body_chunks = match record.message_type {
            MessageKind::Patch | MessageKind::PatchCover => self.patch_chunks(record, split.body),
            MessageKind::Review => self.review_chunks(record, split.body),
            MessageKind::Reply | MessageKind::Ack | MessageKind::Other => {
                self.discussion_chunks(record, split.body)
            }
        };
        chunks.extend(body_chunks);

        chunks
    }

    fn header_chunk(&self, record: &MessageRecord, header: &str) -> ContentChunk {
        let mut content = format!("{}Message-Type: {}\n", header, record.message_type);
        if let Some(patch) = &record.patch {
            content.push_str(&format!(
                "Patch: v{} {}/{}\n",
                patch.version, patch.ordinal, patch.total
            ));
        }
        self.chunk(record, "header", ChunkRole::Header, HEADER_PRIORITY, content)
    }

    fn patch_chunks(&self, record: &MessageRecord, body: &str) -> Vec<ContentChunk> {
        let mut chunks = Vec::new();

        // No summary without a `---` or diff terminator
        let summary = [separator_offset(body), first_diff_offset(body)]
            .into_iter()
            .flatten()
            .min()
            .map(|end| body[..end].trim())
            .unwrap_or_default();
        if !summary.is_empty() {
            chunks.push(self.chunk(
                record,
                "summary",
                ChunkRole::Summary,
                SUMMARY_PRIORITY,
                summary.to_string(),
            ));
        }

        for (i, block) in diff_blocks(body).into_iter().enumerate() {
            let (role, priority) = if is_critical_diff(block) {
                (ChunkRole::CodeCritical, CODE_CRITICAL_PRIORITY)
            } else {
                (ChunkRole::CodeDetail, CODE_DETAIL_PRIORITY)
            };
            chunks.push(self.chunk(
                record,
                &format!("diff_{i}"),
                role,
                priority,
                block.to_string(),
            ));
        }

        chunks
    }

    fn review_chunks(&self, record: &MessageRecord, body: &str) -> Vec<ContentChunk> {
        let mut chunks = Vec::new();

        let mut summary = String::new();
        for line in body.lines() {
            if quote_depth(line) > 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            if !summary.is_empty() {
                summary.push('\n');
            }
            summary.push_str(line);
            if summary.chars().count() > self.config.review_summary_chars {
                break;
            }
        }
        if !summary.is_empty() {
            chunks.push(self.chunk(
                record,
                "review_summary",
                ChunkRole::Summary,
                SUMMARY_PRIORITY,
                summary,
            ));
        }

        // Each quoted passage carries the reviewer's answer that follows it
        let mut comments: Vec<Vec<&str>> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut answering = false;
        for line in body.lines() {
            if quote_depth(line) > 0 {
                if answering {
                    comments.push(std::mem::take(&mut current));
                    answering = false;
                }
                current.push(line);
            } else if !current.is_empty() {
                current.push(line);
                answering = true;
            }
        }
        if !current.is_empty() {
            comments.push(current);
        }

        let texts = comments
            .into_iter()
            .map(|lines| join_trimmed(&lines))
            .filter(|text| !text.trim().is_empty());
        for (i, text) in texts.enumerate() {
            chunks.push(self.chunk(
                record,
                &format!("comment_{i}"),
                ChunkRole::Discussion,
                DISCUSSION_PRIORITY,
                text,
            ));
        }

        chunks
    }

    fn discussion_chunks(&self, record: &MessageRecord, body: &str) -> Vec<ContentChunk> {
        let mut sections: Vec<Vec<&str>> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_depth = 0;

        for line in body.lines() {
            let depth = quote_depth(line);
            if depth != current_depth && !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            current_depth = depth;
            current.push(line);
        }
        if !current.is_empty() {
            sections.push(current);
        }

        sections
            .into_iter()
            .map(|lines| lines.join("\n"))
            .filter(|text| !text.trim().is_empty())
            .enumerate()
            .map(|(i, text)| {
                self.chunk(
                    record,
                    &format!("disc_{i}"),
                    ChunkRole::Discussion,
                    DISCUSSION_PRIORITY,
                    text,
                )
            })
            .collect()
    }

    fn chunk(
        &self,
        record: &MessageRecord,
        suffix: &str,
        role: ChunkRole,
        priority: u8,
        content: String,
    ) -> ContentChunk {
        ContentChunk {
            chunk_id: format!("{}_{}", record.message_id, suffix),
            message_id: record.message_id.clone(),
            role,
            token_count: self.tokenizer.count_tokens(&content),
            content,
            priority,
        }
    }
}

/// Join lines, dropping trailing blank ones.
fn join_trimmed(lines: &[&str]) -> String {
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map(|last| last + 1)
        .unwrap_or(0);
    lines[..end].join("\n")
}
