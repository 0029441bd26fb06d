use std::collections::HashMap;
use std::sync::Arc;

use lore_digest::chunking::{
    ApproxTokenizer, Chunker, Cl100kTokenizer, ContentError, DirectoryContentSource, Tokenizer,
};
use lore_digest::config::DigestConfig;
use lore_digest::models::{ChunkRole, MessageKind};
use lore_digest::test_support::{day, message, patch_record, reply_to};
use lore_digest::threading::build_forest;

fn chunker() -> Chunker {
    let config = DigestConfig::standard()
        .with_max_tokens(8000)
        .with_worker_threads(2);
    Chunker::new(config, Arc::new(ApproxTokenizer)).unwrap()
}

fn kvm_patch_mail(lines: usize) -> (String, String) {
    let mut diff = String::from(
        "diff --git a/arch/arm64/kvm/reset.c b/arch/arm64/kvm/reset.c\n\
--- a/arch/arm64/kvm/reset.c\n\
+++ b/arch/arm64/kvm/reset.c\n\
@@ -10,0 +10,3000 @@\n",
    );
    for _ in 0..lines {
        diff.push_str("+\tkvm_x();\n");
    }

    let mail = format!(
        "From: Dev <dev@example.org>\n\
Subject: [PATCH] KVM: arm64: reset everything\n\
\n\
Reset every register on vcpu init.\n\
---\n\
{diff}"
    );
    (mail, diff)
}

#[test]
fn small_message_stays_whole() {
    let record = reply_to("r@example.org", "p@example.org", day(2));
    let content = "From: r@example.org\n\n> quoted\n>> deeper\nLooks fine.\n";
    let chunks = chunker().chunk_message(&record, content);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, content);
    assert_eq!(chunks[0].role, ChunkRole::Header);
}

#[test]
fn large_kvm_patch_is_segmented_within_budget() {
    let record = message(
        "kvm@example.org",
        "[PATCH] KVM: arm64: reset everything",
        MessageKind::Patch,
        day(1),
    );
    let (mail, diff) = kvm_patch_mail(3000);
    assert!(ApproxTokenizer.count_tokens(&mail) > 9000);

    let chunks = chunker().chunk_message(&record, &mail);

    assert_eq!(chunks[0].chunk_id, "kvm@example.org_header");
    assert_eq!(chunks[0].role, ChunkRole::Header);
    assert_eq!(chunks[1].chunk_id, "kvm@example.org_summary");
    assert_eq!(chunks[1].content, "Reset every register on vcpu init.");

    let code = &chunks[2..];
    assert!(code.len() >= 2);
    assert!(code.iter().all(|c| c.role == ChunkRole::CodeCritical && c.priority == 4));
    assert!(code.iter().all(|c| c.chunk_id.starts_with("kvm@example.org_diff_0_sub_")));
    assert!(chunks.iter().all(|c| c.token_count <= 8000));

    let rejoined: Vec<&str> = code.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(rejoined.join("\n"), diff);
}

#[test]
fn over_length_line_survives_alone() {
    let config = DigestConfig::standard().with_max_tokens(50).with_worker_threads(1);
    let chunker = Chunker::new(config, Arc::new(ApproxTokenizer)).unwrap();
    let record = message("o@example.org", "notes", MessageKind::Other, day(1));
    let long_line = "word ".repeat(80);
    let content = format!("short intro\n{long_line}\nshort outro");

    let chunks = chunker.chunk_message(&record, &content);

    let over: Vec<_> = chunks.iter().filter(|c| c.token_count > 50).collect();
    assert_eq!(over.len(), 1);
    assert_eq!(over[0].content, long_line);
    assert_eq!(chunks.len(), 3);
}

#[test]
fn forest_chunking_skips_missing_content() {
    let records = vec![
        patch_record("s-1-dev@example.org", 1, 1, 2, day(1)),
        patch_record("s-2-dev@example.org", 1, 2, 2, day(2)),
        reply_to("r@example.org", "s-2-dev@example.org", day(3)),
    ];
    let forest = build_forest(records);

    let source = |id: &str| -> Result<String, ContentError> {
        if id == "r@example.org" {
            Err(ContentError::Missing {
                message_id: id.to_string(),
            })
        } else {
            Ok(format!("From: dev@example.org\n\nbody of {id}\n"))
        }
    };
    let outcome = chunker().chunk_forest(&forest, &source);

    assert_eq!(outcome.chunks.len(), 2);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].message_id, "r@example.org");
    assert_eq!(outcome.total_chunks(), 2);
}

#[test]
fn chunking_is_repeatable() {
    let a = message("a@example.org", "topic", MessageKind::Other, day(1));
    let b = patch_record("b@example.org", 1, 1, 1, day(2));
    let (mail, _) = kvm_patch_mail(4000);
    let mut source = HashMap::new();
    source.insert("a@example.org".to_string(), "hello\n".to_string());
    source.insert("b@example.org".to_string(), mail);

    let first = chunker().chunk_records([&a, &b], &source);
    let second = chunker().chunk_records([&b, &a], &source);

    assert_eq!(first.chunks, second.chunks);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn directory_source_feeds_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("m1@example.org"),
        "From: dev@example.org\n\nThanks!\n",
    )
    .unwrap();

    let m1 = message("m1@example.org", "Re: foo", MessageKind::Reply, day(1));
    let m2 = message("m2@example.org", "Re: foo", MessageKind::Reply, day(2));
    let source = DirectoryContentSource::new(dir.path());

    let outcome = chunker().chunk_records([&m1, &m2], &source);

    assert_eq!(outcome.get("m1@example.org").map(<[_]>::len), Some(1));
    assert_eq!(outcome.skipped[0].message_id, "m2@example.org");
    assert_eq!(outcome.skipped[0].reason, "content missing");
}

#[test]
fn bpe_counts_stay_within_budget() {
    let tokenizer = Arc::new(Cl100kTokenizer::new().unwrap());
    let config = DigestConfig::standard().with_max_tokens(500).with_worker_threads(1);
    let chunker = Chunker::new(config, tokenizer.clone()).unwrap();
    let record = message(
        "bpe@example.org",
        "[PATCH] KVM: arm64: reset everything",
        MessageKind::Patch,
        day(1),
    );
    let (mail, _) = kvm_patch_mail(3000);

    let chunks = chunker.chunk_message(&record, &mail);

    assert!(chunks.len() > 2);
    for chunk in &chunks {
        assert!(chunk.token_count <= 500, "{} has {} tokens", chunk.chunk_id, chunk.token_count);
        assert_eq!(chunk.token_count, tokenizer.count_tokens(&chunk.content));
    }
}
