use std::collections::HashMap;

use lore_digest::models::{MessageKind, MessageRecord};
use lore_digest::test_support::{day, message, patch_record, reply_to};
use lore_digest::threading::{build_forest, Forest};

fn series(order: [usize; 3]) -> Vec<MessageRecord> {
    let members = [
        patch_record("20250701120000.42-1-dev@example.org", 2, 1, 3, day(1)),
        patch_record("20250701120000.42-2-dev@example.org", 2, 2, 3, day(2)),
        patch_record("20250701120000.42-3-dev@example.org", 2, 3, 3, day(3)),
    ];
    order.iter().map(|&i| members[i].clone()).collect()
}

fn assert_depth_invariant(forest: &Forest) {
    for thread in &forest.threads {
        for (msg_id, node) in &thread.nodes {
            match node.parent_id.as_deref() {
                Some(parent_id) => {
                    let parent = &thread.nodes[parent_id];
                    assert_eq!(node.depth, parent.depth + 1, "depth of {msg_id}");
                    assert!(parent.children.contains(msg_id));
                }
                None => {
                    assert_eq!(msg_id, &thread.root.message_id);
                    assert_eq!(node.depth, 0);
                }
            }
        }
    }
}

fn mixed_collection() -> Vec<MessageRecord> {
    let mut records = series([0, 1, 2]);
    records.extend([
        reply_to("r1@example.org", "20250701120000.42-2-dev@example.org", day(4)),
        reply_to("r2@example.org", "r1@example.org", day(5)),
        message("q@example.org", "Question about vgic", MessageKind::Other, day(2)),
        reply_to("a1@example.org", "q@example.org", day(3)),
        reply_to("lost@example.org", "never-seen@example.org", day(6)),
        message("cover@example.org", "[PATCH 0/2] timers", MessageKind::PatchCover, day(7)),
        message("t1@example.org", "[PATCH 1/2] timers: a", MessageKind::Patch, day(7))
            .with_parent("cover@example.org"),
    ]);
    records
}

#[test]
fn patch_series_root_is_earliest_in_any_order() {
    let orders = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in orders {
        let forest = build_forest(series(order));

        assert_eq!(forest.threads.len(), 1, "order {order:?}");
        let thread = &forest.threads[0];
        assert_eq!(thread.root.message_id, "20250701120000.42-1-dev@example.org");
        assert_eq!(
            thread.nodes[&thread.root.message_id].children,
            vec![
                "20250701120000.42-2-dev@example.org".to_string(),
                "20250701120000.42-3-dev@example.org".to_string(),
            ]
        );
        assert_eq!(thread.statistics.max_depth, 1);
    }
}

#[test]
fn cover_letter_with_two_patches() {
    let records = vec![
        message("A", "[PATCH 0/2] rework", MessageKind::PatchCover, day(1)),
        patch_record("B", 1, 1, 2, day(2)).with_parent("A"),
        patch_record("C", 1, 2, 2, day(3)).with_parent("A"),
    ];
    let forest = build_forest(records);

    assert_eq!(forest.threads.len(), 1);
    let thread = &forest.threads[0];
    assert_eq!(thread.root.message_id, "A");
    assert_eq!(
        thread.nodes.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
    assert_eq!(thread.statistics.max_depth, 1);
    assert_eq!(thread.statistics.patches, 2);
    assert_eq!(thread.statistics.cover_letters, 1);
}

#[test]
fn depths_follow_edges() {
    let forest = build_forest(mixed_collection());
    assert_depth_invariant(&forest);

    let thread = forest.thread_of("r2@example.org").unwrap();
    assert_eq!(thread.root.message_id, "20250701120000.42-1-dev@example.org");
    assert_eq!(thread.nodes["r2@example.org"].depth, 3);
}

#[test]
fn every_message_in_at_most_one_thread() {
    let records = mixed_collection();
    let total = records.len();
    let forest = build_forest(records);

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for thread in &forest.threads {
        for msg_id in thread.nodes.keys() {
            *seen.entry(msg_id.as_str()).or_default() += 1;
        }
    }
    assert!(seen.values().all(|&count| count == 1));
    assert_eq!(seen.len() + forest.audit.unthreaded_messages.len(), total);
    assert_eq!(forest.total_messages, total);
}

#[test]
fn orphan_reply_without_thread_is_reported() {
    let forest = build_forest(vec![
        reply_to("x@example.org", "y@example.org", day(1)),
        reply_to("y@example.org", "x@example.org", day(2)),
    ]);

    assert!(forest.is_empty());
    assert_eq!(
        forest.audit.unthreaded_messages,
        vec!["x@example.org".to_string(), "y@example.org".to_string()]
    );
}

#[test]
fn empty_input_yields_empty_forest() {
    let forest = build_forest(Vec::new());

    assert!(forest.is_empty());
    assert_eq!(forest.total_messages, 0);
    assert_eq!(forest.date_range, None);
    assert!(forest.audit.unthreaded_messages.is_empty());
}

#[test]
fn rebuilding_is_stable() {
    let first = serde_json::to_string(&build_forest(mixed_collection())).unwrap();

    let mut reversed = mixed_collection();
    reversed.reverse();
    let second = serde_json::to_string(&build_forest(reversed)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn duplicate_ids_keep_first_record() {
    let forest = build_forest(vec![
        message("d@example.org", "first", MessageKind::Other, day(1)),
        message("d@example.org", "second", MessageKind::Other, day(2)),
    ]);

    assert_eq!(forest.threads.len(), 1);
    assert_eq!(forest.threads[0].subject, "first");
    assert_eq!(forest.audit.duplicate_messages, vec!["d@example.org".to_string()]);
    assert_eq!(forest.date_range, Some((day(1), day(1))));
}
