//! Subject inspection for threading
//!
//! When reply headers are missing, the subject line is the only hint about a
//! message's role: a reply prefix marks a follow-up, a `[PATCH n/m]` tag marks
//! a series member.

use crate::models::{MessageKind, PatchDescriptor};

use super::patch_series::extract_patch_descriptor;

/// Prefixes mail clients put in front of a reply subject (lowercase).
const REPLY_PREFIXES: [&str; 2] = ["re:", "aw:"];

/// True when the subject starts with a reply prefix such as `Re:`.
pub fn has_reply_prefix(subject: &str) -> bool {
    let normalized = subject.trim_start().to_lowercase();
    REPLY_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
}

/// Derive message kind and patch descriptor from a subject line
///
/// Used for records the upstream parser delivered without a kind tag.
///
/// - Reply subjects are reviews when they mention a review, acks when they
///   carry `Acked-by`, plain replies otherwise
/// - `[PATCH ...]` subjects are cover letters for ordinal 0, patches otherwise
/// - Everything else is `Other`
///
/// ## Examples
///
/// ```rust
/// use lore_digest::models::MessageKind;
/// use lore_digest::threading::subject::classify_subject;
///
/// assert_eq!(classify_subject("[PATCH v2 0/3] KVM: arm64: rework").0, MessageKind::PatchCover);
/// assert_eq!(classify_subject("[PATCH v2 1/3] KVM: arm64: prep").0, MessageKind::Patch);
/// assert_eq!(classify_subject("Re: [PATCH v2 1/3] KVM: arm64: prep").0, MessageKind::Reply);
/// assert_eq!(classify_subject("Weekly sync notes").0, MessageKind::Other);
/// ```
pub fn classify_subject(subject: &str) -> (MessageKind, Option<PatchDescriptor>) {
    if has_reply_prefix(subject) {
        let lowered = subject.to_lowercase();
        let kind = if lowered.contains("reviewed-by") || lowered.contains("review") {
            MessageKind::Review
        } else if lowered.contains("acked-by") {
            MessageKind::Ack
        } else {
            MessageKind::Reply
        };
        return (kind, None);
    }

    match extract_patch_descriptor(subject) {
        Some(patch) if patch.ordinal == 0 => (MessageKind::PatchCover, Some(patch)),
        Some(patch) => (MessageKind::Patch, Some(patch)),
        None => (MessageKind::Other, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_reply_prefixes() {
        assert!(has_reply_prefix("Re: [PATCH] Fix memory leak"));
        assert!(has_reply_prefix("  RE: question"));
        assert!(has_reply_prefix("AW: Frage"));
        assert!(!has_reply_prefix("[PATCH] Fix memory leak"));
        assert!(!has_reply_prefix("Regression in 6.9"));
    }

    #[test]
    fn classifies_patches_and_covers() {
        let (kind, patch) = classify_subject("[PATCH v3 2/7] KVM: arm64: Fix vgic init");
        assert_eq!(kind, MessageKind::Patch);
        let patch = patch.unwrap();
        assert_eq!((patch.version, patch.ordinal, patch.total), (3, 2, 7));

        let (kind, _) = classify_subject("[PATCH v3 0/7] KVM: arm64: vgic rework");
        assert_eq!(kind, MessageKind::PatchCover);
    }

    #[test]
    fn single_patch_without_numbers_is_a_cover() {
        // git format-patch without -n has no ordinal, which defaults to 0
        let (kind, patch) = classify_subject("[PATCH] arm64: fix typo");
        assert_eq!(kind, MessageKind::PatchCover);
        assert_eq!(patch.unwrap().total, 1);
    }

    #[test]
    fn classifies_replies() {
        assert_eq!(
            classify_subject("Re: [PATCH 1/2] foo (Reviewed-by)").0,
            MessageKind::Review
        );
        assert_eq!(
            classify_subject("Re: [PATCH 1/2] foo Acked-by").0,
            MessageKind::Ack
        );
        assert_eq!(classify_subject("Re: [PATCH 1/2] foo").0, MessageKind::Reply);
        assert_eq!(classify_subject("Re: [PATCH 1/2] foo").1, None);
    }
}
