//! Patch series detection and grouping
//!
//! Kernel mailing list emails often come in "patch series" with subjects like:
//! - [PATCH 0/5] Cover letter describing the series
//! - [PATCH 1/5] First actual patch
//! - [PATCH 2/5] Second patch
//! - etc.
//!
//! git-send-email gives every member of a series a Message-ID of the form
//! `<stamp>-<ordinal>-<sender>`, so the stamp and sender identify the series.
//! Members are grouped on that key; ids that don't follow the convention fall
//! back to a coarse `version + total` key.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::models::{MessageKind, MessageRecord, PatchDescriptor};

use super::algorithm::RecordIndex;

static PATCH_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();
static ORDINAL_REGEX: OnceLock<Regex> = OnceLock::new();

/// Matches a bracketed tag containing the word PATCH and captures:
/// 1. The tag text - e.g. "RFC PATCH net-next v2 3/10"
/// 2. The remainder of the subject (series name)
fn get_patch_tag_regex() -> &'static Regex {
    PATCH_TAG_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\[([^\]]*\bPATCH[^\]]*)\]\s*(.*)$").expect("Invalid patch tag regex")
    })
}

fn get_version_regex() -> &'static Regex {
    VERSION_REGEX
        .get_or_init(|| Regex::new(r"(?i)(?:\b|PATCH)v(\d+)\b").expect("Invalid patch version regex"))
}

fn get_ordinal_regex() -> &'static Regex {
    ORDINAL_REGEX
        .get_or_init(|| Regex::new(r"\b(\d+)/(\d+)\b").expect("Invalid patch ordinal regex"))
}

/// Extract the patch descriptor from an email subject
///
/// Missing parts take their git-format-patch defaults: version 1, ordinal 0
/// and total 1.
///
/// ## Examples
///
/// ```rust
/// use lore_digest::threading::patch_series::extract_patch_descriptor;
///
/// let patch = extract_patch_descriptor("[PATCH v2 3/10] Add new feature").unwrap();
/// assert_eq!((patch.version, patch.ordinal, patch.total), (2, 3, 10));
/// assert_eq!(patch.series_name, "Add new feature");
///
/// let single = extract_patch_descriptor("[PATCH] Fix memory leak").unwrap();
/// assert_eq!((single.version, single.ordinal, single.total), (1, 0, 1));
///
/// assert!(extract_patch_descriptor("Regular email subject").is_none());
/// ```
pub fn extract_patch_descriptor(subject: &str) -> Option<PatchDescriptor> {
    let caps = get_patch_tag_regex().captures(subject)?;
    let tag = caps.get(1)?.as_str();
    let series_name = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let version = get_version_regex()
        .captures(tag)
        .and_then(|v| v.get(1)?.as_str().parse::<u32>().ok())
        .unwrap_or(1);

    let (ordinal, total) = get_ordinal_regex()
        .captures(tag)
        .and_then(|n| {
            let ordinal = n.get(1)?.as_str().parse::<u32>().ok()?;
            let total = n.get(2)?.as_str().parse::<u32>().ok()?;
            Some((ordinal, total))
        })
        .unwrap_or((0, 1));

    Some(PatchDescriptor {
        version,
        ordinal,
        total,
        series_name,
    })
}

/// Series key from the stable part of a git-send-email Message-ID
///
/// `20250705071717.5062-2-ankita@nvidia.com` → `20250705071717.5062-ankita@nvidia.com`
///
/// Returns None when the id does not carry a numeric ordinal segment.
pub fn series_key(message_id: &str) -> Option<String> {
    let parts: Vec<&str> = message_id.split('-').collect();
    if parts.len() < 3 || parts[1].parse::<u32>().is_err() {
        return None;
    }
    Some(format!("{}-{}", parts[0], parts[2..].join("-")))
}

/// Coarse series key built from declared version and total patch count.
///
/// Unrelated series that share these numbers collapse onto the same key.
pub fn coarse_series_key(patch: &PatchDescriptor) -> String {
    format!("v{}_{}patches", patch.version, patch.total)
}

/// Group patch-type records into series
///
/// Only groups with more than one member are returned; members are sorted by
/// date, then Message-ID, so the first member is always the series root.
/// When the id-based keys produce no such group, all patches are regrouped on
/// the coarse key.
pub fn group_patch_series(index: &RecordIndex) -> BTreeMap<String, Vec<Arc<MessageRecord>>> {
    let patches: Vec<(&Arc<MessageRecord>, &PatchDescriptor)> = index
        .values()
        .filter(|record| record.message_type == MessageKind::Patch)
        .filter_map(|record| record.patch.as_ref().map(|patch| (record, patch)))
        .collect();

    let groups = collect_groups(&patches, |record, patch| {
        series_key(&record.message_id).unwrap_or_else(|| coarse_series_key(patch))
    });
    if !groups.is_empty() {
        return groups;
    }

    collect_groups(&patches, |_, patch| coarse_series_key(patch))
}

fn collect_groups<F>(
    patches: &[(&Arc<MessageRecord>, &PatchDescriptor)],
    key_fn: F,
) -> BTreeMap<String, Vec<Arc<MessageRecord>>>
where
    F: Fn(&MessageRecord, &PatchDescriptor) -> String,
{
    let mut groups: BTreeMap<String, Vec<Arc<MessageRecord>>> = BTreeMap::new();
    for (record, patch) in patches {
        groups
            .entry(key_fn(record, patch))
            .or_default()
            .push(Arc::clone(record));
    }

    groups.retain(|_, members| members.len() > 1);
    for members in groups.values_mut() {
        members.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.message_id.cmp(&b.message_id))
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, patch_record};

    fn index_of(records: Vec<MessageRecord>) -> RecordIndex {
        records
            .into_iter()
            .map(|record| (record.message_id.clone(), Arc::new(record)))
            .collect()
    }

    #[test]
    fn test_extract_basic_patch() {
        let patch = extract_patch_descriptor("[PATCH 2/5] Fix memory leak").unwrap();
        assert_eq!((patch.version, patch.ordinal, patch.total), (1, 2, 5));
        assert_eq!(patch.series_name, "Fix memory leak");
    }

    #[test]
    fn test_extract_versioned_cover_letter() {
        let patch = extract_patch_descriptor("[PATCH v3 0/5] Cover letter").unwrap();
        assert_eq!((patch.version, patch.ordinal, patch.total), (3, 0, 5));
    }

    #[test]
    fn test_extract_rfc_and_subsystem_tags() {
        let rfc = extract_patch_descriptor("[RFC PATCH 1/3] Experimental feature").unwrap();
        assert_eq!((rfc.version, rfc.ordinal, rfc.total), (1, 1, 3));

        let subsystem = extract_patch_descriptor("[PATCH net-next v4 7/9] tcp: tweak").unwrap();
        assert_eq!((subsystem.version, subsystem.ordinal, subsystem.total), (4, 7, 9));
        assert_eq!(subsystem.series_name, "tcp: tweak");

        let glued = extract_patch_descriptor("[PATCHv2 2/4] arm64: fix").unwrap();
        assert_eq!((glued.version, glued.ordinal, glued.total), (2, 2, 4));
    }

    #[test]
    fn test_extract_no_patch() {
        assert_eq!(extract_patch_descriptor("Regular email subject"), None);
        assert_eq!(extract_patch_descriptor("[RFC] dispatcher rework"), None);
    }

    #[test]
    fn series_key_drops_ordinal_segment() {
        assert_eq!(
            series_key("20250705071717.5062-2-ankita@nvidia.com").as_deref(),
            Some("20250705071717.5062-ankita@nvidia.com")
        );
        assert_eq!(
            series_key("20250705071717.5062-12-jean-luc@example.org").as_deref(),
            Some("20250705071717.5062-jean-luc@example.org")
        );
    }

    #[test]
    fn series_key_requires_numeric_ordinal() {
        assert_eq!(series_key("CAHk-=wh@mail.gmail.com"), None);
        assert_eq!(series_key("abc-def-ghi@example.org"), None);
        assert_eq!(series_key("plain@example.org"), None);
    }

    #[test]
    fn groups_by_message_id_stem() {
        let index = index_of(vec![
            patch_record("1000.1-2-dev@example.org", 1, 2, 2, day(2)),
            patch_record("1000.1-1-dev@example.org", 1, 1, 2, day(1)),
            patch_record("2000.9-1-other@example.org", 1, 1, 2, day(1)),
        ]);

        let groups = group_patch_series(&index);
        assert_eq!(groups.len(), 1);
        let members = &groups["1000.1-dev@example.org"];
        assert_eq!(members[0].message_id, "1000.1-1-dev@example.org");
        assert_eq!(members[1].message_id, "1000.1-2-dev@example.org");
    }

    #[test]
    fn falls_back_to_coarse_key_when_no_stem_group() {
        let index = index_of(vec![
            patch_record("a@example.org", 2, 1, 3, day(1)),
            patch_record("b@example.org", 2, 2, 3, day(2)),
            patch_record("c@example.org", 1, 1, 1, day(3)),
        ]);

        let groups = group_patch_series(&index);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["v2_3patches"].len(), 2);
    }
}
