//! Replaceable parent/child linking table
//!
//! Edges between messages are kept here, keyed by Message-ID, instead of on
//! the message records themselves. The relationship linker fills the table
//! from reply headers; root identification may later rewrite edges (patch
//! series grouping) without mutating any record.

use std::collections::{HashMap, HashSet};

/// Linking state of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkEntry {
    /// Message-ID of the parent (None for parentless messages)
    pub parent: Option<String>,

    /// Child Message-IDs, kept sorted
    pub children: Vec<String>,

    /// Reply depth (0 for parentless messages)
    pub depth: u32,
}

impl LinkEntry {
    /// Add a child (avoiding duplicates)
    fn add_child(&mut self, child_msg_id: &str) {
        if let Err(position) = self
            .children
            .binary_search_by(|existing| existing.as_str().cmp(child_msg_id))
        {
            self.children.insert(position, child_msg_id.to_string());
        }
    }

    fn remove_child(&mut self, child_msg_id: &str) {
        self.children.retain(|existing| existing != child_msg_id);
    }
}

/// Edge table for one threading run.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    entries: HashMap<String, LinkEntry>,
}

impl LinkTable {
    /// Create a table with one unlinked entry per Message-ID.
    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = ids
            .into_iter()
            .map(|id| (id.into(), LinkEntry::default()))
            .collect();
        LinkTable { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, msg_id: &str) -> bool {
        self.entries.contains_key(msg_id)
    }

    pub fn get(&self, msg_id: &str) -> Option<&LinkEntry> {
        self.entries.get(msg_id)
    }

    pub fn parent_of(&self, msg_id: &str) -> Option<&str> {
        self.entries
            .get(msg_id)
            .and_then(|entry| entry.parent.as_deref())
    }

    pub fn children_of(&self, msg_id: &str) -> &[String] {
        self.entries
            .get(msg_id)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn depth_of(&self, msg_id: &str) -> u32 {
        self.entries.get(msg_id).map(|entry| entry.depth).unwrap_or(0)
    }

    /// Attach `child` under `parent`, replacing any previous parent of `child`.
    ///
    /// Returns false (and changes nothing) for self links or unknown ids.
    pub fn link(&mut self, child_msg_id: &str, parent_msg_id: &str) -> bool {
        if child_msg_id == parent_msg_id
            || !self.entries.contains_key(child_msg_id)
            || !self.entries.contains_key(parent_msg_id)
        {
            return false;
        }

        self.detach(child_msg_id);

        if let Some(child) = self.entries.get_mut(child_msg_id) {
            child.parent = Some(parent_msg_id.to_string());
        }
        if let Some(parent) = self.entries.get_mut(parent_msg_id) {
            parent.add_child(child_msg_id);
        }
        true
    }

    /// Remove the edge between `child` and its parent, if any.
    pub fn detach(&mut self, child_msg_id: &str) {
        let previous_parent = self
            .entries
            .get_mut(child_msg_id)
            .and_then(|entry| entry.parent.take());

        if let Some(previous_parent) = previous_parent {
            if let Some(parent) = self.entries.get_mut(&previous_parent) {
                parent.remove_child(child_msg_id);
            }
        }
    }

    /// Message-IDs without a parent, sorted.
    pub fn parentless_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.parent.is_none())
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Recompute every reply depth from the parentless messages downward.
    ///
    /// Uses an explicit stack with a visited set; messages only reachable
    /// through a reply cycle are left at depth 0.
    pub fn recompute_depths(&mut self) {
        for entry in self.entries.values_mut() {
            entry.depth = 0;
        }

        let mut stack: Vec<(String, u32)> = self
            .parentless_ids()
            .into_iter()
            .map(|id| (id.to_string(), 0))
            .collect();
        let mut visited: HashSet<String> = HashSet::with_capacity(self.entries.len());

        while let Some((msg_id, depth)) = stack.pop() {
            if !visited.insert(msg_id.clone()) {
                continue;
            }
            let children = match self.entries.get_mut(&msg_id) {
                Some(entry) => {
                    entry.depth = depth;
                    entry.children.clone()
                }
                None => continue,
            };
            for child in children.into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    /// Register a child without maintaining the child's parent pointer.
    ///
    /// Only used by tests that need a corrupted table.
    #[cfg(test)]
    pub(crate) fn push_child_unchecked(&mut self, parent_msg_id: &str, child_msg_id: &str) {
        if let Some(parent) = self.entries.get_mut(parent_msg_id) {
            parent.add_child(child_msg_id);
        }
    }
}
