use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// An entity that can be tracked across snapshots by a stable identity key.
pub trait Keyed {
    type Key: Eq + Hash + Clone + Debug;

    fn key(&self) -> Self::Key;
}

/// The add/update/remove delta produced by one reconciliation pass.
///
/// No ordering guarantee; display ordering is the presentation layer's job.
#[derive(Debug, Clone)]
pub struct ChangeSet<V: Keyed> {
    pub inserted: Vec<V>,
    pub updated: Vec<V>,
    pub removed: Vec<V::Key>,
}

impl<V: Keyed> Default for ChangeSet<V> {
    fn default() -> Self {
        Self {
            inserted: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<V: Keyed> ChangeSet<V> {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Identity-keyed entity table kept in sync by mark-sweep reconciliation.
///
/// Each pass marks every existing entry unused, updates or inserts entries
/// for the fresh set, then sweeps the still-unused entries as removals. This
/// lets a presentation layer refresh rows in place instead of rebuilding the
/// whole view on every tick.
pub struct ReconcilingMap<V: Keyed> {
    entries: HashMap<V::Key, V>,
}

impl<V: Keyed + Clone> ReconcilingMap<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &V::Key) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &V::Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    /// Diff `fresh` against the current entries and mutate the table to match.
    ///
    /// An entity whose key is already present updates that slot in place; an
    /// unknown key inserts; keys absent from `fresh` are removed. If a key
    /// occurs twice in one pass the last write wins and is recorded once.
    pub fn reconcile(&mut self, fresh: impl IntoIterator<Item = V>) -> ChangeSet<V> {
        let mut unused: HashSet<V::Key> = self.entries.keys().cloned().collect();
        let mut changes = ChangeSet::default();

        for entity in fresh {
            let key = entity.key();
            let was_known = unused.remove(&key);
            match self.entries.entry(key) {
                Entry::Occupied(mut slot) => {
                    slot.insert(entity.clone());
                    if was_known {
                        changes.updated.push(entity);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(entity.clone());
                    changes.inserted.push(entity);
                }
            }
        }

        for key in unused {
            if self.entries.remove(&key).is_some() {
                changes.removed.push(key);
            }
        }

        changes
    }
}

impl<V: Keyed + Clone> Default for ReconcilingMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: &'static str,
        value: u32,
    }

    impl Keyed for Row {
        type Key = &'static str;

        fn key(&self) -> &'static str {
            self.id
        }
    }

    fn row(id: &'static str, value: u32) -> Row {
        Row { id, value }
    }

    #[test]
    fn insert_update_remove() {
        let mut table = ReconcilingMap::new();
        table.reconcile(vec![row("a", 1), row("b", 2), row("c", 3)]);

        let changes = table.reconcile(vec![row("b", 20), row("c", 30), row("d", 4)]);

        assert_eq!(changes.inserted, vec![row("d", 4)]);
        let mut updated_keys: Vec<_> = changes.updated.iter().map(|r| r.id).collect();
        updated_keys.sort();
        assert_eq!(updated_keys, vec!["b", "c"]);
        assert_eq!(changes.removed, vec!["a"]);

        assert_eq!(table.len(), 3);
        assert!(!table.contains(&"a"));
        assert_eq!(table.get(&"b"), Some(&row("b", 20)));
        assert_eq!(table.get(&"c"), Some(&row("c", 30)));
        assert_eq!(table.get(&"d"), Some(&row("d", 4)));
    }

    #[test]
    fn identical_fresh_set_is_idempotent() {
        let mut table = ReconcilingMap::new();
        let fresh = vec![row("a", 1), row("b", 2)];
        table.reconcile(fresh.clone());

        let changes = table.reconcile(fresh);

        assert!(changes.inserted.is_empty());
        assert!(changes.removed.is_empty());
        assert_eq!(changes.updated.len(), 2);
    }

    #[test]
    fn first_pass_inserts_everything() {
        let mut table = ReconcilingMap::new();
        let changes = table.reconcile(vec![row("a", 1), row("b", 2)]);

        assert_eq!(changes.inserted.len(), 2);
        assert!(changes.updated.is_empty());
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn empty_fresh_set_removes_everything() {
        let mut table = ReconcilingMap::new();
        table.reconcile(vec![row("a", 1)]);

        let changes = table.reconcile(vec![]);

        assert_eq!(changes.removed, vec!["a"]);
        assert!(table.is_empty());
    }

    #[test]
    fn duplicate_key_in_one_pass_keeps_last_write() {
        let mut table = ReconcilingMap::new();
        let changes = table.reconcile(vec![row("a", 1), row("a", 2)]);

        assert_eq!(changes.inserted.len(), 1);
        assert!(changes.updated.is_empty());
        assert_eq!(table.get(&"a"), Some(&row("a", 2)));
    }
}
