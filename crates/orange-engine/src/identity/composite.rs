//! Composite-key map
//!
//! A trie of [`IdentityMap`]s keyed by an ordered tuple of identities. Each
//! key but the last selects a nested map; the last selects the value.
//! Lookups never create intermediate maps.

use super::{IdentityKey, IdentityMap};

/// Entry stored at one level of the trie
#[derive(Debug)]
pub enum Slot<V> {
    /// Leaf value
    Value(V),
    /// Nested map for longer keys
    Branch(IdentityMap<Slot<V>>),
}

/// Result of a (possibly partial) key lookup
#[derive(Debug)]
pub enum Lookup<'a, V> {
    /// The key addressed a value
    Value(&'a V),
    /// The key is a prefix; this is the intermediate map it addresses
    Branch(&'a IdentityMap<Slot<V>>),
}

/// Map keyed by tuples of identities
#[derive(Debug)]
pub struct CompositeKeyMap<V> {
    root: IdentityMap<Slot<V>>,
}

impl<V> CompositeKeyMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            root: IdentityMap::new(),
        }
    }

    /// Number of stored values (leaves)
    pub fn len(&self) -> usize {
        count_values(&self.root)
    }

    /// Check if no values are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn walk(&self, prefix: &[IdentityKey]) -> Option<&IdentityMap<Slot<V>>> {
        let mut map = &self.root;
        for key in prefix {
            match map.get(key)? {
                Slot::Branch(next) => map = next,
                Slot::Value(_) => return None,
            }
        }
        Some(map)
    }

    /// Look up a full key or a key prefix
    pub fn lookup(&self, keys: &[IdentityKey]) -> Option<Lookup<'_, V>> {
        let (last, prefix) = keys.split_last()?;
        match self.walk(prefix)?.get(last)? {
            Slot::Value(value) => Some(Lookup::Value(value)),
            Slot::Branch(map) => Some(Lookup::Branch(map)),
        }
    }

    /// Value stored under the full key
    pub fn get(&self, keys: &[IdentityKey]) -> Option<&V> {
        match self.lookup(keys)? {
            Lookup::Value(value) => Some(value),
            Lookup::Branch(_) => None,
        }
    }

    /// Value stored under the full key, or `default`
    pub fn get_or<'a>(&'a self, keys: &[IdentityKey], default: &'a V) -> &'a V {
        self.get(keys).unwrap_or(default)
    }

    /// Whether anything (value or intermediate map) is stored under `keys`
    pub fn has(&self, keys: &[IdentityKey]) -> bool {
        self.lookup(keys).is_some()
    }

    /// Store `value` under `keys`, creating intermediate maps as needed.
    ///
    /// A value sitting where an intermediate map is needed is replaced by
    /// one. An empty key stores nothing. Returns the previous value.
    pub fn set(&mut self, keys: &[IdentityKey], value: V) -> Option<V> {
        let (last, prefix) = keys.split_last()?;
        let mut map = &mut self.root;
        for key in prefix {
            let slot = map
                .entries
                .entry(key.clone())
                .or_insert_with(|| Slot::Branch(IdentityMap::new()));
            map = into_branch(slot);
        }
        match map.set(last.clone(), Slot::Value(value)) {
            Some(Slot::Value(previous)) => Some(previous),
            _ => None,
        }
    }

    /// Remove whatever is stored under `keys`
    pub fn delete(&mut self, keys: &[IdentityKey]) -> bool {
        let Some((last, prefix)) = keys.split_last() else {
            return false;
        };
        let mut map = &mut self.root;
        for key in prefix {
            match map.get_mut(key) {
                Some(Slot::Branch(next)) => map = next,
                _ => return false,
            }
        }
        map.delete(last)
    }

    /// Drop entries at any level whose key is no longer reachable, and
    /// intermediate maps left empty. Returns the number of values removed.
    pub fn purge(&mut self) -> usize {
        purge_map(&mut self.root)
    }
}

impl<V> Default for CompositeKeyMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn into_branch<V>(slot: &mut Slot<V>) -> &mut IdentityMap<Slot<V>> {
    if let Slot::Value(_) = slot {
        *slot = Slot::Branch(IdentityMap::new());
    }
    match slot {
        Slot::Branch(map) => map,
        Slot::Value(_) => unreachable!("slot was converted to a branch above"),
    }
}

fn count_values<V>(map: &IdentityMap<Slot<V>>) -> usize {
    map.iter()
        .map(|(_, slot)| match slot {
            Slot::Value(_) => 1,
            Slot::Branch(inner) => count_values(inner),
        })
        .sum()
}

fn purge_map<V>(map: &mut IdentityMap<Slot<V>>) -> usize {
    let mut removed = 0;
    map.retain(|key, slot| {
        if !key.is_live() {
            removed += match slot {
                Slot::Value(_) => 1,
                Slot::Branch(inner) => count_values(inner),
            };
            return false;
        }
        match slot {
            Slot::Value(_) => true,
            Slot::Branch(inner) => {
                removed += purge_map(inner);
                !inner.is_empty()
            }
        }
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRef;

    fn key(obj: &ObjectRef, name: &str) -> [IdentityKey; 2] {
        [IdentityKey::object(obj), IdentityKey::string(name)]
    }

    #[test]
    fn test_set_and_get_full_key() {
        let mut map = CompositeKeyMap::new();
        let owner = ObjectRef::plain();

        map.set(&key(&owner, "x"), 10);
        map.set(&key(&owner, "y"), 20);

        assert_eq!(map.get(&key(&owner, "x")), Some(&10));
        assert_eq!(map.get(&key(&owner, "y")), Some(&20));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_set_returns_previous_value() {
        let mut map = CompositeKeyMap::new();
        let owner = ObjectRef::plain();

        assert_eq!(map.set(&key(&owner, "x"), 1), None);
        assert_eq!(map.set(&key(&owner, "x"), 2), Some(1));
    }

    #[test]
    fn test_prefix_lookup_returns_intermediate_map() {
        let mut map = CompositeKeyMap::new();
        let owner = ObjectRef::plain();
        map.set(&key(&owner, "x"), 10);

        let prefix = [IdentityKey::object(&owner)];
        match map.lookup(&prefix) {
            Some(Lookup::Branch(inner)) => assert_eq!(inner.len(), 1),
            other => panic!("Expected branch, got {:?}", other),
        }
        assert_eq!(map.get(&prefix), None);
        assert!(map.has(&prefix));
    }

    #[test]
    fn test_reads_do_not_create_intermediate_maps() {
        let map: CompositeKeyMap<i32> = CompositeKeyMap::new();
        let owner = ObjectRef::plain();

        assert_eq!(map.get(&key(&owner, "x")), None);
        assert!(!map.has(&key(&owner, "x")));
        assert!(map.root.is_empty());
    }

    #[test]
    fn test_distinct_owners_do_not_collide() {
        let mut map = CompositeKeyMap::new();
        let a = ObjectRef::plain();
        let b = ObjectRef::plain();

        map.set(&key(&a, "x"), "a");
        assert_eq!(map.get(&key(&b, "x")), None);
        assert_eq!(*map.get_or(&key(&b, "x"), &"default"), "default");
    }

    #[test]
    fn test_delete() {
        let mut map = CompositeKeyMap::new();
        let owner = ObjectRef::plain();
        map.set(&key(&owner, "x"), 1);

        assert!(map.delete(&key(&owner, "x")));
        assert!(!map.delete(&key(&owner, "x")));
        assert!(!map.delete(&[]));
        assert_eq!(map.get(&key(&owner, "x")), None);
    }

    #[test]
    fn test_empty_key_stores_nothing() {
        let mut map = CompositeKeyMap::new();
        assert_eq!(map.set(&[], 1), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_purge_removes_dead_owner_branches() {
        let mut map = CompositeKeyMap::new();
        let kept = ObjectRef::plain();
        let dropped = ObjectRef::plain();
        map.set(&key(&kept, "x"), 1);
        map.set(&key(&dropped, "x"), 2);
        map.set(&key(&dropped, "y"), 3);
        drop(dropped);

        assert_eq!(map.purge(), 2);
        assert_eq!(map.len(), 1);
        assert_eq!(map.root.len(), 1);
    }
}
