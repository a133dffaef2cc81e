use core::borrow::Borrow;
use core::fmt::{self, Debug};
use core::hash::{BuildHasher, Hash};
use core::iter::FromIterator;
use core::ops::Index;

use crate::error::TryReserveError;
use crate::hash::raw::{Insert, RawTable};
use crate::hash::{FnvBuildHasher, HashCursor};

fn entry_key<K, V>(entry: &(K, V)) -> &K {
    &entry.0
}

/// Unordered key/value map, open-addressed via quadratic probing.
///
/// A freshly-constructed map performs no allocation; the first insert
/// promotes it to the minimum table size. Every potentially-allocating
/// operation is fallible through [`insert`](HashMap::insert) and
/// [`reserve`](HashMap::reserve); `S` defaults to [`FnvBuildHasher`] since
/// `no_std` has no OS-seeded `RandomState`.
pub struct HashMap<K, V, S = FnvBuildHasher> {
    table: RawTable<(K, V), K, S>,
}

impl<K: Hash + Eq, V> HashMap<K, V, FnvBuildHasher> {
    /// Constructs a new, empty map using the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher)
    }
}

impl<K: Hash + Eq, V> Default for HashMap<K, V, FnvBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> HashMap<K, V, S> {
    /// Constructs a new, empty map using the given hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        HashMap {
            table: RawTable::new(hash_builder, entry_key),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Ensures the map can hold `additional` more entries without rehashing.
    pub fn reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.reserve(self.table.len() + additional)
    }

    /// Shrinks the table to the smallest capacity that fits the current
    /// length under the load factor.
    pub fn shrink(&mut self) -> Result<(), TryReserveError> {
        self.table.shrink()
    }

    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(k).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_mut(k).map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(k).is_some()
    }

    /// Inserts `(k, v)`, returning the previous value for `k`, if any.
    pub fn insert(&mut self, k: K, v: V) -> Result<Option<V>, TryReserveError> {
        match self.table.insert_grow((k, v), true)? {
            Insert::Inserted(_) => Ok(None),
            Insert::Replaced(_, (_, old_v)) => Ok(Some(old_v)),
            Insert::Occupied(_) => unreachable!("insert always requests replace = true"),
        }
    }

    pub fn remove<Q>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(k).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value for `k`, inserting
    /// `default` first if the key isn't already present. An existing entry
    /// is left untouched — `default` is simply dropped rather than
    /// overwriting it.
    pub fn get_or_insert(&mut self, k: K, default: V) -> Result<&mut V, TryReserveError> {
        let idx = match self.table.insert_grow((k, default), false)? {
            Insert::Inserted(idx) | Insert::Occupied(idx) => idx,
            Insert::Replaced(..) => unreachable!("get_or_insert never requests replace"),
        };
        Ok(&mut self.table.bucket_mut(idx).unwrap().1)
    }

    /// Cursor to the first entry, or the end cursor ([`HashMap::is_end`]) if empty.
    pub fn first_cursor(&self) -> HashCursor {
        HashCursor(self.table.first_index())
    }

    /// Cursor to the entry after `c`, or the end cursor if `c` was last.
    pub fn next_cursor(&self, c: HashCursor) -> HashCursor {
        HashCursor(self.table.next_index(c.0))
    }

    /// `true` if `c` is one past the last entry.
    pub fn is_end(&self, c: HashCursor) -> bool {
        c.0 == self.table.end_index()
    }

    /// Entry at `c`, or `None` if `c` is the end cursor.
    pub fn get_at(&self, c: HashCursor) -> Option<(&K, &V)> {
        self.table.bucket(c.0).map(|(k, v)| (k, v))
    }

    /// Removes the entry at `c`, returning the removed entry (`None` if `c`
    /// was already the end cursor) and a cursor to resume iteration from,
    /// which may equal `c` itself if an unrelated entry got tail-swapped
    /// into its bucket.
    pub fn erase_at(&mut self, c: HashCursor) -> (Option<(K, V)>, HashCursor) {
        if c.0 == self.table.end_index() {
            return (None, c);
        }
        let (removed, next) = self.table.remove_at_index(c.0);
        (Some(removed), HashCursor(next))
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            table: &self.table,
            idx: self.table.first_index(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { inner: self.iter() }
    }

    /// Visits every entry, removing those for which `f` returns `false`.
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&mut self, mut f: F) {
        let mut idx = self.table.first_index();
        while idx != self.table.end_index() {
            let keep = {
                let (k, v) = self.table.bucket_mut(idx).unwrap();
                f(k, v)
            };
            idx = if keep {
                self.table.next_index(idx)
            } else {
                self.table.remove_at_index(idx).1
            };
        }
    }

    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        Ok(HashMap {
            table: self.table.try_clone()?,
        })
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> FromIterator<(K, V)> for HashMap<K, V, S> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HashMap::with_hasher(S::default());
        for (k, v) in iter {
            map.insert(k, v).expect("HashMap::from_iter: allocation failure");
        }
        map
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for HashMap<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v).expect("HashMap::extend: allocation failure");
        }
    }
}

impl<K: Hash + Eq, V: Debug, S> Debug for HashMap<K, V, S>
where
    K: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V, S> Index<&Q> for HashMap<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;
    fn index(&self, k: &Q) -> &V {
        self.get(k).expect("HashMap: no entry found for key")
    }
}

impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> PartialEq for HashMap<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}
impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for HashMap<K, V, S> {}

/// Borrowing iterator over `(&K, &V)` pairs, in bucket order (unspecified,
/// not insertion order).
pub struct Iter<'a, K, V, S> {
    table: &'a RawTable<(K, V), K, S>,
    idx: usize,
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx == self.table.end_index() {
            return None;
        }
        let (k, v) = self.table.bucket(self.idx).unwrap();
        self.idx = self.table.next_index(self.idx);
        Some((k, v))
    }
}

pub struct Keys<'a, K, V, S> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> Iterator for Keys<'a, K, V, S> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

pub struct Values<'a, K, V, S> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> Iterator for Values<'a, K, V, S> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::HashMap;
    use alloc::vec::Vec;

    #[test]
    fn insert_get_remove() {
        let mut m = HashMap::new();
        assert_eq!(m.insert("a", 1).unwrap(), None);
        assert_eq!(m.insert("b", 2).unwrap(), None);
        assert_eq!(m.insert("a", 10).unwrap(), Some(1));
        assert_eq!(*m.get("a").unwrap(), 10);
        assert_eq!(m.remove("b"), Some(2));
        assert!(m.get("b").is_none());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn grows_past_many_collisions() {
        let mut m = HashMap::new();
        for i in 0..500 {
            m.insert(i, i * 2).unwrap();
        }
        assert_eq!(m.len(), 500);
        for i in 0..500 {
            assert_eq!(*m.get(&i).unwrap(), i * 2);
        }
    }

    #[test]
    fn get_or_insert_leaves_existing_untouched() {
        let mut m = HashMap::new();
        m.insert("a", 1).unwrap();
        assert_eq!(*m.get_or_insert("a", 99).unwrap(), 1);
        assert_eq!(*m.get_or_insert("b", 2).unwrap(), 2);
        assert_eq!(m.get("b"), Some(&2));
    }

    #[test]
    fn cursor_walk_and_erase_at() {
        let mut m: HashMap<i32, i32> = (0..10).map(|i| (i, i)).collect();
        let mut seen: Vec<i32> = Vec::new();
        let mut c = m.first_cursor();
        while !m.is_end(c) {
            seen.push(m.get_at(c).unwrap().0.to_owned());
            c = m.next_cursor(c);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<i32>>());

        let mut c = m.first_cursor();
        while !m.is_end(c) {
            let (k, _) = *m.get_at(c).unwrap();
            if k % 2 == 0 {
                let (_, next) = m.erase_at(c);
                c = next;
            } else {
                c = m.next_cursor(c);
            }
        }
        assert_eq!(m.len(), 5);
        for i in 0..10 {
            assert_eq!(m.contains_key(&i), i % 2 != 0);
        }
    }

    #[test]
    fn retain_keeps_matching_entries() {
        let mut m: HashMap<i32, i32> = (0..20).map(|i| (i, i)).collect();
        m.retain(|k, _| k % 2 == 0);
        assert_eq!(m.len(), 10);
        for i in 0..20 {
            assert_eq!(m.contains_key(&i), i % 2 == 0);
        }
    }

    #[test]
    fn differential_against_insertion_and_removal_order() {
        use std::collections::HashMap as StdMap;
        let mut mine = HashMap::new();
        let mut oracle: StdMap<i32, i32> = StdMap::new();
        for i in 0..200 {
            let k = (i * 7) % 97;
            mine.insert(k, i).unwrap();
            oracle.insert(k, i);
        }
        for i in 0..97 {
            if i % 3 == 0 {
                assert_eq!(mine.remove(&i), oracle.remove(&i));
            }
        }
        let mut mine_keys: Vec<i32> = mine.keys().copied().collect();
        let mut oracle_keys: Vec<i32> = oracle.keys().copied().collect();
        mine_keys.sort_unstable();
        oracle_keys.sort_unstable();
        assert_eq!(mine_keys, oracle_keys);
    }

    // Randomized insert/remove interleaving, checked against `std::collections::HashMap`.
    #[test]
    fn randomized_differential_fuzz() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};
        use std::collections::HashMap as StdMap;

        let mut mine = HashMap::new();
        let mut oracle: StdMap<i32, i32> = StdMap::new();
        let mut rng = SmallRng::seed_from_u64(0x5EED5EED);

        for i in 0..2000 {
            let key: i32 = rng.gen_range(0, 500);
            if rng.gen_bool(0.7) {
                mine.insert(key, i).unwrap();
                oracle.insert(key, i);
            } else {
                assert_eq!(mine.remove(&key), oracle.remove(&key));
            }
        }

        let mut mine_keys: Vec<i32> = mine.keys().copied().collect();
        let mut oracle_keys: Vec<i32> = oracle.keys().copied().collect();
        mine_keys.sort_unstable();
        oracle_keys.sort_unstable();
        assert_eq!(mine_keys, oracle_keys);
    }
}
