use core::borrow::Borrow;
use core::fmt::{self, Debug};
use core::iter::FromIterator;
use core::ops::Index;

use crate::error::TryReserveError;
use crate::tree::iter::{ConsumingIter, Iter, IterMut};
use crate::tree::tree::RedBlackTree;
use crate::Cursor;

/// Ordered key/value map, backed by a red-black tree.
///
/// Unlike [`HashMap`](crate::HashMap), iteration order is always ascending
/// key order, and [`bounded_first`](OrderedMap::bounded_first)/
/// [`bounded_last`](OrderedMap::bounded_last) give ordered lookups a hash
/// table can't.
pub struct OrderedMap<K: Ord, V> {
    tree: RedBlackTree<K, V>,
}

impl<K: Ord, V> OrderedMap<K, V> {
    /// Constructs a new, empty map. No allocation occurs until the first insert.
    pub fn new() -> Self {
        OrderedMap { tree: RedBlackTree::new() }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_key_value(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Inserts `(key, val)`, returning the previous value for `key`, if any.
    pub fn insert(&mut self, key: K, val: V) -> Result<Option<V>, TryReserveError> {
        self.tree.insert(key, val)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove_entry(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key)
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `default` first if the key isn't already present. An existing entry
    /// is left untouched — `default` is simply dropped rather than
    /// overwriting it.
    pub fn get_or_insert(&mut self, key: K, default: V) -> Result<&mut V, TryReserveError> {
        self.tree.get_or_insert(key, default)
    }

    /// Removes the entry at `it` (a cursor previously obtained from this
    /// map), returning the removed entry and a cursor to resume iteration
    /// from.
    pub fn erase_at(&mut self, it: Cursor) -> (Option<(K, V)>, Cursor) {
        self.tree.remove_at(it)
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.key_value_at(self.tree.first())
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.key_value_at(self.tree.last())
    }

    pub fn first_key(&self) -> Option<&K> {
        self.first_key_value().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&K> {
        self.last_key_value().map(|(k, _)| k)
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    /// Smallest-key cursor `>= key` (the `end` cursor if none).
    pub fn bounded_first<Q>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.bounded_first(key)
    }

    /// Largest-key cursor `<= key` (the `rend` cursor if none).
    pub fn bounded_last<Q>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.bounded_last(key)
    }

    /// Entry at a cursor previously obtained from this map, or `None` if it
    /// is `rend`/`end`.
    pub fn key_value_at(&self, it: Cursor) -> Option<(&K, &V)> {
        self.tree.key_value_at(it)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.tree)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.tree)
    }

    /// Visits every entry in ascending key order, removing those for which
    /// `f` returns `false`.
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&mut self, mut f: F) {
        let mut it = self.tree.first();
        while let Cursor::Node(_) = it {
            let keep = {
                let (k, v) = self.tree.key_value_mut_at(it).expect("it is a live Node cursor");
                f(k, v)
            };
            it = if keep {
                self.tree.next(it)
            } else {
                let (_, next) = self.tree.remove_at(it);
                next
            };
        }
    }

    /// Moves every entry out of `other` and into `self`, leaving `other` empty.
    pub fn append(&mut self, other: &mut Self) -> Result<(), TryReserveError> {
        let taken = core::mem::replace(other, OrderedMap::new());
        for (k, v) in taken {
            self.insert(k, v)?;
        }
        Ok(())
    }

    /// Splits `self` in two: keys `< key` stay, keys `>= key` move into the
    /// returned map.
    pub fn split_off<Q>(&mut self, key: &Q) -> Result<Self, TryReserveError>
    where
        K: Borrow<Q> + Clone,
        V: Clone,
        Q: Ord + ?Sized,
    {
        let mut high = OrderedMap::new();
        let mut it = self.tree.bounded_first(key);
        let mut to_move = alloc::vec::Vec::new();
        while let Cursor::Node(_) = it {
            let (k, _) = self.tree.key_value_at(it).expect("live cursor");
            to_move.push(k.clone());
            it = self.tree.next(it);
        }
        for k in to_move {
            if let Some(v) = self.tree.remove(&k) {
                high.insert(k, v)?;
            }
        }
        Ok(high)
    }

    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        K: Clone,
        V: Clone,
    {
        Ok(OrderedMap { tree: self.tree.try_clone()? })
    }
}

impl<K: Ord, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for OrderedMap<K, V> {
    fn clone(&self) -> Self {
        self.try_clone()
            .expect("OrderedMap::clone: allocation failure; use try_clone to handle fallibly")
    }
}

impl<K: Ord + Debug, V: Debug> Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, Q, V> Index<&Q> for OrderedMap<K, V>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Output = V;
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("OrderedMap: no entry found for key")
    }
}

impl<K: Ord, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}
impl<K: Ord, V: Eq> Eq for OrderedMap<K, V> {}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v).expect("OrderedMap::from_iter: allocation failure");
        }
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v).expect("OrderedMap::extend: allocation failure");
        }
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a mut OrderedMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K: Ord, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = ConsumingIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        ConsumingIter::new(self.tree)
    }
}

#[cfg(test)]
mod test {
    use super::OrderedMap;
    use alloc::vec::Vec;

    #[test]
    fn insert_ordered_iteration() {
        let mut m = OrderedMap::new();
        for k in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
            m.insert(k, k * 10).unwrap();
        }
        let got: Vec<i32> = m.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, (1..=9).collect::<Vec<i32>>());
    }

    #[test]
    fn first_last_pop() {
        let mut m: OrderedMap<i32, i32> = (0..5).map(|i| (i, i)).collect();
        assert_eq!(m.first_key(), Some(&0));
        assert_eq!(m.last_key(), Some(&4));
        assert_eq!(m.pop_first(), Some((0, 0)));
        assert_eq!(m.pop_last(), Some((4, 4)));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn bounded_first_last() {
        let m: OrderedMap<i32, i32> = [0, 3, 6, 9].iter().map(|&k| (k, k)).collect();

        // Exact miss: boundedFirst(2) lands on 3, boundedLast(2) lands on 0.
        assert_eq!(m.get_key_value(&2), None);
        assert_eq!(m.key_value_at(m.bounded_first(&2)), Some((&3, &3)));
        assert_eq!(m.key_value_at(m.bounded_last(&2)), Some((&0, &0)));

        // Exact hit: both bounds land on the matching key itself.
        assert_eq!(m.key_value_at(m.bounded_first(&6)), Some((&6, &6)));
        assert_eq!(m.key_value_at(m.bounded_last(&6)), Some((&6, &6)));

        // Past either end: no such element.
        assert_eq!(m.key_value_at(m.bounded_first(&100)), None);
        assert_eq!(m.key_value_at(m.bounded_last(&-1)), None);
    }

    #[test]
    fn get_or_insert_leaves_existing_untouched() {
        let mut m = OrderedMap::new();
        m.insert(1, "a").unwrap();
        assert_eq!(*m.get_or_insert(1, "z").unwrap(), "a");
        assert_eq!(*m.get_or_insert(2, "b").unwrap(), "b");
        assert_eq!(m.get(&2), Some(&"b"));
    }

    #[test]
    fn erase_at_resumes_at_successor() {
        let mut m: OrderedMap<i32, i32> = (0..5).map(|i| (i, i)).collect();
        let it = m.bounded_first(&2);
        let (removed, resume) = m.erase_at(it);
        assert_eq!(removed, Some((2, 2)));
        assert_eq!(m.key_value_at(resume), Some((&3, &3)));
        assert_eq!(m.len(), 4);
    }

    #[test]
    fn retain_even_keys() {
        let mut m: OrderedMap<i32, i32> = (0..10).map(|i| (i, i)).collect();
        m.retain(|k, _| k % 2 == 0);
        assert_eq!(m.len(), 5);
        let got: Vec<i32> = m.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, alloc::vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn append_moves_entries() {
        let mut a: OrderedMap<i32, i32> = (0..3).map(|i| (i, i)).collect();
        let mut b: OrderedMap<i32, i32> = (3..6).map(|i| (i, i)).collect();
        a.append(&mut b).unwrap();
        assert!(b.is_empty());
        assert_eq!(a.len(), 6);
        let got: Vec<i32> = a.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, (0..6).collect::<Vec<i32>>());
    }

    #[test]
    fn split_off_partitions_by_key() {
        let mut m: OrderedMap<i32, i32> = (0..10).map(|i| (i, i)).collect();
        let high = m.split_off(&5).unwrap();
        let lo: Vec<i32> = m.iter().map(|(k, _)| *k).collect();
        let hi: Vec<i32> = high.iter().map(|(k, _)| *k).collect();
        assert_eq!(lo, alloc::vec![0, 1, 2, 3, 4]);
        assert_eq!(hi, alloc::vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn differential_against_insertion_and_removal_order() {
        use std::collections::BTreeMap;
        let mut mine = OrderedMap::new();
        let mut oracle: BTreeMap<i32, i32> = BTreeMap::new();
        for i in 0..300 {
            let k = (i * 13) % 151;
            mine.insert(k, i).unwrap();
            oracle.insert(k, i);
        }
        for i in 0..151 {
            if i % 4 == 0 {
                assert_eq!(mine.remove(&i), oracle.remove(&i));
            }
        }
        let mine_entries: Vec<(i32, i32)> = mine.iter().map(|(k, v)| (*k, *v)).collect();
        let oracle_entries: Vec<(i32, i32)> = oracle.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(mine_entries, oracle_entries);
    }

    // Randomized insert/remove interleaving, checked against `BTreeMap`.
    #[test]
    fn randomized_differential_fuzz() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};
        use std::collections::BTreeMap;

        let mut mine = OrderedMap::new();
        let mut oracle: BTreeMap<i32, i32> = BTreeMap::new();
        let mut rng = SmallRng::seed_from_u64(0xC0FFEE);

        for i in 0..2000 {
            let key: i32 = rng.gen_range(0, 500);
            if rng.gen_bool(0.7) {
                mine.insert(key, i).unwrap();
                oracle.insert(key, i);
            } else {
                assert_eq!(mine.remove(&key), oracle.remove(&key));
            }
        }

        let mine_entries: Vec<(i32, i32)> = mine.iter().map(|(k, v)| (*k, *v)).collect();
        let oracle_entries: Vec<(i32, i32)> = oracle.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(mine_entries, oracle_entries);
    }
}
