use core::borrow::Borrow;
use core::fmt::{self, Debug};
use core::hash::{BuildHasher, Hash};
use core::iter::FromIterator;

use crate::error::TryReserveError;
use crate::hash::raw::{Insert, RawTable};
use crate::hash::{FnvBuildHasher, HashCursor};

fn identity<T>(v: &T) -> &T {
    v
}

/// Unordered set of unique elements, open-addressed via quadratic probing.
///
/// Built directly on the same [`RawTable`] engine as [`HashMap`](crate::HashMap)
/// — here the element itself doubles as its own key.
pub struct HashSet<T, S = FnvBuildHasher> {
    table: RawTable<T, T, S>,
}

impl<T: Hash + Eq> HashSet<T, FnvBuildHasher> {
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher)
    }
}

impl<T: Hash + Eq> Default for HashSet<T, FnvBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq, S: BuildHasher> HashSet<T, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        HashSet {
            table: RawTable::new(hash_builder, identity),
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

    pub fn reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.reserve(self.table.len() + additional)
    }

    pub fn shrink(&mut self) -> Result<(), TryReserveError> {
        self.table.shrink()
    }

    pub fn contains<Q>(&self, v: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(v).is_some()
    }

    pub fn get<Q>(&self, v: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(v)
    }

    /// Inserts `v`. Returns `true` if it was newly inserted, `false` if an
    /// equal element was already present (left unchanged, matching
    /// `std::collections::HashSet`'s convention of not overwriting on set
    /// insert).
    pub fn insert(&mut self, v: T) -> Result<bool, TryReserveError> {
        match self.table.insert_grow(v, false)? {
            Insert::Inserted(_) => Ok(true),
            Insert::Occupied(_) => Ok(false),
            Insert::Replaced(..) => unreachable!("set insert never requests replace"),
        }
    }

    pub fn remove<Q>(&mut self, v: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(v).is_some()
    }

    /// Returns a reference to `v` in the set, inserting it first if not
    /// already present. An existing element is left untouched.
    pub fn get_or_insert(&mut self, v: T) -> Result<&T, TryReserveError> {
        let idx = match self.table.insert_grow(v, false)? {
            Insert::Inserted(idx) | Insert::Occupied(idx) => idx,
            Insert::Replaced(..) => unreachable!("get_or_insert never requests replace"),
        };
        Ok(self.table.bucket(idx).unwrap())
    }

    /// Cursor to the first element, or the end cursor ([`HashSet::is_end`]) if empty.
    pub fn first_cursor(&self) -> HashCursor {
        HashCursor(self.table.first_index())
    }

    /// Cursor to the element after `c`, or the end cursor if `c` was last.
    pub fn next_cursor(&self, c: HashCursor) -> HashCursor {
        HashCursor(self.table.next_index(c.0))
    }

    /// `true` if `c` is one past the last element.
    pub fn is_end(&self, c: HashCursor) -> bool {
        c.0 == self.table.end_index()
    }

    /// Element at `c`, or `None` if `c` is the end cursor.
    pub fn get_at(&self, c: HashCursor) -> Option<&T> {
        self.table.bucket(c.0)
    }

    /// Removes the element at `c`, returning the removed element (`None` if
    /// `c` was already the end cursor) and a cursor to resume iteration
    /// from, which may equal `c` itself if an unrelated element got
    /// tail-swapped into its bucket.
    pub fn erase_at(&mut self, c: HashCursor) -> (Option<T>, HashCursor) {
        if c.0 == self.table.end_index() {
            return (None, c);
        }
        let (removed, next) = self.table.remove_at_index(c.0);
        (Some(removed), HashCursor(next))
    }

    pub fn iter(&self) -> Iter<'_, T, S> {
        Iter {
            table: &self.table,
            idx: self.table.first_index(),
        }
    }

    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) {
        let mut idx = self.table.first_index();
        while idx != self.table.end_index() {
            let keep = f(self.table.bucket(idx).unwrap());
            idx = if keep {
                self.table.next_index(idx)
            } else {
                self.table.remove_at_index(idx).1
            };
        }
    }

    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        T: Clone,
        S: Clone,
    {
        Ok(HashSet {
            table: self.table.try_clone()?,
        })
    }

    /// `true` if `self` and `other` share no elements.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.iter().all(|v| !other.contains(v))
    }

    /// `true` if every element of `self` is also in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.iter().all(|v| other.contains(v))
    }

    /// `true` if every element of `other` is also in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

impl<T: Hash + Eq + Clone, S: BuildHasher + Default> HashSet<T, S> {
    /// Elements in both `self` and `other`.
    pub fn intersection(&self, other: &Self) -> Result<HashSet<T, S>, TryReserveError> {
        let mut out = HashSet::with_hasher(S::default());
        for v in self.iter().filter(|v| other.contains(*v)) {
            out.insert(v.clone())?;
        }
        Ok(out)
    }

    /// Elements in `self` or `other` or both.
    pub fn union(&self, other: &Self) -> Result<HashSet<T, S>, TryReserveError> {
        let mut out = HashSet::with_hasher(S::default());
        for v in self.iter().chain(other.iter()) {
            out.insert(v.clone())?;
        }
        Ok(out)
    }

    /// Elements in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Result<HashSet<T, S>, TryReserveError> {
        let mut out = HashSet::with_hasher(S::default());
        for v in self.iter().filter(|v| !other.contains(*v)) {
            out.insert(v.clone())?;
        }
        Ok(out)
    }

    /// Elements in exactly one of `self` or `other`.
    pub fn symmetric_difference(&self, other: &Self) -> Result<HashSet<T, S>, TryReserveError> {
        let mut out = HashSet::with_hasher(S::default());
        for v in self.iter().filter(|v| !other.contains(*v)) {
            out.insert(v.clone())?;
        }
        for v in other.iter().filter(|v| !self.contains(*v)) {
            out.insert(v.clone())?;
        }
        Ok(out)
    }
}

impl<T: Hash + Eq, S: BuildHasher + Default> FromIterator<T> for HashSet<T, S> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = HashSet::with_hasher(S::default());
        for v in iter {
            set.insert(v).expect("HashSet::from_iter: allocation failure");
        }
        set
    }
}

impl<T: Hash + Eq, S: BuildHasher> Extend<T> for HashSet<T, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v).expect("HashSet::extend: allocation failure");
        }
    }
}

impl<T: Hash + Eq + Debug, S> Debug for HashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Hash + Eq, S: BuildHasher> PartialEq for HashSet<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}
impl<T: Hash + Eq, S: BuildHasher> Eq for HashSet<T, S> {}

pub struct Iter<'a, T, S> {
    table: &'a RawTable<T, T, S>,
    idx: usize,
}

impl<'a, T: Hash + Eq, S: BuildHasher> Iterator for Iter<'a, T, S> {
    type Item = &'a T;
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx == self.table.end_index() {
            return None;
        }
        let v = self.table.bucket(self.idx).unwrap();
        self.idx = self.table.next_index(self.idx);
        Some(v)
    }
}

impl<'a, T: Hash + Eq, S: BuildHasher> IntoIterator for &'a HashSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, S>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::HashSet;

    #[test]
    fn insert_contains_remove() {
        let mut s = HashSet::new();
        assert!(s.insert(1).unwrap());
        assert!(s.insert(2).unwrap());
        assert!(!s.insert(1).unwrap());
        assert!(s.contains(&1));
        assert!(s.remove(&1));
        assert!(!s.contains(&1));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn set_algebra() {
        let a: HashSet<i32> = (0..10).collect();
        let b: HashSet<i32> = (5..15).collect();
        let mut inter: Vec<i32> = a.intersection(&b).unwrap().iter().copied().collect();
        inter.sort_unstable();
        assert_eq!(inter, alloc::vec![5, 6, 7, 8, 9]);

        let mut uni: Vec<i32> = a.union(&b).unwrap().iter().copied().collect();
        uni.sort_unstable();
        assert_eq!(uni, (0..15).collect::<Vec<i32>>());

        assert!(a.intersection(&b).unwrap().is_subset(&a));
        assert!(!a.is_disjoint(&b));

        let c: HashSet<i32> = (100..105).collect();
        assert!(a.is_disjoint(&c));
    }

    #[test]
    fn get_or_insert_leaves_existing_untouched() {
        let mut s = HashSet::new();
        s.insert(1).unwrap();
        assert_eq!(*s.get_or_insert(1).unwrap(), 1);
        assert_eq!(*s.get_or_insert(2).unwrap(), 2);
        assert!(s.contains(&2));
    }

    #[test]
    fn cursor_walk_and_erase_at() {
        let mut s: HashSet<i32> = (0..10).collect();
        let mut c = s.first_cursor();
        while !s.is_end(c) {
            let v = *s.get_at(c).unwrap();
            if v % 2 == 0 {
                let (_, next) = s.erase_at(c);
                c = next;
            } else {
                c = s.next_cursor(c);
            }
        }
        assert_eq!(s.len(), 5);
        for i in 0..10 {
            assert_eq!(s.contains(&i), i % 2 != 0);
        }
    }

    #[test]
    fn retain_matches_std_behavior() {
        let mut s: HashSet<i32> = (0..30).collect();
        s.retain(|v| v % 3 == 0);
        assert_eq!(s.len(), 10);
        assert!(s.contains(&0));
        assert!(!s.contains(&1));
    }

    // Randomized insert/remove interleaving, checked against `std::collections::HashSet`.
    #[test]
    fn randomized_differential_fuzz() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};
        use std::collections::HashSet as StdSet;

        let mut mine = HashSet::new();
        let mut oracle: StdSet<i32> = StdSet::new();
        let mut rng = SmallRng::seed_from_u64(0xFACEFEED);

        for _ in 0..2000 {
            let v: i32 = rng.gen_range(0, 500);
            if rng.gen_bool(0.7) {
                assert_eq!(mine.insert(v).unwrap(), oracle.insert(v));
            } else {
                assert_eq!(mine.remove(&v), oracle.remove(&v));
            }
        }

        let mut mine_vals: Vec<i32> = mine.iter().copied().collect();
        let mut oracle_vals: Vec<i32> = oracle.iter().copied().collect();
        mine_vals.sort_unstable();
        oracle_vals.sort_unstable();
        assert_eq!(mine_vals, oracle_vals);
    }
}
