use core::borrow::Borrow;
use core::fmt::{self, Debug};
use core::iter::FromIterator;

use crate::error::TryReserveError;
use crate::tree::tree::RedBlackTree;
use crate::Cursor;

/// Ordered set of unique elements, backed by the same red-black tree engine
/// as [`OrderedMap`](crate::OrderedMap) — here the element doubles as its
/// own key, with the tree's value slot instantiated to `()`.
pub struct OrderedSet<T: Ord> {
    tree: RedBlackTree<T, ()>,
}

impl<T: Ord> OrderedSet<T> {
    pub fn new() -> Self {
        OrderedSet { tree: RedBlackTree::new() }
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

    pub fn contains<Q>(&self, v: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(v)
    }

    pub fn get<Q>(&self, v: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_key_value(v).map(|(k, _)| k)
    }

    /// Inserts `v`. Returns `true` if it was newly inserted, `false` if an
    /// equal element was already present (left unchanged, matching
    /// `std::collections::BTreeSet`'s convention of not overwriting on set
    /// insert).
    pub fn insert(&mut self, v: T) -> Result<bool, TryReserveError> {
        Ok(self.tree.insert(v, ())?.is_none())
    }

    pub fn remove<Q>(&mut self, v: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(v).is_some()
    }

    /// Returns a reference to `v` in the set, inserting it first if not
    /// already present. An existing element is left untouched.
    pub fn get_or_insert(&mut self, v: T) -> Result<&T, TryReserveError> {
        Ok(self.tree.get_or_insert_entry(v, ())?.0)
    }

    /// Removes the element at `it` (a cursor previously obtained from this
    /// set), returning the removed element and a cursor to resume iteration
    /// from.
    pub fn erase_at(&mut self, it: Cursor) -> (Option<T>, Cursor) {
        let (removed, next) = self.tree.remove_at(it);
        (removed.map(|(k, _)| k), next)
    }

    pub fn first(&self) -> Option<&T> {
        self.tree.key_value_at(self.tree.first()).map(|(k, _)| k)
    }

    pub fn last(&self) -> Option<&T> {
        self.tree.key_value_at(self.tree.last()).map(|(k, _)| k)
    }

    pub fn pop_first(&mut self) -> Option<T> {
        self.tree.pop_first().map(|(k, _)| k)
    }

    pub fn pop_last(&mut self) -> Option<T> {
        self.tree.pop_last().map(|(k, _)| k)
    }

    /// Smallest element `>= v`, or `None` if none.
    pub fn bounded_first<Q>(&self, v: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.key_value_at(self.tree.bounded_first(v)).map(|(k, _)| k)
    }

    /// Largest element `<= v`, or `None` if none.
    pub fn bounded_last<Q>(&self, v: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.key_value_at(self.tree.bounded_last(v)).map(|(k, _)| k)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter { tree: &self.tree, front: self.tree.first(), back: self.tree.last() }
    }

    /// Visits every element in ascending order, removing those for which
    /// `f` returns `false`.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) {
        let mut it = self.tree.first();
        while let Cursor::Node(_) = it {
            let keep = f(self.tree.key_value_at(it).expect("live cursor").0);
            it = if keep {
                self.tree.next(it)
            } else {
                let (_, next) = self.tree.remove_at(it);
                next
            };
        }
    }

    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        T: Clone,
    {
        Ok(OrderedSet { tree: self.tree.try_clone()? })
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

impl<T: Ord + Clone> OrderedSet<T> {
    /// Elements in both `self` and `other`, in ascending order.
    pub fn intersection(&self, other: &Self) -> Result<OrderedSet<T>, TryReserveError> {
        let mut out = OrderedSet::new();
        for v in self.iter().filter(|v| other.contains(*v)) {
            out.insert(v.clone())?;
        }
        Ok(out)
    }

    /// Elements in `self` or `other` or both, in ascending order.
    pub fn union(&self, other: &Self) -> Result<OrderedSet<T>, TryReserveError> {
        let mut out = OrderedSet::new();
        for v in self.iter() {
            out.insert(v.clone())?;
        }
        for v in other.iter() {
            out.insert(v.clone())?;
        }
        Ok(out)
    }

    /// Elements in `self` but not in `other`, in ascending order.
    pub fn difference(&self, other: &Self) -> Result<OrderedSet<T>, TryReserveError> {
        let mut out = OrderedSet::new();
        for v in self.iter().filter(|v| !other.contains(*v)) {
            out.insert(v.clone())?;
        }
        Ok(out)
    }

    /// Elements in exactly one of `self` or `other`, in ascending order.
    pub fn symmetric_difference(&self, other: &Self) -> Result<OrderedSet<T>, TryReserveError> {
        let mut out = OrderedSet::new();
        for v in self.iter().filter(|v| !other.contains(*v)) {
            out.insert(v.clone())?;
        }
        for v in other.iter().filter(|v| !self.contains(*v)) {
            out.insert(v.clone())?;
        }
        Ok(out)
    }
}

impl<T: Ord> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Clone for OrderedSet<T> {
    fn clone(&self) -> Self {
        self.try_clone()
            .expect("OrderedSet::clone: allocation failure; use try_clone to handle fallibly")
    }
}

impl<T: Ord + Debug> Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}
impl<T: Ord> Eq for OrderedSet<T> {}

impl<T: Ord> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        for v in iter {
            set.insert(v).expect("OrderedSet::from_iter: allocation failure");
        }
        set
    }
}

impl<T: Ord> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v).expect("OrderedSet::extend: allocation failure");
        }
    }
}

/// Forward/reverse reference iterator over an [`OrderedSet`].
pub struct Iter<'a, T: Ord> {
    tree: &'a RedBlackTree<T, ()>,
    front: Cursor,
    back: Cursor,
}

impl<'a, T: Ord> Iterator for Iter<'a, T> {
    type Item = &'a T;
    fn next(&mut self) -> Option<Self::Item> {
        match self.front {
            Cursor::Node(_) => {
                let k = self.tree.key_value_at(self.front).map(|(k, _)| k);
                if self.front == self.back {
                    self.front = Cursor::End;
                    self.back = Cursor::Rend;
                } else {
                    self.front = self.tree.next(self.front);
                }
                k
            }
            _ => None,
        }
    }
}

impl<'a, T: Ord> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.back {
            Cursor::Node(_) => {
                let k = self.tree.key_value_at(self.back).map(|(k, _)| k);
                if self.front == self.back {
                    self.front = Cursor::End;
                    self.back = Cursor::Rend;
                } else {
                    self.back = self.tree.prev(self.back);
                }
                k
            }
            _ => None,
        }
    }
}

impl<'a, T: Ord> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ConsumingIter<T: Ord>(RedBlackTree<T, ()>);

impl<T: Ord> Iterator for ConsumingIter<T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        self.0.pop_first().map(|(k, _)| k)
    }
}

impl<T: Ord> DoubleEndedIterator for ConsumingIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.0.pop_last().map(|(k, _)| k)
    }
}

impl<T: Ord> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = ConsumingIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        ConsumingIter(self.tree)
    }
}

#[cfg(test)]
mod test {
    use super::OrderedSet;
    use alloc::vec::Vec;

    #[test]
    fn insert_contains_remove_ordered() {
        let mut s = OrderedSet::new();
        for v in [5, 3, 8, 1] {
            s.insert(v).unwrap();
        }
        assert!(!s.insert(3).unwrap());
        assert!(s.contains(&3));
        assert!(s.remove(&3));
        assert!(!s.contains(&3));
        let got: Vec<i32> = s.iter().copied().collect();
        assert_eq!(got, alloc::vec![1, 5, 8]);
    }

    #[test]
    fn set_algebra_ordered() {
        let a: OrderedSet<i32> = (0..10).collect();
        let b: OrderedSet<i32> = (5..15).collect();
        let inter: Vec<i32> = a.intersection(&b).unwrap().iter().copied().collect();
        assert_eq!(inter, alloc::vec![5, 6, 7, 8, 9]);

        let uni: Vec<i32> = a.union(&b).unwrap().iter().copied().collect();
        assert_eq!(uni, (0..15).collect::<Vec<i32>>());

        let diff: Vec<i32> = a.difference(&b).unwrap().iter().copied().collect();
        assert_eq!(diff, alloc::vec![0, 1, 2, 3, 4]);

        assert!(!a.is_disjoint(&b));
        let c: OrderedSet<i32> = (100..105).collect();
        assert!(a.is_disjoint(&c));
    }

    #[test]
    fn bounded_queries() {
        let s: OrderedSet<i32> = [0, 3, 6, 9].iter().copied().collect();
        assert_eq!(s.bounded_first(&2), Some(&3));
        assert_eq!(s.bounded_last(&2), Some(&0));
        assert_eq!(s.bounded_first(&100), None);
        assert_eq!(s.bounded_last(&-1), None);
    }

    #[test]
    fn get_or_insert_leaves_existing_untouched() {
        let mut s = OrderedSet::new();
        s.insert(1).unwrap();
        assert_eq!(*s.get_or_insert(1).unwrap(), 1);
        assert_eq!(*s.get_or_insert(2).unwrap(), 2);
        assert!(s.contains(&2));
    }

    #[test]
    fn erase_at_resumes_at_successor() {
        let mut s: OrderedSet<i32> = (0..5).collect();
        let it = s.tree.bounded_first(&2);
        let (removed, resume) = s.erase_at(it);
        assert_eq!(removed, Some(2));
        assert_eq!(s.tree.key_value_at(resume).map(|(k, _)| *k), Some(3));
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn retain_even() {
        let mut s: OrderedSet<i32> = (0..10).collect();
        s.retain(|v| v % 2 == 0);
        let got: Vec<i32> = s.iter().copied().collect();
        assert_eq!(got, alloc::vec![0, 2, 4, 6, 8]);
    }

    // Randomized insert/remove interleaving, checked against `BTreeSet`.
    #[test]
    fn randomized_differential_fuzz() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};
        use std::collections::BTreeSet;

        let mut mine = OrderedSet::new();
        let mut oracle: BTreeSet<i32> = BTreeSet::new();
        let mut rng = SmallRng::seed_from_u64(0xDEADBEEF);

        for _ in 0..2000 {
            let v: i32 = rng.gen_range(0, 500);
            if rng.gen_bool(0.7) {
                assert_eq!(mine.insert(v).unwrap(), oracle.insert(v));
            } else {
                assert_eq!(mine.remove(&v), oracle.remove(&v));
            }
        }

        let mine_entries: Vec<i32> = mine.iter().copied().collect();
        let oracle_entries: Vec<i32> = oracle.iter().copied().collect();
        assert_eq!(mine_entries, oracle_entries);
    }
}
