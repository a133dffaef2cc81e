use alloc::vec::Vec;

use super::node::RbNode;
use super::tree::RedBlackTree;
use crate::Cursor;

fn split_mut<K, V>(node: &mut RbNode<K, V>) -> (&K, &mut V) {
    (&node.key, &mut node.val)
}

/// Forward/reverse reference iterator over an [`OrderedMap`](crate::OrderedMap)
/// or [`OrderedSet`](crate::OrderedSet).
pub struct Iter<'a, K: Ord, V> {
    tree: &'a RedBlackTree<K, V>,
    front: Cursor,
    back: Cursor,
}

impl<'a, K: Ord, V> Iter<'a, K, V> {
    pub(super) fn new(tree: &'a RedBlackTree<K, V>) -> Self {
        Iter {
            tree,
            front: tree.first(),
            back: tree.last(),
        }
    }
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self.front {
            Cursor::Node(_) => {
                let kv = self.tree.key_value_at(self.front);
                if self.front == self.back {
                    self.front = Cursor::End;
                    self.back = Cursor::Rend;
                } else {
                    self.front = self.tree.next(self.front);
                }
                kv
            }
            _ => None,
        }
    }
}

impl<'a, K: Ord, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.back {
            Cursor::Node(_) => {
                let kv = self.tree.key_value_at(self.back);
                if self.front == self.back {
                    self.front = Cursor::End;
                    self.back = Cursor::Rend;
                } else {
                    self.back = self.tree.prev(self.back);
                }
                kv
            }
            _ => None,
        }
    }
}

/// Mutable reference iterator.
///
/// Built eagerly rather than lazily: every arena slot is visited once up
/// front to hand out its `(&K, &mut V)` pair in key order, since walking
/// the tree lazily while also giving out a long-lived `&mut V` would need
/// two live mutable borrows of the same arena alive at once.
pub struct IterMut<'a, K: Ord, V> {
    items: alloc::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K: Ord, V> IterMut<'a, K, V> {
    pub(super) fn new(tree: &'a mut RedBlackTree<K, V>) -> Self {
        let order = tree.inorder_indices();
        let mut slots: Vec<Option<&'a mut RbNode<K, V>>> =
            tree.arena_slots_mut().iter_mut().map(Option::as_mut).collect();
        let mut items = Vec::with_capacity(order.len());
        for idx in order {
            let node = slots[idx].take().expect("inorder index refers to a live node");
            items.push(split_mut(node));
        }
        IterMut { items: items.into_iter() }
    }
}

impl<'a, K: Ord, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}

impl<'a, K: Ord, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.items.next_back()
    }
}

/// Consuming iterator over an [`OrderedMap`](crate::OrderedMap) or
/// [`OrderedSet`](crate::OrderedSet), forward order.
pub struct ConsumingIter<K: Ord, V>(RedBlackTree<K, V>);

impl<K: Ord, V> ConsumingIter<K, V> {
    pub(super) fn new(tree: RedBlackTree<K, V>) -> Self {
        ConsumingIter(tree)
    }
}

impl<K: Ord, V> Iterator for ConsumingIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop_first()
    }
}

impl<K: Ord, V> DoubleEndedIterator for ConsumingIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.pop_last()
    }
}
