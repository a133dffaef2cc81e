use core::borrow::Borrow;
use core::cmp::Ordering;

use super::arena::NodeArena;
use super::node::{Color, RbNode};
use crate::error::TryReserveError;
use crate::Cursor;

/// Node-based, true red-black tree: every node carries a parent pointer and
/// a colour bit (by arena index, not a raw pointer). Kept balanced by
/// standard insert/erase fixups rather than the whole-subtree rebuilds a
/// scapegoat tree uses — this engine favours pointer-stable iterators
/// across erasure over amortized-rebuild simplicity.
pub(crate) struct RedBlackTree<K, V> {
    arena: NodeArena<K, V>,
    root: Option<usize>,
    len: usize,
}

enum Existing<V> {
    Inserted(usize),
    Occupied(usize, V),
}

impl<K: Ord, V> RedBlackTree<K, V> {
    pub fn new() -> Self {
        RedBlackTree {
            arena: NodeArena::new(),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.arena = NodeArena::new();
        self.root = None;
        self.len = 0;
    }

    fn color_of(&self, idx: Option<usize>) -> Color {
        idx.map(|i| self.arena.get(i).color).unwrap_or(Color::Black)
    }

    fn set_color(&mut self, idx: usize, c: Color) {
        self.arena.get_mut(idx).color = c;
    }

    fn minimum(&self, mut idx: usize) -> usize {
        while let Some(l) = self.arena.get(idx).left {
            idx = l;
        }
        idx
    }

    fn maximum(&self, mut idx: usize) -> usize {
        while let Some(r) = self.arena.get(idx).right {
            idx = r;
        }
        idx
    }

    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        while let Some(idx) = cur {
            let node = self.arena.get(idx);
            match key.cmp(node.key.borrow()) {
                Ordering::Equal => return Some(idx),
                Ordering::Less => cur = node.left,
                Ordering::Greater => cur = node.right,
            }
        }
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|idx| &self.arena.get(idx).val)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|idx| {
            let node = self.arena.get(idx);
            (&node.key, &node.val)
        })
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find(key)?;
        Some(&mut self.arena.get_mut(idx).val)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.arena.get(x).right.expect("rotate_left requires a right child");
        let y_left = self.arena.get(y).left;
        self.arena.get_mut(x).right = y_left;
        if let Some(yl) = y_left {
            self.arena.get_mut(yl).parent = Some(x);
        }
        let xp = self.arena.get(x).parent;
        self.arena.get_mut(y).parent = xp;
        match xp {
            None => self.root = Some(y),
            Some(p) => {
                if self.arena.get(p).left == Some(x) {
                    self.arena.get_mut(p).left = Some(y);
                } else {
                    self.arena.get_mut(p).right = Some(y);
                }
            }
        }
        self.arena.get_mut(y).left = Some(x);
        self.arena.get_mut(x).parent = Some(y);
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.arena.get(x).left.expect("rotate_right requires a left child");
        let y_right = self.arena.get(y).right;
        self.arena.get_mut(x).left = y_right;
        if let Some(yr) = y_right {
            self.arena.get_mut(yr).parent = Some(x);
        }
        let xp = self.arena.get(x).parent;
        self.arena.get_mut(y).parent = xp;
        match xp {
            None => self.root = Some(y),
            Some(p) => {
                if self.arena.get(p).left == Some(x) {
                    self.arena.get_mut(p).left = Some(y);
                } else {
                    self.arena.get_mut(p).right = Some(y);
                }
            }
        }
        self.arena.get_mut(y).right = Some(x);
        self.arena.get_mut(x).parent = Some(y);
    }

    fn insert_fixup(&mut self, mut z: usize) {
        loop {
            let zp = match self.arena.get(z).parent {
                Some(p) if self.arena.get(p).color == Color::Red => p,
                _ => break,
            };
            let zpp = self
                .arena
                .get(zp)
                .parent
                .expect("a red node's parent is never the root, so a grandparent exists");

            if Some(zp) == self.arena.get(zpp).left {
                let uncle = self.arena.get(zpp).right;
                if self.color_of(uncle) == Color::Red {
                    self.set_color(zp, Color::Black);
                    self.set_color(uncle.unwrap(), Color::Black);
                    self.set_color(zpp, Color::Red);
                    z = zpp;
                } else {
                    let mut z = z;
                    if self.arena.get(zp).right == Some(z) {
                        z = zp;
                        self.rotate_left(z);
                    }
                    let zp = self.arena.get(z).parent.unwrap();
                    let zpp = self.arena.get(zp).parent.unwrap();
                    self.set_color(zp, Color::Black);
                    self.set_color(zpp, Color::Red);
                    self.rotate_right(zpp);
                }
            } else {
                let uncle = self.arena.get(zpp).left;
                if self.color_of(uncle) == Color::Red {
                    self.set_color(zp, Color::Black);
                    self.set_color(uncle.unwrap(), Color::Black);
                    self.set_color(zpp, Color::Red);
                    z = zpp;
                } else {
                    let mut z = z;
                    if self.arena.get(zp).left == Some(z) {
                        z = zp;
                        self.rotate_right(z);
                    }
                    let zp = self.arena.get(z).parent.unwrap();
                    let zpp = self.arena.get(zp).parent.unwrap();
                    self.set_color(zp, Color::Black);
                    self.set_color(zpp, Color::Red);
                    self.rotate_left(zpp);
                }
            }
        }
        if let Some(r) = self.root {
            self.set_color(r, Color::Black);
        }
    }

    /// Inserts `(key, val)`; on an existing key, the value comes back via
    /// `Existing::Occupied` without being consumed, so the caller decides
    /// whether to overwrite.
    fn raw_insert(&mut self, key: K, val: V) -> Result<Existing<V>, TryReserveError> {
        let mut cur = match self.root {
            Some(r) => r,
            None => {
                let idx = self.arena.add(RbNode::new(key, val))?;
                self.set_color(idx, Color::Black);
                self.root = Some(idx);
                self.len = 1;
                return Ok(Existing::Inserted(idx));
            }
        };
        loop {
            let node = self.arena.get(cur);
            match key.cmp(&node.key) {
                Ordering::Equal => return Ok(Existing::Occupied(cur, val)),
                Ordering::Less => match node.left {
                    Some(l) => cur = l,
                    None => {
                        let idx = self.arena.add(RbNode::new(key, val))?;
                        self.arena.get_mut(cur).left = Some(idx);
                        self.arena.get_mut(idx).parent = Some(cur);
                        self.len += 1;
                        self.insert_fixup(idx);
                        return Ok(Existing::Inserted(idx));
                    }
                },
                Ordering::Greater => match node.right {
                    Some(r) => cur = r,
                    None => {
                        let idx = self.arena.add(RbNode::new(key, val))?;
                        self.arena.get_mut(cur).right = Some(idx);
                        self.arena.get_mut(idx).parent = Some(cur);
                        self.len += 1;
                        self.insert_fixup(idx);
                        return Ok(Existing::Inserted(idx));
                    }
                },
            }
        }
    }

    /// Inserts `(key, val)`, overwriting and returning the old value if
    /// `key` was already present.
    pub fn insert(&mut self, key: K, val: V) -> Result<Option<V>, TryReserveError> {
        match self.raw_insert(key, val)? {
            Existing::Inserted(_) => Ok(None),
            Existing::Occupied(idx, val) => Ok(Some(core::mem::replace(&mut self.arena.get_mut(idx).val, val))),
        }
    }

    /// Returns key/value references for `key`, inserting `(key, default)`
    /// first if `key` isn't already present. An existing entry is left
    /// untouched — `default` is simply dropped rather than overwriting it.
    pub fn get_or_insert_entry(&mut self, key: K, default: V) -> Result<(&K, &mut V), TryReserveError> {
        let idx = match self.raw_insert(key, default)? {
            Existing::Inserted(idx) => idx,
            Existing::Occupied(idx, _) => idx,
        };
        let node = self.arena.get_mut(idx);
        Ok((&node.key, &mut node.val))
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `default` first if the key isn't already present. An existing entry
    /// is left untouched — `default` is simply dropped rather than
    /// overwriting it.
    pub fn get_or_insert(&mut self, key: K, default: V) -> Result<&mut V, TryReserveError> {
        Ok(self.get_or_insert_entry(key, default)?.1)
    }

    fn transplant(&mut self, u: usize, v: Option<usize>) {
        let up = self.arena.get(u).parent;
        match up {
            None => self.root = v,
            Some(p) => {
                if self.arena.get(p).left == Some(u) {
                    self.arena.get_mut(p).left = v;
                } else {
                    self.arena.get_mut(p).right = v;
                }
            }
        }
        if let Some(v) = v {
            self.arena.get_mut(v).parent = up;
        }
    }

    /// Removes the node at `z`, splicing its in-order successor into `z`'s
    /// structural position (rather than copying the successor's payload
    /// over `z`'s) when `z` has two children, so every *other* live node's
    /// arena index — and hence every external iterator to it — stays valid.
    fn delete(&mut self, z: usize) -> RbNode<K, V> {
        let mut y = z;
        let mut y_original_color = self.arena.get(y).color;
        let x: Option<usize>;
        let x_parent: Option<usize>;

        let z_left = self.arena.get(z).left;
        let z_right = self.arena.get(z).right;

        if z_left.is_none() {
            x = z_right;
            x_parent = self.arena.get(z).parent;
            self.transplant(z, z_right);
        } else if z_right.is_none() {
            x = z_left;
            x_parent = self.arena.get(z).parent;
            self.transplant(z, z_left);
        } else {
            y = self.minimum(z_right.unwrap());
            y_original_color = self.arena.get(y).color;
            x = self.arena.get(y).right;

            if self.arena.get(y).parent == Some(z) {
                x_parent = Some(y);
            } else {
                x_parent = self.arena.get(y).parent;
                self.transplant(y, self.arena.get(y).right);
                let zr = self.arena.get(z).right;
                self.arena.get_mut(y).right = zr;
                if let Some(zr) = zr {
                    self.arena.get_mut(zr).parent = Some(y);
                }
            }

            self.transplant(z, Some(y));
            let zl = self.arena.get(z).left;
            self.arena.get_mut(y).left = zl;
            if let Some(zl) = zl {
                self.arena.get_mut(zl).parent = Some(y);
            }
            let z_color = self.arena.get(z).color;
            self.set_color(y, z_color);
        }

        if y_original_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }

        self.len -= 1;
        self.arena.remove(z)
    }

    fn delete_fixup(&mut self, mut x: Option<usize>, mut x_parent: Option<usize>) {
        while x != self.root && self.color_of(x) == Color::Black {
            let xp = match x_parent {
                Some(p) => p,
                None => break,
            };
            if self.arena.get(xp).left == x {
                let mut w = self
                    .arena
                    .get(xp)
                    .right
                    .expect("x's sibling exists: x is black so this side has black-height >= 1");
                if self.arena.get(w).color == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(xp, Color::Red);
                    self.rotate_left(xp);
                    w = self.arena.get(xp).right.unwrap();
                }
                let w_left_black = self.color_of(self.arena.get(w).left) == Color::Black;
                let w_right_black = self.color_of(self.arena.get(w).right) == Color::Black;
                if w_left_black && w_right_black {
                    self.set_color(w, Color::Red);
                    x = Some(xp);
                    x_parent = self.arena.get(xp).parent;
                } else {
                    if w_right_black {
                        if let Some(wl) = self.arena.get(w).left {
                            self.set_color(wl, Color::Black);
                        }
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.arena.get(xp).right.unwrap();
                    }
                    let xp_color = self.arena.get(xp).color;
                    self.set_color(w, xp_color);
                    self.set_color(xp, Color::Black);
                    if let Some(wr) = self.arena.get(w).right {
                        self.set_color(wr, Color::Black);
                    }
                    self.rotate_left(xp);
                    x = self.root;
                    x_parent = None;
                }
            } else {
                let mut w = self
                    .arena
                    .get(xp)
                    .left
                    .expect("x's sibling exists: x is black so this side has black-height >= 1");
                if self.arena.get(w).color == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(xp, Color::Red);
                    self.rotate_right(xp);
                    w = self.arena.get(xp).left.unwrap();
                }
                let w_right_black = self.color_of(self.arena.get(w).right) == Color::Black;
                let w_left_black = self.color_of(self.arena.get(w).left) == Color::Black;
                if w_right_black && w_left_black {
                    self.set_color(w, Color::Red);
                    x = Some(xp);
                    x_parent = self.arena.get(xp).parent;
                } else {
                    if w_left_black {
                        if let Some(wr) = self.arena.get(w).right {
                            self.set_color(wr, Color::Black);
                        }
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.arena.get(xp).left.unwrap();
                    }
                    let xp_color = self.arena.get(xp).color;
                    self.set_color(w, xp_color);
                    self.set_color(xp, Color::Black);
                    if let Some(wl) = self.arena.get(w).left {
                        self.set_color(wl, Color::Black);
                    }
                    self.rotate_right(xp);
                    x = self.root;
                    x_parent = None;
                }
            }
        }
        if let Some(xi) = x {
            self.set_color(xi, Color::Black);
        }
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find(key)?;
        let node = self.delete(idx);
        Some((node.key, node.val))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn first(&self) -> Cursor {
        match self.root {
            None => Cursor::Rend,
            Some(r) => Cursor::Node(self.minimum(r)),
        }
    }

    pub fn last(&self) -> Cursor {
        match self.root {
            None => Cursor::End,
            Some(r) => Cursor::Node(self.maximum(r)),
        }
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let idx = match self.first() {
            Cursor::Node(idx) => idx,
            _ => return None,
        };
        let node = self.delete(idx);
        Some((node.key, node.val))
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let idx = match self.last() {
            Cursor::Node(idx) => idx,
            _ => return None,
        };
        let node = self.delete(idx);
        Some((node.key, node.val))
    }

    pub fn next(&self, it: Cursor) -> Cursor {
        match it {
            Cursor::Rend => self.first(),
            Cursor::End => Cursor::End,
            Cursor::Node(idx) => match self.arena.get(idx).right {
                Some(r) => Cursor::Node(self.minimum(r)),
                None => {
                    let mut cur = idx;
                    loop {
                        match self.arena.get(cur).parent {
                            Some(p) if self.arena.get(p).left == Some(cur) => break Cursor::Node(p),
                            Some(p) => cur = p,
                            None => break Cursor::End,
                        }
                    }
                }
            },
        }
    }

    pub fn prev(&self, it: Cursor) -> Cursor {
        match it {
            Cursor::End => self.last(),
            Cursor::Rend => Cursor::Rend,
            Cursor::Node(idx) => match self.arena.get(idx).left {
                Some(l) => Cursor::Node(self.maximum(l)),
                None => {
                    let mut cur = idx;
                    loop {
                        match self.arena.get(cur).parent {
                            Some(p) if self.arena.get(p).right == Some(cur) => break Cursor::Node(p),
                            Some(p) => cur = p,
                            None => break Cursor::Rend,
                        }
                    }
                }
            },
        }
    }

    /// Smallest element with key `>= key`, or `end` if none.
    pub fn bounded_first<Q>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        let mut best = None;
        while let Some(idx) = cur {
            let node = self.arena.get(idx);
            if node.key.borrow() >= key {
                best = Some(idx);
                cur = node.left;
            } else {
                cur = node.right;
            }
        }
        best.map(Cursor::Node).unwrap_or(Cursor::End)
    }

    /// Largest element with key `<= key`, or `rend` if none.
    pub fn bounded_last<Q>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        let mut best = None;
        while let Some(idx) = cur {
            let node = self.arena.get(idx);
            if node.key.borrow() <= key {
                best = Some(idx);
                cur = node.right;
            } else {
                cur = node.left;
            }
        }
        best.map(Cursor::Node).unwrap_or(Cursor::Rend)
    }

    pub fn key_value_at(&self, it: Cursor) -> Option<(&K, &V)> {
        match it {
            Cursor::Node(idx) => {
                let node = self.arena.get(idx);
                Some((&node.key, &node.val))
            }
            _ => None,
        }
    }

    pub fn value_mut_at(&mut self, it: Cursor) -> Option<&mut V> {
        match it {
            Cursor::Node(idx) => Some(&mut self.arena.get_mut(idx).val),
            _ => None,
        }
    }

    /// Like [`Self::key_value_at`], but lets the caller mutate the value in
    /// place without a separate lookup.
    pub fn key_value_mut_at(&mut self, it: Cursor) -> Option<(&K, &mut V)> {
        match it {
            Cursor::Node(idx) => {
                let node = self.arena.get_mut(idx);
                Some((&node.key, &mut node.val))
            }
            _ => None,
        }
    }

    /// Arena indices in ascending key order.
    pub(super) fn inorder_indices(&self) -> alloc::vec::Vec<usize> {
        let mut out = alloc::vec::Vec::with_capacity(self.len);
        let mut cur = self.first();
        while let Cursor::Node(idx) = cur {
            out.push(idx);
            cur = self.next(cur);
        }
        out
    }

    pub(super) fn arena_slots_mut(&mut self) -> &mut [Option<RbNode<K, V>>] {
        self.arena.slots_mut()
    }

    /// Removes the element at `it`, returning the cursor to resume
    /// iteration from (the in-order successor of the erased element).
    pub fn remove_at(&mut self, it: Cursor) -> (Option<(K, V)>, Cursor) {
        match it {
            Cursor::Node(idx) => {
                let resume = self.next(it);
                let node = self.delete(idx);
                (Some((node.key, node.val)), resume)
            }
            _ => (None, it),
        }
    }

    fn clone_subtree(&self, idx: usize, parent: Option<usize>, out: &mut Self) -> Result<usize, TryReserveError>
    where
        K: Clone,
        V: Clone,
    {
        let (key, val, color, left, right) = {
            let node = self.arena.get(idx);
            (node.key.clone(), node.val.clone(), node.color, node.left, node.right)
        };
        let mut new_node = RbNode::new(key, val);
        new_node.color = color;
        new_node.parent = parent;
        let new_idx = out.arena.add(new_node)?;
        if let Some(l) = left {
            let nl = self.clone_subtree(l, Some(new_idx), out)?;
            out.arena.get_mut(new_idx).left = Some(nl);
        }
        if let Some(r) = right {
            let nr = self.clone_subtree(r, Some(new_idx), out)?;
            out.arena.get_mut(new_idx).right = Some(nr);
        }
        Ok(new_idx)
    }

    /// Deep-clones the tree, preserving structure and colour. On allocation
    /// failure partway through, the partially built clone (and every node
    /// already placed in it) is simply dropped.
    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        K: Clone,
        V: Clone,
    {
        let mut out = RedBlackTree {
            arena: NodeArena::new(),
            root: None,
            len: self.len,
        };
        if let Some(r) = self.root {
            out.root = Some(self.clone_subtree(r, None, &mut out)?);
        }
        Ok(out)
    }
}

impl<K: Ord, V> Default for RedBlackTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
