//! Open-addressed hash table: quadratic probing, chains ordered by
//! ascending displacement, 16-bit per-bucket metadata.
//!
//! Each occupied bucket's metadatum packs a 4-bit hash fragment, a 1-bit
//! "is this bucket its key's home" flag, and an 11-bit displacement. The
//! displacement field doubles as a chain link: it names the probe step
//! (relative to the *home* bucket) of the next element in the chain, or
//! `END` if this bucket is the chain's tail. An all-zero metadatum means
//! the bucket is empty — this never collides with a live encoding, since
//! an occupied home bucket always stores `END` (not 0) until a second
//! element joins its chain.
//!
//! `T` carries no `Hash`/`Eq` bound itself; a `key_of` function extracts
//! the `K: Hash + Eq` portion used for hashing and comparison. This keeps
//! `HashMap<K, V>` (`T = (K, V)`, arbitrary `V`) and `HashSet<T>` (`T = K`)
//! sharing one engine without a blanket-impl coherence conflict.

use alloc::vec::Vec;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use crate::error::TryReserveError;

const MIN_CAP: usize = 8;
const END: u16 = 0x7FF;
const DISP_MASK: u16 = 0x7FF;
const IN_HOME_BIT: u16 = 0x0800;
const FRAG_SHIFT: u32 = 12;
const DEFAULT_MAX_LOAD: f32 = 0.9;

fn decode(meta: u16) -> (u16, bool, u16) {
    let frag = meta >> FRAG_SHIFT;
    let in_home = meta & IN_HOME_BIT != 0;
    let disp = meta & DISP_MASK;
    (frag, in_home, disp)
}

fn encode(frag: u16, in_home: bool, disp: u16) -> u16 {
    (frag << FRAG_SHIFT) | (if in_home { IN_HOME_BIT } else { 0 }) | (disp & DISP_MASK)
}

fn probe_offset(d: u16) -> usize {
    let d = d as usize;
    d * (d + 1) / 2
}

/// Signals that an insert/reinsert couldn't find a slot within the
/// displacement limit; the caller must grow capacity and retry.
pub(crate) struct NeedsRehash;

pub(crate) enum Insert<T> {
    /// A brand-new entry was written at this bucket.
    Inserted(usize),
    /// An existing entry was found and overwritten; carries the old value.
    Replaced(usize, T),
    /// An existing entry was found and left alone (`replace = false`).
    Occupied(usize),
}

pub(crate) struct RawTable<T, K, S> {
    buckets: Vec<Option<T>>,
    meta: Vec<u16>,
    len: usize,
    max_load: f32,
    hash_builder: S,
    key_of: fn(&T) -> &K,
}

impl<T, K, S> RawTable<T, K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub(crate) fn new(hash_builder: S, key_of: fn(&T) -> &K) -> Self {
        RawTable {
            buckets: Vec::new(),
            meta: Vec::new(),
            len: 0,
            max_load: DEFAULT_MAX_LOAD,
            hash_builder,
            key_of,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn hash_of<Q: Hash + ?Sized>(&self, k: &Q) -> u64 {
        self.hash_builder.hash_one(k)
    }

    fn frag_of(hash: u64) -> u16 {
        ((hash >> 60) & 0xF) as u16
    }

    fn home_of(hash: u64, cap: usize) -> usize {
        (hash as usize) & (cap - 1)
    }

    fn slot_at(home: usize, d: u16, cap: usize) -> usize {
        (home + probe_offset(d)) % cap
    }

    /// Clears all entries, keeping the current allocation.
    pub(crate) fn clear(&mut self) {
        for b in self.buckets.iter_mut() {
            *b = None;
        }
        for m in self.meta.iter_mut() {
            *m = 0;
        }
        self.len = 0;
    }

    pub(crate) fn get<Q>(&self, k: &Q) -> Option<&T>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(k).map(|i| self.buckets[i].as_ref().unwrap())
    }

    pub(crate) fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut T>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = self.find_index(k)?;
        Some(self.buckets[i].as_mut().unwrap())
    }

    fn find_index<Q>(&self, k: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let cap = self.buckets.len();
        let hash = self.hash_of(k);
        let frag = Self::frag_of(hash);
        let home = Self::home_of(hash, cap);
        if self.meta[home] == 0 || !decode(self.meta[home]).1 {
            return None;
        }
        let mut idx = home;
        loop {
            let (f, _, d) = decode(self.meta[idx]);
            if f == frag && (self.key_of)(self.buckets[idx].as_ref().unwrap()).borrow() == k {
                return Some(idx);
            }
            if d == END {
                return None;
            }
            idx = Self::slot_at(home, d, cap);
        }
    }

    /// Finds the earliest empty slot reachable from `home` by quadratic
    /// probing, starting at displacement 1. Returns `(d, idx)`.
    fn find_chain_slot(&self, home: usize) -> Option<(u16, usize)> {
        let cap = self.buckets.len();
        let mut d: u16 = 1;
        loop {
            if d >= END {
                return None;
            }
            let idx = Self::slot_at(home, d, cap);
            if self.meta[idx] == 0 {
                return Some((d, idx));
            }
            d += 1;
        }
    }

    /// Splices a new entry already known to belong at `new_idx` (reached via
    /// displacement `d_new` from `home`) into `home`'s chain, keeping the
    /// chain's link order ascending by displacement.
    fn splice_into_chain(&mut self, home: usize, frag: u16, new_idx: usize, d_new: u16, value: T) {
        let cap = self.buckets.len();
        let mut prev = home;
        loop {
            let (pf, p_in_home, p_disp) = decode(self.meta[prev]);
            if p_disp == END || p_disp > d_new {
                self.meta[prev] = encode(pf, p_in_home, d_new);
                self.meta[new_idx] = encode(frag, false, p_disp);
                self.buckets[new_idx] = Some(value);
                return;
            }
            prev = Self::slot_at(home, p_disp, cap);
        }
    }

    /// Finds the predecessor of `target_idx` within `home`'s chain (the
    /// bucket whose link field points at `target_idx`).
    fn predecessor_in_chain(&self, home: usize, target_idx: usize) -> usize {
        let cap = self.buckets.len();
        let mut prev = home;
        loop {
            let (_, _, d) = decode(self.meta[prev]);
            debug_assert!(d != END, "target index not present in chain");
            let next_idx = Self::slot_at(home, d, cap);
            if next_idx == target_idx {
                return prev;
            }
            prev = next_idx;
        }
    }

    /// Evicts the non-home occupant of `victim_idx`, relocating it within
    /// its own home's chain. Leaves `victim_idx` empty on success.
    fn evict(&mut self, victim_idx: usize) -> Result<(), NeedsRehash> {
        let victim_key_hash = {
            let victim = self.buckets[victim_idx].as_ref().unwrap();
            self.hash_of((self.key_of)(victim))
        };
        let cap = self.buckets.len();
        let home2 = Self::home_of(victim_key_hash, cap);
        let frag2 = Self::frag_of(victim_key_hash);

        let (d_new, new_idx) = self.find_chain_slot(home2).ok_or(NeedsRehash)?;

        let pred_idx = self.predecessor_in_chain(home2, victim_idx);
        let victim_next = decode(self.meta[victim_idx]).2;
        let value = self.buckets[victim_idx].take().unwrap();
        self.meta[victim_idx] = 0;

        let (pf, p_in_home, _) = decode(self.meta[pred_idx]);
        self.meta[pred_idx] = encode(pf, p_in_home, victim_next);

        self.splice_into_chain(home2, frag2, new_idx, d_new, value);
        Ok(())
    }

    /// Inserts `value`, keyed by `(self.key_of)(&value)`. If an entry with
    /// the same key exists and `replace` is true, it is overwritten and
    /// returned; if `replace` is false, the existing entry is left in place.
    /// On failure the value is handed back unconsumed, paired with the
    /// reason, so the caller can grow and retry without having to clone it.
    fn try_insert(&mut self, value: T, replace: bool) -> Result<Insert<T>, (T, NeedsRehash)> {
        if self.buckets.is_empty() {
            return Err((value, NeedsRehash));
        }
        let cap = self.buckets.len();
        let hash = self.hash_of((self.key_of)(&value));
        let frag = Self::frag_of(hash);
        let home = Self::home_of(hash, cap);
        let home_meta = self.meta[home];

        if home_meta == 0 || !decode(home_meta).1 {
            if (self.len + 1) as f32 > self.max_load * cap as f32 {
                return Err((value, NeedsRehash));
            }
            if home_meta != 0 {
                if let Err(e) = self.evict(home) {
                    return Err((value, e));
                }
            }
            self.buckets[home] = Some(value);
            self.meta[home] = encode(frag, true, END);
            self.len += 1;
            return Ok(Insert::Inserted(home));
        }

        let mut idx = home;
        let found = loop {
            let (f, _, d) = decode(self.meta[idx]);
            if f == frag && (self.key_of)(self.buckets[idx].as_ref().unwrap()) == (self.key_of)(&value) {
                break Some(idx);
            }
            if d == END {
                break None;
            }
            idx = Self::slot_at(home, d, cap);
        };

        if let Some(idx) = found {
            if replace {
                let old = self.buckets[idx].replace(value).unwrap();
                return Ok(Insert::Replaced(idx, old));
            }
            return Ok(Insert::Occupied(idx));
        }

        if (self.len + 1) as f32 > self.max_load * cap as f32 {
            return Err((value, NeedsRehash));
        }
        let (d_new, new_idx) = match self.find_chain_slot(home) {
            Some(found) => found,
            None => return Err((value, NeedsRehash)),
        };
        self.splice_into_chain(home, frag, new_idx, d_new, value);
        self.len += 1;
        Ok(Insert::Inserted(new_idx))
    }

    /// Inserts a value known not to collide with any existing key and
    /// unconstrained by the load factor — used while rehashing, where the
    /// source table already enforced both. Hands the value back on failure.
    fn reinsert(&mut self, value: T) -> Result<(), T> {
        let cap = self.buckets.len();
        let hash = self.hash_of((self.key_of)(&value));
        let frag = Self::frag_of(hash);
        let home = Self::home_of(hash, cap);
        let home_meta = self.meta[home];

        if home_meta == 0 || !decode(home_meta).1 {
            if home_meta != 0 && self.evict(home).is_err() {
                return Err(value);
            }
            self.buckets[home] = Some(value);
            self.meta[home] = encode(frag, true, END);
            self.len += 1;
            return Ok(());
        }

        match self.find_chain_slot(home) {
            Some((d_new, new_idx)) => {
                self.splice_into_chain(home, frag, new_idx, d_new, value);
                self.len += 1;
                Ok(())
            }
            None => Err(value),
        }
    }

    /// Removes the entry at `idx` following the three-case tail-swap
    /// algorithm, so only the erased slot and (at most) the chain's
    /// current tail are ever touched. The erased slot's own chain link is
    /// left untouched when a tail is copied in, since only its payload and
    /// fragment change identity.
    fn erase_at(&mut self, idx: usize) -> T {
        let cap = self.buckets.len();
        let (_, in_home, disp) = decode(self.meta[idx]);

        if disp == END {
            if in_home {
                self.meta[idx] = 0;
            } else {
                let key_hash = self.hash_of((self.key_of)(self.buckets[idx].as_ref().unwrap()));
                let home = Self::home_of(key_hash, cap);
                let pred = self.predecessor_in_chain(home, idx);
                let (pf, p_in_home, _) = decode(self.meta[pred]);
                self.meta[pred] = encode(pf, p_in_home, END);
                self.meta[idx] = 0;
            }
            self.len -= 1;
            return self.buckets[idx].take().unwrap();
        }

        // Middle of chain: walk forward to the tail, copy it into `idx`
        // (keeping `idx`'s own link, which still correctly names the rest
        // of the chain), clear the tail, and retarget its predecessor.
        let home = if in_home {
            idx
        } else {
            let key_hash = self.hash_of((self.key_of)(self.buckets[idx].as_ref().unwrap()));
            Self::home_of(key_hash, cap)
        };
        let mut tail = idx;
        loop {
            let d = decode(self.meta[tail]).2;
            if d == END {
                break;
            }
            tail = Self::slot_at(home, d, cap);
        }
        let pred_of_tail = self.predecessor_in_chain(home, tail);

        let removed = self.buckets[idx].take().unwrap();
        let tail_value = self.buckets[tail].take().unwrap();
        let tail_frag = decode(self.meta[tail]).0;

        self.buckets[idx] = Some(tail_value);
        self.meta[idx] = encode(tail_frag, in_home, disp);

        self.meta[tail] = 0;
        let (pf, p_in_home, _) = decode(self.meta[pred_of_tail]);
        self.meta[pred_of_tail] = encode(pf, p_in_home, END);

        self.len -= 1;
        removed
    }

    pub(crate) fn remove<Q>(&mut self, k: &Q) -> Option<T>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.find_index(k)?;
        Some(self.erase_at(idx))
    }

    /// Removes the entry at bucket `idx` (used by iterator-based erase);
    /// returns the next live bucket index to resume iteration from, which
    /// may be `idx` itself if the tail-swapped-in entry hasn't been visited
    /// yet, or the index just past it if it had already been passed.
    pub(crate) fn remove_at_index(&mut self, idx: usize) -> (T, usize) {
        let removed = self.erase_at(idx);
        let next = if self.meta.get(idx).copied().unwrap_or(0) != 0 {
            idx
        } else {
            self.next_index(idx)
        };
        (removed, next)
    }

    pub(crate) fn bucket(&self, idx: usize) -> Option<&T> {
        self.buckets.get(idx).and_then(|b| b.as_ref())
    }

    pub(crate) fn bucket_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.buckets.get_mut(idx).and_then(|b| b.as_mut())
    }

    pub(crate) fn first_index(&self) -> usize {
        let mut i = 0;
        while i < self.meta.len() && self.meta[i] == 0 {
            i += 1;
        }
        i
    }

    pub(crate) fn next_index(&self, idx: usize) -> usize {
        let mut i = idx + 1;
        while i < self.meta.len() && self.meta[i] == 0 {
            i += 1;
        }
        i
    }

    pub(crate) fn end_index(&self) -> usize {
        self.meta.len()
    }

    /// Rehashes into a table whose capacity is at least `start_cap`,
    /// doubling as needed until every live element fits within the
    /// displacement limit. Moves elements rather than cloning them.
    fn rehash_to(&mut self, start_cap: usize) -> Result<(), TryReserveError> {
        let old_buckets = core::mem::take(&mut self.buckets);
        self.meta = Vec::new();
        let mut pending: Vec<T> = old_buckets.into_iter().flatten().collect();
        let mut cap = start_cap.max(MIN_CAP);

        loop {
            let mut buckets = Vec::new();
            buckets.try_reserve_exact(cap)?;
            buckets.resize_with(cap, || None);
            let mut meta = Vec::new();
            meta.try_reserve_exact(cap)?;
            meta.resize(cap, 0);
            self.buckets = buckets;
            self.meta = meta;
            self.len = 0;

            let mut leftover = Vec::new();
            let mut all_ok = true;
            for item in pending.drain(..) {
                if let Err(item) = self.reinsert(item) {
                    leftover.push(item);
                    all_ok = false;
                }
            }
            if all_ok {
                return Ok(());
            }
            let placed: Vec<T> = core::mem::take(&mut self.buckets).into_iter().flatten().collect();
            pending = placed;
            pending.extend(leftover);
            cap = cap.saturating_mul(2);
        }
    }

    /// Ensures the table can hold `n` live elements without rehashing.
    pub(crate) fn reserve(&mut self, n: usize) -> Result<(), TryReserveError> {
        let mut cap = self.buckets.len().max(MIN_CAP);
        while (n as f32) > self.max_load * cap as f32 {
            cap = cap.saturating_mul(2);
        }
        if cap > self.buckets.len() {
            self.rehash_to(cap)?;
        }
        Ok(())
    }

    /// Reduces capacity to the smallest power of two (≥ `MIN_CAP`) that
    /// keeps the table under its load factor; a no-op if already minimal,
    /// and a full free (back to the placeholder) if empty.
    pub(crate) fn shrink(&mut self) -> Result<(), TryReserveError> {
        if self.len == 0 {
            self.buckets = Vec::new();
            self.meta = Vec::new();
            return Ok(());
        }
        let mut min_cap = MIN_CAP;
        while (self.len as f32) > self.max_load * min_cap as f32 {
            min_cap = min_cap.saturating_mul(2);
        }
        if min_cap < self.buckets.len() {
            self.rehash_to(min_cap)?;
        }
        Ok(())
    }

    pub(crate) fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        T: Clone,
        S: Clone,
    {
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(self.buckets.len())?;
        buckets.extend(self.buckets.iter().cloned());
        let mut meta = Vec::new();
        meta.try_reserve_exact(self.meta.len())?;
        meta.extend(self.meta.iter().copied());
        Ok(RawTable {
            buckets,
            meta,
            len: self.len,
            max_load: self.max_load,
            hash_builder: self.hash_builder.clone(),
            key_of: self.key_of,
        })
    }

    /// Inserts `value`, growing (and rehashing) the table as many times as
    /// needed to make room. The entry point used by `HashMap`/`HashSet`.
    pub(crate) fn insert_grow(&mut self, value: T, replace: bool) -> Result<Insert<T>, TryReserveError> {
        let mut value = value;
        loop {
            match self.try_insert(value, replace) {
                Ok(outcome) => return Ok(outcome),
                Err((bounced, NeedsRehash)) => {
                    value = bounced;
                    let next_cap = self.buckets.len().max(MIN_CAP / 2).saturating_mul(2).max(MIN_CAP);
                    self.rehash_to(next_cap)?;
                }
            }
        }
    }
}
