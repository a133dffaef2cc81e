//! Unordered collections backed by the open-addressed [`raw::RawTable`] engine.

pub(crate) mod raw;

pub mod map;
pub mod set;

/// Opaque bucket-table position, usable with `erase_at`/`get_at` on
/// [`HashMap`](crate::HashMap)/[`HashSet`](crate::HashSet). Bucket order is
/// unspecified and, like any HT iterator, a cursor is invalidated by an
/// operation that rehashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCursor(pub(crate) usize);

use core::hash::{BuildHasher, Hasher};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// FNV-1a, used as the default hasher.
///
/// `no_std` has no `RandomState` (it needs OS randomness this crate has no
/// way to source), so this is a fixed, non-randomized hash — adequate for
/// the general case, but it means an adversary who controls key values can
/// degrade this table to linear chains. Bring your own `BuildHasher` (e.g.
/// one seeded from a host RNG) if that matters for your workload.
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        FnvHasher(FNV_OFFSET_BASIS)
    }
}

impl Hasher for FnvHasher {
    fn write(&mut self, bytes: &[u8]) {
        let mut hash = self.0;
        for &byte in bytes {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        self.0 = hash;
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// [`BuildHasher`] for [`FnvHasher`], the default hasher for [`HashMap`](crate::HashMap)
/// and [`HashSet`](crate::HashSet).
#[derive(Debug, Clone, Copy, Default)]
pub struct FnvBuildHasher;

impl BuildHasher for FnvBuildHasher {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> FnvHasher {
        FnvHasher(FNV_OFFSET_BASIS)
    }
}
