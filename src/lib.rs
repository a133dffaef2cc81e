/*!
Four container engines, shared by six public collection types.

* [`Vector`] / [`List`] — sequence containers.
* [`HashMap`] / [`HashSet`] — unordered, open-addressed via quadratic probing.
* [`OrderedMap`] / [`OrderedSet`] — ordered, red-black tree backed.

### About

* `!#[no_std]` by default (`extern crate alloc`).
* **Safe:** `#![forbid(unsafe_code)]`, no raw pointer dereference anywhere in this crate.
* **Fallible:** every operation that may allocate returns [`Result<_, TryReserveError>`](crate::TryReserveError)
  instead of aborting on out-of-memory. `debug_assert!` guards logical invariants (stale
  iterators, out-of-bounds indices) since those are caller contract violations, not
  recoverable errors.

### Usage

```
use containrs::OrderedMap;

let mut m = OrderedMap::new();
m.insert(3, "c").unwrap();
m.insert(1, "a").unwrap();
m.insert(2, "b").unwrap();

let mut it = m.iter();
assert_eq!(it.next(), Some((&1, &"a")));
assert_eq!(it.next(), Some((&2, &"b")));
assert_eq!(it.next(), Some((&3, &"c")));
assert_eq!(it.next(), None);
```
*/

#![forbid(unsafe_code)]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod error;
pub use crate::error::TryReserveError;

mod vector;
pub use crate::vector::Vector;

mod list;
pub use crate::list::{Cursor, List};

mod hash;
pub use crate::hash::map::HashMap;
pub use crate::hash::set::HashSet;
pub use crate::hash::{FnvBuildHasher, HashCursor};

mod tree;
pub use crate::tree::map::OrderedMap;
pub use crate::tree::set::OrderedSet;
