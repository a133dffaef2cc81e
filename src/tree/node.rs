#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Red-black tree node: key, value, colour bit, and parent/child links by
/// arena index. `None` in any link plays the role of the sentinel leaf.
pub(crate) struct RbNode<K, V> {
    pub key: K,
    pub val: V,
    pub color: Color,
    pub parent: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl<K, V> RbNode<K, V> {
    /// A freshly allocated node is always red; the caller blackens it if
    /// it becomes the root.
    pub fn new(key: K, val: V) -> Self {
        RbNode {
            key,
            val,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
        }
    }
}
