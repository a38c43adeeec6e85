extern crate alloc;

use alloc::boxed::Box;
use core::{borrow::Borrow, fmt, marker::PhantomPinned, ptr::NonNull};

use cordyceps::Linked;

use crate::{Augment, AvlTree, Links, TreeNode};

/// An ordered multimap based on an augmented AVL tree.
///
/// Unlike `BTreeMap`, inserting a key that is already present keeps both entries; the newer one
/// sorts after the older one.
pub struct AugmentedMap<K: Ord, V, A: Augment> {
    tree: AvlTree<MapNode<K, V, A>, A>,
}

struct MapNode<K, V, A: Augment> {
    links: Links<MapNode<K, V, A>, A>,
    key: K,
    value: V,
    _unpin: PhantomPinned,
}

unsafe impl<K, V, A: Augment> Linked<Links<MapNode<K, V, A>, A>> for MapNode<K, V, A> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V, A>, A>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<K: Ord, V, A: Augment> TreeNode<Links<MapNode<K, V, A>, A>> for MapNode<K, V, A> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

#[inline]
fn into_pair<K, V, A: Augment>(node: Box<MapNode<K, V, A>>) -> (K, V) {
    let MapNode { key, value, .. } = *node;
    (key, value)
}

impl<K: Ord, V, A: Augment> AugmentedMap<K, V, A> {
    /// Creates a new, empty `AugmentedMap`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the height of the underlying tree.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Returns the property of the whole map, or `None` if the map is empty.
    pub fn property(&self) -> Option<&A::Property> {
        self.tree.property()
    }

    /// Inserts a key-value pair into the map.
    pub fn insert(&mut self, key: K, value: V) {
        self.tree.insert(Box::new(MapNode {
            links: Links::new(),
            key,
            value,
            _unpin: PhantomPinned,
        }));
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).is_some()
    }

    /// Returns a reference to a value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().value)
    }

    /// Returns a mutable reference to a value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        // SAFETY: Only the value is handed out; the links and the key stay untouched.
        unsafe { self.tree.get_mut(key) }
            // SAFETY: Pinning is not structural for `node.value`.
            .map(|node| unsafe { &mut node.get_unchecked_mut().value })
    }

    /// Returns the key-value pair located by a property search for `target`.
    #[inline]
    pub fn get_by_property(&self, target: A::Property) -> Option<(&K, &V)> {
        self.tree.get_by_property(target).map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(into_pair)
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes an entry with key `key` from the map, returning it.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(into_pair)
    }

    /// Removes the entry located by a property search for `target`, returning it.
    #[inline]
    pub fn remove_by_property(&mut self, target: A::Property) -> Option<(K, V)> {
        self.tree.remove_by_property(target).map(into_pair)
    }

    /// Returns an iterator over the entries of the map, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.tree.iter().map(|node| (&node.key, &node.value))
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        A::Property: PartialEq + fmt::Debug,
    {
        self.tree.assert_invariants();
    }
}

impl<K: Ord, V, A: Augment> Default for AugmentedMap<K, V, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A> fmt::Debug for AugmentedMap<K, V, A>
where
    K: Ord + fmt::Debug,
    V: fmt::Debug,
    A: Augment,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubtreeSize;

    #[test]
    fn duplicate_keys_keep_insertion_order() {
        let mut map: AugmentedMap<u32, char, SubtreeSize> = AugmentedMap::new();

        for (key, value) in [(2, 'a'), (1, 'b'), (2, 'c'), (3, 'd'), (2, 'e')] {
            map.insert(key, value);
            map.assert_invariants();
        }

        let entries: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        assert_eq!(
            entries,
            [(1, 'b'), (2, 'a'), (2, 'c'), (2, 'e'), (3, 'd')]
        );
        assert_eq!(map.len(), 5);
        assert_eq!(map.property(), Some(&5));
    }

    #[test]
    fn rank_queries() {
        let mut map: AugmentedMap<u32, u32, SubtreeSize> = AugmentedMap::new();

        for key in [50, 10, 40, 20, 30] {
            map.insert(key, key * 2);
        }

        for (rank, key) in [10, 20, 30, 40, 50].into_iter().enumerate() {
            assert_eq!(map.get_by_property(rank + 1), Some((&key, &(key * 2))));
        }

        assert_eq!(map.get_by_property(0), None);
        assert_eq!(map.get_by_property(6), None);

        assert_eq!(map.remove_by_property(2), Some((20, 40)));
        assert_eq!(map.remove_by_property(9), None);
        map.assert_invariants();

        let keys: Vec<_> = map.iter().map(|(&k, _)| k).collect();
        assert_eq!(keys, [10, 30, 40, 50]);
    }

    #[test]
    fn get_remove_first_last() {
        let mut map: AugmentedMap<&str, u32, SubtreeSize> = AugmentedMap::new();
        assert_eq!(map.first_key_value(), None);
        assert_eq!(map.pop_first(), None);

        map.insert("b", 2);
        map.insert("a", 1);
        map.insert("c", 3);

        assert!(map.contains_key("a"));
        assert!(!map.contains_key("z"));

        *map.get_mut("b").unwrap() += 10;
        assert_eq!(map.get("b"), Some(&12));

        assert_eq!(map.first_key_value(), Some((&"a", &1)));
        assert_eq!(map.last_key_value(), Some((&"c", &3)));

        assert_eq!(map.remove("z"), None);
        assert_eq!(map.remove("b"), Some(("b", 12)));
        assert_eq!(map.pop_first(), Some(("a", 1)));
        map.assert_invariants();

        assert_eq!(format!("{map:?}"), r#"{"c": 3}"#);

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.height(), 0);
        assert_eq!(map.property(), None);
    }
}
