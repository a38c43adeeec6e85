//! An indexable list backed by an order-statistic tree.

extern crate alloc;

use alloc::{boxed::Box, vec::Vec};
use core::{fmt, iter::FusedIterator, marker::PhantomPinned, ops::Range, ptr::NonNull};

use cordyceps::Linked;

use crate::{AvlTree, Cursor, CursorMut, Error, Links, Result, SubtreeSize, TreeNode};

/// An append-only list with _O(log(n))_ positional access and removal.
///
/// Elements are stored in an AVL tree augmented with subtree sizes. Every element is inserted
/// with the same key, so each new element lands after all existing ones; positions are resolved
/// by rank.
pub struct TreeList<V> {
    tree: AvlTree<ListNode<V>, SubtreeSize>,
    size: usize,
}

struct ListNode<V> {
    links: Links<ListNode<V>, SubtreeSize>,
    value: V,
    _unpin: PhantomPinned,
}

unsafe impl<V> Linked<Links<ListNode<V>, SubtreeSize>> for ListNode<V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<ListNode<V>, SubtreeSize>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<V> TreeNode<Links<ListNode<V>, SubtreeSize>> for ListNode<V> {
    // Every element shares the insertion key, and ties go right: each insertion is an append.
    type Key = ();

    fn key(&self) -> &Self::Key {
        &()
    }
}

impl<V: fmt::Display> fmt::Display for ListNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

impl<V> TreeList<V> {
    /// Creates a new, empty `TreeList`.
    pub const fn new() -> Self {
        TreeList {
            tree: AvlTree::new(),
            size: 0,
        }
    }

    /// Returns the number of elements in the list.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the list contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the height of the underlying tree.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Appends `value` to the end of the list.
    pub fn push(&mut self, value: V) {
        self.tree.insert(Box::new(ListNode {
            links: Links::new(),
            value,
            _unpin: PhantomPinned,
        }));
        self.size += 1;
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] unless `index < self.len()`.
    pub fn get(&self, index: usize) -> Result<&V> {
        let out_of_range = Error::IndexOutOfRange {
            index,
            len: self.size,
        };

        if index >= self.size {
            return Err(out_of_range);
        }

        self.tree
            .get_by_property(index + 1)
            .map(|node| &node.get_ref().value)
            .ok_or(out_of_range)
    }

    /// Removes and returns the element at `index`, shifting later elements down by one.
    ///
    /// Returns `None` if there is no element at `index`.
    pub fn remove(&mut self, index: usize) -> Option<V> {
        let node = self.tree.remove_by_property(index.checked_add(1)?)?;
        self.size -= 1;

        let ListNode { value, .. } = *node;
        Some(value)
    }

    /// Removes the first element equal to `value`, returning whether one was found.
    pub fn remove_item(&mut self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let mut cursor = self.cursor_mut();

        while let Ok(item) = cursor.move_next() {
            if item == value {
                return cursor.remove().is_ok();
            }
        }

        false
    }

    /// Returns `true` if the list contains an element equal to `value`.
    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|item| item == value)
    }

    /// Returns the position of the first element equal to `value`.
    pub fn index_of(&self, value: &V) -> Option<usize>
    where
        V: PartialEq,
    {
        self.iter().position(|item| item == value)
    }

    /// Returns the position of the last element equal to `value`.
    pub fn last_index_of(&self, value: &V) -> Option<usize>
    where
        V: PartialEq,
    {
        self.iter().rposition(|item| item == value)
    }

    /// Returns `true` if every element of `values` is contained in the list.
    pub fn contains_all(&self, values: &[V]) -> bool
    where
        V: PartialEq,
    {
        values.iter().all(|value| self.contains(value))
    }

    /// Copies the elements of the list, front to back, into a new `Vec`.
    pub fn to_vec(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.tree.iter().map(|node| node.value.clone()).collect()
    }

    /// Returns an iterator over the elements of the list, front to back.
    ///
    /// Each step is a positional lookup, so a full traversal takes _O(n log(n))_ time.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            front: 0,
            back: self.size,
        }
    }

    /// Returns a cursor positioned before the first element.
    pub fn cursor(&self) -> Cursor<'_, V> {
        Cursor::new(self, 0, self.size)
    }

    /// Returns a cursor positioned before the first element which can remove elements.
    pub fn cursor_mut(&mut self) -> CursorMut<'_, V> {
        let len = self.size;
        CursorMut::new(self, 0, len)
    }

    /// Removes all elements from the list.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.size = 0;
    }

    /// Replacing elements is not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn set(&mut self, _index: usize, _value: V) -> Result<V> {
        Err(Error::Unsupported("set"))
    }

    /// Inserting anywhere but the end is not supported; see [`push`](TreeList::push).
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn insert(&mut self, _index: usize, _value: V) -> Result<()> {
        Err(Error::Unsupported("insert"))
    }

    /// Sub-list views are not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn sublist(&self, _range: Range<usize>) -> Result<TreeList<V>> {
        Err(Error::Unsupported("sublist"))
    }

    /// Bulk removal is not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn remove_all(&mut self, _values: &[V]) -> Result<bool> {
        Err(Error::Unsupported("remove_all"))
    }

    /// Bulk retention is not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn retain_all(&mut self, _values: &[V]) -> Result<bool> {
        Err(Error::Unsupported("retain_all"))
    }

    /// Writes a Graphviz rendering of the underlying tree to `w`.
    pub fn dotgraph<W>(&self, name: &str, w: W) -> fmt::Result
    where
        W: fmt::Write,
        V: fmt::Display,
    {
        self.tree.dotgraph(name, w)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
        assert_eq!(self.size, self.tree.len());
    }
}

impl<V> Default for TreeList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for TreeList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<V> Extend<V> for TreeList<V> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| self.push(value));
    }
}

impl<V> FromIterator<V> for TreeList<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut list = TreeList::new();
        list.extend(iter);
        list
    }
}

impl<'list, V> IntoIterator for &'list TreeList<V> {
    type Item = &'list V;
    type IntoIter = Iter<'list, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A positional iterator over the elements of a [`TreeList`].
pub struct Iter<'list, V> {
    list: &'list TreeList<V>,
    front: usize,
    back: usize,
}

impl<'list, V> Iterator for Iter<'list, V> {
    type Item = &'list V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        let value = self.list.get(self.front).ok()?;
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        let value = self.list.get(self.back - 1).ok()?;
        self.back -= 1;
        Some(value)
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters() -> TreeList<char> {
        "ABCDE".chars().collect()
    }

    #[test]
    fn get_after_push() {
        let list = letters();

        assert_eq!(list.len(), 5);
        for (i, c) in "ABCDE".chars().enumerate() {
            assert_eq!(list.get(i), Ok(&c));
        }
        assert_eq!(
            list.get(5),
            Err(Error::IndexOutOfRange { index: 5, len: 5 })
        );
    }

    #[test]
    fn remove_shifts_down() {
        let mut list = letters();

        assert_eq!(list.remove(2), Some('C'));
        list.assert_invariants();

        assert_eq!(list.len(), 4);
        assert_eq!(list.iter().copied().collect::<String>(), "ABDE");
        assert_eq!(list.get(2), Ok(&'D'));
    }

    #[test]
    fn empty_list() {
        let mut list: TreeList<u32> = TreeList::new();

        assert!(list.is_empty());
        assert_eq!(
            list.get(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        );
        assert_eq!(list.remove(0), None);
        assert_eq!(list.remove(usize::MAX), None);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn remove_out_of_range_is_absent() {
        let mut list = letters();

        assert_eq!(list.remove(5), None);
        assert_eq!(list.len(), 5);
        list.assert_invariants();
    }

    #[test]
    fn push_then_get_last() {
        let mut list = TreeList::new();

        for i in 0..100u32 {
            list.push(i);
            assert_eq!(list.len(), i as usize + 1);
            assert_eq!(list.get(list.len() - 1), Ok(&i));
        }
    }

    #[test]
    fn height_stays_logarithmic() {
        let mut list = TreeList::new();

        for i in 0..1000 {
            list.push(i);
        }

        list.assert_invariants();

        // An AVL tree with n nodes has height below 1.44 * log2(n + 2).
        let height = list.height();
        assert!((10..=14).contains(&height), "height {height}");
    }

    #[test]
    fn drain_by_index_returns_everything() {
        let mut list: TreeList<u32> = (0..64).collect();
        let mut removed = Vec::new();

        // Remove from the middle, the back and the front in turn.
        while !list.is_empty() {
            let index = match removed.len() % 3 {
                0 => list.len() / 2,
                1 => list.len() - 1,
                _ => 0,
            };
            removed.push(list.remove(index).unwrap());
            list.assert_invariants();
        }

        assert_eq!(list.len(), 0);
        assert_eq!(list.height(), 0);

        removed.sort_unstable();
        assert_eq!(removed, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn linear_scans() {
        let mut list: TreeList<u32> = [1, 2, 3, 2, 1].into_iter().collect();

        assert!(list.contains(&3));
        assert!(!list.contains(&4));
        assert_eq!(list.index_of(&2), Some(1));
        assert_eq!(list.last_index_of(&2), Some(3));
        assert_eq!(list.index_of(&4), None);

        assert!(list.remove_item(&2));
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), [1, 3, 2, 1]);
        assert!(!list.remove_item(&4));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn contains_all_and_to_vec() {
        let mut list: TreeList<u32> = [4, 8, 15, 16, 23, 42].into_iter().collect();

        assert!(list.contains_all(&[]));
        assert!(list.contains_all(&[42, 4, 15]));
        assert!(!list.contains_all(&[4, 5]));

        assert_eq!(list.to_vec(), [4, 8, 15, 16, 23, 42]);

        list.remove(2);
        assert_eq!(list.to_vec(), [4, 8, 16, 23, 42]);
        assert!(!list.contains_all(&[15]));

        list.clear();
        assert!(list.to_vec().is_empty());
    }

    #[test]
    fn iterates_both_ways() {
        let list = letters();

        assert_eq!(list.iter().rev().collect::<String>(), "EDCBA");

        let mut iter = list.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next(), Some(&'A'));
        assert_eq!(iter.next_back(), Some(&'E'));
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.collect::<String>(), "BCD");

        assert_eq!(format!("{list:?}"), "['A', 'B', 'C', 'D', 'E']");
    }

    #[test]
    fn unsupported_operations() {
        let mut list = letters();

        assert_eq!(list.set(0, 'Z'), Err(Error::Unsupported("set")));
        assert_eq!(list.insert(0, 'Z'), Err(Error::Unsupported("insert")));
        assert!(matches!(
            list.sublist(0..2),
            Err(Error::Unsupported("sublist"))
        ));
        assert_eq!(list.remove_all(&['A']), Err(Error::Unsupported("remove_all")));
        assert_eq!(list.retain_all(&['A']), Err(Error::Unsupported("retain_all")));

        assert_eq!(list.iter().collect::<String>(), "ABCDE");
    }

    #[test]
    fn clear_resets() {
        let mut list = letters();
        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.iter().next(), None);

        list.push('Q');
        assert_eq!(list.get(0), Ok(&'Q'));
    }
}
