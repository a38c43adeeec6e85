//! An intrusive augmented AVL tree, and an order-statistics list built on it.
//!
//! Every node of an [`AvlTree`] caches an aggregate of its subtree (its "property"), described
//! by an [`Augment`] strategy. Besides the usual search and removal by key, the tree can be
//! searched and pruned by property: the strategy decides at each node whether the target lies to
//! the left, to the right, or at the node itself. With [`SubtreeSize`] this is an order-statistic
//! query, which [`TreeList`] uses for positional access.

// Conventions used in comments:
// - The height of a missing child is 0; the height of a node is one more than the larger of its
//   children's heights.
// - The balance factor of a node is `h(right) - h(left)`.
//
// The invariants of the tree are:
// 1. All balance factors are -1, 0 or 1.
// 2. The property of every node is `augment(left.property, right.property)`, where a missing
//    child contributes the default property.
// 3. An in-order traversal yields keys in non-decreasing order, with equal keys in insertion
//    order. Insertion descends right whenever `current.key <= key`.

use core::{
    cell::UnsafeCell,
    cmp::{self, Ordering},
    fmt,
    marker::{PhantomData, PhantomPinned},
    mem,
    ops::Not,
    pin::Pin,
    ptr::NonNull,
};
use std::borrow::Borrow;

use cordyceps::Linked;

mod augment;
mod cursor;
mod debug;
mod error;
mod iter;
pub mod list;
pub mod map;
#[cfg(any(test, feature = "model"))]
pub mod model;


pub use augment::{Augment, Propagation, Subtree, SubtreeSize};
pub use cursor::{Cursor, CursorMut};
pub use error::{Error, Result};
pub use iter::Iter;
pub use list::TreeList;
pub use map::AugmentedMap;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree whose nodes cache a per-subtree aggregate.
///
/// Nodes are handed to the tree as [`Linked::Handle`]s and handed back on removal. Each node is
/// owned by exactly one link: its parent's, or the tree's root link.
pub struct AvlTree<T, A>
where
    T: TreeNode<Links<T, A>> + ?Sized,
    A: Augment,
{
    root: Link<T>,
    len: usize,
    _augment: PhantomData<fn() -> A>,
}

/// The links embedded in every node of an [`AvlTree`].
pub struct Links<T: ?Sized, A: Augment> {
    inner: UnsafeCell<LinksInner<T, A>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized, A: Augment> {
    children: [Link<T>; 2],
    height: u8,
    property: A::Property,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

impl<T, A> AvlTree<T, A>
where
    T: TreeNode<Links<T, A>> + ?Sized,
    A: Augment,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T, A> {
        AvlTree {
            root: None,
            len: 0,
            _augment: PhantomData,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree, which is 0 for an empty tree.
    pub fn height(&self) -> usize {
        unsafe { Self::height_of(self.root).into() }
    }

    /// Returns the property of the whole tree, or `None` if the tree is empty.
    pub fn property(&self) -> Option<&A::Property> {
        let root = self.root?;
        unsafe { Some(Self::links(root).property()) }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        A::Property: PartialEq + fmt::Debug,
    {
        let count = match self.root {
            Some(root) => unsafe { self.assert_invariants_at(root).1 },
            None => 0,
        };

        assert_eq!(count, self.len, "`len` does not match the number of linked nodes");

        // Ensure keys are in non-decreasing order.
        let mut keys = self.iter().map(|node| node.key());
        if let Some(mut prev) = keys.next() {
            for key in keys {
                assert!(prev <= key, "keys out of order");
                prev = key;
            }
        }
    }

    // Returns the height of and the number of nodes in the subtree at `node`.
    #[allow(clippy::only_used_in_recursion)]
    unsafe fn assert_invariants_at(&self, node: NonNull<T>) -> (u8, usize)
    where
        A::Property: PartialEq + fmt::Debug,
    {
        unsafe {
            let links = Self::links(node);
            let mut heights = [0; 2];
            let mut count = 1;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = links.child(dir) {
                    let (height, child_count) = self.assert_invariants_at(child);
                    heights[dir as usize] = height;
                    count += child_count;
                }
            }

            let [left, right] = heights;

            // Ensure the node is balanced.
            let balance = i16::from(right) - i16::from(left);
            assert!(
                (-1..=1).contains(&balance),
                "balance factor {balance} out of range"
            );

            // Ensure the cached height and property are current.
            assert_eq!(links.height(), cmp::max(left, right) + 1, "stale height");

            let nil = A::default_property();
            let expected = A::augment(
                Self::property_of(links.left(), &nil),
                Self::property_of(links.right(), &nil),
            );
            assert_eq!(links.property(), &expected, "stale property");

            (links.height(), count)
        }
    }

    /// Returns a reference to a node whose key equals `key`.
    ///
    /// If several nodes share the key, the first one on the search path is returned.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to a node whose key equals `key`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that neither the links nor the key of the returned node are
    /// modified.
    pub unsafe fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => opt_cur = Self::links(cur).left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = Self::links(cur).right(),
                }
            }
        }
    }

    /// Returns a reference to the node located by a property search for `target`.
    pub fn get_by_property(&self, target: A::Property) -> Option<Pin<&T>> {
        let ptr = self.get_by_property_raw(target)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    fn get_by_property_raw(&self, mut target: A::Property) -> Link<T> {
        let nil = A::default_property();
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match A::property_search(Self::subtree(cur, &nil), target) {
                    Propagation::Left(retarget) => {
                        target = retarget;
                        opt_cur = Self::links(cur).left();
                    }
                    Propagation::Right(retarget) => {
                        target = retarget;
                        opt_cur = Self::links(cur).right();
                    }
                    Propagation::Stop => return Some(cur),
                }
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        let first = self.extreme(Dir::Left)?;
        unsafe { Some(Pin::new_unchecked(first.as_ref())) }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        let last = self.extreme(Dir::Right)?;
        unsafe { Some(Pin::new_unchecked(last.as_ref())) }
    }

    fn extreme(&self, dir: Dir) -> Link<T> {
        let mut cur = self.root?;

        while let Some(child) = unsafe { Self::links(cur).child(dir) } {
            cur = child;
        }

        Some(cur)
    }

    /// Returns an iterator over the elements of the tree in key order.
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter::new(self)
    }

    /// Inserts an item into the tree.
    ///
    /// Items with equal keys are all kept; a new item is placed after every existing item with an
    /// equal key. This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) {
        let ptr = T::into_ptr(item);

        unsafe {
            self.root = Some(Self::insert_at(self.root, ptr));
        }

        self.len += 1;
    }

    // Inserts `item` into the subtree at `opt_node`, returning the new root of the subtree.
    unsafe fn insert_at(opt_node: Link<T>, item: NonNull<T>) -> NonNull<T> {
        unsafe {
            let Some(node) = opt_node else {
                // Found the empty link. `item` becomes a leaf here.
                let links = Self::links_mut(item);
                links.set_left(None);
                links.set_right(None);
                Self::maintain(item);
                return item;
            };

            let dir = if node.as_ref().key() <= item.as_ref().key() {
                Dir::Right
            } else {
                Dir::Left
            };

            let child = Self::insert_at(Self::links(node).child(dir), item);
            Self::links_mut(node).set_child(dir, Some(child));

            Self::balance(node)
        }
    }

    /// Removes a node whose key equals `key` and returns it.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let (root, removed) = unsafe { Self::remove_by_key_at(self.root, key) };
        self.root = root;

        let removed = removed?;
        self.len -= 1;

        unsafe { Some(T::from_ptr(removed)) }
    }

    /// Removes the node located by a property search for `target` and returns it.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove_by_property(&mut self, target: A::Property) -> Option<T::Handle> {
        let nil = A::default_property();
        let (root, removed) = unsafe { Self::remove_by_property_at(self.root, target, &nil) };
        self.root = root;

        let removed = removed?;
        self.len -= 1;

        unsafe { Some(T::from_ptr(removed)) }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let root = self.root?;

        unsafe {
            let (root, min) = Self::remove_min_at(root);
            self.root = root;
            self.len -= 1;

            Self::links_mut(min).clear();
            Some(T::from_ptr(min))
        }
    }

    // Returns the new root of the subtree at `opt_node` and the removed node, if any. If nothing
    // matches `key`, the subtree is returned unchanged.
    unsafe fn remove_by_key_at<Q>(opt_node: Link<T>, key: &Q) -> (Link<T>, Link<T>)
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let Some(node) = opt_node else {
            return (None, None);
        };

        unsafe {
            let dir = match key.cmp(node.as_ref().key().borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return (Self::unlink(node), Some(node)),
                Ordering::Greater => Dir::Right,
            };

            let (child, removed) = Self::remove_by_key_at(Self::links(node).child(dir), key);
            if removed.is_none() {
                return (Some(node), None);
            }

            Self::links_mut(node).set_child(dir, child);
            (Some(Self::balance(node)), removed)
        }
    }

    // Property-guided twin of `remove_by_key_at`.
    unsafe fn remove_by_property_at(
        opt_node: Link<T>,
        target: A::Property,
        nil: &A::Property,
    ) -> (Link<T>, Link<T>) {
        let Some(node) = opt_node else {
            return (None, None);
        };

        unsafe {
            let (dir, target) = match A::property_search(Self::subtree(node, nil), target) {
                Propagation::Left(retarget) => (Dir::Left, retarget),
                Propagation::Right(retarget) => (Dir::Right, retarget),
                Propagation::Stop => return (Self::unlink(node), Some(node)),
            };

            let (child, removed) =
                Self::remove_by_property_at(Self::links(node).child(dir), target, nil);
            if removed.is_none() {
                return (Some(node), None);
            }

            Self::links_mut(node).set_child(dir, child);
            (Some(Self::balance(node)), removed)
        }
    }

    // Detaches `node` from the subtree it roots, returning the root of the subtree that takes its
    // place. `node`'s links are reset.
    unsafe fn unlink(node: NonNull<T>) -> Link<T> {
        unsafe {
            let left = Self::links(node).left();
            let right = Self::links(node).right();

            let replacement = match (left, right) {
                (None, None) => None,
                (Some(child), None) | (None, Some(child)) => Some(child),
                (Some(left), Some(right)) => {
                    // The minimum of the right subtree takes over the position of `node`, so the
                    // structural removal happens at a node with at most one child.
                    let (right, successor) = Self::remove_min_at(right);

                    let successor_links = Self::links_mut(successor);
                    successor_links.set_left(Some(left));
                    successor_links.set_right(right);

                    Some(Self::balance(successor))
                }
            };

            Self::links_mut(node).clear();
            replacement
        }
    }

    // Detaches the minimum node of the subtree at `node`, returning the new root of the subtree
    // and the detached node. The detached node's links are not reset.
    unsafe fn remove_min_at(node: NonNull<T>) -> (Link<T>, NonNull<T>) {
        unsafe {
            match Self::links(node).left() {
                None => {
                    let right = Self::links_mut(node).set_right(None);
                    (right, node)
                }
                Some(left) => {
                    let (left, min) = Self::remove_min_at(left);
                    Self::links_mut(node).set_left(left);
                    (Some(Self::balance(node)), min)
                }
            }
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(len = self.len, "clearing tree");

        if let Some(root) = self.root.take() {
            unsafe { Self::drop_subtree(root) };
        }

        self.len = 0;
    }

    unsafe fn drop_subtree(node: NonNull<T>) {
        unsafe {
            let links = Self::links_mut(node);
            let children = [links.set_left(None), links.set_right(None)];

            for child in children.into_iter().flatten() {
                Self::drop_subtree(child);
            }

            drop(T::from_ptr(node));
        }
    }

    // Rebalancing ============================================================

    // Recomputes the height and property of `node`, then restores its balance, returning the new
    // root of the subtree.
    //
    // Both children of `node` must already be balanced and current.
    unsafe fn balance(node: NonNull<T>) -> NonNull<T> {
        unsafe {
            Self::maintain(node);

            let balance = Self::balance_factor(node);
            let heavy = match balance {
                -1..=1 => return node,
                2 => Dir::Right,
                -2 => Dir::Left,
                _ => unreachable!("balance factor {balance} out of range"),
            };

            let child = Self::links(node)
                .child(heavy)
                .expect("heavy side of an unbalanced node is empty");

            if Self::balance_factor(child) * balance < 0 {
                // The heavy child leans towards the light side: double rotation.
                #[cfg(feature = "tracing")]
                tracing::trace!(balance, ?heavy, "double rotation");

                let up = Self::rotate(child, heavy);
                Self::links_mut(node).set_child(heavy, Some(up));
            } else {
                #[cfg(feature = "tracing")]
                tracing::trace!(balance, ?heavy, "single rotation");
            }

            let up = Self::rotate(node, !heavy);
            debug_assert!(Self::balance_factor(up).abs() <= 1);

            up
        }
    }

    // Performs a rotation, moving `down`'s `!dir` child up into its place and `down` down into
    // that child's `dir` slot. Returns the promoted node.
    //
    // The demoted node is recomputed before the promoted one.
    unsafe fn rotate(down: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let up = Self::links(down)
                .child(!dir)
                .expect("rotation requires a child to promote");

            // `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
            let across = Self::links(up).child(dir);
            Self::links_mut(down).set_child(!dir, across);
            Self::maintain(down);

            Self::links_mut(up).set_child(dir, Some(down));
            Self::maintain(up);

            up
        }
    }

    // Recomputes the height and property of `node` from its children.
    unsafe fn maintain(node: NonNull<T>) {
        unsafe {
            let left = Self::links(node).left();
            let right = Self::links(node).right();

            let height = cmp::max(Self::height_of(left), Self::height_of(right))
                .checked_add(1)
                .unwrap();

            let nil = A::default_property();
            let property = A::augment(Self::property_of(left, &nil), Self::property_of(right, &nil));

            Self::links_mut(node).update(height, property);
        }
    }

    // Support methods ========================================================

    #[inline]
    unsafe fn links<'a>(node: NonNull<T>) -> &'a Links<T, A> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    unsafe fn links_mut<'a>(node: NonNull<T>) -> &'a mut Links<T, A> {
        unsafe { T::links(node).as_mut() }
    }

    /// Returns the height of the pointed-to node.
    #[inline]
    unsafe fn height_of(node: Link<T>) -> u8 {
        node.map(|n| unsafe { Self::links(n).height() }).unwrap_or(0)
    }

    #[inline]
    unsafe fn property_of<'a>(node: Link<T>, nil: &'a A::Property) -> &'a A::Property
    where
        T: 'a,
        A: 'a,
    {
        match node {
            Some(n) => unsafe { Self::links(n).property() },
            None => nil,
        }
    }

    unsafe fn balance_factor(node: NonNull<T>) -> i16 {
        unsafe {
            let links = Self::links(node);
            i16::from(Self::height_of(links.right())) - i16::from(Self::height_of(links.left()))
        }
    }

    unsafe fn subtree<'a>(node: NonNull<T>, nil: &'a A::Property) -> Subtree<'a, A::Property>
    where
        T: 'a,
        A: 'a,
    {
        unsafe {
            let links = Self::links(node);

            Subtree {
                property: links.property(),
                left: Self::property_of(links.left(), nil),
                right: Self::property_of(links.right(), nil),
            }
        }
    }
}

impl<T, A> Default for AvlTree<T, A>
where
    T: TreeNode<Links<T, A>> + ?Sized,
    A: Augment,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> Drop for AvlTree<T, A>
where
    T: TreeNode<Links<T, A>> + ?Sized,
    A: Augment,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized, A: Augment> Links<T, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                children: [None; 2],
                height: 0,
                property: A::default_property(),
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn height(&self) -> u8 {
        unsafe { (*self.inner.get()).height }
    }

    #[inline]
    fn property(&self) -> &A::Property {
        unsafe { &(*self.inner.get()).property }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn update(&mut self, height: u8, property: A::Property) {
        let inner = self.inner.get_mut();
        inner.height = height;
        inner.property = property;
    }

    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.children = [None; 2];
        inner.height = 0;
        inner.property = A::default_property();
    }
}

impl<T: ?Sized, A: Augment> Default for Links<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, A> fmt::Debug for Links<T, A>
where
    A: Augment,
    A::Property: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("left", &self.left())
            .field("right", &self.right())
            .field("height", &self.height())
            .field("property", self.property())
            .finish()
    }
}
