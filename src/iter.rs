use core::{marker::PhantomData, ptr::NonNull};
use std::vec::Vec;

use crate::{Augment, AvlTree, Link, Links, TreeNode};

/// An in-order iterator over the elements of an [`AvlTree`].
pub struct Iter<'tree, T, A>
where
    T: TreeNode<Links<T, A>> + ?Sized,
    A: Augment,
{
    // The nodes whose left subtrees are being visited, innermost last.
    stack: Vec<NonNull<T>>,
    len: usize,
    phantom: PhantomData<&'tree AvlTree<T, A>>,
}

impl<'tree, T, A> Iter<'tree, T, A>
where
    T: TreeNode<Links<T, A>> + ?Sized,
    A: Augment,
{
    pub(crate) fn new(tree: &'tree AvlTree<T, A>) -> Self {
        let mut iter = Iter {
            stack: Vec::with_capacity(tree.height()),
            len: tree.len(),
            phantom: PhantomData,
        };

        iter.descend_left(tree.root);
        iter
    }

    // Upon entering a new subtree, push the path to its minimum element.
    fn descend_left(&mut self, mut opt_cur: Link<T>) {
        while let Some(cur) = opt_cur {
            self.stack.push(cur);
            opt_cur = unsafe { T::links(cur).as_ref().left() };
        }
    }
}

impl<'tree, T, A> Iterator for Iter<'tree, T, A>
where
    T: TreeNode<Links<T, A>> + ?Sized,
    A: Augment,
{
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        // The left subtree of the top node has been exhausted, so it is up next.
        let cur = self.stack.pop()?;

        self.descend_left(unsafe { T::links(cur).as_ref().right() });
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, T, A> ExactSizeIterator for Iter<'tree, T, A>
where
    T: TreeNode<Links<T, A>> + ?Sized,
    A: Augment,
{
}
