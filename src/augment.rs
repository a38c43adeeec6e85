//! Per-subtree aggregates maintained by [`AvlTree`](crate::AvlTree).

/// A strategy describing the aggregate ("property") cached at every node of an augmented tree.
///
/// The property of a node is always computed from the properties of its two children alone, so
/// recomputing it after a rotation costs O(1) per node.
pub trait Augment {
    type Property;

    /// Returns the property of an empty subtree.
    ///
    /// This should behave as an identity for [`augment`](Augment::augment).
    fn default_property() -> Self::Property;

    /// Computes the property of a node from the properties of its left and right subtrees.
    fn augment(left: &Self::Property, right: &Self::Property) -> Self::Property;

    /// Decides where a search for `target` continues at `node`.
    ///
    /// Implementations must agree with [`augment`](Augment::augment) such that at most one child
    /// subtree can contain any given target, and every retargeted value must bring the search
    /// closer to termination.
    fn property_search(
        node: Subtree<'_, Self::Property>,
        target: Self::Property,
    ) -> Propagation<Self::Property>;
}

/// The cached properties visible at a node during a property search.
#[derive(Debug)]
pub struct Subtree<'a, P> {
    /// The property of the subtree rooted at the node.
    pub property: &'a P,
    /// The property of the node's left subtree.
    pub left: &'a P,
    /// The property of the node's right subtree.
    pub right: &'a P,
}

impl<P> Clone for Subtree<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Subtree<'_, P> {}

/// The outcome of one step of a property search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Propagation<P> {
    /// Continue in the left subtree, searching for the contained target.
    Left(P),
    /// Continue in the right subtree, searching for the contained target.
    Right(P),
    /// The current node is the result.
    Stop,
}

/// Subtree node count, the augmentation behind order-statistic queries.
///
/// Targets are 1-based ranks: searching for `k` finds the `k`-th node in key order.
#[derive(Copy, Clone, Debug, Default)]
pub struct SubtreeSize;

impl Augment for SubtreeSize {
    type Property = usize;

    #[inline]
    fn default_property() -> usize {
        0
    }

    #[inline]
    fn augment(left: &usize, right: &usize) -> usize {
        left + right + 1
    }

    fn property_search(node: Subtree<'_, usize>, target: usize) -> Propagation<usize> {
        // `property - right` is the rank of the node itself within its subtree.
        let rank = node.property - node.right;

        if rank < target {
            Propagation::Right(target - node.left - 1)
        } else if rank > target {
            Propagation::Left(target)
        } else {
            Propagation::Stop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtree<'a>(property: &'a usize, left: &'a usize, right: &'a usize) -> Subtree<'a, usize> {
        Subtree {
            property,
            left,
            right,
        }
    }

    #[test]
    fn subtree_size_counts_nodes() {
        assert_eq!(SubtreeSize::augment(&0, &0), 1);
        assert_eq!(SubtreeSize::augment(&3, &4), 8);
    }

    #[test]
    fn subtree_size_directions() {
        // A node with 2 nodes on its left and 3 on its right has rank 3.
        let (property, left, right) = (6, 2, 3);

        for target in 1..=2 {
            assert_eq!(
                SubtreeSize::property_search(subtree(&property, &left, &right), target),
                Propagation::Left(target)
            );
        }

        assert_eq!(
            SubtreeSize::property_search(subtree(&property, &left, &right), 3),
            Propagation::Stop
        );

        for target in 4..=6 {
            assert_eq!(
                SubtreeSize::property_search(subtree(&property, &left, &right), target),
                Propagation::Right(target - 3)
            );
        }
    }
}
