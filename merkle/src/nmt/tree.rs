use super::{Error, Hasher, Node, Proof};
use crate::split_point;

/// An in-memory namespaced Merkle tree.
#[derive(Clone, Debug)]
pub struct Tree<const N: usize> {
    hasher: Hasher<N>,
    leaves: Vec<Node<N>>,
}

impl<const N: usize> Tree<N> {
    /// Create an empty tree.
    pub fn new(hasher: Hasher<N>) -> Self {
        Self::with_capacity(hasher, 0)
    }

    /// Create an empty tree with room for `capacity` leaves.
    pub fn with_capacity(hasher: Hasher<N>, capacity: usize) -> Self {
        Self {
            hasher,
            leaves: Vec::with_capacity(capacity),
        }
    }

    /// Number of leaves in the tree.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Append a raw leaf (`namespace || data`). The namespace must not be smaller than that of the
    /// previously pushed leaf.
    pub fn push(&mut self, leaf: &[u8]) -> Result<(), Error> {
        let node = self.hasher.leaf(leaf)?;
        if let Some(last) = self.leaves.last() {
            if node.min < last.min {
                return Err(Error::UnorderedLeaf);
            }
        }
        self.leaves.push(node);
        Ok(())
    }

    /// Root of the tree.
    pub fn root(&self) -> Result<Node<N>, Error> {
        self.subtree_root(0, self.leaves.len())
    }

    fn subtree_root(&self, start: usize, end: usize) -> Result<Node<N>, Error> {
        match end - start {
            0 => Ok(self.hasher.empty_root()),
            1 => Ok(self.leaves[start]),
            n => {
                let k = split_point(n);
                let left = self.subtree_root(start, start + k)?;
                let right = self.subtree_root(start + k, end)?;
                self.hasher.node(&left, &right)
            }
        }
    }

    /// Generate an inclusion proof for the leaves in `[start, end)`.
    ///
    /// The proof contains the roots of the maximal subtrees outside the range, ordered left to right.
    pub fn prove_range(&self, start: usize, end: usize) -> Result<Proof<N>, Error> {
        let size = self.leaves.len();
        if start >= end || end > size {
            return Err(Error::InvalidRange(start, end, size));
        }
        let full = (split_point(size) * 2).max(1);
        let mut nodes = Vec::new();
        self.collect(0, full, start, end, true, &mut nodes)?;
        Ok(Proof { start, end, nodes })
    }

    /// Walk the subtree `[lo, hi)` of the power-of-two padded tree, returning its root (`None` if it
    /// holds no leaves) and recording the roots of subtrees disjoint from `[start, end)`.
    fn collect(
        &self,
        lo: usize,
        hi: usize,
        start: usize,
        end: usize,
        include: bool,
        nodes: &mut Vec<Node<N>>,
    ) -> Result<Option<Node<N>>, Error> {
        if lo >= self.leaves.len() {
            return Ok(None);
        }
        let include_children = include && hi > start && lo < end;
        if hi - lo == 1 {
            let leaf = self.leaves[lo];
            if include && !include_children {
                nodes.push(leaf);
            }
            return Ok(Some(leaf));
        }

        let k = split_point(hi - lo);
        let left = self.collect(lo, lo + k, start, end, include_children, nodes)?;
        let right = self.collect(lo + k, hi, start, end, include_children, nodes)?;
        let node = match (left, right) {
            (Some(left), Some(right)) => self.hasher.node(&left, &right)?,
            (Some(left), None) => left,
            (None, _) => return Ok(None),
        };
        if include && !include_children {
            nodes.push(node);
        }
        Ok(Some(node))
    }
}
