use super::{Error, Hasher, Node};
use crate::split_point;

/// Proof that a contiguous range of leaves is included in a namespaced Merkle tree.
///
/// A proof does not record the number of leaves in the tree. The verifier rebuilds the smallest
/// power-of-two subtree that contains the range and folds any remaining nodes in as right siblings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof<const N: usize> {
    /// First leaf in the range.
    pub start: usize,
    /// One past the last leaf in the range.
    pub end: usize,
    /// Roots of the maximal subtrees outside the range, ordered left to right.
    pub nodes: Vec<Node<N>>,
}

impl<const N: usize> Proof<N> {
    /// Verify that the raw `leaves` occupy `[self.start, self.end)` of the tree with `root`.
    pub fn verify_inclusion<L: AsRef<[u8]>>(
        &self,
        hasher: &Hasher<N>,
        root: &Node<N>,
        leaves: &[L],
    ) -> Result<(), Error> {
        if self.start >= self.end {
            return Err(Error::EmptyRange);
        }
        let expected = self.end - self.start;
        if leaves.len() != expected {
            return Err(Error::LeafCountMismatch(leaves.len(), expected));
        }
        let hashed = leaves
            .iter()
            .map(|leaf| hasher.leaf(leaf.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if self.compute_root(hasher, &hashed)? != *root {
            return Err(Error::RootMismatch);
        }
        Ok(())
    }

    fn compute_root(&self, hasher: &Hasher<N>, leaves: &[Node<N>]) -> Result<Node<N>, Error> {
        let mut leaves = leaves.iter();
        let mut nodes = self.nodes.iter();
        let estimate = (split_point(self.end) * 2).max(1);
        let mut root = self
            .compute(hasher, 0, estimate, &mut leaves, &mut nodes)?
            .ok_or(Error::MissingNodes)?;
        for node in nodes {
            root = hasher.node(&root, node)?;
        }
        Ok(root)
    }

    fn compute<'a>(
        &self,
        hasher: &Hasher<N>,
        lo: usize,
        hi: usize,
        leaves: &mut impl Iterator<Item = &'a Node<N>>,
        nodes: &mut impl Iterator<Item = &'a Node<N>>,
    ) -> Result<Option<Node<N>>, Error> {
        if hi - lo == 1 && self.start <= lo && lo < self.end {
            return Ok(leaves.next().copied());
        }
        if hi <= self.start || lo >= self.end || hi - lo == 1 {
            return Ok(nodes.next().copied());
        }
        let k = split_point(hi - lo);
        let left = self.compute(hasher, lo, lo + k, leaves, nodes)?;
        let right = self.compute(hasher, lo + k, hi, leaves, nodes)?;
        match (left, right) {
            (Some(left), Some(right)) => hasher.node(&left, &right).map(Some),
            (left, None) => Ok(left),
            (None, Some(_)) => Err(Error::MissingNodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Tree;
    use super::*;

    fn build(size: u8) -> (Tree<1>, Vec<Vec<u8>>) {
        let mut tree = Tree::new(Hasher::default());
        let leaves: Vec<Vec<u8>> = (0..size).map(|i| vec![i, i]).collect();
        for leaf in &leaves {
            tree.push(leaf).unwrap();
        }
        (tree, leaves)
    }

    #[test]
    fn test_rejects_tampered_leaf() {
        let (tree, mut leaves) = build(6);
        let root = tree.root().unwrap();
        let proof = tree.prove_range(2, 4).unwrap();
        leaves[3][1] ^= 1;
        assert_eq!(
            proof.verify_inclusion(&Hasher::default(), &root, &leaves[2..4]),
            Err(Error::RootMismatch)
        );
    }

    #[test]
    fn test_rejects_wrong_leaf_count() {
        let (tree, leaves) = build(6);
        let root = tree.root().unwrap();
        let proof = tree.prove_range(2, 4).unwrap();
        assert_eq!(
            proof.verify_inclusion(&Hasher::default(), &root, &leaves[2..5]),
            Err(Error::LeafCountMismatch(3, 2))
        );
    }

    #[test]
    fn test_rejects_shifted_range() {
        let (tree, leaves) = build(8);
        let root = tree.root().unwrap();
        let mut proof = tree.prove_range(2, 4).unwrap();
        proof.start = 4;
        proof.end = 6;
        assert!(proof
            .verify_inclusion(&Hasher::default(), &root, &leaves[2..4])
            .is_err());
    }

    #[test]
    fn test_rejects_missing_nodes() {
        let (tree, leaves) = build(8);
        let root = tree.root().unwrap();
        let mut proof = tree.prove_range(3, 4).unwrap();
        proof.nodes.clear();
        assert_eq!(
            proof.verify_inclusion(&Hasher::default(), &root, &leaves[3..4]),
            Err(Error::MissingNodes)
        );
    }

    #[test]
    fn test_rejects_empty_range() {
        let (tree, _) = build(2);
        let root = tree.root().unwrap();
        let proof = Proof::<1> {
            start: 1,
            end: 1,
            nodes: Vec::new(),
        };
        let empty: [&[u8]; 0] = [];
        assert_eq!(
            proof.verify_inclusion(&Hasher::default(), &root, &empty),
            Err(Error::EmptyRange)
        );
    }
}
