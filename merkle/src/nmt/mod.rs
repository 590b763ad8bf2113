//! Namespaced Merkle tree (NMT) with range proofs.
//!
//! Every node of an NMT carries the minimum and maximum namespace of the leaves below it, which lets
//! a verifier check that a proof covers *every* leaf of some namespace. Leaves must be pushed in
//! non-decreasing namespace order.
//!
//! Leaves are the raw bytes `namespace || data`, where the namespace is the first `N` bytes. Nodes
//! are serialized as `min || max || digest` and hashed with domain separation:
//!
//! ```text
//! leaf  = (ns, ns, SHA256(0x00 || ns || data))
//! inner = (left.min, max, SHA256(0x01 || left || right))
//! ```
//!
//! When the hasher ignores the maximum namespace (the default for erasure coded rows), the all-`0xFF`
//! namespace of parity leaves does not leak into the `max` of a node that also covers original leaves.
//!
//! # Example
//!
//! ```rust
//! use tessera_merkle::nmt::{Hasher, Tree};
//!
//! let mut tree = Tree::<1>::new(Hasher::default());
//! for leaf in [b"\x01a", b"\x01b", b"\x02c"] {
//!     tree.push(leaf).unwrap();
//! }
//! let root = tree.root().unwrap();
//! let proof = tree.prove_range(0, 2).unwrap();
//! let leaves: [&[u8]; 2] = [b"\x01a", b"\x01b"];
//! assert!(proof.verify_inclusion(&Hasher::default(), &root, &leaves).is_ok());
//! ```

use crate::DIGEST_SIZE;
use commonware_utils::hex;
use thiserror::Error;

mod hasher;
mod proof;
mod tree;

pub use hasher::Hasher;
pub use proof::Proof;
pub use tree::Tree;

/// Errors that can occur when building, proving, or verifying a namespaced Merkle tree.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("leaf too short: {0} < {1}")]
    LeafTooShort(usize, usize),
    #[error("leaf namespace smaller than previous leaf")]
    UnorderedLeaf,
    #[error("sibling namespaces out of order")]
    UnorderedSiblings,
    #[error("invalid range: {0}..{1} of {2} leaves")]
    InvalidRange(usize, usize, usize),
    #[error("empty range")]
    EmptyRange,
    #[error("leaf count mismatch: {0} != {1}")]
    LeafCountMismatch(usize, usize),
    #[error("missing nodes in proof")]
    MissingNodes,
    #[error("invalid node size: {0}")]
    InvalidNodeSize(usize),
    #[error("root mismatch")]
    RootMismatch,
}

/// A node of a namespaced Merkle tree with `N` byte namespaces.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node<const N: usize> {
    pub min: [u8; N],
    pub max: [u8; N],
    pub digest: [u8; DIGEST_SIZE],
}

impl<const N: usize> Node<N> {
    /// Serialized size of a node.
    pub const SIZE: usize = 2 * N + DIGEST_SIZE;

    /// Serialize the node as `min || max || digest`.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.min);
        out.extend_from_slice(&self.max);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Deserialize a node produced by [Node::to_vec].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != Self::SIZE {
            return Err(Error::InvalidNodeSize(bytes.len()));
        }
        let mut min = [0u8; N];
        let mut max = [0u8; N];
        let mut digest = [0u8; DIGEST_SIZE];
        min.copy_from_slice(&bytes[..N]);
        max.copy_from_slice(&bytes[N..2 * N]);
        digest.copy_from_slice(&bytes[2 * N..]);
        Ok(Self { min, max, digest })
    }
}

impl<const N: usize> std::fmt::Debug for Node<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("min", &hex(&self.min))
            .field("max", &hex(&self.max))
            .field("digest", &hex(&self.digest))
            .finish()
    }
}
