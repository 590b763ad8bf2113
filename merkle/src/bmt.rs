//! Binary Merkle tree over arbitrary byte slices.
//!
//! Leaves and inner nodes are domain separated the way RFC 6962 does it:
//!
//! ```text
//! leaf  = SHA256(0x00 || leaf_bytes)
//! inner = SHA256(0x01 || left || right)
//! empty = SHA256("")
//! ```
//!
//! A list of `n > 1` leaves is split at the largest power of two strictly less than `n`, so trees
//! over non power-of-two lists are left-heavy.
//!
//! # Example
//!
//! ```rust
//! use tessera_merkle::bmt;
//!
//! let leaves = [b"a".as_slice(), b"b", b"c"];
//! let root = bmt::root(&leaves);
//! let proof = bmt::proof(&leaves, 2).unwrap();
//! assert!(proof.verify(&root, b"c").is_ok());
//! ```

use crate::{split_point, DIGEST_SIZE};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

const LEAF_PREFIX: u8 = 0;
const NODE_PREFIX: u8 = 1;

/// A SHA-256 digest.
pub type Digest = [u8; DIGEST_SIZE];

/// Errors that can occur when proving or verifying membership in a binary Merkle tree.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("index {0} out of range for {1} leaves")]
    IndexOutOfRange(usize, usize),
    #[error("leaf digest mismatch")]
    LeafMismatch,
    #[error("invalid aunts")]
    InvalidAunts,
    #[error("root mismatch")]
    RootMismatch,
}

/// Digest of a tree without leaves.
pub fn empty_root() -> Digest {
    Sha256::digest(b"").into()
}

/// Digest of a single leaf.
pub fn leaf_digest(leaf: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(leaf);
    hasher.finalize().into()
}

/// Digest of an inner node.
pub fn node_digest(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Root of the tree over `leaves`.
pub fn root<T: AsRef<[u8]>>(leaves: &[T]) -> Digest {
    match leaves.len() {
        0 => empty_root(),
        1 => leaf_digest(leaves[0].as_ref()),
        n => {
            let k = split_point(n);
            node_digest(&root(&leaves[..k]), &root(&leaves[k..]))
        }
    }
}

/// Membership proof for a single leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    /// Number of leaves in the tree.
    pub total: usize,
    /// Position of the proven leaf.
    pub index: usize,
    /// Digest of the proven leaf.
    pub leaf_hash: Digest,
    /// Sibling digests from the bottom of the tree to the top.
    pub aunts: Vec<Digest>,
}

/// Generate a membership proof for the leaf at `index`.
pub fn proof<T: AsRef<[u8]>>(leaves: &[T], index: usize) -> Result<Proof, Error> {
    if index >= leaves.len() {
        return Err(Error::IndexOutOfRange(index, leaves.len()));
    }
    let mut aunts = Vec::new();
    collect_aunts(leaves, index, &mut aunts);
    Ok(Proof {
        total: leaves.len(),
        index,
        leaf_hash: leaf_digest(leaves[index].as_ref()),
        aunts,
    })
}

fn collect_aunts<T: AsRef<[u8]>>(leaves: &[T], index: usize, aunts: &mut Vec<Digest>) {
    if leaves.len() < 2 {
        return;
    }
    let k = split_point(leaves.len());
    if index < k {
        collect_aunts(&leaves[..k], index, aunts);
        aunts.push(root(&leaves[k..]));
    } else {
        collect_aunts(&leaves[k..], index - k, aunts);
        aunts.push(root(&leaves[..k]));
    }
}

impl Proof {
    /// Verify that `leaf` is committed to by `root` at `self.index`.
    pub fn verify(&self, root: &Digest, leaf: &[u8]) -> Result<(), Error> {
        if leaf_digest(leaf) != self.leaf_hash {
            return Err(Error::LeafMismatch);
        }
        let computed = compute_from_aunts(self.index, self.total, self.leaf_hash, &self.aunts)
            .ok_or(Error::InvalidAunts)?;
        if computed != *root {
            return Err(Error::RootMismatch);
        }
        Ok(())
    }
}

fn compute_from_aunts(index: usize, total: usize, leaf: Digest, aunts: &[Digest]) -> Option<Digest> {
    if index >= total {
        return None;
    }
    if total == 1 {
        return aunts.is_empty().then_some(leaf);
    }
    let (last, rest) = aunts.split_last()?;
    let k = split_point(total);
    if index < k {
        let left = compute_from_aunts(index, k, leaf, rest)?;
        Some(node_digest(&left, last))
    } else {
        let right = compute_from_aunts(index - k, total - k, leaf, rest)?;
        Some(node_digest(last, &right))
    }
}
