//! Blob share commitments.
//!
//! A blob's shares are partitioned into a merkle mountain range: successive power-of-two chunks,
//! largest first, each no wider than the blob's subtree width. Every chunk is hashed into a
//! namespaced subtree root and the ordered subtree roots are combined with a binary Merkle tree.
//!
//! The subtree width is chosen so that the chunk boundaries line up with subtree roots of the rows
//! of any square the blob can be placed in, which lets the commitment be checked against row roots.

use crate::{
    constants::{NAMESPACE_SIZE, SHARE_SIZE},
    sparse::SparseSplitter,
    Blob, Class, Error, Namespace, Share,
};
use tessera_merkle::{
    bmt,
    nmt::{Hasher, Tree},
};

/// A blob share commitment.
pub type Commitment = [u8; 32];

/// Smallest power of two that is at least `n` (1 for 0).
pub fn round_up_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Largest power of two that is at most `n`, or `None` for 0.
pub fn round_down_power_of_two(n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    Some(1 << (usize::BITS - 1 - n.leading_zeros()))
}

/// Smallest `r` with `r * r >= n`.
fn ceil_sqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while r * r < n {
        r += 1;
    }
    while r > 0 && (r - 1) * (r - 1) >= n {
        r -= 1;
    }
    r
}

/// Side of the smallest square that could hold `share_count` shares.
pub fn blob_min_square_size(share_count: usize) -> usize {
    round_up_power_of_two(ceil_sqrt(share_count))
}

/// Widest chunk a blob of `share_count` shares is committed to in.
pub fn subtree_width(share_count: usize, threshold: usize) -> usize {
    let s = share_count.div_ceil(threshold.max(1));
    round_up_power_of_two(s).min(blob_min_square_size(share_count))
}

/// Partition `total` into power-of-two sizes, largest first, none above `max_tree_size`.
pub fn merkle_mountain_range_sizes(total: usize, max_tree_size: usize) -> Result<Vec<usize>, Error> {
    let cap = round_down_power_of_two(max_tree_size).ok_or(Error::InvalidTreeSize)?;
    let mut sizes = Vec::new();
    let mut remaining = total;
    while let Some(size) = round_down_power_of_two(remaining) {
        let size = size.min(cap);
        sizes.push(size);
        remaining -= size;
    }
    Ok(sizes)
}

/// Commitment over the shares of `blob`.
pub fn create_commitment(blob: &Blob, threshold: usize) -> Result<Commitment, Error> {
    let mut splitter = SparseSplitter::new();
    splitter.write(blob);
    create_commitment_from_shares(
        &blob.namespace(),
        blob.share_version(),
        &splitter.export(),
        threshold,
    )
}

/// Commitment over already split `shares` of one blob.
pub fn create_commitment_from_shares(
    namespace: &Namespace,
    share_version: u8,
    shares: &[Share],
    threshold: usize,
) -> Result<Commitment, Error> {
    Class::of(namespace, share_version)?;
    if shares.is_empty() {
        return Err(Error::EmptyShares);
    }
    if threshold == 0 {
        return Err(Error::InvalidThreshold);
    }

    let width = subtree_width(shares.len(), threshold);
    let namespace = namespace.to_bytes();
    let mut roots = Vec::new();
    let mut cursor = 0;
    for size in merkle_mountain_range_sizes(shares.len(), width)? {
        let mut tree = Tree::<NAMESPACE_SIZE>::with_capacity(Hasher::default(), size);
        let mut leaf = Vec::with_capacity(NAMESPACE_SIZE + SHARE_SIZE);
        for share in &shares[cursor..cursor + size] {
            leaf.clear();
            leaf.extend_from_slice(&namespace);
            leaf.extend_from_slice(share.as_bytes());
            tree.push(&leaf)?;
        }
        roots.push(tree.root()?.to_vec());
        cursor += size;
    }
    Ok(bmt::root(&roots))
}
