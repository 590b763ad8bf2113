//! Binary and namespaced Merkle trees with range proofs.
//!
//! # Status
//!
//! `tessera-merkle` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod bmt;
pub mod nmt;

/// Size (in bytes) of every digest produced by this crate (SHA-256).
pub const DIGEST_SIZE: usize = 32;

/// Returns the number of leaves in the left subtree of a tree with `n` leaves: the largest power
/// of two strictly less than `n`. Returns 0 for `n < 2`.
pub(crate) fn split_point(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    let k = 1usize << (usize::BITS - 1 - n.leading_zeros());
    if k == n {
        k >> 1
    } else {
        k
    }
}

#[cfg(test)]
mod tests {
    use super::split_point;
    use test_case::test_case;

    #[test_case(0, 0)]
    #[test_case(1, 0)]
    #[test_case(2, 1)]
    #[test_case(3, 2)]
    #[test_case(4, 2)]
    #[test_case(5, 4)]
    #[test_case(8, 4)]
    #[test_case(9, 8)]
    #[test_case(1000, 512)]
    fn test_split_point(n: usize, expected: usize) {
        assert_eq!(split_point(n), expected);
    }
}
