//! Sizes and defaults shared by every share layout.

/// Size of a share in bytes.
pub const SHARE_SIZE: usize = 512;

/// Size of the namespace version prefix.
pub const NAMESPACE_VERSION_SIZE: usize = 1;

/// Size of the namespace id.
pub const NAMESPACE_ID_SIZE: usize = 28;

/// Size of a namespace (version and id).
pub const NAMESPACE_SIZE: usize = NAMESPACE_VERSION_SIZE + NAMESPACE_ID_SIZE;

/// Number of leading zero bytes in the id of a version 0 namespace.
pub const NAMESPACE_VERSION_ZERO_PREFIX_SIZE: usize = 18;

/// Number of user controlled bytes in the id of a version 0 namespace.
pub const NAMESPACE_VERSION_ZERO_ID_SIZE: usize = NAMESPACE_ID_SIZE - NAMESPACE_VERSION_ZERO_PREFIX_SIZE;

/// Size of the info byte (share version and sequence start flag).
pub const SHARE_INFO_BYTES: usize = 1;

/// Size of the big-endian sequence length carried by the first share of a sequence.
pub const SEQUENCE_LEN_BYTES: usize = 4;

/// Size of the reserved bytes carried by every compact share.
pub const COMPACT_SHARE_RESERVED_BYTES: usize = 4;

/// Size of the signer carried by the first share of a share version 1 blob.
pub const SIGNER_SIZE: usize = 20;

/// Bytes of content in the first compact share of a sequence.
pub const FIRST_COMPACT_SHARE_CONTENT_SIZE: usize =
    SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES - SEQUENCE_LEN_BYTES - COMPACT_SHARE_RESERVED_BYTES;

/// Bytes of content in every other compact share.
pub const CONTINUATION_COMPACT_SHARE_CONTENT_SIZE: usize =
    SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES - COMPACT_SHARE_RESERVED_BYTES;

/// Bytes of content in the first sparse share of a sequence.
pub const FIRST_SPARSE_SHARE_CONTENT_SIZE: usize =
    SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES - SEQUENCE_LEN_BYTES;

/// Bytes of content in every other sparse share.
pub const CONTINUATION_SPARSE_SHARE_CONTENT_SIZE: usize = SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES;

/// Share version without a signer.
pub const SHARE_VERSION_ZERO: u8 = 0;

/// Share version whose first share carries the blob signer.
pub const SHARE_VERSION_ONE: u8 = 1;

/// Largest share version that fits in the info byte.
pub const MAX_SHARE_VERSION: u8 = 127;

/// Default cap on the number of subtree roots a blob commitment is built from.
pub const DEFAULT_SUBTREE_ROOT_THRESHOLD: usize = 64;

/// Default upper bound on the side of a square.
pub const DEFAULT_MAX_SQUARE_SIZE: usize = 128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_sizes() {
        assert_eq!(FIRST_COMPACT_SHARE_CONTENT_SIZE, 474);
        assert_eq!(CONTINUATION_COMPACT_SHARE_CONTENT_SIZE, 478);
        assert_eq!(FIRST_SPARSE_SHARE_CONTENT_SIZE, 478);
        assert_eq!(FIRST_SPARSE_SHARE_CONTENT_SIZE - SIGNER_SIZE, 458);
        assert_eq!(CONTINUATION_SPARSE_SHARE_CONTENT_SIZE, 482);
    }
}
