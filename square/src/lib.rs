//! Assemble transactions and blobs into a data square and prove where a transaction landed.
//!
//! A block is an ordered list of raw transactions. Plain transactions are written first as compact
//! shares, followed by the wrapped pay-for-blobs transactions (each recording where its blobs start),
//! followed by the blobs themselves, sorted by namespace and aligned to their commitment subtrees.
//! The resulting `k x k` square is erasure coded row by row and every extended row is committed to
//! with a namespaced Merkle tree.
//!
//! [prove] regenerates only the rows a transaction touches and returns one range proof per row.
//! [prove_shares] and [prove_blob] additionally prove the touched row roots against the data root.
//!
//! # Status
//!
//! `tessera-square` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

use tessera_shares::constants::{DEFAULT_MAX_SQUARE_SIZE, DEFAULT_SUBTREE_ROOT_THRESHOLD};
use thiserror::Error;

mod block;
pub use block::Block;
mod codec;
pub use codec::{extend_row, Codec, ReedSolomon};
mod layout;
pub use layout::{Layout, Placement};
mod proof;
pub use proof::{prove, prove_blob, prove_shares, RowsProof, ShareProof, TxProof};
mod rows;
pub use rows::{RowIter, Rows};
mod square;
pub use square::{build, construct, deconstruct, Builder, Square};
mod tree;
pub use tree::{row_root, row_tree};
pub mod tx;
pub mod validate;
pub mod wire;

/// First application version whose blobs may use signed (version 1) shares.
pub const SIGNED_SHARES_APP_VERSION: u64 = 3;

/// Parameters that vary with the application version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on the number of shares a commitment subtree root may cover.
    pub subtree_root_threshold: usize,
    /// Largest square side a block may use.
    pub max_square_size: usize,
    /// Whether blobs may use signed shares.
    pub signed_shares: bool,
}

impl Config {
    /// Parameters in effect for `app_version`.
    pub fn for_app_version(app_version: u64) -> Self {
        Self {
            subtree_root_threshold: DEFAULT_SUBTREE_ROOT_THRESHOLD,
            max_square_size: DEFAULT_MAX_SQUARE_SIZE,
            signed_shares: app_version >= SIGNED_SHARES_APP_VERSION,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_app_version(SIGNED_SHARES_APP_VERSION)
    }
}

/// Errors that can occur when assembling a square, validating blob transactions, or proving
/// inclusion.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to decode {0}: {1}")]
    Decode(&'static str, prost::DecodeError),
    #[error("plain transaction {0} follows a blob transaction")]
    TxAfterBlobTx(usize),
    #[error("transaction index {0} out of range for {1} transactions")]
    IndexOutOfRange(usize, usize),
    #[error("transaction {0} is not a blob transaction")]
    NotBlobTx(usize),
    #[error("blob {1} of transaction {0} not found")]
    BlobNotFound(usize, usize),
    #[error("share range {0}..{1} invalid for {2} shares")]
    InvalidShareRange(usize, usize, usize),
    #[error("share {0} is outside the namespace of the proven range")]
    MixedNamespaces(usize),
    #[error("square size {0} is not a power of two")]
    InvalidSquareSize(usize),
    #[error("square size {0} exceeds maximum {1}")]
    SquareTooLarge(usize, usize),
    #[error("max square size {0} does not fit share indexes")]
    InvalidMaxSquareSize(usize),
    #[error("square size {0} is smaller than required {1}")]
    SquareTooSmall(usize, usize),
    #[error("pay-for-blobs shares overflow reservation: {0} > {1}")]
    ReservationOverflow(usize, usize),
    #[error("blob tx has no blobs")]
    NoBlobs,
    #[error("declaration lists no blobs")]
    EmptyDeclaration,
    #[error("declaration lengths differ: {namespaces} namespaces, {sizes} sizes, {commitments} commitments, {versions} versions")]
    MismatchedDeclaration {
        namespaces: usize,
        sizes: usize,
        commitments: usize,
        versions: usize,
    },
    #[error("invalid signer size: {0}")]
    InvalidSignerSize(usize),
    #[error("invalid commitment size: {0}")]
    InvalidCommitmentSize(usize),
    #[error("declared blob {0} is empty")]
    ZeroBlobSize(usize),
    #[error("invalid share version: {0}")]
    InvalidShareVersion(u32),
    #[error("invalid namespace version: {0}")]
    InvalidNamespaceVersion(u32),
    #[error("blob tx must contain exactly one message, found {0}")]
    MessageCount(usize),
    #[error("blob tx message is not a pay-for-blobs")]
    NoPayForBlobs,
    #[error("share version {0} is not enabled")]
    ShareVersionDisabled(u8),
    #[error("blob {0} signer does not match declaration")]
    SignerMismatch(usize),
    #[error("declared {0} blobs but {1} attached")]
    BlobCountMismatch(usize, usize),
    #[error("blob {0} size mismatch: declared {1}, actual {2}")]
    BlobSizeMismatch(usize, usize, usize),
    #[error("blob {0} namespace mismatch")]
    BlobNamespaceMismatch(usize),
    #[error("blob {0} share version mismatch")]
    BlobShareVersionMismatch(usize),
    #[error("blob {0} commitment mismatch")]
    CommitmentMismatch(usize),
    #[error("pay-for-blobs share {0} is not an index wrapper")]
    NotIndexWrapper(usize),
    #[error("blob {1} of pay-for-blobs {0} not found in square")]
    MissingBlob(usize, usize),
    #[error("invalid parity: expected {0} shares of {1} bytes")]
    InvalidParity(usize, usize),
    #[error("malformed proof")]
    MalformedProof,
    #[error("absence proofs are not supported")]
    AbsenceProof,
    #[error("erasure coding failed: {0}")]
    Coding(#[from] reed_solomon_simd::Error),
    #[error("share error: {0}")]
    Shares(#[from] tessera_shares::Error),
    #[error("tree error: {0}")]
    Tree(#[from] tessera_merkle::nmt::Error),
    #[error("row proof error: {0}")]
    RowProof(#[from] tessera_merkle::bmt::Error),
}
