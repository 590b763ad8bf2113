//! Split transactions and blobs into namespaced shares and commit to them.
//!
//! Transactions (and the wrapped pay-for-blob transactions that reference blobs) are packed into
//! [compact] shares: a single length-delimited stream chunked across shares of one namespace.
//! Blobs are written into [sparse] shares, one blob per sequence and never sharing a share with
//! another blob. [commitment] binds a blob's shares to a 32 byte digest that can later be checked
//! against the roots of a square.
//!
//! # Status
//!
//! `tessera-shares` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

use thiserror::Error;

mod blob;
pub use blob::Blob;
pub mod commitment;
pub mod compact;
pub mod constants;
mod namespace;
pub use namespace::{Class, Namespace, NAMESPACE_VERSION_MAX, NAMESPACE_VERSION_ZERO};
pub mod parse;
mod share;
pub use share::{InfoByte, Share};
pub mod sparse;

/// Errors that can occur when splitting, parsing, or committing to shares.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid namespace size: {0}")]
    InvalidNamespaceSize(usize),
    #[error("unsupported namespace version: {0}")]
    UnsupportedNamespaceVersion(u8),
    #[error("version 0 namespace id must start with 18 zero bytes")]
    InvalidNamespacePrefix,
    #[error("reserved namespace: {0}")]
    ReservedNamespace(Namespace),
    #[error("parity shares namespace")]
    ParitySharesNamespace,
    #[error("tail padding namespace")]
    TailPaddingNamespace,
    #[error("unsupported share version: {0}")]
    UnsupportedShareVersion(u8),
    #[error("invalid share version: {0}")]
    InvalidShareVersion(u8),
    #[error("invalid share size: {0}")]
    InvalidShareSize(usize),
    #[error("sequence too long: {0}")]
    SequenceTooLong(usize),
    #[error("empty blob")]
    EmptyBlob,
    #[error("missing signer")]
    MissingSigner,
    #[error("unexpected signer")]
    UnexpectedSigner,
    #[error("no shares to commit to")]
    EmptyShares,
    #[error("max tree size must be positive")]
    InvalidTreeSize,
    #[error("subtree root threshold must be positive")]
    InvalidThreshold,
    #[error("padding requires a previously written share")]
    EmptySplitter,
    #[error("share does not start a sequence")]
    MissingSequenceStart,
    #[error("share unexpectedly starts a sequence")]
    UnexpectedSequenceStart,
    #[error("namespace changed within a sequence")]
    NamespaceMismatch,
    #[error("not a compact share: {0}")]
    NotCompact(Namespace),
    #[error("not a sparse share: {0}")]
    NotSparse(Namespace),
    #[error("truncated sequence: {0} < {1}")]
    TruncatedSequence(usize, usize),
    #[error("invalid length delimiter")]
    InvalidDelimiter,
    #[error("tree error: {0}")]
    Tree(#[from] tessera_merkle::nmt::Error),
}
