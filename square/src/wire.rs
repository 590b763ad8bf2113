//! Protobuf messages exchanged with the host application.
//!
//! These types carry no invariants. Use the parsed wrappers in [crate::tx] and [crate::proof]
//! before acting on their contents.

/// The ordered transactions of a block and the side of its square.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Data {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub txs: Vec<Vec<u8>>,
    #[prost(uint64, tag = "2")]
    pub square_size: u64,
}

/// A blob as attached to a [BlobTx].
#[derive(Clone, PartialEq, prost::Message)]
pub struct Blob {
    #[prost(bytes = "vec", tag = "1")]
    pub namespace_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub share_version: u32,
    #[prost(uint32, tag = "4")]
    pub namespace_version: u32,
    #[prost(bytes = "vec", tag = "5")]
    pub signer: Vec<u8>,
}

/// A signed transaction paying for blobs, together with the blobs themselves.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BlobTx {
    #[prost(bytes = "vec", tag = "1")]
    pub tx: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    pub blobs: Vec<Blob>,
    #[prost(string, tag = "3")]
    pub type_id: String,
}

/// A pay-for-blobs transaction as written into the square, with the share index each of its blobs
/// starts at.
#[derive(Clone, PartialEq, prost::Message)]
pub struct IndexWrapper {
    #[prost(bytes = "vec", tag = "1")]
    pub tx: Vec<u8>,
    #[prost(uint32, repeated, tag = "2")]
    pub share_indexes: Vec<u32>,
    #[prost(string, tag = "3")]
    pub type_id: String,
}

/// A type-tagged message.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// A transaction (only its messages are inspected).
#[derive(Clone, PartialEq, prost::Message)]
pub struct Tx {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
}

/// Declaration of the blobs a transaction pays for.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MsgPayForBlobs {
    #[prost(bytes = "vec", tag = "1")]
    pub signer: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub namespaces: Vec<Vec<u8>>,
    #[prost(uint32, repeated, tag = "3")]
    pub blob_sizes: Vec<u32>,
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub share_commitments: Vec<Vec<u8>>,
    #[prost(uint32, repeated, tag = "5")]
    pub share_versions: Vec<u32>,
}

/// Range proof over one row of the square.
#[derive(Clone, PartialEq, prost::Message)]
pub struct NmtProof {
    #[prost(int32, tag = "1")]
    pub start: i32,
    #[prost(int32, tag = "2")]
    pub end: i32,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub nodes: Vec<Vec<u8>>,
    #[prost(bytes = "vec", tag = "4")]
    pub leaf_hash: Vec<u8>,
}

/// Proof that a transaction occupies a range of shares.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TxProof {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub row_roots: Vec<Vec<u8>>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    pub share_proofs: Vec<NmtProof>,
}

/// Binary Merkle proof of one row root against the data root.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RowProof {
    #[prost(uint64, tag = "1")]
    pub total: u64,
    #[prost(uint64, tag = "2")]
    pub index: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub leaf_hash: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub aunts: Vec<Vec<u8>>,
}

/// Proof that a run of consecutive row roots is committed to by the data root.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RowsProof {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub row_roots: Vec<Vec<u8>>,
    #[prost(message, repeated, tag = "2")]
    pub proofs: Vec<RowProof>,
    #[prost(uint32, tag = "3")]
    pub start_row: u32,
    #[prost(uint32, tag = "4")]
    pub end_row: u32,
}

/// Proof that a range of shares from one namespace is committed to by the data root.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ShareProof {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub data: Vec<Vec<u8>>,
    #[prost(message, repeated, tag = "2")]
    pub share_proofs: Vec<NmtProof>,
    #[prost(bytes = "vec", tag = "3")]
    pub namespace: Vec<u8>,
    #[prost(message, optional, tag = "4")]
    pub rows_proof: Option<RowsProof>,
}
