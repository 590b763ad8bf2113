//! Subcommands of the `tessera` CLI.

use commonware_utils::{from_hex, hex};
use prost::Message;
use std::path::Path;
use tessera_shares::{
    commitment::create_commitment, constants::SIGNER_SIZE, Blob, Namespace,
};
use tessera_square::{
    prove as prove_tx, prove_blob as prove_blob_shares, prove_shares as prove_share_range, wire,
    Config, ReedSolomon, ShareProof, Square, TxProof,
};
use thiserror::Error;
use tracing::{debug, info};

/// Compute a blob commitment
pub const COMMIT_CMD: &str = "commit";

/// Prove the inclusion of a transaction
pub const PROVE_CMD: &str = "prove";

/// Verify an inclusion proof
pub const VERIFY_CMD: &str = "verify";

/// Prove the inclusion of a range of shares
pub const PROVE_SHARES_CMD: &str = "prove-shares";

/// Prove the inclusion of a blob
pub const PROVE_BLOB_CMD: &str = "prove-blob";

/// Verify a share inclusion proof against a data root
pub const VERIFY_SHARES_CMD: &str = "verify-shares";

/// Compute the data root of a block
pub const DATA_ROOT_CMD: &str = "data-root";

/// Errors that can occur when running a subcommand.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex for {0}")]
    InvalidHex(&'static str),
    #[error("invalid signer size: {0}")]
    InvalidSigner(usize),
    #[error("invalid data root size: {0}")]
    InvalidDataRoot(usize),
    #[error("failed to decode {0}: {1}")]
    Decode(&'static str, prost::DecodeError),
    #[error("share error: {0}")]
    Shares(#[from] tessera_shares::Error),
    #[error("square error: {0}")]
    Square(#[from] tessera_square::Error),
}

/// Compute the commitment of the blob stored at `data` and return it as hex.
pub fn commit(
    namespace: &str,
    data: &Path,
    share_version: u8,
    signer: Option<&str>,
    config: &Config,
) -> Result<String, Error> {
    let namespace = from_hex(namespace).ok_or(Error::InvalidHex("namespace"))?;
    let namespace = Namespace::from_bytes(&namespace)?;
    let signer = signer
        .map(|signer| {
            let signer = from_hex(signer).ok_or(Error::InvalidHex("signer"))?;
            <[u8; SIGNER_SIZE]>::try_from(signer.as_slice())
                .map_err(|_| Error::InvalidSigner(signer.len()))
        })
        .transpose()?;
    let data = std::fs::read(data)?;
    let len = data.len();
    let blob = Blob::new(namespace, data, share_version, signer)?;
    let commitment = hex(&create_commitment(&blob, config.subtree_root_threshold)?);
    info!(%namespace, len, shares = blob.shares_needed(), %commitment, "computed commitment");
    Ok(commitment)
}

/// Prove transaction `index` of the protobuf encoded block at `block`, returning the encoded proof.
pub fn prove(block: &Path, index: usize, config: &Config) -> Result<Vec<u8>, Error> {
    let data = load_block(block)?;
    let proof = prove_tx(&data, index, config, &ReedSolomon)?;
    info!(
        index,
        rows = proof.row_roots.len(),
        shares = proof.data.len(),
        "generated proof"
    );
    Ok(proof.to_wire().encode_to_vec())
}

fn load_block(block: &Path) -> Result<wire::Data, Error> {
    let bytes = std::fs::read(block)?;
    let data = wire::Data::decode(bytes.as_slice()).map_err(|e| Error::Decode("block", e))?;
    debug!(txs = data.txs.len(), square_size = data.square_size, "loaded block");
    Ok(data)
}

/// Prove shares `[start, end)` of the protobuf encoded block at `block`, returning the encoded
/// proof.
pub fn prove_shares(block: &Path, start: usize, end: usize, config: &Config) -> Result<Vec<u8>, Error> {
    let data = load_block(block)?;
    let proof = prove_share_range(&data, start, end, config, &ReedSolomon)?;
    info!(
        start,
        end,
        namespace = %proof.namespace,
        rows = proof.rows.row_roots.len(),
        "generated share proof"
    );
    Ok(proof.to_wire().encode_to_vec())
}

/// Prove blob `blob` of transaction `index` of the protobuf encoded block at `block`, returning the
/// encoded proof.
pub fn prove_blob(block: &Path, index: usize, blob: usize, config: &Config) -> Result<Vec<u8>, Error> {
    let data = load_block(block)?;
    let proof = prove_blob_shares(&data, index, blob, config, &ReedSolomon)?;
    info!(
        index,
        blob,
        namespace = %proof.namespace,
        shares = proof.data.len(),
        "generated blob proof"
    );
    Ok(proof.to_wire().encode_to_vec())
}

/// Compute the data root of the protobuf encoded block at `block` (in the square size it declares)
/// and return it as hex.
pub fn data_root(block: &Path, config: &Config) -> Result<String, Error> {
    let data = load_block(block)?;
    let square = Square::from_data(&data, config)?;
    let root = hex(&square.data_root(&ReedSolomon)?);
    info!(size = square.size(), %root, "computed data root");
    Ok(root)
}

/// Verify the protobuf encoded share proof at `proof` against the hex encoded `data_root`.
pub fn verify_shares(proof: &Path, data_root: &str) -> Result<(), Error> {
    let data_root = from_hex(data_root).ok_or(Error::InvalidHex("data root"))?;
    let data_root = <[u8; 32]>::try_from(data_root.as_slice())
        .map_err(|_| Error::InvalidDataRoot(data_root.len()))?;
    let bytes = std::fs::read(proof)?;
    let proof =
        wire::ShareProof::decode(bytes.as_slice()).map_err(|e| Error::Decode("proof", e))?;
    let proof = ShareProof::from_wire(&proof)?;
    proof.verify(&data_root)?;
    info!(
        namespace = %proof.namespace,
        shares = proof.data.len(),
        "share proof verified"
    );
    Ok(())
}

/// Verify the protobuf encoded proof at `proof`.
pub fn verify(proof: &Path) -> Result<(), Error> {
    let bytes = std::fs::read(proof)?;
    let proof = wire::TxProof::decode(bytes.as_slice()).map_err(|e| Error::Decode("proof", e))?;
    let proof = TxProof::from_wire(&proof)?;
    proof.verify()?;
    info!(
        rows = proof.row_roots.len(),
        shares = proof.data.len(),
        "proof verified"
    );
    Ok(())
}
