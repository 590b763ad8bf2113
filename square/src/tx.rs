//! Blob transactions, index wrappers, and pay-for-blobs declarations.
//!
//! [wire::BlobTx] and [wire::IndexWrapper] are recognized by a type tag that follows their fields,
//! so a plain transaction that happens to decode as one is not mistaken for it.

use crate::{wire, Config, Error};
use bytes::Bytes;
use prost::Message;
use tessera_shares::{
    commitment::{create_commitment, Commitment},
    constants::SIGNER_SIZE,
    Blob, Namespace,
};

/// Type tag of a [wire::BlobTx].
pub const BLOB_TX_TYPE_ID: &str = "BLOB";

/// Type tag of a [wire::IndexWrapper].
pub const INDEX_WRAPPER_TYPE_ID: &str = "INDX";

/// Type URL of a [wire::MsgPayForBlobs] packed in a [wire::Any].
pub const PAY_FOR_BLOBS_TYPE_URL: &str = "/tessera.blob.v1.MsgPayForBlobs";

/// Decode `raw` as a blob transaction, or `None` if it is not one.
pub fn decode_blob_tx(raw: &[u8]) -> Option<wire::BlobTx> {
    let tx = wire::BlobTx::decode(raw).ok()?;
    (tx.type_id == BLOB_TX_TYPE_ID).then_some(tx)
}

/// Decode `raw` as an index wrapper, or `None` if it is not one.
pub fn decode_index_wrapper(raw: &[u8]) -> Option<wire::IndexWrapper> {
    let wrapper = wire::IndexWrapper::decode(raw).ok()?;
    (wrapper.type_id == INDEX_WRAPPER_TYPE_ID).then_some(wrapper)
}

/// Wrap a pay-for-blobs transaction with the share index of each of its blobs.
pub fn index_wrapper(tx: &[u8], share_indexes: Vec<u32>) -> wire::IndexWrapper {
    wire::IndexWrapper {
        tx: tx.to_vec(),
        share_indexes,
        type_id: INDEX_WRAPPER_TYPE_ID.to_string(),
    }
}

/// Parse a blob from its wire form.
pub fn blob_from_wire(blob: &wire::Blob) -> Result<Blob, Error> {
    let share_version =
        u8::try_from(blob.share_version).map_err(|_| Error::InvalidShareVersion(blob.share_version))?;
    let namespace_version = u8::try_from(blob.namespace_version)
        .map_err(|_| Error::InvalidNamespaceVersion(blob.namespace_version))?;
    let namespace = Namespace::new(namespace_version, &blob.namespace_id)?;
    let signer = match blob.signer.len() {
        0 => None,
        SIGNER_SIZE => {
            let mut signer = [0u8; SIGNER_SIZE];
            signer.copy_from_slice(&blob.signer);
            Some(signer)
        }
        len => return Err(Error::InvalidSignerSize(len)),
    };
    Ok(Blob::new(namespace, blob.data.clone(), share_version, signer)?)
}

/// Convert a blob to its wire form.
pub fn blob_to_wire(blob: &Blob) -> wire::Blob {
    let namespace = blob.namespace();
    wire::Blob {
        namespace_id: namespace.id().to_vec(),
        data: blob.data().to_vec(),
        share_version: blob.share_version().into(),
        namespace_version: namespace.version().into(),
        signer: blob.signer().map(|s| s.to_vec()).unwrap_or_default(),
    }
}

/// A blob transaction with parsed blobs.
///
/// Parsing checks each blob in isolation. Whether the blobs match the transaction's declaration is
/// checked by [crate::validate::validate_blob_tx].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobTx {
    pub tx: Bytes,
    pub blobs: Vec<Blob>,
}

impl BlobTx {
    pub fn from_wire(blob_tx: &wire::BlobTx) -> Result<Self, Error> {
        if blob_tx.blobs.is_empty() {
            return Err(Error::NoBlobs);
        }
        let blobs = blob_tx
            .blobs
            .iter()
            .map(blob_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            tx: Bytes::copy_from_slice(&blob_tx.tx),
            blobs,
        })
    }

    pub fn to_wire(&self) -> wire::BlobTx {
        wire::BlobTx {
            tx: self.tx.to_vec(),
            blobs: self.blobs.iter().map(blob_to_wire).collect(),
            type_id: BLOB_TX_TYPE_ID.to_string(),
        }
    }

    /// Encode as a raw block transaction.
    pub fn encode(&self) -> Vec<u8> {
        self.to_wire().encode_to_vec()
    }
}

/// Extract the pay-for-blobs declarations packed in a transaction, skipping other messages.
///
/// Returns the total number of messages alongside the declarations.
pub fn pay_for_blobs(tx: &[u8]) -> Result<(usize, Vec<wire::MsgPayForBlobs>), Error> {
    let tx = wire::Tx::decode(tx).map_err(|e| Error::Decode("tx", e))?;
    let declarations = tx
        .messages
        .iter()
        .filter(|msg| msg.type_url == PAY_FOR_BLOBS_TYPE_URL)
        .map(|msg| {
            wire::MsgPayForBlobs::decode(msg.value.as_slice())
                .map_err(|e| Error::Decode("pay-for-blobs", e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((tx.messages.len(), declarations))
}

/// Declare `blobs`, computing their commitments.
pub fn declare(
    signer: [u8; SIGNER_SIZE],
    blobs: &[Blob],
    config: &Config,
) -> Result<wire::MsgPayForBlobs, Error> {
    let share_commitments = blobs
        .iter()
        .map(|blob| create_commitment(blob, config.subtree_root_threshold).map(Vec::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(wire::MsgPayForBlobs {
        signer: signer.to_vec(),
        namespaces: blobs
            .iter()
            .map(|blob| blob.namespace().to_bytes().to_vec())
            .collect(),
        // Bounded by `Blob::new`.
        blob_sizes: blobs.iter().map(|blob| blob.data().len() as u32).collect(),
        share_commitments,
        share_versions: blobs.iter().map(|blob| blob.share_version().into()).collect(),
    })
}

/// Build a transaction that pays for `blobs` and wrap it with them.
pub fn new_blob_tx(
    signer: [u8; SIGNER_SIZE],
    blobs: Vec<Blob>,
    config: &Config,
) -> Result<BlobTx, Error> {
    if blobs.is_empty() {
        return Err(Error::NoBlobs);
    }
    let msg = declare(signer, &blobs, config)?;
    let tx = wire::Tx {
        messages: vec![wire::Any {
            type_url: PAY_FOR_BLOBS_TYPE_URL.to_string(),
            value: msg.encode_to_vec(),
        }],
    };
    Ok(BlobTx {
        tx: tx.encode_to_vec().into(),
        blobs,
    })
}

/// Parse a declared commitment.
pub(crate) fn commitment_from_bytes(bytes: &[u8]) -> Result<Commitment, Error> {
    bytes
        .try_into()
        .map_err(|_| Error::InvalidCommitmentSize(bytes.len()))
}
