use crate::{
    tx::{decode_blob_tx, BlobTx},
    validate::validate_blob_tx,
    wire, Config, Error,
};
use bytes::Bytes;

/// The transactions of a block, split into plain transactions and the blob transactions that
/// follow them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    txs: Vec<Bytes>,
    blob_txs: Vec<BlobTx>,
}

impl Block {
    /// Assemble a block from parsed parts.
    pub fn new(txs: Vec<Bytes>, blob_txs: Vec<BlobTx>) -> Self {
        Self { txs, blob_txs }
    }

    /// Split raw block transactions. Every plain transaction must precede every blob transaction.
    ///
    /// Blobs are parsed but not checked against their declarations, so `txs` must come from a
    /// block that was already validated. Use [Block::from_validated_txs] otherwise.
    pub fn from_txs<T: AsRef<[u8]>>(txs: &[T]) -> Result<Self, Error> {
        Self::split(txs, BlobTx::from_wire)
    }

    /// Like [Block::from_txs], additionally checking every blob transaction with
    /// [validate_blob_tx].
    pub fn from_validated_txs<T: AsRef<[u8]>>(txs: &[T], config: &Config) -> Result<Self, Error> {
        Self::split(txs, |blob_tx| validate_blob_tx(blob_tx, config))
    }

    fn split<T, F>(txs: &[T], parse: F) -> Result<Self, Error>
    where
        T: AsRef<[u8]>,
        F: Fn(&wire::BlobTx) -> Result<BlobTx, Error>,
    {
        let mut block = Self::default();
        for (index, raw) in txs.iter().enumerate() {
            let raw = raw.as_ref();
            match decode_blob_tx(raw) {
                Some(blob_tx) => block.blob_txs.push(parse(&blob_tx)?),
                None if !block.blob_txs.is_empty() => return Err(Error::TxAfterBlobTx(index)),
                None => block.txs.push(Bytes::copy_from_slice(raw)),
            }
        }
        Ok(block)
    }

    /// Plain transactions.
    pub fn txs(&self) -> &[Bytes] {
        &self.txs
    }

    /// Blob transactions.
    pub fn blob_txs(&self) -> &[BlobTx] {
        &self.blob_txs
    }

    /// Total number of transactions.
    pub fn len(&self) -> usize {
        self.txs.len() + self.blob_txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty() && self.blob_txs.is_empty()
    }

    /// Raw transactions in block order.
    pub fn to_txs(&self) -> Vec<Bytes> {
        self.txs
            .iter()
            .cloned()
            .chain(self.blob_txs.iter().map(|tx| Bytes::from(tx.encode())))
            .collect()
    }
}
