//! Transaction, share range, and blob inclusion proofs.
//!
//! A transaction occupies a contiguous range of shares that may span several rows. Its proof holds,
//! for every row it touches, the row root and a range proof for the columns it occupies in that row.
//! Only the rows up to the last one touched are regenerated.
//!
//! Share range and blob proofs go one step further and also prove each touched row root against the
//! data root, so they can be checked against a block header alone.

use crate::{
    codec::{extend_row, Codec},
    tree::row_tree,
    square::locate,
    wire, Config, Error, Rows, Square,
};
use tessera_merkle::{
    bmt,
    nmt::{self, Hasher, Node},
};
use tessera_shares::{
    constants::{NAMESPACE_SIZE, SHARE_SIZE},
    Namespace, Share,
};
use tracing::debug;

/// Proof that a run of shares is included in a set of row roots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxProof {
    /// Roots of the rows the shares span, top to bottom.
    pub row_roots: Vec<Node<NAMESPACE_SIZE>>,
    /// The proven shares in square order.
    pub data: Vec<Share>,
    /// One range proof per row, over the original columns the shares occupy.
    pub share_proofs: Vec<nmt::Proof<NAMESPACE_SIZE>>,
}

/// Check every row proof against its root, consuming `data` in order.
fn verify_rows(
    row_roots: &[Node<NAMESPACE_SIZE>],
    share_proofs: &[nmt::Proof<NAMESPACE_SIZE>],
    data: &[Share],
) -> Result<(), Error> {
    if row_roots.is_empty() || row_roots.len() != share_proofs.len() {
        return Err(Error::MalformedProof);
    }
    let hasher = Hasher::default();
    let mut cursor = 0;
    for (root, proof) in row_roots.iter().zip(share_proofs) {
        let count = proof.end.checked_sub(proof.start).ok_or(Error::MalformedProof)?;
        let shares = data
            .get(cursor..cursor + count)
            .ok_or(Error::MalformedProof)?;
        let leaves: Vec<Vec<u8>> = shares
            .iter()
            .map(|share| {
                let mut leaf = Vec::with_capacity(NAMESPACE_SIZE + SHARE_SIZE);
                leaf.extend_from_slice(&share.namespace().to_bytes());
                leaf.extend_from_slice(share.as_bytes());
                leaf
            })
            .collect();
        proof.verify_inclusion(&hasher, root, &leaves)?;
        cursor += count;
    }
    if cursor != data.len() {
        return Err(Error::MalformedProof);
    }
    Ok(())
}

fn nmt_proof_to_wire(proof: &nmt::Proof<NAMESPACE_SIZE>) -> wire::NmtProof {
    wire::NmtProof {
        // Bounded by the square size
        start: proof.start as i32,
        end: proof.end as i32,
        nodes: proof.nodes.iter().map(Node::to_vec).collect(),
        leaf_hash: Vec::new(),
    }
}

fn nmt_proof_from_wire(proof: &wire::NmtProof) -> Result<nmt::Proof<NAMESPACE_SIZE>, Error> {
    if !proof.leaf_hash.is_empty() {
        return Err(Error::AbsenceProof);
    }
    let start = usize::try_from(proof.start).map_err(|_| Error::MalformedProof)?;
    let end = usize::try_from(proof.end).map_err(|_| Error::MalformedProof)?;
    let nodes = proof
        .nodes
        .iter()
        .map(|node| Node::from_bytes(node))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(nmt::Proof { start, end, nodes })
}

fn roots_from_wire(roots: &[Vec<u8>]) -> Result<Vec<Node<NAMESPACE_SIZE>>, Error> {
    Ok(roots
        .iter()
        .map(|root| Node::from_bytes(root))
        .collect::<Result<Vec<_>, _>>()?)
}

fn digest_from_wire(bytes: &[u8]) -> Result<bmt::Digest, Error> {
    <bmt::Digest>::try_from(bytes).map_err(|_| Error::MalformedProof)
}

impl TxProof {
    /// Check every row proof against its root, consuming `data` in order.
    pub fn verify(&self) -> Result<(), Error> {
        verify_rows(&self.row_roots, &self.share_proofs, &self.data)
    }

    pub fn to_wire(&self) -> wire::TxProof {
        wire::TxProof {
            row_roots: self.row_roots.iter().map(Node::to_vec).collect(),
            data: self
                .data
                .iter()
                .flat_map(|share| share.as_bytes().iter().copied())
                .collect(),
            share_proofs: self.share_proofs.iter().map(nmt_proof_to_wire).collect(),
        }
    }

    pub fn from_wire(proof: &wire::TxProof) -> Result<Self, Error> {
        let row_roots = roots_from_wire(&proof.row_roots)?;
        if proof.data.len() % SHARE_SIZE != 0 {
            return Err(Error::MalformedProof);
        }
        let data = proof
            .data
            .chunks(SHARE_SIZE)
            .map(Share::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        let share_proofs = proof
            .share_proofs
            .iter()
            .map(nmt_proof_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            row_roots,
            data,
            share_proofs,
        })
    }
}

/// Proof that the roots of rows `start_row..=end_row` are committed to by a data root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowsProof {
    pub row_roots: Vec<Node<NAMESPACE_SIZE>>,
    /// One proof per row root, in the same order.
    pub proofs: Vec<bmt::Proof>,
    pub start_row: usize,
    pub end_row: usize,
}

impl RowsProof {
    /// Check that every row root sits at its row in the tree committed to by `data_root`.
    pub fn verify(&self, data_root: &bmt::Digest) -> Result<(), Error> {
        let rows = self
            .end_row
            .checked_sub(self.start_row)
            .and_then(|rows| rows.checked_add(1))
            .ok_or(Error::MalformedProof)?;
        if self.row_roots.len() != rows || self.proofs.len() != rows {
            return Err(Error::MalformedProof);
        }
        let total = self.proofs[0].total;
        for (offset, (root, proof)) in self.row_roots.iter().zip(&self.proofs).enumerate() {
            if proof.index != self.start_row + offset || proof.total != total {
                return Err(Error::MalformedProof);
            }
            proof.verify(data_root, &root.to_vec())?;
        }
        Ok(())
    }

    pub fn to_wire(&self) -> wire::RowsProof {
        wire::RowsProof {
            row_roots: self.row_roots.iter().map(Node::to_vec).collect(),
            proofs: self
                .proofs
                .iter()
                .map(|proof| wire::RowProof {
                    total: proof.total as u64,
                    index: proof.index as u64,
                    leaf_hash: proof.leaf_hash.to_vec(),
                    aunts: proof.aunts.iter().map(|aunt| aunt.to_vec()).collect(),
                })
                .collect(),
            // Bounded by the square size
            start_row: self.start_row as u32,
            end_row: self.end_row as u32,
        }
    }

    pub fn from_wire(proof: &wire::RowsProof) -> Result<Self, Error> {
        let proofs = proof
            .proofs
            .iter()
            .map(|proof| {
                Ok(bmt::Proof {
                    total: usize::try_from(proof.total).map_err(|_| Error::MalformedProof)?,
                    index: usize::try_from(proof.index).map_err(|_| Error::MalformedProof)?,
                    leaf_hash: digest_from_wire(&proof.leaf_hash)?,
                    aunts: proof
                        .aunts
                        .iter()
                        .map(|aunt| digest_from_wire(aunt))
                        .collect::<Result<Vec<_>, _>>()?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self {
            row_roots: roots_from_wire(&proof.row_roots)?,
            proofs,
            start_row: proof.start_row as usize,
            end_row: proof.end_row as usize,
        })
    }
}

/// Proof that a range of shares from a single namespace is committed to by a data root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareProof {
    /// Namespace of every proven share.
    pub namespace: Namespace,
    /// The proven shares in square order.
    pub data: Vec<Share>,
    /// One range proof per row, against the matching root in `rows`.
    pub share_proofs: Vec<nmt::Proof<NAMESPACE_SIZE>>,
    pub rows: RowsProof,
}

impl ShareProof {
    /// Check the shares against their row roots and the row roots against `data_root`.
    pub fn verify(&self, data_root: &bmt::Digest) -> Result<(), Error> {
        if let Some(index) = self
            .data
            .iter()
            .position(|share| share.namespace() != self.namespace)
        {
            return Err(Error::MixedNamespaces(index));
        }
        self.rows.verify(data_root)?;
        verify_rows(&self.rows.row_roots, &self.share_proofs, &self.data)
    }

    pub fn to_wire(&self) -> wire::ShareProof {
        wire::ShareProof {
            data: self.data.iter().map(|share| share.as_bytes().to_vec()).collect(),
            share_proofs: self.share_proofs.iter().map(nmt_proof_to_wire).collect(),
            namespace: self.namespace.to_bytes().to_vec(),
            rows_proof: Some(self.rows.to_wire()),
        }
    }

    pub fn from_wire(proof: &wire::ShareProof) -> Result<Self, Error> {
        let rows = proof.rows_proof.as_ref().ok_or(Error::MalformedProof)?;
        let data = proof
            .data
            .iter()
            .map(|share| Share::from_bytes(share))
            .collect::<Result<Vec<_>, _>>()?;
        let share_proofs = proof
            .share_proofs
            .iter()
            .map(nmt_proof_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            namespace: Namespace::from_bytes(&proof.namespace)?,
            data,
            share_proofs,
            rows: RowsProof::from_wire(rows)?,
        })
    }
}

/// Prove that transaction `index` of `data` is included in the square `data` describes.
///
/// `data` must be a block that was already validated.
pub fn prove<C: Codec>(
    data: &wire::Data,
    index: usize,
    config: &Config,
    codec: &C,
) -> Result<TxProof, Error> {
    let (block, layout, square_size) = locate(data, config)?;

    // Locate
    let range = layout.tx_share_range(index)?;
    let start_row = range.start / square_size;
    let end_row = (range.end - 1) / square_size;
    debug!(index, ?range, start_row, end_row, "proving transaction");

    // Regenerate only the rows the transaction reaches
    let rows = Rows::new(&block, &layout, square_size).take(end_row + 1);
    let mut proof = TxProof::default();
    for (row_index, row) in rows.iter()?.enumerate().skip(start_row) {
        let start = if row_index == start_row {
            range.start % square_size
        } else {
            0
        };
        let end = if row_index == end_row {
            (range.end - 1) % square_size + 1
        } else {
            square_size
        };
        let tree = row_tree(&extend_row(&row, codec)?)?;
        proof.share_proofs.push(tree.prove_range(start, end)?);
        proof.row_roots.push(tree.root()?);
        proof.data.extend_from_slice(&row[start..end]);
    }
    Ok(proof)
}

/// Prove that shares `[start, end)` of the square `data` describes are committed to by its data
/// root. Every share in the range must belong to the same namespace.
pub fn prove_shares<C: Codec>(
    data: &wire::Data,
    start: usize,
    end: usize,
    config: &Config,
    codec: &C,
) -> Result<ShareProof, Error> {
    debug!(start, end, square_size = data.square_size, "proving shares");
    Square::from_data(data, config)?.prove_shares(start, end, codec)
}

/// Prove that blob `blob` of transaction `index` (in block order) is committed to by the data root
/// of the square `data` describes.
pub fn prove_blob<C: Codec>(
    data: &wire::Data,
    index: usize,
    blob: usize,
    config: &Config,
    codec: &C,
) -> Result<ShareProof, Error> {
    let (block, layout, square_size) = locate(data, config)?;
    if index >= block.len() {
        return Err(Error::IndexOutOfRange(index, block.len()));
    }
    let tx = index
        .checked_sub(block.txs().len())
        .ok_or(Error::NotBlobTx(index))?;
    let range = layout
        .blob_share_range(tx, blob)
        .ok_or(Error::BlobNotFound(index, blob))?;
    debug!(index, blob, ?range, "proving blob");
    Square::assemble(&block, &layout, square_size)?.prove_shares(range.start, range.end, codec)
}
