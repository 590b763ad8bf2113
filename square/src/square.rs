//! The original (not yet extended) data square.

use crate::{
    codec::{extend_row, Codec},
    tree::{row_root, row_tree},
    tx::{decode_index_wrapper, pay_for_blobs, BlobTx},
    validate::validate_blob_tx,
    wire, Block, Config, Error, Layout, Rows, RowsProof, ShareProof,
};
use bytes::Bytes;
use prost::Message;
use tessera_merkle::{bmt, nmt::Node};
use tessera_shares::{
    commitment::subtree_width,
    compact::Counter,
    constants::{NAMESPACE_SIZE, SHARE_VERSION_ONE},
    parse::{parse_blobs, parse_txs},
    sparse::sparse_shares_needed,
    Share,
};
use tracing::{debug, warn};

/// A `k x k` square of shares in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Square {
    size: usize,
    shares: Vec<Share>,
}

impl Square {
    /// The square of an empty block: a single tail padding share.
    pub fn empty() -> Self {
        Self {
            size: 1,
            shares: vec![Share::tail_padding()],
        }
    }

    /// Lay out `block` in a square of side `square_size`.
    pub fn assemble(block: &Block, layout: &Layout, square_size: usize) -> Result<Self, Error> {
        let shares = Rows::new(block, layout, square_size)
            .iter()?
            .flatten()
            .collect();
        Ok(Self {
            size: square_size,
            shares,
        })
    }

    /// Lay out the transactions of `data` in a square of the side it declares.
    ///
    /// `data` must be a block that was already validated.
    pub fn from_data(data: &wire::Data, config: &Config) -> Result<Self, Error> {
        let (block, layout, square_size) = locate(data, config)?;
        Self::assemble(&block, &layout, square_size)
    }

    /// Side of the square.
    pub fn size(&self) -> usize {
        self.size
    }

    /// All shares in row-major order.
    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    /// Whether the square holds nothing but tail padding.
    pub fn is_empty(&self) -> bool {
        self.shares.iter().all(|share| share.namespace().is_tail_padding())
    }

    /// Shares of row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not smaller than [Square::size].
    pub fn row(&self, index: usize) -> &[Share] {
        assert!(index < self.size, "row {index} out of range");
        &self.shares[index * self.size..(index + 1) * self.size]
    }

    /// Row `index` followed by its parity shares.
    pub fn extended_row<C: Codec>(&self, index: usize, codec: &C) -> Result<Vec<Vec<u8>>, Error> {
        extend_row(self.row(index), codec)
    }

    /// Root of the namespaced Merkle tree over extended row `index`.
    pub fn row_root<C: Codec>(&self, index: usize, codec: &C) -> Result<Node<NAMESPACE_SIZE>, Error> {
        row_root(&self.extended_row(index, codec)?)
    }

    /// Roots of every row.
    pub fn row_roots<C: Codec>(&self, codec: &C) -> Result<Vec<Node<NAMESPACE_SIZE>>, Error> {
        (0..self.size).map(|index| self.row_root(index, codec)).collect()
    }

    /// Binary Merkle root over the serialized row roots.
    pub fn data_root<C: Codec>(&self, codec: &C) -> Result<bmt::Digest, Error> {
        let roots: Vec<Vec<u8>> = self
            .row_roots(codec)?
            .iter()
            .map(Node::to_vec)
            .collect();
        Ok(bmt::root(&roots))
    }

    /// Prove that the root of row `index` is committed to by [Square::data_root].
    pub fn prove_row<C: Codec>(&self, index: usize, codec: &C) -> Result<bmt::Proof, Error> {
        let roots: Vec<Vec<u8>> = self
            .row_roots(codec)?
            .iter()
            .map(Node::to_vec)
            .collect();
        Ok(bmt::proof(&roots, index)?)
    }

    /// Range proof for columns `[start, end)` of row `index`.
    pub fn prove_columns<C: Codec>(
        &self,
        index: usize,
        start: usize,
        end: usize,
        codec: &C,
    ) -> Result<tessera_merkle::nmt::Proof<NAMESPACE_SIZE>, Error> {
        let tree = row_tree(&self.extended_row(index, codec)?)?;
        Ok(tree.prove_range(start, end)?)
    }

    /// Prove that shares `[start, end)` are committed to by [Square::data_root].
    ///
    /// Every share in the range must belong to the same namespace.
    pub fn prove_shares<C: Codec>(
        &self,
        start: usize,
        end: usize,
        codec: &C,
    ) -> Result<ShareProof, Error> {
        let total = self.shares.len();
        if start >= end || end > total {
            return Err(Error::InvalidShareRange(start, end, total));
        }
        let shares = &self.shares[start..end];
        let namespace = shares[0].namespace();
        if let Some(offset) = shares.iter().position(|share| share.namespace() != namespace) {
            return Err(Error::MixedNamespaces(start + offset));
        }

        let roots = self.row_roots(codec)?;
        let leaves: Vec<Vec<u8>> = roots.iter().map(Node::to_vec).collect();
        let start_row = start / self.size;
        let end_row = (end - 1) / self.size;
        let mut share_proofs = Vec::with_capacity(end_row - start_row + 1);
        let mut proofs = Vec::with_capacity(end_row - start_row + 1);
        for row in start_row..=end_row {
            let offset = row * self.size;
            let from = start.max(offset) - offset;
            let to = end.min(offset + self.size) - offset;
            share_proofs.push(self.prove_columns(row, from, to, codec)?);
            proofs.push(bmt::proof(&leaves, row)?);
        }
        Ok(ShareProof {
            namespace,
            data: shares.to_vec(),
            share_proofs,
            rows: RowsProof {
                row_roots: roots[start_row..=end_row].to_vec(),
                proofs,
                start_row,
                end_row,
            },
        })
    }
}

/// Parse `data` and check that its layout fits the square size it declares.
pub(crate) fn locate(data: &wire::Data, config: &Config) -> Result<(Block, Layout, usize), Error> {
    let square_size = usize::try_from(data.square_size)
        .map_err(|_| Error::InvalidSquareSize(usize::MAX))?;
    if !square_size.is_power_of_two() {
        return Err(Error::InvalidSquareSize(square_size));
    }
    let block = Block::from_txs(&data.txs)?;
    let layout = Layout::new(&block, config)?;
    layout.check_square_size(square_size)?;
    Ok((block, layout, square_size))
}

/// Lay out `txs` in the smallest square that fits them.
///
/// Every transaction is kept. Fails if a blob transaction precedes a plain one, fails validation,
/// or the square would exceed the configured maximum.
pub fn construct<T: AsRef<[u8]>>(txs: &[T], config: &Config) -> Result<Square, Error> {
    let block = Block::from_validated_txs(txs, config)?;
    if block.is_empty() {
        return Ok(Square::empty());
    }
    let layout = Layout::new(&block, config)?;
    let size = layout.square_size(config.max_square_size)?;
    Square::assemble(&block, &layout, size)
}

/// Recover the raw transactions of a square.
///
/// Blob transactions are rebuilt from their index wrappers and the blobs the wrappers point at.
pub fn deconstruct(square: &Square) -> Result<Vec<Bytes>, Error> {
    let shares = square.shares();
    let tx_end = shares
        .iter()
        .position(|share| !share.namespace().is_tx())
        .unwrap_or(shares.len());
    let pfb_end = tx_end
        + shares[tx_end..]
            .iter()
            .take_while(|share| share.namespace().is_pay_for_blob())
            .count();

    let mut txs = parse_txs(&shares[..tx_end])?;
    for (index, wrapper) in parse_txs(&shares[tx_end..pfb_end])?.into_iter().enumerate() {
        let wrapper = decode_index_wrapper(&wrapper).ok_or(Error::NotIndexWrapper(index))?;
        let (_, declarations) = pay_for_blobs(&wrapper.tx)?;
        let [declaration] = declarations.as_slice() else {
            return Err(Error::MessageCount(declarations.len()));
        };

        let mut blobs = Vec::with_capacity(wrapper.share_indexes.len());
        for (blob, start) in wrapper.share_indexes.iter().enumerate() {
            let size = declaration
                .blob_sizes
                .get(blob)
                .ok_or(Error::MissingBlob(index, blob))?;
            let signed = declaration.share_versions.get(blob) == Some(&u32::from(SHARE_VERSION_ONE));
            let start = *start as usize;
            let end = start + sparse_shares_needed(*size as usize, signed);
            let found = match shares.get(start..end) {
                Some(range) => parse_blobs(range)?,
                None => Vec::new(),
            };
            let [found] = <[_; 1]>::try_from(found).map_err(|_| Error::MissingBlob(index, blob))?;
            blobs.push(found);
        }
        let blob_tx = BlobTx {
            tx: wrapper.tx.into(),
            blobs,
        };
        txs.push(blob_tx.encode().into());
    }
    Ok(txs)
}

/// Incrementally selects the transactions of a block, keeping only those that fit.
///
/// Every size estimate is an upper bound, so an exported block always fits a square of the
/// configured maximum size.
#[derive(Clone, Debug)]
pub struct Builder {
    config: Config,
    capacity: usize,
    current: usize,
    txs: Counter,
    wrappers: Counter,
    worst_case_index: u32,
    block_txs: Vec<Bytes>,
    blob_txs: Vec<BlobTx>,
}

impl Builder {
    /// Fails if a square of the configured maximum side has more shares than a share index can
    /// address.
    pub fn new(config: Config) -> Result<Self, Error> {
        let max = config.max_square_size;
        let shares = max.checked_mul(max).ok_or(Error::InvalidMaxSquareSize(max))?;
        let worst_case_index =
            u32::try_from(shares).map_err(|_| Error::InvalidMaxSquareSize(max))?;
        Ok(Self {
            config,
            // k * (k - 1) non-padding shares keep the square at side k
            capacity: shares - max,
            current: 0,
            txs: Counter::new(),
            wrappers: Counter::new(),
            worst_case_index,
            block_txs: Vec::new(),
            blob_txs: Vec::new(),
        })
    }

    /// Add a plain transaction, returning whether it fit.
    pub fn append_tx(&mut self, tx: Bytes) -> bool {
        let added = self.txs.add(tx.len());
        if self.current + added > self.capacity {
            self.txs.revert();
            return false;
        }
        self.current += added;
        self.block_txs.push(tx);
        true
    }

    /// Add a blob transaction, returning whether it fit.
    pub fn append_blob_tx(&mut self, blob_tx: BlobTx) -> bool {
        let wrapper = crate::tx::index_wrapper(
            &blob_tx.tx,
            vec![self.worst_case_index; blob_tx.blobs.len()],
        );
        let added = self.wrappers.add(wrapper.encoded_len());
        let blob_shares: usize = blob_tx
            .blobs
            .iter()
            .map(|blob| {
                let len = blob.shares_needed();
                len + subtree_width(len, self.config.subtree_root_threshold) - 1
            })
            .sum();
        if self.current + added + blob_shares > self.capacity {
            self.wrappers.revert();
            return false;
        }
        self.current += added + blob_shares;
        self.blob_txs.push(blob_tx);
        true
    }

    /// Number of shares reserved so far.
    pub fn current(&self) -> usize {
        self.current
    }

    /// The selected transactions in block order and the square holding them.
    pub fn export(self) -> Result<(Vec<Bytes>, Square), Error> {
        let block = Block::new(self.block_txs, self.blob_txs);
        let txs = block.to_txs();
        if block.is_empty() {
            return Ok((txs, Square::empty()));
        }
        let layout = Layout::new(&block, &self.config)?;
        let size = layout.square_size(self.config.max_square_size)?;
        Ok((txs, Square::assemble(&block, &layout, size)?))
    }
}

/// Select the transactions of a block from `txs` and lay them out.
///
/// Plain transactions are taken first, then blob transactions, each in the order given. Invalid
/// blob transactions and transactions that do not fit are dropped.
pub fn build<T: AsRef<[u8]>>(txs: &[T], config: &Config) -> Result<(Vec<Bytes>, Square), Error> {
    let mut builder = Builder::new(*config)?;
    let mut blob_txs = Vec::new();
    for (index, raw) in txs.iter().enumerate() {
        let raw = raw.as_ref();
        match crate::tx::decode_blob_tx(raw) {
            Some(blob_tx) => blob_txs.push((index, blob_tx)),
            None => {
                if !builder.append_tx(Bytes::copy_from_slice(raw)) {
                    debug!(index, "dropping transaction that does not fit");
                }
            }
        }
    }
    for (index, blob_tx) in blob_txs {
        let blob_tx = match validate_blob_tx(&blob_tx, config) {
            Ok(blob_tx) => blob_tx,
            Err(err) => {
                warn!(index, ?err, "dropping invalid blob transaction");
                continue;
            }
        };
        if !builder.append_blob_tx(blob_tx) {
            debug!(index, "dropping blob transaction that does not fit");
        }
    }
    builder.export()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tx::new_blob_tx, ReedSolomon};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use tessera_shares::{constants::SIGNER_SIZE, Blob, Namespace};
    use test_case::test_case;

    fn random_txs(rng: &mut StdRng, count: usize, max_len: usize) -> Vec<Vec<u8>> {
        (0..count)
            .map(|_| {
                let mut tx = vec![0u8; rng.gen_range(1..max_len)];
                rng.fill(&mut tx[..]);
                tx
            })
            .collect()
    }

    fn blob_tx(rng: &mut StdRng, blobs: usize, signed: bool) -> Vec<u8> {
        let signer = [rng.gen(); SIGNER_SIZE];
        let blobs = (0..blobs)
            .map(|_| {
                let namespace = Namespace::new_v0(&[rng.gen_range(1..8); 10]).unwrap();
                let mut data = vec![0u8; rng.gen_range(1..4000)];
                rng.fill(&mut data[..]);
                let blob = if signed {
                    Blob::new(namespace, data, SHARE_VERSION_ONE, Some(signer))
                } else {
                    Blob::new(namespace, data, 0, None)
                };
                blob.unwrap()
            })
            .collect();
        new_blob_tx(signer, blobs, &Config::default()).unwrap().encode()
    }

    #[test]
    fn test_empty_square() {
        let empty: Vec<Vec<u8>> = Vec::new();
        let square = construct(&empty, &Config::default()).unwrap();
        assert_eq!(square, Square::empty());
        assert_eq!(square.size(), 1);
        assert!(square.is_empty());
        assert!(deconstruct(&square).unwrap().is_empty());
        assert_eq!(square.row_roots(&ReedSolomon).unwrap().len(), 1);
    }

    #[test]
    fn test_construct_deconstruct() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut txs = random_txs(&mut rng, 20, 1000);
        for i in 0..6 {
            txs.push(blob_tx(&mut rng, 1 + i % 3, i % 2 == 0));
        }
        let square = construct(&txs, &Config::default()).unwrap();
        assert!(square.size().is_power_of_two());
        assert_eq!(square.shares().len(), square.size() * square.size());
        assert!(!square.is_empty());

        let recovered = deconstruct(&square).unwrap();
        assert_eq!(recovered, txs);
    }

    #[test]
    fn test_construct_only_txs() {
        let mut rng = StdRng::seed_from_u64(1);
        let txs = random_txs(&mut rng, 50, 300);
        let square = construct(&txs, &Config::default()).unwrap();
        assert_eq!(deconstruct(&square).unwrap(), txs);
    }

    #[test]
    fn test_construct_too_large() {
        let config = Config {
            max_square_size: 4,
            ..Config::default()
        };
        let txs = vec![vec![1u8; 20_000]];
        assert!(matches!(
            construct(&txs, &config),
            Err(Error::SquareTooLarge(_, 4))
        ));
    }

    #[test]
    fn test_construct_rejects_order() {
        let mut rng = StdRng::seed_from_u64(2);
        let txs = vec![blob_tx(&mut rng, 1, false), vec![1u8; 10]];
        assert!(matches!(
            construct(&txs, &Config::default()),
            Err(Error::TxAfterBlobTx(1))
        ));
    }

    #[test]
    fn test_construct_rejects_invalid_blob_tx() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut invalid = crate::tx::decode_blob_tx(&blob_tx(&mut rng, 2, false)).unwrap();
        invalid.blobs[1].data[0] ^= 1;
        let txs = vec![vec![1u8; 10], invalid.encode_to_vec()];
        assert!(matches!(
            construct(&txs, &Config::default()),
            Err(Error::CommitmentMismatch(1))
        ));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_row_out_of_range() {
        let txs = vec![vec![1u8; 10]];
        let square = construct(&txs, &Config::default()).unwrap();
        square.row(square.size());
    }

    #[test]
    fn test_data_root_commits_rows() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut txs = random_txs(&mut rng, 10, 2000);
        txs.push(blob_tx(&mut rng, 2, false));
        let square = construct(&txs, &Config::default()).unwrap();
        let root = square.data_root(&ReedSolomon).unwrap();
        for row in 0..square.size() {
            let proof = square.prove_row(row, &ReedSolomon).unwrap();
            let row_root = square.row_root(row, &ReedSolomon).unwrap();
            assert!(proof.verify(&root, &row_root.to_vec()).is_ok());
        }
        assert!(matches!(
            square.prove_row(square.size(), &ReedSolomon),
            Err(Error::RowProof(_))
        ));
    }

    #[test]
    fn test_from_data() {
        let txs = vec![vec![1u8; 3000], vec![2u8; 10]];
        let square = construct(&txs, &Config::default()).unwrap();
        let data = wire::Data {
            txs: txs.clone(),
            square_size: square.size() as u64,
        };
        assert_eq!(Square::from_data(&data, &Config::default()).unwrap(), square);

        let larger = wire::Data {
            txs,
            square_size: square.size() as u64 * 2,
        };
        let larger = Square::from_data(&larger, &Config::default()).unwrap();
        assert_eq!(larger.size(), square.size() * 2);
        assert_eq!(deconstruct(&larger).unwrap(), deconstruct(&square).unwrap());

        let odd = wire::Data {
            txs: Vec::new(),
            square_size: 3,
        };
        assert!(matches!(
            Square::from_data(&odd, &Config::default()),
            Err(Error::InvalidSquareSize(3))
        ));
    }

    #[test]
    fn test_prove_columns() {
        let txs = vec![vec![1u8; 3000], vec![2u8; 10]];
        let square = construct(&txs, &Config::default()).unwrap();
        let proof = square.prove_columns(0, 1, 3, &ReedSolomon).unwrap();
        let root = square.row_root(0, &ReedSolomon).unwrap();
        let leaves: Vec<Vec<u8>> = square.row(0)[1..3]
            .iter()
            .map(|share| {
                let mut leaf = share.namespace().to_bytes().to_vec();
                leaf.extend_from_slice(share.as_bytes());
                leaf
            })
            .collect();
        assert!(proof
            .verify_inclusion(&tessera_merkle::nmt::Hasher::default(), &root, &leaves)
            .is_ok());
    }

    #[test]
    fn test_build_drops_invalid_blob_txs() {
        let mut rng = StdRng::seed_from_u64(4);
        let plain = random_txs(&mut rng, 3, 100);
        let valid = blob_tx(&mut rng, 1, false);

        let mut invalid = crate::tx::decode_blob_tx(&blob_tx(&mut rng, 1, false)).unwrap();
        invalid.blobs[0].data[0] ^= 1;
        let invalid = invalid.encode_to_vec();

        // Blob transactions given before plain ones are moved after them
        let txs = vec![invalid, plain[0].clone(), valid.clone(), plain[1].clone(), plain[2].clone()];
        let (kept, square) = build(&txs, &Config::default()).unwrap();
        let mut expected: Vec<Vec<u8>> = plain.clone();
        expected.push(valid);
        assert_eq!(kept, expected);
        assert_eq!(deconstruct(&square).unwrap(), kept);
        assert_eq!(construct(&kept, &Config::default()).unwrap(), square);
    }

    #[test]
    fn test_build_drops_txs_that_do_not_fit() {
        let config = Config {
            max_square_size: 4,
            ..Config::default()
        };
        // 12 shares hold the first 7 transactions
        let txs: Vec<Vec<u8>> = (0..10).map(|i| vec![i as u8; 800]).collect();
        let (kept, square) = build(&txs, &config).unwrap();
        assert_eq!(kept.len(), 7);
        assert_eq!(&kept[..], &txs[..7]);
        assert!(square.size() <= 4);
        assert_eq!(deconstruct(&square).unwrap(), kept);
    }

    #[test_case(usize::MAX)]
    #[test_case(1 << 32)]
    #[test_case(1 << 17)]
    fn test_builder_rejects_max_square_size(max_square_size: usize) {
        let config = Config {
            max_square_size,
            ..Config::default()
        };
        assert!(matches!(
            Builder::new(config),
            Err(Error::InvalidMaxSquareSize(size)) if size == max_square_size
        ));
        let txs = vec![vec![1u8; 10]];
        assert!(matches!(
            build(&txs, &config),
            Err(Error::InvalidMaxSquareSize(_))
        ));
    }

    #[test]
    fn test_builder_max_square_size_bound() {
        // 2^16 squared is the first share count past u32::MAX
        let config = Config {
            max_square_size: 1 << 15,
            ..Config::default()
        };
        let builder = Builder::new(config).unwrap();
        assert_eq!(builder.current(), 0);
        let config = Config {
            max_square_size: 1 << 16,
            ..Config::default()
        };
        assert!(matches!(
            Builder::new(config),
            Err(Error::InvalidMaxSquareSize(65536))
        ));
    }

    #[test]
    fn test_builder_fits_max_square() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = Config {
            max_square_size: 8,
            ..Config::default()
        };
        let mut builder = Builder::new(config).unwrap();
        let mut accepted = 0;
        for _ in 0..20 {
            let raw = blob_tx(&mut rng, 2, false);
            let parsed = BlobTx::from_wire(&crate::tx::decode_blob_tx(&raw).unwrap()).unwrap();
            if builder.append_blob_tx(parsed) {
                accepted += 1;
            }
        }
        assert!(accepted > 0);
        assert!(builder.current() <= 8 * 7);
        let (kept, square) = builder.export().unwrap();
        assert_eq!(kept.len(), accepted);
        assert!(square.size() <= 8);
    }
}
