//! Where every share of a block lands in the square.
//!
//! The layout is computed from transaction and blob sizes alone; no share is written. Blobs are
//! placed after room reserved for the worst case encoding of every index wrapper, so the real
//! wrappers (which record the chosen blob positions) always fit in front of the first blob.

use crate::{
    tx::{index_wrapper, BlobTx},
    Block, Config, Error,
};
use bytes::Bytes;
use prost::Message;
use std::ops::Range;
use tessera_shares::{
    commitment::subtree_width,
    compact::{unit_share_range, Counter},
    Namespace,
};

/// Position of one blob in the square.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Index of the blob transaction (among blob transactions).
    pub tx: usize,
    /// Index of the blob within its transaction.
    pub blob: usize,
    pub namespace: Namespace,
    /// First share of the blob.
    pub start: usize,
    /// Number of shares the blob occupies.
    pub len: usize,
}

/// Share layout of a block.
#[derive(Clone, Debug)]
pub struct Layout {
    tx_lens: Vec<usize>,
    tx_shares: usize,
    wrappers: Vec<Bytes>,
    pfb_shares: usize,
    pfb_reserved: usize,
    placements: Vec<Placement>,
    end: usize,
    non_padding: usize,
    max_square_size: usize,
}

/// Encoded length of an index wrapper around `blob_tx` whose share indexes all take `index`.
fn wrapper_len(blob_tx: &BlobTx, index: u32) -> usize {
    index_wrapper(&blob_tx.tx, vec![index; blob_tx.blobs.len()]).encoded_len()
}

impl Layout {
    pub fn new(block: &Block, config: &Config) -> Result<Self, Error> {
        let tx_lens: Vec<usize> = block.txs().iter().map(Bytes::len).collect();
        let mut txs = Counter::new();
        for len in &tx_lens {
            txs.add(*len);
        }
        let tx_shares = txs.size();

        // Reserve for share indexes as large as any square could need
        let worst_case = config
            .max_square_size
            .checked_mul(config.max_square_size)
            .and_then(|shares| u32::try_from(shares).ok())
            .ok_or(Error::InvalidMaxSquareSize(config.max_square_size))?;
        let mut reserved = Counter::new();
        let mut placements = Vec::new();
        for (tx, blob_tx) in block.blob_txs().iter().enumerate() {
            reserved.add(wrapper_len(blob_tx, worst_case));
            for (blob, data) in blob_tx.blobs.iter().enumerate() {
                placements.push(Placement {
                    tx,
                    blob,
                    namespace: data.namespace(),
                    start: 0,
                    len: data.shares_needed(),
                });
            }
        }
        let pfb_reserved = reserved.size();

        // Stable, so blobs of one namespace keep block order
        placements.sort_by_key(|placement| placement.namespace);
        let mut share_indexes: Vec<Vec<u32>> = block
            .blob_txs()
            .iter()
            .map(|blob_tx| vec![0; blob_tx.blobs.len()])
            .collect();
        let mut cursor = tx_shares + pfb_reserved;
        for placement in &mut placements {
            let width = subtree_width(placement.len, config.subtree_root_threshold);
            placement.start = cursor.next_multiple_of(width);
            share_indexes[placement.tx][placement.blob] = u32::try_from(placement.start)
                .map_err(|_| Error::SquareTooLarge(placement.start, config.max_square_size))?;
            cursor = placement.start + placement.len;
        }

        let wrappers: Vec<Bytes> = block
            .blob_txs()
            .iter()
            .zip(share_indexes)
            .map(|(blob_tx, indexes)| index_wrapper(&blob_tx.tx, indexes).encode_to_vec().into())
            .collect();
        let mut pfbs = Counter::new();
        for wrapper in &wrappers {
            pfbs.add(wrapper.len());
        }
        let pfb_shares = pfbs.size();
        if pfb_shares > pfb_reserved {
            return Err(Error::ReservationOverflow(pfb_shares, pfb_reserved));
        }

        let blob_shares: usize = placements.iter().map(|placement| placement.len).sum();
        Ok(Self {
            tx_lens,
            tx_shares,
            wrappers,
            pfb_shares,
            pfb_reserved,
            placements,
            end: cursor,
            non_padding: tx_shares + pfb_shares + blob_shares,
            max_square_size: config.max_square_size,
        })
    }

    /// Number of compact shares holding plain transactions.
    pub fn tx_shares(&self) -> usize {
        self.tx_shares
    }

    /// Encoded index wrappers, one per blob transaction.
    pub fn wrappers(&self) -> &[Bytes] {
        &self.wrappers
    }

    /// Number of compact shares holding index wrappers.
    pub fn pfb_shares(&self) -> usize {
        self.pfb_shares
    }

    /// Number of shares reserved for index wrappers (at least [Layout::pfb_shares]).
    pub fn pfb_reserved(&self) -> usize {
        self.pfb_reserved
    }

    /// Index of the first share after the reservation.
    pub fn blobs_start(&self) -> usize {
        self.tx_shares + self.pfb_reserved
    }

    /// Blob positions in square order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// One past the last share that is not tail padding.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of shares that hold transactions, wrappers, or blob data.
    pub fn non_padding(&self) -> usize {
        self.non_padding
    }

    /// Smallest power-of-two side that fits the layout.
    pub fn min_square_size(&self) -> usize {
        let mut size: usize = 1;
        while size.saturating_mul(size - 1) < self.non_padding || size.saturating_mul(size) < self.end {
            size *= 2;
        }
        size
    }

    /// [Layout::min_square_size], rejecting squares larger than `max_square_size`.
    pub fn square_size(&self, max_square_size: usize) -> Result<usize, Error> {
        let size = self.min_square_size();
        if size > max_square_size {
            return Err(Error::SquareTooLarge(size, max_square_size));
        }
        Ok(size)
    }

    /// Check that the layout fits a square of side `square_size` no larger than the configured
    /// maximum.
    pub fn check_square_size(&self, square_size: usize) -> Result<(), Error> {
        if !square_size.is_power_of_two() {
            return Err(Error::InvalidSquareSize(square_size));
        }
        if square_size > self.max_square_size {
            return Err(Error::SquareTooLarge(square_size, self.max_square_size));
        }
        let required = self.min_square_size();
        if square_size < required {
            return Err(Error::SquareTooSmall(square_size, required));
        }
        Ok(())
    }

    /// Shares occupied by transaction `index` (in block order).
    pub fn tx_share_range(&self, index: usize) -> Result<Range<usize>, Error> {
        let count = self.tx_lens.len();
        let range = if index < count {
            unit_share_range(self.tx_lens.iter().copied(), index)
        } else {
            unit_share_range(self.wrappers.iter().map(Bytes::len), index - count)
                .map(|range| range.start + self.tx_shares..range.end + self.tx_shares)
        };
        range.ok_or(Error::IndexOutOfRange(index, count + self.wrappers.len()))
    }

    /// Shares occupied by blob `blob` of blob transaction `tx`.
    pub fn blob_share_range(&self, tx: usize, blob: usize) -> Option<Range<usize>> {
        self.placements
            .iter()
            .find(|placement| placement.tx == tx && placement.blob == blob)
            .map(|placement| placement.start..placement.start + placement.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::new_blob_tx;
    use tessera_shares::Blob;
    use test_case::test_case;

    fn blob(sub_id: u8, len: usize) -> Blob {
        Blob::new(Namespace::new_v0(&[sub_id; 10]).unwrap(), vec![sub_id; len], 0, None).unwrap()
    }

    fn blob_tx(blobs: Vec<Blob>) -> BlobTx {
        new_blob_tx([0; 20], blobs, &Config::default()).unwrap()
    }

    #[test]
    fn test_empty_block() {
        let layout = Layout::new(&Block::default(), &Config::default()).unwrap();
        assert_eq!(layout.end(), 0);
        assert_eq!(layout.non_padding(), 0);
        assert_eq!(layout.min_square_size(), 1);
        assert!(matches!(
            layout.tx_share_range(0),
            Err(Error::IndexOutOfRange(0, 0))
        ));
    }

    #[test]
    fn test_tx_share_range() {
        let block = Block::new(
            vec![vec![0u8; 22467].into(), vec![0u8; 8128].into()],
            Vec::new(),
        );
        let layout = Layout::new(&block, &Config::default()).unwrap();
        assert_eq!(layout.tx_shares(), 65);
        assert_eq!(layout.tx_share_range(0).unwrap(), 0..48);
        assert_eq!(layout.tx_share_range(1).unwrap(), 47..65);
        assert_eq!(layout.min_square_size(), 16);
        assert!(matches!(
            layout.tx_share_range(2),
            Err(Error::IndexOutOfRange(2, 2))
        ));
    }

    #[test]
    fn test_blobs_sorted_and_aligned() {
        let block = Block::new(
            vec![vec![1u8; 100].into()],
            vec![
                blob_tx(vec![blob(9, 100)]),
                blob_tx(vec![blob(3, 5000), blob(9, 50)]),
            ],
        );
        let layout = Layout::new(&block, &Config::default()).unwrap();
        let placements = layout.placements();
        assert_eq!(placements.len(), 3);

        // Sorted by namespace, ties in block order
        assert_eq!((placements[0].tx, placements[0].blob), (1, 0));
        assert_eq!((placements[1].tx, placements[1].blob), (0, 0));
        assert_eq!((placements[2].tx, placements[2].blob), (1, 1));

        let mut previous_end = layout.blobs_start();
        for placement in placements {
            let width = subtree_width(placement.len, 64);
            assert_eq!(placement.start % width, 0);
            assert!(placement.start >= previous_end);
            assert!(placement.start < previous_end + width);
            previous_end = placement.start + placement.len;
        }
        assert_eq!(layout.end(), previous_end);
        assert!(layout.pfb_shares() <= layout.pfb_reserved());
        assert_eq!(layout.blob_share_range(1, 0), Some(placements[0].start..placements[0].start + 11));
        assert_eq!(layout.blob_share_range(2, 0), None);

        // Blob transactions follow the plain transactions
        assert_eq!(layout.tx_share_range(1).unwrap(), 1..2);
    }

    #[test]
    fn test_wrappers_record_placements() {
        let block = Block::new(Vec::new(), vec![blob_tx(vec![blob(2, 700), blob(1, 10)])]);
        let layout = Layout::new(&block, &Config::default()).unwrap();
        let wrapper = crate::tx::decode_index_wrapper(&layout.wrappers()[0]).unwrap();
        assert_eq!(wrapper.tx, block.blob_txs()[0].tx.to_vec());
        let expected: Vec<u32> = (0..2)
            .map(|blob| layout.blob_share_range(0, blob).unwrap().start as u32)
            .collect();
        assert_eq!(wrapper.share_indexes, expected);
        // The smaller namespace is placed first
        assert!(expected[1] < expected[0]);
    }

    #[test_case(1, 2)]
    #[test_case(2, 2)]
    #[test_case(7, 4)]
    #[test_case(12, 4)]
    #[test_case(13, 8)]
    #[test_case(56, 8)]
    #[test_case(57, 16)]
    fn test_min_square_size_counts_shares(tx_shares: usize, expected: usize) {
        let mut txs = Vec::new();
        let mut counter = Counter::new();
        while counter.size() < tx_shares {
            counter.add(100);
            txs.push(Bytes::from(vec![1u8; 100]));
        }
        let layout = Layout::new(&Block::new(txs, Vec::new()), &Config::default()).unwrap();
        assert_eq!(layout.tx_shares(), tx_shares);
        assert_eq!(layout.min_square_size(), expected);
    }

    #[test]
    fn test_check_square_size() {
        let block = Block::new(vec![vec![0u8; 22467].into()], Vec::new());
        let layout = Layout::new(&block, &Config::default()).unwrap();
        assert!(layout.check_square_size(8).is_ok());
        assert!(layout.check_square_size(64).is_ok());
        assert!(matches!(
            layout.check_square_size(12),
            Err(Error::InvalidSquareSize(12))
        ));
        assert!(matches!(
            layout.check_square_size(4),
            Err(Error::SquareTooSmall(4, 8))
        ));
        assert!(matches!(
            layout.square_size(4),
            Err(Error::SquareTooLarge(8, 4))
        ));
        assert!(layout.check_square_size(128).is_ok());
        assert!(matches!(
            layout.check_square_size(256),
            Err(Error::SquareTooLarge(256, 128))
        ));
        assert!(matches!(
            layout.check_square_size(1 << 16),
            Err(Error::SquareTooLarge(65536, 128))
        ));
    }

    #[test]
    fn test_rejects_overflowing_max_square_size() {
        let block = Block::new(Vec::new(), vec![blob_tx(vec![blob(1, 10)])]);
        let config = Config {
            max_square_size: usize::MAX,
            ..Config::default()
        };
        assert!(matches!(
            Layout::new(&block, &config),
            Err(Error::InvalidMaxSquareSize(usize::MAX))
        ));
    }
}
