use crate::{Block, Error, Layout};
use std::iter;
use tessera_shares::{compact::CompactSplitter, sparse::SparseSplitter, Namespace, Share};

/// Produces the rows of a square in order, writing shares only as rows are requested.
///
/// Every consumer of square rows (assembly and proof generation) reads them through this type, so
/// they agree on where each share lands.
#[derive(Clone, Copy, Debug)]
pub struct Rows<'a> {
    block: &'a Block,
    layout: &'a Layout,
    square_size: usize,
    rows: usize,
}

impl<'a> Rows<'a> {
    /// All rows of the square of side `square_size` holding `block`.
    pub fn new(block: &'a Block, layout: &'a Layout, square_size: usize) -> Self {
        Self {
            block,
            layout,
            square_size,
            rows: square_size,
        }
    }

    /// Stop after the first `rows` rows.
    pub fn take(self, rows: usize) -> Self {
        Self {
            rows: rows.min(self.square_size),
            ..self
        }
    }

    pub fn square_size(&self) -> usize {
        self.square_size
    }

    /// Start producing rows.
    pub fn iter(&self) -> Result<RowIter<'a>, Error> {
        self.layout.check_square_size(self.square_size)?;
        let (block, layout) = (self.block, self.layout);

        let mut txs = CompactSplitter::new(Namespace::TX);
        for tx in block.txs() {
            txs.write(tx)?;
        }
        let mut pfbs = CompactSplitter::new(Namespace::PAY_FOR_BLOB);
        for wrapper in layout.wrappers() {
            pfbs.write(wrapper)?;
        }
        let reserved = layout.pfb_reserved() - layout.pfb_shares();

        let blobs = layout
            .placements()
            .iter()
            .scan(
                (layout.blobs_start(), None),
                |(cursor, previous): &mut (usize, Option<Namespace>), placement| {
                    let padding = match previous {
                        Some(namespace) => Share::namespace_padding(*namespace),
                        None => Share::reserved_padding(),
                    };
                    let count = placement.start - *cursor;
                    *cursor = placement.start + placement.len;
                    *previous = Some(placement.namespace);
                    Some((padding, count, placement))
                },
            )
            .flat_map(move |(padding, count, placement)| {
                let mut splitter = SparseSplitter::new();
                splitter.write(&block.blob_txs()[placement.tx].blobs[placement.blob]);
                iter::repeat(padding).take(count).chain(splitter.export())
            });

        let shares = txs
            .export()
            .into_iter()
            .chain(pfbs.export())
            .chain(iter::repeat(Share::reserved_padding()).take(reserved))
            .chain(blobs)
            .chain(iter::repeat(Share::tail_padding()));
        Ok(RowIter {
            shares: Box::new(shares),
            square_size: self.square_size,
            remaining: self.rows,
        })
    }
}

/// Iterator over the rows of a square. See [Rows].
pub struct RowIter<'a> {
    shares: Box<dyn Iterator<Item = Share> + 'a>,
    square_size: usize,
    remaining: usize,
}

impl Iterator for RowIter<'_> {
    type Item = Vec<Share>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.shares.by_ref().take(self.square_size).collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RowIter<'_> {}
