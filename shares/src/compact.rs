//! Compact shares pack many length-delimited units (transactions or wrapped pay-for-blobs) into
//! one sequence.
//!
//! The sequence is a single stream of `varint(len) || unit` records. The first share records the
//! length of the whole stream and each share's reserved bytes point at the first record that starts
//! inside it, so a reader can begin parsing from any share.

use crate::{
    constants::{
        CONTINUATION_COMPACT_SHARE_CONTENT_SIZE, COMPACT_SHARE_RESERVED_BYTES,
        FIRST_COMPACT_SHARE_CONTENT_SIZE, SHARE_VERSION_ZERO,
    },
    share::Builder,
    Error, Namespace, Share,
};
use prost::{encoding::encode_varint, length_delimiter_len};
use std::ops::Range;

/// Number of bytes a unit of `len` bytes occupies in a compact sequence.
pub fn delimited_len(len: usize) -> usize {
    length_delimiter_len(len) + len
}

/// Number of compact shares needed for a sequence of `sequence_len` (delimited) bytes.
pub fn compact_shares_needed(sequence_len: usize) -> usize {
    if sequence_len == 0 {
        return 0;
    }
    if sequence_len <= FIRST_COMPACT_SHARE_CONTENT_SIZE {
        return 1;
    }
    1 + (sequence_len - FIRST_COMPACT_SHARE_CONTENT_SIZE).div_ceil(CONTINUATION_COMPACT_SHARE_CONTENT_SIZE)
}

/// Index of the share that holds byte `offset` of a compact sequence.
pub fn share_index(offset: usize) -> usize {
    if offset < FIRST_COMPACT_SHARE_CONTENT_SIZE {
        return 0;
    }
    1 + (offset - FIRST_COMPACT_SHARE_CONTENT_SIZE) / CONTINUATION_COMPACT_SHARE_CONTENT_SIZE
}

/// Share range (relative to the start of the sequence) occupied by unit `index` of a sequence
/// whose units have the given (undelimited) lengths, or `None` if there is no such unit.
pub fn unit_share_range(
    unit_lens: impl IntoIterator<Item = usize>,
    index: usize,
) -> Option<Range<usize>> {
    let (start, len) = unit_lens
        .into_iter()
        .scan(0usize, |offset, len| {
            let start = *offset;
            let len = delimited_len(len);
            *offset += len;
            Some((start, len))
        })
        .nth(index)?;
    Some(share_index(start)..share_index(start + len - 1) + 1)
}

/// Tracks how many compact shares a sequence needs as units are added, without writing them.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    sequence_len: usize,
    last: usize,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit of `len` bytes, returning how many shares the sequence grew by.
    pub fn add(&mut self, len: usize) -> usize {
        let before = self.size();
        self.last = delimited_len(len);
        self.sequence_len += self.last;
        self.size() - before
    }

    /// Undo the most recent [Counter::add].
    pub fn revert(&mut self) {
        self.sequence_len -= self.last;
        self.last = 0;
    }

    /// Number of shares the sequence occupies.
    pub fn size(&self) -> usize {
        compact_shares_needed(self.sequence_len)
    }
}

/// Writes units into a compact share sequence.
#[derive(Clone, Debug)]
pub struct CompactSplitter {
    namespace: Namespace,
    stream: Vec<u8>,
    starts: Vec<usize>,
}

impl CompactSplitter {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            stream: Vec::new(),
            starts: Vec::new(),
        }
    }

    /// Append a unit. Fails if the sequence would no longer fit its 4 byte length.
    pub fn write(&mut self, unit: &[u8]) -> Result<(), Error> {
        let total = self.stream.len() + delimited_len(unit.len());
        if u32::try_from(total).is_err() {
            return Err(Error::SequenceTooLong(total));
        }
        self.starts.push(self.stream.len());
        encode_varint(unit.len() as u64, &mut self.stream);
        self.stream.extend_from_slice(unit);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// Number of shares written so far.
    pub fn count(&self) -> usize {
        compact_shares_needed(self.stream.len())
    }

    /// Number of units written so far.
    pub fn units(&self) -> usize {
        self.starts.len()
    }

    /// Chunk the sequence into shares. The last share is zero padded.
    pub fn export(&self) -> Vec<Share> {
        let count = self.count();
        let mut shares = Vec::with_capacity(count);
        let mut starts = self.starts.iter().copied().peekable();
        let mut offset = 0;
        for i in 0..count {
            let first = i == 0;
            let mut builder = Builder::new(self.namespace, SHARE_VERSION_ZERO, first);
            let capacity = if first {
                // Bounded by `write`.
                builder.write_u32(self.stream.len() as u32);
                FIRST_COMPACT_SHARE_CONTENT_SIZE
            } else {
                CONTINUATION_COMPACT_SHARE_CONTENT_SIZE
            };

            // Find the first unit starting in this share
            while starts.next_if(|start| *start < offset).is_some() {}
            let reserved = match starts.peek() {
                Some(start) if *start < offset + capacity => {
                    builder.len() + COMPACT_SHARE_RESERVED_BYTES + (start - offset)
                }
                _ => 0,
            };
            builder.write_u32(reserved as u32);

            let end = (offset + capacity).min(self.stream.len());
            builder.write(&self.stream[offset..end]);
            shares.push(builder.build());
            offset = end;
        }
        shares
    }
}

/// Split transactions into compact shares in the transaction namespace.
pub fn split_txs<T: AsRef<[u8]>>(txs: &[T]) -> Result<Vec<Share>, Error> {
    let mut splitter = CompactSplitter::new(Namespace::TX);
    for tx in txs {
        splitter.write(tx.as_ref())?;
    }
    Ok(splitter.export())
}
