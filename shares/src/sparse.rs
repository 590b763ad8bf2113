//! Sparse shares hold the data of exactly one blob each.

use crate::{
    constants::{
        CONTINUATION_SPARSE_SHARE_CONTENT_SIZE, FIRST_SPARSE_SHARE_CONTENT_SIZE, SIGNER_SIZE,
    },
    share::Builder,
    Blob, Error, Share,
};

/// Number of sparse shares needed for a blob of `len` bytes.
pub fn sparse_shares_needed(len: usize, signed: bool) -> usize {
    if len == 0 {
        return 0;
    }
    let first = if signed {
        FIRST_SPARSE_SHARE_CONTENT_SIZE - SIGNER_SIZE
    } else {
        FIRST_SPARSE_SHARE_CONTENT_SIZE
    };
    if len <= first {
        return 1;
    }
    1 + (len - first).div_ceil(CONTINUATION_SPARSE_SHARE_CONTENT_SIZE)
}

/// Writes blobs (and the padding between them) into sparse shares.
#[derive(Clone, Debug, Default)]
pub struct SparseSplitter {
    shares: Vec<Share>,
}

impl SparseSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the shares of `blob`. Its last share is zero padded.
    pub fn write(&mut self, blob: &Blob) {
        let data = blob.data();
        let mut builder = Builder::new(blob.namespace(), blob.share_version(), true);
        // Bounded by `Blob::new`.
        builder.write_u32(data.len() as u32);
        if let Some(signer) = blob.signer() {
            builder.write(signer);
        }
        let mut offset = builder.write(data);
        self.shares.push(builder.build());
        while offset < data.len() {
            let mut builder = Builder::new(blob.namespace(), blob.share_version(), false);
            offset += builder.write(&data[offset..]);
            self.shares.push(builder.build());
        }
    }

    /// Append `count` padding shares in the namespace of the last written share.
    pub fn write_namespace_padding(&mut self, count: usize) -> Result<(), Error> {
        if count == 0 {
            return Ok(());
        }
        let namespace = self
            .shares
            .last()
            .ok_or(Error::EmptySplitter)?
            .namespace();
        self.shares
            .extend(std::iter::repeat(Share::namespace_padding(namespace)).take(count));
        Ok(())
    }

    /// Number of shares written so far.
    pub fn count(&self) -> usize {
        self.shares.len()
    }

    pub fn export(self) -> Vec<Share> {
        self.shares
    }
}

/// Split blobs into sparse shares, one list per blob.
pub fn split_blobs(blobs: &[Blob]) -> Vec<Vec<Share>> {
    blobs
        .iter()
        .map(|blob| {
            let mut splitter = SparseSplitter::new();
            splitter.write(blob);
            splitter.export()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::SHARE_VERSION_ONE, Namespace};
    use test_case::test_case;

    fn namespace() -> Namespace {
        Namespace::new_v0(&[0xAA; 10]).unwrap()
    }

    #[test_case(0, false, 0)]
    #[test_case(1, false, 1)]
    #[test_case(478, false, 1)]
    #[test_case(479, false, 2)]
    #[test_case(478 + 482, false, 2)]
    #[test_case(478 + 482 + 1, false, 3)]
    #[test_case(458, true, 1)]
    #[test_case(459, true, 2)]
    fn test_sparse_shares_needed(len: usize, signed: bool, expected: usize) {
        assert_eq!(sparse_shares_needed(len, signed), expected);
    }

    #[test]
    fn test_split_single_share() {
        let blob = Blob::new(namespace(), vec![5u8; 100], 0, None).unwrap();
        let shares = split_blobs(&[blob]).remove(0);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].namespace(), namespace());
        assert_eq!(shares[0].sequence_len(), Some(100));
        assert_eq!(&shares[0].content()[..100], &[5u8; 100]);
        assert!(shares[0].content()[100..].iter().all(|b| *b == 0));
        assert_eq!(shares[0].reserved_bytes(), None);
    }

    #[test]
    fn test_split_exact_capacity() {
        let blob = Blob::new(namespace(), vec![1u8; 478 + 482], 0, None).unwrap();
        let shares = split_blobs(&[blob.clone()]).remove(0);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares.len(), blob.shares_needed());
        assert!(!shares[1].is_sequence_start());
        assert!(shares[1].content().iter().all(|b| *b == 1));
    }

    #[test]
    fn test_split_signed() {
        let signer = [9u8; SIGNER_SIZE];
        let blob = Blob::new(namespace(), vec![3u8; 500], SHARE_VERSION_ONE, Some(signer)).unwrap();
        let shares = split_blobs(&[blob.clone()]).remove(0);
        assert_eq!(shares.len(), blob.shares_needed());
        assert_eq!(shares[0].signer(), Some(signer));
        assert_eq!(shares[0].version(), SHARE_VERSION_ONE);
        assert_eq!(shares[1].version(), SHARE_VERSION_ONE);
        assert_eq!(shares[0].content().len(), 458);
    }

    #[test]
    fn test_blobs_do_not_share_shares() {
        let a = Blob::new(namespace(), vec![1u8; 10], 0, None).unwrap();
        let b = Blob::new(namespace(), vec![2u8; 10], 0, None).unwrap();
        let split = split_blobs(&[a, b]);
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].len(), 1);
        assert_eq!(split[1].len(), 1);
    }

    #[test]
    fn test_namespace_padding() {
        let mut splitter = SparseSplitter::new();
        assert_eq!(
            splitter.write_namespace_padding(1),
            Err(Error::EmptySplitter)
        );
        assert_eq!(splitter.write_namespace_padding(0), Ok(()));

        let blob = Blob::new(namespace(), vec![1u8; 10], 0, None).unwrap();
        splitter.write(&blob);
        splitter.write_namespace_padding(2).unwrap();
        assert_eq!(splitter.count(), 3);
        let shares = splitter.export();
        assert_eq!(shares[1], Share::namespace_padding(namespace()));
        assert!(shares[2].is_padding());
    }
}
