use crate::Error;
use reed_solomon_simd::ReedSolomonEncoder;
use tessera_shares::{constants::SHARE_SIZE, Share};

/// An erasure code that extends `k` shares with `k` parity shares.
pub trait Codec {
    /// Compute the parity shares of `original`.
    fn encode(&self, original: &[&[u8]]) -> Result<Vec<Vec<u8>>, Error>;
}

/// Systematic Reed-Solomon code over GF(2^16).
#[derive(Clone, Copy, Debug, Default)]
pub struct ReedSolomon;

impl Codec for ReedSolomon {
    fn encode(&self, original: &[&[u8]]) -> Result<Vec<Vec<u8>>, Error> {
        let k = original.len();
        let count = u16::try_from(k).map_err(|_| Error::InvalidParity(k, SHARE_SIZE))?;
        let mut encoder = ReedSolomonEncoder::new(count.into(), count.into(), SHARE_SIZE)?;
        for shard in original {
            encoder.add_original_shard(shard)?;
        }
        let recovery = encoder
            .encode()?
            .recovery_iter()
            .map(<[u8]>::to_vec)
            .collect();
        Ok(recovery)
    }
}

/// Extend a row of original shares with its parity, returning all `2k` shares as bytes.
pub fn extend_row<C: Codec>(row: &[Share], codec: &C) -> Result<Vec<Vec<u8>>, Error> {
    let original: Vec<&[u8]> = row.iter().map(|share| share.as_bytes().as_slice()).collect();
    let parity = codec.encode(&original)?;
    if parity.len() != row.len() || parity.iter().any(|share| share.len() != SHARE_SIZE) {
        return Err(Error::InvalidParity(row.len(), SHARE_SIZE));
    }
    Ok(original
        .into_iter()
        .map(<[u8]>::to_vec)
        .chain(parity)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reed_solomon_simd::ReedSolomonDecoder;
    use tessera_shares::Namespace;

    /// Returns parity of the wrong shape.
    struct Truncating;

    impl Codec for Truncating {
        fn encode(&self, original: &[&[u8]]) -> Result<Vec<Vec<u8>>, Error> {
            Ok(vec![vec![0u8; SHARE_SIZE]; original.len().saturating_sub(1)])
        }
    }

    fn row(k: usize) -> Vec<Share> {
        (0..k)
            .map(|i| Share::namespace_padding(Namespace::new_v0(&[i as u8 + 1; 10]).unwrap()))
            .collect()
    }

    #[test]
    fn test_extend_row() {
        let row = row(4);
        let extended = extend_row(&row, &ReedSolomon).unwrap();
        assert_eq!(extended.len(), 8);
        for (original, extended) in row.iter().zip(&extended) {
            assert_eq!(original.as_bytes().as_slice(), extended.as_slice());
        }
        assert!(extended.iter().all(|share| share.len() == SHARE_SIZE));
    }

    #[test]
    fn test_parity_recovers_row() {
        let row = row(4);
        let extended = extend_row(&row, &ReedSolomon).unwrap();

        let mut decoder = ReedSolomonDecoder::new(4, 4, SHARE_SIZE).unwrap();
        decoder.add_original_shard(1, &extended[1]).unwrap();
        for i in 0..3 {
            decoder.add_recovery_shard(i, &extended[4 + i]).unwrap();
        }
        let result = decoder.decode().unwrap();
        let restored: Vec<_> = result.restored_original_iter().collect();
        assert_eq!(restored.len(), 3);
        for (index, share) in restored {
            assert_eq!(share, extended[index].as_slice());
        }
    }

    #[test]
    fn test_single_share_row() {
        let extended = extend_row(&row(1), &ReedSolomon).unwrap();
        assert_eq!(extended.len(), 2);
    }

    #[test]
    fn test_rejects_bad_parity() {
        assert!(matches!(
            extend_row(&row(4), &Truncating),
            Err(Error::InvalidParity(4, SHARE_SIZE))
        ));
    }
}
