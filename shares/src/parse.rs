//! Recover units and blobs from shares.

use crate::{constants::SHARE_SIZE, Blob, Error, Share};
use bytes::Bytes;
use prost::encoding::decode_varint;

/// Recover the units (transactions or wrapped pay-for-blobs) of one compact sequence.
pub fn parse_txs(shares: &[Share]) -> Result<Vec<Bytes>, Error> {
    let Some((first, rest)) = shares.split_first() else {
        return Ok(Vec::new());
    };
    if !first.is_compact() {
        return Err(Error::NotCompact(first.namespace()));
    }
    let sequence_len = first.sequence_len().ok_or(Error::MissingSequenceStart)? as usize;

    let mut content = Vec::with_capacity(sequence_len.min(shares.len() * SHARE_SIZE));
    content.extend_from_slice(first.content());
    for share in rest {
        if share.namespace() != first.namespace() {
            return Err(Error::NamespaceMismatch);
        }
        if share.is_sequence_start() {
            return Err(Error::UnexpectedSequenceStart);
        }
        content.extend_from_slice(share.content());
    }
    if content.len() < sequence_len {
        return Err(Error::TruncatedSequence(content.len(), sequence_len));
    }
    content.truncate(sequence_len);

    let content = Bytes::from(content);
    let mut units = Vec::new();
    let mut buf = &content[..];
    while !buf.is_empty() {
        let len = decode_varint(&mut buf).map_err(|_| Error::InvalidDelimiter)? as usize;
        if len > buf.len() {
            return Err(Error::TruncatedSequence(buf.len(), len));
        }
        let start = content.len() - buf.len();
        units.push(content.slice(start..start + len));
        buf = &buf[len..];
    }
    Ok(units)
}

/// Recover the blobs stored in consecutive sparse shares, skipping padding.
pub fn parse_blobs(shares: &[Share]) -> Result<Vec<Blob>, Error> {
    let available = shares.len() * SHARE_SIZE;
    let mut blobs = Vec::new();
    let mut shares = shares.iter();
    while let Some(first) = shares.next() {
        if first.is_compact() {
            return Err(Error::NotSparse(first.namespace()));
        }
        let sequence_len = first.sequence_len().ok_or(Error::MissingSequenceStart)? as usize;
        let mut data = Vec::with_capacity(sequence_len.min(available));
        data.extend_from_slice(first.content());
        while data.len() < sequence_len {
            let share = shares
                .next()
                .ok_or(Error::TruncatedSequence(data.len(), sequence_len))?;
            if share.namespace() != first.namespace() {
                return Err(Error::NamespaceMismatch);
            }
            if share.is_sequence_start() {
                return Err(Error::UnexpectedSequenceStart);
            }
            data.extend_from_slice(share.content());
        }
        if first.is_padding() {
            continue;
        }
        data.truncate(sequence_len);
        blobs.push(Blob::new(
            first.namespace(),
            data,
            first.version(),
            first.signer(),
        )?);
    }
    Ok(blobs)
}
