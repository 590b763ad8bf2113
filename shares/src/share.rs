//! Fixed-size shares and their headers.
//!
//! Every share starts with a namespace and an info byte. The first share of a sequence also carries
//! the big-endian length of the sequence. Compact shares (transactions and pay-for-blobs) then carry
//! four reserved bytes holding the position of the first unit that starts in the share, and the
//! first share of a share version 1 blob carries the signer:
//!
//! ```text
//! compact, first:        | namespace | info | sequence len | reserved | content |
//! compact, continuation: | namespace | info | reserved | content |
//! sparse, first:         | namespace | info | sequence len | [signer] | content |
//! sparse, continuation:  | namespace | info | content |
//! ```

use crate::{
    constants::{
        COMPACT_SHARE_RESERVED_BYTES, MAX_SHARE_VERSION, NAMESPACE_SIZE, SEQUENCE_LEN_BYTES,
        SHARE_INFO_BYTES, SHARE_SIZE, SHARE_VERSION_ONE, SHARE_VERSION_ZERO, SIGNER_SIZE,
    },
    Error, Namespace,
};
use commonware_utils::hex;

/// Share version and sequence start flag (`version << 1 | sequence_start`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoByte(u8);

impl InfoByte {
    pub fn new(version: u8, sequence_start: bool) -> Result<Self, Error> {
        if version > MAX_SHARE_VERSION {
            return Err(Error::InvalidShareVersion(version));
        }
        Ok(Self(version << 1 | sequence_start as u8))
    }

    pub fn version(&self) -> u8 {
        self.0 >> 1
    }

    pub fn is_sequence_start(&self) -> bool {
        self.0 & 1 == 1
    }

    pub fn to_u8(self) -> u8 {
        self.0
    }
}

/// A fixed-size, namespace-tagged unit of block data.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Share {
    namespace: Namespace,
    data: [u8; SHARE_SIZE],
}

impl Share {
    /// Parse a raw share, validating its size and namespace.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SHARE_SIZE {
            return Err(Error::InvalidShareSize(bytes.len()));
        }
        let namespace = Namespace::from_bytes(&bytes[..NAMESPACE_SIZE])?;
        let mut data = [0u8; SHARE_SIZE];
        data.copy_from_slice(bytes);
        Ok(Self { namespace, data })
    }

    pub fn as_bytes(&self) -> &[u8; SHARE_SIZE] {
        &self.data
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn info(&self) -> InfoByte {
        InfoByte(self.data[NAMESPACE_SIZE])
    }

    pub fn version(&self) -> u8 {
        self.info().version()
    }

    pub fn is_sequence_start(&self) -> bool {
        self.info().is_sequence_start()
    }

    pub fn is_compact(&self) -> bool {
        self.namespace().is_compact()
    }

    /// Length of the sequence this share starts, if it starts one.
    pub fn sequence_len(&self) -> Option<u32> {
        if !self.is_sequence_start() {
            return None;
        }
        let start = NAMESPACE_SIZE + SHARE_INFO_BYTES;
        Some(read_u32(&self.data[start..start + SEQUENCE_LEN_BYTES]))
    }

    /// Position (within the share) of the first unit that starts in a compact share, or 0 if none
    /// does. `None` for sparse shares.
    pub fn reserved_bytes(&self) -> Option<u32> {
        if !self.is_compact() {
            return None;
        }
        let start = self.header_len() - COMPACT_SHARE_RESERVED_BYTES;
        Some(read_u32(&self.data[start..start + COMPACT_SHARE_RESERVED_BYTES]))
    }

    /// Signer embedded in the first share of a share version 1 blob.
    pub fn signer(&self) -> Option<[u8; SIGNER_SIZE]> {
        if !self.is_sequence_start() || self.is_compact() || self.version() != SHARE_VERSION_ONE {
            return None;
        }
        let start = NAMESPACE_SIZE + SHARE_INFO_BYTES + SEQUENCE_LEN_BYTES;
        let mut signer = [0u8; SIGNER_SIZE];
        signer.copy_from_slice(&self.data[start..start + SIGNER_SIZE]);
        Some(signer)
    }

    /// Whether the share only pads the square.
    pub fn is_padding(&self) -> bool {
        let namespace = self.namespace();
        namespace.is_tail_padding()
            || namespace.is_primary_reserved_padding()
            || (!self.is_compact() && self.sequence_len() == Some(0))
    }

    /// The bytes after the header.
    pub fn content(&self) -> &[u8] {
        &self.data[self.header_len()..]
    }

    fn header_len(&self) -> usize {
        header_len(
            self.is_compact(),
            self.is_sequence_start(),
            self.signer().is_some(),
        )
    }

    /// A padding share in `namespace` written after a blob to align the next one.
    pub fn namespace_padding(namespace: Namespace) -> Self {
        let mut builder = Builder::new(namespace, SHARE_VERSION_ZERO, true);
        builder.write_u32(0);
        builder.build()
    }

    /// A padding share between the reserved compact shares and the first blob.
    pub fn reserved_padding() -> Self {
        Self::namespace_padding(Namespace::PRIMARY_RESERVED_PADDING)
    }

    /// A padding share after the last blob.
    pub fn tail_padding() -> Self {
        Self::namespace_padding(Namespace::TAIL_PADDING)
    }
}

impl std::fmt::Debug for Share {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Share")
            .field("namespace", &self.namespace())
            .field("info", &self.info())
            .field("content", &hex(self.content()))
            .finish()
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

pub(crate) fn header_len(compact: bool, sequence_start: bool, signed: bool) -> usize {
    let mut len = NAMESPACE_SIZE + SHARE_INFO_BYTES;
    if sequence_start {
        len += SEQUENCE_LEN_BYTES;
    }
    if compact {
        len += COMPACT_SHARE_RESERVED_BYTES;
    } else if sequence_start && signed {
        len += SIGNER_SIZE;
    }
    len
}

/// Writes a single share front to back, zero padding whatever is left.
pub(crate) struct Builder {
    namespace: Namespace,
    data: [u8; SHARE_SIZE],
    len: usize,
}

impl Builder {
    /// Start a share. `version` must already be a supported share version.
    pub(crate) fn new(namespace: Namespace, version: u8, sequence_start: bool) -> Self {
        let mut data = [0u8; SHARE_SIZE];
        data[..NAMESPACE_SIZE].copy_from_slice(&namespace.to_bytes());
        data[NAMESPACE_SIZE] = version << 1 | sequence_start as u8;
        Self {
            namespace,
            data,
            len: NAMESPACE_SIZE + SHARE_INFO_BYTES,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn available(&self) -> usize {
        SHARE_SIZE - self.len
    }

    pub(crate) fn write_u32(&mut self, value: u32) {
        self.write(&value.to_be_bytes());
    }

    /// Write as much of `bytes` as fits, returning the number of bytes written.
    pub(crate) fn write(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.available());
        self.data[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    pub(crate) fn build(self) -> Share {
        Share {
            namespace: self.namespace,
            data: self.data,
        }
    }
}
