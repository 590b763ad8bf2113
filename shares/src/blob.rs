use crate::{constants::SIGNER_SIZE, sparse::sparse_shares_needed, Class, Error, Namespace};
use bytes::Bytes;

/// Opaque user data bound to one namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    namespace: Namespace,
    data: Bytes,
    share_version: u8,
    signer: Option<[u8; SIGNER_SIZE]>,
}

impl Blob {
    /// Create a blob. The namespace must accept user data, the data must be non-empty and fit in a
    /// sequence, and a signer must be present exactly when the share version requires one.
    pub fn new(
        namespace: Namespace,
        data: impl Into<Bytes>,
        share_version: u8,
        signer: Option<[u8; SIGNER_SIZE]>,
    ) -> Result<Self, Error> {
        let class = Class::of_blob(&namespace, share_version)?;
        let data = data.into();
        if data.is_empty() {
            return Err(Error::EmptyBlob);
        }
        if u32::try_from(data.len()).is_err() {
            return Err(Error::SequenceTooLong(data.len()));
        }
        match (class.is_signed(), signer.is_some()) {
            (true, false) => return Err(Error::MissingSigner),
            (false, true) => return Err(Error::UnexpectedSigner),
            _ => {}
        }
        Ok(Self {
            namespace,
            data,
            share_version,
            signer,
        })
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn share_version(&self) -> u8 {
        self.share_version
    }

    pub fn signer(&self) -> Option<&[u8; SIGNER_SIZE]> {
        self.signer.as_ref()
    }

    /// Number of sparse shares the blob occupies.
    pub fn shares_needed(&self) -> usize {
        sparse_shares_needed(self.data.len(), self.signer.is_some())
    }
}
