//! Namespaces and the classification of namespace/share version pairs.

use crate::{
    constants::{
        NAMESPACE_ID_SIZE, NAMESPACE_SIZE, NAMESPACE_VERSION_SIZE, NAMESPACE_VERSION_ZERO_ID_SIZE,
        NAMESPACE_VERSION_ZERO_PREFIX_SIZE, SHARE_VERSION_ONE, SHARE_VERSION_ZERO,
    },
    Error,
};
use commonware_utils::hex;

/// Namespace version for user and primary reserved namespaces.
pub const NAMESPACE_VERSION_ZERO: u8 = 0;

/// Namespace version reserved for protocol use.
pub const NAMESPACE_VERSION_MAX: u8 = u8::MAX;

/// Identifier that partitions shares by owner or kind.
///
/// Namespaces are ordered by their serialized bytes (version first).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace {
    version: u8,
    id: [u8; NAMESPACE_ID_SIZE],
}

const fn primary_reserved(last: u8) -> Namespace {
    let mut id = [0u8; NAMESPACE_ID_SIZE];
    id[NAMESPACE_ID_SIZE - 1] = last;
    Namespace {
        version: NAMESPACE_VERSION_ZERO,
        id,
    }
}

const fn secondary_reserved(last: u8) -> Namespace {
    let mut id = [0xFF; NAMESPACE_ID_SIZE];
    id[NAMESPACE_ID_SIZE - 1] = last;
    Namespace {
        version: NAMESPACE_VERSION_MAX,
        id,
    }
}

impl Namespace {
    /// Ordinary transactions.
    pub const TX: Self = primary_reserved(0x01);
    /// Pay-for-blob transactions wrapped with the indexes of their blobs.
    pub const PAY_FOR_BLOB: Self = primary_reserved(0x04);
    /// Padding between the reserved compact shares and the first blob.
    pub const PRIMARY_RESERVED_PADDING: Self = primary_reserved(0xFF);
    /// Largest primary reserved namespace.
    pub const MAX_PRIMARY_RESERVED: Self = primary_reserved(0xFF);
    /// Smallest secondary reserved namespace.
    pub const MIN_SECONDARY_RESERVED: Self = Namespace {
        version: NAMESPACE_VERSION_MAX,
        id: [0; NAMESPACE_ID_SIZE],
    };
    /// Padding after the last blob of a square.
    pub const TAIL_PADDING: Self = secondary_reserved(0xFE);
    /// Parity (erasure coded) shares.
    pub const PARITY_SHARES: Self = secondary_reserved(0xFF);

    /// Create a namespace, validating the version and id.
    pub fn new(version: u8, id: &[u8]) -> Result<Self, Error> {
        if id.len() != NAMESPACE_ID_SIZE {
            return Err(Error::InvalidNamespaceSize(NAMESPACE_VERSION_SIZE + id.len()));
        }
        match version {
            NAMESPACE_VERSION_ZERO => {
                if id[..NAMESPACE_VERSION_ZERO_PREFIX_SIZE].iter().any(|b| *b != 0) {
                    return Err(Error::InvalidNamespacePrefix);
                }
            }
            NAMESPACE_VERSION_MAX => {}
            version => return Err(Error::UnsupportedNamespaceVersion(version)),
        }
        let mut buf = [0u8; NAMESPACE_ID_SIZE];
        buf.copy_from_slice(id);
        Ok(Self { version, id: buf })
    }

    /// Create a version 0 namespace from up to 10 user controlled bytes (left padded with zeros).
    pub fn new_v0(sub_id: &[u8]) -> Result<Self, Error> {
        if sub_id.len() > NAMESPACE_VERSION_ZERO_ID_SIZE {
            return Err(Error::InvalidNamespaceSize(
                NAMESPACE_SIZE - NAMESPACE_VERSION_ZERO_ID_SIZE + sub_id.len(),
            ));
        }
        let mut id = [0u8; NAMESPACE_ID_SIZE];
        id[NAMESPACE_ID_SIZE - sub_id.len()..].copy_from_slice(sub_id);
        Ok(Self {
            version: NAMESPACE_VERSION_ZERO,
            id,
        })
    }

    /// Parse a serialized namespace (`version || id`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != NAMESPACE_SIZE {
            return Err(Error::InvalidNamespaceSize(bytes.len()));
        }
        Self::new(bytes[0], &bytes[1..])
    }

    /// Serialize the namespace (`version || id`).
    pub fn to_bytes(&self) -> [u8; NAMESPACE_SIZE] {
        let mut out = [0u8; NAMESPACE_SIZE];
        out[0] = self.version;
        out[1..].copy_from_slice(&self.id);
        out
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn id(&self) -> &[u8; NAMESPACE_ID_SIZE] {
        &self.id
    }

    pub fn is_tx(&self) -> bool {
        *self == Self::TX
    }

    pub fn is_pay_for_blob(&self) -> bool {
        *self == Self::PAY_FOR_BLOB
    }

    pub fn is_primary_reserved_padding(&self) -> bool {
        *self == Self::PRIMARY_RESERVED_PADDING
    }

    pub fn is_tail_padding(&self) -> bool {
        *self == Self::TAIL_PADDING
    }

    pub fn is_parity_shares(&self) -> bool {
        *self == Self::PARITY_SHARES
    }

    /// Whether the namespace is reserved for protocol use (primary or secondary).
    pub fn is_reserved(&self) -> bool {
        *self <= Self::MAX_PRIMARY_RESERVED || *self >= Self::MIN_SECONDARY_RESERVED
    }

    /// Whether shares of this namespace are compact (many units per share).
    pub fn is_compact(&self) -> bool {
        self.is_tx() || self.is_pay_for_blob()
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Namespace({})", hex(&self.to_bytes()))
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.to_bytes()))
    }
}

/// What a namespace (paired with the share version of its data) may be used for.
///
/// Every consumer that needs to know whether a namespace may carry user data switches over this set
/// rather than comparing namespace bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    /// Reserved for protocol use (transactions, pay-for-blobs, padding, secondary reserved).
    Reserved,
    /// The parity shares sentinel.
    ParityShares,
    /// The tail padding sentinel.
    TailPadding,
    /// User data without a signer.
    BlobV0,
    /// User data whose first share carries the signer.
    BlobV1,
}

impl Class {
    /// Classify a namespace and share version. Sentinels are recognized before the share version is
    /// inspected; an unsupported share version is an error for every other namespace, reserved or
    /// not.
    pub fn of(namespace: &Namespace, share_version: u8) -> Result<Self, Error> {
        if namespace.is_parity_shares() {
            return Ok(Self::ParityShares);
        }
        if namespace.is_tail_padding() {
            return Ok(Self::TailPadding);
        }
        let signed = match share_version {
            SHARE_VERSION_ZERO => false,
            SHARE_VERSION_ONE => true,
            version => return Err(Error::UnsupportedShareVersion(version)),
        };
        if namespace.is_reserved() {
            return Ok(Self::Reserved);
        }
        Ok(if signed { Self::BlobV1 } else { Self::BlobV0 })
    }

    /// Classify a namespace and share version, rejecting anything that may not carry user data with
    /// an error specific to the namespace.
    pub fn of_blob(namespace: &Namespace, share_version: u8) -> Result<Self, Error> {
        match Self::of(namespace, share_version)? {
            Self::Reserved => Err(Error::ReservedNamespace(*namespace)),
            Self::ParityShares => Err(Error::ParitySharesNamespace),
            Self::TailPadding => Err(Error::TailPaddingNamespace),
            class => Ok(class),
        }
    }

    /// Whether data of this class carries a signer.
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::BlobV1)
    }
}
