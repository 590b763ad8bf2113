use super::{Error, Node};
use sha2::{Digest as _, Sha256};

const LEAF_PREFIX: u8 = 0;
const NODE_PREFIX: u8 = 1;

/// Computes namespaced digests for leaves and inner nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hasher<const N: usize> {
    ignore_max_namespace: bool,
}

impl<const N: usize> Default for Hasher<N> {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<const N: usize> Hasher<N> {
    /// The all-`0xFF` namespace.
    pub const MAX_NAMESPACE: [u8; N] = [0xFF; N];

    /// Create a hasher. If `ignore_max_namespace` is set, [Self::MAX_NAMESPACE] is only reported as a
    /// node's `max` when every leaf below it carries that namespace.
    pub fn new(ignore_max_namespace: bool) -> Self {
        Self {
            ignore_max_namespace,
        }
    }

    /// Root of a tree without leaves.
    pub fn empty_root(&self) -> Node<N> {
        Node {
            min: [0; N],
            max: [0; N],
            digest: Sha256::digest(b"").into(),
        }
    }

    /// Hash a raw leaf (`namespace || data`).
    pub fn leaf(&self, leaf: &[u8]) -> Result<Node<N>, Error> {
        if leaf.len() < N {
            return Err(Error::LeafTooShort(leaf.len(), N));
        }
        let mut namespace = [0u8; N];
        namespace.copy_from_slice(&leaf[..N]);

        let mut hasher = Sha256::new();
        hasher.update([LEAF_PREFIX]);
        hasher.update(leaf);
        Ok(Node {
            min: namespace,
            max: namespace,
            digest: hasher.finalize().into(),
        })
    }

    /// Hash two siblings into their parent.
    pub fn node(&self, left: &Node<N>, right: &Node<N>) -> Result<Node<N>, Error> {
        if right.min < left.max {
            return Err(Error::UnorderedSiblings);
        }
        let max = if self.ignore_max_namespace && left.min == Self::MAX_NAMESPACE {
            Self::MAX_NAMESPACE
        } else if self.ignore_max_namespace && right.min == Self::MAX_NAMESPACE {
            left.max
        } else {
            right.max.max(left.max)
        };

        let mut hasher = Sha256::new();
        hasher.update([NODE_PREFIX]);
        hasher.update(left.to_vec());
        hasher.update(right.to_vec());
        Ok(Node {
            min: left.min,
            max,
            digest: hasher.finalize().into(),
        })
    }
}
