//! Stateless validation of blob transactions.
//!
//! Checks run in a fixed order and the first failure is returned:
//!
//! 1. Every pay-for-blobs declaration is well formed.
//! 2. The transaction carries exactly one message and it is a pay-for-blobs declaration.
//! 3. Every declared namespace may carry user data.
//! 4. Every declared share version is enabled and signed blobs name the declaration's signer.
//! 5. The attached blobs match the declared count, sizes, namespaces, and share versions.
//! 6. The attached blobs match the declared commitments.

use crate::{
    tx::{blob_from_wire, commitment_from_bytes, pay_for_blobs, BlobTx},
    wire, Config, Error,
};
use bytes::Bytes;
use tessera_shares::{
    commitment::create_commitment,
    constants::{SHARE_VERSION_ZERO, SIGNER_SIZE},
    Blob, Class, Namespace,
};

/// Check that the parallel arrays of a declaration agree and hold sane values.
pub fn validate_declaration(msg: &wire::MsgPayForBlobs) -> Result<(), Error> {
    if msg.signer.len() != SIGNER_SIZE {
        return Err(Error::InvalidSignerSize(msg.signer.len()));
    }
    if msg.namespaces.is_empty() {
        return Err(Error::EmptyDeclaration);
    }
    let namespaces = msg.namespaces.len();
    if msg.blob_sizes.len() != namespaces
        || msg.share_commitments.len() != namespaces
        || msg.share_versions.len() != namespaces
    {
        return Err(Error::MismatchedDeclaration {
            namespaces,
            sizes: msg.blob_sizes.len(),
            commitments: msg.share_commitments.len(),
            versions: msg.share_versions.len(),
        });
    }
    for commitment in &msg.share_commitments {
        commitment_from_bytes(commitment)?;
    }
    if let Some(index) = msg.blob_sizes.iter().position(|size| *size == 0) {
        return Err(Error::ZeroBlobSize(index));
    }
    Ok(())
}

/// Validate a blob transaction, returning it parsed.
pub fn validate_blob_tx(blob_tx: &wire::BlobTx, config: &Config) -> Result<BlobTx, Error> {
    let (messages, declarations) = pay_for_blobs(&blob_tx.tx)?;
    for msg in &declarations {
        validate_declaration(msg)?;
    }
    if messages != 1 {
        return Err(Error::MessageCount(messages));
    }
    let msg = declarations.first().ok_or(Error::NoPayForBlobs)?;

    let namespaces = msg
        .namespaces
        .iter()
        .map(|namespace| {
            let namespace = Namespace::from_bytes(namespace)?;
            // Only the namespace is checked here
            Class::of_blob(&namespace, SHARE_VERSION_ZERO)?;
            Ok(namespace)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut versions = Vec::with_capacity(msg.share_versions.len());
    for (namespace, version) in namespaces.iter().zip(&msg.share_versions) {
        let version = u8::try_from(*version).map_err(|_| Error::InvalidShareVersion(*version))?;
        if Class::of_blob(namespace, version)?.is_signed() && !config.signed_shares {
            return Err(Error::ShareVersionDisabled(version));
        }
        versions.push(version);
    }
    let blobs = blob_tx
        .blobs
        .iter()
        .map(blob_from_wire)
        .collect::<Result<Vec<Blob>, _>>()?;
    for (index, blob) in blobs.iter().enumerate() {
        if let Some(signer) = blob.signer() {
            if signer.as_slice() != msg.signer.as_slice() {
                return Err(Error::SignerMismatch(index));
            }
        }
    }

    if blobs.len() != msg.blob_sizes.len() {
        return Err(Error::BlobCountMismatch(msg.blob_sizes.len(), blobs.len()));
    }
    for (index, blob) in blobs.iter().enumerate() {
        let declared = msg.blob_sizes[index] as usize;
        if blob.data().len() != declared {
            return Err(Error::BlobSizeMismatch(index, declared, blob.data().len()));
        }
        if blob.namespace() != namespaces[index] {
            return Err(Error::BlobNamespaceMismatch(index));
        }
        if blob.share_version() != versions[index] {
            return Err(Error::BlobShareVersionMismatch(index));
        }
    }

    for (index, (blob, declared)) in blobs.iter().zip(&msg.share_commitments).enumerate() {
        let commitment = create_commitment(blob, config.subtree_root_threshold)?;
        if commitment != commitment_from_bytes(declared)? {
            return Err(Error::CommitmentMismatch(index));
        }
    }

    Ok(BlobTx {
        tx: Bytes::copy_from_slice(&blob_tx.tx),
        blobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{blob_to_wire, new_blob_tx};
    use prost::Message;
    use tessera_shares::constants::SHARE_VERSION_ONE;

    const SIGNER: [u8; SIGNER_SIZE] = [7; SIGNER_SIZE];

    fn namespace(sub_id: u8) -> Namespace {
        Namespace::new_v0(&[sub_id; 10]).unwrap()
    }

    fn blob(sub_id: u8, len: usize) -> Blob {
        Blob::new(namespace(sub_id), vec![sub_id; len], 0, None).unwrap()
    }

    fn valid() -> wire::BlobTx {
        new_blob_tx(SIGNER, vec![blob(1, 1000), blob(2, 10)], &Config::default())
            .unwrap()
            .to_wire()
    }

    /// Rewrite the declaration of `blob_tx`.
    fn with_declaration(
        blob_tx: &wire::BlobTx,
        f: impl FnOnce(&mut wire::MsgPayForBlobs),
    ) -> wire::BlobTx {
        let mut tx = wire::Tx::decode(blob_tx.tx.as_slice()).unwrap();
        let mut msg = wire::MsgPayForBlobs::decode(tx.messages[0].value.as_slice()).unwrap();
        f(&mut msg);
        tx.messages[0].value = msg.encode_to_vec();
        wire::BlobTx {
            tx: tx.encode_to_vec(),
            ..blob_tx.clone()
        }
    }

    #[test]
    fn test_valid() {
        let blob_tx = valid();
        let parsed = validate_blob_tx(&blob_tx, &Config::default()).unwrap();
        assert_eq!(parsed.blobs, vec![blob(1, 1000), blob(2, 10)]);
        assert_eq!(parsed.to_wire(), blob_tx);
    }

    #[test]
    fn test_valid_signed() {
        let signed = Blob::new(namespace(1), vec![1u8; 100], SHARE_VERSION_ONE, Some(SIGNER)).unwrap();
        let blob_tx = new_blob_tx(SIGNER, vec![signed], &Config::default())
            .unwrap()
            .to_wire();
        assert!(validate_blob_tx(&blob_tx, &Config::default()).is_ok());
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::for_app_version(2)),
            Err(Error::ShareVersionDisabled(SHARE_VERSION_ONE))
        ));

        let other = Blob::new(namespace(1), vec![1u8; 100], SHARE_VERSION_ONE, Some([8; 20])).unwrap();
        let mut mismatched = blob_tx;
        mismatched.blobs = vec![blob_to_wire(&other)];
        assert!(matches!(
            validate_blob_tx(&mismatched, &Config::default()),
            Err(Error::SignerMismatch(0))
        ));
    }

    #[test]
    fn test_malformed_declaration() {
        let blob_tx = with_declaration(&valid(), |msg| {
            msg.blob_sizes.pop();
        });
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::MismatchedDeclaration { sizes: 1, .. })
        ));

        let blob_tx = with_declaration(&valid(), |msg| msg.signer.truncate(3));
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::InvalidSignerSize(3))
        ));

        let blob_tx = with_declaration(&valid(), |msg| msg.share_commitments[1].push(0));
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::InvalidCommitmentSize(33))
        ));

        let blob_tx = with_declaration(&valid(), |msg| msg.blob_sizes[1] = 0);
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::ZeroBlobSize(1))
        ));

        let blob_tx = with_declaration(&valid(), |msg| {
            msg.namespaces.clear();
            msg.blob_sizes.clear();
            msg.share_commitments.clear();
            msg.share_versions.clear();
        });
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::EmptyDeclaration)
        ));
    }

    #[test]
    fn test_message_count() {
        let mut blob_tx = valid();
        let mut tx = wire::Tx::decode(blob_tx.tx.as_slice()).unwrap();
        tx.messages.push(tx.messages[0].clone());
        blob_tx.tx = tx.encode_to_vec();
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::MessageCount(2))
        ));

        let mut tx = wire::Tx::decode(blob_tx.tx.as_slice()).unwrap();
        tx.messages = vec![wire::Any {
            type_url: "/bank.v1.MsgSend".to_string(),
            value: vec![1, 2, 3],
        }];
        blob_tx.tx = tx.encode_to_vec();
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::NoPayForBlobs)
        ));
    }

    #[test]
    fn test_malformed_wins_over_message_count() {
        let blob_tx = with_declaration(&valid(), |msg| msg.signer.clear());
        let mut tx = wire::Tx::decode(blob_tx.tx.as_slice()).unwrap();
        tx.messages.push(tx.messages[0].clone());
        let blob_tx = wire::BlobTx {
            tx: tx.encode_to_vec(),
            ..blob_tx
        };
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::InvalidSignerSize(0))
        ));
    }

    fn reject_namespace(namespace: Namespace) -> Error {
        let blob_tx = with_declaration(&valid(), |msg| {
            msg.namespaces[0] = namespace.to_bytes().to_vec();
        });
        validate_blob_tx(&blob_tx, &Config::default()).unwrap_err()
    }

    #[test]
    fn test_reserved_namespaces() {
        assert!(matches!(
            reject_namespace(Namespace::TX),
            Error::Shares(tessera_shares::Error::ReservedNamespace(Namespace::TX))
        ));
        assert!(matches!(
            reject_namespace(Namespace::PAY_FOR_BLOB),
            Error::Shares(tessera_shares::Error::ReservedNamespace(_))
        ));
        assert!(matches!(
            reject_namespace(Namespace::PARITY_SHARES),
            Error::Shares(tessera_shares::Error::ParitySharesNamespace)
        ));
        assert!(matches!(
            reject_namespace(Namespace::TAIL_PADDING),
            Error::Shares(tessera_shares::Error::TailPaddingNamespace)
        ));
    }

    #[test]
    fn test_blob_mismatches() {
        let mut blob_tx = valid();
        blob_tx.blobs.pop();
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::BlobCountMismatch(2, 1))
        ));

        let mut blob_tx = valid();
        blob_tx.blobs[1].data.push(0);
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::BlobSizeMismatch(1, 10, 11))
        ));

        let mut blob_tx = valid();
        blob_tx.blobs[0].namespace_id = namespace(9).id().to_vec();
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::BlobNamespaceMismatch(0))
        ));

        let mut blob_tx = valid();
        blob_tx.blobs[0].data[500] ^= 0xFF;
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::CommitmentMismatch(0))
        ));
    }

    #[test]
    fn test_share_version() {
        let blob_tx = with_declaration(&valid(), |msg| msg.share_versions[0] = 9);
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::Shares(tessera_shares::Error::UnsupportedShareVersion(9)))
        ));

        let blob_tx = with_declaration(&valid(), |msg| msg.share_versions[0] = 1);
        assert!(matches!(
            validate_blob_tx(&blob_tx, &Config::default()),
            Err(Error::BlobShareVersionMismatch(0))
        ));
    }
}
