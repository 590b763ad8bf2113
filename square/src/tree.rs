use crate::Error;
use tessera_merkle::nmt::{Hasher, Node, Tree};
use tessera_shares::{constants::NAMESPACE_SIZE, Namespace};

/// Build the namespaced Merkle tree of an extended row.
///
/// The first half of `extended` holds original shares, whose leaves are prefixed with their own
/// namespace. Parity shares are prefixed with the parity namespace.
pub fn row_tree(extended: &[Vec<u8>]) -> Result<Tree<NAMESPACE_SIZE>, Error> {
    let width = extended.len() / 2;
    let mut tree = Tree::with_capacity(Hasher::default(), extended.len());
    let mut leaf = Vec::new();
    for (column, share) in extended.iter().enumerate() {
        leaf.clear();
        if column < width {
            let namespace = share
                .get(..NAMESPACE_SIZE)
                .ok_or(tessera_shares::Error::InvalidShareSize(share.len()))?;
            leaf.extend_from_slice(namespace);
        } else {
            leaf.extend_from_slice(&Namespace::PARITY_SHARES.to_bytes());
        }
        leaf.extend_from_slice(share);
        tree.push(&leaf)?;
    }
    Ok(tree)
}

/// Root of the namespaced Merkle tree of an extended row.
pub fn row_root(extended: &[Vec<u8>]) -> Result<Node<NAMESPACE_SIZE>, Error> {
    Ok(row_tree(extended)?.root()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extend_row, ReedSolomon};
    use tessera_shares::Share;

    #[test]
    fn test_row_root_ignores_parity_namespace() {
        let namespace = Namespace::new_v0(&[5; 10]).unwrap();
        let row = vec![Share::namespace_padding(namespace); 4];
        let extended = extend_row(&row, &ReedSolomon).unwrap();
        let root = row_root(&extended).unwrap();
        assert_eq!(root.min, namespace.to_bytes());
        assert_eq!(root.max, namespace.to_bytes());
    }

    #[test]
    fn test_row_tree_proves_original_columns() {
        let row: Vec<Share> = (1..=4)
            .map(|i| Share::namespace_padding(Namespace::new_v0(&[i; 10]).unwrap()))
            .collect();
        let extended = extend_row(&row, &ReedSolomon).unwrap();
        let tree = row_tree(&extended).unwrap();
        assert_eq!(tree.len(), 8);

        let proof = tree.prove_range(1, 3).unwrap();
        let leaves: Vec<Vec<u8>> = row[1..3]
            .iter()
            .map(|share| {
                let mut leaf = share.namespace().to_bytes().to_vec();
                leaf.extend_from_slice(share.as_bytes());
                leaf
            })
            .collect();
        let root = tree.root().unwrap();
        assert!(proof
            .verify_inclusion(&Hasher::default(), &root, &leaves)
            .is_ok());
    }

    #[test]
    fn test_row_tree_rejects_unordered_row() {
        let row = vec![
            Share::namespace_padding(Namespace::new_v0(&[2; 10]).unwrap()),
            Share::namespace_padding(Namespace::new_v0(&[1; 10]).unwrap()),
        ];
        let extended = extend_row(&row, &ReedSolomon).unwrap();
        assert!(matches!(row_tree(&extended), Err(Error::Tree(_))));
    }
}
