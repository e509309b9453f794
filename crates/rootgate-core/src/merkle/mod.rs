//! Merkle inclusion proofs with sorted-pair hashing.
//!
//! Each internal node is `SHA-256(min(a, b) || max(a, b))`, so a proof is
//! just the list of sibling hashes from leaf to root; no left/right flags
//! are needed.

pub mod tree;

use sha2::{Digest, Sha256};

use rootgate_store::Hash;

pub use tree::MerkleTree;

/// Errors from tree construction and proof lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    #[error("cannot build a Merkle tree with no leaves")]
    Empty,

    #[error("leaf index {index} out of range for a tree of {len} leaves")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Hash two child nodes, smaller first.
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());
    Hash(hasher.finalize().into())
}

/// Fold `proof` over `leaf`, returning the implied root.
pub fn process_proof(leaf: Hash, proof: &[Hash]) -> Hash {
    proof
        .iter()
        .fold(leaf, |node, sibling| hash_pair(&node, sibling))
}

/// Check that `leaf` is included under `root` via `proof`.
///
/// A single-leaf tree uses an empty proof and `leaf == root`.
pub fn verify(proof: &[Hash], root: &Hash, leaf: &Hash) -> bool {
    process_proof(*leaf, proof) == *root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u8) -> Hash {
        Hash([n; 32])
    }

    #[test]
    fn hash_pair_is_commutative() {
        assert_eq!(hash_pair(&h(1), &h(2)), hash_pair(&h(2), &h(1)));
    }

    #[test]
    fn hash_pair_matches_manual_digest() {
        let mut hasher = Sha256::new();
        hasher.update([1u8; 32]);
        hasher.update([2u8; 32]);
        let expected = Hash(hasher.finalize().into());
        assert_eq!(hash_pair(&h(2), &h(1)), expected);
    }

    #[test]
    fn empty_proof_means_leaf_is_root() {
        assert!(verify(&[], &h(7), &h(7)));
        assert!(!verify(&[], &h(7), &h(8)));
    }

    #[test]
    fn two_leaf_proof() {
        let root = hash_pair(&h(1), &h(2));
        assert!(verify(&[h(2)], &root, &h(1)));
        assert!(verify(&[h(1)], &root, &h(2)));
        assert!(!verify(&[h(3)], &root, &h(1)));
    }

    #[test]
    fn proof_order_matters() {
        let root = hash_pair(&hash_pair(&h(1), &h(2)), &h(3));
        assert!(verify(&[h(2), h(3)], &root, &h(1)));
        assert!(!verify(&[h(3), h(2)], &root, &h(1)));
    }
}
