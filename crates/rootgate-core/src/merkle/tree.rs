//! Building sorted-pair Merkle trees and extracting proofs.
//!
//! Used by task issuers to commit a batch of operations and by executors to
//! produce the proof they submit alongside each operation.

use rootgate_store::Hash;

use super::{MerkleError, hash_pair};

/// A fully materialised Merkle tree.
///
/// `levels[0]` holds the leaves in insertion order; the last level holds the
/// root. When a level has an odd number of nodes the trailing node is
/// promoted to the next level unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over `leaves`.
    pub fn from_leaves(leaves: Vec<Hash>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::Empty);
        }

        let mut levels = vec![leaves];
        while levels.last().is_some_and(|level| level.len() > 1) {
            let current = &levels[levels.len() - 1];
            let next: Vec<Hash> = current
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(a, b),
                    // Unpaired trailing node.
                    _ => pair[0],
                })
                .collect();
            levels.push(next);
        }

        Ok(Self { levels })
    }

    pub fn root(&self) -> Hash {
        // `from_leaves` guarantees at least one level with exactly one node
        // at the top.
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Position of `leaf` in insertion order, if present.
    pub fn position(&self, leaf: &Hash) -> Option<usize> {
        self.leaves().iter().position(|l| l == leaf)
    }

    /// Sibling path for the leaf at `index`, bottom-up.
    pub fn proof(&self, index: usize) -> Result<Vec<Hash>, MerkleError> {
        if index >= self.len() {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }

        let mut proof = Vec::with_capacity(self.levels.len());
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = idx ^ 1;
            // A promoted node has no sibling at this level.
            if let Some(node) = level.get(sibling) {
                proof.push(*node);
            }
            idx /= 2;
        }
        Ok(proof)
    }
}
