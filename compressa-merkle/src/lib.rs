// File: compressa-merkle/src/lib.rs
use compressa_hash::{HashKind, Node, NodeHasher, NODE_LEN};
use rayon::prelude::*;
use thiserror::Error;

pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("tree depth {0} out of range (1..=32)")]
    InvalidDepth(usize),
    #[error("tree is full: depth {depth} holds at most {capacity} leaves")]
    TreeFull { depth: usize, capacity: u64 },
    #[error("cannot build a tree with no leaves")]
    EmptyTree,
    #[error("tree has not been built since the last leaf was added")]
    NotBuilt,
    #[error("leaf index {index} out of range ({len} leaves)")]
    LeafOutOfRange { index: usize, len: usize },
}

/// Binary hash tree built level by level over appended leaves.
///
/// `levels[0]` holds the leaf hashes, `levels[k]` holds `ceil(len(levels[k-1]) / 2)`
/// nodes and `levels[depth]` holds the root. An odd trailing node is paired with
/// itself.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    depth: usize,
    kind: HashKind,
    levels: Vec<Vec<Node>>,
    built_len: Option<usize>,
}

impl MerkleTree {
    pub fn new(depth: usize, kind: HashKind) -> Result<Self, MerkleError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(MerkleError::InvalidDepth(depth));
        }
        Ok(Self { depth, kind, levels: vec![Vec::new()], built_len: None })
    }

    pub fn depth(&self) -> usize { self.depth }
    pub fn hash_kind(&self) -> HashKind { self.kind }
    pub fn capacity(&self) -> u64 { 1u64 << self.depth }
    pub fn len(&self) -> usize { self.levels[0].len() }
    pub fn is_empty(&self) -> bool { self.levels[0].is_empty() }
    pub fn leaf_hash(&self, idx: usize) -> Option<Node> { self.levels[0].get(idx).copied() }

    /// Root of the last build, if the tree is up to date.
    pub fn root(&self) -> Option<Node> {
        if self.built_len == Some(self.len()) {
            self.levels.get(self.depth).and_then(|l| l.first()).copied()
        } else {
            None
        }
    }

    pub fn add_leaf(&mut self, data: &[u8]) -> Result<usize, MerkleError> {
        if self.len() as u64 >= self.capacity() {
            return Err(MerkleError::TreeFull { depth: self.depth, capacity: self.capacity() });
        }
        let h = self.kind.hasher().leaf(data);
        self.levels[0].push(h);
        Ok(self.len() - 1)
    }

    /// Recomputes every level above the leaves and returns the root.
    pub fn build_tree(&mut self) -> Result<Node, MerkleError> {
        if self.levels[0].is_empty() {
            return Err(MerkleError::EmptyTree);
        }
        let hasher = self.kind.hasher();
        self.levels.truncate(1);
        for level in 0..self.depth {
            let next: Vec<Node> = self.levels[level]
                .par_chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    hasher.node(left, right)
                })
                .collect();
            self.levels.push(next);
        }
        self.built_len = Some(self.len());
        Ok(self.levels[self.depth][0])
    }

    /// Sibling path for `leaf_index`, `depth` nodes concatenated bottom-up.
    pub fn generate_proof(&self, leaf_index: usize) -> Result<Vec<u8>, MerkleError> {
        if self.built_len != Some(self.len()) {
            return Err(MerkleError::NotBuilt);
        }
        if leaf_index >= self.len() {
            return Err(MerkleError::LeafOutOfRange { index: leaf_index, len: self.len() });
        }
        let mut proof = Vec::with_capacity(self.depth * NODE_LEN);
        let mut idx = leaf_index;
        for level in &self.levels[..self.depth] {
            // Missing sibling means the node was paired with itself
            let sib = level.get(idx ^ 1).unwrap_or(&level[idx]);
            proof.extend_from_slice(sib);
            idx >>= 1;
        }
        Ok(proof)
    }

    pub fn verify(&self, leaf: &[u8], proof: &[u8], root: &[u8], leaf_index: usize) -> bool {
        Self::verify_proof(self.kind.hasher().as_ref(), leaf, proof, root, leaf_index)
    }

    pub fn verify_proof(hasher: &dyn NodeHasher, leaf: &[u8], proof: &[u8], root: &[u8], leaf_index: usize) -> bool {
        if proof.is_empty() || proof.len() % NODE_LEN != 0 {
            return false;
        }
        let mut idx = leaf_index;
        let mut h = hasher.leaf(leaf);
        for sib in proof.chunks_exact(NODE_LEN) {
            h = if idx % 2 == 0 { hasher.node(&h, sib) } else { hasher.node(sib, &h) };
            idx >>= 1;
        }
        h.as_slice() == root
    }

    pub fn reset(&mut self) {
        self.levels = vec![Vec::new()];
        self.built_len = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compressa_hash::Shake256Hasher;

    fn tree_with(n: u8, depth: usize, kind: HashKind) -> MerkleTree {
        let mut mt = MerkleTree::new(depth, kind).unwrap();
        for i in 0..n {
            mt.add_leaf(&[i; 40]).unwrap();
        }
        mt
    }

    #[test]
    fn single_leaf_proof_verifies() {
        let mut mt = tree_with(1, 10, HashKind::Shake256);
        let root = mt.build_tree().unwrap();
        let proof = mt.generate_proof(0).unwrap();
        assert_eq!(proof.len(), 10 * NODE_LEN);
        assert!(mt.verify(&[0; 40], &proof, &root, 0));
    }

    #[test]
    fn inclusion_first_middle_last_non_power_of_two() {
        let mut mt = tree_with(5, 4, HashKind::Shake256);
        let root = mt.build_tree().unwrap();
        for i in 0..5u8 {
            let proof = mt.generate_proof(i as usize).unwrap();
            assert!(MerkleTree::verify_proof(&Shake256Hasher, &[i; 40], &proof, &root, i as usize));
        }
        // Level sizes follow ceil(n/2)
        let sizes: Vec<usize> = mt.levels.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 3, 2, 1, 1]);
    }

    #[test]
    fn rejects_tampered_leaf_proof_or_index() {
        let mut mt = tree_with(4, 3, HashKind::Shake256);
        let root = mt.build_tree().unwrap();
        let mut proof = mt.generate_proof(2).unwrap();
        assert!(!mt.verify(&[9; 40], &proof, &root, 2));
        assert!(!mt.verify(&[2; 40], &proof, &root, 3));
        proof[0] ^= 1;
        assert!(!mt.verify(&[2; 40], &proof, &root, 2));
        // Every single byte of the proof matters
        let proof = mt.generate_proof(2).unwrap();
        for i in 0..proof.len() {
            let mut p = proof.clone();
            p[i] ^= 0x80;
            assert!(!mt.verify(&[2; 40], &p, &root, 2), "byte {i} tamper accepted");
        }
        // And every single byte of the leaf
        let leaf = [2u8; 40];
        for i in 0..leaf.len() {
            let mut l = leaf;
            l[i] ^= 0x01;
            assert!(!mt.verify(&l, &proof, &root, 2), "leaf byte {i} tamper accepted");
        }
    }

    #[test]
    fn leaf_hashes_are_stored_not_data() {
        let mut mt = tree_with(3, 2, HashKind::Shake256);
        assert_eq!(mt.leaf_hash(1), Some(Shake256Hasher.leaf(&[1; 40])));
        assert_eq!(mt.leaf_hash(3), None);
        let root = mt.build_tree().unwrap();
        // Level 0 is exactly the leaf hashes
        assert_eq!(mt.levels[0].len(), mt.len());
        let proof = mt.generate_proof(1).unwrap();
        assert_eq!(&proof[..NODE_LEN], &mt.leaf_hash(0).unwrap());
        assert!(mt.verify(&[1; 40], &proof, &root, 1));
    }

    #[test]
    fn malformed_proof_length_is_rejected() {
        let mut mt = tree_with(2, 2, HashKind::Shake256);
        let root = mt.build_tree().unwrap();
        let proof = mt.generate_proof(0).unwrap();
        assert!(!mt.verify(&[0; 40], &proof[..NODE_LEN + 1], &root, 0));
        assert!(!mt.verify(&[0; 40], &[], &root, 0));
    }

    #[test]
    fn toy_hash_collision_passes_verification() {
        // Two 8-byte accounts with the same 32-bit toy state
        let a = [0x1b, 0xf0, 0x27, 0x6d, 0xc8, 0x87, 0x57, 0xf9];
        let b = [0xc3, 0xcd, 0xb1, 0x37, 0x74, 0xd6, 0x09, 0x61];
        assert_eq!(compressa_hash::toy_hash(&a), compressa_hash::toy_hash(&b));

        let mut mt = MerkleTree::new(2, HashKind::Toy).unwrap();
        mt.add_leaf(&a).unwrap();
        mt.add_leaf(&[7; 8]).unwrap();
        let root = mt.build_tree().unwrap();
        let proof = mt.generate_proof(0).unwrap();
        assert!(mt.verify(&a, &proof, &root, 0));
        // Forged leaf is accepted under the toy hash but not under SHAKE256
        assert!(mt.verify(&b, &proof, &root, 0));

        let mut real = MerkleTree::new(2, HashKind::Shake256).unwrap();
        real.add_leaf(&a).unwrap();
        real.add_leaf(&[7; 8]).unwrap();
        let root = real.build_tree().unwrap();
        let proof = real.generate_proof(0).unwrap();
        assert!(!real.verify(&b, &proof, &root, 0));
    }

    #[test]
    fn rebuild_after_more_leaves_resets_levels() {
        let mut mt = tree_with(3, 3, HashKind::Shake256);
        let r1 = mt.build_tree().unwrap();
        assert_eq!(mt.build_tree().unwrap(), r1);
        assert_eq!(mt.levels.len(), 4);
        let old_proof = mt.generate_proof(0).unwrap();
        mt.add_leaf(&[3; 40]).unwrap();
        assert_eq!(mt.generate_proof(0), Err(MerkleError::NotBuilt));
        assert!(mt.root().is_none());
        let r2 = mt.build_tree().unwrap();
        assert_ne!(r1, r2);
        let fresh_root = tree_with(4, 3, HashKind::Shake256).build_tree().unwrap();
        assert_eq!(r2, fresh_root);
        let proof = mt.generate_proof(3).unwrap();
        assert!(mt.verify(&[3; 40], &proof, &r2, 3));
        // Earlier proofs keep verifying against the root they were taken from
        assert!(mt.verify(&[0; 40], &old_proof, &r1, 0));
        assert!(!mt.verify(&[0; 40], &old_proof, &r2, 0));
    }

    #[test]
    fn capacity_and_range_errors() {
        let mut mt = tree_with(4, 2, HashKind::Toy);
        assert_eq!(mt.add_leaf(b"x"), Err(MerkleError::TreeFull { depth: 2, capacity: 4 }));
        mt.build_tree().unwrap();
        assert_eq!(mt.generate_proof(4), Err(MerkleError::LeafOutOfRange { index: 4, len: 4 }));
        assert_eq!(MerkleTree::new(0, HashKind::Toy).unwrap_err(), MerkleError::InvalidDepth(0));
        assert_eq!(MerkleTree::new(33, HashKind::Toy).unwrap_err(), MerkleError::InvalidDepth(33));
    }

    #[test]
    fn empty_tree_and_reset() {
        let mut mt = MerkleTree::new(3, HashKind::Shake256).unwrap();
        assert_eq!(mt.build_tree(), Err(MerkleError::EmptyTree));
        mt.add_leaf(b"a").unwrap();
        mt.build_tree().unwrap();
        mt.reset();
        assert!(mt.is_empty());
        assert!(mt.root().is_none());
        assert_eq!(mt.add_leaf(b"b").unwrap(), 0);
    }
}
