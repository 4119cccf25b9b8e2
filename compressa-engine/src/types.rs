// File: compressa-engine/src/types.rs
use compressa_hash::{HashKind, Node, NODE_LEN};
use compressa_merkle::MerkleTree;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::EngineError;

pub const KEY_LEN: usize = 32;
/// root || owner || leaf_index (u32 LE) || depth
pub const COMMITMENT_LEN: usize = NODE_LEN + KEY_LEN + 4 + 1;

/// Owning public key of a compressed account, shown as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountKey(pub [u8; KEY_LEN]);

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountKey({self})")
    }
}

impl FromStr for AccountKey {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = bs58::decode(s).into_vec().map_err(|e| EngineError::InvalidKey(e.to_string()))?;
        let key: [u8; KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| EngineError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", raw.len())))?;
        Ok(AccountKey(key))
    }
}

/// Binding of one account's leaf to a tree root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub root: Node,
    pub owner: AccountKey,
    pub leaf_index: u32,
    pub depth: u8,
}

impl Commitment {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(COMMITMENT_LEN);
        out.extend_from_slice(&self.root);
        out.extend_from_slice(&self.owner.0);
        out.extend_from_slice(&self.leaf_index.to_le_bytes());
        out.push(self.depth);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EngineError> {
        if bytes.len() != COMMITMENT_LEN {
            return Err(EngineError::MalformedCommitment { expected: COMMITMENT_LEN, got: bytes.len() });
        }
        let (root, rest) = bytes.split_at(NODE_LEN);
        let (owner, rest) = rest.split_at(KEY_LEN);
        let (idx, depth) = rest.split_at(4);
        let mut r = [0u8; NODE_LEN];
        r.copy_from_slice(root);
        let mut o = [0u8; KEY_LEN];
        o.copy_from_slice(owner);
        let mut i = [0u8; 4];
        i.copy_from_slice(idx);
        Ok(Self { root: r, owner: AccountKey(o), leaf_index: u32::from_le_bytes(i), depth: depth[0] })
    }
}

/// Stored record of one compressed account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompressedAccount {
    pub owner: AccountKey,
    pub data: Vec<u8>,
    pub proof: Vec<u8>,
    /// Encoded [`Commitment`]
    pub commitment: Vec<u8>,
    pub compressed_size: usize,
    pub original_size: usize,
    pub compression_ratio: f64,
    pub hash: HashKind,
}

impl CompressedAccount {
    pub fn commitment(&self) -> Result<Commitment, EngineError> { Commitment::decode(&self.commitment) }

    /// Re-check the stored proof against the root and leaf index in the commitment.
    pub fn verify(&self) -> Result<bool, EngineError> { self.verify_data(&self.data) }

    /// `data[offset..offset+length]`, clamped to the stored data.
    pub fn slice(&self, offset: usize, length: usize) -> &[u8] { clamp_slice(&self.data, offset, length) }

    /// Same as [`verify`](Self::verify) but for externally supplied bytes.
    pub fn verify_data(&self, data: &[u8]) -> Result<bool, EngineError> {
        let c = self.commitment()?;
        if c.owner != self.owner || self.proof.len() != c.depth as usize * NODE_LEN {
            return Ok(false);
        }
        let hasher = self.hash.hasher();
        Ok(MerkleTree::verify_proof(hasher.as_ref(), data, &self.proof, &c.root, c.leaf_index as usize))
    }
}

/// Engine-level result of a successful compression.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompressionOutcome {
    pub owner: AccountKey,
    pub leaf_index: u32,
    /// Hex-encoded root the account was committed under
    pub root: String,
    pub proof_size: usize,
    pub commitment_size: usize,
    pub compressed_size: usize,
    pub original_size: usize,
    pub compression_ratio: f64,
    pub compute_units: u64,
    pub fee_lamports: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchedSlice {
    pub data: Vec<u8>,
    pub proof_verified: bool,
    pub offset: usize,
    pub requested_length: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineStats {
    pub total_accounts: usize,
    pub total_original_bytes: usize,
    pub total_compressed_bytes: usize,
    pub average_ratio: f64,
    pub tree_leaves: usize,
    pub tree_depth: usize,
    pub root: Option<String>,
    pub persisted_commitments: usize,
    pub hash: HashKind,
}

/// `data[offset..offset+length]`, clamped to the data.
pub(crate) fn clamp_slice(data: &[u8], offset: usize, length: usize) -> &[u8] {
    let start = offset.min(data.len());
    let end = offset.saturating_add(length).min(data.len());
    &data[start..end]
}
