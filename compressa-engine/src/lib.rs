// File: compressa-engine/src/lib.rs
//! Merkle-backed account compression.
//!
//! Each compressed account becomes a leaf of one shared tree. The engine keeps
//! the full data in memory next to the proof and commitment it was issued, and
//! re-verifies that proof on every fetch.

mod types;
mod provider;
pub mod cost;
pub mod client;

pub use types::{AccountKey, Commitment, CompressedAccount, CompressionOutcome, EngineStats, FetchedSlice, COMMITMENT_LEN, KEY_LEN};
pub use provider::{DataAvailability, InMemoryProvider, ProviderError};
pub use client::{CompressionClient, CompressionResult, FetchResult};
pub use compressa_spec::CompressionConfig;

use compressa_hash::{Node, NODE_LEN};
use compressa_merkle::{MerkleError, MerkleTree};
use compressa_spec::ConfigError;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("account data is empty")]
    EmptyData,
    #[error("account data is {size} bytes, limit is {max}")]
    AccountTooLarge { size: usize, max: usize },
    #[error("engine already holds the maximum of {0} accounts")]
    CapacityReached(u64),
    #[error("compressed account {0} not found")]
    NotFound(AccountKey),
    #[error("invalid proof for account {0}")]
    InvalidProof(AccountKey),
    #[error("provider data for {0} does not match its commitment")]
    DataMismatch(AccountKey),
    #[error("malformed commitment: expected {expected} bytes, got {got}")]
    MalformedCommitment { expected: usize, got: usize },
    #[error("invalid account key: {0}")]
    InvalidKey(String),
    #[error("invalid data-availability uri `{uri}`: {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("data-availability provider: {0}")]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub struct CompressionEngine {
    config: CompressionConfig,
    tree: MerkleTree,
    accounts: HashMap<AccountKey, CompressedAccount>,
    // Roots handed out as commitments, oldest first
    ledger: Vec<Node>,
}

impl CompressionEngine {
    pub fn new(config: CompressionConfig) -> Result<Self> {
        let config = config.validate()?;
        let tree = MerkleTree::new(config.depth as usize, config.hash)?;
        Ok(Self { config, tree, accounts: HashMap::new(), ledger: Vec::new() })
    }

    pub fn config(&self) -> &CompressionConfig { &self.config }

    /// Insert `data` as a new leaf, rebuild, and store the proof and commitment.
    ///
    /// Compressing a key again replaces its record; the old leaf stays in the tree.
    /// Once the tree is full every further compress is `CapacityReached`.
    pub fn compress_account(&mut self, owner: AccountKey, data: &[u8]) -> Result<CompressionOutcome> {
        if data.is_empty() {
            return Err(EngineError::EmptyData);
        }
        if data.len() > self.config.max_account_size {
            return Err(EngineError::AccountTooLarge { size: data.len(), max: self.config.max_account_size });
        }
        if !self.accounts.contains_key(&owner) && self.accounts.len() as u64 >= self.config.max_accounts {
            return Err(EngineError::CapacityReached(self.config.max_accounts));
        }

        let leaf_index = match self.tree.add_leaf(data) {
            Err(MerkleError::TreeFull { capacity, .. }) => {
                warn!(%owner, capacity, "tree full");
                return Err(EngineError::CapacityReached(self.config.max_accounts));
            }
            r => r?,
        };
        debug!(%owner, leaf_index, size = data.len(), "leaf inserted");
        let root = self.tree.build_tree()?;
        let proof = self.tree.generate_proof(leaf_index)?;

        let commitment = Commitment {
            root,
            owner,
            // Tree capacity is at most 2^32 leaves
            leaf_index: leaf_index as u32,
            depth: self.tree.depth() as u8,
        };
        let encoded = commitment.encode();

        let original_size = data.len();
        let compressed_size = proof.len() + encoded.len();
        let compression_ratio = original_size as f64 / compressed_size as f64;
        let compute_units = cost::estimate_compute_units(original_size, proof.len(), encoded.len());
        let fee_lamports = cost::estimate_fee(&self.config, compressed_size, compute_units);

        let outcome = CompressionOutcome {
            owner,
            leaf_index: commitment.leaf_index,
            root: hex::encode(root),
            proof_size: proof.len(),
            commitment_size: encoded.len(),
            compressed_size,
            original_size,
            compression_ratio,
            compute_units,
            fee_lamports,
        };
        self.accounts.insert(
            owner,
            CompressedAccount {
                owner,
                data: data.to_vec(),
                proof,
                commitment: encoded,
                compressed_size,
                original_size,
                compression_ratio,
                hash: self.config.hash,
            },
        );
        self.persist_commitment(&commitment);
        info!(%owner, leaf_index, ratio = compression_ratio, "account compressed");
        Ok(outcome)
    }

    // Stand-in for writing the root on chain
    fn persist_commitment(&mut self, commitment: &Commitment) {
        self.ledger.push(commitment.root);
        debug!(root = %hex::encode(commitment.root), entries = self.ledger.len(), "commitment persisted");
    }

    /// Verified slice of a stored account. The end is clamped to the data, so the
    /// returned length can be shorter than `length`.
    pub fn fetch_compressed(&self, owner: &AccountKey, offset: usize, length: usize) -> Result<FetchedSlice> {
        let record = self.accounts.get(owner).ok_or(EngineError::NotFound(*owner))?;
        if !record.verify()? {
            warn!(%owner, "stored proof failed verification");
            return Err(EngineError::InvalidProof(*owner));
        }
        Ok(FetchedSlice {
            data: record.slice(offset, length).to_vec(),
            proof_verified: true,
            offset,
            requested_length: length,
        })
    }

    /// Fetch the account body from `provider` and check it against the stored
    /// commitment's root before slicing.
    pub fn fetch_with_proof(
        &self,
        provider: &dyn DataAvailability,
        uri: &str,
        owner: &AccountKey,
        offset: usize,
        length: usize,
    ) -> Result<FetchedSlice> {
        let url = Url::parse(uri).map_err(|e| EngineError::InvalidUri { uri: uri.to_string(), reason: e.to_string() })?;
        let record = self.accounts.get(owner).ok_or(EngineError::NotFound(*owner))?;
        let commitment = record.commitment()?;
        let blob = provider.fetch(&url, owner)?;
        if !record.verify_data(&blob)? {
            warn!(%owner, %url, root = %hex::encode(&record.commitment[..NODE_LEN]), "provider data does not match commitment");
            return Err(EngineError::DataMismatch(*owner));
        }
        debug!(%owner, %url, leaf_index = commitment.leaf_index, "provider data verified");
        Ok(FetchedSlice {
            data: types::clamp_slice(&blob, offset, length).to_vec(),
            proof_verified: true,
            offset,
            requested_length: length,
        })
    }

    pub fn get(&self, owner: &AccountKey) -> Option<&CompressedAccount> { self.accounts.get(owner) }

    /// All records, ordered by leaf index.
    pub fn compressed_accounts(&self) -> Vec<&CompressedAccount> {
        let mut out: Vec<&CompressedAccount> = self.accounts.values().collect();
        out.sort_by_key(|r| r.commitment().map(|c| c.leaf_index).unwrap_or(u32::MAX));
        out
    }

    pub fn stats(&self) -> EngineStats {
        let total_accounts = self.accounts.len();
        let total_original_bytes = self.accounts.values().map(|r| r.original_size).sum();
        let total_compressed_bytes = self.accounts.values().map(|r| r.compressed_size).sum();
        let average_ratio = if total_accounts == 0 {
            0.0
        } else {
            self.accounts.values().map(|r| r.compression_ratio).sum::<f64>() / total_accounts as f64
        };
        EngineStats {
            total_accounts,
            total_original_bytes,
            total_compressed_bytes,
            average_ratio,
            tree_leaves: self.tree.len(),
            tree_depth: self.tree.depth(),
            root: self.tree.root().map(hex::encode),
            persisted_commitments: self.ledger.len(),
            hash: self.config.hash,
        }
    }

    pub fn clear(&mut self) {
        let dropped = self.accounts.len();
        self.accounts.clear();
        self.ledger.clear();
        self.tree.reset();
        info!(dropped, "engine cleared");
    }
}

/// The engine serves its own stored data, as a local provider would.
impl DataAvailability for CompressionEngine {
    fn fetch(&self, uri: &Url, owner: &AccountKey) -> std::result::Result<Vec<u8>, ProviderError> {
        self.accounts
            .get(owner)
            .map(|r| r.data.clone())
            .ok_or_else(|| ProviderError::Missing { uri: uri.to_string(), owner: *owner })
    }
}
