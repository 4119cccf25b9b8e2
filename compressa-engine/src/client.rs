// File: compressa-engine/src/client.rs
use serde::{Deserialize, Serialize};

use crate::{AccountKey, CompressedAccount, CompressionConfig, CompressionEngine, CompressionOutcome, EngineStats, Result};

/// Flat result of a compress call. `error` is set whenever `success` is false.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompressionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CompressionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    pub proof_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchResult {
    fn failed(error: String) -> Self { Self { success: false, data: None, proof_verified: false, error: Some(error) } }
}

/// Convenience wrapper over [`CompressionEngine`] that fills in default
/// offsets and lengths and reports every failure as a string.
pub struct CompressionClient {
    engine: CompressionEngine,
}

impl CompressionClient {
    pub fn new(config: CompressionConfig) -> Result<Self> {
        Ok(Self { engine: CompressionEngine::new(config)? })
    }

    pub fn with_defaults() -> Result<Self> { Self::new(CompressionConfig::default()) }

    pub fn engine(&self) -> &CompressionEngine { &self.engine }

    pub fn compress_account(&mut self, owner: &AccountKey, data: &[u8]) -> CompressionResult {
        match self.engine.compress_account(*owner, data) {
            Ok(outcome) => CompressionResult { success: true, outcome: Some(outcome), error: None },
            Err(e) => CompressionResult { success: false, outcome: None, error: Some(e.to_string()) },
        }
    }

    /// `offset` defaults to 0 and `length` to the bytes remaining after it.
    pub fn fetch_compressed(&self, owner: &AccountKey, offset: Option<usize>, length: Option<usize>) -> FetchResult {
        let (offset, length) = self.window(owner, offset, length);
        match self.engine.fetch_compressed(owner, offset, length) {
            Ok(slice) => FetchResult { success: true, data: Some(slice.data), proof_verified: slice.proof_verified, error: None },
            Err(e) => FetchResult::failed(e.to_string()),
        }
    }

    /// Like [`fetch_compressed`](Self::fetch_compressed) with the data served
    /// through the engine's own provider at `uri`.
    pub fn fetch_with_proof(&self, uri: &str, owner: &AccountKey, offset: Option<usize>, length: Option<usize>) -> FetchResult {
        let (offset, length) = self.window(owner, offset, length);
        match self.engine.fetch_with_proof(&self.engine, uri, owner, offset, length) {
            Ok(slice) => FetchResult { success: true, data: Some(slice.data), proof_verified: slice.proof_verified, error: None },
            Err(e) => FetchResult::failed(e.to_string()),
        }
    }

    pub fn get_stats(&self) -> EngineStats { self.engine.stats() }

    pub fn get_compressed_accounts(&self) -> Vec<&CompressedAccount> { self.engine.compressed_accounts() }

    pub fn clear(&mut self) { self.engine.clear() }

    fn window(&self, owner: &AccountKey, offset: Option<usize>, length: Option<usize>) -> (usize, usize) {
        let offset = offset.unwrap_or(0);
        let length = length.unwrap_or_else(|| {
            self.engine.get(owner).map(|r| r.original_size.saturating_sub(offset)).unwrap_or(0)
        });
        (offset, length)
    }
}
