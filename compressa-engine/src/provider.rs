// File: compressa-engine/src/provider.rs
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

use crate::AccountKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no data for {owner} at {uri}")]
    Missing { uri: String, owner: AccountKey },
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Source of full account data living outside the engine.
pub trait DataAvailability {
    fn fetch(&self, uri: &Url, owner: &AccountKey) -> Result<Vec<u8>, ProviderError>;
}

/// Blob map keyed by account. The URI is accepted but not routed on.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProvider {
    blobs: HashMap<AccountKey, Vec<u8>>,
    // Set to simulate an outage
    outage: Option<String>,
}

impl InMemoryProvider {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, owner: AccountKey, data: Vec<u8>) -> Option<Vec<u8>> {
        self.blobs.insert(owner, data)
    }

    pub fn set_outage(&mut self, reason: Option<String>) { self.outage = reason; }

    pub fn len(&self) -> usize { self.blobs.len() }
    pub fn is_empty(&self) -> bool { self.blobs.is_empty() }
}

impl DataAvailability for InMemoryProvider {
    fn fetch(&self, uri: &Url, owner: &AccountKey) -> Result<Vec<u8>, ProviderError> {
        if let Some(reason) = &self.outage {
            return Err(ProviderError::Unavailable(reason.clone()));
        }
        self.blobs
            .get(owner)
            .cloned()
            .ok_or_else(|| ProviderError::Missing { uri: uri.to_string(), owner: *owner })
    }
}
