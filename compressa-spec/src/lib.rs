use compressa_hash::HashKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DEPTH: u32 = 10;
pub const DEFAULT_MAX_ACCOUNTS: u64 = 1024;
pub const DEFAULT_MAX_ACCOUNT_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_BASE_FEE_LAMPORTS: u64 = 5000;
pub const DEFAULT_LAMPORTS_PER_BYTE: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid params toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("depth {0} out of range (1..=32)")]
    Depth(u32),
    #[error("max_accounts {max_accounts} exceeds tree capacity {capacity} at depth {depth}")]
    Capacity { max_accounts: u64, capacity: u64, depth: u32 },
    #[error("max_accounts and max_account_size must be non-zero")]
    Zero,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct FeeParams {
    pub base_fee_lamports: Option<u64>,
    pub lamports_per_byte: Option<u64>,
}

/// Engine parameters as written in a params file. Unset fields take defaults.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct Params {
    /// Merkle tree depth; capacity is 2^depth leaves
    pub depth: Option<u32>,
    /// Maximum number of stored accounts
    pub max_accounts: Option<u64>,
    /// Maximum size in bytes of one account's data
    pub max_account_size: Option<usize>,
    /// Node hash: "shake256" or "toy"
    pub hash: Option<HashKind>,
    #[serde(default)]
    pub fees: FeeParams,
}

/// Validated engine configuration.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub depth: u32,
    pub max_accounts: u64,
    pub max_account_size: usize,
    pub hash: HashKind,
    pub base_fee_lamports: u64,
    pub lamports_per_byte: u64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            max_accounts: DEFAULT_MAX_ACCOUNTS,
            max_account_size: DEFAULT_MAX_ACCOUNT_SIZE,
            hash: HashKind::default(),
            base_fee_lamports: DEFAULT_BASE_FEE_LAMPORTS,
            lamports_per_byte: DEFAULT_LAMPORTS_PER_BYTE,
        }
    }
}

impl CompressionConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.depth == 0 || self.depth > 32 {
            return Err(ConfigError::Depth(self.depth));
        }
        if self.max_accounts == 0 || self.max_account_size == 0 {
            return Err(ConfigError::Zero);
        }
        let capacity = 1u64 << self.depth;
        if self.max_accounts > capacity {
            return Err(ConfigError::Capacity { max_accounts: self.max_accounts, capacity, depth: self.depth });
        }
        Ok(self)
    }
}

impl Params {
    pub fn resolve(&self) -> Result<CompressionConfig, ConfigError> {
        let d = CompressionConfig::default();
        CompressionConfig {
            depth: self.depth.unwrap_or(d.depth),
            max_accounts: self.max_accounts.unwrap_or(d.max_accounts),
            max_account_size: self.max_account_size.unwrap_or(d.max_account_size),
            hash: self.hash.unwrap_or(d.hash),
            base_fee_lamports: self.fees.base_fee_lamports.unwrap_or(d.base_fee_lamports),
            lamports_per_byte: self.fees.lamports_per_byte.unwrap_or(d.lamports_per_byte),
        }
        .validate()
    }
}

/// Parse engine parameters from TOML text
pub fn load_params_toml(input: &str) -> Result<Params, ConfigError> {
    Ok(toml::from_str::<Params>(input)?)
}
