// File: compressa-engine/src/cost.rs
//! Display-only compute and fee estimates. Linear in buffer sizes, saturating at `u64::MAX`.
use compressa_spec::CompressionConfig;

pub const BASE_COMPUTE_UNITS: u64 = 10_000;
pub const CU_PER_PROOF_BYTE: u64 = 10;
pub const CU_PER_DATA_BYTE: u64 = 1;
pub const CU_PER_COMMITMENT_BYTE: u64 = 5;
pub const CU_PER_LAMPORT: u64 = 100;

pub fn estimate_compute_units(original_size: usize, proof_size: usize, commitment_size: usize) -> u64 {
    BASE_COMPUTE_UNITS
        .saturating_add(CU_PER_PROOF_BYTE.saturating_mul(proof_size as u64))
        .saturating_add(CU_PER_DATA_BYTE.saturating_mul(original_size as u64))
        .saturating_add(CU_PER_COMMITMENT_BYTE.saturating_mul(commitment_size as u64))
}

pub fn estimate_fee(cfg: &CompressionConfig, compressed_size: usize, compute_units: u64) -> u64 {
    cfg.base_fee_lamports
        .saturating_add(cfg.lamports_per_byte.saturating_mul(compressed_size as u64))
        .saturating_add(compute_units / CU_PER_LAMPORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_estimates() {
        // depth 10 proof and a 69 byte commitment over 1 KiB
        let cu = estimate_compute_units(1024, 320, 69);
        assert_eq!(cu, 10_000 + 3_200 + 1_024 + 345);
        let fee = estimate_fee(&CompressionConfig::default(), 389, cu);
        assert_eq!(fee, 5_000 + 3_890 + cu / 100);
    }

    #[test]
    fn huge_fee_params_saturate() {
        let cfg = CompressionConfig { lamports_per_byte: 9_000_000_000_000_000_000, ..CompressionConfig::default() };
        assert_eq!(estimate_fee(&cfg, 389, 14_569), u64::MAX);
        let cfg = CompressionConfig { base_fee_lamports: u64::MAX, ..CompressionConfig::default() };
        assert_eq!(estimate_fee(&cfg, 1, 0), u64::MAX);
        assert_eq!(estimate_compute_units(usize::MAX, usize::MAX, 0), u64::MAX);
    }
}
