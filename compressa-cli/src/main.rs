// File: compressa-cli/src/main.rs
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use compressa_engine::{AccountKey, CompressedAccount, CompressionClient, CompressionConfig, CompressionEngine};
use compressa_hash::HashKind;
use compressa_spec as spec;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use std::{fs, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name="compressa", version, about="In-memory Merkle account compression demo")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd
}
#[derive(Subcommand)]
enum Cmd {
    /// Compress random accounts, fetch each back and print engine stats
    Demo {
        #[arg(long, default_value_t=16)]
        accounts: usize,
        /// Upper bound on account size in bytes
        #[arg(long, default_value_t=1024)]
        size: usize,
        #[arg(long, default_value_t=42)]
        seed: u64,
        /// Optional params file (toml) to override engine settings
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Compress one account and write its record
    Compress {
        /// Owner public key (base58)
        #[arg(long)]
        key: String,
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        data_hex: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "record.bin")]
        out: PathBuf,
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Re-verify a record's proof against its commitment
    Verify {
        #[arg(long, default_value = "record.bin")]
        record: PathBuf,
        /// Override the hash recorded in the file
        #[arg(long)]
        hash: Option<HashKind>,
    },
    /// Verify a record and print a slice of its data as hex
    Fetch {
        #[arg(long, default_value = "record.bin")]
        record: PathBuf,
        #[arg(long, default_value_t=0)]
        offset: usize,
        /// Defaults to the rest of the data
        #[arg(long)]
        length: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Demo { accounts, size, seed, params } => {
            let cfg = load_config(params.as_ref())?;
            let mut client = CompressionClient::new(cfg)?;
            let mut rng = StdRng::seed_from_u64(seed);
            let mut failed = 0usize;
            for _ in 0..accounts {
                let mut k = [0u8; 32];
                rng.fill_bytes(&mut k);
                let owner = AccountKey(k);
                let mut data = vec![0u8; rng.gen_range(1..=size.max(1))];
                rng.fill_bytes(&mut data);
                let res = client.compress_account(&owner, &data);
                if !res.success {
                    warn!(%owner, error = ?res.error, "compress failed");
                    failed += 1;
                    continue;
                }
                let got = client.fetch_compressed(&owner, None, None);
                if got.data.as_deref() != Some(data.as_slice()) {
                    warn!(%owner, error = ?got.error, "fetch did not return the original data");
                    failed += 1;
                }
            }
            info!(accounts, failed, "demo finished");
            println!("{}", serde_json::to_string_pretty(&client.get_stats())?);
            if failed > 0 { bail!("{failed} of {accounts} accounts failed"); }
        }
        Cmd::Compress { key, data_hex, file, out, params } => {
            let owner: AccountKey = key.parse()?;
            let data = match (data_hex, file) {
                (Some(h), _) => hex::decode(h.trim()).context("decode --data-hex")?,
                (None, Some(p)) => fs::read(&p).with_context(|| format!("read {}", p.display()))?,
                (None, None) => bail!("one of --data-hex or --file is required"),
            };
            let mut engine = CompressionEngine::new(load_config(params.as_ref())?)?;
            let outcome = engine.compress_account(owner, &data)?;
            let record = engine.get(&owner).context("record missing after compress")?;
            let mut f = fs::File::create(&out).with_context(|| format!("create {}", out.display()))?;
            bincode::serialize_into(&mut f, record)?;
            println!("wrote {}", out.display());
            println!("root={} leaf_index={}", outcome.root, outcome.leaf_index);
            println!("ratio={:.4} compute_units={} fee_lamports={}", outcome.compression_ratio, outcome.compute_units, outcome.fee_lamports);
        }
        Cmd::Verify { record, hash } => {
            let mut rec = read_record(&record)?;
            if let Some(h) = hash { rec.hash = h; }
            let ok = rec.verify()?;
            println!("{}", if ok { "valid" } else { "invalid" });
        }
        Cmd::Fetch { record, offset, length } => {
            let rec = read_record(&record)?;
            if !rec.verify()? { bail!("proof in {} does not verify", record.display()); }
            let length = length.unwrap_or_else(|| rec.original_size.saturating_sub(offset));
            println!("{}", hex::encode(rec.slice(offset, length)));
        }
    }
    Ok(())
}

fn load_config(params: Option<&PathBuf>) -> Result<CompressionConfig> {
    match params {
        Some(p) => {
            let txt = fs::read_to_string(p).with_context(|| format!("read params {}", p.display()))?;
            Ok(spec::load_params_toml(&txt)?.resolve()?)
        }
        None => Ok(CompressionConfig::default()),
    }
}

fn read_record(path: &PathBuf) -> Result<CompressedAccount> {
    let f = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    Ok(bincode::deserialize_from(f).context("decode record")?)
}
