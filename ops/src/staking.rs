//! # Deposit-Batch Loader
//!
//! Replays a batch of deposits into a vault, at most once per
//! `(chain id, record id)`. Progress is kept in a sled-backed
//! [`ProcessedLog`], so a rerun of the same batch after a crash or on
//! purpose only submits what has not gone through yet.
//!
//! ## Tree Layout
//!
//! | Tree        | Key                                   | Value                    |
//! |-------------|---------------------------------------|--------------------------|
//! | `processed` | `chain_id` (8B BE) ‖ `record_id` (8B BE) | `bincode(ProcessedEntry)` |
//!
//! Big-endian keys keep all records of one chain contiguous and ordered.

use std::path::Path;

use chrono::Utc;
use credbull_sdk::chain::VaultChain;
use credbull_sdk::report::scale_whole;
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use tracing::{debug, info, warn};

use crate::error::OpsResult;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by the processed log.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("failed to read batch file: {0}")]
    Batch(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One deposit of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub id: u64,
    /// Whole asset units.
    pub amount: u64,
    pub receiver: Address,
}

/// Reads a JSON array of [`DepositRecord`]s.
pub fn read_batch(path: &Path) -> LedgerResult<Vec<DepositRecord>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| LedgerError::Batch(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&source)
        .map_err(|e| LedgerError::Batch(format!("{}: {e}", path.display())))
}

/// What is remembered about a processed record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedEntry {
    /// Hex of the deposit transaction hash, without `0x`.
    pub tx_hash: String,
    /// Unix seconds.
    pub processed_at: i64,
}

// ---------------------------------------------------------------------------
// ProcessedLog
// ---------------------------------------------------------------------------

/// Persistent set of processed `(chain id, record id)` pairs.
#[derive(Debug, Clone)]
pub struct ProcessedLog {
    db: Db,
    processed: Tree,
}

fn key(chain_id: u64, record_id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&chain_id.to_be_bytes());
    key[8..].copy_from_slice(&record_id.to_be_bytes());
    key
}

impl ProcessedLog {
    /// Opens or creates the log at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// A log that disappears when dropped.
    pub fn open_temporary() -> LedgerResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> LedgerResult<Self> {
        let processed = db.open_tree("processed")?;
        Ok(Self { db, processed })
    }

    pub fn contains(&self, chain_id: u64, record_id: u64) -> LedgerResult<bool> {
        Ok(self.processed.contains_key(key(chain_id, record_id))?)
    }

    pub fn get(&self, chain_id: u64, record_id: u64) -> LedgerResult<Option<ProcessedEntry>> {
        self.processed
            .get(key(chain_id, record_id))?
            .map(|bytes| {
                bincode::deserialize(&bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
            })
            .transpose()
    }

    /// Records a processed deposit and flushes it to disk.
    pub fn mark(&self, chain_id: u64, record_id: u64, tx_hash: H256) -> LedgerResult<()> {
        let entry = ProcessedEntry {
            tx_hash: hex::encode(tx_hash.as_bytes()),
            processed_at: Utc::now().timestamp(),
        };
        let bytes = bincode::serialize(&entry)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        self.processed.insert(key(chain_id, record_id), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    /// Number of processed records on `chain_id`.
    pub fn count(&self, chain_id: u64) -> usize {
        self.processed.scan_prefix(chain_id.to_be_bytes()).count()
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Tally of one loader run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Deposits every unprocessed record into `vault`, signing with `chain`.
///
/// A record that fails is counted and left unmarked so the next run retries
/// it; the remaining records still go through. Failing to read the vault's
/// asset or to write the log ends the run.
pub async fn load_deposits<C: VaultChain + ?Sized>(
    chain: &C,
    vault: Address,
    records: &[DepositRecord],
    log: &ProcessedLog,
) -> OpsResult<LoadReport> {
    let chain_id = chain.chain_id();
    let asset = chain.vault_asset(vault).await?;
    let decimals = chain.token_info(asset).await?.decimals;

    let mut report = LoadReport::default();
    for record in records {
        if log.contains(chain_id, record.id)? {
            debug!(id = record.id, "already processed");
            report.skipped += 1;
            continue;
        }

        let Some(assets) = scale_whole(U256::from(record.amount), decimals) else {
            warn!(
                id = record.id,
                amount = record.amount,
                decimals,
                "amount overflows the asset's raw units"
            );
            report.failed += 1;
            continue;
        };
        let result = match chain.approve(asset, vault, assets).await {
            Ok(_) => chain.deposit(vault, assets, record.receiver).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(tx) => {
                log.mark(chain_id, record.id, tx)?;
                report.succeeded += 1;
            }
            Err(e) => {
                warn!(id = record.id, receiver = ?record.receiver, error = %e, "deposit failed");
                report.failed += 1;
            }
        }
    }

    info!(
        chain_id,
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failed,
        "deposit batch loaded"
    );
    Ok(report)
}
