//! # Storage Module - Ledger Persistence
//!
//! The whole bot state is one [`Ledger`] serialized as JSON at
//! `<data_dir>/<db_file>` (default `data/db.json`). It is read once when the
//! [`Store`] is opened and rewritten in full after every mutation.
//!
//! ## Write path
//!
//! Saves go through [`Store::save`], which:
//!
//! 1. serializes the ledger with `serde_json`,
//! 2. takes an exclusive `fs2` lock on the destination,
//! 3. writes a temp file next to it and fsyncs it,
//! 4. renames the temp file over the destination.
//!
//! A crash mid-write therefore leaves either the old or the new ledger on disk,
//! never a truncated one.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use macaronbot::storage::Store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut store = Store::open("./data", "db.json").await?;
//!     store.ledger_mut().register_user(42);
//!     store.save().await?;
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Result};
use fs2::FileExt;
use log::{debug, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::macaron::ledger::Ledger;

/// Refuse to parse ledgers larger than this.
const MAX_DB_BYTES: usize = 16 * 1024 * 1024;

/// Explicitly owned persistent store for the ledger.
pub struct Store {
    data_dir: PathBuf,
    db_path: PathBuf,
    ledger: Ledger,
}

impl Store {
    /// Open (or create) the store under `data_dir`, loading `db_file` if present.
    pub async fn open(data_dir: impl AsRef<Path>, db_file: &str) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| anyhow!("Failed to create data directory {}: {}", data_dir.display(), e))?;
        let db_path = data_dir.join(db_file);
        let ledger = Self::load(&db_path).await?;
        info!(
            "Loaded ledger from {} ({} users, {} boxes, {} pending requests)",
            db_path.display(),
            ledger.users.len(),
            ledger.boxes.len(),
            ledger.requests.len()
        );
        Ok(Store {
            data_dir,
            db_path,
            ledger,
        })
    }

    async fn load(path: &Path) -> Result<Ledger> {
        match fs::read_to_string(path).await {
            Ok(data) => {
                if data.len() > MAX_DB_BYTES {
                    return Err(anyhow!(
                        "{} is {} bytes, larger than the {} byte limit",
                        path.display(),
                        data.len(),
                        MAX_DB_BYTES
                    ));
                }
                // Guard against any accidental leading NULs
                let cleaned = data.trim_start_matches('\0');
                if cleaned.trim().is_empty() {
                    return Ok(Ledger::default());
                }
                serde_json::from_str(cleaned)
                    .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Ledger::default()),
            Err(e) => Err(anyhow!("Failed reading {}: {}", path.display(), e)),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Pretty JSON dump of the current ledger.
    pub fn dump(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.ledger).map_err(|e| anyhow!("Failed to serialize ledger: {}", e))
    }

    /// Rewrite the whole ledger to disk.
    pub async fn save(&self) -> Result<()> {
        let content = serde_json::to_string(&self.ledger)
            .map_err(|e| anyhow!("Failed to serialize ledger: {}", e))?;
        Self::write_file_locked(&self.db_path, &content).await?;
        debug!("Saved ledger to {} ({} bytes)", self.db_path.display(), content.len());
        Ok(())
    }

    /// Lock, write to a temp file, then atomically rename over `path`.
    async fn write_file_locked(path: &Path, content: &str) -> Result<()> {
        use std::fs::{File, OpenOptions};
        use std::io::Write;

        // fs2 locks are blocking; the file is small and writes are rare
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        lock_file.lock_exclusive()?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("db.json");
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    tmp.write_all(content.as_bytes())?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    break candidate;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                    continue;
                }
                Err(e) => return Err(anyhow!("Failed to create temp file for atomic write: {}", e)),
            }
        };

        std::fs::rename(&tmp_path, path)?;
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }
        drop(lock_file);
        Ok(())
    }
}
