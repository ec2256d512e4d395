//! JSON file-backed stores.
//!
//! Each document is one pretty-printed JSON file, replaced atomically by
//! writing a sibling temp file and renaming it over the target. The
//! market store additionally accepts the legacy persisted shape (a bare
//! instrument array) on load and rewrites the current shape on the next
//! replace; migration stays at this boundary and never leaks into the
//! trading logic.

use crate::error::StoreResult;
use crate::{AccountMap, AccountStore, MarketStore};
use agora_core::{Instrument, MarketSnapshot};
use agora_market::next_grid_instant;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Atomically replace `path` with `contents`.
fn atomic_write(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_document<T: Serialize>(path: &Path, document: &T) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(document)?;
    atomic_write(path, &json)
}

fn ensure_parent_dir(path: &Path) {
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            warn!(?e, dir = %dir.display(), "Failed to create data directory");
        }
    }
}

/// Either persisted market shape: the current snapshot document or the
/// legacy bare instrument array.
#[derive(Deserialize)]
#[serde(untagged)]
enum MarketDocument {
    Current(MarketSnapshot),
    Legacy(Vec<Instrument>),
}

/// Market snapshot persisted as a single JSON document.
pub struct JsonMarketStore {
    path: PathBuf,
    grid_interval: Duration,
}

impl JsonMarketStore {
    /// `grid_interval` is used to stamp a grid-aligned `next_update_at`
    /// when migrating a legacy document that carries no timestamps.
    pub fn new(path: impl Into<PathBuf>, grid_interval: Duration) -> Self {
        let path = path.into();
        ensure_parent_dir(&path);
        Self {
            path,
            grid_interval,
        }
    }
}

impl MarketStore for JsonMarketStore {
    fn load(&self) -> StoreResult<Option<MarketSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&self.path)?;
        let document: MarketDocument = serde_json::from_slice(&raw)?;

        let snapshot = match document {
            MarketDocument::Current(snapshot) => snapshot,
            MarketDocument::Legacy(instruments) => {
                let now = Utc::now();
                info!(
                    instruments = instruments.len(),
                    "Migrating legacy market document"
                );
                MarketSnapshot::new(instruments, now, next_grid_instant(now, self.grid_interval))
            }
        };
        Ok(Some(snapshot))
    }

    fn replace(&self, snapshot: &MarketSnapshot) -> StoreResult<()> {
        write_document(&self.path, snapshot)
    }
}

/// Identity→account map persisted as a single JSON document.
pub struct JsonAccountStore {
    path: PathBuf,
}

impl JsonAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        ensure_parent_dir(&path);
        Self { path }
    }
}

impl AccountStore for JsonAccountStore {
    fn load(&self) -> StoreResult<AccountMap> {
        if !self.path.exists() {
            return Ok(AccountMap::new());
        }
        let raw = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn replace(&self, accounts: &AccountMap) -> StoreResult<()> {
        write_document(&self.path, accounts)
    }
}
