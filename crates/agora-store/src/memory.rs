//! In-memory stores for tests.
//!
//! Behave like the file stores minus the filesystem, plus a one-shot
//! failure injection hook so callers can exercise their abort paths.

use crate::error::{StoreError, StoreResult};
use crate::{AccountMap, AccountStore, MarketStore};
use agora_core::MarketSnapshot;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

fn injected_failure() -> StoreError {
    StoreError::Io(std::io::Error::other("injected store failure"))
}

/// In-memory market snapshot store.
#[derive(Default)]
pub struct MemoryMarketStore {
    snapshot: RwLock<Option<MarketSnapshot>>,
    fail_next_replace: AtomicBool,
}

impl MemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `replace` fail once.
    pub fn fail_next_replace(&self) {
        self.fail_next_replace.store(true, Ordering::SeqCst);
    }
}

impl MarketStore for MemoryMarketStore {
    fn load(&self) -> StoreResult<Option<MarketSnapshot>> {
        Ok(self.snapshot.read().clone())
    }

    fn replace(&self, snapshot: &MarketSnapshot) -> StoreResult<()> {
        if self.fail_next_replace.swap(false, Ordering::SeqCst) {
            return Err(injected_failure());
        }
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(())
    }
}

/// In-memory account map store.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<AccountMap>,
    fail_next_replace: AtomicBool,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `replace` fail once.
    pub fn fail_next_replace(&self) {
        self.fail_next_replace.store(true, Ordering::SeqCst);
    }
}

impl AccountStore for MemoryAccountStore {
    fn load(&self) -> StoreResult<AccountMap> {
        Ok(self.accounts.read().clone())
    }

    fn replace(&self, accounts: &AccountMap) -> StoreResult<()> {
        if self.fail_next_replace.swap(false, Ordering::SeqCst) {
            return Err(injected_failure());
        }
        *self.accounts.write() = accounts.clone();
        Ok(())
    }
}
