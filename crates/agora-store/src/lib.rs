//! Document-store facades for the Agora simulator.
//!
//! Two independent persisted documents: the market snapshot and the
//! identity→account map. Core logic depends only on the [`MarketStore`]
//! and [`AccountStore`] traits (atomic load/replace), never on file
//! paths. The JSON file implementation writes via temp-file + rename and
//! migrates the legacy flat-array market document on read; the in-memory
//! implementation backs tests.

pub mod error;
pub mod json;
pub mod memory;

use agora_core::{Account, MarketSnapshot};
use std::collections::BTreeMap;

pub use error::{StoreError, StoreResult};
pub use json::{JsonAccountStore, JsonMarketStore};
pub use memory::{MemoryAccountStore, MemoryMarketStore};

/// Identity-keyed account map, the persisted account document.
pub type AccountMap = BTreeMap<String, Account>;

/// Atomic load/replace of the full market snapshot.
pub trait MarketStore: Send + Sync {
    /// Load the current snapshot; `None` when nothing was persisted yet.
    fn load(&self) -> StoreResult<Option<MarketSnapshot>>;

    /// Atomically replace the whole snapshot.
    fn replace(&self, snapshot: &MarketSnapshot) -> StoreResult<()>;
}

/// Atomic load/replace of the full identity→account map.
pub trait AccountStore: Send + Sync {
    /// Load all accounts; empty map when nothing was persisted yet.
    fn load(&self) -> StoreResult<AccountMap>;

    /// Atomically replace the whole map.
    fn replace(&self, accounts: &AccountMap) -> StoreResult<()>;
}
