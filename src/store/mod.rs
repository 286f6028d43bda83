//! Persistence for host definitions
//!
//! The registry never talks to a database directly. It holds an injected
//! [`HostStore`] handle that the process opens at start and persists at
//! shutdown:
//!
//! - [`FjallHostStore`] keeps definitions in an embedded fjall keyspace
//! - [`MemoryHostStore`] keeps them in a map, for tests and throwaway runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use imgrelay::store::{FjallHostStore, HostStore};
//!
//! let store = FjallHostStore::open("data/hosts")?;
//! let hosts = store.list()?;
//! ```

pub mod error;
pub mod fjall_store;
pub mod keys;
pub mod memory;

pub use fjall_store::FjallHostStore;
pub use error::{Result, StoreError};
pub use memory::MemoryHostStore;

use crate::hosts::HostDefinition;

/// Backing storage for host definitions.
///
/// Implementations must hand out ids that only ever grow, since the id is
/// also the insertion order used to break priority ties.
pub trait HostStore: Send + Sync {
    /// All definitions in id order
    fn list(&self) -> Result<Vec<HostDefinition>>;

    fn get(&self, id: u64) -> Result<Option<HostDefinition>>;

    /// Store `host` under a freshly assigned id, ignoring `host.id`
    fn insert(&self, host: HostDefinition) -> Result<HostDefinition>;

    /// Read, edit and write back one definition while holding the write lock.
    ///
    /// `edit` returns `false` to leave the stored row untouched. The id is
    /// never changed by an edit. `false` if the id is unknown or the edit
    /// was declined.
    fn update_with(&self, id: u64, edit: &mut dyn FnMut(&mut HostDefinition) -> bool)
    -> Result<bool>;

    /// `false` if the id is unknown
    fn delete(&self, id: u64) -> Result<bool>;

    /// Flush pending writes, if the backend buffers any
    fn persist(&self) -> Result<()> {
        Ok(())
    }
}
