use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::hosts::HostDefinition;

use super::HostStore;
use super::error::{Result, StoreError};

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    hosts: BTreeMap<u64, HostDefinition>,
}

/// In-process host store; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryHostStore {
    inner: RwLock<Inner>,
}

impl MemoryHostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostStore for MemoryHostStore {
    fn list(&self) -> Result<Vec<HostDefinition>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.hosts.values().cloned().collect())
    }

    fn get(&self, id: u64) -> Result<Option<HostDefinition>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.hosts.get(&id).cloned())
    }

    fn insert(&self, mut host: HostDefinition) -> Result<HostDefinition> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.next_id += 1;
        host.id = inner.next_id;
        inner.hosts.insert(host.id, host.clone());
        Ok(host)
    }

    fn update_with(
        &self,
        id: u64,
        edit: &mut dyn FnMut(&mut HostDefinition) -> bool,
    ) -> Result<bool> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let Some(slot) = inner.hosts.get_mut(&id) else {
            return Ok(false);
        };

        let mut draft = slot.clone();
        if !edit(&mut draft) {
            return Ok(false);
        }
        draft.id = id;
        *slot = draft;
        Ok(true)
    }

    fn delete(&self, id: u64) -> Result<bool> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.hosts.remove(&id).is_some())
    }
}
