use std::path::Path;
use std::sync::Mutex;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use crate::hosts::HostDefinition;

use super::HostStore;
use super::error::{Result, StoreError};
use super::keys::{META_NEXT_HOST_ID, decode_host_key, encode_host_key, encode_meta_key};

/// Fjall-backed persistent storage for host definitions
#[derive(Clone)]
pub struct FjallHostStore {
    keyspace: Keyspace,
    hosts: PartitionHandle,
    metadata: PartitionHandle,
    write_lock: std::sync::Arc<Mutex<()>>,
}

impl FjallHostStore {
    /// Open or create a host store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening host store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let hosts = keyspace.open_partition("hosts", PartitionCreateOptions::default())?;
        let metadata = keyspace.open_partition("metadata", PartitionCreateOptions::default())?;

        info!("Host store opened successfully");
        Ok(Self {
            keyspace,
            hosts,
            metadata,
            write_lock: Default::default(),
        })
    }

    fn next_id(&self) -> Result<u64> {
        match self.metadata.get(encode_meta_key(META_NEXT_HOST_ID))? {
            Some(raw) => std::str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| StoreError::CorruptMetadata(META_NEXT_HOST_ID.to_string())),
            None => Ok(1),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl HostStore for FjallHostStore {
    fn list(&self) -> Result<Vec<HostDefinition>> {
        let mut hosts = Vec::new();
        for item in self.hosts.iter() {
            let (key, value) = item?;
            if decode_host_key(&key).is_none() {
                continue;
            }
            hosts.push(serde_json::from_slice(&value)?);
        }
        Ok(hosts)
    }

    fn get(&self, id: u64) -> Result<Option<HostDefinition>> {
        match self.hosts.get(encode_host_key(id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, mut host: HostDefinition) -> Result<HostDefinition> {
        let _guard = self.lock()?;

        let id = self.next_id()?;
        host.id = id;
        let value = serde_json::to_vec(&host)?;

        // Host row and counter land together so a crash can't reuse an id.
        let mut batch = self.keyspace.batch();
        batch.insert(&self.hosts, encode_host_key(id), value);
        batch.insert(
            &self.metadata,
            encode_meta_key(META_NEXT_HOST_ID),
            (id + 1).to_string().into_bytes(),
        );
        batch.commit()?;

        debug!(host_id = id, name = %host.name, "Inserted host definition");
        Ok(host)
    }

    fn update_with(
        &self,
        id: u64,
        edit: &mut dyn FnMut(&mut HostDefinition) -> bool,
    ) -> Result<bool> {
        let _guard = self.lock()?;

        let key = encode_host_key(id);
        let Some(raw) = self.hosts.get(&key)? else {
            return Ok(false);
        };
        let mut host: HostDefinition = serde_json::from_slice(&raw)?;
        if !edit(&mut host) {
            return Ok(false);
        }
        host.id = id;

        self.hosts.insert(key, serde_json::to_vec(&host)?)?;
        debug!(host_id = id, "Updated host definition");
        Ok(true)
    }

    fn delete(&self, id: u64) -> Result<bool> {
        let _guard = self.lock()?;

        let key = encode_host_key(id);
        if !self.hosts.contains_key(&key)? {
            return Ok(false);
        }
        self.hosts.remove(key)?;
        debug!(host_id = id, "Deleted host definition");
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}
