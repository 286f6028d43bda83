use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::definition::{HostDefinition, HostPatch, HostValidationError, NewHost, validate};
use crate::store::{HostStore, StoreError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid host definition: {0}")]
    Invalid(#[from] HostValidationError),
    #[error("host store failure: {0}")]
    Store(#[from] StoreError),
}

/// Read side of host configuration plus the administrative mutations.
///
/// Every query goes to the store, so edits made through any handle show up
/// on the very next upload.
#[derive(Clone)]
pub struct HostRegistry {
    store: Arc<dyn HostStore>,
}

impl HostRegistry {
    pub fn new(store: Arc<dyn HostStore>) -> Self {
        Self { store }
    }

    /// Enabled hosts, highest priority first, ties in insertion order
    pub fn list_candidates(&self) -> Result<Vec<HostDefinition>, RegistryError> {
        let mut hosts: Vec<_> = self
            .store
            .list()?
            .into_iter()
            .filter(|host| host.is_enabled)
            .collect();
        sort_by_priority(&mut hosts);
        debug!(count = hosts.len(), "Resolved upload candidates");
        Ok(hosts)
    }

    /// Every host, enabled or not, in candidate order
    pub fn list_all(&self) -> Result<Vec<HostDefinition>, RegistryError> {
        let mut hosts = self.store.list()?;
        sort_by_priority(&mut hosts);
        Ok(hosts)
    }

    pub fn get(&self, id: u64) -> Result<Option<HostDefinition>, RegistryError> {
        Ok(self.store.get(id)?)
    }

    pub fn add_definition(&self, host: NewHost) -> Result<HostDefinition, RegistryError> {
        let draft = host.into_definition(0);
        validate(&draft)?;
        let stored = self.store.insert(draft)?;
        info!(host_id = stored.id, name = %stored.name, "Host definition added");
        Ok(stored)
    }

    /// `Ok(false)` when no host has this id
    ///
    /// The patch is applied and validated under the store's write lock, so
    /// concurrent patches to one host never drop each other's fields.
    pub fn update_definition(&self, id: u64, patch: HostPatch) -> Result<bool, RegistryError> {
        let mut patch = Some(patch);
        let mut rejected = None;
        let mut name = String::new();

        let updated = self.store.update_with(id, &mut |host| {
            if let Some(patch) = patch.take() {
                patch.apply(host);
            }
            match validate(host) {
                Ok(()) => {
                    name = host.name.clone();
                    true
                }
                Err(e) => {
                    rejected = Some(e);
                    false
                }
            }
        })?;

        if let Some(e) = rejected {
            return Err(e.into());
        }
        if updated {
            info!(host_id = id, name = %name, "Host definition updated");
        }
        Ok(updated)
    }

    /// `Ok(false)` when no host has this id
    pub fn remove_definition(&self, id: u64) -> Result<bool, RegistryError> {
        let removed = self.store.delete(id)?;
        if removed {
            info!(host_id = id, "Host definition removed");
        }
        Ok(removed)
    }

    /// Insert `seeds` only when the store has no hosts at all
    pub fn seed_if_empty(&self, seeds: Vec<NewHost>) -> Result<usize, RegistryError> {
        if !self.store.list()?.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0;
        for seed in seeds {
            self.add_definition(seed)?;
            inserted += 1;
        }
        if inserted > 0 {
            info!(count = inserted, "Seeded empty host store");
        }
        Ok(inserted)
    }

    pub fn persist(&self) -> Result<(), RegistryError> {
        Ok(self.store.persist()?)
    }
}

fn sort_by_priority(hosts: &mut [HostDefinition]) {
    hosts.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryHostStore;

    fn registry() -> HostRegistry {
        HostRegistry::new(Arc::new(MemoryHostStore::new()))
    }

    fn host(name: &str, priority: i32) -> NewHost {
        let mut host = NewHost::new(name, "https://img.example.com/upload", "data.url");
        host.priority = priority;
        host
    }

    fn names(hosts: &[HostDefinition]) -> Vec<&str> {
        hosts.iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn test_candidates_sorted_by_priority_then_insertion() {
        let registry = registry();
        registry.add_definition(host("low", 1)).unwrap();
        registry.add_definition(host("tie-first", 5)).unwrap();
        registry.add_definition(host("high", 10)).unwrap();
        registry.add_definition(host("tie-second", 5)).unwrap();

        let candidates = registry.list_candidates().unwrap();
        assert_eq!(names(&candidates), ["high", "tie-first", "tie-second", "low"]);
    }

    #[test]
    fn test_disabled_hosts_toggle_out_and_back() {
        let registry = registry();
        let a = registry.add_definition(host("a", 1)).unwrap();
        registry.add_definition(host("b", 2)).unwrap();

        let disable = HostPatch {
            is_enabled: Some(false),
            ..Default::default()
        };
        assert!(registry.update_definition(a.id, disable).unwrap());
        assert_eq!(names(&registry.list_candidates().unwrap()), ["b"]);
        assert_eq!(registry.list_all().unwrap().len(), 2);

        let enable = HostPatch {
            is_enabled: Some(true),
            ..Default::default()
        };
        assert!(registry.update_definition(a.id, enable).unwrap());
        assert_eq!(names(&registry.list_candidates().unwrap()), ["b", "a"]);
    }

    #[test]
    fn test_empty_registry_is_not_an_error() {
        assert!(registry().list_candidates().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_ids_report_false() {
        let registry = registry();
        assert!(!registry.update_definition(7, HostPatch::default()).unwrap());
        assert!(!registry.remove_definition(7).unwrap());
    }

    #[test]
    fn test_add_rejects_missing_url_path() {
        let registry = registry();
        let mut broken = host("broken", 1);
        broken.response_url_path = String::new();

        let result = registry.add_definition(broken);
        assert!(matches!(
            result,
            Err(RegistryError::Invalid(HostValidationError::MissingResponseUrlPath(_)))
        ));
        assert!(registry.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_update_rejects_invalid_patch() {
        let registry = registry();
        let stored = registry.add_definition(host("a", 1)).unwrap();

        let patch = HostPatch {
            url: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(registry.update_definition(stored.id, patch).is_err());
        assert_eq!(
            registry.get(stored.id).unwrap().unwrap().url,
            "https://img.example.com/upload"
        );
    }

    #[test]
    fn test_concurrent_patches_keep_both_fields() {
        let registry = registry();
        let id = registry.add_definition(host("shared", 1)).unwrap().id;

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..50 {
                    let patch = HostPatch {
                        priority: Some(i),
                        ..Default::default()
                    };
                    registry.update_definition(id, patch).unwrap();
                }
            });
            scope.spawn(|| {
                for i in 0..50 {
                    let patch = HostPatch {
                        description: Some(format!("rev {i}")),
                        ..Default::default()
                    };
                    registry.update_definition(id, patch).unwrap();
                }
            });
        });

        let host = registry.get(id).unwrap().unwrap();
        assert_eq!(host.priority, 49);
        assert_eq!(host.description.as_deref(), Some("rev 49"));
    }

    #[test]
    fn test_removal_visible_on_next_query() {
        let registry = registry();
        let a = registry.add_definition(host("a", 1)).unwrap();
        assert_eq!(registry.list_candidates().unwrap().len(), 1);

        assert!(registry.remove_definition(a.id).unwrap());
        assert!(registry.list_candidates().unwrap().is_empty());
    }

    #[test]
    fn test_seed_only_when_empty() {
        let registry = registry();
        assert_eq!(registry.seed_if_empty(vec![host("a", 1), host("b", 2)]).unwrap(), 2);
        assert_eq!(registry.seed_if_empty(vec![host("c", 3)]).unwrap(), 0);
        assert_eq!(registry.list_all().unwrap().len(), 2);
    }
}
