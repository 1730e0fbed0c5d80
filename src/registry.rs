//! Name -> [`Volume`] index with change notification.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::bridge::{Notification, Notifier};
use crate::error::{Error, Result};
use crate::library::Volume;

pub struct VolumeRegistry {
    volumes: BTreeMap<String, Volume>,
    notifier: Arc<dyn Notifier>,
}

/// Registry shared between the watcher thread and the command handler.
pub type SharedRegistry = Arc<Mutex<VolumeRegistry>>;

impl VolumeRegistry {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            volumes: BTreeMap::new(),
            notifier,
        }
    }

    pub fn shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Insert `volume`, replacing any volume with the same name.
    pub fn add(&mut self, volume: Volume) {
        self.volumes.insert(volume.name().to_string(), volume);
        self.announce();
    }

    pub fn remove(&mut self, name: &str) -> Result<Volume> {
        let volume = self
            .volumes
            .remove(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        self.announce();
        Ok(volume)
    }

    pub fn get(&self, name: &str) -> Result<&Volume> {
        self.volumes
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Volume> {
        self.volumes
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.volumes.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.volumes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Copies of every registered volume, so long work can run without the lock.
    pub fn snapshot(&self) -> Vec<Volume> {
        self.volumes.values().cloned().collect()
    }

    fn announce(&self) {
        self.notifier.notify(Notification::TopologyChanged {
            volumes: self.names(),
        });
    }
}

/// Lock the shared registry, recovering from a poisoned lock.
pub fn lock(registry: &SharedRegistry) -> MutexGuard<'_, VolumeRegistry> {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::bridge::ChannelNotifier;
    use crate::library::testing::{FakeTags, context};

    fn registry() -> (VolumeRegistry, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel();
        (VolumeRegistry::new(Arc::new(ChannelNotifier::new(tx))), rx)
    }

    fn volume(name: &str) -> Volume {
        Volume::new(name, format!("/tmp/{name}"), context(FakeTags::with(&[])))
    }

    #[test]
    fn add_and_remove_announce_the_full_name_list() {
        let (mut reg, rx) = registry();
        reg.add(volume("local"));
        reg.add(volume("USB"));
        reg.remove("local").unwrap();

        let seen: Vec<Notification> = rx.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                Notification::TopologyChanged {
                    volumes: vec!["local".to_string()]
                },
                Notification::TopologyChanged {
                    volumes: vec!["USB".to_string(), "local".to_string()]
                },
                Notification::TopologyChanged {
                    volumes: vec!["USB".to_string()]
                },
            ]
        );
    }

    #[test]
    fn get_unknown_name_is_not_found() {
        let (mut reg, rx) = registry();
        assert!(matches!(reg.get("nope"), Err(Error::NotFound(n)) if n == "nope"));
        assert!(matches!(reg.remove("nope"), Err(Error::NotFound(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn snapshot_is_detached_from_the_registry() {
        let (mut reg, _rx) = registry();
        reg.add(volume("local"));
        let snap = reg.snapshot();
        reg.remove("local").unwrap();
        assert_eq!(snap.len(), 1);
        assert!(reg.is_empty());
    }
}
