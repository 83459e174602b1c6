//! In-memory versioned store for tests and embedded use.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{StoreError, UniverseStore, Versioned};
use crate::models::UniverseTopology;

/// Concurrent map of topology documents with a per-entry version counter.
///
/// All mutation goes through the same compare-and-swap discipline the durable
/// backings enforce, so concurrency tests against this store exercise the
/// real conflict paths.
#[derive(Debug, Default)]
pub struct InMemoryUniverseStore {
    universes: DashMap<Uuid, Versioned<UniverseTopology>>,
}

impl InMemoryUniverseStore {
    pub fn new() -> Self {
        Self {
            universes: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.universes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universes.is_empty()
    }
}

#[async_trait]
impl UniverseStore for InMemoryUniverseStore {
    async fn load(&self, universe_uuid: Uuid) -> Result<Versioned<UniverseTopology>, StoreError> {
        self.universes
            .get(&universe_uuid)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::UniverseNotFound(universe_uuid))
    }

    async fn save(
        &self,
        universe_uuid: Uuid,
        expected_version: u64,
        topology: &UniverseTopology,
    ) -> Result<u64, StoreError> {
        topology
            .validate()
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        // The dashmap entry guard holds the shard lock, making the
        // version compare and the replacement a single atomic step.
        let mut entry = self
            .universes
            .get_mut(&universe_uuid)
            .ok_or(StoreError::UniverseNotFound(universe_uuid))?;

        if entry.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: entry.version,
            });
        }

        entry.version += 1;
        entry.document = topology.clone();
        Ok(entry.version)
    }

    async fn create(
        &self,
        universe_uuid: Uuid,
        topology: &UniverseTopology,
    ) -> Result<u64, StoreError> {
        topology
            .validate()
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        match self.universes.entry(universe_uuid) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::AlreadyExists(universe_uuid))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Versioned {
                    version: 1,
                    document: topology.clone(),
                });
                Ok(1)
            }
        }
    }

    async fn remove(&self, universe_uuid: Uuid) -> Result<(), StoreError> {
        self.universes
            .remove(&universe_uuid)
            .map(|_| ())
            .ok_or(StoreError::UniverseNotFound(universe_uuid))
    }
}
