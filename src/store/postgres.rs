//! PostgreSQL-backed versioned store.
//!
//! One row per universe with a `version` column; compare-and-swap is a single
//! `UPDATE ... WHERE version = $n` discriminated on rows affected.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{StoreError, UniverseStore, Versioned};
use crate::models::UniverseTopology;

pub struct PgUniverseStore {
    pool: PgPool,
}

impl PgUniverseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table when it does not exist yet. Intended for
    /// embedded deployments and integration tests; production schemas are
    /// managed by migrations.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS universes (
                universe_uuid UUID PRIMARY KEY,
                details JSONB NOT NULL,
                version BIGINT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn stored_version(&self, universe_uuid: Uuid) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query("SELECT version FROM universes WHERE universe_uuid = $1")
            .bind(universe_uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match row {
            Some(row) => {
                let version: i64 = row
                    .try_get("version")
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(version as u64))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UniverseStore for PgUniverseStore {
    async fn load(&self, universe_uuid: Uuid) -> Result<Versioned<UniverseTopology>, StoreError> {
        let row =
            sqlx::query("SELECT details, version FROM universes WHERE universe_uuid = $1")
                .bind(universe_uuid)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .ok_or(StoreError::UniverseNotFound(universe_uuid))?;

        let details: serde_json::Value = row
            .try_get("details")
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let version: i64 = row
            .try_get("version")
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let document: UniverseTopology = serde_json::from_value(details)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(Versioned {
            version: version as u64,
            document,
        })
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

        let details = serde_json::to_value(topology)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE universes SET details = $1, version = version + 1 \
             WHERE universe_uuid = $2 AND version = $3",
        )
        .bind(details)
        .bind(universe_uuid)
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok(expected_version + 1);
        }

        // Zero rows: either the row is gone or another writer moved the
        // version. Re-read to tell the two apart.
        match self.stored_version(universe_uuid).await? {
            Some(actual) => Err(StoreError::VersionConflict {
                expected: expected_version,
                actual,
            }),
            None => Err(StoreError::UniverseNotFound(universe_uuid)),
        }
    }

    async fn create(
        &self,
        universe_uuid: Uuid,
        topology: &UniverseTopology,
    ) -> Result<u64, StoreError> {
        topology
            .validate()
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

        let details = serde_json::to_value(topology)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO universes (universe_uuid, details, version) VALUES ($1, $2, 1) \
             ON CONFLICT (universe_uuid) DO NOTHING",
        )
        .bind(universe_uuid)
        .bind(details)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(universe_uuid));
        }
        Ok(1)
    }

    async fn remove(&self, universe_uuid: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM universes WHERE universe_uuid = $1")
            .bind(universe_uuid)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UniverseNotFound(universe_uuid));
        }
        Ok(())
    }
}
