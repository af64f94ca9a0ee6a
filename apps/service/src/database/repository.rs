use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Row, params};
use tracing::debug;

use super::models::{NewObservation, Observation, Target, i64_to_timestamp, timestamp_to_i64};
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::pool::{LibsqlManager, LibsqlPool};

const TARGET_COLUMNS: &str = "id, url, created_at";
const OBSERVATION_COLUMNS: &str = "id, target_id, reachable, latency_ms, status_code, checked_at";

/// Storage for targets and their observation log.
///
/// Writes must be safe to call from overlapping batches: creating the same
/// URL twice returns the row that won.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the target for `url`, creating it if this is the first sighting
    async fn get_or_create_target(&self, url: &str) -> Result<Target, StoreError>;

    /// Look a target up by id
    async fn get_target(&self, id: i64) -> Result<Target, StoreError>;

    /// Append one immutable observation
    async fn append_observation(&self, observation: &NewObservation) -> Result<Observation, StoreError>;

    /// All targets in insertion order
    async fn list_targets(&self) -> Result<Vec<Target>, StoreError>;

    /// Every observation of a target, most recent first
    async fn list_observations(&self, target_id: i64) -> Result<Vec<Observation>, StoreError>;

    /// Observations of a target with `start <= checked_at <= end`, unordered
    async fn list_observations_in_range(
        &self,
        target_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StoreError>;
}

/// LibSQL record store
pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    /// Open (or create) the database file and bring its schema up to date
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let database = libsql::Builder::new_local(&config.path)
            .build()
            .await
            .with_context(|| format!("opening database {}", config.path.display()))?;

        let pool: LibsqlPool = deadpool::managed::Pool::builder(LibsqlManager::new(database))
            .max_size(config.max_connections.max(1))
            .build()?;

        let conn = pool.get().await.map_err(StoreError::from)?;
        super::initialize_database(&conn).await?;
        drop(conn);

        Ok(Self::new_from_pool(pool))
    }

    /// Create a store instance from an already migrated pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Close the pool. Outstanding connections are dropped when returned.
    pub fn close(&self) {
        self.pool.close();
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>, StoreError> {
        Ok(self.pool.get().await?)
    }
}

async fn find_target_by_url(conn: &Connection, url: &str) -> Result<Option<Target>, StoreError> {
    let mut rows = conn
        .query(&format!("SELECT {TARGET_COLUMNS} FROM targets WHERE url = ?"), params![url])
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(target_from_row(&row)?)),
        None => Ok(None),
    }
}

async fn find_target_by_id(conn: &Connection, id: i64) -> Result<Target, StoreError> {
    let mut rows = conn
        .query(&format!("SELECT {TARGET_COLUMNS} FROM targets WHERE id = ?"), params![id])
        .await?;

    match rows.next().await? {
        Some(row) => target_from_row(&row),
        None => Err(StoreError::TargetNotFound(id)),
    }
}

fn target_from_row(row: &Row) -> Result<Target, StoreError> {
    Ok(Target {
        id: row.get(0)?,
        url: row.get(1)?,
        created_at: i64_to_timestamp(row.get(2)?)?,
    })
}

fn observation_from_row(row: &Row) -> Result<Observation, StoreError> {
    let status_code = row
        .get::<Option<i64>>(4)?
        .map(|code| {
            u16::try_from(code).map_err(|_| StoreError::InvalidRow(format!("status code {code}")))
        })
        .transpose()?;

    Ok(Observation {
        id: row.get(0)?,
        target_id: row.get(1)?,
        reachable: row.get::<i64>(2)? != 0,
        latency_ms: row.get(3)?,
        status_code,
        checked_at: i64_to_timestamp(row.get(5)?)?,
    })
}

async fn collect_observations(mut rows: libsql::Rows) -> Result<Vec<Observation>, StoreError> {
    let mut observations = Vec::new();
    while let Some(row) = rows.next().await? {
        observations.push(observation_from_row(&row)?);
    }
    Ok(observations)
}

#[async_trait]
impl RecordStore for LibsqlStore {
    async fn get_or_create_target(&self, url: &str) -> Result<Target, StoreError> {
        let conn = self.get_conn().await?;

        if let Some(target) = find_target_by_url(&conn, url).await? {
            return Ok(target);
        }

        let inserted = conn
            .execute(
                "INSERT INTO targets (url, created_at) VALUES (?, ?) ON CONFLICT(url) DO NOTHING",
                params![url, timestamp_to_i64(Utc::now())],
            )
            .await?;

        if inserted == 0 {
            debug!(url, "target created concurrently, reading the existing row");
        }

        find_target_by_url(&conn, url)
            .await?
            .ok_or_else(|| StoreError::InvalidRow(format!("target for {url} missing after insert")))
    }

    async fn get_target(&self, id: i64) -> Result<Target, StoreError> {
        let conn = self.get_conn().await?;
        find_target_by_id(&conn, id).await
    }

    async fn append_observation(&self, observation: &NewObservation) -> Result<Observation, StoreError> {
        let conn = self.get_conn().await?;

        conn.execute(
            "INSERT INTO observations (target_id, reachable, latency_ms, status_code, checked_at) VALUES (?, ?, ?, ?, ?)",
            params![
                observation.target_id,
                if observation.reachable { 1 } else { 0 },
                observation.latency_ms,
                observation.status_code.map(i64::from),
                timestamp_to_i64(observation.checked_at)
            ],
        )
        .await?;

        Ok(Observation {
            id: conn.last_insert_rowid(),
            target_id: observation.target_id,
            reachable: observation.reachable,
            latency_ms: observation.latency_ms,
            status_code: observation.status_code,
            checked_at: observation.checked_at,
        })
    }

    async fn list_targets(&self) -> Result<Vec<Target>, StoreError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {TARGET_COLUMNS} FROM targets ORDER BY id"), ())
            .await?;

        let mut targets = Vec::new();
        while let Some(row) = rows.next().await? {
            targets.push(target_from_row(&row)?);
        }
        Ok(targets)
    }

    async fn list_observations(&self, target_id: i64) -> Result<Vec<Observation>, StoreError> {
        let conn = self.get_conn().await?;
        find_target_by_id(&conn, target_id).await?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {OBSERVATION_COLUMNS} FROM observations WHERE target_id = ? ORDER BY checked_at DESC, id DESC"
                ),
                params![target_id],
            )
            .await?;

        collect_observations(rows).await
    }

    async fn list_observations_in_range(
        &self,
        target_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StoreError> {
        let conn = self.get_conn().await?;
        find_target_by_id(&conn, target_id).await?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {OBSERVATION_COLUMNS} FROM observations WHERE target_id = ? AND checked_at >= ? AND checked_at <= ?"
                ),
                params![target_id, timestamp_to_i64(start), timestamp_to_i64(end)],
            )
            .await?;

        collect_observations(rows).await
    }
}
