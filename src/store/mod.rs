//! Append-only SQLite persistence for [`PositionSnapshot`] batches.

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::StoreError;
use crate::positions::{PositionBatch, PositionSnapshot};

pub mod queries;

/// Text form of `fetched_at`, matching ISO-8601 with microseconds.
pub const FETCHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One open connection to the snapshot database.
///
/// Rows are only ever inserted. Dropping the store without [`close`](Self::close)
/// still releases the connection.
pub struct SnapshotStore {
    conn: SqliteConnection,
}

impl SnapshotStore {
    /// Opens the database file at `path`, creating it if absent.
    ///
    /// The path is taken literally; `?` and `%` have no special meaning.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect(options).await
    }

    /// Opens a private in-memory database, discarded on close.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        let conn = options.connect().await?;
        Ok(Self { conn })
    }

    /// Creates the `train_positions` table if it does not exist.
    pub async fn ensure_schema(&mut self) -> Result<(), StoreError> {
        sqlx::query(queries::CREATE_TRAIN_POSITIONS)
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    /// Appends every snapshot of `batch` in a single transaction and returns
    /// the number of rows written.
    ///
    /// Either the whole batch is committed or nothing is.
    pub async fn insert_batch(&mut self, batch: &PositionBatch) -> Result<u64, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let fetched_at = batch.fetched_at().format(FETCHED_AT_FORMAT).to_string();
        let mut tx = self.conn.begin().await?;

        let mut written = 0;
        for snapshot in batch.snapshots() {
            written += insert_one(&mut tx, snapshot, &fetched_at).await?;
        }

        tx.commit().await?;
        debug!(rows = written, fetched_at = %fetched_at, "Snapshot batch committed");
        Ok(written)
    }

    pub async fn close(self) -> Result<(), StoreError> {
        self.conn.close().await?;
        Ok(())
    }
}

async fn insert_one(
    conn: &mut SqliteConnection,
    s: &PositionSnapshot,
    fetched_at: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(queries::INSERT_TRAIN_POSITION)
        .bind(&s.run_number)
        .bind(&s.route)
        .bind(&s.destination)
        .bind(&s.next_station_id)
        .bind(&s.next_station_name)
        .bind(s.is_approaching)
        .bind(s.is_delayed)
        .bind(s.lat)
        .bind(s.lon)
        .bind(s.heading)
        .bind(&s.predicted_arrival)
        .bind(fetched_at)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
