// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Query modules accept `&Database` and call through `connection()`.
//! Do NOT create additional Connection instances for writes.

use parley_config::model::StorageConfig;
use parley_core::ParleyError;
use tracing::info;

use crate::migrations;

/// Convert a tokio-rusqlite error into ParleyError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ParleyError {
    ParleyError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database, cloneable and shared across tasks.
///
/// Wraps a single `tokio_rusqlite::Connection`; all closure calls are
/// serialized on one background thread, which makes multi-statement
/// closures (such as the slot compute+insert) atomic with respect to
/// each other.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, ParleyError> {
        Self::open_with(&StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        })
        .await
    }

    /// Open (or create) the database described by the storage config.
    ///
    /// Migrations run on a short-lived blocking connection before the
    /// async connection is handed out, so every `Database` observed by
    /// callers is fully migrated.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, ParleyError> {
        let path = config.database_path.clone();
        let wal = config.wal_mode;

        if let Some(parent) = std::path::Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })?;
        }

        let migrate_path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), ParleyError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| ParleyError::Storage {
                    source: Box::new(e),
                })?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| ParleyError::Internal(format!("migration task panicked: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| {
            if wal {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %path, wal, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Liveness probe: runs `SELECT 1` through the writer thread.
    pub async fn ping(&self) -> Result<(), ParleyError> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Close the background connection, flushing WAL state.
    pub async fn close(self) -> Result<(), ParleyError> {
        self.conn.close().await.map_err(|e| ParleyError::Storage {
            source: Box::new(e),
        })
    }
}
