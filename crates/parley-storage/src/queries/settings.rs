// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master settings lookup.
//!
//! The agent endpoint and call timeout are managed externally and stored in
//! the single-row `master_settings` table. Callers fall back to the
//! compiled-in `[agent_api]` config when no row exists.

use parley_core::ParleyError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::MasterSettings;

/// Fetch the externally managed agent endpoint settings, if present.
pub async fn get_master_settings(db: &Database) -> Result<Option<MasterSettings>, ParleyError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT agent_endpoint, agent_timeout_ms FROM master_settings WHERE id = 1",
            )?;
            let result = stmt.query_row([], |row| {
                Ok(MasterSettings {
                    agent_endpoint: row.get(0)?,
                    agent_timeout_ms: row.get::<_, i64>(1)? as u64,
                })
            });
            match result {
                Ok(settings) => Ok(Some(settings)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the single master settings row.
pub async fn set_master_settings(
    db: &Database,
    settings: &MasterSettings,
) -> Result<(), ParleyError> {
    let settings = settings.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO master_settings (id, agent_endpoint, agent_timeout_ms)
                 VALUES (1, ?1, ?2)
                 ON CONFLICT (id) DO UPDATE SET
                     agent_endpoint = excluded.agent_endpoint,
                     agent_timeout_ms = excluded.agent_timeout_ms",
                params![settings.agent_endpoint, settings.agent_timeout_ms as i64],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_settings_returns_none() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        assert!(get_master_settings(&db).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_and_get_round_trips() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();

        let settings = MasterSettings {
            agent_endpoint: "https://agents.example.com".to_string(),
            agent_timeout_ms: 15_000,
        };
        set_master_settings(&db, &settings).await.unwrap();
        assert_eq!(get_master_settings(&db).await.unwrap(), Some(settings));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_replaces_existing_row() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();

        set_master_settings(
            &db,
            &MasterSettings {
                agent_endpoint: "http://old.example.com".to_string(),
                agent_timeout_ms: 10_000,
            },
        )
        .await
        .unwrap();
        set_master_settings(
            &db,
            &MasterSettings {
                agent_endpoint: "http://new.example.com".to_string(),
                agent_timeout_ms: 20_000,
            },
        )
        .await
        .unwrap();

        let current = get_master_settings(&db).await.unwrap().unwrap();
        assert_eq!(current.agent_endpoint, "http://new.example.com");
        assert_eq!(current.agent_timeout_ms, 20_000);

        db.close().await.unwrap();
    }
}
