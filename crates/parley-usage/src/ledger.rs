// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily usage ledger.
//!
//! Every completed turn upserts one row keyed by
//! `(tenant_id, inbox_id, date_window, agent_kind)`. The merge is additive
//! and commutative, so any interleaving of concurrent turns for the same key
//! yields the same final totals. Rows are mutated only through this upsert --
//! never read-modify-write at the caller.

use parley_core::{AgentKind, ParleyError, TenantContext};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Counter increments contributed by one turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageDelta {
    /// Tokens consumed by the turn.
    pub tokens: u64,
    /// Messages to add; one turn normally contributes 1.
    pub messages: u64,
    /// 1 when the turn created the conversation, 0 otherwise.
    pub conversations: u64,
}

impl UsageDelta {
    /// The usual per-turn contribution.
    pub fn turn(tokens: u64, created_conversation: bool) -> Self {
        Self {
            tokens,
            messages: 1,
            conversations: if created_conversation { 1 } else { 0 },
        }
    }
}

/// One aggregated day of usage for a tenant/inbox/agent tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date_window: String,
    pub agent_kind: AgentKind,
    pub total_tokens: u64,
    pub total_messages: u64,
    pub total_conversations: u64,
}

/// Summed counters across all days for a tenant/inbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub total_tokens: u64,
    pub total_messages: u64,
    pub total_conversations: u64,
}

/// Convert a tokio-rusqlite error into ParleyError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ParleyError {
    ParleyError::Storage {
        source: Box::new(e),
    }
}

/// Persistent usage ledger backed by SQLite.
///
/// Records go to the `usage_daily` table (created by storage migrations).
/// All operations run through the single tokio-rusqlite background thread.
#[derive(Clone)]
pub struct UsageLedger {
    conn: tokio_rusqlite::Connection,
}

impl UsageLedger {
    /// Create a usage ledger over an existing tokio-rusqlite connection.
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Open a usage ledger from a database file path.
    ///
    /// The `usage_daily` table must already exist (created by storage
    /// migrations).
    pub async fn open(path: &str) -> Result<Self, ParleyError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })?;
        Ok(Self::new(conn))
    }

    /// Record one turn's contribution against today's window.
    pub async fn record(
        &self,
        ctx: &TenantContext,
        agent_kind: AgentKind,
        delta: UsageDelta,
    ) -> Result<(), ParleyError> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        self.record_for_date(ctx, agent_kind, &today, delta).await
    }

    /// Record a contribution against an explicit calendar day.
    pub async fn record_for_date(
        &self,
        ctx: &TenantContext,
        agent_kind: AgentKind,
        date_window: &str,
        delta: UsageDelta,
    ) -> Result<(), ParleyError> {
        let ctx = *ctx;
        let date = date_window.to_string();
        let updated_at = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO usage_daily (tenant_id, inbox_id, date_window, agent_kind, \
                     total_tokens, total_messages, total_conversations, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT (tenant_id, inbox_id, date_window, agent_kind) DO UPDATE SET
                         total_tokens = total_tokens + excluded.total_tokens,
                         total_messages = total_messages + excluded.total_messages,
                         total_conversations = total_conversations + excluded.total_conversations,
                         updated_at = excluded.updated_at",
                    rusqlite::params![
                        ctx.tenant_id.0,
                        ctx.inbox_id.0,
                        date,
                        agent_kind.to_string(),
                        delta.tokens as i64,
                        delta.messages as i64,
                        delta.conversations as i64,
                        updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            tenant_id = %ctx.tenant_id,
            inbox_id = %ctx.inbox_id,
            agent_kind = %agent_kind,
            tokens = delta.tokens,
            messages = delta.messages,
            conversations = delta.conversations,
            "usage recorded"
        );

        Ok(())
    }

    /// Daily usage rows for the last `days` calendar days, newest first.
    pub async fn daily_window(
        &self,
        ctx: &TenantContext,
        days: i64,
    ) -> Result<Vec<DailyUsage>, ParleyError> {
        let ctx = *ctx;
        let cutoff = (chrono::Utc::now() - chrono::Duration::days(days))
            .format("%Y-%m-%d")
            .to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT date_window, agent_kind, total_tokens, total_messages, \
                     total_conversations
                     FROM usage_daily
                     WHERE tenant_id = ?1 AND inbox_id = ?2 AND date_window >= ?3
                     ORDER BY date_window DESC, agent_kind ASC",
                )?;
                let rows = stmt.query_map(
                    rusqlite::params![ctx.tenant_id.0, ctx.inbox_id.0, cutoff],
                    |row| {
                        Ok(DailyUsage {
                            date_window: row.get(0)?,
                            agent_kind: AgentKind::from_tag(&row.get::<_, String>(1)?),
                            total_tokens: row.get::<_, i64>(2)? as u64,
                            total_messages: row.get::<_, i64>(3)? as u64,
                            total_conversations: row.get::<_, i64>(4)? as u64,
                        })
                    },
                )?;
                let mut usage = Vec::new();
                for row in rows {
                    usage.push(row?);
                }
                Ok(usage)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Summed counters across all days for the tenant/inbox.
    pub async fn totals(&self, ctx: &TenantContext) -> Result<UsageTotals, ParleyError> {
        let ctx = *ctx;
        self.conn
            .call(move |conn| {
                let totals = conn.query_row(
                    "SELECT COALESCE(SUM(total_tokens), 0), \
                     COALESCE(SUM(total_messages), 0), \
                     COALESCE(SUM(total_conversations), 0)
                     FROM usage_daily WHERE tenant_id = ?1 AND inbox_id = ?2",
                    rusqlite::params![ctx.tenant_id.0, ctx.inbox_id.0],
                    |row| {
                        Ok(UsageTotals {
                            total_tokens: row.get::<_, i64>(0)? as u64,
                            total_messages: row.get::<_, i64>(1)? as u64,
                            total_conversations: row.get::<_, i64>(2)? as u64,
                        })
                    },
                )?;
                Ok(totals)
            })
            .await
            .map_err(map_tr_err)
    }
}
