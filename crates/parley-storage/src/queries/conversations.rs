// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation resolution, creation, and listing.

use parley_core::{AgentKind, ConversationId, ParleyError, TenantContext, TenantId};
use rusqlite::params;
use tracing::{info, warn};

use crate::database::{Database, map_tr_err};
use crate::models::{Conversation, ConversationSummary};
use crate::queries::now_iso;

/// Outcome of conversation resolution: the target id, and whether this turn
/// created it (drives the usage ledger's conversation counter).
#[derive(Debug, Clone)]
pub struct ResolvedConversation {
    pub id: ConversationId,
    pub created: bool,
}

/// Resolve the target conversation for a turn.
///
/// A syntactically valid candidate id is used as-is -- no existence check is
/// performed; downstream writes rely on referential integrity. A malformed
/// candidate never fails the turn: it falls through to creation, which is the
/// documented leniency policy for client-provided junk.
pub async fn resolve_conversation(
    db: &Database,
    ctx: &TenantContext,
    candidate: Option<&str>,
    agent_kind: AgentKind,
    contact_phone: &str,
    contact_name: &str,
) -> Result<ResolvedConversation, ParleyError> {
    if let Some(raw) = candidate {
        match ConversationId::parse_candidate(raw) {
            Some(id) => {
                return Ok(ResolvedConversation { id, created: false });
            }
            None => {
                warn!(
                    tenant_id = %ctx.tenant_id,
                    candidate = raw,
                    "malformed conversation id, creating a new conversation"
                );
            }
        }
    }

    let conversation =
        create_conversation(db, ctx, agent_kind, contact_phone, contact_name).await?;
    Ok(ResolvedConversation {
        id: conversation.id,
        created: true,
    })
}

/// Create a new open conversation for the tenant/inbox.
pub async fn create_conversation(
    db: &Database,
    ctx: &TenantContext,
    agent_kind: AgentKind,
    contact_phone: &str,
    contact_name: &str,
) -> Result<Conversation, ParleyError> {
    let conversation = Conversation {
        id: ConversationId::generate(),
        tenant_id: ctx.tenant_id,
        inbox_id: ctx.inbox_id,
        agent_kind,
        contact_phone: contact_phone.to_string(),
        contact_name: contact_name.to_string(),
        status: "open".to_string(),
        created_at: now_iso(),
        last_message_at: None,
    };

    let row = conversation.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, tenant_id, inbox_id, agent_kind, contact_phone, \
                 contact_name, status, created_at, last_message_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.id.0,
                    row.tenant_id.0,
                    row.inbox_id.0,
                    row.agent_kind.to_string(),
                    row.contact_phone,
                    row.contact_name,
                    row.status,
                    row.created_at,
                    row.last_message_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

    info!(
        conversation_id = %conversation.id,
        tenant_id = %ctx.tenant_id,
        inbox_id = %ctx.inbox_id,
        agent_kind = %agent_kind,
        "conversation created"
    );

    Ok(conversation)
}

/// Fetch a conversation by id, tenant-scoped.
pub async fn get_conversation(
    db: &Database,
    tenant_id: TenantId,
    id: &ConversationId,
) -> Result<Option<Conversation>, ParleyError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tenant_id, inbox_id, agent_kind, contact_phone, contact_name, \
                 status, created_at, last_message_at
                 FROM conversations WHERE id = ?1 AND tenant_id = ?2",
            )?;
            let result = stmt.query_row(params![id, tenant_id.0], map_conversation_row);
            match result {
                Ok(conversation) => Ok(Some(conversation)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List the tenant's conversations for an inbox, most recent activity first.
pub async fn list_conversations(
    db: &Database,
    ctx: &TenantContext,
    limit: i64,
    offset: i64,
) -> Result<Vec<ConversationSummary>, ParleyError> {
    let ctx = *ctx;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.agent_kind, c.contact_name, c.contact_phone, c.status, \
                 COUNT(m.id) AS message_count, c.created_at, c.last_message_at
                 FROM conversations c
                 LEFT JOIN messages m ON m.conversation_id = c.id
                 WHERE c.tenant_id = ?1 AND c.inbox_id = ?2
                 GROUP BY c.id
                 ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC
                 LIMIT ?3 OFFSET ?4",
            )?;
            let rows = stmt.query_map(
                params![ctx.tenant_id.0, ctx.inbox_id.0, limit, offset],
                |row| {
                    Ok(ConversationSummary {
                        id: ConversationId(row.get(0)?),
                        agent_kind: AgentKind::from_tag(&row.get::<_, String>(1)?),
                        contact_name: row.get(2)?,
                        contact_phone: row.get(3)?,
                        status: row.get(4)?,
                        message_count: row.get(5)?,
                        created_at: row.get(6)?,
                        last_message_at: row.get(7)?,
                    })
                },
            )?;
            let mut summaries = Vec::new();
            for row in rows {
                summaries.push(row?);
            }
            Ok(summaries)
        })
        .await
        .map_err(map_tr_err)
}

fn map_conversation_row(row: &rusqlite::Row<'_>) -> Result<Conversation, rusqlite::Error> {
    Ok(Conversation {
        id: ConversationId(row.get(0)?),
        tenant_id: TenantId(row.get(1)?),
        inbox_id: parley_core::InboxId(row.get(2)?),
        agent_kind: AgentKind::from_tag(&row.get::<_, String>(3)?),
        contact_phone: row.get(4)?,
        contact_name: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        last_message_at: row.get(8)?,
    })
}
