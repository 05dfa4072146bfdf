// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message sequencing and retrieval.
//!
//! The sequencer computes `MAX(slot) + 1` and inserts the row inside a single
//! transaction executed on the single writer thread, so two appends to the
//! same conversation can never observe the same slot. The UNIQUE
//! `(conversation_id, slot)` index is the schema-level backstop; a constraint
//! hit recomputes the whole append rather than just re-running the insert.

use parley_core::{
    AgentKind, ConversationId, MessageId, ParleyError, Role, TenantContext, TenantId,
};
use rusqlite::params;
use tracing::{debug, warn};

use crate::database::{Database, map_tr_err};
use crate::models::{AppendedMessage, MessageRecord, NewMessage};
use crate::queries::now_iso;

/// Bounded retries for slot races. Conflicts are transient and must never
/// surface to callers unless the bound is exhausted.
const MAX_SLOT_RETRIES: u32 = 3;

/// Append a message at the next free slot of the conversation.
///
/// The conversation's `last_message_at` is touched in the same transaction.
/// Fails with `SequencingConflict` only after `MAX_SLOT_RETRIES` constraint
/// hits; any other failure maps to `Storage` (including a foreign-key
/// rejection of a conversation id that does not exist).
pub async fn append_message(
    db: &Database,
    ctx: &TenantContext,
    conversation_id: &ConversationId,
    msg: &NewMessage,
) -> Result<AppendedMessage, ParleyError> {
    let mut attempt = 0;
    loop {
        attempt += 1;

        let id = MessageId::generate();
        let created_at = now_iso();
        let ctx = *ctx;
        let cid = conversation_id.0.clone();
        let row = msg.clone();
        let row_id = id.0.clone();
        let row_created = created_at.clone();

        let result = db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction()?;

                let slot: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(slot), 0) + 1 FROM messages \
                     WHERE conversation_id = ?1 AND tenant_id = ?2",
                    params![cid, ctx.tenant_id.0],
                    |r| r.get(0),
                )?;

                let (user_content, assistant_content) = match row.role {
                    Role::User => (Some(row.content.clone()), None),
                    Role::Assistant => (None, Some(row.content.clone())),
                };

                tx.execute(
                    "INSERT INTO messages (id, tenant_id, conversation_id, inbox_id, slot, \
                     role, user_content, assistant_content, agent_kind, input_tokens, \
                     output_tokens, latency_ms, model, tool_calls, rag_context, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                    params![
                        row_id,
                        ctx.tenant_id.0,
                        cid,
                        ctx.inbox_id.0,
                        slot,
                        row.role.to_string(),
                        user_content,
                        assistant_content,
                        row.agent_kind.to_string(),
                        row.tokens.map(|t| i64::from(t.input_tokens)),
                        row.tokens.map(|t| i64::from(t.output_tokens)),
                        row.latency_ms,
                        row.model,
                        row.tool_calls.map(|v| v.to_string()),
                        row.rag_context.map(|v| v.to_string()),
                        row_created,
                    ],
                )?;

                tx.execute(
                    "UPDATE conversations SET last_message_at = ?1 \
                     WHERE id = ?2 AND tenant_id = ?3",
                    params![row_created, cid, ctx.tenant_id.0],
                )?;

                tx.commit()?;
                Ok(slot)
            })
            .await;

        match result {
            Ok(slot) => {
                debug!(
                    conversation_id = %conversation_id,
                    slot,
                    role = %msg.role,
                    "message appended"
                );
                return Ok(AppendedMessage {
                    id,
                    slot,
                    created_at,
                });
            }
            Err(e) if is_slot_conflict(&e) => {
                if attempt >= MAX_SLOT_RETRIES {
                    return Err(ParleyError::SequencingConflict {
                        conversation_id: conversation_id.0.clone(),
                        attempts: attempt,
                    });
                }
                warn!(
                    conversation_id = %conversation_id,
                    attempt,
                    "slot conflict, recomputing append"
                );
            }
            Err(e) => return Err(map_tr_err(e)),
        }
    }
}

/// True when the error is a UNIQUE violation on `(conversation_id, slot)`.
/// Foreign-key violations carry a different extended code and must not be
/// retried.
pub(crate) fn is_slot_conflict(err: &tokio_rusqlite::Error<rusqlite::Error>) -> bool {
    matches!(
        err,
        tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// List a conversation's messages in ascending slot order, tenant-scoped.
pub async fn list_messages(
    db: &Database,
    tenant_id: TenantId,
    conversation_id: &ConversationId,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<MessageRecord>, ParleyError> {
    let cid = conversation_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tenant_id, conversation_id, inbox_id, slot, role, user_content, \
                 assistant_content, agent_kind, input_tokens, output_tokens, latency_ms, \
                 model, tool_calls, rag_context, created_at
                 FROM messages WHERE conversation_id = ?1 AND tenant_id = ?2
                 ORDER BY slot ASC LIMIT ?3 OFFSET ?4",
            )?;
            // A negative LIMIT means unlimited in SQLite.
            let rows = stmt.query_map(
                params![cid, tenant_id.0, limit.unwrap_or(-1), offset],
                map_message_row,
            )?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Highest slot currently assigned in the conversation (0 when empty).
pub async fn max_slot(
    db: &Database,
    tenant_id: TenantId,
    conversation_id: &ConversationId,
) -> Result<i64, ParleyError> {
    let cid = conversation_id.0.clone();
    db.connection()
        .call(move |conn| {
            let slot: i64 = conn.query_row(
                "SELECT COALESCE(MAX(slot), 0) FROM messages \
                 WHERE conversation_id = ?1 AND tenant_id = ?2",
                params![cid, tenant_id.0],
                |row| row.get(0),
            )?;
            Ok(slot)
        })
        .await
        .map_err(map_tr_err)
}

fn map_message_row(row: &rusqlite::Row<'_>) -> Result<MessageRecord, rusqlite::Error> {
    let role_raw: String = row.get(5)?;
    let role = role_raw.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(MessageRecord {
        id: MessageId(row.get(0)?),
        tenant_id: TenantId(row.get(1)?),
        conversation_id: ConversationId(row.get(2)?),
        inbox_id: parley_core::InboxId(row.get(3)?),
        slot: row.get(4)?,
        role,
        user_content: row.get(6)?,
        assistant_content: row.get(7)?,
        agent_kind: AgentKind::from_tag(&row.get::<_, String>(8)?),
        input_tokens: row.get(9)?,
        output_tokens: row.get(10)?,
        latency_ms: row.get(11)?,
        model: row.get(12)?,
        tool_calls: row
            .get::<_, Option<String>>(13)?
            .and_then(|s| serde_json::from_str(&s).ok()),
        rag_context: row
            .get::<_, Option<String>>(14)?
            .and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get(15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::conversations::{create_conversation, get_conversation};
    use parley_core::{InboxId, TokenUsage};
    use tempfile::tempdir;

    async fn setup() -> (Database, TenantContext, ConversationId, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let ctx = TenantContext::new(TenantId(1), InboxId(10));
        let conversation = create_conversation(&db, &ctx, AgentKind::Sdr, "+15551234567", "Ada")
            .await
            .unwrap();
        (db, ctx, conversation.id, dir)
    }

    #[tokio::test]
    async fn sequential_appends_get_gapless_slots() {
        let (db, ctx, cid, _dir) = setup().await;

        for expected in 1..=5 {
            let appended = append_message(
                &db,
                &ctx,
                &cid,
                &NewMessage::user(format!("msg {expected}"), AgentKind::Sdr),
            )
            .await
            .unwrap();
            assert_eq!(appended.slot, expected);
        }

        let messages = list_messages(&db, ctx.tenant_id, &cid, None, 0).await.unwrap();
        let slots: Vec<i64> = messages.iter().map(|m| m.slot).collect();
        assert_eq!(slots, vec![1, 2, 3, 4, 5]);

        db.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_never_share_a_slot() {
        let (db, ctx, cid, _dir) = setup().await;

        let mut handles = Vec::new();
        for i in 0..10 {
            let db = db.clone();
            let cid = cid.clone();
            handles.push(tokio::spawn(async move {
                append_message(
                    &db,
                    &ctx,
                    &cid,
                    &NewMessage::user(format!("concurrent {i}"), AgentKind::Sdr),
                )
                .await
                .unwrap()
                .slot
            }));
        }

        let mut slots = Vec::new();
        for handle in handles {
            slots.push(handle.await.unwrap());
        }
        slots.sort_unstable();
        assert_eq!(slots, (1..=10).collect::<Vec<i64>>());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn assistant_append_stores_usage_metadata() {
        let (db, ctx, cid, _dir) = setup().await;

        append_message(&db, &ctx, &cid, &NewMessage::user("hi", AgentKind::Sdr))
            .await
            .unwrap();
        let usage = TokenUsage {
            input_tokens: 5,
            output_tokens: 3,
            total_tokens: 8,
        };
        append_message(
            &db,
            &ctx,
            &cid,
            &NewMessage::assistant("hello!", AgentKind::Sdr, usage, 420, "sdr-v2"),
        )
        .await
        .unwrap();

        let messages = list_messages(&db, ctx.tenant_id, &cid, None, 0).await.unwrap();
        assert_eq!(messages.len(), 2);

        let user = &messages[0];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content(), Some("hi"));
        assert!(user.assistant_content.is_none());
        assert!(user.input_tokens.is_none());

        let assistant = &messages[1];
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.content(), Some("hello!"));
        assert!(assistant.user_content.is_none());
        assert_eq!(assistant.input_tokens, Some(5));
        assert_eq!(assistant.output_tokens, Some(3));
        assert_eq!(assistant.latency_ms, Some(420));
        assert_eq!(assistant.model.as_deref(), Some("sdr-v2"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn append_touches_conversation_last_message_at() {
        let (db, ctx, cid, _dir) = setup().await;

        append_message(&db, &ctx, &cid, &NewMessage::user("hi", AgentKind::Sdr))
            .await
            .unwrap();

        let conversation = get_conversation(&db, ctx.tenant_id, &cid)
            .await
            .unwrap()
            .unwrap();
        assert!(conversation.last_message_at.is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn append_to_nonexistent_conversation_is_a_storage_error() {
        let (db, ctx, _cid, _dir) = setup().await;

        // Valid UUID shape, but no such conversation row; the foreign key
        // rejects it and the error must not be reported as a slot conflict.
        let ghost = ConversationId("0191d2a8-5f2e-7c3b-b2aa-0e9f4c8d1a2b".to_string());
        let err = append_message(&db, &ctx, &ghost, &NewMessage::user("hi", AgentKind::Sdr))
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Storage { .. }), "got: {err:?}");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_slot_is_detected_as_conflict() {
        let (db, ctx, cid, _dir) = setup().await;

        append_message(&db, &ctx, &cid, &NewMessage::user("hi", AgentKind::Sdr))
            .await
            .unwrap();

        // Force a duplicate slot directly to verify the backstop and the
        // conflict classifier.
        let cid_raw = cid.0.clone();
        let tenant = ctx.tenant_id.0;
        let inbox = ctx.inbox_id.0;
        let err = db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO messages (id, tenant_id, conversation_id, inbox_id, slot, \
                     role, user_content, agent_kind, created_at)
                     VALUES ('dup', ?1, ?2, ?3, 1, 'user', 'dup', 'chat_sdr', '2026-01-01T00:00:00.000Z')",
                    params![tenant, cid_raw, inbox],
                )?;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(is_slot_conflict(&err));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_messages_respects_limit_and_offset() {
        let (db, ctx, cid, _dir) = setup().await;

        for i in 1..=5 {
            append_message(
                &db,
                &ctx,
                &cid,
                &NewMessage::user(format!("msg {i}"), AgentKind::Sdr),
            )
            .await
            .unwrap();
        }

        let page = list_messages(&db, ctx.tenant_id, &cid, Some(2), 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].slot, 2);
        assert_eq!(page[1].slot, 3);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn messages_are_tenant_scoped() {
        let (db, ctx, cid, _dir) = setup().await;

        append_message(&db, &ctx, &cid, &NewMessage::user("secret", AgentKind::Sdr))
            .await
            .unwrap();

        let other = list_messages(&db, TenantId(2), &cid, None, 0).await.unwrap();
        assert!(other.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn max_slot_tracks_appends() {
        let (db, ctx, cid, _dir) = setup().await;
        assert_eq!(max_slot(&db, ctx.tenant_id, &cid).await.unwrap(), 0);

        append_message(&db, &ctx, &cid, &NewMessage::user("one", AgentKind::Sdr))
            .await
            .unwrap();
        append_message(&db, &ctx, &cid, &NewMessage::user("two", AgentKind::Sdr))
            .await
            .unwrap();

        assert_eq!(max_slot(&db, ctx.tenant_id, &cid).await.unwrap(), 2);
        db.close().await.unwrap();
    }
}
