// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History reconstruction.
//!
//! Reads all prior message slots for a conversation, in slot order, and
//! projects them into the `{role, content}` turn-taking format the external
//! agent expects. A message without content for its role is omitted. The
//! projection is consumed once per turn and has no side effects.

use parley_core::{ConversationId, ParleyError, TenantId, TurnEntry};
use parley_storage::queries::messages::list_messages;
use parley_storage::{Database, MessageRecord};

/// Load and project the full history of a conversation, ascending by slot.
pub async fn load_history(
    db: &Database,
    tenant_id: TenantId,
    conversation_id: &ConversationId,
) -> Result<Vec<TurnEntry>, ParleyError> {
    let records = list_messages(db, tenant_id, conversation_id, None, 0).await?;
    Ok(project_history(&records))
}

/// Project slot-ordered records into `{role, content}` pairs, dropping
/// records whose content column for their role is NULL or empty.
pub fn project_history(records: &[MessageRecord]) -> Vec<TurnEntry> {
    records
        .iter()
        .filter_map(|record| {
            record
                .content()
                .filter(|content| !content.is_empty())
                .map(|content| TurnEntry {
                    role: record.role,
                    content: content.to_string(),
                })
        })
        .collect()
}
