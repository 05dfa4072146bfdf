// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.

use parley_core::{AgentKind, ConversationId, InboxId, MessageId, Role, TenantId, TokenUsage};
use serde::{Deserialize, Serialize};

/// One ongoing exchange with an external contact within one inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub tenant_id: TenantId,
    pub inbox_id: InboxId,
    pub agent_kind: AgentKind,
    /// Contact phone in E.164 form.
    pub contact_phone: String,
    pub contact_name: String,
    /// Only "open" is produced by this core; transitions are administrative.
    pub status: String,
    /// ISO 8601 UTC timestamp.
    pub created_at: String,
    pub last_message_at: Option<String>,
}

/// One turn-half (user or assistant side) within a conversation.
///
/// Content is split into per-role columns; the column that does not match
/// `role` is NULL. `content()` picks the right one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub tenant_id: TenantId,
    pub conversation_id: ConversationId,
    pub inbox_id: InboxId,
    /// Strictly increasing, gapless from 1 within the conversation.
    pub slot: i64,
    pub role: Role,
    pub user_content: Option<String>,
    pub assistant_content: Option<String>,
    pub agent_kind: AgentKind,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub latency_ms: Option<i64>,
    pub model: Option<String>,
    /// JSON array of tool invocations reported by the agent.
    pub tool_calls: Option<serde_json::Value>,
    /// JSON array of retrieval chunks reported by the agent.
    pub rag_context: Option<serde_json::Value>,
    pub created_at: String,
}

impl MessageRecord {
    /// The content column matching this record's role, if present.
    pub fn content(&self) -> Option<&str> {
        match self.role {
            Role::User => self.user_content.as_deref(),
            Role::Assistant => self.assistant_content.as_deref(),
        }
    }
}

/// Input for appending one message to a conversation.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub agent_kind: AgentKind,
    /// Token counts; None for user messages.
    pub tokens: Option<TokenUsage>,
    pub latency_ms: Option<i64>,
    pub model: Option<String>,
    pub tool_calls: Option<serde_json::Value>,
    pub rag_context: Option<serde_json::Value>,
}

impl NewMessage {
    /// A user-side message: no token counts, latency, or model.
    pub fn user(content: impl Into<String>, agent_kind: AgentKind) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            agent_kind,
            tokens: None,
            latency_ms: None,
            model: None,
            tool_calls: None,
            rag_context: None,
        }
    }

    /// An assistant-side message carrying the agent's reply metadata.
    pub fn assistant(
        content: impl Into<String>,
        agent_kind: AgentKind,
        tokens: TokenUsage,
        latency_ms: i64,
        model: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            agent_kind,
            tokens: Some(tokens),
            latency_ms: Some(latency_ms),
            model: Some(model.into()),
            tool_calls: None,
            rag_context: None,
        }
    }
}

/// What the sequencer hands back after a successful append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendedMessage {
    pub id: MessageId,
    pub slot: i64,
    pub created_at: String,
}

/// One row of the tenant-scoped conversation listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub agent_kind: AgentKind,
    pub contact_name: String,
    pub contact_phone: String,
    pub status: String,
    pub message_count: i64,
    pub created_at: String,
    pub last_message_at: Option<String>,
}

/// Externally managed agent endpoint configuration (single row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSettings {
    pub agent_endpoint: String,
    pub agent_timeout_ms: u64,
}
