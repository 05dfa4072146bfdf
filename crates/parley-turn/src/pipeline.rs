// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn orchestration.
//!
//! One chat turn walks the state machine:
//! start -> tenant_resolved -> conversation_resolved -> user_message_recorded
//! -> agent_invoked -> assistant_message_recorded -> usage_recorded -> done.
//!
//! Once the user message is recorded it is never rolled back: an agent
//! failure surfaces to the caller while the conversation and the user message
//! stay durable, and a retried turn receives fresh slots. Usage-ledger
//! failures are logged and do not fail an otherwise-successful turn.

use parley_agent_api::{AgentCall, AgentClient, AgentEndpoint};
use parley_config::ParleyConfig;
use parley_core::{
    AgentKind, ConversationId, MessageId, ParleyError, TenantContext, TokenUsage, validate_e164,
};
use parley_storage::queries::{conversations, messages, settings};
use parley_storage::{Database, NewMessage};
use parley_usage::{UsageDelta, UsageLedger};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::history::load_history;

/// States of the per-turn state machine, terminal on `Done` or a reported
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Start,
    TenantResolved,
    ConversationResolved,
    UserMessageRecorded,
    AgentInvoked,
    AssistantMessageRecorded,
    UsageRecorded,
    Done,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnState::Start => "start",
            TurnState::TenantResolved => "tenant_resolved",
            TurnState::ConversationResolved => "conversation_resolved",
            TurnState::UserMessageRecorded => "user_message_recorded",
            TurnState::AgentInvoked => "agent_invoked",
            TurnState::AssistantMessageRecorded => "assistant_message_recorded",
            TurnState::UsageRecorded => "usage_recorded",
            TurnState::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// One inbound chat turn as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The user's message; must be non-empty.
    pub message: String,
    /// Optional handle of an existing conversation.
    pub conversation_id: Option<String>,
    /// Caller's agent-type tag; unrecognized values route to SDR.
    pub agent_type: String,
    /// Contact phone in E.164 form.
    pub user_phone: String,
    pub user_name: Option<String>,
}

/// The recorded user half of a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessage {
    pub id: MessageId,
    pub slot: i64,
    pub content: String,
    pub created_at: String,
}

/// The recorded assistant half of a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub id: MessageId,
    pub slot: i64,
    pub content: String,
    pub tool_calls: Vec<serde_json::Value>,
    pub rag_context: Vec<serde_json::Value>,
    pub created_at: String,
}

/// What the caller receives for a completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    pub user_message: UserMessage,
    pub assistant_message: AssistantMessage,
    pub tokens_used: u64,
}

/// Composes tenant resolution, conversation resolution, message sequencing,
/// history reconstruction, the agent call, and usage recording into the
/// single request/response transaction for one chat turn.
#[derive(Clone)]
pub struct TurnPipeline {
    db: Database,
    usage: UsageLedger,
    agent: AgentClient,
    /// Used when the master_settings table holds no row.
    fallback_endpoint: AgentEndpoint,
}

impl TurnPipeline {
    pub fn new(
        db: Database,
        usage: UsageLedger,
        agent: AgentClient,
        fallback_endpoint: AgentEndpoint,
    ) -> Self {
        Self {
            db,
            usage,
            agent,
            fallback_endpoint,
        }
    }

    /// Open storage per the config and assemble a pipeline around it.
    pub async fn connect(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let db = Database::open_with(&config.storage).await?;
        let usage = UsageLedger::new(db.connection().clone());
        let agent = AgentClient::new()?;
        let fallback_endpoint =
            AgentEndpoint::new(config.agent_api.endpoint.clone(), config.agent_api.timeout_ms);
        Ok(Self::new(db, usage, agent, fallback_endpoint))
    }

    /// The storage handle this pipeline runs on.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The usage ledger this pipeline records into.
    pub fn usage(&self) -> &UsageLedger {
        &self.usage
    }

    /// Process one chat turn for the given raw tenant/inbox identifiers.
    ///
    /// Input-validation failures reject the turn before any write. After the
    /// user message is recorded, agent failures surface as
    /// `AgentTimeout`/`Agent{status}` while the message stays durable.
    pub async fn handle_turn(
        &self,
        tenant: &str,
        inbox: &str,
        request: TurnRequest,
    ) -> Result<TurnOutcome, ParleyError> {
        let mut state = TurnState::Start;
        debug!(turn_state = %state, tenant, inbox, "turn received");

        // Fail fast on client input before any write or external call.
        if request.message.trim().is_empty() {
            return Err(ParleyError::EmptyMessage);
        }
        validate_e164(&request.user_phone)?;

        let ctx = TenantContext::resolve(tenant, inbox)?;
        state = TurnState::TenantResolved;
        debug!(turn_state = %state, tenant_id = %ctx.tenant_id, inbox_id = %ctx.inbox_id, "turn started");

        let agent_kind = AgentKind::from_tag(&request.agent_type);
        let contact_name = request.user_name.as_deref().unwrap_or("Contact");

        let resolved = conversations::resolve_conversation(
            &self.db,
            &ctx,
            request.conversation_id.as_deref(),
            agent_kind,
            &request.user_phone,
            contact_name,
        )
        .await?;
        let conversation_id = resolved.id.clone();
        state = TurnState::ConversationResolved;
        debug!(turn_state = %state, conversation_id = %conversation_id, created = resolved.created, "conversation resolved");

        let user_appended = messages::append_message(
            &self.db,
            &ctx,
            &conversation_id,
            &NewMessage::user(request.message.clone(), agent_kind),
        )
        .await?;
        state = TurnState::UserMessageRecorded;
        debug!(turn_state = %state, slot = user_appended.slot, "user message recorded");

        // From here on the user message is durable; no compensating delete
        // happens on agent failure.
        let history = load_history(&self.db, ctx.tenant_id, &conversation_id).await?;
        let endpoint = self.resolve_endpoint().await?;

        let result = self
            .agent
            .invoke(
                &endpoint,
                AgentCall {
                    agent_kind,
                    user_text: &request.message,
                    history: &history,
                    ctx: &ctx,
                    contact_phone: &request.user_phone,
                    conversation_id: Some(&conversation_id),
                },
            )
            .await?;
        state = TurnState::AgentInvoked;
        debug!(turn_state = %state, total_tokens = result.total_tokens, "agent invoked");

        let mut assistant = NewMessage::assistant(
            result.response_text.clone(),
            agent_kind,
            TokenUsage {
                input_tokens: result.input_tokens,
                output_tokens: result.output_tokens,
                total_tokens: result.total_tokens,
            },
            result.latency_ms,
            result.model.clone(),
        );
        if !result.tool_calls.is_empty() {
            assistant.tool_calls = Some(serde_json::Value::Array(result.tool_calls.clone()));
        }
        if !result.rag_context.is_empty() {
            assistant.rag_context = Some(serde_json::Value::Array(result.rag_context.clone()));
        }
        let assistant_appended =
            messages::append_message(&self.db, &ctx, &conversation_id, &assistant).await?;
        state = TurnState::AssistantMessageRecorded;
        debug!(turn_state = %state, slot = assistant_appended.slot, "assistant message recorded");

        let tokens_used = u64::from(result.input_tokens) + u64::from(result.output_tokens);

        // Best effort: a turn that got a reply is not discarded because
        // accounting failed.
        match self
            .usage
            .record(&ctx, agent_kind, UsageDelta::turn(tokens_used, resolved.created))
            .await
        {
            Ok(()) => {
                state = TurnState::UsageRecorded;
                debug!(turn_state = %state, tokens = tokens_used, "usage recorded");
            }
            Err(e) => {
                warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "usage recording failed, keeping the turn"
                );
            }
        }

        state = TurnState::Done;
        info!(
            turn_state = %state,
            conversation_id = %conversation_id,
            user_slot = user_appended.slot,
            assistant_slot = assistant_appended.slot,
            tokens_used,
            "turn complete"
        );

        Ok(TurnOutcome {
            conversation_id,
            user_message: UserMessage {
                id: user_appended.id,
                slot: user_appended.slot,
                content: request.message,
                created_at: user_appended.created_at,
            },
            assistant_message: AssistantMessage {
                id: assistant_appended.id,
                slot: assistant_appended.slot,
                content: result.response_text,
                tool_calls: result.tool_calls,
                rag_context: result.rag_context,
                created_at: assistant_appended.created_at,
            },
            tokens_used,
        })
    }

    /// Per-tenant agent endpoint from master settings, with the configured
    /// fallback when no settings row exists.
    async fn resolve_endpoint(&self) -> Result<AgentEndpoint, ParleyError> {
        match settings::get_master_settings(&self.db).await? {
            Some(s) => Ok(AgentEndpoint::new(s.agent_endpoint, s.agent_timeout_ms)),
            None => {
                warn!(
                    endpoint = %self.fallback_endpoint.base_url,
                    "master settings missing, using configured fallback endpoint"
                );
                Ok(self.fallback_endpoint.clone())
            }
        }
    }
}
