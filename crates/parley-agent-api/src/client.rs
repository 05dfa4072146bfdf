// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external agent service.
//!
//! Provides [`AgentClient`] which builds the request envelope, enforces the
//! E.164 sender contract, routes by agent kind, performs the call with a
//! caller-supplied timeout, and normalizes the response at the boundary.
//!
//! The client performs no persistence and no automatic retries -- retry
//! policy belongs to the caller, applied to the whole turn.

use std::time::Duration;

use parley_core::{AgentKind, ConversationId, ParleyError, TenantContext, TurnEntry, validate_e164};
use tracing::{debug, info, warn};

use crate::types::{
    AgentReply, AgentRequest, AgentResult, ConversationRef, MessagePayload, RagOptions,
    RoutingDescriptor, SenderDescriptor, TenantDescriptor,
};

/// Where one call goes: a per-tenant resolved base URL and timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub base_url: String,
    pub timeout: Duration,
}

impl AgentEndpoint {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

/// Everything one invocation needs besides the endpoint.
#[derive(Debug, Clone)]
pub struct AgentCall<'a> {
    pub agent_kind: AgentKind,
    pub user_text: &'a str,
    /// Reconstructed turn history. Accepted for parity with the pipeline
    /// contract; the wire envelope does not carry it -- the agent service
    /// replays context from the conversation id.
    pub history: &'a [TurnEntry],
    pub ctx: &'a TenantContext,
    pub contact_phone: &'a str,
    /// `None` signals a conversation the agent service has not seen yet.
    pub conversation_id: Option<&'a ConversationId>,
}

/// HTTP client for agent service communication.
#[derive(Debug, Clone)]
pub struct AgentClient {
    client: reqwest::Client,
}

impl AgentClient {
    /// Creates a new agent service client.
    ///
    /// Timeouts are per call (resolved from tenant configuration), so the
    /// underlying client is built without a global timeout.
    pub fn new() -> Result<Self, ParleyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ParleyError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Invoke the agent service for one turn.
    ///
    /// Three outcomes: a normalized [`AgentResult`] on 2xx, `Agent{status}`
    /// on any other status (the body is logged, never surfaced), and
    /// `AgentTimeout` when the endpoint's deadline expires -- no partial
    /// response is used.
    pub async fn invoke(
        &self,
        endpoint: &AgentEndpoint,
        call: AgentCall<'_>,
    ) -> Result<AgentResult, ParleyError> {
        // Guard the external contract before anything leaves the process.
        validate_e164(call.contact_phone)?;

        let url = format!(
            "{}{}",
            endpoint.base_url.trim_end_matches('/'),
            call.agent_kind.route_suffix()
        );
        let request_id = format!("req_{}", uuid::Uuid::new_v4().simple());

        let envelope = AgentRequest {
            request_id: request_id.clone(),
            tenant: TenantDescriptor::for_tenant(call.ctx.tenant_id.0),
            routing: RoutingDescriptor {
                inbox_id: call.ctx.inbox_id.0,
                agent_type: call.agent_kind.wire_tag().to_string(),
            },
            message: MessagePayload::text(call.user_text),
            sender: SenderDescriptor {
                phone_e164: call.contact_phone.to_string(),
            },
            conversation: call
                .conversation_id
                .map(|id| ConversationRef::existing(id.0.clone()))
                .unwrap_or_else(ConversationRef::new_conversation),
            rag_options: RagOptions::default(),
        };

        debug!(
            url = %url,
            request_id = %request_id,
            agent_kind = %call.agent_kind,
            history_len = call.history.len(),
            timeout_ms = endpoint.timeout.as_millis() as u64,
            "calling agent service"
        );

        let response = self
            .client
            .post(&url)
            .header("X-Request-ID", &request_id)
            .timeout(endpoint.timeout)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ParleyError::AgentTimeout {
                        duration: endpoint.timeout,
                    }
                } else {
                    ParleyError::AgentUnreachable {
                        source: Box::new(e),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                request_id = %request_id,
                body = %body,
                "agent service rejected the call"
            );
            return Err(ParleyError::Agent {
                status: status.as_u16(),
            });
        }

        let reply: AgentReply = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ParleyError::AgentTimeout {
                    duration: endpoint.timeout,
                }
            } else {
                ParleyError::Internal(format!("failed to decode agent response: {e}"))
            }
        })?;
        let result = AgentResult::from(reply);

        info!(
            request_id = %request_id,
            response_chars = result.response_text.len(),
            total_tokens = result.total_tokens,
            latency_ms = result.latency_ms,
            "agent service replied"
        );

        Ok(result)
    }
}
