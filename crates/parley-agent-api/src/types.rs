// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent service request/response wire types.
//!
//! The response shape is heterogeneous across agent back-ends; it is decoded
//! exactly once here, with every optional sub-field defaulting to zero/empty
//! so that later arithmetic never sees a null.

use serde::{Deserialize, Serialize};

// --- Request envelope ---

/// The outbound request envelope for one agent call.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRequest {
    /// Freshly generated per call.
    pub request_id: String,
    pub tenant: TenantDescriptor,
    pub routing: RoutingDescriptor,
    pub message: MessagePayload,
    pub sender: SenderDescriptor,
    pub conversation: ConversationRef,
    pub rag_options: RagOptions,
}

/// Tenant descriptor as the agent service expects it.
#[derive(Debug, Clone, Serialize)]
pub struct TenantDescriptor {
    pub tenant_id: i64,
    pub chatwoot_account_id: i64,
    pub chatwoot_account_name: String,
    pub chatwoot_host: String,
}

impl TenantDescriptor {
    /// Descriptor for a tenant id; the account mirrors the tenant.
    pub fn for_tenant(tenant_id: i64) -> Self {
        Self {
            tenant_id,
            chatwoot_account_id: tenant_id,
            chatwoot_account_name: format!("Tenant {tenant_id}"),
            chatwoot_host: "app.chatwoot.com".to_string(),
        }
    }
}

/// Routing descriptor: inbox plus the normalized agent type tag.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDescriptor {
    pub inbox_id: i64,
    /// One of "SDR", "COPILOT", "SUPPORT".
    pub agent_type: String,
}

/// The message content being relayed.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload {
    pub content: String,
    /// Always "text".
    pub content_type: String,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: "text".to_string(),
        }
    }
}

/// The sending contact, E.164 validated before the envelope is built.
#[derive(Debug, Clone, Serialize)]
pub struct SenderDescriptor {
    pub phone_e164: String,
}

/// Conversation reference -- an existing id, or the sentinel `"new"`.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationRef {
    pub id: String,
}

impl ConversationRef {
    /// Sentinel for a conversation the agent service has not seen yet.
    pub fn new_conversation() -> Self {
        Self {
            id: "new".to_string(),
        }
    }

    pub fn existing(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Retrieval-augmentation options. Fixed for every call.
#[derive(Debug, Clone, Serialize)]
pub struct RagOptions {
    pub enabled: bool,
    pub top_k: u32,
    pub return_chunks: bool,
    pub match_threshold: f64,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 5,
            return_chunks: true,
            match_threshold: 0.7,
        }
    }
}

// --- Response ---

/// A success response body from the agent service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub agent_output: AgentOutput,
    #[serde(default)]
    pub usage: UsageStats,
    #[serde(default)]
    pub latency_ms: i64,
}

/// The agent's produced output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentOutput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tool_calls: Vec<serde_json::Value>,
    #[serde(default)]
    pub rag_context: Vec<serde_json::Value>,
}

/// Token accounting reported by the agent service.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for UsageStats {
    fn default() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            model: default_model(),
        }
    }
}

fn default_model() -> String {
    "unknown".to_string()
}

/// The normalized internal result of one agent call.
#[derive(Debug, Clone)]
pub struct AgentResult {
    pub response_text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    pub latency_ms: i64,
    pub model: String,
    pub tool_calls: Vec<serde_json::Value>,
    pub rag_context: Vec<serde_json::Value>,
}

impl From<AgentReply> for AgentResult {
    fn from(reply: AgentReply) -> Self {
        Self {
            response_text: reply.agent_output.text,
            input_tokens: reply.usage.input_tokens,
            output_tokens: reply.usage.output_tokens,
            total_tokens: reply.usage.total_tokens,
            latency_ms: reply.latency_ms,
            model: reply.usage.model,
            tool_calls: reply.agent_output.tool_calls,
            rag_context: reply.agent_output.rag_context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_decodes_to_zero_defaults() {
        let reply: AgentReply = serde_json::from_str("{}").unwrap();
        let result = AgentResult::from(reply);
        assert_eq!(result.response_text, "");
        assert_eq!(result.input_tokens, 0);
        assert_eq!(result.output_tokens, 0);
        assert_eq!(result.total_tokens, 0);
        assert_eq!(result.latency_ms, 0);
        assert_eq!(result.model, "unknown");
        assert!(result.tool_calls.is_empty());
        assert!(result.rag_context.is_empty());
    }

    #[test]
    fn partial_body_keeps_present_fields() {
        let reply: AgentReply = serde_json::from_str(
            r#"{"agent_output": {"text": "Hi!"}, "usage": {"input_tokens": 5, "output_tokens": 3, "total_tokens": 8}}"#,
        )
        .unwrap();
        let result = AgentResult::from(reply);
        assert_eq!(result.response_text, "Hi!");
        assert_eq!(result.input_tokens, 5);
        assert_eq!(result.output_tokens, 3);
        assert_eq!(result.total_tokens, 8);
        assert_eq!(result.model, "unknown");
    }

    #[test]
    fn rag_options_default_matches_contract() {
        let options = RagOptions::default();
        assert!(options.enabled);
        assert_eq!(options.top_k, 5);
        assert!(options.return_chunks);
        assert!((options.match_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn envelope_serializes_with_expected_field_names() {
        let request = AgentRequest {
            request_id: "req_test".to_string(),
            tenant: TenantDescriptor::for_tenant(7),
            routing: RoutingDescriptor {
                inbox_id: 27,
                agent_type: "SDR".to_string(),
            },
            message: MessagePayload::text("Hello"),
            sender: SenderDescriptor {
                phone_e164: "+15551234567".to_string(),
            },
            conversation: ConversationRef::new_conversation(),
            rag_options: RagOptions::default(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tenant"]["tenant_id"], 7);
        assert_eq!(value["tenant"]["chatwoot_account_id"], 7);
        assert_eq!(value["routing"]["agent_type"], "SDR");
        assert_eq!(value["message"]["content_type"], "text");
        assert_eq!(value["conversation"]["id"], "new");
        assert_eq!(value["rag_options"]["top_k"], 5);
        assert_eq!(value["sender"]["phone_e164"], "+15551234567");
    }
}
