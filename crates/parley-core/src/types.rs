// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the Parley workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable integer identity of a tenant -- the isolation boundary for all
/// conversation, message, and usage data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub i64);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer identity of an inbox, a tenant-scoped channel for conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InboxId(pub i64);

impl std::fmt::Display for InboxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, globally unique identity of a conversation (UUID v4 text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Generate a fresh conversation identity.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Lenient candidate check: a caller-supplied conversation id is used
    /// only when it parses as a UUID. Anything else falls through to
    /// conversation creation -- client-provided junk never blocks a turn.
    pub fn parse_candidate(candidate: &str) -> Option<Self> {
        uuid::Uuid::parse_str(candidate)
            .ok()
            .map(|u| Self(u.to_string()))
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a fresh message identity.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a turn a message belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// The kind of conversational agent a conversation is routed to.
///
/// Stored values use the `chat_*` form; the external wire contract uses the
/// uppercase tags (see [`AgentKind::wire_tag`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AgentKind {
    #[strum(serialize = "chat_sdr")]
    #[serde(rename = "chat_sdr")]
    Sdr,
    #[strum(serialize = "chat_closer")]
    #[serde(rename = "chat_closer")]
    Closer,
    #[strum(serialize = "chat_support")]
    #[serde(rename = "chat_support")]
    Support,
}

impl AgentKind {
    /// Map a caller-supplied agent-type tag to a known kind.
    ///
    /// Recognizes both the external tags (`SDR`, `COPILOT`, `CLOSER`,
    /// `SUPPORT`) and the stored `chat_*` values, case-insensitively. The
    /// final arm is a deliberate fallback: any unrecognized tag routes to
    /// the SDR agent rather than failing the turn.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "SDR" | "CHAT_SDR" => AgentKind::Sdr,
            "COPILOT" | "CLOSER" | "CHAT_CLOSER" => AgentKind::Closer,
            "SUPPORT" | "CHAT_SUPPORT" => AgentKind::Support,
            _ => AgentKind::Sdr,
        }
    }

    /// Route suffix appended to the agent endpoint base URL.
    pub fn route_suffix(&self) -> &'static str {
        match self {
            AgentKind::Sdr => "/sdr",
            AgentKind::Closer => "/copilot",
            AgentKind::Support => "/support",
        }
    }

    /// Tag carried in the outbound request envelope's routing descriptor.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            AgentKind::Sdr => "SDR",
            AgentKind::Closer => "COPILOT",
            AgentKind::Support => "SUPPORT",
        }
    }
}

/// Token counts for one agent reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// One `{role, content}` pair in the turn-taking history format the external
/// agent expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub role: Role,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn agent_kind_from_tag_recognizes_external_tags() {
        assert_eq!(AgentKind::from_tag("SDR"), AgentKind::Sdr);
        assert_eq!(AgentKind::from_tag("COPILOT"), AgentKind::Closer);
        assert_eq!(AgentKind::from_tag("CLOSER"), AgentKind::Closer);
        assert_eq!(AgentKind::from_tag("SUPPORT"), AgentKind::Support);
    }

    #[test]
    fn agent_kind_from_tag_recognizes_stored_values() {
        assert_eq!(AgentKind::from_tag("chat_sdr"), AgentKind::Sdr);
        assert_eq!(AgentKind::from_tag("chat_closer"), AgentKind::Closer);
        assert_eq!(AgentKind::from_tag("chat_support"), AgentKind::Support);
    }

    #[test]
    fn agent_kind_unrecognized_tag_falls_back_to_sdr() {
        assert_eq!(AgentKind::from_tag(""), AgentKind::Sdr);
        assert_eq!(AgentKind::from_tag("garbage"), AgentKind::Sdr);
        assert_eq!(AgentKind::from_tag("chat_unknown"), AgentKind::Sdr);
    }

    #[test]
    fn agent_kind_route_suffixes() {
        assert_eq!(AgentKind::Sdr.route_suffix(), "/sdr");
        assert_eq!(AgentKind::Closer.route_suffix(), "/copilot");
        assert_eq!(AgentKind::Support.route_suffix(), "/support");
    }

    #[test]
    fn agent_kind_display_round_trips_through_from_str() {
        for kind in [AgentKind::Sdr, AgentKind::Closer, AgentKind::Support] {
            let stored = kind.to_string();
            let parsed = AgentKind::from_str(&stored).expect("stored tag should parse back");
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn role_display_is_lowercase() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::from_str("assistant").unwrap(), Role::Assistant);
    }

    #[test]
    fn conversation_id_candidate_accepts_uuid_only() {
        let valid = "0191d2a8-5f2e-7c3b-b2aa-0e9f4c8d1a2b";
        assert!(ConversationId::parse_candidate(valid).is_some());
        assert!(ConversationId::parse_candidate("").is_none());
        assert!(ConversationId::parse_candidate("not-a-uuid").is_none());
        assert!(ConversationId::parse_candidate("12345").is_none());
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(ConversationId::generate(), ConversationId::generate());
        assert_ne!(MessageId::generate(), MessageId::generate());
    }
}
