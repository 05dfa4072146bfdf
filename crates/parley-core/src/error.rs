// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley conversation relay.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Parley crates.
///
/// Client-input errors (`InvalidTenant`, `InvalidInbox`, `EmptyMessage`,
/// `InvalidPhoneFormat`) are raised before any write or external call.
/// `SequencingConflict` is transient and retried inside the storage layer;
/// it escapes only when retries are exhausted. Agent failures are split so
/// callers can distinguish a slow agent from a rejected call.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller-supplied tenant identifier is not well-formed.
    #[error("invalid tenant identifier: `{0}`")]
    InvalidTenant(String),

    /// The caller-supplied inbox identifier is not well-formed.
    #[error("invalid inbox identifier: `{0}`")]
    InvalidInbox(String),

    /// The inbound turn carried an empty message body.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Contact phone does not match the E.164 shape required by the agent contract.
    #[error("invalid phone format: expected E.164, got `{phone}`")]
    InvalidPhoneFormat { phone: String },

    /// A concurrent writer won the slot race and retries were exhausted.
    #[error("slot conflict on conversation {conversation_id} after {attempts} attempts")]
    SequencingConflict {
        conversation_id: String,
        attempts: u32,
    },

    /// The agent call exceeded the configured timeout; no partial response is used.
    #[error("agent call timed out after {duration:?}")]
    AgentTimeout { duration: Duration },

    /// The agent rejected the call with a non-2xx status. The response body
    /// is deliberately not carried here.
    #[error("agent returned status {status}")]
    Agent { status: u16 },

    /// The agent endpoint could not be reached at all (no HTTP status exists).
    #[error("agent unreachable: {source}")]
    AgentUnreachable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// True for errors caused by malformed caller input, surfaced before any
    /// write or external call.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ParleyError::InvalidTenant(_)
                | ParleyError::InvalidInbox(_)
                | ParleyError::EmptyMessage
                | ParleyError::InvalidPhoneFormat { .. }
        )
    }
}
