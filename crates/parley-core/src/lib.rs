// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley conversation relay.
//!
//! This crate provides the error taxonomy, domain identifiers, the tenant
//! isolation context, and E.164 phone validation used throughout the Parley
//! workspace.

pub mod error;
pub mod phone;
pub mod tenant;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use phone::validate_e164;
pub use tenant::TenantContext;
pub use types::{
    AgentKind, ConversationId, InboxId, MessageId, Role, TenantId, TokenUsage, TurnEntry,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parley_error_has_all_variants() {
        let _config = ParleyError::Config("test".into());
        let _tenant = ParleyError::InvalidTenant("x".into());
        let _inbox = ParleyError::InvalidInbox("x".into());
        let _empty = ParleyError::EmptyMessage;
        let _phone = ParleyError::InvalidPhoneFormat {
            phone: "+1".into(),
        };
        let _conflict = ParleyError::SequencingConflict {
            conversation_id: "c".into(),
            attempts: 3,
        };
        let _timeout = ParleyError::AgentTimeout {
            duration: std::time::Duration::from_millis(30_000),
        };
        let _agent = ParleyError::Agent { status: 502 };
        let _unreachable = ParleyError::AgentUnreachable {
            source: Box::new(std::io::Error::other("test")),
        };
        let _storage = ParleyError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _internal = ParleyError::Internal("test".into());
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(ParleyError::InvalidTenant("x".into()).is_client_error());
        assert!(ParleyError::InvalidInbox("x".into()).is_client_error());
        assert!(ParleyError::EmptyMessage.is_client_error());
        assert!(
            ParleyError::InvalidPhoneFormat {
                phone: "+1".into()
            }
            .is_client_error()
        );
        assert!(!ParleyError::Agent { status: 500 }.is_client_error());
        assert!(
            !ParleyError::AgentTimeout {
                duration: std::time::Duration::from_secs(1),
            }
            .is_client_error()
        );
    }

    #[test]
    fn agent_error_does_not_leak_body() {
        let err = ParleyError::Agent { status: 502 };
        assert_eq!(err.to_string(), "agent returned status 502");
    }
}
