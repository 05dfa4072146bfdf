// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant isolation context.
//!
//! A [`TenantContext`] is resolved once per request from the caller-supplied
//! identifiers (already authenticated upstream) and is required by every
//! storage query. Queries bind the tenant id as a SQL parameter -- caller
//! values are never interpolated into statement text.

use serde::{Deserialize, Serialize};

use crate::error::ParleyError;
use crate::types::{InboxId, TenantId};

/// Validated isolation context carried through one request.
///
/// Resolution validates shape only; existence of the tenant and inbox is
/// enforced by referential integrity at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    pub inbox_id: InboxId,
}

impl TenantContext {
    /// Build a context from already-typed identifiers.
    pub fn new(tenant_id: TenantId, inbox_id: InboxId) -> Self {
        Self {
            tenant_id,
            inbox_id,
        }
    }

    /// Resolve a context from the raw identifiers a caller supplies.
    ///
    /// Fails with `InvalidTenant`/`InvalidInbox` when an identifier is not a
    /// positive integer.
    pub fn resolve(tenant: &str, inbox: &str) -> Result<Self, ParleyError> {
        let tenant_id = tenant
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ParleyError::InvalidTenant(tenant.to_string()))?;

        let inbox_id = inbox
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ParleyError::InvalidInbox(inbox.to_string()))?;

        Ok(Self {
            tenant_id: TenantId(tenant_id),
            inbox_id: InboxId(inbox_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_accepts_positive_integers() {
        let ctx = TenantContext::resolve("7", "42").unwrap();
        assert_eq!(ctx.tenant_id, TenantId(7));
        assert_eq!(ctx.inbox_id, InboxId(42));
    }

    #[test]
    fn resolve_trims_whitespace() {
        let ctx = TenantContext::resolve(" 3 ", " 9 ").unwrap();
        assert_eq!(ctx.tenant_id, TenantId(3));
        assert_eq!(ctx.inbox_id, InboxId(9));
    }

    #[test]
    fn resolve_rejects_non_integer_tenant() {
        let err = TenantContext::resolve("abc", "1").unwrap_err();
        assert!(matches!(err, ParleyError::InvalidTenant(_)));
    }

    #[test]
    fn resolve_rejects_non_integer_inbox() {
        let err = TenantContext::resolve("1", "uuid-like-junk").unwrap_err();
        assert!(matches!(err, ParleyError::InvalidInbox(_)));
    }

    #[test]
    fn resolve_rejects_non_positive_identifiers() {
        assert!(matches!(
            TenantContext::resolve("0", "1").unwrap_err(),
            ParleyError::InvalidTenant(_)
        ));
        assert!(matches!(
            TenantContext::resolve("1", "-5").unwrap_err(),
            ParleyError::InvalidInbox(_)
        ));
    }
}
