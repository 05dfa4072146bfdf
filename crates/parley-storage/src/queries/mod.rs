// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Every query takes a [`TenantContext`] (or at least a
//! tenant id) and binds it as a SQL parameter -- tenant isolation is applied
//! on every storage access, never via interpolated session state.
//!
//! [`TenantContext`]: parley_core::TenantContext

pub mod conversations;
pub mod messages;
pub mod settings;

/// Current UTC time in the ISO 8601 millisecond format used across tables.
pub(crate) fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
