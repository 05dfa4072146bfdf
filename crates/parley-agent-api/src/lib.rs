// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the external conversational agent service.
//!
//! Builds the outbound request envelope, enforces payload invariants (E.164
//! sender phone, normalized routing tag), performs the call with a
//! tenant-configured timeout, and decodes the heterogeneous response shape
//! into [`AgentResult`] once at the boundary.

pub mod client;
pub mod types;

pub use client::{AgentCall, AgentClient, AgentEndpoint};
pub use types::{AgentReply, AgentRequest, AgentResult, RagOptions};
