// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn orchestration for the Parley conversation relay.
//!
//! A turn is one full user-message -> agent-reply cycle. [`TurnPipeline`]
//! owns the transactional boundary: it resolves the tenant context, resolves
//! or creates the conversation, records the user message, reconstructs
//! history, calls the agent service, records the reply, and rolls usage into
//! the daily ledger.

pub mod history;
pub mod pipeline;

pub use history::{load_history, project_history};
pub use pipeline::{
    AssistantMessage, TurnOutcome, TurnPipeline, TurnRequest, TurnState, UserMessage,
};
