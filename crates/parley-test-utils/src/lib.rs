// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Parley workspace.
//!
//! The harness stands up the full turn pipeline against a temp database and
//! a wiremock agent endpoint so integration tests can drive whole turns.

pub mod harness;

pub use harness::{
    TEST_INBOX, TEST_PHONE, TEST_TENANT, TurnHarness, TurnHarnessBuilder, agent_reply_body,
};
