// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end turn pipeline testing.
//!
//! `TurnHarness` assembles a complete pipeline against a temp SQLite
//! database and a wiremock agent endpoint, with the master settings row
//! pointing at the mock. Provides `send()` to drive a full turn in tests.

use parley_agent_api::{AgentClient, AgentEndpoint};
use parley_core::ParleyError;
use parley_storage::queries::settings::set_master_settings;
use parley_storage::{Database, MasterSettings};
use parley_turn::{TurnOutcome, TurnPipeline, TurnRequest};
use parley_usage::UsageLedger;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// E.164 phone used by default requests.
pub const TEST_PHONE: &str = "+15551234567";

/// Default tenant/inbox identifiers used by [`TurnHarness::send`].
pub const TEST_TENANT: &str = "1";
pub const TEST_INBOX: &str = "10";

/// Builder for creating test environments with configurable options.
pub struct TurnHarnessBuilder {
    agent_timeout_ms: u64,
    master_settings: bool,
}

impl TurnHarnessBuilder {
    fn new() -> Self {
        Self {
            agent_timeout_ms: 5_000,
            master_settings: true,
        }
    }

    /// Override the agent call timeout stored in master settings.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.agent_timeout_ms = timeout_ms;
        self
    }

    /// Leave the master_settings table empty so the pipeline exercises the
    /// configured fallback endpoint.
    pub fn without_master_settings(mut self) -> Self {
        self.master_settings = false;
        self
    }

    /// Build the harness: temp database, mock agent server, assembled pipeline.
    pub async fn build(self) -> Result<TurnHarness, ParleyError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| ParleyError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;

        let agent_server = MockServer::start().await;

        if self.master_settings {
            set_master_settings(
                &db,
                &MasterSettings {
                    agent_endpoint: agent_server.uri(),
                    agent_timeout_ms: self.agent_timeout_ms,
                },
            )
            .await?;
        }

        let usage = UsageLedger::new(db.connection().clone());
        let agent = AgentClient::new()?;
        // The fallback also points at the mock so no-settings runs stay local.
        let fallback = AgentEndpoint::new(agent_server.uri(), self.agent_timeout_ms);
        let pipeline = TurnPipeline::new(db.clone(), usage.clone(), agent, fallback);

        Ok(TurnHarness {
            pipeline,
            db,
            usage,
            agent_server,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully assembled turn pipeline over a temp database and a mock agent.
pub struct TurnHarness {
    pub pipeline: TurnPipeline,
    pub db: Database,
    pub usage: UsageLedger,
    pub agent_server: MockServer,
    _temp_dir: tempfile::TempDir,
}

impl TurnHarness {
    pub fn builder() -> TurnHarnessBuilder {
        TurnHarnessBuilder::new()
    }

    /// Mount a 200 response for an agent route (e.g. `/sdr`).
    pub async fn mock_agent_reply(&self, route: &str, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.agent_server)
            .await;
    }

    /// A default SDR turn request for `message`.
    pub fn request(message: &str) -> TurnRequest {
        TurnRequest {
            message: message.to_string(),
            conversation_id: None,
            agent_type: "SDR".to_string(),
            user_phone: TEST_PHONE.to_string(),
            user_name: Some("Test Contact".to_string()),
        }
    }

    /// Drive one default-tenant turn through the pipeline.
    pub async fn send(&self, message: &str) -> Result<TurnOutcome, ParleyError> {
        self.pipeline
            .handle_turn(TEST_TENANT, TEST_INBOX, Self::request(message))
            .await
    }

    /// Drive an explicit request through the pipeline.
    pub async fn send_request(
        &self,
        tenant: &str,
        inbox: &str,
        request: TurnRequest,
    ) -> Result<TurnOutcome, ParleyError> {
        self.pipeline.handle_turn(tenant, inbox, request).await
    }
}

/// A canned agent success body with `total_tokens = input + output`.
pub fn agent_reply_body(text: &str, input_tokens: u32, output_tokens: u32) -> serde_json::Value {
    serde_json::json!({
        "agent_output": {
            "text": text,
            "tool_calls": [],
            "rag_context": []
        },
        "usage": {
            "input_tokens": input_tokens,
            "output_tokens": output_tokens,
            "total_tokens": input_tokens + output_tokens,
            "model": "mock-model"
        },
        "latency_ms": 12
    })
}
