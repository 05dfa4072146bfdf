// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a multi-tenant conversation relay.
//!
//! This binary is a thin driver over the turn pipeline: it loads and
//! validates configuration, initializes tracing, and exposes one-shot
//! subcommands for sending a turn and inspecting conversations and usage.

use clap::{Parser, Subcommand};
use parley_config::ParleyConfig;
use parley_core::{ConversationId, ParleyError, TenantContext};
use parley_storage::Database;
use parley_storage::queries::{conversations, messages};
use parley_turn::{TurnPipeline, TurnRequest};
use parley_usage::UsageLedger;

/// Parley - route chat turns through the conversation pipeline.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one chat turn through the pipeline and print the outcome.
    Turn {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        inbox: String,
        #[arg(long)]
        message: String,
        /// E.164 contact phone.
        #[arg(long)]
        phone: String,
        /// Agent type tag; unrecognized values route to SDR.
        #[arg(long, default_value = "SDR")]
        agent_type: String,
        #[arg(long)]
        name: Option<String>,
        /// Existing conversation id to continue.
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Print a conversation's messages in slot order.
    History {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        inbox: String,
        #[arg(long)]
        conversation: String,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// List an inbox's conversations, most recent activity first.
    Conversations {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        inbox: String,
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Print the daily usage window and totals for an inbox.
    Usage {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        inbox: String,
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match parley_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let result = match cli.command {
        Commands::Turn {
            tenant,
            inbox,
            message,
            phone,
            agent_type,
            name,
            conversation,
        } => {
            run_turn(
                &config,
                &tenant,
                &inbox,
                TurnRequest {
                    message,
                    conversation_id: conversation,
                    agent_type,
                    user_phone: phone,
                    user_name: name,
                },
            )
            .await
        }
        Commands::History {
            tenant,
            inbox,
            conversation,
            limit,
            offset,
        } => run_history(&config, &tenant, &inbox, &conversation, limit, offset).await,
        Commands::Conversations {
            tenant,
            inbox,
            limit,
            offset,
        } => run_conversations(&config, &tenant, &inbox, limit, offset).await,
        Commands::Usage {
            tenant,
            inbox,
            days,
        } => run_usage(&config, &tenant, &inbox, days).await,
    };

    if let Err(e) = result {
        eprintln!("parley: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_turn(
    config: &ParleyConfig,
    tenant: &str,
    inbox: &str,
    request: TurnRequest,
) -> Result<(), ParleyError> {
    let pipeline = TurnPipeline::connect(config).await?;
    let outcome = pipeline.handle_turn(tenant, inbox, request).await?;
    print_json(&outcome)
}

async fn run_history(
    config: &ParleyConfig,
    tenant: &str,
    inbox: &str,
    conversation: &str,
    limit: Option<i64>,
    offset: i64,
) -> Result<(), ParleyError> {
    let ctx = TenantContext::resolve(tenant, inbox)?;
    let db = Database::open_with(&config.storage).await?;
    let records = messages::list_messages(
        &db,
        ctx.tenant_id,
        &ConversationId(conversation.to_string()),
        limit,
        offset,
    )
    .await?;
    print_json(&records)
}

async fn run_conversations(
    config: &ParleyConfig,
    tenant: &str,
    inbox: &str,
    limit: i64,
    offset: i64,
) -> Result<(), ParleyError> {
    let ctx = TenantContext::resolve(tenant, inbox)?;
    let db = Database::open_with(&config.storage).await?;
    let listing = conversations::list_conversations(&db, &ctx, limit, offset).await?;
    print_json(&listing)
}

async fn run_usage(
    config: &ParleyConfig,
    tenant: &str,
    inbox: &str,
    days: i64,
) -> Result<(), ParleyError> {
    let ctx = TenantContext::resolve(tenant, inbox)?;
    let db = Database::open_with(&config.storage).await?;
    let ledger = UsageLedger::new(db.connection().clone());
    let window = ledger.daily_window(&ctx, days).await?;
    let totals = ledger.totals(&ctx).await?;
    print_json(&serde_json::json!({
        "daily": window,
        "totals": totals,
    }))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), ParleyError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| ParleyError::Internal(format!("failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}
