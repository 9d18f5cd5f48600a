//! `posty-worker` -- command-line runner for the Posty token economy.
//!
//! Operates on an on-disk store so successive invocations share state, and
//! prints the resulting snapshot as JSON on stdout. Logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable         | Required | Default        | Description                      |
//! |------------------|----------|----------------|----------------------------------|
//! | `POSTY_DATA_DIR` | no       | `./posty-data` | Directory holding one file per key |
//! | `POSTY_*`        | no       | see `EconomyConfig::from_env` | Economy tunables    |
//! | `RUST_LOG`       | no       | `posty_worker=info,posty_economy=info` | Log filter |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use posty_core::account::TokenAccount;
use posty_core::badge::{BadgeNotification, NotificationType};
use posty_core::clock::SystemClock;
use posty_core::config::EconomyConfig;
use posty_core::earn::EarnOutcome;
use posty_core::plan::Plan;
use posty_economy::{Economy, LoggingSink, PushContent, PushMessage, DEFAULT_SPEND_SOURCE};
use posty_store::FileStore;

/// Default directory for the file store.
const DEFAULT_DATA_DIR: &str = "./posty-data";

#[derive(Debug, Parser)]
#[command(name = "posty-worker", version, about = "Posty token economy runner")]
struct Cli {
    /// Store directory (overrides `POSTY_DATA_DIR`).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the account and badge state.
    Status,
    /// Request reward tokens.
    Earn { amount: u32, source: String },
    /// Spend tokens.
    Spend {
        amount: u32,
        #[arg(default_value = DEFAULT_SPEND_SOURCE)]
        source: String,
    },
    /// Switch subscription plan.
    Plan {
        #[arg(value_parser = parse_plan)]
        plan: Plan,
    },
    /// Simulate a received push notification.
    Notify {
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long, default_value = "mission")]
        kind: String,
    },
    /// Mark one notification read.
    Read { id: String },
    /// Mark every notification of a type read.
    Visit {
        #[arg(value_parser = parse_kind)]
        kind: NotificationType,
    },
    /// Zero the badge and mark everything read.
    ClearBadge,
    /// Remove every stored key.
    DeleteAccount,
}

fn parse_plan(s: &str) -> Result<Plan, String> {
    Plan::from_name(s).map_err(|e| e.to_string())
}

fn parse_kind(s: &str) -> Result<NotificationType, String> {
    NotificationType::parse(s).map_err(|e| e.to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    account: TokenAccount,
    spendable: u32,
    remaining_earn_quota: u32,
    spent_today: u32,
    badge_count: u32,
    notifications: Vec<BadgeNotification>,
}

#[derive(Debug, Serialize)]
struct EarnReport {
    outcome: EarnOutcome,
    account: TokenAccount,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posty_worker=info,posty_economy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = EconomyConfig::from_env().context("invalid economy configuration")?;
    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("POSTY_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let store = FileStore::open(&data_dir)
        .await
        .with_context(|| format!("cannot open store at {}", data_dir.display()))?;
    tracing::debug!(data_dir = %data_dir.display(), "Store opened");

    let economy = Economy::new(
        Arc::new(store),
        Arc::new(LoggingSink),
        Arc::new(SystemClock),
        config,
    );
    economy.initialize().await;

    run(&economy, cli.command).await
}

async fn run(economy: &Economy, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Status => print(&status(economy).await),
        Command::Earn { amount, source } => {
            let outcome = economy.governor.earn(amount, &source).await?;
            print(&EarnReport {
                outcome,
                account: economy.ledger.snapshot(),
            })
        }
        Command::Spend { amount, source } => {
            let account = economy.ledger.spend(amount, &source).await?;
            print(&account)
        }
        Command::Plan { plan } => {
            let account = economy.ledger.set_plan(plan).await?;
            print(&account)
        }
        Command::Notify { title, body, kind } => {
            let mut data = std::collections::HashMap::new();
            data.insert("type".to_string(), kind);
            economy
                .ingest
                .handle_push_notification(PushMessage {
                    notification: Some(PushContent {
                        title: Some(title),
                        body: Some(body),
                    }),
                    data,
                })
                .await;
            print(&status(economy).await)
        }
        Command::Read { id } => {
            economy.badges.mark_read(&id).await?;
            print(&status(economy).await)
        }
        Command::Visit { kind } => {
            economy.badges.mark_screen_visited(kind).await?;
            print(&status(economy).await)
        }
        Command::ClearBadge => {
            economy.badges.clear_all().await?;
            print(&status(economy).await)
        }
        Command::DeleteAccount => {
            economy.delete_account().await?;
            tracing::info!("All economy keys removed");
            Ok(())
        }
    }
}

async fn status(economy: &Economy) -> Status {
    let account = economy.ledger.snapshot();
    Status {
        spendable: account.spendable(),
        remaining_earn_quota: economy.ledger.remaining_earn_quota(),
        spent_today: economy.activity.spent_today().await,
        account,
        badge_count: economy.badges.count(),
        notifications: economy.badges.notifications(),
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
