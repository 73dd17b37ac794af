//! Hackfest - Operator Entry Point
//!
//! Runs migrations and the organizer actions that are useful outside a
//! request cycle.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use hackfest::{
    config::{LogFormat, CONFIG},
    db::{self, PgStore},
    models::{Principal, WallClock},
    notify::{LogNotifier, Notifier, RedisNotifier},
    services::{RankedProject, ReleaseService},
    state::AppState,
};

#[derive(Parser)]
#[command(name = "hackfest", about = "Hackathon lifecycle engine operator tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,

    /// Release judging for an event and queue result notifications
    Release {
        /// Event ID
        #[arg(long)]
        event: Uuid,

        /// Organizer performing the release
        #[arg(long)]
        organizer: Uuid,
    },

    /// Print the released standings of an event
    Standings {
        /// Event ID
        #[arg(long)]
        event: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| CONFIG.logging.rust_log.clone().into());
    match CONFIG.logging.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    CONFIG.engine.validate()?;

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&CONFIG.database).await?;
    db::test_connection(&db_pool).await?;

    match cli.command {
        Command::Migrate => {
            tracing::info!("Running database migrations...");
            db::run_migrations(&db_pool).await?;
            tracing::info!("Migrations applied");
        }
        Command::Release { event, organizer } => {
            let notifier = connect_notifier().await;
            let state = AppState::new(
                Arc::new(PgStore::new(db_pool)),
                notifier,
                Arc::new(WallClock),
                CONFIG.engine.clone(),
            );

            let outcome = ReleaseService::release_judging(&state, Principal::organizer(organizer), event)
                .await
                .context("release failed")?;

            if let Some(dispatch) = outcome.dispatch {
                let delivered = dispatch.await?;
                tracing::info!(delivered, "Notification hand-off finished");
            } else {
                tracing::info!("Judging was already released; no notifications sent");
            }
            print_rankings(&outcome.rankings)?;
        }
        Command::Standings { event } => {
            let state = AppState::new(
                Arc::new(PgStore::new(db_pool)),
                Arc::new(LogNotifier),
                Arc::new(WallClock),
                CONFIG.engine.clone(),
            );
            let standings = ReleaseService::standings(&state, event).await?;
            print_rankings(&standings)?;
        }
    }

    Ok(())
}

/// Queue notifications on Redis, or only log them when Redis is unreachable
async fn connect_notifier() -> Arc<dyn Notifier> {
    tracing::info!("Connecting to Redis...");
    match RedisNotifier::connect(&CONFIG.redis).await {
        Ok(notifier) => {
            tracing::info!(queue = notifier.queue(), "Notifications go to Redis");
            Arc::new(notifier)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

fn print_rankings(rankings: &[RankedProject]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(rankings)?);
    Ok(())
}
