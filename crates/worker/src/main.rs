//! Overdue sweep entry point.
//!
//! Runs a single sweep and exits, so it can be scheduled externally (cron,
//! a Kubernetes CronJob). Exit code 0 on success, 1 on failure.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unilib_events::{mailer_from_env, EventBus, Links, NotificationDispatcher};
use unilib_lifecycle::{Lifecycle, SweepReport};

/// How long to wait for queued notifications after the sweep.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unilib_worker=info,unilib_lifecycle=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(report) => {
            tracing::info!(
                examined = report.examined,
                fines_created = report.fines_created,
                "Processed {} overdue borrows",
                report.fines_created
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "Overdue sweep failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<SweepReport> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = unilib_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    unilib_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    let base_url =
        std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let mailer = mailer_from_env().context("Failed to configure email delivery")?;

    let bus = Arc::new(EventBus::default());
    let dispatcher = NotificationDispatcher::new(pool.clone(), mailer, Links::new(base_url));
    let dispatcher_handle = tokio::spawn(dispatcher.run(bus.subscribe()));

    let lifecycle = Lifecycle::new(pool, Arc::clone(&bus));
    let today = chrono::Utc::now().date_naive();
    let report = lifecycle.sweep_overdue(today).await;

    // Close the channel so the dispatcher finishes the queued deliveries.
    drop(lifecycle);
    drop(bus);
    if tokio::time::timeout(DRAIN_TIMEOUT, dispatcher_handle).await.is_err() {
        tracing::warn!("Timed out waiting for notification delivery");
    }

    Ok(report?)
}
