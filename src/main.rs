use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tu_report_core::core::config::Config;
use tu_report_core::core::database;
use tu_report_core::features::dispatch::{AssignmentRuleService, Dispatcher};
use tu_report_core::features::notifications::{LogNotifier, Notifier};
use tu_report_core::modules::postgres::{PgNotifier, PgStore};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded: tokio_worker_threads={}, max_commit_attempts={}, pid={}",
        worker_threads,
        config.dispatch.max_commit_attempts,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let store = Arc::new(PgStore::new(pool.clone()));

    let notifier: Arc<dyn Notifier> = if config.notifications.persist {
        Arc::new(PgNotifier::new(pool.clone()))
    } else {
        Arc::new(LogNotifier)
    };
    tracing::info!(
        "Notifier initialized (persist={})",
        config.notifications.persist
    );

    let rule_service = AssignmentRuleService::new(store.clone());
    let rule = rule_service.ensure_default().await?;
    tracing::info!(
        "Active assignment rule: max_open_tickets={}, weight_distance={}, weight_workload={}",
        rule.max_open_tickets,
        rule.weight_distance,
        rule.weight_workload
    );

    if config.dispatch.redispatch_on_boot {
        let dispatcher = Dispatcher::new(
            store.clone(),
            store.clone(),
            store.clone(),
            notifier,
            config.dispatch.clone(),
        );
        let summary = dispatcher.redispatch_unassigned(&rule).await?;
        tracing::info!(
            "Boot re-dispatch finished: attempted={}, assigned={}, failed={}",
            summary.attempted,
            summary.assigned,
            summary.failed
        );
    }

    pool.close().await;
    tracing::info!("Bootstrap complete");

    Ok(())
}
