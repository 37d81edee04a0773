use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;

use forgemirror::db;
use forgemirror::pending::process_pending;
use forgemirror::webhook::{DELIVERY_RETENTION, prune_deliveries};

use crate::config::Config;
use crate::routes::{AppState, build_router};
use crate::shutdown;
use crate::tasks::TaskPool;

const PENDING_DRAIN_INTERVAL: Duration = Duration::from_secs(60);
const DELIVERY_PRUNE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub(crate) async fn handle_serve(
    bind_override: Option<String>,
    config: Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(db::connect_and_migrate(database_url).await?);

    if config.webhook.secret.is_none() {
        tracing::warn!("webhook.secret is not configured; webhook deliveries will be rejected");
    }

    let bind = bind_override.unwrap_or_else(|| config.server.bind.clone());
    let config = Arc::new(config);
    let tasks = TaskPool::new();
    let state = AppState {
        db: db.clone(),
        config,
        tasks: tasks.clone(),
    };

    spawn_pending_drain(&tasks, state.clone());
    spawn_delivery_prune(&tasks, db);

    let app = build_router(state);
    let listener = TcpListener::bind(&bind).await?;
    tracing::info!("listening on {bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    tracing::info!("listener stopped, draining background tasks");
    tasks.shutdown(SHUTDOWN_GRACE).await;

    Ok(())
}

/// Replays parked webhook events whose retry time has come due.
fn spawn_pending_drain(tasks: &TaskPool, state: AppState) {
    let mut stop = tasks.subscribe();
    tasks.spawn("pending drain", async move {
        let mut tick = tokio::time::interval(PENDING_DRAIN_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match process_pending(&state.db, &state.config.retry_policy()).await {
                        Ok(stats) if stats.applied + stats.rescheduled + stats.failed > 0 => {
                            tracing::info!(
                                "pending drain: {} applied, {} rescheduled, {} failed",
                                stats.applied,
                                stats.rescheduled,
                                stats.failed
                            );
                        }
                        Ok(_) => {}
                        Err(err) => tracing::error!("pending drain failed: {err}"),
                    }
                }
                _ = stop.changed() => break,
            }
        }
    });
}

/// Deletes processed delivery rows older than the retention window.
fn spawn_delivery_prune(tasks: &TaskPool, db: Arc<DatabaseConnection>) {
    let mut stop = tasks.subscribe();
    tasks.spawn("delivery prune", async move {
        let mut tick = tokio::time::interval(DELIVERY_PRUNE_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match prune_deliveries(&db, DELIVERY_RETENTION).await {
                        Ok(0) => {}
                        Ok(n) => tracing::info!("pruned {n} processed delivery rows"),
                        Err(err) => tracing::error!("delivery prune failed: {err}"),
                    }
                }
                _ = stop.changed() => break,
            }
        }
    });
}
