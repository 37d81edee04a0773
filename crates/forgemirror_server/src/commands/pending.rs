use forgemirror::db;
use forgemirror::pending::{list_failed, process_pending, requeue};

use crate::PendingAction;
use crate::config::Config;

pub(crate) async fn handle_pending(
    action: PendingAction,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;

    match action {
        PendingAction::Process => {
            let stats = process_pending(&db, &config.retry_policy()).await?;
            println!(
                "Processed pending events: {} applied, {} rescheduled, {} failed.",
                stats.applied, stats.rescheduled, stats.failed
            );
        }
        PendingAction::Failed { user } => {
            let rows = list_failed(&db, user.as_deref()).await?;
            if rows.is_empty() {
                println!("No failed pending events.");
            } else {
                for row in rows {
                    println!(
                        "{}  {}  {}  attempts={}  {}",
                        row.id,
                        row.user_id,
                        row.event,
                        row.attempts,
                        row.last_error.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        PendingAction::Requeue { id } => {
            requeue(&db, id).await?;
            println!("Requeued pending event {id}.");
        }
    }

    Ok(())
}
