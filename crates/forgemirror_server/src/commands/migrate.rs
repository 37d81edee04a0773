use forgemirror::db;
use forgemirror::migration::{Migrator, MigratorTrait};

use crate::MigrateAction;

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            println!("Applying pending migrations...");
            Migrator::up(&db, None).await?;
            println!("Schema is up to date.");
        }
        MigrateAction::Down => {
            println!("Reverting the most recent migration...");
            Migrator::down(&db, Some(1)).await?;
            println!("Reverted.");
        }
        MigrateAction::Status => {
            Migrator::status(&db).await?;
        }
        MigrateAction::Fresh => {
            // Mirrored rows are re-fetchable, so a rebuild only costs a full sync.
            println!("Dropping all tables and rebuilding the schema...");
            Migrator::fresh(&db).await?;
            println!("Schema rebuilt; run a full sync to repopulate the mirror.");
        }
    }

    Ok(())
}
