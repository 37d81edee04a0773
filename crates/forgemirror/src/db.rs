//! Database connection helpers.

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Apply SQLite pragmas suited to a long-lived mirror process.
///
/// WAL keeps readers from blocking the sync writers, the busy timeout rides
/// out short lock contention between the webhook ingest path and background
/// sync tasks, and NORMAL synchronous is safe under WAL.
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    for pragma in [
        "PRAGMA journal_mode=WAL",
        "PRAGMA busy_timeout=5000",
        "PRAGMA synchronous=NORMAL",
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

/// Connect to the database named by `database_url`.
///
/// SQLite connections get WAL journaling, a 5 second busy timeout, and
/// NORMAL synchronous mode.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Connect and bring the schema up to date.
///
/// This is the entry point applications should use; it runs every pending
/// migration before returning the connection.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or a migration
/// fails.
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}
