use clap::ValueEnum;
use forgemirror::SyncStateModel;
use forgemirror::db;
use forgemirror::sync::list_sync_states;

/// Output format for the status display.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// One sync-state row shaped for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
struct SyncStateDisplay {
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Synced")]
    last_synced: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl SyncStateDisplay {
    fn from_state(row: &SyncStateModel) -> Self {
        Self {
            unit: row.unit_label(),
            status: row.status.to_string(),
            last_synced: row
                .last_synced_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
            error: row.last_error.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub(crate) async fn handle_status(
    user: &str,
    output: OutputFormat,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;
    let rows = list_sync_states(&db, user).await?;

    if rows.is_empty() {
        println!("No sync state for account '{user}'.");
        return Ok(());
    }

    let items: Vec<_> = rows.iter().map(SyncStateDisplay::from_state).collect();
    match output {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(items);
            table.with(tabled::settings::Style::rounded());
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }

    Ok(())
}
