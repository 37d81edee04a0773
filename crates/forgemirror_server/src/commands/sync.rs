use forgemirror::db;
use forgemirror::sync::{
    FullSyncOptions, FullSyncOutcome, SyncOptions, SyncOutcome, full_sync, sync_check_runs,
    sync_issues, sync_pull_request_detail, sync_pull_requests, sync_repositories,
};

use crate::SyncAction;
use crate::config::Config;
use crate::progress::logging_callback;
use crate::routes::split_repository;

pub(crate) async fn handle_sync(
    action: SyncAction,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = config
        .github
        .token
        .clone()
        .ok_or("no GitHub token configured; set FORGEMIRROR_GITHUB_TOKEN or [github].token")?;

    let db = db::connect(database_url).await?;
    let client = config.build_client(&token)?;
    let options = SyncOptions::default();
    let on_progress = logging_callback();

    match action {
        SyncAction::Repos { user } => {
            println!("Syncing repositories for account '{user}'...\n");
            let outcome =
                sync_repositories(&db, &client, &user, &options, Some(&on_progress)).await?;
            print_outcome(&outcome);
        }
        SyncAction::Pulls { user, repository } => {
            let (owner, name) = repo_parts(&repository)?;
            println!("Syncing pull requests for '{repository}'...\n");
            let outcome = sync_pull_requests(
                &db,
                &client,
                &user,
                owner,
                name,
                &options,
                Some(&on_progress),
            )
            .await?;
            print_outcome(&outcome);
        }
        SyncAction::Pull {
            user,
            repository,
            number,
        } => {
            let (owner, name) = repo_parts(&repository)?;
            println!("Syncing pull request #{number} in '{repository}'...\n");
            let outcome = sync_pull_request_detail(
                &db,
                &client,
                &user,
                owner,
                name,
                number,
                &options,
                Some(&on_progress),
            )
            .await?;
            print_outcome(&outcome);
        }
        SyncAction::Issues { user, repository } => {
            let (owner, name) = repo_parts(&repository)?;
            println!("Syncing issues for '{repository}'...\n");
            let outcome = sync_issues(
                &db,
                &client,
                &user,
                owner,
                name,
                &options,
                Some(&on_progress),
            )
            .await?;
            print_outcome(&outcome);
        }
        SyncAction::Checks {
            user,
            repository,
            git_ref,
        } => {
            let (owner, name) = repo_parts(&repository)?;
            println!("Syncing check runs for '{repository}' at {git_ref}...\n");
            let outcome = sync_check_runs(
                &db,
                &client,
                &user,
                owner,
                name,
                &git_ref,
                &options,
                Some(&on_progress),
            )
            .await?;
            print_outcome(&outcome);
        }
        SyncAction::Full { user } => {
            println!("Running a full sync for account '{user}'...\n");
            let full_options = FullSyncOptions {
                sync: options,
                webhook: config.webhook_registration(),
            };
            match full_sync(&db, &client, &user, &full_options, Some(&on_progress)).await? {
                FullSyncOutcome::Finished(result) => {
                    println!("Full sync results:");
                    for phase in &result.phases {
                        println!(
                            "  {:<16} {} ok, {} failed",
                            format!("{}:", phase.phase),
                            phase.successful,
                            phase.failed
                        );
                        for err in &phase.errors {
                            println!("    - {err}");
                        }
                    }
                    if let Some(message) = &result.aborted {
                        println!("\nAborted: {message}. Reconnect the credential and rerun.");
                    } else if result.is_clean() {
                        println!("\nAll phases completed.");
                    } else {
                        println!("\nCompleted with {} failed units.", result.total_failed());
                    }
                }
                FullSyncOutcome::AlreadyRunning => {
                    println!("A full sync is already running for this account.");
                }
                FullSyncOutcome::CredentialBlocked => {
                    println!("Credential is marked invalid; reconnect before syncing.");
                }
            }
        }
    }

    Ok(())
}

fn repo_parts(full: &str) -> Result<(&str, &str), String> {
    split_repository(full).ok_or_else(|| format!("repository must be owner/name, got {full:?}"))
}

fn print_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Completed(stats) if stats.not_modified => {
            println!("Nothing changed upstream.");
        }
        SyncOutcome::Completed(stats) => {
            println!(
                "Done: {} records across {} pages ({} skipped).",
                stats.upserted, stats.pages, stats.skipped
            );
            for error in &stats.errors {
                println!("  skipped: {error}");
            }
        }
        SyncOutcome::AlreadyRunning => {
            println!("Another runner holds this unit; nothing to do.");
        }
        SyncOutcome::CredentialBlocked => {
            println!("Credential is marked invalid; reconnect before syncing.");
        }
    }
}
