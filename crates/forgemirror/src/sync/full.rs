//! Phased full sync of one account.
//!
//! Runs the ordered phases repositories, pull requests, issues, and webhook
//! registration under a single `full_sync` state row. The row's `progress`
//! JSON holds a per-phase ledger, checkpointed after every unit of work, so
//! a run that died in phase three restarts at phase three instead of
//! refetching the account. Phases are restarted whole; the units inside
//! them are idempotent and cheap to re-run.

use std::collections::BTreeMap;

use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::engine::{Claim, claim_unit, sync_issues, sync_pull_requests, sync_repositories};
use super::error::{Result, SyncError};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::state::{
    mark_credential_invalid, mark_sync_auth_invalid, mark_sync_completed, mark_sync_error,
    update_sync_progress,
};
use super::types::{FullSyncResult, PhaseResult, SyncOptions, SyncOutcome};
use crate::entity::prelude::{ResourceKind, SyncStateModel, SyncStatus};
use crate::github::{HostApi, short_error_message};
use crate::retry::with_retry;
use crate::store;

const PHASE_REPOSITORIES: &str = "repositories";
const PHASE_PULL_REQUESTS: &str = "pull_requests";
const PHASE_ISSUES: &str = "issues";
const PHASE_WEBHOOKS: &str = "webhooks";

/// Webhook registration inputs for the final phase.
#[derive(Debug, Clone)]
pub struct WebhookRegistration {
    /// Public URL the host should deliver events to.
    pub callback_url: String,
    /// Shared secret for signing deliveries.
    pub secret: String,
}

/// Options for a full sync run.
#[derive(Debug, Clone, Default)]
pub struct FullSyncOptions {
    /// Options handed to every sync unit.
    pub sync: SyncOptions,
    /// Webhook registration for the final phase; the phase is skipped when
    /// `None`.
    pub webhook: Option<WebhookRegistration>,
}

/// How a full sync run ended.
#[derive(Debug)]
pub enum FullSyncOutcome {
    /// The run went through its phases; inspect the result, including
    /// `aborted`, for what actually happened.
    Finished(FullSyncResult),
    /// Another runner holds the `full_sync` row.
    AlreadyRunning,
    /// The account's credential is marked invalid.
    CredentialBlocked,
}

/// What a phase decided about the rest of the run.
#[derive(Debug, PartialEq, Eq)]
enum PhaseFlow {
    Continue,
    Abort(String),
}

/// Per-phase counters persisted in the `full_sync` row's progress JSON.
#[derive(Debug, Default, Deserialize)]
struct PhaseLedger {
    #[serde(default)]
    phases: BTreeMap<String, PhaseEntry>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct PhaseEntry {
    #[serde(default)]
    successful: usize,
    #[serde(default)]
    failed: usize,
    #[serde(default)]
    done: bool,
}

impl PhaseLedger {
    /// Read the ledger back from a stored progress value. Anything
    /// unreadable counts as no ledger at all.
    fn parse(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    fn record(&mut self, phase: &PhaseResult, done: bool) {
        self.phases.insert(
            phase.phase.clone(),
            PhaseEntry {
                successful: phase.successful,
                failed: phase.failed,
                done,
            },
        );
    }

    fn done_entry(&self, name: &str) -> Option<PhaseEntry> {
        self.phases.get(name).copied().filter(|entry| entry.done)
    }

    fn to_value(&self) -> serde_json::Value {
        let phases: serde_json::Map<String, serde_json::Value> = self
            .phases
            .iter()
            .map(|(name, entry)| {
                (
                    name.clone(),
                    serde_json::json!({
                        "successful": entry.successful,
                        "failed": entry.failed,
                        "done": entry.done,
                    }),
                )
            })
            .collect();
        serde_json::json!({ "phases": phases })
    }
}

/// Fold a unit's outcome into the running phase counters.
fn record_unit_outcome(phase: &mut PhaseResult, unit: &str, outcome: &SyncOutcome) -> PhaseFlow {
    match outcome {
        SyncOutcome::Completed(_) => {
            phase.successful += 1;
            PhaseFlow::Continue
        }
        SyncOutcome::AlreadyRunning => {
            phase.failed += 1;
            phase
                .errors
                .push(format!("{unit}: another sync is already running"));
            PhaseFlow::Continue
        }
        SyncOutcome::CredentialBlocked => {
            let message = format!("{unit}: credential is marked invalid");
            phase.failed += 1;
            phase.errors.push(message.clone());
            PhaseFlow::Abort(message)
        }
    }
}

/// Fold a unit's error into the running phase counters. Auth errors abort
/// the run; the unit already flipped the credential row.
fn record_unit_error(phase: &mut PhaseResult, unit: &str, err: &SyncError) -> PhaseFlow {
    let message = format!("{unit}: {err}");
    phase.failed += 1;
    phase.errors.push(message.clone());
    if err.is_auth() {
        PhaseFlow::Abort(message)
    } else {
        PhaseFlow::Continue
    }
}

/// Which per-repository unit a repo phase runs.
#[derive(Clone, Copy)]
enum RepoPhase {
    PullRequests,
    Issues,
}

impl RepoPhase {
    fn name(self) -> &'static str {
        match self {
            RepoPhase::PullRequests => PHASE_PULL_REQUESTS,
            RepoPhase::Issues => PHASE_ISSUES,
        }
    }
}

struct FullSyncRun<'a> {
    db: &'a DatabaseConnection,
    host: &'a dyn HostApi,
    user_id: &'a str,
    options: &'a FullSyncOptions,
    on_progress: Option<&'a ProgressCallback>,
    state: SyncStateModel,
    ledger: PhaseLedger,
    result: FullSyncResult,
}

impl FullSyncRun<'_> {
    async fn run(mut self) -> Result<FullSyncResult> {
        if let PhaseFlow::Abort(message) = self.phase_repositories().await? {
            return self.abort(message).await;
        }
        if let PhaseFlow::Abort(message) = self.phase_per_repo(RepoPhase::PullRequests).await? {
            return self.abort(message).await;
        }
        if let PhaseFlow::Abort(message) = self.phase_per_repo(RepoPhase::Issues).await? {
            return self.abort(message).await;
        }
        if let PhaseFlow::Abort(message) = self.phase_webhooks().await? {
            return self.abort(message).await;
        }
        self.finish().await
    }

    /// Replay a phase the ledger already records as done, without touching
    /// the host.
    fn skip_recorded(&mut self, name: &str) -> bool {
        let Some(entry) = self.ledger.done_entry(name) else {
            return false;
        };
        tracing::debug!("full sync for {}: phase {name} already done", self.user_id);
        self.result.phases.push(PhaseResult {
            phase: name.to_string(),
            successful: entry.successful,
            failed: entry.failed,
            errors: Vec::new(),
        });
        true
    }

    /// Persist the ledger with this phase's current counters.
    async fn checkpoint(&mut self, phase: &PhaseResult, done: bool) -> Result<()> {
        self.ledger.record(phase, done);
        update_sync_progress(self.db, self.state.id, None, Some(self.ledger.to_value())).await
    }

    async fn close_phase(&mut self, phase: PhaseResult) -> Result<()> {
        self.checkpoint(&phase, true).await?;
        emit(
            self.on_progress,
            SyncProgress::PhaseCompleted {
                phase: phase.phase.clone(),
                successful: phase.successful,
                failed: phase.failed,
            },
        );
        self.result.phases.push(phase);
        Ok(())
    }

    async fn phase_repositories(&mut self) -> Result<PhaseFlow> {
        if self.skip_recorded(PHASE_REPOSITORIES) {
            return Ok(PhaseFlow::Continue);
        }

        let mut phase = PhaseResult {
            phase: PHASE_REPOSITORIES.to_string(),
            ..Default::default()
        };
        emit(
            self.on_progress,
            SyncProgress::PhaseStarted {
                phase: phase.phase.clone(),
                units: 1,
            },
        );

        let flow = match sync_repositories(
            self.db,
            self.host,
            self.user_id,
            &self.options.sync,
            self.on_progress,
        )
        .await
        {
            Ok(outcome) => record_unit_outcome(&mut phase, PHASE_REPOSITORIES, &outcome),
            Err(err) => record_unit_error(&mut phase, PHASE_REPOSITORIES, &err),
        };

        if let PhaseFlow::Abort(message) = flow {
            self.checkpoint(&phase, false).await?;
            self.result.phases.push(phase);
            return Ok(PhaseFlow::Abort(message));
        }
        self.close_phase(phase).await?;
        Ok(PhaseFlow::Continue)
    }

    /// Run one per-repository phase over every mirrored repository.
    async fn phase_per_repo(&mut self, which: RepoPhase) -> Result<PhaseFlow> {
        if self.skip_recorded(which.name()) {
            return Ok(PhaseFlow::Continue);
        }

        let repos = store::list_repositories(self.db, self.user_id).await?;
        let mut phase = PhaseResult {
            phase: which.name().to_string(),
            ..Default::default()
        };
        emit(
            self.on_progress,
            SyncProgress::PhaseStarted {
                phase: phase.phase.clone(),
                units: repos.len(),
            },
        );

        for repo in &repos {
            let unit = format!("{}/{}", repo.owner, repo.name);
            let run = match which {
                RepoPhase::PullRequests => {
                    sync_pull_requests(
                        self.db,
                        self.host,
                        self.user_id,
                        &repo.owner,
                        &repo.name,
                        &self.options.sync,
                        self.on_progress,
                    )
                    .await
                }
                RepoPhase::Issues => {
                    sync_issues(
                        self.db,
                        self.host,
                        self.user_id,
                        &repo.owner,
                        &repo.name,
                        &self.options.sync,
                        self.on_progress,
                    )
                    .await
                }
            };
            let flow = match run {
                Ok(outcome) => record_unit_outcome(&mut phase, &unit, &outcome),
                Err(err) => record_unit_error(&mut phase, &unit, &err),
            };
            self.checkpoint(&phase, false).await?;
            if let PhaseFlow::Abort(message) = flow {
                self.result.phases.push(phase);
                return Ok(PhaseFlow::Abort(message));
            }
        }

        self.close_phase(phase).await?;
        Ok(PhaseFlow::Continue)
    }

    async fn phase_webhooks(&mut self) -> Result<PhaseFlow> {
        let Some(webhook) = self.options.webhook.clone() else {
            return Ok(PhaseFlow::Continue);
        };
        if self.skip_recorded(PHASE_WEBHOOKS) {
            return Ok(PhaseFlow::Continue);
        }

        let host = self.host;
        let on_progress = self.on_progress;
        let repos = store::list_repositories(self.db, self.user_id).await?;
        let mut phase = PhaseResult {
            phase: PHASE_WEBHOOKS.to_string(),
            ..Default::default()
        };
        emit(
            on_progress,
            SyncProgress::PhaseStarted {
                phase: phase.phase.clone(),
                units: repos.len(),
            },
        );

        for repo in &repos {
            let unit = format!("{}/{}", repo.owner, repo.name);
            let ensured = with_retry(
                || {
                    host.ensure_webhook(
                        &repo.owner,
                        &repo.name,
                        &webhook.callback_url,
                        &webhook.secret,
                    )
                },
                &self.options.sync.retry,
                &unit,
                on_progress,
            )
            .await;

            let flow = match ensured {
                Ok(created) => {
                    if created {
                        tracing::info!("registered webhook on {unit}");
                    }
                    phase.successful += 1;
                    PhaseFlow::Continue
                }
                Err(err) => {
                    let message = format!("{unit}: {}", short_error_message(&err));
                    phase.failed += 1;
                    phase.errors.push(message.clone());
                    if err.is_auth() {
                        mark_credential_invalid(self.db, self.user_id, &message).await?;
                        PhaseFlow::Abort(message)
                    } else {
                        PhaseFlow::Continue
                    }
                }
            };
            self.checkpoint(&phase, false).await?;
            if let PhaseFlow::Abort(message) = flow {
                self.result.phases.push(phase);
                return Ok(PhaseFlow::Abort(message));
            }
        }

        self.close_phase(phase).await?;
        Ok(PhaseFlow::Continue)
    }

    /// Release the row as `auth_invalid` and report the truncated run.
    async fn abort(mut self, message: String) -> Result<FullSyncResult> {
        emit(
            self.on_progress,
            SyncProgress::UnitFailed {
                unit: self.state.unit_label(),
                error: message.clone(),
            },
        );
        mark_sync_auth_invalid(self.db, self.state.id, &message).await?;
        self.result.aborted = Some(message);
        Ok(self.result)
    }

    /// Release the row after all phases ran. Unit failures leave the run
    /// `error` so operators see it in the state listing; the details live
    /// on each unit's own row.
    async fn finish(self) -> Result<FullSyncResult> {
        let successful: usize = self.result.phases.iter().map(|p| p.successful).sum();
        let failed = self.result.total_failed();
        if failed == 0 {
            mark_sync_completed(self.db, self.state.id, None).await?;
        } else {
            let message = format!("{failed} sync units failed; see their state rows");
            mark_sync_error(self.db, self.state.id, &message).await?;
        }
        emit(
            self.on_progress,
            SyncProgress::FullSyncCompleted { successful, failed },
        );
        Ok(self.result)
    }
}

/// Run the phased full sync for one account.
///
/// An interrupted run leaves its row `error` (or `auth_invalid`) with the
/// phase ledger intact; the next invocation resumes from the first phase
/// the ledger does not record as done. A run after a completed one starts
/// fresh.
pub async fn full_sync(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    options: &FullSyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<FullSyncOutcome> {
    let state = match claim_unit(db, ResourceKind::FullSync, user_id, None, on_progress).await? {
        Claim::Blocked => return Ok(FullSyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(FullSyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };

    let resume = matches!(state.status, SyncStatus::Error | SyncStatus::AuthInvalid);
    let ledger = if resume {
        tracing::info!("resuming interrupted full sync for {user_id}");
        PhaseLedger::parse(&state.progress)
    } else {
        PhaseLedger::default()
    };

    let run = FullSyncRun {
        db,
        host,
        user_id,
        options,
        on_progress,
        state,
        ledger,
        result: FullSyncResult::default(),
    };
    Ok(FullSyncOutcome::Finished(run.run().await?))
}
