//! Per-resource sync units.
//!
//! Every unit follows the same shape: gate on the credential, claim the
//! unit's state row, fetch from the stored cursor or validator, upsert each
//! record under its deterministic ID, and release the row as `completed` or
//! `error`. A bad record is logged and skipped while the rest of the page
//! proceeds; only an authentication failure aborts the run, because it also
//! invalidates every other unit of the account.

use std::future::Future;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel};
use uuid::Uuid;

use super::error::{Result, SyncError};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::state::{
    BeginSync, credential_blocked, fetch_or_create_sync_state, mark_credential_invalid,
    mark_sync_auth_invalid, mark_sync_completed, mark_sync_error, try_begin_sync,
    update_sync_progress,
};
use super::types::{DetailSyncOutcome, SyncOptions, SyncOutcome, SyncStats};
use crate::entity::prelude::{CommentKind, ResourceKind, SyncStateModel};
use crate::github::{
    CollectionFetch, CommentParent, DetailFetch, GitHubCommit, GitHubTree, HostApi, HostError,
    short_error_message, to_check_run_model, to_comment_model, to_issue_model,
    to_pull_request_detail_model, to_pull_request_model, to_repository_model, to_review_model,
};
use crate::retry::with_retry;
use crate::store::{self, StoreError};

/// Outcome of the gate-and-claim preamble shared by every unit.
pub(super) enum Claim {
    Blocked,
    Running,
    Ready(SyncStateModel),
}

/// Gate on the credential, find or create the unit's state row, and claim
/// it. `Ready` means this caller holds the row and must release it.
pub(super) async fn claim_unit(
    db: &DatabaseConnection,
    kind: ResourceKind,
    user_id: &str,
    resource_ref: Option<&str>,
    on_progress: Option<&ProgressCallback>,
) -> Result<Claim> {
    if credential_blocked(db, user_id).await? {
        tracing::debug!(
            "skipping {}/{user_id} sync: credential is marked invalid",
            kind.as_str()
        );
        return Ok(Claim::Blocked);
    }

    let state = fetch_or_create_sync_state(db, kind, user_id, resource_ref).await?;
    match try_begin_sync(db, state.id).await? {
        BeginSync::AlreadyRunning => Ok(Claim::Running),
        BeginSync::Claimed => {
            emit(
                on_progress,
                SyncProgress::UnitStarted {
                    unit: state.unit_label(),
                },
            );
            Ok(Claim::Ready(state))
        }
    }
}

/// Record a host failure on the claimed row and hand back the error to
/// propagate.
///
/// An auth rejection also flips the account's credential row, which is what
/// short-circuits every later sync for the user.
async fn fail_unit(
    db: &DatabaseConnection,
    state: &SyncStateModel,
    err: HostError,
    on_progress: Option<&ProgressCallback>,
) -> SyncError {
    let unit = state.unit_label();
    let message = short_error_message(&err);
    emit(
        on_progress,
        SyncProgress::UnitFailed {
            unit: unit.clone(),
            error: message.clone(),
        },
    );

    let recorded = if err.is_auth() {
        match mark_sync_auth_invalid(db, state.id, &message).await {
            Ok(()) => mark_credential_invalid(db, &state.user_id, &message).await,
            Err(record_err) => Err(record_err),
        }
    } else {
        mark_sync_error(db, state.id, &message).await
    };
    if let Err(record_err) = recorded {
        tracing::error!("failed to record {unit} failure: {record_err}");
    }

    SyncError::host(unit, err)
}

/// Record a store failure on the claimed row, best effort, and hand back
/// the error to propagate.
async fn fail_unit_store(
    db: &DatabaseConnection,
    state: &SyncStateModel,
    err: SyncError,
    on_progress: Option<&ProgressCallback>,
) -> SyncError {
    let unit = state.unit_label();
    let message = err.to_string();
    emit(
        on_progress,
        SyncProgress::UnitFailed {
            unit: unit.clone(),
            error: message.clone(),
        },
    );
    if let Err(record_err) = mark_sync_error(db, state.id, &message).await {
        tracing::error!("failed to record {unit} failure: {record_err}");
    }
    err
}

/// Release the claimed row as `completed` and report the run.
async fn complete_unit(
    db: &DatabaseConnection,
    state: &SyncStateModel,
    etag: Option<String>,
    stats: &SyncStats,
    on_progress: Option<&ProgressCallback>,
) -> Result<()> {
    if let Err(err) = mark_sync_completed(db, state.id, etag).await {
        return Err(fail_unit_store(db, state, err, on_progress).await);
    }
    emit(
        on_progress,
        SyncProgress::UnitCompleted {
            unit: state.unit_label(),
            upserted: stats.upserted,
        },
    );
    Ok(())
}

/// Page through one host collection and upsert every record.
///
/// Resumes from the row's stored cursor. The stored validator describes the
/// first page only, so it is replayed just when no cursor is in play, and a
/// fresh validator is captured only from an unresumed first page. The cursor
/// advances after each page is durably stored and is cleared on completion.
async fn run_collection_unit<T, A, FetchFn, Fut, BuildFn, LabelFn>(
    db: &DatabaseConnection,
    state: &SyncStateModel,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
    mut fetch_page: FetchFn,
    mut to_model: BuildFn,
    record_label: LabelFn,
) -> Result<SyncStats>
where
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    FetchFn: FnMut(Option<String>, Option<String>) -> Fut,
    Fut: Future<Output = Result<CollectionFetch<T>, HostError>>,
    BuildFn: FnMut(&T) -> A,
    LabelFn: Fn(&T) -> String,
{
    let unit = state.unit_label();
    let mut stats = SyncStats::default();
    let mut cursor = state.last_cursor.clone();
    let resumed = cursor.is_some();
    let mut collection_etag: Option<String> = None;

    loop {
        let etag_hint = if cursor.is_none() {
            state.last_etag.clone()
        } else {
            None
        };

        let fetched = with_retry(
            || fetch_page(cursor.clone(), etag_hint.clone()),
            &options.retry,
            &unit,
            on_progress,
        )
        .await;
        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(err) => return Err(fail_unit(db, state, err, on_progress).await),
        };

        let page = match fetched {
            CollectionFetch::NotModified => {
                stats.not_modified = true;
                emit(on_progress, SyncProgress::NotModified { unit: unit.clone() });
                complete_unit(db, state, state.last_etag.clone(), &stats, on_progress).await?;
                return Ok(stats);
            }
            CollectionFetch::Page(page) => page,
        };

        stats.pages += 1;
        if !resumed && stats.pages == 1 {
            collection_etag = page.etag.clone();
        }

        for record in &page.records {
            let model = to_model(record);
            if let Err(err) = store::merge_upsert(db, model).await {
                let reference = record_label(record);
                tracing::warn!("skipping {unit} record {reference}: {err}");
                stats.errors.push(format!("{reference}: {err}"));
                stats.skipped += 1;
                emit(
                    on_progress,
                    SyncProgress::RecordSkipped {
                        unit: unit.clone(),
                        reference,
                        error: err.to_string(),
                    },
                );
                continue;
            }
            stats.upserted += 1;
        }

        emit(
            on_progress,
            SyncProgress::PageStored {
                unit: unit.clone(),
                page: stats.pages as u32,
                count: page.records.len(),
                total_so_far: stats.upserted,
            },
        );

        match page.next_cursor {
            Some(next) => {
                if let Err(err) = update_sync_progress(db, state.id, Some(next.clone()), None).await
                {
                    return Err(fail_unit_store(db, state, err, on_progress).await);
                }
                cursor = Some(next);
            }
            None => {
                complete_unit(db, state, collection_etag, &stats, on_progress).await?;
                return Ok(stats);
            }
        }
    }
}

/// Release the tree/commit row after a conditional detail fetch, keeping
/// the validator for next time.
async fn finish_detail_fetch<T>(
    db: &DatabaseConnection,
    state: &SyncStateModel,
    fetched: DetailFetch<T>,
    on_progress: Option<&ProgressCallback>,
) -> Result<DetailSyncOutcome<T>> {
    let stats = SyncStats::default();
    match fetched {
        DetailFetch::NotModified => {
            emit(
                on_progress,
                SyncProgress::NotModified {
                    unit: state.unit_label(),
                },
            );
            complete_unit(db, state, state.last_etag.clone(), &stats, on_progress).await?;
            Ok(DetailSyncOutcome::NotModified)
        }
        DetailFetch::Fetched { value, etag } => {
            complete_unit(db, state, etag, &stats, on_progress).await?;
            Ok(DetailSyncOutcome::Fetched(value))
        }
    }
}

/// The repository row mutated records hang off. Per-repo units refuse to
/// run before the repository itself is mirrored, matching the store's
/// foreign keys.
async fn require_repository(
    db: &DatabaseConnection,
    user_id: &str,
    owner: &str,
    name: &str,
) -> Result<Uuid> {
    let repo = store::find_repository(db, user_id, owner, name)
        .await?
        .ok_or_else(|| {
            StoreError::invalid_input(format!(
                "repository {owner}/{name} is not mirrored for {user_id}; sync repositories first"
            ))
        })?;
    Ok(repo.id)
}

async fn require_pull_request(
    db: &DatabaseConnection,
    user_id: &str,
    owner: &str,
    name: &str,
    number: i32,
) -> Result<Uuid> {
    let pr = store::find_pull_request(db, user_id, owner, name, number)
        .await?
        .ok_or_else(|| {
            StoreError::invalid_input(format!(
                "pull request {owner}/{name}#{number} is not mirrored for {user_id}; sync pull requests first"
            ))
        })?;
    Ok(pr.id)
}

/// Pick the local row comments under this number attach to.
///
/// Review comments always hang off the pull request. Issue comments live in
/// the shared timeline, so the pull request claims them when one is
/// mirrored under the number; otherwise the issue row does.
async fn resolve_comment_parent(
    db: &DatabaseConnection,
    user_id: &str,
    owner: &str,
    name: &str,
    number: i32,
    kind: CommentKind,
) -> Result<CommentParent> {
    if kind == CommentKind::Review {
        let id = require_pull_request(db, user_id, owner, name, number).await?;
        return Ok(CommentParent::PullRequest(id));
    }

    if let Some(pr) = store::find_pull_request(db, user_id, owner, name, number).await? {
        return Ok(CommentParent::PullRequest(pr.id));
    }
    if let Some(issue) = store::find_issue(db, user_id, owner, name, number).await? {
        return Ok(CommentParent::Issue(issue.id));
    }
    Err(StoreError::invalid_input(format!(
        "{owner}/{name}#{number} is not mirrored for {user_id}; sync pull requests or issues first"
    ))
    .into())
}

/// Mirror the repository list of the authenticated account.
pub async fn sync_repositories(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncOutcome> {
    let state = match claim_unit(db, ResourceKind::Repository, user_id, None, on_progress).await? {
        Claim::Blocked => return Ok(SyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(SyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };

    let stats = run_collection_unit(
        db,
        &state,
        options,
        on_progress,
        move |cursor, etag| async move {
            host.list_repositories(cursor.as_deref(), etag.as_deref())
                .await
        },
        |repo| to_repository_model(user_id, repo),
        |repo| repo.full_name(),
    )
    .await?;
    Ok(SyncOutcome::Completed(stats))
}

/// Mirror every pull request of one repository, list scope only.
///
/// Merge flags and reviewed files belong to the detail scope and are left
/// untouched; see [`sync_pull_request_detail`].
pub async fn sync_pull_requests(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    owner: &str,
    name: &str,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncOutcome> {
    require_repository(db, user_id, owner, name).await?;

    let scope = format!("{owner}/{name}");
    let state = match claim_unit(
        db,
        ResourceKind::PullRequest,
        user_id,
        Some(&scope),
        on_progress,
    )
    .await?
    {
        Claim::Blocked => return Ok(SyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(SyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };

    let stats = run_collection_unit(
        db,
        &state,
        options,
        on_progress,
        move |cursor, etag| async move {
            host.list_pull_requests(owner, name, cursor.as_deref(), etag.as_deref())
                .await
        },
        |pr| to_pull_request_model(user_id, owner, name, pr),
        |pr| format!("#{}", pr.number),
    )
    .await?;
    Ok(SyncOutcome::Completed(stats))
}

/// Refresh one pull request's detail scope: merge state on top of the list
/// columns.
pub async fn sync_pull_request_detail(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    owner: &str,
    name: &str,
    number: i32,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncOutcome> {
    require_repository(db, user_id, owner, name).await?;

    let scope = format!("{owner}/{name}#{number}");
    let state = match claim_unit(
        db,
        ResourceKind::PullRequest,
        user_id,
        Some(&scope),
        on_progress,
    )
    .await?
    {
        Claim::Blocked => return Ok(SyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(SyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };
    let unit = state.unit_label();

    let fetched = with_retry(
        || host.fetch_pull_request(owner, name, number),
        &options.retry,
        &unit,
        on_progress,
    )
    .await;
    let pr = match fetched {
        Ok(pr) => pr,
        Err(err) => return Err(fail_unit(db, &state, err, on_progress).await),
    };

    let model = to_pull_request_detail_model(user_id, owner, name, &pr);
    if let Err(err) = store::merge_upsert(db, model).await {
        return Err(fail_unit_store(db, &state, err.into(), on_progress).await);
    }

    let stats = SyncStats {
        upserted: 1,
        ..Default::default()
    };
    complete_unit(db, &state, None, &stats, on_progress).await?;
    Ok(SyncOutcome::Completed(stats))
}

/// Mirror every issue of one repository, including the issue side of pull
/// requests.
pub async fn sync_issues(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    owner: &str,
    name: &str,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncOutcome> {
    require_repository(db, user_id, owner, name).await?;

    let scope = format!("{owner}/{name}");
    let state = match claim_unit(db, ResourceKind::Issue, user_id, Some(&scope), on_progress)
        .await?
    {
        Claim::Blocked => return Ok(SyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(SyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };

    let stats = run_collection_unit(
        db,
        &state,
        options,
        on_progress,
        move |cursor, etag| async move {
            host.list_issues(owner, name, cursor.as_deref(), etag.as_deref())
                .await
        },
        |issue| to_issue_model(user_id, owner, name, issue),
        |issue| format!("#{}", issue.number),
    )
    .await?;
    Ok(SyncOutcome::Completed(stats))
}

/// Mirror the reviews of one pull request.
pub async fn sync_reviews(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    owner: &str,
    name: &str,
    number: i32,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncOutcome> {
    let pull_request_id = require_pull_request(db, user_id, owner, name, number).await?;

    let scope = format!("{owner}/{name}#{number}");
    let state = match claim_unit(db, ResourceKind::Review, user_id, Some(&scope), on_progress)
        .await?
    {
        Claim::Blocked => return Ok(SyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(SyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };

    let stats = run_collection_unit(
        db,
        &state,
        options,
        on_progress,
        move |cursor, etag| async move {
            host.list_reviews(owner, name, number, cursor.as_deref(), etag.as_deref())
                .await
        },
        |review| to_review_model(user_id, pull_request_id, review),
        |review| review.id.to_string(),
    )
    .await?;
    Ok(SyncOutcome::Completed(stats))
}

/// Mirror one comment family of one pull request or issue.
///
/// The family is part of the unit's scope ref, so the review and issue
/// timelines of the same number keep independent cursors.
pub async fn sync_comments(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    owner: &str,
    name: &str,
    number: i32,
    kind: CommentKind,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncOutcome> {
    let parent = resolve_comment_parent(db, user_id, owner, name, number, kind).await?;

    let scope = format!("{owner}/{name}#{number}/{kind}");
    let state = match claim_unit(db, ResourceKind::Comment, user_id, Some(&scope), on_progress)
        .await?
    {
        Claim::Blocked => return Ok(SyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(SyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };

    let stats = run_collection_unit(
        db,
        &state,
        options,
        on_progress,
        move |cursor, etag| async move {
            match kind {
                CommentKind::Review => {
                    host.list_review_comments(owner, name, number, cursor.as_deref(), etag.as_deref())
                        .await
                }
                CommentKind::Issue => {
                    host.list_issue_comments(owner, name, number, cursor.as_deref(), etag.as_deref())
                        .await
                }
            }
        },
        |comment| to_comment_model(user_id, kind, parent, comment),
        |comment| comment.id.to_string(),
    )
    .await?;
    Ok(SyncOutcome::Completed(stats))
}

/// Mirror the check runs for one commit or branch.
pub async fn sync_check_runs(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    owner: &str,
    name: &str,
    git_ref: &str,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncOutcome> {
    let repository_id = require_repository(db, user_id, owner, name).await?;

    let scope = format!("{owner}/{name}:{git_ref}");
    let state = match claim_unit(db, ResourceKind::CheckRun, user_id, Some(&scope), on_progress)
        .await?
    {
        Claim::Blocked => return Ok(SyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(SyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };

    let stats = run_collection_unit(
        db,
        &state,
        options,
        on_progress,
        move |cursor, etag| async move {
            host.list_check_runs(owner, name, git_ref, cursor.as_deref(), etag.as_deref())
                .await
        },
        |run| to_check_run_model(user_id, repository_id, run),
        |run| run.id.to_string(),
    )
    .await?;
    Ok(SyncOutcome::Completed(stats))
}

/// Fetch the file tree at a ref, keeping only conditional-fetch
/// bookkeeping.
///
/// Tree content is never mirrored. The unit exists so repeat fetches replay
/// the stored validator and short-circuit with `NotModified`.
pub async fn sync_tree(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    owner: &str,
    name: &str,
    git_ref: &str,
    recursive: bool,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<DetailSyncOutcome<GitHubTree>> {
    let scope = format!("{owner}/{name}:{git_ref}");
    let state = match claim_unit(db, ResourceKind::Tree, user_id, Some(&scope), on_progress)
        .await?
    {
        Claim::Blocked => return Ok(DetailSyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(DetailSyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };
    let unit = state.unit_label();
    let etag = state.last_etag.clone();

    let fetched = with_retry(
        || host.fetch_tree(owner, name, git_ref, recursive, etag.as_deref()),
        &options.retry,
        &unit,
        on_progress,
    )
    .await;
    let fetched = match fetched {
        Ok(fetched) => fetched,
        Err(err) => return Err(fail_unit(db, &state, err, on_progress).await),
    };

    finish_detail_fetch(db, &state, fetched, on_progress).await
}

/// Fetch one commit, keeping only conditional-fetch bookkeeping.
pub async fn sync_commit(
    db: &DatabaseConnection,
    host: &dyn HostApi,
    user_id: &str,
    owner: &str,
    name: &str,
    git_ref: &str,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<DetailSyncOutcome<GitHubCommit>> {
    let scope = format!("{owner}/{name}:{git_ref}");
    let state = match claim_unit(db, ResourceKind::Commit, user_id, Some(&scope), on_progress)
        .await?
    {
        Claim::Blocked => return Ok(DetailSyncOutcome::CredentialBlocked),
        Claim::Running => return Ok(DetailSyncOutcome::AlreadyRunning),
        Claim::Ready(state) => state,
    };
    let unit = state.unit_label();
    let etag = state.last_etag.clone();

    let fetched = with_retry(
        || host.fetch_commit(owner, name, git_ref, etag.as_deref()),
        &options.retry,
        &unit,
        on_progress,
    )
    .await;
    let fetched = match fetched {
        Ok(fetched) => fetched,
        Err(err) => return Err(fail_unit(db, &state, err, on_progress).await),
    };

    finish_detail_fetch(db, &state, fetched, on_progress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::entity::prelude::SyncStatus;
    use crate::github::{
        CollectionPage, GitHubAuthUser, GitHubCheckRun, GitHubComment, GitHubIssue, GitHubLabel,
        GitHubPullRequest, GitHubRepo, GitHubReview, GitHubUser, MergeOutcome, MergeRequest,
        RateLimitSnapshot, ReviewSubmission,
    };
    use crate::ident;

    /// Scripted host: every list/fetch pops the next canned response and
    /// records the cursor and validator it was asked for.
    #[derive(Default)]
    struct FakeHost {
        repo_pages: Mutex<VecDeque<Result<CollectionFetch<GitHubRepo>, HostError>>>,
        tree_fetches: Mutex<VecDeque<Result<DetailFetch<GitHubTree>, HostError>>>,
        calls: AtomicUsize,
        seen_cursors: Mutex<Vec<Option<String>>>,
        seen_etags: Mutex<Vec<Option<String>>>,
    }

    impl FakeHost {
        fn push_repo_page(&self, response: Result<CollectionFetch<GitHubRepo>, HostError>) {
            self.repo_pages.lock().unwrap().push_back(response);
        }

        fn push_tree_fetch(&self, response: Result<DetailFetch<GitHubTree>, HostError>) {
            self.tree_fetches.lock().unwrap().push_back(response);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self, cursor: Option<&str>, etag: Option<&str>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_cursors
                .lock()
                .unwrap()
                .push(cursor.map(str::to_string));
            self.seen_etags
                .lock()
                .unwrap()
                .push(etag.map(str::to_string));
        }
    }

    #[async_trait]
    impl HostApi for FakeHost {
        async fn fetch_authenticated_user(&self) -> Result<GitHubAuthUser, HostError> {
            unimplemented!("not scripted")
        }

        async fn list_repositories(
            &self,
            cursor: Option<&str>,
            etag: Option<&str>,
        ) -> Result<CollectionFetch<GitHubRepo>, HostError> {
            self.record(cursor, etag);
            self.repo_pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("fake ran out of repo pages")
        }

        async fn fetch_repository(
            &self,
            _owner: &str,
            _name: &str,
        ) -> Result<GitHubRepo, HostError> {
            unimplemented!("not scripted")
        }

        async fn list_pull_requests(
            &self,
            _owner: &str,
            _name: &str,
            _cursor: Option<&str>,
            _etag: Option<&str>,
        ) -> Result<CollectionFetch<GitHubPullRequest>, HostError> {
            unimplemented!("not scripted")
        }

        async fn fetch_pull_request(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
        ) -> Result<GitHubPullRequest, HostError> {
            unimplemented!("not scripted")
        }

        async fn list_reviews(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _cursor: Option<&str>,
            _etag: Option<&str>,
        ) -> Result<CollectionFetch<GitHubReview>, HostError> {
            unimplemented!("not scripted")
        }

        async fn list_review_comments(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _cursor: Option<&str>,
            _etag: Option<&str>,
        ) -> Result<CollectionFetch<GitHubComment>, HostError> {
            unimplemented!("not scripted")
        }

        async fn list_issue_comments(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _cursor: Option<&str>,
            _etag: Option<&str>,
        ) -> Result<CollectionFetch<GitHubComment>, HostError> {
            unimplemented!("not scripted")
        }

        async fn list_issues(
            &self,
            _owner: &str,
            _name: &str,
            _cursor: Option<&str>,
            _etag: Option<&str>,
        ) -> Result<CollectionFetch<GitHubIssue>, HostError> {
            unimplemented!("not scripted")
        }

        async fn list_check_runs(
            &self,
            _owner: &str,
            _name: &str,
            _git_ref: &str,
            _cursor: Option<&str>,
            _etag: Option<&str>,
        ) -> Result<CollectionFetch<GitHubCheckRun>, HostError> {
            unimplemented!("not scripted")
        }

        async fn fetch_tree(
            &self,
            _owner: &str,
            _name: &str,
            _git_ref: &str,
            _recursive: bool,
            etag: Option<&str>,
        ) -> Result<DetailFetch<GitHubTree>, HostError> {
            self.record(None, etag);
            self.tree_fetches
                .lock()
                .unwrap()
                .pop_front()
                .expect("fake ran out of tree fetches")
        }

        async fn fetch_commit(
            &self,
            _owner: &str,
            _name: &str,
            _git_ref: &str,
            _etag: Option<&str>,
        ) -> Result<DetailFetch<GitHubCommit>, HostError> {
            unimplemented!("not scripted")
        }

        async fn merge_pull_request(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _request: &MergeRequest,
        ) -> Result<MergeOutcome, HostError> {
            unimplemented!("not scripted")
        }

        async fn add_labels(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _labels: &[String],
        ) -> Result<Vec<GitHubLabel>, HostError> {
            unimplemented!("not scripted")
        }

        async fn remove_label(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _label: &str,
        ) -> Result<Vec<GitHubLabel>, HostError> {
            unimplemented!("not scripted")
        }

        async fn submit_review(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _submission: &ReviewSubmission,
        ) -> Result<GitHubReview, HostError> {
            unimplemented!("not scripted")
        }

        async fn request_reviewers(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _reviewers: &[String],
        ) -> Result<(), HostError> {
            unimplemented!("not scripted")
        }

        async fn set_locked(
            &self,
            _owner: &str,
            _name: &str,
            _number: i32,
            _locked: bool,
            _reason: Option<&str>,
        ) -> Result<(), HostError> {
            unimplemented!("not scripted")
        }

        async fn ensure_webhook(
            &self,
            _owner: &str,
            _name: &str,
            _callback_url: &str,
            _secret: &str,
        ) -> Result<bool, HostError> {
            unimplemented!("not scripted")
        }

        fn rate_limit_snapshot(&self) -> Option<RateLimitSnapshot> {
            None
        }
    }

    fn repo(id: i64, name: &str) -> GitHubRepo {
        GitHubRepo {
            id,
            name: name.to_string(),
            owner: GitHubUser {
                id: 1,
                login: "acme".to_string(),
            },
            description: None,
            private: false,
            fork: false,
            archived: false,
            default_branch: Some("main".to_string()),
            html_url: None,
            pushed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn page(
        records: Vec<GitHubRepo>,
        next_cursor: Option<&str>,
        etag: Option<&str>,
    ) -> CollectionFetch<GitHubRepo> {
        CollectionFetch::Page(CollectionPage {
            records,
            next_cursor: next_cursor.map(str::to_string),
            etag: etag.map(str::to_string),
            rate_limit: None,
        })
    }

    fn repo_state_row(status: SyncStatus, etag: Option<&str>) -> SyncStateModel {
        let now = Utc::now().fixed_offset();
        SyncStateModel {
            id: ident::sync_state_id("repository", "user-1", None),
            resource_kind: ResourceKind::Repository,
            user_id: "user-1".to_string(),
            resource_ref: None,
            status,
            last_cursor: None,
            last_etag: etag.map(str::to_string),
            last_error: None,
            last_synced_at: None,
            progress: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    fn credential_row(status: SyncStatus) -> SyncStateModel {
        let now = Utc::now().fixed_offset();
        SyncStateModel {
            id: ident::sync_state_id("credential", "user-1", None),
            resource_kind: ResourceKind::Credential,
            user_id: "user-1".to_string(),
            resource_ref: None,
            status,
            last_cursor: None,
            last_etag: None,
            last_error: None,
            last_synced_at: None,
            progress: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    fn ok_exec() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn collect_events() -> (ProgressCallback, std::sync::Arc<Mutex<Vec<String>>>) {
        let events = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            let label = match event {
                SyncProgress::UnitStarted { .. } => "started",
                SyncProgress::PageStored { .. } => "page",
                SyncProgress::NotModified { .. } => "not_modified",
                SyncProgress::RecordSkipped { .. } => "skipped",
                SyncProgress::UnitCompleted { .. } => "completed",
                SyncProgress::UnitFailed { .. } => "failed",
                _ => "other",
            };
            sink.lock().unwrap().push(label.to_string());
        });
        (callback, events)
    }

    #[tokio::test]
    async fn repositories_sync_walks_pages_and_completes() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<SyncStateModel>::new()])
            .append_query_results([vec![repo_state_row(
                SyncStatus::Idle,
                Some(r#"W/"cached""#),
            )]])
            .append_exec_results([
                ok_exec(), // state row insert
                ok_exec(), // claim
                ok_exec(), // upsert api
                ok_exec(), // upsert web
                ok_exec(), // cursor advance
                ok_exec(), // upsert docs
                ok_exec(), // completion
            ])
            .into_connection();

        let host = FakeHost::default();
        host.push_repo_page(Ok(page(
            vec![repo(1, "api"), repo(2, "web")],
            Some("2"),
            Some(r#"W/"fresh""#),
        )));
        host.push_repo_page(Ok(page(vec![repo(3, "docs")], None, None)));

        let (callback, events) = collect_events();
        let outcome = sync_repositories(
            &db,
            &host,
            "user-1",
            &SyncOptions::default(),
            Some(&callback),
        )
        .await
        .unwrap();

        let stats = outcome.stats().expect("run should complete");
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.upserted, 3);
        assert_eq!(stats.skipped, 0);
        assert!(!stats.not_modified);

        // First fetch replays the stored validator; the cursored fetch must
        // be unconditional.
        assert_eq!(host.calls(), 2);
        let cursors = host.seen_cursors.lock().unwrap().clone();
        assert_eq!(cursors, vec![None, Some("2".to_string())]);
        let etags = host.seen_etags.lock().unwrap().clone();
        assert_eq!(etags, vec![Some(r#"W/"cached""#.to_string()), None]);

        let recorded = events.lock().unwrap().clone();
        assert_eq!(recorded, vec!["started", "page", "page", "completed"]);
    }

    #[tokio::test]
    async fn blocked_credential_short_circuits_without_host_calls() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![credential_row(SyncStatus::AuthInvalid)]])
            .into_connection();

        let host = FakeHost::default();
        let outcome = sync_repositories(&db, &host, "user-1", &SyncOptions::default(), None)
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::CredentialBlocked));
        assert_eq!(host.calls(), 0);
    }

    #[tokio::test]
    async fn busy_unit_reports_already_running() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<SyncStateModel>::new()])
            .append_query_results([vec![repo_state_row(SyncStatus::Syncing, None)]])
            .append_exec_results([
                ok_exec(),
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        let host = FakeHost::default();
        let outcome = sync_repositories(&db, &host, "user-1", &SyncOptions::default(), None)
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::AlreadyRunning));
        assert_eq!(host.calls(), 0);
    }

    #[tokio::test]
    async fn auth_failure_marks_unit_and_credential_without_retry() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<SyncStateModel>::new()])
            .append_query_results([vec![repo_state_row(SyncStatus::Idle, None)]])
            .append_query_results([vec![credential_row(SyncStatus::Idle)]])
            .append_exec_results([
                ok_exec(), // state row insert
                ok_exec(), // claim
                ok_exec(), // unit -> auth_invalid
                ok_exec(), // credential row insert
                ok_exec(), // credential -> auth_invalid
            ])
            .into_connection();

        let host = FakeHost::default();
        host.push_repo_page(Err(HostError::Auth));

        let (callback, events) = collect_events();
        let err = sync_repositories(
            &db,
            &host,
            "user-1",
            &SyncOptions::default(),
            Some(&callback),
        )
        .await
        .unwrap_err();

        assert!(err.is_auth());
        assert_eq!(host.calls(), 1);
        let recorded = events.lock().unwrap().clone();
        assert_eq!(recorded, vec!["started", "failed"]);
    }

    #[tokio::test]
    async fn matching_validator_short_circuits_and_keeps_it() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<SyncStateModel>::new()])
            .append_query_results([vec![repo_state_row(
                SyncStatus::Completed,
                Some(r#"W/"cached""#),
            )]])
            .append_exec_results([ok_exec(), ok_exec(), ok_exec()])
            .into_connection();

        let host = FakeHost::default();
        host.push_repo_page(Ok(CollectionFetch::NotModified));

        let (callback, events) = collect_events();
        let outcome = sync_repositories(
            &db,
            &host,
            "user-1",
            &SyncOptions::default(),
            Some(&callback),
        )
        .await
        .unwrap();

        let stats = outcome.stats().expect("run should complete");
        assert!(stats.not_modified);
        assert_eq!(stats.pages, 0);
        assert_eq!(stats.upserted, 0);

        let recorded = events.lock().unwrap().clone();
        assert_eq!(recorded, vec!["started", "not_modified", "completed"]);
    }

    #[tokio::test]
    async fn tree_fetch_returns_content_and_persists_nothing_but_state() {
        let tree_id = ident::sync_state_id("tree", "user-1", Some("acme/api:main"));
        let now = Utc::now().fixed_offset();
        let tree_row = SyncStateModel {
            id: tree_id,
            resource_kind: ResourceKind::Tree,
            user_id: "user-1".to_string(),
            resource_ref: Some("acme/api:main".to_string()),
            status: SyncStatus::Idle,
            last_cursor: None,
            last_etag: None,
            last_error: None,
            last_synced_at: None,
            progress: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        };

        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<SyncStateModel>::new()])
            .append_query_results([vec![tree_row]])
            .append_exec_results([ok_exec(), ok_exec(), ok_exec()])
            .into_connection();

        let host = FakeHost::default();
        host.push_tree_fetch(Ok(DetailFetch::Fetched {
            value: GitHubTree {
                sha: "abc123".to_string(),
                truncated: false,
                tree: vec![],
            },
            etag: Some(r#"W/"tree""#.to_string()),
        }));

        let outcome = sync_tree(
            &db,
            &host,
            "user-1",
            "acme",
            "api",
            "main",
            true,
            &SyncOptions::default(),
            None,
        )
        .await
        .unwrap();

        match outcome {
            DetailSyncOutcome::Fetched(tree) => assert_eq!(tree.sha, "abc123"),
            other => panic!("expected fetched tree, got {other:?}"),
        }
        assert_eq!(host.calls(), 1);
    }
}
