//! The webhook ingestion pipeline.
//!
//! Push-based counterpart to [`crate::sync`]: a signed delivery becomes the
//! same local mutation a pull sync would have produced, keyed by the same
//! deterministic IDs, so both paths converge on one row. The pipeline order
//! is fixed: verify the signature against the raw body, short-circuit
//! replayed delivery IDs, dispatch the typed payload, resolve the parent
//! row, upsert. An event whose parent is not mirrored yet is parked in the
//! pending queue instead of being dropped.
//!
//! The delivery ID is recorded only after the mutation has been applied or
//! durably queued. A crash mid-pipeline leaves the ID unrecorded, so the
//! host's redelivery of the same event runs the pipeline again.

use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::error::IngestError;
use super::event::WebhookEvent;
use super::signature::verify_signature;
use crate::entity::prelude::*;
use crate::github::{
    CommentParent, to_check_run_model, to_comment_model, to_issue_model,
    to_pull_request_detail_model, to_review_model,
};
use crate::pending::{self, RetryPolicy};
use crate::store::{self, StoreError};

/// How long processed delivery IDs are kept for dedup. The host does not
/// redeliver events older than this.
pub const DELIVERY_RETENTION: std::time::Duration =
    std::time::Duration::from_secs(30 * 24 * 60 * 60);

const ACTION_DELETED: &str = "deleted";

/// One inbound delivery as read off the wire, before any trust is placed
/// in it.
#[derive(Debug, Clone, Copy)]
pub struct RawDelivery<'a> {
    /// `X-GitHub-Delivery` header.
    pub delivery_id: &'a str,
    /// `X-GitHub-Event` header.
    pub event: &'a str,
    /// `X-Hub-Signature-256` header, if present.
    pub signature: Option<&'a str>,
    /// Raw request body.
    pub body: &'a [u8],
}

/// What a verified delivery did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event's mutation was applied.
    Applied,
    /// The delivery ID was seen before; nothing was reapplied.
    Duplicate,
    /// The parent resource is not mirrored yet; the event is parked for
    /// replay.
    Deferred,
    /// The event carries nothing to mirror.
    Ignored,
}

/// How far one event's mutation got.
#[derive(Debug)]
pub(crate) enum Applied {
    /// Upsert done.
    Done,
    /// Nothing to do for this event or action.
    Nothing,
    /// The row the event hangs off is not mirrored; the message says which.
    ParentMissing(String),
}

/// Run one delivery through the full pipeline.
///
/// Replayed deliveries are acknowledged without reapplying anything, which
/// makes redelivery from the host safe. `retry` governs the replay schedule
/// when the event has to be parked.
///
/// # Errors
/// [`IngestError::Signature`] when authentication fails, the unsupported
/// and malformed variants when the payload cannot be dispatched, and
/// [`IngestError::Store`] when a local write fails. No delivery ID is
/// recorded in any error case.
pub async fn ingest_webhook(
    db: &DatabaseConnection,
    secret: &str,
    retry: &RetryPolicy,
    user_id: &str,
    delivery: RawDelivery<'_>,
) -> Result<IngestOutcome, IngestError> {
    verify_signature(secret, delivery.body, delivery.signature)?;

    if delivery_seen(db, delivery.delivery_id).await? {
        tracing::debug!(
            "delivery {} ({}) already processed",
            delivery.delivery_id,
            delivery.event
        );
        return Ok(IngestOutcome::Duplicate);
    }

    let payload: serde_json::Value = serde_json::from_slice(delivery.body)
        .map_err(|source| IngestError::malformed(delivery.event, source))?;
    let event = WebhookEvent::parse(delivery.event, &payload)?;

    let outcome = match apply_event(db, user_id, &event).await? {
        Applied::Done => IngestOutcome::Applied,
        Applied::Nothing => IngestOutcome::Ignored,
        Applied::ParentMissing(reason) => {
            tracing::info!(
                "parking delivery {} ({}): {reason}",
                delivery.delivery_id,
                delivery.event
            );
            pending::park_event(
                db,
                user_id,
                delivery.delivery_id,
                delivery.event,
                payload,
                &reason,
                retry,
            )
            .await?;
            IngestOutcome::Deferred
        }
    };

    record_delivery(db, delivery.delivery_id, delivery.event).await?;
    Ok(outcome)
}

/// Apply one event's mutation to the mirror.
///
/// Parent rows are looked up through the same deterministic IDs the sync
/// path writes. Comment parents resolve pull-request-first and fall back to
/// the issue row, matching how a comment sync attaches them.
pub(crate) async fn apply_event(
    db: &DatabaseConnection,
    user_id: &str,
    event: &WebhookEvent,
) -> Result<Applied, StoreError> {
    match event {
        WebhookEvent::Ping => Ok(Applied::Nothing),

        WebhookEvent::PullRequest(event) => {
            let owner = &event.repository.owner.login;
            let name = &event.repository.name;
            if store::find_repository(db, user_id, owner, name)
                .await?
                .is_none()
            {
                return Ok(Applied::ParentMissing(format!(
                    "repository {owner}/{name} is not mirrored for {user_id}"
                )));
            }
            let model = to_pull_request_detail_model(user_id, owner, name, &event.pull_request);
            store::merge_upsert(db, model).await?;
            Ok(Applied::Done)
        }

        WebhookEvent::Review(event) => {
            let owner = &event.repository.owner.login;
            let name = &event.repository.name;
            let number = event.pull_request.number;
            match store::find_pull_request(db, user_id, owner, name, number).await? {
                None => Ok(Applied::ParentMissing(format!(
                    "pull request {owner}/{name}#{number} is not mirrored for {user_id}"
                ))),
                Some(pr) => {
                    let model = to_review_model(user_id, pr.id, &event.review);
                    store::merge_upsert(db, model).await?;
                    Ok(Applied::Done)
                }
            }
        }

        WebhookEvent::IssueComment(event) => {
            if event.action == ACTION_DELETED {
                tracing::debug!("keeping last observed state of comment {}", event.comment.id);
                return Ok(Applied::Nothing);
            }
            let owner = &event.repository.owner.login;
            let name = &event.repository.name;
            let number = event.issue.number;
            match find_comment_parent(db, user_id, owner, name, number).await? {
                None => Ok(Applied::ParentMissing(format!(
                    "{owner}/{name}#{number} is not mirrored for {user_id}"
                ))),
                Some(parent) => {
                    let model = to_comment_model(user_id, CommentKind::Issue, parent, &event.comment);
                    store::merge_upsert(db, model).await?;
                    Ok(Applied::Done)
                }
            }
        }

        WebhookEvent::ReviewComment(event) => {
            if event.action == ACTION_DELETED {
                tracing::debug!("keeping last observed state of comment {}", event.comment.id);
                return Ok(Applied::Nothing);
            }
            let owner = &event.repository.owner.login;
            let name = &event.repository.name;
            let number = event.pull_request.number;
            match store::find_pull_request(db, user_id, owner, name, number).await? {
                None => Ok(Applied::ParentMissing(format!(
                    "pull request {owner}/{name}#{number} is not mirrored for {user_id}"
                ))),
                Some(pr) => {
                    let parent = CommentParent::PullRequest(pr.id);
                    let model = to_comment_model(user_id, CommentKind::Review, parent, &event.comment);
                    store::merge_upsert(db, model).await?;
                    Ok(Applied::Done)
                }
            }
        }

        WebhookEvent::Issues(event) => {
            if event.action == ACTION_DELETED {
                tracing::debug!("keeping last observed state of issue #{}", event.issue.number);
                return Ok(Applied::Nothing);
            }
            let owner = &event.repository.owner.login;
            let name = &event.repository.name;
            if store::find_repository(db, user_id, owner, name)
                .await?
                .is_none()
            {
                return Ok(Applied::ParentMissing(format!(
                    "repository {owner}/{name} is not mirrored for {user_id}"
                )));
            }
            let model = to_issue_model(user_id, owner, name, &event.issue);
            store::merge_upsert(db, model).await?;
            Ok(Applied::Done)
        }

        WebhookEvent::CheckRun(event) => {
            let owner = &event.repository.owner.login;
            let name = &event.repository.name;
            match store::find_repository(db, user_id, owner, name).await? {
                None => Ok(Applied::ParentMissing(format!(
                    "repository {owner}/{name} is not mirrored for {user_id}"
                ))),
                Some(repo) => {
                    let model = to_check_run_model(user_id, repo.id, &event.check_run);
                    store::merge_upsert(db, model).await?;
                    Ok(Applied::Done)
                }
            }
        }
    }
}

async fn find_comment_parent(
    db: &DatabaseConnection,
    user_id: &str,
    owner: &str,
    name: &str,
    number: i32,
) -> Result<Option<CommentParent>, StoreError> {
    if let Some(pr) = store::find_pull_request(db, user_id, owner, name, number).await? {
        return Ok(Some(CommentParent::PullRequest(pr.id)));
    }
    let issue = store::find_issue(db, user_id, owner, name, number).await?;
    Ok(issue.map(|issue| CommentParent::Issue(issue.id)))
}

async fn delivery_seen(db: &DatabaseConnection, delivery_id: &str) -> Result<bool, StoreError> {
    let row = WebhookDelivery::find_by_id(delivery_id.to_string())
        .one(db)
        .await?;
    Ok(row.is_some())
}

async fn record_delivery(
    db: &DatabaseConnection,
    delivery_id: &str,
    event: &str,
) -> Result<(), StoreError> {
    let model = WebhookDeliveryActiveModel {
        delivery_id: Set(delivery_id.to_string()),
        event: Set(event.to_string()),
        received_at: Set(Utc::now().fixed_offset()),
    };
    store::insert_if_absent(db, model).await?;
    Ok(())
}

/// Drop processed-delivery rows older than `keep`, so the dedup ledger
/// stays bounded. Returns how many rows went.
pub async fn prune_deliveries(
    db: &DatabaseConnection,
    keep: std::time::Duration,
) -> Result<u64, StoreError> {
    let cutoff = Utc::now().fixed_offset() - chrono::Duration::milliseconds(keep.as_millis() as i64);
    let result = WebhookDelivery::delete_many()
        .filter(WebhookDeliveryColumn::ReceivedAt.lt(cutoff))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        tracing::debug!("pruned {} processed delivery ids", result.rows_affected);
    }
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident;
    use crate::webhook::signature::sign_body;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    const SECRET: &str = "s3cret";
    const USER: &str = "user-1";

    fn ok_exec() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn repo_row() -> RepositoryModel {
        RepositoryModel {
            id: ident::repository_id(USER, "acme", "api"),
            user_id: USER.to_string(),
            remote_id: 12345,
            owner: "acme".to_string(),
            name: "api".to_string(),
            description: None,
            private: false,
            fork: false,
            archived: false,
            default_branch: "main".to_string(),
            html_url: None,
            pushed_at: None,
            created_at: None,
            updated_at: None,
            synced_at: Utc::now().fixed_offset(),
        }
    }

    fn pr_row() -> PullRequestModel {
        PullRequestModel {
            id: ident::pull_request_id(USER, "acme", "api", 7),
            repository_id: ident::repository_id(USER, "acme", "api"),
            user_id: USER.to_string(),
            number: 7,
            remote_id: 9001,
            title: "Add pagination".to_string(),
            body: None,
            state: "open".to_string(),
            draft: false,
            merged: false,
            mergeable: None,
            locked: false,
            author_login: "octocat".to_string(),
            base_ref: "main".to_string(),
            head_ref: "feature".to_string(),
            head_sha: "bbb222".to_string(),
            labels: json!([]),
            requested_reviewers: json!([]),
            viewed_files: json!([]),
            created_at: None,
            updated_at: None,
            closed_at: None,
            merged_at: None,
            synced_at: Utc::now().fixed_offset(),
        }
    }

    fn repository_json() -> serde_json::Value {
        json!({
            "id": 12345,
            "name": "api",
            "owner": {"id": 1, "login": "acme"},
            "description": null,
            "default_branch": "main",
            "html_url": null,
            "pushed_at": null,
            "created_at": null,
            "updated_at": null,
        })
    }

    fn pull_request_body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "action": "opened",
            "pull_request": {
                "id": 9001,
                "number": 7,
                "title": "Add pagination",
                "body": null,
                "state": "open",
                "merged": false,
                "mergeable": true,
                "user": {"id": 2, "login": "octocat"},
                "base": {"ref": "main", "sha": "aaa111"},
                "head": {"ref": "feature", "sha": "bbb222"},
                "created_at": null,
                "updated_at": null,
                "closed_at": null,
                "merged_at": null,
            },
            "repository": repository_json(),
        }))
        .unwrap()
    }

    fn review_comment_body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "action": "created",
            "comment": {
                "id": 777,
                "user": {"id": 2, "login": "octocat"},
                "body": "nit: rename this",
                "path": "src/lib.rs",
                "line": 14,
                "created_at": null,
                "updated_at": null,
            },
            "pull_request": {"id": 9001, "number": 7},
            "repository": repository_json(),
        }))
        .unwrap()
    }

    fn delivery_row() -> WebhookDeliveryModel {
        WebhookDeliveryModel {
            delivery_id: "dlv-1".to_string(),
            event: "pull_request".to_string(),
            received_at: Utc::now().fixed_offset(),
        }
    }

    async fn deliver(
        db: &DatabaseConnection,
        event: &str,
        body: &[u8],
    ) -> Result<IngestOutcome, IngestError> {
        let header = sign_body(SECRET, body);
        ingest_webhook(
            db,
            SECRET,
            &RetryPolicy::default(),
            USER,
            RawDelivery {
                delivery_id: "dlv-1",
                event,
                signature: Some(&header),
                body,
            },
        )
        .await
    }

    #[tokio::test]
    async fn applied_event_upserts_and_records_the_delivery() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<WebhookDeliveryModel>::new()])
            .append_query_results([vec![repo_row()]])
            .append_exec_results([ok_exec(), ok_exec()])
            .into_connection();

        let outcome = deliver(&db, "pull_request", &pull_request_body())
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Applied);
    }

    #[tokio::test]
    async fn replayed_delivery_is_acknowledged_without_reapplying() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![delivery_row()]])
            .into_connection();

        let outcome = deliver(&db, "pull_request", &pull_request_body())
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Duplicate);
    }

    #[tokio::test]
    async fn missing_parent_parks_the_event() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<WebhookDeliveryModel>::new()])
            .append_query_results([Vec::<RepositoryModel>::new()])
            .append_exec_results([ok_exec(), ok_exec()])
            .into_connection();

        let outcome = deliver(&db, "pull_request", &pull_request_body())
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Deferred);
    }

    #[tokio::test]
    async fn bad_signature_stops_before_any_database_work() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let body = pull_request_body();
        let header = sign_body("wrong-secret", &body);
        let err = ingest_webhook(
            &db,
            SECRET,
            &RetryPolicy::default(),
            USER,
            RawDelivery {
                delivery_id: "dlv-1",
                event: "pull_request",
                signature: Some(&header),
                body: &body,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, IngestError::Signature(_)));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_without_a_write() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<WebhookDeliveryModel>::new()])
            .into_connection();

        let err = deliver(&db, "pull_request", b"not json").await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedPayload { .. }));
    }

    #[tokio::test]
    async fn unsupported_event_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<WebhookDeliveryModel>::new()])
            .into_connection();

        let err = deliver(&db, "gollum", br#"{"action":"created"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedEvent { event } if event == "gollum"));
    }

    #[tokio::test]
    async fn review_comment_attaches_to_the_pull_request_row() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<WebhookDeliveryModel>::new()])
            .append_query_results([vec![pr_row()]])
            .append_exec_results([ok_exec(), ok_exec()])
            .into_connection();

        let outcome = deliver(&db, "pull_request_review_comment", &review_comment_body())
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Applied);
    }

    #[tokio::test]
    async fn ping_is_recorded_but_mirrors_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<WebhookDeliveryModel>::new()])
            .append_exec_results([ok_exec()])
            .into_connection();

        let outcome = deliver(&db, "ping", br#"{"zen":"Keep it logically awesome."}"#)
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Ignored);
    }

    #[tokio::test]
    async fn deleted_comment_keeps_the_mirrored_row() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<WebhookDeliveryModel>::new()])
            .append_exec_results([ok_exec()])
            .into_connection();

        let body = serde_json::to_vec(&json!({
            "action": "deleted",
            "comment": {"id": 777, "user": {"id": 2, "login": "octocat"}, "body": "gone"},
            "pull_request": {"id": 9001, "number": 7},
            "repository": repository_json(),
        }))
        .unwrap();

        let outcome = deliver(&db, "pull_request_review_comment", &body)
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Ignored);
    }
}
