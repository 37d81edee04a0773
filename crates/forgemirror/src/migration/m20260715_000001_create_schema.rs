//! Initial migration to create the mirror database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_sync_states(manager).await?;
        self.create_repositories(manager).await?;
        self.create_pull_requests(manager).await?;
        self.create_issues(manager).await?;
        self.create_reviews(manager).await?;
        self.create_comments(manager).await?;
        self.create_check_runs(manager).await?;
        self.create_webhook_deliveries(manager).await?;
        self.create_pending_events(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first so foreign keys never dangle mid-teardown.
        for table in [
            PendingEvents::Table.into_iden(),
            WebhookDeliveries::Table.into_iden(),
            CheckRuns::Table.into_iden(),
            Comments::Table.into_iden(),
            Reviews::Table.into_iden(),
            Issues::Table.into_iden(),
            PullRequests::Table.into_iden(),
            Repositories::Table.into_iden(),
            SyncStates::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

impl Migration {
    async fn create_sync_states(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncStates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Identity
                    .col(ColumnDef::new(SyncStates::ResourceKind).string().not_null())
                    .col(ColumnDef::new(SyncStates::UserId).string().not_null())
                    .col(ColumnDef::new(SyncStates::ResourceRef).string().null())
                    // State machine
                    .col(
                        ColumnDef::new(SyncStates::Status)
                            .string()
                            .not_null()
                            .default("idle"),
                    )
                    // Incremental fetch bookkeeping
                    .col(ColumnDef::new(SyncStates::LastCursor).text().null())
                    .col(ColumnDef::new(SyncStates::LastEtag).text().null())
                    // Outcome
                    .col(ColumnDef::new(SyncStates::LastError).text().null())
                    .col(
                        ColumnDef::new(SyncStates::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SyncStates::Progress)
                            .json()
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    // Timestamps
                    .col(
                        ColumnDef::new(SyncStates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SyncStates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (resource_kind, user_id, resource_ref).
        // Account-wide units carry a NULL ref; those are also deduplicated by
        // the deterministic primary key.
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_states_unit")
                    .table(SyncStates::Table)
                    .col(SyncStates::ResourceKind)
                    .col(SyncStates::UserId)
                    .col(SyncStates::ResourceRef)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Status listings per user
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_states_user_status")
                    .table(SyncStates::Table)
                    .col(SyncStates::UserId)
                    .col(SyncStates::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repositories::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Repositories::RemoteId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Repositories::Owner).string().not_null())
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(ColumnDef::new(Repositories::Description).text().null())
                    .col(
                        ColumnDef::new(Repositories::Private)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Repositories::Fork)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Repositories::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Repositories::DefaultBranch)
                            .string()
                            .not_null()
                            .default("main"),
                    )
                    .col(ColumnDef::new(Repositories::HtmlUrl).text().null())
                    .col(
                        ColumnDef::new(Repositories::PushedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (user_id, owner, name)
        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_user_owner_name")
                    .table(Repositories::Table)
                    .col(Repositories::UserId)
                    .col(Repositories::Owner)
                    .col(Repositories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Lookup by remote ID. Not unique: a repository renamed on the host
        // mints a new deterministic ID and leaves the old row behind.
        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_user_remote_id")
                    .table(Repositories::Table)
                    .col(Repositories::UserId)
                    .col(Repositories::RemoteId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_pull_requests(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Identity
                    .col(
                        ColumnDef::new(PullRequests::RepositoryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullRequests::UserId).string().not_null())
                    .col(ColumnDef::new(PullRequests::Number).integer().not_null())
                    .col(
                        ColumnDef::new(PullRequests::RemoteId)
                            .big_integer()
                            .not_null(),
                    )
                    // Content
                    .col(ColumnDef::new(PullRequests::Title).string().not_null())
                    .col(ColumnDef::new(PullRequests::Body).text().null())
                    .col(ColumnDef::new(PullRequests::State).string().not_null())
                    .col(
                        ColumnDef::new(PullRequests::Draft)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PullRequests::Merged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(PullRequests::Mergeable).boolean().null())
                    .col(
                        ColumnDef::new(PullRequests::Locked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(PullRequests::AuthorLogin).string().not_null())
                    // Branches
                    .col(ColumnDef::new(PullRequests::BaseRef).string().not_null())
                    .col(ColumnDef::new(PullRequests::HeadRef).string().not_null())
                    .col(ColumnDef::new(PullRequests::HeadSha).string().not_null())
                    // Collections
                    .col(
                        ColumnDef::new(PullRequests::Labels)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(PullRequests::RequestedReviewers)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(PullRequests::ViewedFiles)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    // Timestamps
                    .col(
                        ColumnDef::new(PullRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::MergedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pull_requests_repository")
                            .from(PullRequests::Table, PullRequests::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (repository_id, number)
        manager
            .create_index(
                Index::create()
                    .name("idx_pull_requests_repo_number")
                    .table(PullRequests::Table)
                    .col(PullRequests::RepositoryId)
                    .col(PullRequests::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Open-PR listings per user
        manager
            .create_index(
                Index::create()
                    .name("idx_pull_requests_user_state")
                    .table(PullRequests::Table)
                    .col(PullRequests::UserId)
                    .col(PullRequests::State)
                    .to_owned(),
            )
            .await?;

        // Check-run joins via head commit
        manager
            .create_index(
                Index::create()
                    .name("idx_pull_requests_head_sha")
                    .table(PullRequests::Table)
                    .col(PullRequests::HeadSha)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_issues(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issues::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Issues::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Issues::RepositoryId).uuid().not_null())
                    .col(ColumnDef::new(Issues::UserId).string().not_null())
                    .col(ColumnDef::new(Issues::Number).integer().not_null())
                    .col(ColumnDef::new(Issues::RemoteId).big_integer().not_null())
                    .col(ColumnDef::new(Issues::Title).string().not_null())
                    .col(ColumnDef::new(Issues::Body).text().null())
                    .col(ColumnDef::new(Issues::State).string().not_null())
                    .col(
                        ColumnDef::new(Issues::Locked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Issues::IsPullRequest)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Issues::AuthorLogin).string().not_null())
                    .col(
                        ColumnDef::new(Issues::Labels)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(Issues::Assignees)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(ColumnDef::new(Issues::CommentsCount).integer().null())
                    .col(
                        ColumnDef::new(Issues::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Issues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Issues::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Issues::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issues_repository")
                            .from(Issues::Table, Issues::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (repository_id, number)
        manager
            .create_index(
                Index::create()
                    .name("idx_issues_repo_number")
                    .table(Issues::Table)
                    .col(Issues::RepositoryId)
                    .col(Issues::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Open-issue listings per user
        manager
            .create_index(
                Index::create()
                    .name("idx_issues_user_state")
                    .table(Issues::Table)
                    .col(Issues::UserId)
                    .col(Issues::State)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_reviews(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reviews::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Reviews::PullRequestId).uuid().not_null())
                    .col(ColumnDef::new(Reviews::UserId).string().not_null())
                    .col(ColumnDef::new(Reviews::RemoteId).big_integer().not_null())
                    .col(ColumnDef::new(Reviews::AuthorLogin).string().not_null())
                    .col(ColumnDef::new(Reviews::State).string().not_null())
                    .col(ColumnDef::new(Reviews::Body).text().null())
                    .col(ColumnDef::new(Reviews::CommitSha).string().null())
                    .col(
                        ColumnDef::new(Reviews::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Reviews::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_pull_request")
                            .from(Reviews::Table, Reviews::PullRequestId)
                            .to(PullRequests::Table, PullRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (user_id, remote_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_user_remote_id")
                    .table(Reviews::Table)
                    .col(Reviews::UserId)
                    .col(Reviews::RemoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Reviews of one pull request
        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_pull_request")
                    .table(Reviews::Table)
                    .col(Reviews::PullRequestId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_comments(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comments::Kind).string().not_null())
                    .col(ColumnDef::new(Comments::PullRequestId).uuid().null())
                    .col(ColumnDef::new(Comments::IssueId).uuid().null())
                    .col(ColumnDef::new(Comments::UserId).string().not_null())
                    .col(ColumnDef::new(Comments::RemoteId).big_integer().not_null())
                    .col(ColumnDef::new(Comments::AuthorLogin).string().not_null())
                    .col(ColumnDef::new(Comments::Body).text().not_null())
                    .col(ColumnDef::new(Comments::Path).string().null())
                    .col(ColumnDef::new(Comments::Line).integer().null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Comments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Comments::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_pull_request")
                            .from(Comments::Table, Comments::PullRequestId)
                            .to(PullRequests::Table, PullRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_issue")
                            .from(Comments::Table, Comments::IssueId)
                            .to(Issues::Table, Issues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (user_id, kind, remote_id); the two comment
        // families have independent remote ID spaces.
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_user_kind_remote_id")
                    .table(Comments::Table)
                    .col(Comments::UserId)
                    .col(Comments::Kind)
                    .col(Comments::RemoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_pull_request")
                    .table(Comments::Table)
                    .col(Comments::PullRequestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_issue")
                    .table(Comments::Table)
                    .col(Comments::IssueId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_check_runs(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CheckRuns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CheckRuns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CheckRuns::RepositoryId).uuid().not_null())
                    .col(ColumnDef::new(CheckRuns::UserId).string().not_null())
                    .col(ColumnDef::new(CheckRuns::RemoteId).big_integer().not_null())
                    .col(ColumnDef::new(CheckRuns::HeadSha).string().not_null())
                    .col(ColumnDef::new(CheckRuns::Name).string().not_null())
                    .col(ColumnDef::new(CheckRuns::Status).string().not_null())
                    .col(ColumnDef::new(CheckRuns::Conclusion).string().null())
                    .col(ColumnDef::new(CheckRuns::DetailsUrl).text().null())
                    .col(
                        ColumnDef::new(CheckRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CheckRuns::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CheckRuns::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_check_runs_repository")
                            .from(CheckRuns::Table, CheckRuns::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (user_id, remote_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_check_runs_user_remote_id")
                    .table(CheckRuns::Table)
                    .col(CheckRuns::UserId)
                    .col(CheckRuns::RemoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Checks for one commit
        manager
            .create_index(
                Index::create()
                    .name("idx_check_runs_repo_head_sha")
                    .table(CheckRuns::Table)
                    .col(CheckRuns::RepositoryId)
                    .col(CheckRuns::HeadSha)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_webhook_deliveries(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebhookDeliveries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebhookDeliveries::DeliveryId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebhookDeliveries::Event).string().not_null())
                    .col(
                        ColumnDef::new(WebhookDeliveries::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Retention pruning scans by age
        manager
            .create_index(
                Index::create()
                    .name("idx_webhook_deliveries_received_at")
                    .table(WebhookDeliveries::Table)
                    .col(WebhookDeliveries::ReceivedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_pending_events(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PendingEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PendingEvents::DeliveryId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingEvents::Event).string().not_null())
                    .col(ColumnDef::new(PendingEvents::UserId).string().not_null())
                    .col(ColumnDef::new(PendingEvents::Payload).json().not_null())
                    .col(
                        ColumnDef::new(PendingEvents::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PendingEvents::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PendingEvents::NextAttemptAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingEvents::LastError).text().null())
                    .col(
                        ColumnDef::new(PendingEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PendingEvents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One parked event per delivery
        manager
            .create_index(
                Index::create()
                    .name("idx_pending_events_delivery_id")
                    .table(PendingEvents::Table)
                    .col(PendingEvents::DeliveryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Due-event scans
        manager
            .create_index(
                Index::create()
                    .name("idx_pending_events_status_next_attempt")
                    .table(PendingEvents::Table)
                    .col(PendingEvents::Status)
                    .col(PendingEvents::NextAttemptAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "sync_states")]
enum SyncStates {
    Table,
    Id,
    ResourceKind,
    UserId,
    ResourceRef,
    Status,
    LastCursor,
    LastEtag,
    LastError,
    LastSyncedAt,
    Progress,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "repositories")]
enum Repositories {
    Table,
    Id,
    UserId,
    RemoteId,
    Owner,
    Name,
    Description,
    Private,
    Fork,
    Archived,
    DefaultBranch,
    HtmlUrl,
    PushedAt,
    CreatedAt,
    UpdatedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "pull_requests")]
enum PullRequests {
    Table,
    Id,
    RepositoryId,
    UserId,
    Number,
    RemoteId,
    Title,
    Body,
    State,
    Draft,
    Merged,
    Mergeable,
    Locked,
    AuthorLogin,
    BaseRef,
    HeadRef,
    HeadSha,
    Labels,
    RequestedReviewers,
    ViewedFiles,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
    MergedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "issues")]
enum Issues {
    Table,
    Id,
    RepositoryId,
    UserId,
    Number,
    RemoteId,
    Title,
    Body,
    State,
    Locked,
    IsPullRequest,
    AuthorLogin,
    Labels,
    Assignees,
    CommentsCount,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "reviews")]
enum Reviews {
    Table,
    Id,
    PullRequestId,
    UserId,
    RemoteId,
    AuthorLogin,
    State,
    Body,
    CommitSha,
    SubmittedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "comments")]
enum Comments {
    Table,
    Id,
    Kind,
    PullRequestId,
    IssueId,
    UserId,
    RemoteId,
    AuthorLogin,
    Body,
    Path,
    Line,
    CreatedAt,
    UpdatedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "check_runs")]
enum CheckRuns {
    Table,
    Id,
    RepositoryId,
    UserId,
    RemoteId,
    HeadSha,
    Name,
    Status,
    Conclusion,
    DetailsUrl,
    StartedAt,
    CompletedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "pending_events")]
enum PendingEvents {
    Table,
    Id,
    DeliveryId,
    Event,
    UserId,
    Payload,
    Status,
    Attempts,
    NextAttemptAt,
    LastError,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "webhook_deliveries")]
enum WebhookDeliveries {
    Table,
    DeliveryId,
    Event,
    ReceivedAt,
}
