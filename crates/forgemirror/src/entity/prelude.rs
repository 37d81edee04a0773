//! Common re-exports for convenient entity usage.

pub use super::check_run::{
    ActiveModel as CheckRunActiveModel, Column as CheckRunColumn, Entity as CheckRun,
    Model as CheckRunModel,
};
pub use super::comment::{
    ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as Comment,
    Model as CommentModel,
};
pub use super::comment_kind::CommentKind;
pub use super::issue::{
    ActiveModel as IssueActiveModel, Column as IssueColumn, Entity as Issue, Model as IssueModel,
};
pub use super::pending_event::{
    ActiveModel as PendingEventActiveModel, Column as PendingEventColumn, Entity as PendingEvent,
    Model as PendingEventModel,
};
pub use super::pending_status::PendingStatus;
pub use super::pull_request::{
    ActiveModel as PullRequestActiveModel, Column as PullRequestColumn, Entity as PullRequest,
    Model as PullRequestModel,
};
pub use super::repository::{
    ActiveModel as RepositoryActiveModel, Column as RepositoryColumn, Entity as Repository,
    Model as RepositoryModel,
};
pub use super::resource_kind::ResourceKind;
pub use super::review::{
    ActiveModel as ReviewActiveModel, Column as ReviewColumn, Entity as Review,
    Model as ReviewModel,
};
pub use super::sync_state::{
    ActiveModel as SyncStateActiveModel, Column as SyncStateColumn, Entity as SyncState,
    Model as SyncStateModel,
};
pub use super::sync_status::SyncStatus;
pub use super::webhook_delivery::{
    ActiveModel as WebhookDeliveryActiveModel, Column as WebhookDeliveryColumn,
    Entity as WebhookDelivery, Model as WebhookDeliveryModel,
};
