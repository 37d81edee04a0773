//! SeaORM entity definitions for the mirror database schema.

pub mod check_run;
pub mod comment;
pub mod comment_kind;
pub mod issue;
pub mod pending_event;
pub mod pending_status;
pub mod prelude;
pub mod pull_request;
pub mod repository;
pub mod resource_kind;
pub mod review;
pub mod sync_state;
pub mod sync_status;
pub mod webhook_delivery;
