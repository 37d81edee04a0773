//! Subcommand handlers for the `forgemirrord` binary.

pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod pending;
pub(crate) mod serve;
pub(crate) mod status;
pub(crate) mod sync;
