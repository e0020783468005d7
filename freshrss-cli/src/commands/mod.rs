//! Subcommand implementations.

pub mod reconcile;
pub mod status;
