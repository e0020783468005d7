//! Error types for freshrss-reactor.

use thiserror::Error;

use freshrss_core::{ConfigError, StateError};

use crate::collaborators::CollaboratorError;
use crate::rules::RuleId;

/// Failure inside a single rule's action body.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// `fresh-rss.db.config.acquired` is set but the stored connection is incomplete.
    #[error("database config flagged as acquired but not present in unit state")]
    MissingConnection,
}

/// Fatal failure of a reconciliation pass. The pass is retried in full on the
/// next trigger.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("rule '{rule}' failed: {source}")]
    Action {
        rule: RuleId,
        #[source]
        source: ActionError,
    },

    #[error("state error: {0}")]
    State(#[from] StateError),
}
