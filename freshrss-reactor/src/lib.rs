//! # freshrss-reactor
//!
//! Flag-driven reconciliation for a FreshRSS unit.
//!
//! [`rules::default_rules`] declares every guarded action; the [`Engine`]
//! evaluates them to a fixed point against the unit's persisted flags and the
//! outside world exposed through [`collaborators`]. Call
//! [`pipeline::reconcile_unit`] once per framework trigger.

pub mod actions;
pub mod collaborators;
pub mod context;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod rules;

pub use collaborators::{
    CollaboratorError, DatabaseEndpoint, DbCredentials, Firewall, InstallOptions, Installer,
    Leadership, PackageSource, SiteConfigurator, SiteRequest, Status, StatusReporter,
    WebsiteEndpoint,
};
pub use context::{Collaborators, Context, DbRelation};
pub use engine::{Engine, FiredRule, PassReport, RuleOutcome, Trigger};
pub use error::{ActionError, ReconcileError};
pub use pipeline::reconcile_unit;
pub use rules::{default_rules, Guard, Outcome, Rule, RuleId};
