//! The static rule table.
//!
//! Each [`Rule`] is a guard over local flags and external conditions, an
//! action body from [`crate::actions`], and the flags to set or clear once the
//! action completes. Flags are only touched after the action returns, so a
//! crash mid-action re-runs it on the next trigger.

use std::fmt;

use serde::Serialize;

use freshrss_core::{Condition, Flag};

use crate::actions;
use crate::context::Context;
use crate::error::ActionError;

// ---------------------------------------------------------------------------
// RuleId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    CheckManualDatabase,
    InitializeSystem,
    WaitForDatabase,
    RequestDatabase,
    AcquireDatabaseConfig,
    Install,
    ConfigureProxy,
    Ready,
    PublishPort,
    ResetManualDatabaseCheck,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::CheckManualDatabase => "check-manual-database",
            RuleId::InitializeSystem => "initialize-system",
            RuleId::WaitForDatabase => "wait-for-database",
            RuleId::RequestDatabase => "request-database",
            RuleId::AcquireDatabaseConfig => "acquire-database-config",
            RuleId::Install => "install",
            RuleId::ConfigureProxy => "configure-proxy",
            RuleId::Ready => "ready",
            RuleId::PublishPort => "publish-port",
            RuleId::ResetManualDatabaseCheck => "reset-manual-database-check",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// When a rule may fire.
#[derive(Debug, Clone, Copy)]
pub struct Guard {
    /// Every flag must be set.
    pub require: &'static [Flag],
    /// No flag may be set.
    pub forbid: &'static [Flag],
    /// Every condition must hold.
    pub all: &'static [Condition],
    /// At least one condition must hold; empty means no constraint.
    pub any: &'static [Condition],
}

impl Guard {
    pub const ALWAYS: Guard = Guard {
        require: &[],
        forbid: &[],
        all: &[],
        any: &[],
    };

    pub fn admits(&self, ctx: &Context<'_>) -> bool {
        self.require.iter().all(|f| ctx.state.is_set(*f))
            && !self.forbid.iter().any(|f| ctx.state.is_set(*f))
            && self.all.iter().all(|c| ctx.holds(*c))
            && (self.any.is_empty() || self.any.iter().any(|c| ctx.holds(*c)))
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// What an action body reports back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Apply the rule's declared effects.
    Completed,
    /// Apply the declared effects plus these flags (set first).
    CompletedWith(&'static [Flag]),
    /// Transient condition; no effects, retried on a later trigger.
    Deferred(String),
}

pub type Action = fn(&mut Context<'_>) -> Result<Outcome, ActionError>;

/// A guarded action. Plain fn pointers, so the table is built without boxing.
pub struct Rule {
    pub id: RuleId,
    pub guard: Guard,
    pub action: Action,
    pub sets: &'static [Flag],
    pub clears: &'static [Flag],
}

// ---------------------------------------------------------------------------
// Default rules (declaration order is evaluation order)
// ---------------------------------------------------------------------------

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: RuleId::CheckManualDatabase,
            guard: Guard {
                forbid: &[Flag::ManualDbCheckComplete],
                ..Guard::ALWAYS
            },
            action: actions::check_manual_database,
            sets: &[Flag::ManualDbCheckComplete],
            clears: &[],
        },
        Rule {
            id: RuleId::InitializeSystem,
            guard: Guard {
                forbid: &[Flag::SystemInitialized],
                all: &[Condition::PackagesInstalled],
                ..Guard::ALWAYS
            },
            action: actions::initialize_system,
            sets: &[Flag::SystemInitialized],
            clears: &[],
        },
        Rule {
            id: RuleId::WaitForDatabase,
            guard: Guard {
                require: &[Flag::SystemInitialized],
                forbid: &[Flag::DbConfigAcquired, Flag::DbWaiting],
                ..Guard::ALWAYS
            },
            action: actions::wait_for_database,
            sets: &[Flag::DbWaiting],
            clears: &[],
        },
        Rule {
            id: RuleId::RequestDatabase,
            guard: Guard {
                forbid: &[Flag::DbRequested],
                any: &[Condition::PgsqlConnected, Condition::MysqlConnected],
                ..Guard::ALWAYS
            },
            action: actions::request_database,
            sets: &[Flag::DbRequested],
            clears: &[],
        },
        Rule {
            id: RuleId::AcquireDatabaseConfig,
            guard: Guard {
                require: &[Flag::DbRequested],
                forbid: &[Flag::DbConfigAcquired],
                any: &[Condition::PgsqlMasterAvailable, Condition::MysqlAvailable],
                ..Guard::ALWAYS
            },
            action: actions::acquire_database_config,
            sets: &[Flag::DbConfigAcquired],
            clears: &[],
        },
        Rule {
            id: RuleId::Install,
            guard: Guard {
                require: &[Flag::DbConfigAcquired, Flag::SystemInitialized],
                forbid: &[Flag::Installed],
                ..Guard::ALWAYS
            },
            action: actions::install,
            sets: &[Flag::Installed],
            clears: &[],
        },
        Rule {
            id: RuleId::ConfigureProxy,
            guard: Guard {
                require: &[Flag::Installed],
                forbid: &[Flag::NginxConfigured],
                ..Guard::ALWAYS
            },
            action: actions::configure_proxy,
            sets: &[Flag::NginxConfigured],
            clears: &[],
        },
        Rule {
            id: RuleId::Ready,
            guard: Guard {
                require: &[Flag::Installed, Flag::NginxConfigured],
                forbid: &[Flag::Ready],
                ..Guard::ALWAYS
            },
            action: actions::ready,
            sets: &[Flag::Ready],
            clears: &[],
        },
        // No completion flag: the consumer may reconnect and need the port again.
        Rule {
            id: RuleId::PublishPort,
            guard: Guard {
                require: &[Flag::Ready],
                all: &[Condition::WebsiteAvailable],
                ..Guard::ALWAYS
            },
            action: actions::publish_port,
            sets: &[],
            clears: &[],
        },
        Rule {
            id: RuleId::ResetManualDatabaseCheck,
            guard: Guard {
                require: &[Flag::ManualDbCheckComplete],
                forbid: &[Flag::Ready, Flag::DbConfigAcquired],
                all: &[Condition::DbUriChanged],
                ..Guard::ALWAYS
            },
            action: actions::reset_manual_database_check,
            sets: &[],
            clears: &[Flag::ManualDbCheckComplete],
        },
    ]
}
