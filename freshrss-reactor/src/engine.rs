//! Fixed-point rule evaluation.
//!
//! One call to [`Engine::reconcile`] handles one framework trigger. Rules are
//! swept in declaration order with guards re-read before every rule, so a flag
//! set by an earlier rule can enable a later one in the same sweep. Sweeps
//! repeat until one fires nothing. Each rule fires at most once per trigger.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use freshrss_core::Flag;

use crate::context::Context;
use crate::error::ReconcileError;
use crate::rules::{default_rules, Outcome, Rule, RuleId};

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// Why the framework woke the unit. Evaluation is level-triggered, so this is
/// recorded for logs and reports only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    ConfigChanged,
    RelationChanged,
    RelationDeparted,
    LeadershipChanged,
    #[default]
    UpdateStatus,
}

impl Trigger {
    pub fn all() -> &'static [Trigger] {
        &[
            Trigger::ConfigChanged,
            Trigger::RelationChanged,
            Trigger::RelationDeparted,
            Trigger::LeadershipChanged,
            Trigger::UpdateStatus,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::ConfigChanged => "config-changed",
            Trigger::RelationChanged => "relation-changed",
            Trigger::RelationDeparted => "relation-departed",
            Trigger::LeadershipChanged => "leadership-changed",
            Trigger::UpdateStatus => "update-status",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trigger::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| {
                let expected: Vec<_> = Trigger::all().iter().map(|t| t.as_str()).collect();
                format!("unknown trigger '{s}'; expected: {}", expected.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RuleOutcome {
    Completed,
    Deferred { reason: String },
}

/// One rule firing within a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredRule {
    pub rule: RuleId,
    #[serde(flatten)]
    pub outcome: RuleOutcome,
    pub set: Vec<Flag>,
    pub cleared: Vec<Flag>,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub trigger: Trigger,
    pub fired: Vec<FiredRule>,
    pub flags_before: BTreeSet<Flag>,
    pub flags_after: BTreeSet<Flag>,
}

impl PassReport {
    pub fn fired_ids(&self) -> Vec<RuleId> {
        self.fired.iter().map(|f| f.rule).collect()
    }

    pub fn did_fire(&self, rule: RuleId) -> bool {
        self.fired.iter().any(|f| f.rule == rule)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    rules: Vec<Rule>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl Engine {
    pub fn new(rules: Vec<Rule>) -> Self {
        debug_assert_eq!(
            rules.iter().map(|r| r.id).collect::<HashSet<_>>().len(),
            rules.len(),
            "rule ids must be unique"
        );
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run every eligible rule until no further rule can fire.
    ///
    /// An action error aborts the pass immediately; flags already set by
    /// earlier rules in the pass stay set.
    pub fn reconcile(
        &self,
        trigger: Trigger,
        ctx: &mut Context<'_>,
    ) -> Result<PassReport, ReconcileError> {
        let flags_before = ctx.state.flags().clone();
        let mut done: HashSet<RuleId> = HashSet::new();
        let mut fired = Vec::new();

        tracing::info!(%trigger, "reconciling");
        loop {
            let mut progressed = false;
            for rule in &self.rules {
                if done.contains(&rule.id) {
                    continue;
                }
                if !rule.guard.admits(ctx) {
                    tracing::debug!(rule = %rule.id, "guard not satisfied");
                    continue;
                }
                done.insert(rule.id);
                progressed = true;
                fired.push(fire(rule, ctx)?);
            }
            if !progressed {
                break;
            }
        }

        let flags_after = ctx.state.flags().clone();
        tracing::info!(
            %trigger,
            fired = fired.len(),
            flags = flags_after.len(),
            "reconcile complete"
        );
        Ok(PassReport {
            trigger,
            fired,
            flags_before,
            flags_after,
        })
    }
}

fn fire(rule: &Rule, ctx: &mut Context<'_>) -> Result<FiredRule, ReconcileError> {
    tracing::info!(rule = %rule.id, "firing");
    let outcome = (rule.action)(ctx).map_err(|source| {
        tracing::error!(rule = %rule.id, error = %source, "rule failed");
        ReconcileError::Action {
            rule: rule.id,
            source,
        }
    })?;

    let extra: &[Flag] = match &outcome {
        Outcome::Deferred(reason) => {
            tracing::warn!(rule = %rule.id, %reason, "deferred");
            return Ok(FiredRule {
                rule: rule.id,
                outcome: RuleOutcome::Deferred {
                    reason: reason.clone(),
                },
                set: vec![],
                cleared: vec![],
            });
        }
        Outcome::Completed => &[],
        Outcome::CompletedWith(flags) => *flags,
    };

    let mut set = Vec::new();
    for flag in extra.iter().chain(rule.sets) {
        if ctx.state.set_flag(*flag)? {
            set.push(*flag);
        }
    }
    let mut cleared = Vec::new();
    for flag in rule.clears {
        if ctx.state.clear_flag(*flag)? {
            cleared.push(*flag);
        }
    }

    Ok(FiredRule {
        rule: rule.id,
        outcome: RuleOutcome::Completed,
        set,
        cleared,
    })
}
