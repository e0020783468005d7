//! `freshrss-charm reconcile`: one pass of the rule engine for a trigger.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use freshrss_core::{CharmConfig, UnitState};
use freshrss_reactor::{
    reconcile_unit, Collaborators, DbRelation, Engine, PassReport, RuleOutcome, Trigger,
};

use crate::adapters::{
    hooks::{HookFirewall, HookStatus},
    installer::ScriptInstaller,
    leadership::FileLeadership,
    relations::{Outbox, RelationDatabase, WebsiteRelation},
    site::NginxSite,
    world::{WorldFile, WorldPackages},
};

/// Arguments for `freshrss-charm reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Framework event that woke the unit.
    #[arg(long, default_value_t = Trigger::UpdateStatus)]
    pub trigger: Trigger,

    /// Charm configuration (YAML). Defaults to `<state-dir>/config.yaml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// World description (YAML). Defaults to `<state-dir>/world.yaml`.
    #[arg(long, value_name = "FILE")]
    pub world: Option<PathBuf>,

    /// FreshRSS installation directory.
    #[arg(long, value_name = "DIR", default_value = "/var/www/fresh-rss")]
    pub app_dir: PathBuf,

    /// nginx configuration root holding `sites-available/` and `sites-enabled/`.
    #[arg(long, value_name = "DIR", default_value = "/etc/nginx")]
    pub nginx_dir: PathBuf,

    /// Directory of `.tera` files overriding the built-in site templates.
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Emit the pass report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReconcileArgs {
    pub fn run(self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir)
            .with_context(|| format!("cannot create state dir {}", state_dir.display()))?;

        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| state_dir.join("config.yaml"));
        let config = CharmConfig::load_at(&config_path)?;
        let world_path = self
            .world
            .clone()
            .unwrap_or_else(|| state_dir.join("world.yaml"));
        let world = WorldFile::load_at(&world_path)?;

        let mut state = UnitState::open_dir(state_dir).context("failed to open unit state")?;

        let outbox = Outbox::in_dir(state_dir);
        let packages = WorldPackages::new(world.packages);
        let mut pgsql =
            RelationDatabase::new(DbRelation::Pgsql, world.relations.pgsql, outbox.clone());
        let mut mysql =
            RelationDatabase::new(DbRelation::Mysql, world.relations.mysql, outbox.clone());
        let mut website = WebsiteRelation::new(world.relations.website, outbox);
        let mut installer = ScriptInstaller::new(&self.app_dir);
        let mut site = NginxSite::new(&self.nginx_dir, self.templates.clone())
            .context("failed to load site templates")?;
        let mut firewall = HookFirewall::default();
        let mut leadership = FileLeadership::open(state_dir, world.leader)
            .context("failed to load leadership settings")?;
        let mut status = HookStatus::default();

        let world = Collaborators {
            packages: &packages,
            pgsql: &mut pgsql,
            mysql: &mut mysql,
            website: &mut website,
            installer: &mut installer,
            site: &mut site,
            firewall: &mut firewall,
            leadership: &mut leadership,
            status: &mut status,
        };
        let report = reconcile_unit(&Engine::default(), self.trigger, &mut state, &config, world)
            .with_context(|| format!("{} pass failed", self.trigger))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn print_report(report: &PassReport) {
    if report.fired.is_empty() {
        println!("✓ {}: nothing to do", report.trigger);
        return;
    }
    println!("✓ {}: {} rule(s) fired", report.trigger, report.fired.len());
    for fired in &report.fired {
        match &fired.outcome {
            RuleOutcome::Completed => {
                let mut effects: Vec<String> =
                    fired.set.iter().map(|f| format!("+{f}")).collect();
                effects.extend(fired.cleared.iter().map(|f| format!("-{f}")));
                if effects.is_empty() {
                    println!("  {} {}", "✓".green(), fired.rule);
                } else {
                    println!("  {} {}  {}", "✓".green(), fired.rule, effects.join(" ").dimmed());
                }
            }
            RuleOutcome::Deferred { reason } => {
                println!("  {} {} deferred: {reason}", "…".yellow(), fired.rule);
            }
        }
    }
}
