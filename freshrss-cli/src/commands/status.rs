//! `freshrss-charm status`: persisted flags and database connection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use freshrss_core::{ConnectionConfig, Flag, UnitState};

const MASK: &str = "****";

/// Arguments for `freshrss-charm status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, state_dir: &Path) -> Result<()> {
        let state = UnitState::open_dir(state_dir).context("failed to open unit state")?;
        let connection = state
            .connection()
            .context("failed to read database connection")?
            .map(masked);

        if self.json {
            print_json(&state, connection)?;
            return Ok(());
        }
        print_table(&state, connection.as_ref());
        Ok(())
    }
}

fn masked(mut connection: ConnectionConfig) -> ConnectionConfig {
    if !connection.password.is_empty() {
        connection.password = MASK.to_string();
    }
    connection
}

#[derive(Serialize)]
struct StatusJson {
    updated_at: DateTime<Utc>,
    flags: BTreeMap<&'static str, bool>,
    connection: Option<ConnectionConfig>,
}

#[derive(Tabled)]
struct FlagRow {
    #[tabled(rename = "flag")]
    flag: &'static str,
    #[tabled(rename = "state")]
    state: &'static str,
}

fn print_json(state: &UnitState, connection: Option<ConnectionConfig>) -> Result<()> {
    let payload = StatusJson {
        updated_at: state.updated_at(),
        flags: Flag::all()
            .iter()
            .map(|f| (f.as_str(), state.is_set(*f)))
            .collect(),
        connection,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(state: &UnitState, connection: Option<&ConnectionConfig>) {
    let set = state.flags().len();
    println!(
        "FreshRSS unit v{} | {}/{} flags set | updated {} ago",
        env!("CARGO_PKG_VERSION"),
        set,
        Flag::all().len(),
        format_age(state.updated_at()),
    );

    let rows: Vec<FlagRow> = Flag::all()
        .iter()
        .map(|f| FlagRow {
            flag: f.as_str(),
            state: if state.is_set(*f) { "SET" } else { "-" },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if state.is_set(Flag::Ready) {
        println!("{} ready", "■".green().bold());
    } else {
        println!("{} not ready", "■".yellow().bold());
    }

    match connection {
        Some(c) => println!(
            "database: {}://{}:{}@{}/{}",
            c.scheme,
            c.user,
            c.password,
            c.host,
            c.base.trim_start_matches('/')
        ),
        None => println!("database: {}", "not acquired".bright_black()),
    }
}

fn format_age(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0);
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 60 * 60 => format!("{}m", s / 60),
        s if s < 60 * 60 * 24 => format!("{}h", s / (60 * 60)),
        s => format!("{}d", s / (60 * 60 * 24)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freshrss_core::DbScheme;

    #[test]
    fn password_is_masked_when_present() {
        let conn = ConnectionConfig {
            scheme: DbScheme::Pgsql,
            user: "u".into(),
            password: "hunter2".into(),
            host: "h".into(),
            base: "/d".into(),
        };
        assert_eq!(masked(conn.clone()).password, MASK);
        let empty = ConnectionConfig {
            password: String::new(),
            ..conn
        };
        assert_eq!(masked(empty).password, "");
    }

    #[test]
    fn age_uses_largest_unit() {
        assert_eq!(format_age(Utc::now() - chrono::Duration::seconds(90)), "1m");
        assert_eq!(format_age(Utc::now() - chrono::Duration::hours(50)), "2d");
    }
}
