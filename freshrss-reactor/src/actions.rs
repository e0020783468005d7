//! Rule bodies.
//!
//! Each action does its work and writes any derived data *before* returning;
//! the engine sets the rule's completion flags afterwards.

use freshrss_core::{CharmConfig, ClusterFact, ConnectionConfig, DatabaseRequest, Flag};

use crate::collaborators::{InstallOptions, SiteRequest, Status};
use crate::context::{Context, DbRelation};
use crate::error::ActionError;
use crate::rules::Outcome;

pub const SITE_NAME: &str = "fresh-rss";
pub const SITE_TEMPLATE: &str = "fresh-rss.conf";

/// Parse an operator-supplied `db-uri`, if any.
pub fn check_manual_database(ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    let Some(uri) = ctx.config.db_uri() else {
        tracing::info!("manual database not configured");
        return Ok(Outcome::Completed);
    };
    let connection = ConnectionConfig::from_uri(uri)?;
    ctx.state.set_connection(&connection)?;
    tracing::info!(scheme = %connection.scheme, host = %connection.host, "manual database configured");
    Ok(Outcome::CompletedWith(&[Flag::DbConfigAcquired]))
}

pub fn initialize_system(_ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    tracing::info!("all required packages installed");
    Ok(Outcome::Completed)
}

pub fn wait_for_database(ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    ctx.report(Status::waiting(
        "Waiting for database relation or configuration",
    ));
    Ok(Outcome::Completed)
}

/// Ask the connected provider for a database, postgres first.
pub fn request_database(ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    let Some(relation) = ctx.first_relation(DbRelation::connected) else {
        return Ok(Outcome::Deferred("no database relation connected".into()));
    };
    let request = DatabaseRequest::FRESH_RSS;
    ctx.database(relation).request(&request)?;
    tracing::info!(relation = relation.name(), database = request.database, "database requested");
    Ok(Outcome::Completed)
}

/// Copy provider credentials into unit state in a single write.
pub fn acquire_database_config(ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    let Some(relation) = ctx.first_relation(DbRelation::available) else {
        return Ok(Outcome::Deferred("no database relation available".into()));
    };
    let request = DatabaseRequest::FRESH_RSS;
    let Some(creds) = ctx.database(relation).credentials(&request) else {
        tracing::error!(relation = relation.name(), "database relation not found");
        return Ok(Outcome::Deferred(format!(
            "{} relation reported available but could not be resolved",
            relation.name()
        )));
    };
    let connection = ConnectionConfig {
        scheme: relation.scheme(),
        user: creds.user,
        password: creds.password,
        host: creds.host,
        base: creds.database,
    };
    ctx.state.set_connection(&connection)?;
    ctx.report(Status::active("Fresh-RSS Database Acquired"));
    Ok(Outcome::Completed)
}

/// Arguments for the application's `do-install` script, in the order it expects.
pub fn install_options(config: &CharmConfig, connection: &ConnectionConfig) -> InstallOptions {
    let mut opts = InstallOptions::new();
    opts.push("--default_user", &config.default_admin_username)
        .push("--base_url", &config.fqdn)
        .push("--environment", &config.environment)
        .push("--db-type", connection.scheme.as_str())
        .push("--db-base", &connection.base)
        .push("--db-user", &connection.user)
        .push("--db-password", &connection.password)
        .push("--db-host", &connection.host)
        .push("--db-prefix", &config.db_prefix);
    opts
}

pub fn install(ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    let connection = ctx
        .state
        .connection()?
        .ok_or(ActionError::MissingConnection)?;

    ctx.world.installer.apply_permissions()?;
    ctx.report(Status::active("Installing FreshRSS"));

    let options = install_options(ctx.config, &connection);
    ctx.world.installer.prepare()?;
    ctx.world.installer.install(&options)?;

    create_default_admin(ctx)?;

    ctx.world.installer.apply_permissions()?;
    ctx.report(Status::active("FreshRSS installed"));
    Ok(Outcome::Completed)
}

/// Create the admin account once per deployment, arbitrated by leadership.
fn create_default_admin(ctx: &mut Context<'_>) -> Result<(), ActionError> {
    let marker = ClusterFact::DefaultAdminInitialized;
    if ctx.world.leadership.fact(marker) {
        tracing::info!("default admin already created for this deployment");
        return Ok(());
    }
    if !ctx.world.leadership.is_leader() {
        tracing::warn!("default admin not yet created; leaving it to the leader");
        return Ok(());
    }
    let config = ctx.config;
    ctx.world
        .installer
        .create_user(&config.default_admin_username, &config.default_admin_password)?;
    ctx.world.leadership.set_fact(marker)?;
    tracing::info!(user = %config.default_admin_username, "default admin created");
    Ok(())
}

pub fn configure_proxy(ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    let site = SiteRequest {
        name: SITE_NAME.to_string(),
        template: SITE_TEMPLATE.to_string(),
        fqdn: ctx.config.fqdn.clone(),
        port: ctx.config.port,
    };
    ctx.world.site.configure_site(&site)?;
    ctx.world.firewall.open_port(site.port)?;
    ctx.report(Status::active("nginx configured"));
    Ok(Outcome::Completed)
}

pub fn ready(ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    ctx.report(Status::active("Ready"));
    Ok(Outcome::Completed)
}

pub fn publish_port(ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    ctx.world.website.configure(ctx.config.port)?;
    Ok(Outcome::Completed)
}

/// Let the manual check run again after the operator fixes `db-uri`.
pub fn reset_manual_database_check(_ctx: &mut Context<'_>) -> Result<Outcome, ActionError> {
    tracing::info!("db-uri changed before a database was acquired; rechecking");
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use freshrss_core::DbScheme;

    #[test]
    fn install_options_follow_installer_order() {
        let config = CharmConfig {
            default_admin_username: "root".into(),
            fqdn: "rss.example.com".into(),
            db_prefix: "rss_".into(),
            ..CharmConfig::default()
        };
        let connection = ConnectionConfig {
            scheme: DbScheme::Mysql,
            user: "u".into(),
            password: "p".into(),
            host: "h".into(),
            base: "d".into(),
        };

        let args = install_options(&config, &connection).to_args();

        assert_eq!(
            args,
            vec![
                "--default_user", "root",
                "--base_url", "rss.example.com",
                "--environment", "production",
                "--db-type", "mysql",
                "--db-base", "d",
                "--db-user", "u",
                "--db-password", "p",
                "--db-host", "h",
                "--db-prefix", "rss_",
            ]
        );
    }
}
