//! The reconciliation context passed to every guard and action.

use freshrss_core::{
    config::DB_URI_KEY, CharmConfig, Condition, ConfigChanges, DbScheme, Package, UnitState,
};

use crate::collaborators::{
    DatabaseEndpoint, Firewall, Installer, Leadership, PackageSource, SiteConfigurator, Status,
    StatusReporter, WebsiteEndpoint,
};

/// Handles to every external collaborator for one pass.
pub struct Collaborators<'a> {
    pub packages: &'a dyn PackageSource,
    pub pgsql: &'a mut dyn DatabaseEndpoint,
    pub mysql: &'a mut dyn DatabaseEndpoint,
    pub website: &'a mut dyn WebsiteEndpoint,
    pub installer: &'a mut dyn Installer,
    pub site: &'a mut dyn SiteConfigurator,
    pub firewall: &'a mut dyn Firewall,
    pub leadership: &'a mut dyn Leadership,
    pub status: &'a mut dyn StatusReporter,
}

/// The two mutually exclusive database relation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbRelation {
    Pgsql,
    Mysql,
}

impl DbRelation {
    /// Consultation order when both relations qualify.
    pub const PRIORITY: [DbRelation; 2] = [DbRelation::Pgsql, DbRelation::Mysql];

    pub fn name(&self) -> &'static str {
        match self {
            DbRelation::Pgsql => "pgsql",
            DbRelation::Mysql => "mysql",
        }
    }

    pub fn scheme(&self) -> DbScheme {
        match self {
            DbRelation::Pgsql => DbScheme::Pgsql,
            DbRelation::Mysql => DbScheme::Mysql,
        }
    }

    pub fn connected(&self) -> Condition {
        match self {
            DbRelation::Pgsql => Condition::PgsqlConnected,
            DbRelation::Mysql => Condition::MysqlConnected,
        }
    }

    pub fn available(&self) -> Condition {
        match self {
            DbRelation::Pgsql => Condition::PgsqlMasterAvailable,
            DbRelation::Mysql => Condition::MysqlAvailable,
        }
    }
}

/// Everything a rule may read or touch during one pass.
pub struct Context<'a> {
    pub state: &'a mut UnitState,
    pub config: &'a CharmConfig,
    pub changes: ConfigChanges,
    pub world: Collaborators<'a>,
}

impl<'a> Context<'a> {
    /// Evaluate an external condition against the live collaborators.
    pub fn holds(&self, condition: Condition) -> bool {
        match condition {
            Condition::PackagesInstalled => Package::required()
                .iter()
                .all(|p| self.world.packages.is_installed(p)),
            Condition::PgsqlConnected => self.world.pgsql.connected(),
            Condition::PgsqlMasterAvailable => self.world.pgsql.available(),
            Condition::MysqlConnected => self.world.mysql.connected(),
            Condition::MysqlAvailable => self.world.mysql.available(),
            Condition::WebsiteAvailable => self.world.website.available(),
            Condition::DbUriChanged => self.changes.contains(DB_URI_KEY),
        }
    }

    /// First relation, in priority order, for which `condition_of` holds.
    pub fn first_relation(&self, condition_of: fn(&DbRelation) -> Condition) -> Option<DbRelation> {
        DbRelation::PRIORITY
            .into_iter()
            .find(|relation| self.holds(condition_of(relation)))
    }

    pub fn database(&mut self, relation: DbRelation) -> &mut (dyn DatabaseEndpoint + 'a) {
        match relation {
            DbRelation::Pgsql => &mut *self.world.pgsql,
            DbRelation::Mysql => &mut *self.world.mysql,
        }
    }

    pub fn report(&mut self, status: Status) {
        tracing::debug!(%status, "status");
        self.world.status.report(status);
    }
}
