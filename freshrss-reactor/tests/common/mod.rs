//! In-memory collaborators and a single-unit harness.

#![allow(dead_code)]

use std::collections::HashSet;

use freshrss_core::{
    CharmConfig, ClusterFact, DatabaseRequest, MemoryBackend, Package, UnitState,
};
use freshrss_reactor::{
    reconcile_unit, CollaboratorError, Collaborators, DatabaseEndpoint, DbCredentials, Engine,
    Firewall, InstallOptions, Installer, Leadership, PackageSource, PassReport, ReconcileError,
    SiteConfigurator, SiteRequest, Status, StatusReporter, Trigger, WebsiteEndpoint,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakePackages {
    pub installed: HashSet<&'static str>,
}

impl FakePackages {
    pub fn install_all(&mut self) {
        self.installed = Package::required().iter().map(|p| p.name).collect();
    }
}

impl PackageSource for FakePackages {
    fn is_installed(&self, package: &Package) -> bool {
        self.installed.contains(package.name)
    }
}

#[derive(Debug, Default)]
pub struct FakeDb {
    pub connected: bool,
    pub available: bool,
    pub creds: Option<DbCredentials>,
    pub requests: Vec<DatabaseRequest>,
}

impl FakeDb {
    pub fn ready_with(user: &str, password: &str, host: &str, database: &str) -> Self {
        Self {
            connected: true,
            available: true,
            creds: Some(DbCredentials {
                user: user.into(),
                password: password.into(),
                host: host.into(),
                database: database.into(),
            }),
            requests: vec![],
        }
    }
}

impl DatabaseEndpoint for FakeDb {
    fn connected(&self) -> bool {
        self.connected
    }

    fn available(&self) -> bool {
        self.available
    }

    fn request(&mut self, request: &DatabaseRequest) -> Result<(), CollaboratorError> {
        self.requests.push(request.clone());
        Ok(())
    }

    fn credentials(&self, _request: &DatabaseRequest) -> Option<DbCredentials> {
        self.creds.clone()
    }
}

#[derive(Debug, Default)]
pub struct FakeWebsite {
    pub available: bool,
    pub published: Vec<u16>,
}

impl WebsiteEndpoint for FakeWebsite {
    fn available(&self) -> bool {
        self.available
    }

    fn configure(&mut self, port: u16) -> Result<(), CollaboratorError> {
        self.published.push(port);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeInstaller {
    /// Call log: "permissions", "prepare", "install", "create-user".
    pub calls: Vec<&'static str>,
    pub install_args: Vec<Vec<String>>,
    pub users: Vec<(String, String)>,
    pub fail_install: bool,
}

impl FakeInstaller {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl Installer for FakeInstaller {
    fn apply_permissions(&mut self) -> Result<(), CollaboratorError> {
        self.calls.push("permissions");
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), CollaboratorError> {
        self.calls.push("prepare");
        Ok(())
    }

    fn install(&mut self, options: &InstallOptions) -> Result<(), CollaboratorError> {
        self.calls.push("install");
        if self.fail_install {
            return Err(CollaboratorError::Command {
                command: "do-install".into(),
                detail: "exit status: 1".into(),
            });
        }
        self.install_args.push(options.to_args());
        Ok(())
    }

    fn create_user(&mut self, username: &str, password: &str) -> Result<(), CollaboratorError> {
        self.calls.push("create-user");
        self.users.push((username.into(), password.into()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeSite {
    pub sites: Vec<SiteRequest>,
}

impl SiteConfigurator for FakeSite {
    fn configure_site(&mut self, site: &SiteRequest) -> Result<(), CollaboratorError> {
        self.sites.push(site.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeFirewall {
    pub opened: Vec<u16>,
}

impl Firewall for FakeFirewall {
    fn open_port(&mut self, port: u16) -> Result<(), CollaboratorError> {
        self.opened.push(port);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeLeadership {
    pub leader: bool,
    pub facts: HashSet<&'static str>,
}

impl Default for FakeLeadership {
    fn default() -> Self {
        Self {
            leader: true,
            facts: HashSet::new(),
        }
    }
}

impl Leadership for FakeLeadership {
    fn is_leader(&self) -> bool {
        self.leader
    }

    fn fact(&self, fact: ClusterFact) -> bool {
        self.facts.contains(fact.key())
    }

    fn set_fact(&mut self, fact: ClusterFact) -> Result<(), CollaboratorError> {
        if !self.leader {
            return Err(CollaboratorError::NotLeader { key: fact.key() });
        }
        self.facts.insert(fact.key());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeStatus {
    pub history: Vec<Status>,
}

impl StatusReporter for FakeStatus {
    fn report(&mut self, status: Status) {
        self.history.push(status);
    }
}

// ---------------------------------------------------------------------------
// World + harness
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct World {
    pub packages: FakePackages,
    pub pgsql: FakeDb,
    pub mysql: FakeDb,
    pub website: FakeWebsite,
    pub installer: FakeInstaller,
    pub site: FakeSite,
    pub firewall: FakeFirewall,
    pub leadership: FakeLeadership,
    pub status: FakeStatus,
}

impl World {
    pub fn collaborators(&mut self) -> Collaborators<'_> {
        Collaborators {
            packages: &self.packages,
            pgsql: &mut self.pgsql,
            mysql: &mut self.mysql,
            website: &mut self.website,
            installer: &mut self.installer,
            site: &mut self.site,
            firewall: &mut self.firewall,
            leadership: &mut self.leadership,
            status: &mut self.status,
        }
    }
}

/// One unit: persisted state, operator config, and its world.
pub struct Unit {
    pub backend: MemoryBackend,
    pub state: UnitState,
    pub config: CharmConfig,
    pub world: World,
    pub engine: Engine,
}

impl Unit {
    pub fn new() -> Self {
        let backend = MemoryBackend::new();
        let state = UnitState::open(Box::new(backend.clone())).expect("open state");
        Self {
            backend,
            state,
            config: CharmConfig::default(),
            world: World::default(),
            engine: Engine::default(),
        }
    }

    pub fn try_trigger(&mut self, trigger: Trigger) -> Result<PassReport, ReconcileError> {
        reconcile_unit(
            &self.engine,
            trigger,
            &mut self.state,
            &self.config,
            self.world.collaborators(),
        )
    }

    pub fn trigger(&mut self, trigger: Trigger) -> PassReport {
        self.try_trigger(trigger)
            .unwrap_or_else(|e| panic!("{trigger} pass failed: {e}"))
    }

    /// Drop in-memory state and reload it from the backend.
    pub fn restart(&mut self) {
        self.state = UnitState::open(Box::new(self.backend.clone())).expect("reopen state");
    }
}
