//! Interfaces to everything the reconciler drives but does not own.
//!
//! Package installation, database providers, the reverse proxy, the
//! application's own CLI scripts, leadership storage and status reporting are
//! all external. Rules only see them through these traits.

use std::fmt;

use thiserror::Error;

use freshrss_core::{ClusterFact, DatabaseRequest, Package};

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// An external command ran and exited unsuccessfully.
    #[error("command `{command}` failed: {detail}")]
    Command { command: String, detail: String },

    /// An external command could not be started.
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Relation data could not be written.
    #[error("relation '{relation}' rejected update: {detail}")]
    Relation {
        relation: &'static str,
        detail: String,
    },

    /// Only the elected leader may write cluster facts.
    #[error("this unit is not the leader; cannot set '{key}'")]
    NotLeader { key: &'static str },

    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

/// Read-only view of what the package-install collaborator has finished.
pub trait PackageSource {
    fn is_installed(&self, package: &Package) -> bool;
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// Credentials published by a database provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCredentials {
    pub user: String,
    pub password: String,
    pub host: String,
    pub database: String,
}

/// A database provider relation (postgres-like or mysql-like).
pub trait DatabaseEndpoint {
    /// The relation is established; a request can be sent.
    fn connected(&self) -> bool;

    /// The provider reports credentials ready.
    fn available(&self) -> bool;

    /// Ask the provider for a database.
    fn request(&mut self, request: &DatabaseRequest) -> Result<(), CollaboratorError>;

    /// Resolve the provider's credentials. `None` when the relation reports
    /// available but no usable unit data can be found.
    fn credentials(&self, request: &DatabaseRequest) -> Option<DbCredentials>;
}

/// Reverse-proxy consumer relation.
pub trait WebsiteEndpoint {
    fn available(&self) -> bool;

    fn configure(&mut self, port: u16) -> Result<(), CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Installer
// ---------------------------------------------------------------------------

/// Ordered `--key value` options for the application's install script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions(Vec<(String, String)>);

impl InstallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.0.push((flag.to_string(), value.into()));
        self
    }

    /// Flattened argv form: `["--flag", "value", ...]`.
    pub fn to_args(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(f, v)| [f.clone(), v.clone()])
            .collect()
    }
}

/// The application's own installer and maintenance scripts.
pub trait Installer {
    /// Fix ownership and modes of the application tree.
    fn apply_permissions(&mut self) -> Result<(), CollaboratorError>;

    /// Ensure the data directories exist.
    fn prepare(&mut self) -> Result<(), CollaboratorError>;

    fn install(&mut self, options: &InstallOptions) -> Result<(), CollaboratorError>;

    fn create_user(&mut self, username: &str, password: &str) -> Result<(), CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Reverse proxy + firewall
// ---------------------------------------------------------------------------

/// A site the proxy collaborator should serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRequest {
    pub name: String,
    pub template: String,
    pub fqdn: String,
    pub port: u16,
}

pub trait SiteConfigurator {
    fn configure_site(&mut self, site: &SiteRequest) -> Result<(), CollaboratorError>;
}

pub trait Firewall {
    fn open_port(&mut self, port: u16) -> Result<(), CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Leadership
// ---------------------------------------------------------------------------

/// Cluster-wide settings, written by the elected leader only.
pub trait Leadership {
    fn is_leader(&self) -> bool;

    fn fact(&self, fact: ClusterFact) -> bool;

    fn set_fact(&mut self, fact: ClusterFact) -> Result<(), CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Workload status shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Waiting(String),
    Active(String),
}

impl Status {
    pub fn waiting(msg: impl Into<String>) -> Self {
        Status::Waiting(msg.into())
    }

    pub fn active(msg: impl Into<String>) -> Self {
        Status::Active(msg.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Status::Waiting(msg) | Status::Active(msg) => msg,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Waiting(msg) => write!(f, "waiting: {msg}"),
            Status::Active(msg) => write!(f, "active: {msg}"),
        }
    }
}

/// Observability only; reporting never fails a rule.
pub trait StatusReporter {
    fn report(&mut self, status: Status);
}
