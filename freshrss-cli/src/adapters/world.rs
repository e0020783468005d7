//! The world file: a YAML description of what the hosting framework would
//! otherwise tell the unit (installed packages, leadership, relation data).
//!
//! ```yaml
//! packages:
//!   snap: [fresh-rss]
//!   apt: [php7.2, php7.2-fpm]
//! leader: true
//! relations:
//!   pgsql:
//!     available: true
//!     credentials: { user: rss, password: s3cret, host: 10.0.0.5, database: fresh-rss }
//!   website: true
//! ```
//!
//! A relation that is present is connected.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use freshrss_core::{Package, PackageManager};
use freshrss_reactor::{DbCredentials, PackageSource};

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct WorldFile {
    pub packages: InstalledPackages,
    pub leader: bool,
    pub relations: Relations,
}

impl Default for WorldFile {
    fn default() -> Self {
        Self {
            packages: InstalledPackages::default(),
            leader: true,
            relations: Relations::default(),
        }
    }
}

/// Installed package names, one list per package manager.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InstalledPackages {
    pub snap: BTreeSet<String>,
    pub apt: BTreeSet<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Relations {
    pub pgsql: Option<DbRelationData>,
    pub mysql: Option<DbRelationData>,
    pub website: bool,
}

#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DbRelationData {
    pub available: bool,
    pub credentials: Option<CredentialsData>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CredentialsData {
    pub user: String,
    pub password: String,
    pub host: String,
    pub database: String,
}

impl From<CredentialsData> for DbCredentials {
    fn from(c: CredentialsData) -> Self {
        DbCredentials {
            user: c.user,
            password: c.password,
            host: c.host,
            database: c.database,
        }
    }
}

impl WorldFile {
    /// Load the world file; a missing or empty file is an empty world.
    pub fn load_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no world file; assuming empty world");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read world file {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse world file {}", path.display()))
    }
}

/// Packages listed in the world file, matched by manager and name.
pub struct WorldPackages {
    installed: InstalledPackages,
}

impl WorldPackages {
    pub fn new(installed: InstalledPackages) -> Self {
        Self { installed }
    }
}

impl PackageSource for WorldPackages {
    fn is_installed(&self, package: &Package) -> bool {
        let names = match package.manager {
            PackageManager::Snap => &self.installed.snap,
            PackageManager::Apt => &self.installed.apt,
        };
        names.contains(package.name)
    }
}
