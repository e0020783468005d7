//! Domain types for the FreshRSS unit.
//!
//! Local progress markers ([`Flag`]) are persisted and owned by this unit.
//! Everything observed from the outside world is modelled separately:
//! [`Condition`] for relation/package/config facts evaluated fresh on every
//! guard check, and [`ClusterFact`] for leadership-written cluster state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// A locally-owned boolean fact persisted across triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "manual.database.check.complete")]
    ManualDbCheckComplete,
    #[serde(rename = "fresh-rss.system.initialized")]
    SystemInitialized,
    #[serde(rename = "fresh-rss.db.waiting")]
    DbWaiting,
    #[serde(rename = "fresh-rss.db.requested")]
    DbRequested,
    #[serde(rename = "fresh-rss.db.config.acquired")]
    DbConfigAcquired,
    #[serde(rename = "fresh-rss.installed")]
    Installed,
    #[serde(rename = "fresh-rss.nginx.configured")]
    NginxConfigured,
    #[serde(rename = "fresh-rss.ready")]
    Ready,
}

impl Flag {
    /// All flags in lifecycle order.
    pub fn all() -> &'static [Flag] {
        &[
            Flag::ManualDbCheckComplete,
            Flag::SystemInitialized,
            Flag::DbWaiting,
            Flag::DbRequested,
            Flag::DbConfigAcquired,
            Flag::Installed,
            Flag::NginxConfigured,
            Flag::Ready,
        ]
    }

    /// Stable wire name, as stored in the state file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::ManualDbCheckComplete => "manual.database.check.complete",
            Flag::SystemInitialized => "fresh-rss.system.initialized",
            Flag::DbWaiting => "fresh-rss.db.waiting",
            Flag::DbRequested => "fresh-rss.db.requested",
            Flag::DbConfigAcquired => "fresh-rss.db.config.acquired",
            Flag::Installed => "fresh-rss.installed",
            Flag::NginxConfigured => "fresh-rss.nginx.configured",
            Flag::Ready => "fresh-rss.ready",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flag::all()
            .iter()
            .copied()
            .find(|flag| flag.as_str() == s)
            .ok_or_else(|| format!("unknown flag '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// External conditions
// ---------------------------------------------------------------------------

/// A fact about the outside world, re-read from collaborators at every guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Every package in [`Package::required`] is installed.
    PackagesInstalled,
    PgsqlConnected,
    PgsqlMasterAvailable,
    MysqlConnected,
    MysqlAvailable,
    WebsiteAvailable,
    /// `db-uri` differs from the value seen at the end of the previous pass.
    DbUriChanged,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::PackagesInstalled => "packages.installed",
            Condition::PgsqlConnected => "pgsql.connected",
            Condition::PgsqlMasterAvailable => "pgsql.master.available",
            Condition::MysqlConnected => "mysql.connected",
            Condition::MysqlAvailable => "mysql.available",
            Condition::WebsiteAvailable => "website.available",
            Condition::DbUriChanged => "config.changed.db-uri",
        };
        f.write_str(name)
    }
}

/// Cluster-wide state written by the elected leader and readable by every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterFact {
    /// The default admin account has been created somewhere in the deployment.
    DefaultAdminInitialized,
}

impl ClusterFact {
    /// Leadership settings key backing this fact.
    pub fn key(&self) -> &'static str {
        match self {
            ClusterFact::DefaultAdminInitialized => "default_admin_init",
        }
    }
}

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Snap,
    Apt,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageManager::Snap => write!(f, "snap"),
            PackageManager::Apt => write!(f, "apt"),
        }
    }
}

/// A package installed by the package-install collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Package {
    pub manager: PackageManager,
    pub name: &'static str,
}

impl Package {
    pub const fn snap(name: &'static str) -> Self {
        Self {
            manager: PackageManager::Snap,
            name,
        }
    }

    pub const fn apt(name: &'static str) -> Self {
        Self {
            manager: PackageManager::Apt,
            name,
        }
    }

    /// Packages that must all be present before the system is initialized.
    pub fn required() -> &'static [Package] {
        const REQUIRED: &[Package] = &[
            Package::snap("fresh-rss"),
            Package::apt("php7.2"),
            Package::apt("php7.2-fpm"),
            Package::apt("php7.2-curl"),
            Package::apt("php7.2-gmp"),
            Package::apt("php7.2-intl"),
            Package::apt("php7.2-mbstring"),
            Package::apt("php7.2-sqlite3"),
            Package::apt("php7.2-xml"),
            Package::apt("php7.2-zip"),
            Package::apt("php7.2-pgsql"),
        ];
        REQUIRED
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.installed.{}", self.manager, self.name)
    }
}

// ---------------------------------------------------------------------------
// Database connection
// ---------------------------------------------------------------------------

/// Database engine identifiers understood by the FreshRSS installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbScheme {
    Pgsql,
    Mysql,
    Sqlite,
}

impl DbScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbScheme::Pgsql => "pgsql",
            DbScheme::Mysql => "mysql",
            DbScheme::Sqlite => "sqlite",
        }
    }

    /// Map a URI scheme to an engine, accepting the common postgres aliases.
    pub fn from_uri_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Some(DbScheme::Pgsql),
            "mysql" => Some(DbScheme::Mysql),
            "sqlite" => Some(DbScheme::Sqlite),
            _ => None,
        }
    }
}

impl fmt::Display for DbScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived database connection parameters.
///
/// Written as one unit into the state store; see [`ConnectionConfig::KEYS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub scheme: DbScheme,
    pub user: String,
    pub password: String,
    pub host: String,
    /// Database name (relations) or URI path (manual `db-uri`).
    pub base: String,
}

impl ConnectionConfig {
    pub const SCHEME_KEY: &'static str = "db-scheme";
    pub const USER_KEY: &'static str = "db-user";
    pub const PASSWORD_KEY: &'static str = "db-password";
    pub const HOST_KEY: &'static str = "db-host";
    pub const BASE_KEY: &'static str = "db-base";

    /// Store keys, in write order.
    pub const KEYS: [&'static str; 5] = [
        Self::SCHEME_KEY,
        Self::USER_KEY,
        Self::PASSWORD_KEY,
        Self::HOST_KEY,
        Self::BASE_KEY,
    ];

    /// Parse an operator-supplied connection URI such as `pgsql://u:p@h/d`.
    ///
    /// The path is kept verbatim (leading `/` included); missing user, password
    /// or host become empty strings. User and password come back as typed:
    /// characters the URL parser escapes in userinfo are decoded again.
    pub fn from_uri(raw: &str) -> Result<Self, ConfigError> {
        let uri = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidDbUri {
            reason: e.to_string(),
        })?;
        let scheme =
            DbScheme::from_uri_scheme(uri.scheme()).ok_or_else(|| ConfigError::InvalidDbUri {
                reason: format!("unsupported database scheme '{}'", uri.scheme()),
            })?;
        Ok(Self {
            scheme,
            user: decode_userinfo(uri.username())?,
            password: decode_userinfo(uri.password().unwrap_or_default())?,
            host: uri.host_str().unwrap_or_default().to_string(),
            base: uri.path().to_string(),
        })
    }

    /// `(key, value)` pairs for a single atomic store write.
    pub fn entries(&self) -> Vec<(&'static str, serde_json::Value)> {
        vec![
            (Self::SCHEME_KEY, self.scheme.as_str().into()),
            (Self::USER_KEY, self.user.clone().into()),
            (Self::PASSWORD_KEY, self.password.clone().into()),
            (Self::HOST_KEY, self.host.clone().into()),
            (Self::BASE_KEY, self.base.clone().into()),
        ]
    }
}

fn decode_userinfo(raw: &str) -> Result<String, ConfigError> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|e| ConfigError::InvalidDbUri {
            reason: format!("credentials are not valid UTF-8: {e}"),
        })
}

/// What this application asks a database provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRequest {
    pub database: &'static str,
    pub user: &'static str,
    pub prefix: &'static str,
}

impl DatabaseRequest {
    pub const FRESH_RSS: DatabaseRequest = DatabaseRequest {
        database: "fresh-rss",
        user: "juju_fresh-rss",
        prefix: "fresh-rss",
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wire_names_roundtrip() {
        for flag in Flag::all() {
            assert_eq!(flag.as_str().parse::<Flag>().unwrap(), *flag);
            let json = serde_json::to_string(flag).expect("serialize");
            assert_eq!(json, format!("\"{}\"", flag.as_str()));
        }
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!("fresh-rss.typo".parse::<Flag>().is_err());
    }

    #[test]
    fn package_display_matches_installer_flags() {
        assert_eq!(Package::snap("fresh-rss").to_string(), "snap.installed.fresh-rss");
        assert_eq!(Package::apt("php7.2-zip").to_string(), "apt.installed.php7.2-zip");
        assert_eq!(Package::required().len(), 11);
    }

    #[test]
    fn manual_uri_parses_all_fields() {
        let cfg = ConnectionConfig::from_uri("pgsql://u:p@h/d").unwrap();
        assert_eq!(
            cfg,
            ConnectionConfig {
                scheme: DbScheme::Pgsql,
                user: "u".into(),
                password: "p".into(),
                host: "h".into(),
                base: "/d".into(),
            }
        );
    }

    #[test]
    fn manual_uri_rejects_unknown_scheme() {
        let err = ConnectionConfig::from_uri("redis://h/0").unwrap_err();
        assert!(err.to_string().contains("redis"), "got: {err}");
    }

    #[test]
    fn entries_cover_every_key() {
        let cfg = ConnectionConfig::from_uri("mysql://a:b@c/e").unwrap();
        let keys: Vec<_> = cfg.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ConnectionConfig::KEYS.to_vec());
    }
}
