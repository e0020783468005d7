//! Operator-facing charm configuration.
//!
//! The file uses the same kebab-case keys the operator sets on the
//! application (`db-uri`, `fqdn`, `port`, ...). A missing file means
//! "all defaults".

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DB_URI_KEY: &str = "db-uri";

/// Read-only configuration inputs for one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CharmConfig {
    /// Full connection URI for an operator-managed database; empty when unset.
    pub db_uri: String,
    pub default_admin_username: String,
    pub default_admin_password: String,
    pub fqdn: String,
    pub port: u16,
    pub environment: String,
    pub db_prefix: String,
}

impl Default for CharmConfig {
    fn default() -> Self {
        Self {
            db_uri: String::new(),
            default_admin_username: "admin".to_string(),
            default_admin_password: String::new(),
            fqdn: "localhost".to_string(),
            port: 80,
            environment: "production".to_string(),
            db_prefix: "freshrss_".to_string(),
        }
    }
}

impl CharmConfig {
    /// Load config from `path`, falling back to defaults when the file is absent.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })
    }

    /// The manual database URI, if the operator set one.
    pub fn db_uri(&self) -> Option<&str> {
        let uri = self.db_uri.trim();
        (!uri.is_empty()).then_some(uri)
    }

    fn fields(&self) -> [(&'static str, String); 7] {
        [
            (DB_URI_KEY, self.db_uri.clone()),
            ("default-admin-username", self.default_admin_username.clone()),
            ("default-admin-password", self.default_admin_password.clone()),
            ("fqdn", self.fqdn.clone()),
            ("port", self.port.to_string()),
            ("environment", self.environment.clone()),
            ("db-prefix", self.db_prefix.clone()),
        ]
    }
}

/// Keys whose values differ from the snapshot taken after the last pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    changed: BTreeSet<&'static str>,
}

impl ConfigChanges {
    /// Diff `current` against `previous`. Without a previous snapshot nothing
    /// counts as changed: the first pass establishes the baseline.
    pub fn between(previous: Option<&CharmConfig>, current: &CharmConfig) -> Self {
        let Some(previous) = previous else {
            return Self::default();
        };
        let changed = previous
            .fields()
            .into_iter()
            .zip(current.fields())
            .filter(|((_, before), (_, after))| before != after)
            .map(|((key, _), _)| key)
            .collect();
        Self { changed }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.changed.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changed.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}
