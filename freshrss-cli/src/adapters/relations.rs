//! Database and website relation endpoints.
//!
//! Incoming relation data comes from the world file; data this unit publishes
//! is kept in `<state-dir>/relation-data.json`, one entry per relation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use freshrss_core::DatabaseRequest;
use freshrss_reactor::{
    CollaboratorError, DatabaseEndpoint, DbCredentials, DbRelation, WebsiteEndpoint,
};

use super::world::DbRelationData;
use super::{load_json, save_json};

pub const OUTBOX_FILE_NAME: &str = "relation-data.json";

/// Outgoing relation data, keyed by relation name.
#[derive(Debug, Clone)]
pub struct Outbox {
    path: PathBuf,
}

impl Outbox {
    pub fn in_dir(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(OUTBOX_FILE_NAME),
        }
    }

    pub fn read(&self) -> Result<BTreeMap<String, Value>, CollaboratorError> {
        load_json(&self.path)
    }

    /// Replace this unit's data on `relation`.
    pub fn publish(&self, relation: &'static str, data: Value) -> Result<(), CollaboratorError> {
        let mut all = self.read()?;
        all.insert(relation.to_string(), data);
        save_json(&self.path, &all).map_err(|e| CollaboratorError::Relation {
            relation,
            detail: e.to_string(),
        })
    }
}

/// One side of the `pgsql` or `mysql` relation.
pub struct RelationDatabase {
    relation: DbRelation,
    data: Option<DbRelationData>,
    outbox: Outbox,
}

impl RelationDatabase {
    pub fn new(relation: DbRelation, data: Option<DbRelationData>, outbox: Outbox) -> Self {
        Self {
            relation,
            data,
            outbox,
        }
    }
}

impl DatabaseEndpoint for RelationDatabase {
    fn connected(&self) -> bool {
        self.data.is_some()
    }

    fn available(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.available)
    }

    fn request(&mut self, request: &DatabaseRequest) -> Result<(), CollaboratorError> {
        let payload = match self.relation {
            DbRelation::Pgsql => json!({ "database": request.database }),
            DbRelation::Mysql => json!({
                "database": request.database,
                "user": request.user,
                "prefix": request.prefix,
            }),
        };
        self.outbox.publish(self.relation.name(), payload)
    }

    fn credentials(&self, _request: &DatabaseRequest) -> Option<DbCredentials> {
        self.data
            .as_ref()
            .and_then(|d| d.credentials.clone())
            .map(DbCredentials::from)
    }
}

/// The `website` relation consumed by a load balancer or reverse proxy.
pub struct WebsiteRelation {
    available: bool,
    outbox: Outbox,
}

impl WebsiteRelation {
    pub const NAME: &'static str = "website";

    pub fn new(available: bool, outbox: Outbox) -> Self {
        Self { available, outbox }
    }
}

impl WebsiteEndpoint for WebsiteRelation {
    fn available(&self) -> bool {
        self.available
    }

    fn configure(&mut self, port: u16) -> Result<(), CollaboratorError> {
        self.outbox.publish(Self::NAME, json!({ "port": port }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::world::CredentialsData;
    use tempfile::TempDir;

    #[test]
    fn mysql_request_publishes_user_and_prefix() {
        let dir = TempDir::new().unwrap();
        let outbox = Outbox::in_dir(dir.path());
        let mut mysql =
            RelationDatabase::new(DbRelation::Mysql, Some(DbRelationData::default()), outbox.clone());

        mysql.request(&DatabaseRequest::FRESH_RSS).unwrap();

        let data = outbox.read().unwrap();
        assert_eq!(
            data["mysql"],
            json!({"database": "fresh-rss", "user": "juju_fresh-rss", "prefix": "fresh-rss"})
        );
    }

    #[test]
    fn relations_share_one_outbox_file() {
        let dir = TempDir::new().unwrap();
        let outbox = Outbox::in_dir(dir.path());
        let mut pgsql =
            RelationDatabase::new(DbRelation::Pgsql, Some(DbRelationData::default()), outbox.clone());
        let mut website = WebsiteRelation::new(true, outbox.clone());

        pgsql.request(&DatabaseRequest::FRESH_RSS).unwrap();
        website.configure(8080).unwrap();

        let data = outbox.read().unwrap();
        assert_eq!(data["pgsql"], json!({"database": "fresh-rss"}));
        assert_eq!(data["website"], json!({"port": 8080}));
    }

    #[test]
    fn absent_relation_is_disconnected() {
        let dir = TempDir::new().unwrap();
        let db = RelationDatabase::new(DbRelation::Pgsql, None, Outbox::in_dir(dir.path()));
        assert!(!db.connected());
        assert!(!db.available());
        assert!(db.credentials(&DatabaseRequest::FRESH_RSS).is_none());
    }

    #[test]
    fn available_relation_exposes_credentials() {
        let dir = TempDir::new().unwrap();
        let data = DbRelationData {
            available: true,
            credentials: Some(CredentialsData {
                user: "u".into(),
                password: "p".into(),
                host: "h".into(),
                database: "d".into(),
            }),
        };
        let db = RelationDatabase::new(DbRelation::Pgsql, Some(data), Outbox::in_dir(dir.path()));

        let creds = db.credentials(&DatabaseRequest::FRESH_RSS).unwrap();
        assert_eq!(creds.database, "d");
    }
}
