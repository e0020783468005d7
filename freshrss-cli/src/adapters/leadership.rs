//! Leadership settings persisted at `<state-dir>/leadership.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use freshrss_core::ClusterFact;
use freshrss_reactor::{CollaboratorError, Leadership};

use super::{load_json, save_json};

pub const LEADERSHIP_FILE_NAME: &str = "leadership.json";

pub struct FileLeadership {
    leader: bool,
    path: PathBuf,
    settings: BTreeMap<String, String>,
}

impl FileLeadership {
    pub fn open(state_dir: &Path, leader: bool) -> Result<Self, CollaboratorError> {
        let path = state_dir.join(LEADERSHIP_FILE_NAME);
        let settings = load_json(&path)?;
        Ok(Self {
            leader,
            path,
            settings,
        })
    }
}

impl Leadership for FileLeadership {
    fn is_leader(&self) -> bool {
        self.leader
    }

    fn fact(&self, fact: ClusterFact) -> bool {
        self.settings.get(fact.key()).is_some_and(|v| v == "true")
    }

    fn set_fact(&mut self, fact: ClusterFact) -> Result<(), CollaboratorError> {
        if !self.leader {
            return Err(CollaboratorError::NotLeader { key: fact.key() });
        }
        let mut next = self.settings.clone();
        next.insert(fact.key().to_string(), "true".to_string());
        save_json(&self.path, &next)?;
        self.settings = next;
        tracing::info!(key = fact.key(), "leadership setting written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn leader_fact_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let mut leadership = FileLeadership::open(dir.path(), true).unwrap();
        assert!(!leadership.fact(ClusterFact::DefaultAdminInitialized));

        leadership.set_fact(ClusterFact::DefaultAdminInitialized).unwrap();

        let reopened = FileLeadership::open(dir.path(), false).unwrap();
        assert!(reopened.fact(ClusterFact::DefaultAdminInitialized));
    }

    #[test]
    fn follower_cannot_write() {
        let dir = TempDir::new().unwrap();
        let mut leadership = FileLeadership::open(dir.path(), false).unwrap();

        let err = leadership
            .set_fact(ClusterFact::DefaultAdminInitialized)
            .unwrap_err();

        assert!(matches!(err, CollaboratorError::NotLeader { .. }));
        assert!(!dir.path().join(LEADERSHIP_FILE_NAME).exists());
    }
}
