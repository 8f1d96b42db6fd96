use crate::domain::{ChangeSet, CommitInfo};
use crate::error::{LedgerError, Result};
use crate::git::Repository;
use git2::Oid;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock repository for testing without actual git operations
///
/// History is linear: commits are stored newest first and `HEAD` is the
/// most recent one.
pub struct MockRepository {
    commits: Vec<(Oid, CommitInfo)>,
    tags: Mutex<HashMap<String, Oid>>,
    next_id: u64,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            commits: Vec::new(),
            tags: Mutex::new(HashMap::new()),
            next_id: 1,
        }
    }

    /// Add a commit on top of the history and return its OID
    ///
    /// The commit's `hash` is overwritten with the generated OID.
    pub fn add_commit(&mut self, mut info: CommitInfo) -> Result<Oid> {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&self.next_id.to_be_bytes());
        self.next_id += 1;

        let oid = Oid::from_bytes(&bytes)?;
        info.hash = oid.to_string();
        self.commits.insert(0, (oid, info));
        Ok(oid)
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&self, name: impl Into<String>, oid: Oid) {
        self.lock_tags().insert(name.into(), oid);
    }

    fn lock_tags(&self) -> std::sync::MutexGuard<'_, HashMap<String, Oid>> {
        self.tags.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn position(&self, oid: Oid) -> Result<usize> {
        self.commits
            .iter()
            .position(|(id, _)| *id == oid)
            .ok_or_else(|| LedgerError::config(format!("Unknown commit: {}", oid)))
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn resolve(&self, rev: &str) -> Result<Oid> {
        let not_found = || LedgerError::config(format!("Cannot resolve '{}'", rev));

        if rev == "HEAD" {
            return self.commits.first().map(|(oid, _)| *oid).ok_or_else(not_found);
        }
        if let Some(n) = rev.strip_prefix("HEAD~") {
            let n: usize = n.parse().map_err(|_| not_found())?;
            return self.commits.get(n).map(|(oid, _)| *oid).ok_or_else(not_found);
        }
        if let Some(oid) = self.lock_tags().get(rev) {
            return Ok(*oid);
        }
        self.commits
            .iter()
            .find(|(oid, _)| oid.to_string() == rev)
            .map(|(oid, _)| *oid)
            .ok_or_else(not_found)
    }

    fn changed_paths(&self, from: Oid, to: Oid) -> Result<ChangeSet> {
        let mut paths = ChangeSet::default();
        for commit in self.log(to, Some(from))? {
            for path in commit.paths {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self.lock_tags().keys().cloned().collect();
        tags.sort();
        Ok(tags)
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        Ok(self.lock_tags().get(tag_name).copied())
    }

    fn latest_tag_reachable(&self, head: Oid, candidates: &[String]) -> Result<Option<String>> {
        let tags = self.lock_tags();
        let start = self.position(head)?;

        for (oid, _) in &self.commits[start..] {
            let best = candidates
                .iter()
                .filter(|name| tags.get(name.as_str()) == Some(oid))
                .max();
            if let Some(name) = best {
                return Ok(Some(name.clone()));
            }
        }
        Ok(None)
    }

    fn log(&self, head: Oid, since: Option<Oid>) -> Result<Vec<CommitInfo>> {
        let start = self.position(head)?;

        Ok(self.commits[start..]
            .iter()
            .take_while(|(oid, _)| Some(*oid) != since)
            .map(|(_, info)| info.clone())
            .collect())
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        self.position(oid)?;
        let mut tags = self.lock_tags();
        if tags.contains_key(name) {
            return Err(LedgerError::tag(format!("Tag '{}' already exists", name)));
        }
        tags.insert(name.to_string(), oid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn info(subject: &str, paths: &[&str]) -> CommitInfo {
        CommitInfo {
            hash: String::new(),
            subject: subject.to_string(),
            author: "Test Author".to_string(),
            time: Utc::now(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_mock_repository_history() {
        let mut repo = MockRepository::new();
        let first = repo.add_commit(info("first", &["src/a/1"])).unwrap();
        let second = repo.add_commit(info("second", &["src/b/1"])).unwrap();

        assert_eq!(repo.resolve("HEAD").unwrap(), second);
        assert_eq!(repo.resolve("HEAD~1").unwrap(), first);
        assert!(repo.resolve("HEAD~2").is_err());

        let log = repo.log(second, None).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].subject, "second");
        assert_eq!(log[0].hash, second.to_string());

        let changed = repo.changed_paths(first, second).unwrap();
        assert_eq!(changed.paths(), &["src/b/1".to_string()]);
    }

    #[test]
    fn test_mock_repository_tags() {
        let mut repo = MockRepository::new();
        let oid = repo.add_commit(info("c", &[])).unwrap();

        repo.add_tag("v1.0.0", oid);

        assert_eq!(repo.find_tag_oid("v1.0.0").unwrap(), Some(oid));
        assert_eq!(repo.find_tag_oid("v2.0.0").unwrap(), None);
        assert_eq!(repo.resolve("v1.0.0").unwrap(), oid);
    }

    #[test]
    fn test_mock_latest_tag_reachable() {
        let mut repo = MockRepository::new();
        let c1 = repo.add_commit(info("1", &[])).unwrap();
        let c2 = repo.add_commit(info("2", &[])).unwrap();
        let c3 = repo.add_commit(info("3", &[])).unwrap();
        repo.add_tag("a-v0.1.0", c1);
        repo.add_tag("a-v0.2.0", c2);

        let candidates = repo.list_tags().unwrap();
        assert_eq!(
            repo.latest_tag_reachable(c3, &candidates).unwrap(),
            Some("a-v0.2.0".to_string())
        );
        assert_eq!(
            repo.latest_tag_reachable(c1, &candidates).unwrap(),
            Some("a-v0.1.0".to_string())
        );
    }

    #[test]
    fn test_mock_create_tag_rejects_duplicates() {
        let mut repo = MockRepository::new();
        let oid = repo.add_commit(info("c", &[])).unwrap();
        repo.create_tag("x-v0.1.0", oid).unwrap();
        assert!(repo.create_tag("x-v0.1.0", oid).is_err());
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert!(repo.list_tags().unwrap().is_empty());
        assert!(repo.resolve("HEAD").is_err());
    }
}
