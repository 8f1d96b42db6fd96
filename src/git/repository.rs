use crate::domain::{ChangeSet, CommitInfo};
use crate::error::{LedgerError, Result};
use chrono::{TimeZone, Utc};
use git2::{Commit, Diff, ObjectType, Oid, Repository as Git2Repo, Sort};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn diff_paths(diff: &Diff<'_>) -> ChangeSet {
        let mut paths = ChangeSet::default();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    paths.push(path.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        paths
    }

    /// Paths changed by a commit relative to its first parent
    fn commit_paths(&self, commit: &Commit<'_>) -> Result<Vec<String>> {
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        Ok(Self::diff_paths(&diff).paths().to_vec())
    }
}

impl super::Repository for Git2Repository {
    fn resolve(&self, rev: &str) -> Result<Oid> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| LedgerError::config(format!("Cannot resolve '{}': {}", rev, e)))?;
        let commit = object.peel_to_commit().map_err(|e| {
            LedgerError::config(format!("'{}' does not point at a commit: {}", rev, e))
        })?;
        Ok(commit.id())
    }

    fn changed_paths(&self, from: Oid, to: Oid) -> Result<ChangeSet> {
        let old_tree = self.repo.find_commit(from)?.tree()?;
        let new_tree = self.repo.find_commit(to)?.tree()?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;
        let paths = Self::diff_paths(&diff);

        debug!(%from, %to, count = paths.len(), "computed change set");
        Ok(paths)
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                // Annotated tags peel through the tag object to the commit
                let oid = reference
                    .peel(ObjectType::Commit)
                    .map_err(|e| LedgerError::tag(format!("Cannot peel tag: {}", e)))?
                    .id();

                Ok(Some(oid))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(LedgerError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn latest_tag_reachable(&self, head: Oid, candidates: &[String]) -> Result<Option<String>> {
        let mut tag_oids: HashMap<Oid, Vec<&str>> = HashMap::new();
        for name in candidates {
            if let Some(oid) = self.find_tag_oid(name)? {
                tag_oids.entry(oid).or_default().push(name.as_str());
            }
        }
        if tag_oids.is_empty() {
            return Ok(None);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head)?;

        for oid in revwalk {
            let oid = oid?;
            if let Some(names) = tag_oids.get(&oid) {
                // Several release tags on one commit: take the greatest
                return Ok(names.iter().max().map(|s| s.to_string()));
            }
        }

        Ok(None)
    }

    fn log(&self, head: Oid, since: Option<Oid>) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head)?;
        if let Some(since) = since {
            revwalk.hide(since)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;

            let subject = commit.summary().unwrap_or("(empty message)").to_string();
            let author = commit.author().name().unwrap_or("unknown").to_string();
            let time = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or_default();
            let paths = self.commit_paths(&commit)?;

            commits.push(CommitInfo {
                hash: oid.to_string(),
                subject,
                author,
                time,
                paths,
            });
        }

        Ok(commits)
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| LedgerError::tag(format!("Cannot find object: {}", e)))?;

        self.repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| LedgerError::tag(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use std::fs;
    use tempfile::TempDir;

    fn commit_file(repo: &Git2Repo, dir: &Path, rel: &str, content: &str, message: &str) -> Oid {
        let full = dir.join(rel);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(rel)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        let parents: Vec<Commit> = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_changed_paths_and_log() {
        let dir = TempDir::new().unwrap();
        let raw = Git2Repo::init(dir.path()).unwrap();
        let first = commit_file(&raw, dir.path(), "src/a/main.py", "1", "init a");
        let second = commit_file(&raw, dir.path(), "src/b/main.py", "1", "init b");

        let repo = Git2Repository::from_git2(raw);
        assert_eq!(repo.resolve("HEAD").unwrap(), second);
        assert_eq!(repo.resolve("HEAD~1").unwrap(), first);

        let changed = repo.changed_paths(first, second).unwrap();
        assert_eq!(changed.paths(), &["src/b/main.py".to_string()]);

        let all = repo.log(second, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].subject, "init b");
        assert_eq!(all[1].paths, vec!["src/a/main.py".to_string()]);

        let since_first = repo.log(second, Some(first)).unwrap();
        assert_eq!(since_first.len(), 1);
        assert_eq!(since_first[0].author, "Test User");
    }

    #[test]
    fn test_tags() {
        let dir = TempDir::new().unwrap();
        let raw = Git2Repo::init(dir.path()).unwrap();
        let first = commit_file(&raw, dir.path(), "src/a/x", "1", "one");
        let second = commit_file(&raw, dir.path(), "src/a/x", "2", "two");

        let repo = Git2Repository::from_git2(raw);
        repo.create_tag("a-v0.1.0", first).unwrap();
        assert_eq!(repo.find_tag_oid("a-v0.1.0").unwrap(), Some(first));
        assert_eq!(repo.find_tag_oid("missing").unwrap(), None);
        assert_eq!(repo.list_tags().unwrap(), vec!["a-v0.1.0".to_string()]);

        let candidates = vec!["a-v0.1.0".to_string()];
        assert_eq!(
            repo.latest_tag_reachable(second, &candidates).unwrap(),
            Some("a-v0.1.0".to_string())
        );
        assert!(repo.create_tag("a-v0.1.0", second).is_err());
    }

    #[test]
    fn test_resolve_unknown_revision() {
        let dir = TempDir::new().unwrap();
        let raw = Git2Repo::init(dir.path()).unwrap();
        commit_file(&raw, dir.path(), "f", "1", "only");

        let repo = Git2Repository::from_git2(raw);
        assert!(repo.resolve("HEAD~5").is_err());
    }
}
