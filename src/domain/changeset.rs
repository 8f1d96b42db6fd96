use std::collections::BTreeSet;

/// Repository-relative paths that differ between two commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    paths: Vec<String>,
}

impl ChangeSet {
    /// Create a change set from paths in diff order
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChangeSet {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a path unless it is already present
    pub fn push(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True when at least one path lives under `prefix`
    pub fn touches(&self, prefix: &str) -> bool {
        self.paths.iter().any(|p| p.starts_with(prefix))
    }
}

/// A project id together with the path prefix that owns its sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    pub id: String,
    pub prefix: String,
}

impl ProjectRoot {
    /// Create a project root; the prefix always ends with `/`
    pub fn new(id: impl Into<String>, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into().replace('\\', "/");
        while prefix.starts_with("./") {
            prefix.drain(..2);
        }
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        ProjectRoot {
            id: id.into(),
            prefix,
        }
    }

    /// Conventional layout: `src/{id}/`
    pub fn conventional(id: impl Into<String>) -> Self {
        let id = id.into();
        let prefix = format!("src/{}/", id);
        ProjectRoot::new(id, prefix)
    }
}

/// Flag every project with at least one changed path under its prefix.
pub fn detect_changed_projects(diff: &ChangeSet, roots: &[ProjectRoot]) -> BTreeSet<String> {
    roots
        .iter()
        .filter(|root| diff.touches(&root.prefix))
        .map(|root| root.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots(ids: &[&str]) -> Vec<ProjectRoot> {
        ids.iter().map(|id| ProjectRoot::conventional(*id)).collect()
    }

    #[test]
    fn test_detects_single_project() {
        let diff = ChangeSet::new(["src/project1/a.py", "README.md"]);
        let changed = detect_changed_projects(&diff, &roots(&["project1", "project2"]));
        assert_eq!(changed, BTreeSet::from(["project1".to_string()]));
    }

    #[test]
    fn test_detects_multiple_projects() {
        let diff = ChangeSet::new(["src/project2/x.rs", "src/project1/lib/y.rs"]);
        let changed = detect_changed_projects(&diff, &roots(&["project1", "project2", "project3"]));
        assert_eq!(changed.len(), 2);
        assert!(changed.contains("project1"));
        assert!(changed.contains("project2"));
    }

    #[test]
    fn test_no_changes_flags_nothing() {
        let diff = ChangeSet::default();
        assert!(detect_changed_projects(&diff, &roots(&["project1"])).is_empty());
    }

    #[test]
    fn test_prefix_is_not_fooled_by_similar_names() {
        let diff = ChangeSet::new(["src/project10/main.py"]);
        let changed = detect_changed_projects(&diff, &roots(&["project1", "project10"]));
        assert_eq!(changed, BTreeSet::from(["project10".to_string()]));
    }

    #[test]
    fn test_detection_is_idempotent() {
        let diff = ChangeSet::new(["src/b/1", "docs/x", "src/a/2"]);
        let r = roots(&["a", "b", "c"]);
        assert_eq!(
            detect_changed_projects(&diff, &r),
            detect_changed_projects(&diff, &r)
        );
    }

    #[test]
    fn test_root_prefix_normalisation() {
        assert_eq!(ProjectRoot::new("p", "src/p").prefix, "src/p/");
        assert_eq!(ProjectRoot::new("p", "./src/p/").prefix, "src/p/");
        assert_eq!(ProjectRoot::new("p", "src\\p").prefix, "src/p/");
    }

    #[test]
    fn test_change_set_push_dedupes() {
        let mut diff = ChangeSet::default();
        diff.push("a");
        diff.push("b");
        diff.push("a");
        assert_eq!(diff.paths(), &["a".to_string(), "b".to_string()]);
        assert_eq!(diff.len(), 2);
    }
}
