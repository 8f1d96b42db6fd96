use crate::domain::ReleaseVersion;
use crate::error::{LedgerError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Multi-project tags carry the project id, single-project tags do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    #[default]
    Multi,
    Single,
}

impl TagMode {
    /// Tag pattern used by this mode
    pub fn pattern(&self) -> TagPattern {
        match self {
            TagMode::Multi => TagPattern::new("{project}-v{version}"),
            TagMode::Single => TagPattern::new("v{version}"),
        }
    }
}

/// Tag naming pattern (e.g., "{project}-v{version}", "v{version}")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub pattern: String,
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Format a release tag for a project.
    /// Example: pattern="{project}-v{version}", project="api", version=1.2 -> "api-v1.2.0"
    pub fn format(&self, project: &str, version: &ReleaseVersion) -> String {
        self.pattern
            .replace("{project}", project)
            .replace("{version}", &version.to_string())
    }

    /// Check whether an existing tag was produced by this pattern for `project`
    pub fn matches(&self, project: &str, tag: &str) -> Result<bool> {
        Ok(self.regex_for(project)?.is_match(tag))
    }

    /// Keep only the tags that belong to `project`
    pub fn filter_tags(&self, project: &str, tags: &[String]) -> Result<Vec<String>> {
        let re = self.regex_for(project)?;
        Ok(tags.iter().filter(|t| re.is_match(t)).cloned().collect())
    }

    fn regex_for(&self, project: &str) -> Result<Regex> {
        if !self.pattern.contains("{version}") {
            return Err(LedgerError::tag(
                "Pattern must contain {version} placeholder",
            ));
        }

        // Escape everything, then substitute the placeholders
        let escaped = regex::escape(&self.pattern);
        let regex_pattern = escaped
            .replace(r"\{project\}", &regex::escape(project))
            .replace(r"\{version\}", r"\d+\.\d+\.\d+");

        Regex::new(&format!("^{}$", regex_pattern))
            .map_err(|e| LedgerError::tag(format!("Invalid pattern '{}': {}", self.pattern, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_mode_format() {
        let pattern = TagMode::Multi.pattern();
        assert_eq!(
            pattern.format("project2", &ReleaseVersion::new(1, 0)),
            "project2-v1.0.0"
        );
    }

    #[test]
    fn test_single_mode_format() {
        let pattern = TagMode::Single.pattern();
        assert_eq!(pattern.format("app", &ReleaseVersion::new(0, 3)), "v0.3.0");
    }

    #[test]
    fn test_pattern_matches_own_project_only() {
        let pattern = TagMode::Multi.pattern();
        assert!(pattern.matches("project1", "project1-v0.2.0").unwrap());
        assert!(!pattern.matches("project1", "project10-v0.2.0").unwrap());
        assert!(!pattern.matches("project1", "project2-v0.2.0").unwrap());
        assert!(!pattern.matches("project1", "project1-v0.2").unwrap());
    }

    #[test]
    fn test_pattern_escapes_project_id() {
        let pattern = TagMode::Multi.pattern();
        assert!(pattern.matches("a.b", "a.b-v1.0.0").unwrap());
        assert!(!pattern.matches("a.b", "axb-v1.0.0").unwrap());
    }

    #[test]
    fn test_filter_tags() {
        let pattern = TagMode::Multi.pattern();
        let tags = vec![
            "project1-v0.1.0".to_string(),
            "project2-v0.1.0".to_string(),
            "project1-v0.2.0".to_string(),
            "v0.1.0".to_string(),
        ];
        assert_eq!(
            pattern.filter_tags("project1", &tags).unwrap(),
            vec!["project1-v0.1.0".to_string(), "project1-v0.2.0".to_string()]
        );
    }

    #[test]
    fn test_pattern_without_version_is_rejected() {
        let pattern = TagPattern::new("release-{project}");
        assert!(pattern.matches("x", "release-x").is_err());
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: TagMode,
        }
        let w: Wrapper = toml::from_str("mode = \"single\"").unwrap();
        assert_eq!(w.mode, TagMode::Single);
    }
}
