//! Changelog derivation from commit history.
//!
//! Entries are rendered as `subject (author, relative-time)` where the
//! relative time uses the same thresholds and wording as git's `%ar`.

use crate::domain::ReleaseVersion;
use chrono::{DateTime, Utc};
use std::fmt;

/// Commit information as returned by the git layer
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The commit hash
    pub hash: String,
    /// First line of the commit message
    pub subject: String,
    /// The commit author name
    pub author: String,
    /// Author timestamp
    pub time: DateTime<Utc>,
    /// Paths changed by this commit relative to its first parent
    pub paths: Vec<String>,
}

impl CommitInfo {
    /// True when this commit changed at least one path under `prefix`
    pub fn touches(&self, prefix: &str) -> bool {
        self.paths.iter().any(|p| p.starts_with(prefix))
    }
}

/// One changelog line, derived from a commit
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogEntry {
    pub hash: String,
    pub subject: String,
    pub author: String,
    pub time: DateTime<Utc>,
}

impl ChangelogEntry {
    /// Render as `subject (author, relative-time)` against `now`
    pub fn render(&self, now: DateTime<Utc>) -> String {
        format!(
            "{} ({}, {})",
            self.subject,
            self.author,
            relative_time(self.time, now)
        )
    }
}

impl From<&CommitInfo> for ChangelogEntry {
    fn from(commit: &CommitInfo) -> Self {
        ChangelogEntry {
            hash: commit.hash.clone(),
            subject: commit.subject.clone(),
            author: commit.author.clone(),
            time: commit.time,
        }
    }
}

/// Keep the commits that touched `project_root`, preserving their order.
///
/// `commits` is expected newest first, as produced by a history walk.
pub fn derive_changelog(project_root: &str, commits: &[CommitInfo]) -> Vec<ChangelogEntry> {
    commits
        .iter()
        .filter(|c| c.touches(project_root))
        .map(ChangelogEntry::from)
        .collect()
}

/// Changelog document for one release unit
#[derive(Debug, Clone, PartialEq)]
pub struct Changelog {
    pub project: String,
    pub version: ReleaseVersion,
    pub tag: String,
    pub description: String,
    pub since_tag: Option<String>,
    pub entries: Vec<ChangelogEntry>,
}

impl Changelog {
    /// Render the changelog as Markdown
    pub fn to_markdown(&self, now: DateTime<Utc>) -> String {
        let mut out = format!("## {} v{}", self.project, self.version);
        if !self.description.is_empty() {
            out.push_str(&format!(": {}", self.description));
        }
        out.push_str("\n\n");

        match &self.since_tag {
            Some(tag) => out.push_str(&format!("Changes since {}:\n\n", tag)),
            None => out.push_str("Changes since the beginning of history:\n\n"),
        }

        if self.entries.is_empty() {
            out.push_str("- No changes\n");
        } else {
            for entry in &self.entries {
                out.push_str(&format!("- {}\n", entry.render(now)));
            }
        }
        out
    }
}

impl fmt::Display for Changelog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_markdown(Utc::now()))
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Human-readable age of `then` as seen from `now`, e.g. "3 days ago".
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - then).num_seconds();
    if diff < 0 {
        return "in the future".to_string();
    }

    if diff < 90 {
        return format!("{} ago", plural(diff, "second"));
    }
    let minutes = (diff + 30) / 60;
    if minutes < 90 {
        return format!("{} ago", plural(minutes, "minute"));
    }
    let hours = (minutes + 30) / 60;
    if hours < 36 {
        return format!("{} ago", plural(hours, "hour"));
    }
    let days = (hours + 12) / 24;
    if days < 14 {
        return format!("{} ago", plural(days, "day"));
    }
    if days < 70 {
        return format!("{} ago", plural((days + 3) / 7, "week"));
    }
    if days < 365 {
        return format!("{} ago", plural((days + 15) / 30, "month"));
    }
    if days < 1825 {
        let total_months = (days * 12 * 2 + 365) / (365 * 2);
        let years = total_months / 12;
        let months = total_months % 12;
        if months > 0 {
            return format!(
                "{}, {} ago",
                plural(years, "year"),
                plural(months, "month")
            );
        }
        return format!("{} ago", plural(years, "year"));
    }
    format!("{} ago", plural((days + 183) / 365, "year"))
}
