//! Domain logic - pure release rules independent of git and storage

pub mod changelog;
pub mod changeset;
pub mod tag;
pub mod version;

pub use changelog::{derive_changelog, relative_time, Changelog, ChangelogEntry, CommitInfo};
pub use changeset::{detect_changed_projects, ChangeSet, ProjectRoot};
pub use tag::{TagMode, TagPattern};
pub use version::{ReleaseVersion, MINOR_ROLLOVER};
