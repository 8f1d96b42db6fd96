//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! collaborator, allowing the release workflow to run against a real
//! repository or an in-memory mock.
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! ```rust
//! # use release_ledger::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> Result<(), Box<dyn std::error::Error>> {
//! let base = repo.resolve("HEAD~1")?;
//! let head = repo.resolve("HEAD")?;
//! let changed = repo.changed_paths(base, head)?;
//! let history = repo.log(head, Some(base))?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use crate::domain::CommitInfo;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::ChangeSet;
use crate::error::Result;
use git2::Oid;

/// Common git operation trait for abstraction
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to [crate::error::LedgerError].
pub trait Repository {
    /// Resolve a revision (e.g. "HEAD", "HEAD~1", a tag or a hash) to a commit OID
    fn resolve(&self, rev: &str) -> Result<Oid>;

    /// Paths that differ between the trees of two commits
    ///
    /// Both the old and new path of renamed files are included.
    fn changed_paths(&self, from: Oid, to: Oid) -> Result<ChangeSet>;

    /// Get all tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Find a tag by name and return the commit it points at
    ///
    /// # Returns
    /// * `Ok(Some(Oid))` - Commit the tag refers to
    /// * `Ok(None)` - If the tag doesn't exist
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Walk history from `head` and return the first of `candidates` found
    ///
    /// # Returns
    /// * `Ok(Some(tag))` - The nearest candidate tag reachable from head
    /// * `Ok(None)` - If none of the candidates is reachable
    fn latest_tag_reachable(&self, head: Oid, candidates: &[String]) -> Result<Option<String>>;

    /// Commits reachable from `head` but not from `since`, newest first
    ///
    /// With `since` set to `None` the whole history of `head` is returned.
    fn log(&self, head: Oid, since: Option<Oid>) -> Result<Vec<CommitInfo>>;

    /// Create a lightweight tag at given OID
    fn create_tag(&self, name: &str, oid: Oid) -> Result<()>;
}
