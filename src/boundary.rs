use std::fmt;

/// Warnings raised at the edges of a release run.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The change set touched none of the configured projects
    NoChangedProjects { base: String, head: String },
    /// No earlier release tag; the changelog covers all history
    NoPriorTag { project: String },
    /// Nothing touched the project since its last release tag
    NoNewCommits { project: String, since_tag: String },
    /// A configured project has no ledger record and cannot be bumped
    UnknownProjectInLedger { project: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoChangedProjects { base, head } => {
                write!(
                    f,
                    "No project changed between {} and {}",
                    short(base),
                    short(head)
                )
            }
            BoundaryWarning::NoPriorTag { project } => {
                write!(
                    f,
                    "No previous release tag for '{}', changelog covers all history",
                    project
                )
            }
            BoundaryWarning::NoNewCommits { project, since_tag } => {
                write!(
                    f,
                    "No commits touched '{}' since tag '{}'",
                    project, since_tag
                )
            }
            BoundaryWarning::UnknownProjectInLedger { project } => {
                write!(
                    f,
                    "Project '{}' changed but has no entry in the version ledger",
                    project
                )
            }
        }
    }
}

/// Shorten full commit hashes to 7 characters; leave symbolic revs alone
fn short(rev: &str) -> &str {
    if rev.len() == 40 && rev.chars().all(|c| c.is_ascii_hexdigit()) {
        &rev[..7]
    } else {
        rev
    }
}
