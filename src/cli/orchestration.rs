//! Release workflow orchestration
//!
//! Runs the per-project release sequence (detect, bump, write ledger,
//! derive changelog, emit artifacts) over any [`Repository`] and
//! [`LedgerStore`]. The CLI in `main.rs` only parses arguments and
//! renders the results.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use git2::Oid;
use tracing::{debug, info, warn};

use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::domain::{
    derive_changelog, detect_changed_projects, ChangeSet, Changelog, ChangelogEntry, ReleaseVersion,
    TagMode, TagPattern,
};
use crate::error::{LedgerError, Result};
use crate::git::Repository;
use crate::ledger::{apply_bump, update_ledger, LedgerStore, VersionLedger};

/// Arguments for the release workflow
///
/// Mirrors the CLI arguments in a form that can be built programmatically.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRequest {
    /// Previous release point
    pub base: String,

    /// Commit being released
    pub head: String,

    /// Restrict the release to these projects (empty = every changed project)
    pub only: Vec<String>,

    /// Compute everything, write nothing
    pub dry_run: bool,

    /// Create a local lightweight tag per released project
    pub create_tags: bool,
}

impl ReleaseRequest {
    pub fn new(base: impl Into<String>, head: impl Into<String>) -> Self {
        ReleaseRequest {
            base: base.into(),
            head: head.into(),
            only: Vec::new(),
            dry_run: false,
            create_tags: true,
        }
    }
}

/// Result of change detection between two revisions
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub base: Oid,
    pub head: Oid,
    pub changes: ChangeSet,
    pub changed: BTreeSet<String>,
}

/// One released project
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub project: String,
    pub previous: ReleaseVersion,
    pub version: ReleaseVersion,
    pub tag: String,
    pub changelog: Changelog,
    pub changelog_path: Option<PathBuf>,
    pub tagged: bool,
}

/// Everything a release run produced
#[derive(Debug, Default)]
pub struct ReleaseReport {
    pub changed: BTreeSet<String>,
    pub outcomes: Vec<ReleaseOutcome>,
    pub warnings: Vec<BoundaryWarning>,
    pub failures: Vec<(String, LedgerError)>,
}

impl ReleaseReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Release workflow bound to a repository, a ledger store and a config
pub struct ReleaseWorkflow<'a, R: Repository + ?Sized, S: LedgerStore + ?Sized> {
    repo: &'a R,
    store: &'a S,
    config: &'a Config,
}

impl<'a, R: Repository + ?Sized, S: LedgerStore + ?Sized> ReleaseWorkflow<'a, R, S> {
    pub fn new(repo: &'a R, store: &'a S, config: &'a Config) -> Self {
        ReleaseWorkflow {
            repo,
            store,
            config,
        }
    }

    fn tag_pattern(&self) -> TagPattern {
        self.config.mode.pattern()
    }

    /// Tag name for a release of `project` at `version`
    pub fn tag_for(&self, project: &str, version: &ReleaseVersion) -> String {
        self.tag_pattern().format(project, version)
    }

    fn check_mode(&self, ledger: &VersionLedger) -> Result<()> {
        if self.config.mode == TagMode::Single {
            let count = self.config.project_roots(ledger).len();
            if count != 1 {
                return Err(LedgerError::config(format!(
                    "single mode needs exactly one project, found {}",
                    count
                )));
            }
        }
        Ok(())
    }

    /// Flag the projects whose files changed between `base` and `head`
    pub fn detect(&self, base: &str, head: &str) -> Result<Detection> {
        let base_oid = self.repo.resolve(base)?;
        let head_oid = self.repo.resolve(head)?;
        let ledger = self.store.load()?.ledger;
        self.check_mode(&ledger)?;

        let changes = self.repo.changed_paths(base_oid, head_oid)?;
        let roots = self.config.project_roots(&ledger);
        let changed = detect_changed_projects(&changes, &roots);

        info!(
            %base_oid,
            %head_oid,
            paths = changes.len(),
            projects = ?changed,
            "change detection finished"
        );

        Ok(Detection {
            base: base_oid,
            head: head_oid,
            changes,
            changed,
        })
    }

    /// Latest release tag of `project` reachable from `head`
    pub fn since_tag(&self, project: &str, head: Oid) -> Result<Option<String>> {
        let tags = self.repo.list_tags()?;
        let candidates = self.tag_pattern().filter_tags(project, &tags)?;
        let found = self.repo.latest_tag_reachable(head, &candidates)?;
        debug!(project, since_tag = ?found, "resolved previous release tag");
        Ok(found)
    }

    /// Changelog entries for `project` between `since_tag` and `head`
    pub fn changelog_entries(
        &self,
        project: &str,
        head: Oid,
        since_tag: Option<&str>,
    ) -> Result<Vec<ChangelogEntry>> {
        let since = match since_tag {
            Some(tag) => Some(self.repo.find_tag_oid(tag)?.ok_or_else(|| {
                LedgerError::tag(format!("Tag '{}' does not exist", tag))
            })?),
            None => None,
        };

        let commits = self.repo.log(head, since)?;
        let root = self.config.project_root(project);
        Ok(derive_changelog(&root.prefix, &commits))
    }

    /// Changelog the next release of `project` would get, without writing anything
    pub fn project_changelog(
        &self,
        project: &str,
        head: &str,
        since_override: Option<&str>,
    ) -> Result<Changelog> {
        let head_oid = self.repo.resolve(head)?;
        let ledger = self.store.load()?.ledger;

        let since_tag = match since_override {
            Some(tag) => Some(tag.to_string()),
            None => self.since_tag(project, head_oid)?,
        };
        let entries = self.changelog_entries(project, head_oid, since_tag.as_deref())?;
        let version = ledger.version_of(project)?.bump()?;

        Ok(Changelog {
            project: project.to_string(),
            version,
            tag: self.tag_for(project, &version),
            description: ledger.description_of(project)?.to_string(),
            since_tag,
            entries,
        })
    }

    /// Release a single project at `head`.
    ///
    /// All reads happen before the ledger write. Changelog file and tag
    /// creation come after it; a failure there leaves the ledger ahead of
    /// the tags and is reported as such.
    pub fn release_project(
        &self,
        project: &str,
        head: Oid,
        dry_run: bool,
        create_tags: bool,
    ) -> Result<(ReleaseOutcome, Vec<BoundaryWarning>)> {
        let mut warnings = Vec::new();
        let snapshot = self.store.load()?;
        let planned_previous = snapshot.ledger.version_of(project)?;
        let description = snapshot.ledger.description_of(project)?.to_string();

        let since_tag = self.since_tag(project, head)?;
        let entries = self.changelog_entries(project, head, since_tag.as_deref())?;
        match &since_tag {
            None => warnings.push(BoundaryWarning::NoPriorTag {
                project: project.to_string(),
            }),
            Some(tag) if entries.is_empty() => warnings.push(BoundaryWarning::NoNewCommits {
                project: project.to_string(),
                since_tag: tag.clone(),
            }),
            Some(_) => {}
        }

        let planned_next = planned_previous.bump()?;
        let planned_tag = self.tag_for(project, &planned_next);
        if create_tags && self.repo.find_tag_oid(&planned_tag)?.is_some() {
            return Err(LedgerError::tag(format!(
                "Tag '{}' already exists; refusing to bump '{}'",
                planned_tag, project
            )));
        }

        let (previous, version) = if dry_run {
            (planned_previous, planned_next)
        } else {
            let mut previous = planned_previous;
            let updated = update_ledger(
                self.store,
                self.config.behavior.conflict_retries,
                |ledger| {
                    previous = ledger.version_of(project)?;
                    apply_bump(ledger, project, &previous.bump()?)
                },
            )?;
            (previous, updated.version_of(project)?)
        };
        info!(project, from = %previous, to = %version, dry_run, "version bumped");

        let tag = self.tag_for(project, &version);
        let changelog = Changelog {
            project: project.to_string(),
            version,
            tag: tag.clone(),
            description,
            since_tag,
            entries,
        };

        let mut changelog_path = None;
        let mut tagged = false;
        if !dry_run {
            if let Some(dir) = &self.config.changelog_dir {
                let path = dir.join(format!("{}.md", tag));
                fs::create_dir_all(dir)
                    .and_then(|_| fs::write(&path, changelog.to_string()))
                    .map_err(|e| {
                        LedgerError::ledger(format!(
                            "ledger records {} for '{}' but writing {} failed: {}",
                            version,
                            project,
                            path.display(),
                            e
                        ))
                    })?;
                debug!(path = %path.display(), "changelog written");
                changelog_path = Some(path);
            }

            if create_tags {
                self.repo.create_tag(&tag, head).map_err(|e| {
                    LedgerError::tag(format!(
                        "ledger records {} for '{}' but tag creation failed: {}",
                        version, project, e
                    ))
                })?;
                info!(project, %tag, "tag created");
                tagged = true;
            }
        }

        Ok((
            ReleaseOutcome {
                project: project.to_string(),
                previous,
                version,
                tag,
                changelog,
                changelog_path,
                tagged,
            },
            warnings,
        ))
    }

    /// Run the full release for every changed project.
    ///
    /// Projects are released independently: one project's failure is
    /// recorded in the report and does not stop the others.
    pub fn run(&self, request: &ReleaseRequest) -> Result<ReleaseReport> {
        let detection = self.detect(&request.base, &request.head)?;
        let ledger = self.store.load()?.ledger;

        let mut report = ReleaseReport {
            changed: detection.changed.clone(),
            ..ReleaseReport::default()
        };

        let selected: Vec<&String> = detection
            .changed
            .iter()
            .filter(|p| request.only.is_empty() || request.only.contains(*p))
            .collect();

        if selected.is_empty() {
            report.warnings.push(BoundaryWarning::NoChangedProjects {
                base: detection.base.to_string(),
                head: detection.head.to_string(),
            });
            return Ok(report);
        }

        for project in selected {
            if !ledger.contains(project) {
                report
                    .warnings
                    .push(BoundaryWarning::UnknownProjectInLedger {
                        project: project.clone(),
                    });
                continue;
            }

            match self.release_project(project, detection.head, request.dry_run, request.create_tags)
            {
                Ok((outcome, warnings)) => {
                    report.warnings.extend(warnings);
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    warn!(project = %project, error = %e, "release failed");
                    report.failures.push((project.clone(), e));
                }
            }
        }

        Ok(report)
    }
}

/// Bump one project in the ledger without touching git.
///
/// # Returns
/// The previous and the new version
pub fn bump_project<S: LedgerStore + ?Sized>(
    store: &S,
    project: &str,
    retries: u32,
    dry_run: bool,
) -> Result<(ReleaseVersion, ReleaseVersion)> {
    if dry_run {
        let current = store.load()?.ledger.version_of(project)?;
        return Ok((current, current.bump()?));
    }

    let mut previous = None;
    let updated = update_ledger(store, retries, |ledger| {
        let current = ledger.version_of(project)?;
        previous = Some(current);
        apply_bump(ledger, project, &current.bump()?)
    })?;

    let next = updated.version_of(project)?;
    let previous = previous.ok_or_else(|| LedgerError::ledger("ledger update did not run"))?;
    Ok((previous, next))
}

/// Tag name for the version currently recorded for `project`
pub fn project_tag(ledger: &VersionLedger, mode: TagMode, project: &str) -> Result<String> {
    let version = ledger.version_of(project)?;
    Ok(mode.pattern().format(project, &version))
}
