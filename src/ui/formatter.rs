//! Pure formatting functions for UI output.
//!
//! Display logic lives here, separated from user interaction. Rendering
//! helpers return strings so they can be tested; `display_*` functions print.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::cli::orchestration::ReleaseOutcome;
use crate::domain::ReleaseVersion;
use crate::ledger::VersionLedger;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Display the projects flagged by change detection.
pub fn display_changed_projects<'a, I>(projects: I)
where
    I: IntoIterator<Item = &'a String>,
{
    println!("{}", style("Changed projects:").bold());
    for project in projects {
        println!("  - {}", project);
    }
}

/// One line per ledger record, in file order: `project  version  description`.
pub fn render_ledger(ledger: &VersionLedger) -> String {
    let width = ledger.projects().map(str::len).max().unwrap_or(0);
    let mut out = String::new();
    for (project, entry) in ledger.iter() {
        let line = format!("{:width$}  {}", project, entry.version(), width = width);
        if entry.description().is_empty() {
            out.push_str(line.trim_end());
        } else {
            out.push_str(&format!("{}  {}", line, entry.description()));
        }
        out.push('\n');
    }
    out
}

/// Print the ledger contents.
pub fn display_ledger(ledger: &VersionLedger) {
    println!("{}", style("Version ledger:").bold());
    for line in render_ledger(ledger).lines() {
        println!("  {}", line);
    }
}

/// Text for a version change, `from -> to`.
pub fn render_bump(previous: &ReleaseVersion, next: &ReleaseVersion) -> String {
    format!("{} -> {}", previous, next)
}

/// Display the proposed or applied version change for a project.
///
/// # Arguments
/// * `project` - Project id
/// * `previous` - Version recorded before the bump
/// * `next` - Version after the bump
pub fn display_bump(project: &str, previous: &ReleaseVersion, next: &ReleaseVersion) {
    println!(
        "  {}: {} -> {}",
        style(project).bold(),
        style(previous).red(),
        style(next).green()
    );
}

/// Display everything a release produced for one project.
pub fn display_release_outcome(outcome: &ReleaseOutcome, dry_run: bool) {
    let header = if dry_run {
        "Proposed release"
    } else {
        "Released"
    };
    println!("\n{} {}", style(header).bold(), style(&outcome.project).bold());
    display_bump(&outcome.project, &outcome.previous, &outcome.version);
    println!("  Tag: {}", style(&outcome.tag).cyan());
    if let Some(path) = &outcome.changelog_path {
        println!("  Changelog: {}", path.display());
    }
    println!();
    print!("{}", outcome.changelog);
}

/// Display manual push instruction for a tag.
///
/// Tags are only created locally; pushing is left to the user.
pub fn display_manual_push_instruction(tag: &str, remote: &str) {
    println!(
        "\n{} To push this tag later, run:\n  {}",
        style("→").yellow(),
        style(format!("git push {} {}", remote, tag)).cyan()
    );
}
