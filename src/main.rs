use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use release_ledger::cli::{bump_project, project_tag, ReleaseRequest, ReleaseWorkflow};
use release_ledger::config::{self, Config};
use release_ledger::git::Git2Repository;
use release_ledger::ledger::{FileLedgerStore, LedgerStore};
use release_ledger::ui;

#[derive(Parser)]
#[command(
    name = "release-ledger",
    about = "Bump per-project versions, record them in a ledger and derive changelogs from git",
    version
)]
struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv)")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects whose files changed between two revisions
    Detect {
        #[arg(long)]
        base: String,

        #[arg(long, default_value = "HEAD")]
        head: String,
    },

    /// Bump one project in the ledger
    Bump {
        project: String,

        /// Print the new version without writing the ledger
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the changelog for a project's next release
    Changelog {
        project: String,

        /// Start from this tag instead of the latest reachable release tag
        #[arg(long)]
        since: Option<String>,

        #[arg(long, default_value = "HEAD")]
        head: String,
    },

    /// Print the tag for a project's current ledger version
    Tag { project: String },

    /// List the version ledger
    Show,

    /// Release every changed project
    Release {
        #[arg(long, default_value = "HEAD~1")]
        base: String,

        #[arg(long, default_value = "HEAD")]
        head: String,

        /// Only release these projects (repeatable)
        #[arg(long = "project")]
        projects: Vec<String>,

        /// Compute everything, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Do not create local tags
        #[arg(long)]
        no_tag: bool,
    },
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "release_ledger=warn",
        1 => "release_ledger=info",
        _ => "release_ledger=debug",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, &config) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let store = FileLedgerStore::new(&config.ledger);

    match command {
        Commands::Show => {
            let ledger = store.load()?.ledger;
            ui::display_ledger(&ledger);
        }
        Commands::Tag { project } => {
            let ledger = store.load()?.ledger;
            println!("{}", project_tag(&ledger, config.mode, &project)?);
        }
        Commands::Bump { project, dry_run } => {
            let (previous, next) =
                bump_project(&store, &project, config.behavior.conflict_retries, dry_run)?;
            ui::display_bump(&project, &previous, &next);
            println!("{}", config.mode.pattern().format(&project, &next));
        }
        Commands::Detect { base, head } => {
            let repo = open_repository()?;
            let workflow = ReleaseWorkflow::new(&repo, &store, config);
            let detection = workflow.detect(&base, &head)?;
            for project in &detection.changed {
                println!("{}", project);
            }
        }
        Commands::Changelog {
            project,
            since,
            head,
        } => {
            let repo = open_repository()?;
            let workflow = ReleaseWorkflow::new(&repo, &store, config);
            let changelog = workflow.project_changelog(&project, &head, since.as_deref())?;
            print!("{}", changelog);
        }
        Commands::Release {
            base,
            head,
            projects,
            dry_run,
            yes,
            no_tag,
        } => {
            let repo = open_repository()?;
            let workflow = ReleaseWorkflow::new(&repo, &store, config);

            let mut request = ReleaseRequest::new(base, head);
            request.only = projects;
            request.dry_run = dry_run;
            request.create_tags = config.behavior.create_tags && !no_tag;

            if !dry_run && !yes {
                let detection = workflow.detect(&request.base, &request.head)?;
                if !detection.changed.is_empty() {
                    ui::display_changed_projects(&detection.changed);
                    if !ui::confirm_action("Bump versions and record them in the ledger?")? {
                        println!("Operation cancelled by user.");
                        return Ok(());
                    }
                }
            }

            let report = workflow.run(&request)?;
            for warning in &report.warnings {
                ui::display_boundary_warning(warning);
            }
            for outcome in &report.outcomes {
                ui::display_release_outcome(outcome, dry_run);
                if outcome.tagged {
                    ui::display_manual_push_instruction(&outcome.tag, &config.remote);
                }
            }
            for (project, error) in &report.failures {
                ui::display_error(&format!("{}: {}", project, error));
            }

            if !report.is_success() {
                anyhow::bail!("{} project(s) failed to release", report.failures.len());
            }
            if !dry_run && !report.outcomes.is_empty() {
                ui::display_success(&format!(
                    "Released {} project(s); ledger {} updated",
                    report.outcomes.len(),
                    store.path().display()
                ));
            }
        }
    }

    Ok(())
}

fn open_repository() -> Result<Git2Repository> {
    Git2Repository::open(".").context("Not inside a git repository")
}
