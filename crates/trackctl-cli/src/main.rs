mod cmd;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::{issue::IssueSubcommand, milestone::MilestoneSubcommand, mr::MrSubcommand};
use trackctl_core::Client;

#[derive(Parser)]
#[command(
    name = "trackctl",
    about = "Automate issue, merge request, and milestone chores on a GitLab-style tracker",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project ID (default: CI_PROJECT_ID when run from a pipeline)
    #[arg(long, short = 'p', global = true, env = "CI_PROJECT_ID")]
    project: Option<u64>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage issues
    Issue {
        #[command(subcommand)]
        subcommand: IssueSubcommand,
    },

    /// Manage merge requests
    Mr {
        #[command(subcommand)]
        subcommand: MrSubcommand,
    },

    /// Manage milestones and their changelogs
    Milestone {
        #[command(subcommand)]
        subcommand: MilestoneSubcommand,
    },
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let client = Client::from_env().context("tracker connection not configured")?;
    let project = require_project(cli.project)?;

    match cli.command {
        Commands::Issue { subcommand } => cmd::issue::run(&client, project, subcommand, cli.json),
        Commands::Mr { subcommand } => cmd::mr::run(&client, project, subcommand, cli.json),
        Commands::Milestone { subcommand } => {
            cmd::milestone::run(&client, project, subcommand, cli.json)
        }
    }
}

fn require_project(project: Option<u64>) -> anyhow::Result<u64> {
    project.ok_or_else(|| trackctl_core::TrackError::MissingProject.into())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
