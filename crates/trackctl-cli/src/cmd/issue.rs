use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use trackctl_core::client::{CreateIssueOpts, UpdateIssueOpts};
use trackctl_core::{config, Client};

#[derive(Subcommand)]
pub enum IssueSubcommand {
    /// List issues
    List {
        /// Issue state (opened/closed)
        #[arg(long, short = 's')]
        state: Option<String>,
    },
    /// Show issue details
    Get { iid: u64 },
    /// Create a new issue
    Create {
        /// Issue title
        #[arg(long, short = 't')]
        title: String,
        /// Issue description
        #[arg(long, short = 'd')]
        description: Option<String>,
        /// Comma-separated list of labels
        #[arg(long, short = 'l')]
        labels: Option<String>,
    },
    /// Update an existing issue
    Update {
        iid: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// State event (close/reopen)
        #[arg(long)]
        state: Option<String>,
    },
    /// Delete an issue
    Delete { iid: u64 },
    /// Print the issue description
    Description { iid: u64 },
}

pub fn run(client: &Client, project: u64, subcmd: IssueSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        IssueSubcommand::List { state } => list(client, project, state.as_deref(), json),
        IssueSubcommand::Get { iid } => get(client, project, iid, json),
        IssueSubcommand::Create {
            title,
            description,
            labels,
        } => create(client, project, title, description, labels, json),
        IssueSubcommand::Update {
            iid,
            title,
            description,
            state,
        } => update(client, project, iid, title, description, state, json),
        IssueSubcommand::Delete { iid } => delete(client, project, iid, json),
        IssueSubcommand::Description { iid } => description(client, project, iid),
    }
}

fn list(client: &Client, project: u64, state: Option<&str>, json: bool) -> anyhow::Result<()> {
    let issues = client
        .list_issues(project, state)
        .context("failed to list issues")?;

    if json {
        return print_json(&issues);
    }
    if issues.is_empty() {
        println!("No issues.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = issues
        .iter()
        .map(|i| {
            vec![
                format!("#{}", i.iid),
                i.state.clone(),
                i.title.clone(),
                i.labels.join(","),
            ]
        })
        .collect();
    print_table(&["IID", "STATE", "TITLE", "LABELS"], rows);
    Ok(())
}

fn get(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    let issue = client
        .get_issue(project, iid)
        .with_context(|| format!("failed to get issue #{iid}"))?;

    if json {
        return print_json(&issue);
    }

    println!("Issue #{}", issue.iid);
    println!("Title: {}", issue.title);
    println!("State: {}", issue.state);
    if let Some(m) = &issue.milestone {
        println!("Milestone: {}", m.title);
    }
    if !issue.description_text().is_empty() {
        println!("Description:\n{}", issue.description_text());
    }
    Ok(())
}

fn create(
    client: &Client,
    project: u64,
    title: String,
    description: Option<String>,
    labels: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    // Pipeline-created issues carry an attribution trailer back to the job.
    let description = match (description, config::ci_trailer()) {
        (Some(d), Some(trailer)) => Some(format!("{d}{trailer}")),
        (None, Some(trailer)) => Some(trailer),
        (d, None) => d,
    };

    let issue = client
        .create_issue(
            project,
            &CreateIssueOpts {
                title,
                description,
                labels,
                ..Default::default()
            },
        )
        .context("failed to create issue")?;

    if json {
        return print_json(&issue);
    }
    println!("Created issue #{}: {}", issue.iid, issue.title);
    Ok(())
}

fn update(
    client: &Client,
    project: u64,
    iid: u64,
    title: Option<String>,
    description: Option<String>,
    state: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let issue = client
        .update_issue(
            project,
            iid,
            &UpdateIssueOpts {
                title,
                description,
                state_event: state,
                ..Default::default()
            },
        )
        .with_context(|| format!("failed to update issue #{iid}"))?;

    if json {
        return print_json(&issue);
    }
    println!("Updated issue #{}", issue.iid);
    Ok(())
}

fn delete(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    client
        .delete_issue(project, iid)
        .with_context(|| format!("failed to delete issue #{iid}"))?;

    if json {
        return print_json(&serde_json::json!({ "iid": iid, "deleted": true }));
    }
    println!("Deleted issue #{iid}");
    Ok(())
}

fn description(client: &Client, project: u64, iid: u64) -> anyhow::Result<()> {
    let issue = client
        .get_issue(project, iid)
        .with_context(|| format!("failed to get issue #{iid}"))?;

    if issue.description_text().is_empty() {
        println!("No description provided");
    } else {
        println!("{}", issue.description_text());
    }
    Ok(())
}
