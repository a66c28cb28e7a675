use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use trackctl_core::client::{CreateMilestoneOpts, UpdateMilestoneOpts};
use trackctl_core::{changelog, Client};

#[derive(Subcommand)]
pub enum MilestoneSubcommand {
    /// List milestones
    List {
        /// Milestone state (active/closed)
        #[arg(long, short = 's')]
        state: Option<String>,
    },
    /// Show milestone details
    Get { id: u64 },
    /// Create a new milestone
    Create {
        /// Milestone title
        #[arg(long, short = 't')]
        title: String,
        /// Milestone description
        #[arg(long, short = 'd')]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, short = 'D')]
        due_date: Option<String>,
    },
    /// Update an existing milestone
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due_date: Option<String>,
        /// State event (close/activate)
        #[arg(long)]
        state: Option<String>,
    },
    /// Delete a milestone
    Delete { id: u64 },
    /// Merge changelog entries from merge requests into milestone release notes
    AddChangelog {
        /// Take the entry from this merge request and write it to its milestone
        #[arg(long, conflicts_with = "milestone")]
        mr: Option<u64>,
        /// Rebuild the changelog from every merged MR in this milestone
        #[arg(long)]
        milestone: Option<u64>,
    },
}

pub fn run(
    client: &Client,
    project: u64,
    subcmd: MilestoneSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        MilestoneSubcommand::List { state } => list(client, project, state.as_deref(), json),
        MilestoneSubcommand::Get { id } => get(client, project, id, json),
        MilestoneSubcommand::Create {
            title,
            description,
            due_date,
        } => create(client, project, title, description, due_date, json),
        MilestoneSubcommand::Update {
            id,
            title,
            description,
            due_date,
            state,
        } => update(client, project, id, title, description, due_date, state, json),
        MilestoneSubcommand::Delete { id } => delete(client, project, id, json),
        MilestoneSubcommand::AddChangelog { mr, milestone } => {
            add_changelog(client, project, mr, milestone, json)
        }
    }
}

fn list(client: &Client, project: u64, state: Option<&str>, json: bool) -> anyhow::Result<()> {
    let milestones = client
        .list_milestones(project, state)
        .context("failed to list milestones")?;

    if json {
        return print_json(&milestones);
    }
    if milestones.is_empty() {
        println!("No milestones.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = milestones
        .iter()
        .map(|m| {
            vec![
                format!("#{}", m.id),
                m.state.clone(),
                m.title.clone(),
                m.due_date.map(|d| d.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "STATE", "TITLE", "DUE"], rows);
    Ok(())
}

fn get(client: &Client, project: u64, id: u64, json: bool) -> anyhow::Result<()> {
    let milestone = client
        .get_milestone(project, id)
        .with_context(|| format!("failed to get milestone #{id}"))?;

    if json {
        return print_json(&milestone);
    }

    println!("Milestone #{}", milestone.id);
    println!("Title: {}", milestone.title);
    println!("State: {}", milestone.state);
    if let Some(due) = milestone.due_date {
        println!("Due Date: {due}");
    }
    if !milestone.description_text().is_empty() {
        println!("Description:\n{}", milestone.description_text());
    }
    Ok(())
}

fn create(
    client: &Client,
    project: u64,
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let milestone = client
        .create_milestone(
            project,
            &CreateMilestoneOpts {
                title,
                description,
                due_date,
            },
        )
        .context("failed to create milestone")?;

    if json {
        return print_json(&milestone);
    }
    println!("Created milestone #{}: {}", milestone.id, milestone.title);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn update(
    client: &Client,
    project: u64,
    id: u64,
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    state: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let milestone = client
        .update_milestone(
            project,
            id,
            &UpdateMilestoneOpts {
                title,
                description,
                due_date,
                state_event: state,
            },
        )
        .with_context(|| format!("failed to update milestone #{id}"))?;

    if json {
        return print_json(&milestone);
    }
    println!("Updated milestone #{}", milestone.id);
    Ok(())
}

fn delete(client: &Client, project: u64, id: u64, json: bool) -> anyhow::Result<()> {
    client
        .delete_milestone(project, id)
        .with_context(|| format!("failed to delete milestone #{id}"))?;

    if json {
        return print_json(&serde_json::json!({ "id": id, "deleted": true }));
    }
    println!("Deleted milestone #{id}");
    Ok(())
}

fn add_changelog(
    client: &Client,
    project: u64,
    mr: Option<u64>,
    milestone: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let updated = match (mr, milestone) {
        (Some(mr_iid), None) => changelog::apply_to_milestone(client, project, mr_iid)
            .with_context(|| format!("failed to add changelog from MR #{mr_iid}"))?,
        (None, Some(milestone_id)) => changelog::backfill_milestone(client, project, milestone_id)
            .with_context(|| format!("failed to backfill milestone #{milestone_id}"))?,
        _ => anyhow::bail!("either --mr or --milestone is required"),
    };

    if json {
        return print_json(&updated);
    }
    println!("Updated changelog for milestone '{}'", updated.title);
    Ok(())
}
